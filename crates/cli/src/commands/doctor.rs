//! `tactico doctor`: diagnose configuration and connectivity.

use std::path::Path;

use tactico_config::AppConfig;
use tactico_core::graph::GraphClient;

use super::{CommandResult, build_graph, config_file};

pub async fn run(config_path: Option<&Path>) -> CommandResult {
    println!("Tactico Doctor: system diagnostics");
    println!("==================================\n");

    let mut issues = 0;

    let file = config_file(config_path);
    if file.exists() {
        println!("  ✅ Config file found at {}", file.display());
    } else {
        println!("  ⚠️  No config file at {} (using defaults; run `tactico config init`)", file.display());
    }

    let config = match AppConfig::load_with_env(&file) {
        Ok(config) => {
            println!("  ✅ Config valid");
            config
        }
        Err(e) => {
            println!("  ❌ Config invalid: {e}");
            println!("\n  ⚠️  Fix the configuration before running further checks.");
            return Err(e.into());
        }
    };

    match tactico_providers::build_from_config(&config) {
        Ok(gateway) => match gateway.health_check().await {
            Ok(true) => println!(
                "  ✅ Language model reachable ({} / {})",
                gateway.provider_name(),
                gateway.model()
            ),
            Ok(false) => {
                println!(
                    "  ❌ Model '{}' not available from {}",
                    gateway.model(),
                    config.llm.base_url
                );
                issues += 1;
            }
            Err(e) => {
                println!("  ❌ Language model unreachable at {}: {e}", config.llm.base_url);
                issues += 1;
            }
        },
        Err(e) => {
            println!("  ❌ Provider misconfigured: {e}");
            issues += 1;
        }
    }

    let graph = build_graph(&config);
    match graph.ping().await {
        Ok(()) => println!("  ✅ Graph database reachable ({})", config.graph.uri),
        Err(e) => {
            println!("  ❌ Graph database unreachable at {}: {e}", config.graph.uri);
            issues += 1;
        }
    }

    let registry = tactico_tools::match_registry(graph);
    println!("  ✅ {} tools registered", registry.len());

    println!();
    if issues == 0 {
        println!("  All checks passed.");
        Ok(())
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
        Err(format!("{issues} check(s) failed").into())
    }
}
