//! `tactico ask`: analyze a single question.

use std::path::Path;

use super::{CommandResult, Interrupts, build_agent, load_config, summary};

pub async fn run(
    config_path: Option<&Path>,
    question: &str,
    json: bool,
    max_iterations: Option<u32>,
) -> CommandResult {
    let mut config = load_config(config_path)?;
    if let Some(max) = max_iterations {
        config.agent.max_iterations = max;
        config.validate()?;
    }
    let agent = build_agent(&config)?;

    if !json {
        eprint!("  Analyzing...");
    }
    let analysis = Interrupts::install().analyze(&agent, question).await;
    if !json {
        eprint!("\r              \r");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else if analysis.success {
        println!("{}", analysis.answer);
        eprintln!();
        eprintln!("  {}", summary(&analysis));
    }

    match analysis.error {
        Some(error) if !analysis.success => Err(format!("Analysis failed: {error}").into()),
        _ => Ok(()),
    }
}
