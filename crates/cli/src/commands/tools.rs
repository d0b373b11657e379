//! `tactico tools`: list the match-analysis tools.

use std::path::Path;

use super::{CommandResult, build_graph, load_config};

pub async fn run(config_path: Option<&Path>) -> CommandResult {
    let config = load_config(config_path)?;
    let registry = tactico_tools::match_registry(build_graph(&config));

    println!("{} tools available:\n", registry.len());
    print!("{}", registry.render_descriptions());
    Ok(())
}
