//! `tactico config`: configuration management commands.

use std::path::Path;

use tactico_config::AppConfig;

use super::{CommandResult, config_file, load_config};

const REDACTED: &str = "***";

/// The effective configuration as TOML, with secrets replaced.
pub fn redacted_toml(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.llm.api_key.is_some() {
        shown.llm.api_key = Some(REDACTED.into());
    }
    if shown.graph.password.is_some() {
        shown.graph.password = Some(REDACTED.into());
    }
    toml::to_string_pretty(&shown)
}

pub async fn show(config_path: Option<&Path>) -> CommandResult {
    let config = load_config(config_path)?;
    println!("{}", redacted_toml(&config)?);
    Ok(())
}

pub async fn init(config_path: Option<&Path>, force: bool) -> CommandResult {
    let file = config_file(config_path);
    if file.exists() && !force {
        return Err(format!(
            "{} already exists (use --force to overwrite)",
            file.display()
        )
        .into());
    }
    if let Some(dir) = file.parent() {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(&file, AppConfig::default_toml())?;
    println!("  ✅ Wrote default configuration to {}", file.display());
    Ok(())
}

pub async fn path(config_path: Option<&Path>) -> CommandResult {
    println!("{}", config_file(config_path).display());
    Ok(())
}
