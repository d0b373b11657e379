//! Command handlers and the wiring they share.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tactico_agent::{Analysis, TacticalAgent};
use tactico_config::AppConfig;
use tactico_core::graph::GraphClient;
use tactico_graph::Neo4jHttpClient;
use tokio_util::sync::CancellationToken;

pub mod ask;
pub mod chat;
pub mod config_cmd;
pub mod doctor;
pub mod tools;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// The config file to use: `--config` if given, else the default location.
pub fn config_file(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(|| AppConfig::config_dir().join("config.toml"))
}

pub fn load_config(path: Option<&Path>) -> Result<AppConfig, Box<dyn std::error::Error>> {
    let file = config_file(path);
    AppConfig::load_with_env(&file).map_err(|e| format!("Failed to load config: {e}").into())
}

pub fn build_graph(config: &AppConfig) -> Arc<dyn GraphClient> {
    Arc::new(Neo4jHttpClient::from_config(&config.graph))
}

/// Wire gateway, graph and tools into an agent.
pub fn build_agent(config: &AppConfig) -> Result<TacticalAgent, Box<dyn std::error::Error>> {
    let gateway = tactico_providers::build_from_config(config)
        .map_err(|e| format!("Failed to build provider: {e}"))?;
    let registry = tactico_tools::match_registry(build_graph(config));
    tracing::debug!(
        provider = gateway.provider_name(),
        model = gateway.model(),
        graph = %config.graph.uri,
        tools = registry.len(),
        "Agent configured"
    );
    Ok(TacticalAgent::new(Arc::new(gateway), Arc::new(registry)).with_config(config))
}

/// Routes Ctrl+C for a whole session.
///
/// One listener serves every run: a press cancels the active analysis, and
/// a press at the prompt (or a second press while cancelling) exits.
#[derive(Clone, Default)]
pub struct Interrupts {
    active: Arc<Mutex<Option<CancellationToken>>>,
}

impl Interrupts {
    /// Install the session's Ctrl+C listener.
    pub fn install() -> Self {
        let interrupts = Self::default();
        let handle = interrupts.clone();
        tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                if !handle.interrupt() {
                    eprintln!();
                    std::process::exit(130);
                }
                eprintln!("\n  Cancelling after the current step...");
            }
        });
        interrupts
    }

    /// Analyze `question` as the active run.
    ///
    /// An in-flight model or tool call still finishes; its result is discarded.
    pub async fn analyze(&self, agent: &TacticalAgent, question: &str) -> Analysis {
        let cancel = CancellationToken::new();
        *self.active() = Some(cancel.clone());
        let analysis = agent.analyze_with_cancel(question, &cancel).await;
        *self.active() = None;
        analysis
    }

    /// Cancel the active run. Returns false when there is nothing left to cancel.
    fn interrupt(&self) -> bool {
        match self.active().as_ref() {
            Some(token) if !token.is_cancelled() => {
                token.cancel();
                true
            }
            _ => false,
        }
    }

    fn active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// One-line run summary for stderr.
pub fn summary(analysis: &Analysis) -> String {
    let tools: Vec<&str> = analysis
        .state
        .tool_calls
        .iter()
        .filter(|c| c.dispatched)
        .map(|c| c.name.as_str())
        .collect();
    let confidence = analysis
        .confidence
        .map(|c| format!("{c:?}").to_lowercase())
        .unwrap_or_else(|| "n/a".into());
    format!(
        "confidence: {confidence} | iterations: {} | tools: {}",
        analysis.iterations,
        if tools.is_empty() { "none".to_string() } else { tools.join(", ") }
    )
}
