mod application;
mod cli;
mod config;
mod domain;
mod infrastructure;

pub use application::{agent, shell, tooling};
pub use domain::types;
pub use infrastructure::model;

use agent::{Agent, AgentConfig};
use clap::Parser;
use cli::Cli;
use config::AppConfig;
use model::OpenAiCompatClient;
use shell::Shell;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tooling::{DisabledToolService, HttpToolService, ToolServiceInterface};
use tracing::{debug, info, warn};
use tracing_subscriber::{EnvFilter, fmt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let _ = dotenvy::dotenv();
    init_tracing();
    info!("Starting orrery");

    let cli = Cli::parse();
    debug!(config = ?cli.config, model = ?cli.model, prompt_file = ?cli.prompt_file, "CLI arguments parsed");

    let config_path = cli.config.as_deref();
    let mut config = AppConfig::load(config_path)?;
    if let Some(path) = config_path {
        info!(path = %path.display(), "Loaded configuration from file");
    } else {
        info!("Loaded configuration using default path or defaults");
    }

    if let Some(model) = cli.model.clone() {
        if !config.models.contains(&model) {
            config.models.insert(0, model.clone());
        }
        config.model = model;
    }
    if let Some(prompt_file) = cli.prompt_file.clone() {
        config.prompt_file = Some(prompt_file);
    }

    let template = config.load_prompt_template()?;

    let api_key = std::env::var("ORRERY_API_KEY").ok();
    let provider = Arc::new(OpenAiCompatClient::new(config.inference_url.clone(), api_key));

    let bridge: Arc<dyn ToolServiceInterface> = match &config.tools_url {
        Some(url) => {
            debug!(url = %url, "Connecting tool service");
            let token = std::env::var("ORRERY_TOOLS_KEY").ok();
            Arc::new(HttpToolService::new(url.clone(), token))
        }
        None => {
            info!("No tool service configured; running chat-only");
            Arc::new(DisabledToolService)
        }
    };

    let schemas = match bridge.list_tools().await {
        Ok(schemas) => {
            info!(tools = schemas.len(), "Tool discovery completed");
            schemas
        }
        Err(err) => {
            warn!(error = %err, "Tool discovery failed; continuing without tools");
            Vec::new()
        }
    };

    let agent = Agent::new(
        provider,
        bridge,
        schemas,
        AgentConfig {
            model: config.model.clone(),
            catalog: config.models.clone(),
            prompt_template: template,
            max_tool_rounds: config.max_tool_rounds,
            tool_timeout: Duration::from_secs(config.tool_timeout_secs),
        },
    );

    let label = shell::agent_label(config.prompt_file.as_deref());
    let mut shell = Shell::new(agent, label);

    match cli.question() {
        Some(question) => {
            info!("Answering one-shot question");
            shell.run_once(&question).await?;
        }
        None => shell.run().await?,
    }

    info!("Session finished");
    Ok(())
}

fn init_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_level(true)
            .init();
    });
}
