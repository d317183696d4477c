use chrono::Local;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

pub const DEFAULT_MODEL: &str = "llama3";
const DEFAULT_INFERENCE_URL: &str = "http://127.0.0.1:11434/v1";
const DEFAULT_CONFIG_PATH: &str = "config/orrery.toml";
pub const DEFAULT_TOOL_TIMEOUT_SECS: u64 = 60;
const CURRENT_DATE_PLACEHOLDER: &str = "{{CURRENT_DATE}}";

pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"
You are a careful assistant that answers questions by calling the tools made
available to you. Today's date is {{CURRENT_DATE}}.

Use a tool whenever it can supply data you do not have. Read tool errors
carefully and correct your call instead of guessing. Once you have the data
you need, answer the user directly and concisely.
"#;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub model: String,
    pub models: Vec<String>,
    pub inference_url: String,
    pub tools_url: Option<String>,
    pub prompt_file: Option<PathBuf>,
    pub max_tool_rounds: Option<usize>,
    pub tool_timeout_secs: u64,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config from {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config from {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to read prompt template from {path:?}: {source}")]
    Prompt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    model: Option<String>,
    #[serde(default)]
    models: Vec<String>,
    inference_url: Option<String>,
    tools_url: Option<String>,
    prompt_file: Option<String>,
    max_tool_rounds: Option<usize>,
    tool_timeout_secs: Option<u64>,
}

impl AppConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = path {
            return read_config(path);
        }
        let default_path = Path::new(DEFAULT_CONFIG_PATH);
        match read_config(default_path) {
            Ok(config) => Ok(config),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                info!("Configuration file not found; using defaults");
                Ok(Self::default())
            }
            Err(other) => Err(other),
        }
    }

    pub fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            models: vec![DEFAULT_MODEL.to_string()],
            inference_url: DEFAULT_INFERENCE_URL.to_string(),
            tools_url: None,
            prompt_file: None,
            max_tool_rounds: None,
            tool_timeout_secs: DEFAULT_TOOL_TIMEOUT_SECS,
        }
    }

    /// Read the seed prompt template, falling back to the built-in one when
    /// no file is configured. The template keeps its `{{CURRENT_DATE}}`
    /// placeholder; rendering happens at seed time so a history reset picks
    /// up the current date.
    pub fn load_prompt_template(&self) -> Result<String, ConfigError> {
        let Some(path) = &self.prompt_file else {
            return Ok(DEFAULT_PROMPT_TEMPLATE.to_string());
        };
        let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
        let expanded = PathBuf::from(expanded);
        debug!(path = %expanded.display(), "Reading prompt template file");
        fs::read_to_string(&expanded).map_err(|source| ConfigError::Prompt {
            path: expanded,
            source,
        })
    }
}

/// Substitute the date placeholder, e.g. `2026-08-25 (Tuesday)`.
pub fn render_prompt(template: &str) -> String {
    let today = Local::now().format("%Y-%m-%d (%A)").to_string();
    template
        .replace(CURRENT_DATE_PLACEHOLDER, &today)
        .trim()
        .to_string()
}

fn read_config(path: &Path) -> Result<AppConfig, ConfigError> {
    debug!(path = %path.display(), "Reading configuration file");
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let parsed: RawConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    // Startup model: explicit `model` key, else the first catalog entry,
    // else the built-in default.
    let model = parsed
        .model
        .or_else(|| parsed.models.first().cloned())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let mut models = parsed.models;
    if !models.contains(&model) {
        models.insert(0, model.clone());
    }

    Ok(AppConfig {
        model,
        models,
        inference_url: parsed
            .inference_url
            .unwrap_or_else(|| DEFAULT_INFERENCE_URL.to_string()),
        tools_url: parsed.tools_url,
        prompt_file: parsed.prompt_file.map(PathBuf::from),
        max_tool_rounds: parsed.max_tool_rounds,
        tool_timeout_secs: parsed
            .tool_timeout_secs
            .unwrap_or(DEFAULT_TOOL_TIMEOUT_SECS),
    })
}
