use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure loaded from policy_lens.toml and environment variables
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub store: StoreConfig,
    pub summarizer: SummarizerConfig,
    /// Runtime configuration loaded from environment variables
    #[serde(skip)]
    pub runtime: RuntimeConfig,
}

/// Location of the SQLite archive holding keywords, policies and analyses
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub database_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            database_path: base.join("policy-lens").join("policy_lens.db"),
        }
    }
}

/// Summarization service settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SummarizerConfig {
    pub endpoint: String,
    pub model: String,
    /// Character budget for policy text sent to the model
    pub max_prompt_chars: usize,
    pub probe_timeout_ms: u64,
    pub request_timeout_ms: u64,
    /// Category labels that steer the prompt when present in the keyword report
    pub hints: Vec<HintRule>,
}

/// A category label and the steering sentence it contributes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct HintRule {
    pub category: String,
    pub hint: String,
}

impl HintRule {
    pub fn new(category: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            hint: hint.into(),
        }
    }
}

pub const MIN_PROMPT_CHARS: usize = 50;
pub const MAX_PROMPT_CHARS: usize = 20_000;

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "gemma:2b".to_string(),
            // Small models choke on long prompts
            max_prompt_chars: 500,
            probe_timeout_ms: 5_000,
            request_timeout_ms: 120_000,
            hints: vec![
                HintRule::new("Data Collection", "Focus on data collection practices."),
                HintRule::new("Data Sharing", "Focus on data sharing practices."),
                HintRule::new("User Rights", "Focus on user rights."),
            ],
        }
    }
}

/// Runtime configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub log_level: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            log_level: "policy_lens=info".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Load runtime configuration from environment variables
    pub fn load_from_env() -> Self {
        Self {
            log_level: std::env::var("RUST_LOG").unwrap_or_else(|_| "policy_lens=info".to_string()),
        }
    }
}

impl Config {
    /// Load configuration from TOML file and environment variables
    /// Uses POLICY_LENS_CONFIG environment variable or defaults to "policy_lens.toml"
    pub fn load() -> anyhow::Result<Self> {
        if let Ok(env_path) = std::env::var("POLICY_LENS_ENV_FILE") {
            let _ = dotenvy::from_path(env_path);
        } else {
            let _ = dotenvy::from_path(".env");
        }

        let config_path = std::env::var("POLICY_LENS_CONFIG")
            .unwrap_or_else(|_| "policy_lens.toml".to_string());

        let mut config = if let Ok(content) = std::fs::read_to_string(&config_path) {
            Self::from_toml_str(&content)?
        } else {
            tracing::debug!("Config file {} not found, using defaults", config_path);
            Self::default()
        };

        config.apply_env_overrides();
        config.runtime = RuntimeConfig::load_from_env();
        config.validate();

        Ok(config)
    }

    /// Parse a TOML document; missing sections fall back to defaults
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(path) = std::env::var("POLICY_LENS_DB_PATH") {
            self.store.database_path = PathBuf::from(path);
            tracing::debug!("POLICY_LENS_DB_PATH env override applied");
        }
        if let Ok(url) = std::env::var("POLICY_LENS_LLM_URL") {
            self.summarizer.endpoint = url;
            tracing::debug!("POLICY_LENS_LLM_URL env override applied");
        }
        if let Ok(model) = std::env::var("POLICY_LENS_LLM_MODEL") {
            self.summarizer.model = model;
        }
        if let Some(timeout) = std::env::var("POLICY_LENS_LLM_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.summarizer.request_timeout_ms = timeout;
        }
        if let Some(timeout) = std::env::var("POLICY_LENS_PROBE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.summarizer.probe_timeout_ms = timeout;
        }
        if let Some(chars) = std::env::var("POLICY_LENS_MAX_PROMPT_CHARS")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            self.summarizer.max_prompt_chars = chars;
        }
    }

    /// Clamp out-of-range values instead of refusing to start
    pub fn validate(&mut self) {
        let summarizer = &mut self.summarizer;

        if !summarizer.endpoint.starts_with("http://") && !summarizer.endpoint.starts_with("https://")
        {
            tracing::warn!(
                "Summarizer endpoint '{}' doesn't start with http:// or https://",
                summarizer.endpoint
            );
        }

        let clamped = summarizer
            .max_prompt_chars
            .clamp(MIN_PROMPT_CHARS, MAX_PROMPT_CHARS);
        if clamped != summarizer.max_prompt_chars {
            tracing::warn!(
                "max_prompt_chars {} out of range, clamping to {}",
                summarizer.max_prompt_chars,
                clamped
            );
            summarizer.max_prompt_chars = clamped;
        }

        if summarizer.probe_timeout_ms == 0 {
            summarizer.probe_timeout_ms = 1;
        }
        if summarizer.request_timeout_ms == 0 {
            summarizer.request_timeout_ms = 1;
        }
        if summarizer.probe_timeout_ms > summarizer.request_timeout_ms {
            tracing::warn!(
                "probe_timeout_ms {} exceeds request_timeout_ms {}, lowering probe timeout",
                summarizer.probe_timeout_ms,
                summarizer.request_timeout_ms
            );
            summarizer.probe_timeout_ms = summarizer.request_timeout_ms;
        }
    }
}
