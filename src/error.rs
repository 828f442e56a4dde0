//! Domain-specific error types for policy-lens

use thiserror::Error;

/// Main error type for policy analysis sessions and their adapters
#[derive(Error, Debug)]
pub enum PolicyLensError {
    #[error("No keyword dictionary loaded")]
    NoDictionaryLoaded,

    #[error("No policy text loaded")]
    NoTextLoaded,

    #[error("No analysis available")]
    NoAnalysisAvailable,

    #[error("No stored policy to attach the analysis to")]
    NoPolicyStored,

    #[error("Persistence unavailable: {message}")]
    PersistenceUnavailable { message: String },

    #[error("Summarization unavailable: {message}")]
    SummarizationUnavailable { message: String },

    #[error("Summarization reply could not be parsed: {message}")]
    SummarizationParseFailure { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("I/O error: {message}")]
    Io { message: String },
}

impl PolicyLensError {
    /// User-facing advisory for this condition
    pub fn advisory(&self) -> String {
        match self {
            PolicyLensError::NoDictionaryLoaded => {
                "No keywords are available. Seed or import a keyword dictionary first.".to_string()
            }
            PolicyLensError::NoTextLoaded => {
                "No privacy policy text loaded. Please load text first.".to_string()
            }
            PolicyLensError::NoAnalysisAvailable => {
                "No analysis results yet. Please analyze the policy first.".to_string()
            }
            PolicyLensError::NoPolicyStored => {
                "No stored policies found. Please store the policy first.".to_string()
            }
            PolicyLensError::PersistenceUnavailable { message } => {
                format!("The policy archive could not be reached ({message}).")
            }
            PolicyLensError::SummarizationUnavailable { message } => {
                format!("The summarization service is not responding ({message}).")
            }
            PolicyLensError::SummarizationParseFailure { message } => {
                format!("The summarization service returned an unusable reply ({message}).")
            }
            other => other.to_string(),
        }
    }
}

impl From<rusqlite::Error> for PolicyLensError {
    fn from(err: rusqlite::Error) -> Self {
        PolicyLensError::PersistenceUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for PolicyLensError {
    fn from(err: reqwest::Error) -> Self {
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            format!("HTTP request failed: {}", err)
        };
        PolicyLensError::SummarizationUnavailable { message }
    }
}

impl From<serde_json::Error> for PolicyLensError {
    fn from(err: serde_json::Error) -> Self {
        PolicyLensError::SummarizationParseFailure {
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for PolicyLensError {
    fn from(err: toml::de::Error) -> Self {
        PolicyLensError::Config {
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for PolicyLensError {
    fn from(err: std::io::Error) -> Self {
        PolicyLensError::Io {
            message: err.to_string(),
        }
    }
}

/// Result type alias for policy-lens operations
pub type Result<T> = std::result::Result<T, PolicyLensError>;
