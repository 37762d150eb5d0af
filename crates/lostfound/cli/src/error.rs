//! CLI error types

use lostfound_types::RegistryError;
use thiserror::Error;

/// CLI error types
#[derive(Debug, Error)]
pub enum CliError {
    /// Rejected by the registry
    #[error("{0}")]
    Registry(#[from] RegistryError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML encoding error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CliError {
    /// Short machine-readable code shown as `error[<code>]`.
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Registry(e) => e.kind().as_str(),
            CliError::Config(_) => "config",
            CliError::NotFound(_) => "not_found",
            CliError::InvalidInput(_) => "invalid_input",
            CliError::Io(_) => "io",
            CliError::Json(_) | CliError::Yaml(_) => "serialization",
        }
    }
}

/// Result type for CLI operations
pub type CliResult<T> = Result<T, CliError>;
