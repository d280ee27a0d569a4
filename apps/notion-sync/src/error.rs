//! CLI error types and exit codes

use thiserror::Error;
use xavyo_connector_notion::{ConfigError, NotionError};

/// Exit codes for the CLI
/// - 0: Success
/// - 1: General error
/// - 2: Configuration error
/// - 3: Authentication failed
/// - 4: Deprovisioning could not be verified
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Connector(#[from] NotionError),

    #[error("Failed to write output: {0}")]
    Output(#[from] serde_json::Error),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) => 2,
            CliError::Connector(NotionError::Config(_) | NotionError::NotConfigured(_)) => 2,
            CliError::Connector(NotionError::ConnectionTest(_)) => 3,
            CliError::Connector(NotionError::DeprovisionVerificationFailed { .. }) => 4,
            CliError::Connector(_) | CliError::Output(_) => 1,
        }
    }

    pub fn print(&self) {
        eprintln!("Error: {self}");
    }
}
