//! Error types and handling for Stampede

use thiserror::Error;

/// Result type alias for Stampede operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stampede error types
///
/// Per-request problems (bad status codes, slow responses, malformed
/// bodies, transport faults) are classified into task results and
/// aggregated, never surfaced through this enum. Only configuration and
/// setup problems are fatal to a run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}
