//! Error types for Jarvis

use thiserror::Error;

/// Result type alias using Jarvis's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Jarvis
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing credential, bad setting)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Remote provider (LLM or search) returned an error
    #[error("Provider error: {0}")]
    Provider(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Timeout error
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Agent run aborted by an underlying failure
    #[error("Failed to run agent: {0}")]
    Agent(#[source] Box<Error>),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification of errors, used at the HTTP boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or malformed configuration
    Config,
    /// Caller supplied unusable input
    InvalidInput,
    /// Transport or API failure from a remote service
    Provider,
    /// Anything else that went wrong during an agent run
    AgentFailure,
}

impl Error {
    /// Wrap an error as an agent failure, keeping the original as its source
    pub fn agent(err: Error) -> Self {
        Error::Agent(Box::new(err))
    }

    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Config(_) => ErrorKind::Config,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Provider(_) | Error::Http(_) | Error::Json(_) | Error::Timeout(_) => {
                ErrorKind::Provider
            }
            Error::Agent(_) | Error::Internal(_) => ErrorKind::AgentFailure,
        }
    }

    /// Check if error is a client error (user's fault)
    pub fn is_client_error(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<handlebars::RenderError> for Error {
    fn from(err: handlebars::RenderError) -> Self {
        Error::Internal(format!("Template render error: {}", err))
    }
}
