//! Error types and handlers for registry operations

pub mod handlers;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum RegistryError {
    /// Bad branching or paging parameters
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    /// Unrecognized taglist order setting
    #[error("Invalid format: {0}")]
    InvalidFormat(String),
    /// Malformed challenge or failed token fetch
    #[error("Authentication challenge failed: {0}")]
    AuthChallenge(String),
    /// Non-success response from the registry
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },
    /// Cache storage unavailable
    #[error("Cache error: {0}")]
    Cache(String),
    /// Network related errors
    #[error("Network error: {0}")]
    Network(String),
    /// Parse errors
    #[error("Parse error: {0}")]
    Parse(String),
    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
    /// File IO errors
    #[error("IO error: {0}")]
    Io(String),
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),
}

impl RegistryError {
    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message shown to the user, without the variant prefix for HTTP errors
    pub fn user_message(&self) -> String {
        match self {
            RegistryError::Http { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for RegistryError {
    fn from(err: std::io::Error) -> Self {
        RegistryError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for RegistryError {
    fn from(err: serde_json::Error) -> Self {
        RegistryError::Parse(err.to_string())
    }
}

impl From<reqwest::Error> for RegistryError {
    fn from(err: reqwest::Error) -> Self {
        RegistryError::Network(err.to_string())
    }
}

impl From<url::ParseError> for RegistryError {
    fn from(err: url::ParseError) -> Self {
        RegistryError::Validation(err.to_string())
    }
}

impl From<std::string::FromUtf8Error> for RegistryError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        RegistryError::Parse(format!("UTF-8 conversion error: {}", err))
    }
}
