//! Error types for the SenseNova adapters

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the vendor client and the adapters built on it
#[derive(Error, Debug)]
pub enum Error {
    #[error("Model {model} is not supported. Supported models are: {}", .supported.join(", "))]
    UnsupportedModel {
        model: String,
        supported: Vec<String>,
    },

    #[error("SenseNova API error (status {status}{}): {message}", .code.map(|c| format!(", code {c}")).unwrap_or_default())]
    Api {
        status: u16,
        code: Option<i64>,
        message: String,
    },

    #[error("Empty response: {0}")]
    EmptyResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
