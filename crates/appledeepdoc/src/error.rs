use std::fmt;

use thiserror::Error;

/// High-level error type shared across documentation sources.
#[derive(Debug, Error)]
pub enum DeepDocError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("fetch error: {0}")]
    Fetch(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for DeepDocError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for DeepDocError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}

impl DeepDocError {
    pub fn context<T: fmt::Display>(self, ctx: T) -> Self {
        match self {
            DeepDocError::Config(msg) => DeepDocError::Config(format!("{ctx}: {msg}")),
            DeepDocError::InvalidInput(msg) => DeepDocError::InvalidInput(format!("{ctx}: {msg}")),
            DeepDocError::NotFound(msg) => DeepDocError::NotFound(format!("{ctx}: {msg}")),
            DeepDocError::Fetch(msg) => DeepDocError::Fetch(format!("{ctx}: {msg}")),
            DeepDocError::Serialization(msg) => {
                DeepDocError::Serialization(format!("{ctx}: {msg}"))
            }
            DeepDocError::Io(err) => DeepDocError::Io(err),
        }
    }
}
