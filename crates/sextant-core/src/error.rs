//! Error type for the navigator and validation engines.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, NavigatorError>;

#[derive(Debug, Error)]
pub enum NavigatorError {
    /// An explicit id or name lookup failed.
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A configured embedding provider failed for this request.
    #[error("embedding provider error: {0:#}")]
    Provider(anyhow::Error),
}

impl NavigatorError {
    pub fn component_not_found(key: impl Into<String>) -> Self {
        Self::NotFound {
            kind: "component",
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
