//! Error types for the reveal engine

use serde::{Deserialize, Serialize};

/// Errors surfaced by configuration, registration and element lookups.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RevealError {
    /// A configuration value was rejected at construction time
    #[error("Invalid configuration for `{field}`: {reason}")]
    Configuration { field: String, reason: String },

    /// The viewport-intersection capability could not observe the element
    #[error("Viewport observer unavailable: {reason}")]
    Resource { reason: String },

    /// No watched element with this id was ever registered
    #[error("Unknown element: {id}")]
    UnknownElement { id: u32 },
}

impl RevealError {
    /// Build a configuration error for `field`.
    pub fn config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Configuration {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Build a resource error.
    pub fn resource(reason: impl Into<String>) -> Self {
        Self::Resource {
            reason: reason.into(),
        }
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Configuration { .. } => "configuration",
            Self::Resource { .. } => "resource",
            Self::UnknownElement { .. } => "lookup",
        }
    }
}

impl From<serde_json::Error> for RevealError {
    fn from(err: serde_json::Error) -> Self {
        Self::Configuration {
            field: "json".to_string(),
            reason: err.to_string(),
        }
    }
}

/// Reveal result type
pub type Result<T> = core::result::Result<T, RevealError>;
