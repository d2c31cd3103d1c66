//! Error types for zonesync
//!
//! This module defines all error types used throughout the crate.
//!
//! Every error raised by a remote call carries the HTTP method and path of
//! the request that produced it. Non-2xx responses additionally carry the raw
//! response body text, unparsed, because providers do not always return
//! structured error bodies.

use thiserror::Error;

/// Result type alias for zonesync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Body text used when a non-2xx response body could not be read
pub const UNREADABLE_BODY: &str = "<unreadable response body>";

/// Core error type for zonesync
#[derive(Error, Debug)]
pub enum Error {
    /// Credential rejected by the provider (401/403)
    #[error("Authentication failed: {method} {path}: {body:?}")]
    Authentication {
        method: String,
        path: String,
        body: String,
    },

    /// Transport failure or client-side timeout
    #[error("Network error: {method} {path}: {message}")]
    Network {
        method: String,
        path: String,
        message: String,
    },

    /// A 2xx response whose body could not be decoded
    #[error("{method} {path} response parsing error: {message}")]
    Decode {
        method: String,
        path: String,
        message: String,
    },

    /// Request rejected by the provider as invalid (400/422)
    #[error("Validation error: {method} {path}: {body:?}")]
    Validation {
        method: String,
        path: String,
        body: String,
    },

    /// Provider throttled the request (429)
    #[error("Rate limited: {method} {path}: {body:?}")]
    RateLimited {
        method: String,
        path: String,
        body: String,
    },

    /// Any other non-2xx response
    #[error("{method} {path} error ({status}): {body:?}")]
    Provider {
        method: String,
        path: String,
        status: u16,
        body: String,
    },

    /// A bulk write for one zone failed; the reconciliation pass is aborted
    #[error("Write to zone {zone} failed: {source}")]
    Write {
        zone: String,
        #[source]
        source: Box<Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The request context was cancelled before the call completed
    #[error("Operation cancelled")]
    Cancelled,

    /// The request context deadline passed before the call completed
    #[error("Deadline exceeded")]
    DeadlineExceeded,

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(
        method: impl Into<String>,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Authentication {
            method: method.into(),
            path: path.into(),
            body: body.into(),
        }
    }

    /// Create a network error
    pub fn network(
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Network {
            method: method.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(
        method: impl Into<String>,
        path: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Decode {
            method: method.into(),
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(
        method: impl Into<String>,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::Validation {
            method: method.into(),
            path: path.into(),
            body: body.into(),
        }
    }

    /// Create a rate limit error
    pub fn rate_limited(
        method: impl Into<String>,
        path: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self::RateLimited {
            method: method.into(),
            path: path.into(),
            body: body.into(),
        }
    }

    /// Create a provider error for an unclassified non-2xx status
    pub fn provider(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::Provider {
            method: method.into(),
            path: path.into(),
            status,
            body: body.into(),
        }
    }

    /// Wrap an error as the failure of a zone's bulk write
    pub fn write(zone: impl Into<String>, source: Error) -> Self {
        Self::Write {
            zone: zone.into(),
            source: Box::new(source),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Raw provider body text, if this error came from a non-2xx response
    pub fn response_body(&self) -> Option<&str> {
        match self {
            Self::Authentication { body, .. }
            | Self::Validation { body, .. }
            | Self::RateLimited { body, .. }
            | Self::Provider { body, .. } => Some(body),
            Self::Write { source, .. } => source.response_body(),
            _ => None,
        }
    }

    /// Zone whose bulk write failed, if this is a write error
    pub fn failed_zone(&self) -> Option<&str> {
        match self {
            Self::Write { zone, .. } => Some(zone),
            _ => None,
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
