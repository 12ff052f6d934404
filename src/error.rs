//! Error types for fastschema-link.
//!
//! Every fallible operation in the crate returns [`Result`]. Realtime errors
//! that happen after `subscribe` has returned are not returned at all: they are
//! handed to the subscriber's own callback as `Err(FastSchemaError)`.

use thiserror::Error;

/// Result type used throughout the crate.
pub type Result<T> = std::result::Result<T, FastSchemaError>;

/// Errors produced by the FastSchema client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FastSchemaError {
    /// Local validation failed before any I/O was attempted.
    #[error("{0}")]
    InvalidArgument(String),

    /// The client was configured with an unusable value (base URL, header...).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A CRUD or auth call failed: non-2xx status, an `error` envelope, or no
    /// response at all (`status` is `None`).
    #[error("{message}")]
    TransportError {
        status: Option<u16>,
        message: String,
    },

    /// A token, frame or response body could not be decoded.
    #[error("Decode error: {0}")]
    DecodeError(String),

    /// A realtime connection could not be opened or ended abnormally.
    #[error("{0}")]
    ConnectionError(String),

    /// The token store could not read or persist a token.
    #[error("Token store error: {0}")]
    StoreError(String),
}

impl FastSchemaError {
    pub(crate) fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn decode(msg: impl Into<String>) -> Self {
        Self::DecodeError(msg.into())
    }

    /// HTTP status attached to a transport failure, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::TransportError { status, .. } => *status,
            _ => None,
        }
    }

    /// `true` when a request never produced an HTTP response.
    pub fn is_network_error(&self) -> bool {
        matches!(self, Self::TransportError { status: None, .. })
    }
}

impl From<reqwest::Error> for FastSchemaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            return Self::DecodeError(err.to_string());
        }
        Self::TransportError {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for FastSchemaError {
    fn from(err: serde_json::Error) -> Self {
        Self::DecodeError(err.to_string())
    }
}
