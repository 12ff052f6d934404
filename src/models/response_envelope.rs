use serde::{Deserialize, Serialize};

/// Error member of a response envelope: either a bare string or an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResponseError {
    Text(String),
    Detail {
        #[serde(default)]
        message: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
}

impl ResponseError {
    /// Human-readable message, falling back to `default` when the server
    /// sent an error object without one.
    pub fn message(&self, default: &str) -> String {
        crate::helpers::error_message(self, default)
    }
}

/// `{ "data": ..., "error": ... }` wrapper around every API response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope<T> {
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}
