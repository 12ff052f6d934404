use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::event_kind::EventKind;
use crate::error::{FastSchemaError, Result};

/// Wire frame pushed by the server on `/realtime/content`.
///
/// ```json
/// { "event": "update", "data": [ { "id": 1, "name": "tag1" } ] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFrame {
    pub event: EventKind,
    #[serde(default)]
    pub data: JsonValue,
}

impl EventFrame {
    /// Parse a text frame.
    pub fn parse(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| {
            FastSchemaError::decode(format!("Failed to parse realtime frame: {}", e))
        })
    }
}
