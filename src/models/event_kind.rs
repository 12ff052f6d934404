use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::FastSchemaError;

/// Kind of content change pushed over a realtime connection.
///
/// `All` is the wildcard (`*` on the wire): one connection receives creates,
/// updates and deletes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    #[serde(rename = "create")]
    Create,

    #[serde(rename = "update")]
    Update,

    #[serde(rename = "delete")]
    Delete,

    #[serde(rename = "*")]
    All,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Create => "create",
            EventKind::Update => "update",
            EventKind::Delete => "delete",
            EventKind::All => "*",
        }
    }

    /// `true` for the wildcard kind.
    pub fn is_wildcard(&self) -> bool {
        matches!(self, EventKind::All)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = FastSchemaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "create" => Ok(EventKind::Create),
            "update" => Ok(EventKind::Update),
            "delete" => Ok(EventKind::Delete),
            "*" => Ok(EventKind::All),
            other => Err(FastSchemaError::invalid_argument(format!(
                "unknown event kind '{}'",
                other
            ))),
        }
    }
}
