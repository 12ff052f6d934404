use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// A content record of any schema.
///
/// The well-known bookkeeping columns are typed; every schema-defined field
/// lands in `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<String>,

    /// Schema-defined fields
    #[serde(flatten)]
    pub fields: Map<String, JsonValue>,
}

impl Content {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a schema field, builder style.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&JsonValue> {
        self.fields.get(name)
    }

    /// Shorthand for string-typed fields.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(|v| v.as_str())
    }
}
