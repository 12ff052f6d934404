use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// One field of a schema definition.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,

    #[serde(default)]
    pub label: String,

    /// Field type as named by the server: `string`, `int`, `relation`, `media`...
    #[serde(rename = "type")]
    pub field_type: String,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub optional: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sortable: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub filterable: bool,

    /// System fields (`id`, timestamps) cannot be edited
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_locked: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<JsonValue>,

    /// Type specific settings (`relation`, `enums`, `renderer`, `db`...)
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }

    pub fn filterable(mut self) -> Self {
        self.filterable = true;
        self
    }
}
