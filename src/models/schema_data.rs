use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::field::Field;

/// Definition of a content schema as returned by `GET /schema`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaData {
    pub name: String,

    #[serde(default)]
    pub namespace: String,

    #[serde(default)]
    pub label_field: String,

    #[serde(default)]
    pub fields: Vec<Field>,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub disable_timestamp: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_system_schema: bool,

    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_junction_schema: bool,
}

impl SchemaData {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        label_field: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
            label_field: label_field.into(),
            ..Self::default()
        }
    }

    /// Empty definition used for a schema that has not been synced yet.
    pub fn placeholder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }
}

/// Body of `PUT /schema/<name>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaUpdateData {
    pub schema: SchemaData,

    /// Old field name to new field name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_fields: BTreeMap<String, String>,

    /// Old table name to new table name
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rename_tables: BTreeMap<String, String>,
}

impl SchemaUpdateData {
    pub fn new(schema: SchemaData) -> Self {
        Self {
            schema,
            rename_fields: BTreeMap::new(),
            rename_tables: BTreeMap::new(),
        }
    }

    pub fn rename_field(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.rename_fields.insert(from.into(), to.into());
        self
    }
}
