use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::error::{FastSchemaError, Result};

/// Record payload of a realtime frame.
///
/// `create` and id-scoped `update`/`delete` frames carry one record; unscoped
/// `update`/`delete` frames carry an array of affected records. The shape is
/// decided by the server and mirrored here, never coerced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload<T> {
    One(T),
    Many(Vec<T>),
}

impl<T: DeserializeOwned> EventPayload<T> {
    /// Decode a frame's `data` member. A JSON array becomes `Many`, anything
    /// else `One`.
    pub fn from_value(value: JsonValue) -> Result<Self> {
        match value {
            JsonValue::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<std::result::Result<Vec<T>, _>>()
                .map(EventPayload::Many)
                .map_err(|e| {
                    FastSchemaError::decode(format!("Invalid record in event payload: {}", e))
                }),
            other => serde_json::from_value(other).map(EventPayload::One).map_err(|e| {
                FastSchemaError::decode(format!("Invalid record in event payload: {}", e))
            }),
        }
    }
}

impl<T> EventPayload<T> {
    pub fn is_many(&self) -> bool {
        matches!(self, EventPayload::Many(_))
    }

    /// The single record, if this payload is `One`.
    pub fn as_one(&self) -> Option<&T> {
        match self {
            EventPayload::One(record) => Some(record),
            EventPayload::Many(_) => None,
        }
    }

    /// The record list, if this payload is `Many`.
    pub fn as_many(&self) -> Option<&[T]> {
        match self {
            EventPayload::One(_) => None,
            EventPayload::Many(records) => Some(records),
        }
    }

    /// Number of records carried.
    pub fn len(&self) -> usize {
        match self {
            EventPayload::One(_) => 1,
            EventPayload::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flatten into a list regardless of shape.
    pub fn into_vec(self) -> Vec<T> {
        match self {
            EventPayload::One(record) => vec![record],
            EventPayload::Many(records) => records,
        }
    }
}
