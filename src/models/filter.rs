use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Comparison operators understood by the content filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    NotLike,
    Contains,
    NotContains,
    ContainsFold,
    NotContainsFold,
    In,
    NotIn,
    Null,
}

impl FilterOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "$eq",
            FilterOperator::Neq => "$neq",
            FilterOperator::Gt => "$gt",
            FilterOperator::Gte => "$gte",
            FilterOperator::Lt => "$lt",
            FilterOperator::Lte => "$lte",
            FilterOperator::Like => "$like",
            FilterOperator::NotLike => "$notlike",
            FilterOperator::Contains => "$contains",
            FilterOperator::NotContains => "$notcontains",
            FilterOperator::ContainsFold => "$containsfold",
            FilterOperator::NotContainsFold => "$notcontainsfold",
            FilterOperator::In => "$in",
            FilterOperator::NotIn => "$nin",
            FilterOperator::Null => "$null",
        }
    }
}

/// Structured filter predicate, serialized to JSON and passed verbatim in
/// the `filter` query parameter.
///
/// ```rust
/// use fastschema_link::{Filter, FilterOperator};
///
/// let filter = Filter::new()
///     .eq("category", "electronics")
///     .op("price", FilterOperator::Gte, 100);
/// assert_eq!(
///     filter.to_json().unwrap(),
///     r#"{"category":"electronics","price":{"$gte":100}}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Filter(Map<String, JsonValue>);

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plain equality: `{ "<field>": <value> }`.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.0.insert(field.into(), value.into());
        self
    }

    /// Operator condition: `{ "<field>": { "<op>": <value> } }`. Repeated calls
    /// on the same field accumulate operators.
    pub fn op(
        mut self,
        field: impl Into<String>,
        operator: FilterOperator,
        value: impl Into<JsonValue>,
    ) -> Self {
        let entry = self
            .0
            .entry(field.into())
            .or_insert_with(|| JsonValue::Object(Map::new()));
        if !entry.is_object() {
            *entry = JsonValue::Object(Map::new());
        }
        if let JsonValue::Object(ops) = entry {
            ops.insert(operator.as_str().to_string(), value.into());
        }
        self
    }

    /// `{ "$or": [ ... ] }`
    pub fn or(mut self, filters: Vec<Filter>) -> Self {
        self.0.insert("$or".to_string(), Self::list(filters));
        self
    }

    /// `{ "$and": [ ... ] }`
    pub fn and(mut self, filters: Vec<Filter>) -> Self {
        self.0.insert("$and".to_string(), Self::list(filters));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, JsonValue> {
        &self.0
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    fn list(filters: Vec<Filter>) -> JsonValue {
        JsonValue::Array(filters.into_iter().map(|f| JsonValue::Object(f.0)).collect())
    }
}

impl From<Map<String, JsonValue>> for Filter {
    fn from(map: Map<String, JsonValue>) -> Self {
        Self(map)
    }
}
