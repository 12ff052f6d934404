//! Small pure helpers shared by the transport, schema and realtime layers.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::cmp::Ordering;

use crate::error::Result;
use crate::models::{ListOptions, ResponseError};

/// Extract a readable message from a server error member.
///
/// A bare string is returned as-is; an error object yields its `message`, or
/// `default` when it has none.
pub fn error_message(error: &ResponseError, default: &str) -> String {
    match error {
        ResponseError::Text(message) => message.clone(),
        ResponseError::Detail { message, .. } => {
            message.clone().unwrap_or_else(|| default.to_string())
        },
    }
}

/// Build the query string for a content listing.
///
/// Parameters are emitted in the order `limit`, `page`, `sort`, `select`,
/// `filter`; zero numbers and empty strings are skipped, and the filter is
/// JSON encoded.
///
/// ```rust
/// use fastschema_link::{helpers::content_filter_query, Filter, FilterOperator, ListOptions};
///
/// let options = ListOptions::new()
///     .with_limit(10)
///     .with_page(2)
///     .with_sort("name")
///     .with_select("id,name")
///     .with_filter(
///         Filter::new()
///             .eq("category", "electronics")
///             .op("price", FilterOperator::Gte, 100),
///     );
/// assert_eq!(
///     content_filter_query(Some(&options)).unwrap(),
///     "limit=10&page=2&sort=name&select=id%2Cname&filter=%7B%22category%22%3A%22electronics%22%2C%22price%22%3A%7B%22%24gte%22%3A100%7D%7D"
/// );
/// ```
pub fn content_filter_query(options: Option<&ListOptions>) -> Result<String> {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    let Some(options) = options else {
        return Ok(query.finish());
    };

    if let Some(limit) = options.limit.filter(|v| *v > 0) {
        query.append_pair("limit", &limit.to_string());
    }
    if let Some(page) = options.page.filter(|v| *v > 0) {
        query.append_pair("page", &page.to_string());
    }
    if let Some(sort) = options.sort.as_deref().filter(|v| !v.is_empty()) {
        query.append_pair("sort", sort);
    }
    if let Some(select) = options.select.as_deref().filter(|v| !v.is_empty()) {
        query.append_pair("select", select);
    }
    if let Some(filter) = &options.filter {
        query.append_pair("filter", &filter.to_json()?);
    }

    Ok(query.finish())
}

/// Percent-encode one URL path segment, so `/`, `?` and `#` stay inside it.
///
/// ```
/// use fastschema_link::helpers::encode_path_segment;
///
/// assert_eq!(encode_path_segment("a/b?c#d e"), "a%2Fb%3Fc%23d%20e");
/// ```
pub fn encode_path_segment(segment: &str) -> String {
    // form encoding writes a space as `+` and a literal `+` as `%2B`
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Recursively sort a JSON value: arrays are ordered by the fingerprint of
/// their (already sorted) elements. Object key order follows the map type.
pub fn sort_value(value: JsonValue) -> JsonValue {
    match value {
        JsonValue::Array(items) => {
            let mut keyed: Vec<(String, JsonValue)> = items
                .into_iter()
                .map(|item| {
                    let item = sort_value(item);
                    (fingerprint(&item), item)
                })
                .collect();
            keyed.sort_by(|a, b| collate(&a.0, &b.0));
            JsonValue::Array(keyed.into_iter().map(|(_, item)| item).collect())
        },
        JsonValue::Object(map) => {
            JsonValue::Object(map.into_iter().map(|(k, v)| (k, sort_value(v))).collect())
        },
        other => other,
    }
}

/// Deterministic fingerprint of any serializable value.
///
/// Two values that differ only in object key order or array element order
/// produce the same string.
///
/// ```rust
/// use fastschema_link::helpers::create_object_id;
/// use serde_json::json;
///
/// assert_eq!(create_object_id(&json!({"b": 2, "a": [3, 1, 2]})).unwrap(), r#"{"a":[1,2,3],"b":2}"#);
/// ```
pub fn create_object_id<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(fingerprint(&value))
}

fn fingerprint(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort_by(|a, b| collate(a, b));
            let body = keys
                .into_iter()
                .map(|key| format!("{}:{}", JsonValue::String(key.clone()), fingerprint(&map[key])))
                .collect::<Vec<_>>()
                .join(",");
            format!("{{{}}}", body)
        },
        JsonValue::Array(items) => {
            let mut parts: Vec<String> = items.iter().map(fingerprint).collect();
            parts.sort_by(|a, b| collate(a, b));
            format!("[{}]", parts.join(","))
        },
        scalar => scalar.to_string(),
    }
}

/// Punctuation in collation order; anything not listed sorts after it and
/// before digits.
const PUNCTUATION_ORDER: &str = "_-,;:!?.'\"()[]{}@*/\\&#%`^+<=>|~$";

/// Collation-style comparison: whitespace, then punctuation, then digits,
/// then letters (case-insensitive). Ties fall back to byte order.
fn collate(a: &str, b: &str) -> Ordering {
    let primary = a.chars().map(collation_key).cmp(b.chars().map(collation_key));
    primary.then_with(|| a.cmp(b))
}

fn collation_key(c: char) -> (u8, u32) {
    if c.is_whitespace() {
        (0, c as u32)
    } else if c.is_ascii_digit() {
        (2, c as u32)
    } else if c.is_alphabetic() {
        let lower = c.to_lowercase().next().unwrap_or(c);
        (3, lower as u32)
    } else {
        match PUNCTUATION_ORDER.find(c) {
            Some(idx) => (1, idx as u32),
            None => (1, PUNCTUATION_ORDER.len() as u32 + c as u32),
        }
    }
}
