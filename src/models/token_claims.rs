use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use super::user::User;

/// JOSE header of an access token.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenHeader {
    #[serde(default)]
    pub alg: String,
    #[serde(default)]
    pub typ: String,
}

/// Claims carried by an access token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TokenPayload {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
    /// Registered and custom claims not modelled above
    #[serde(flatten)]
    pub claims: Map<String, JsonValue>,
}
