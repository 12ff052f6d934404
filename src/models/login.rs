use serde::{Deserialize, Serialize};

/// Credentials posted to `/auth/<provider>/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginData {
    pub login: String,
    pub password: String,
}

impl LoginData {
    pub fn new(login: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            password: password.into(),
        }
    }
}

/// Successful login reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// JWT access token
    pub token: String,
    /// Expiry timestamp as sent by the server
    #[serde(default)]
    pub expires: String,
}
