use serde::{Deserialize, Serialize};

use super::user::User;

/// Decoded authentication state.
///
/// Built from a token's header (`alg`, `typ`) and payload (`exp`, `user`),
/// plus the raw token and the server-provided expiry string. Re-derived on
/// every login or `use_token`, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthData {
    pub alg: String,
    #[serde(default)]
    pub typ: String,
    /// Expiry as unix seconds, when the token carries one
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub user: Option<User>,
    pub token: String,
    /// Expiry string returned by the login endpoint; empty for tokens
    /// supplied through `use_token`
    #[serde(default)]
    pub expires: String,
}

impl AuthData {
    /// `true` when the token carries an `exp` claim at or before `now_unix`.
    pub fn is_expired_at(&self, now_unix: i64) -> bool {
        matches!(self.exp, Some(exp) if exp <= now_unix)
    }
}
