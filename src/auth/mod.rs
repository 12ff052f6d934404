//! Authentication state for a FastSchema client.
//!
//! [`Auth`] logs in against a provider, decodes the returned token, persists
//! it through the client's [`TokenStore`](crate::TokenStore) and keeps the
//! decoded [`AuthData`] cached. The cache is an explicit two-state value:
//! nothing is read from the store until [`Auth::ensure_loaded`] (or
//! [`Auth::data`], which calls it) runs.

pub mod token;

use log::debug;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::{FastSchemaError, Result};
use crate::helpers::encode_path_segment;
use crate::models::{AuthData, LoginData, LoginResponse, User};
use crate::transport::Transport;

pub use token::{decode_token, parse_auth_data};

/// Cached authentication state.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthState {
    /// The token store has not been consulted yet
    Unloaded,
    /// Hydrated; `None` means no usable token anywhere
    Loaded(Option<AuthData>),
}

/// Login, token and session handling.
#[derive(Clone)]
pub struct Auth {
    transport: Transport,
    state: Arc<Mutex<AuthState>>,
}

impl Auth {
    pub(crate) fn new(transport: Transport) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(AuthState::Unloaded)),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Log in with `provider` (e.g. `local`).
    ///
    /// Posts the credentials to `/auth/<provider>/login`, decodes the returned
    /// token, stores it and caches the result.
    pub async fn login(&self, provider: &str, credentials: &LoginData) -> Result<AuthData> {
        let provider = provider.trim();
        if provider.is_empty() {
            return Err(FastSchemaError::invalid_argument("provider is required"));
        }

        debug!("[FS_AUTH] Logging in via provider '{}' as '{}'", provider, credentials.login);
        let response: LoginResponse = self
            .transport
            .post(&format!("/auth/{}/login", encode_path_segment(provider)), credentials)
            .await?;

        let mut data = token::parse_auth_data(&response.token)?;
        data.expires = response.expires;

        self.transport.token_store().set_token(&data.token, None).await?;
        *self.lock_state() = AuthState::Loaded(Some(data.clone()));
        debug!("[FS_AUTH] Login succeeded, token exp={:?}", data.exp);
        Ok(data)
    }

    /// Adopt an externally issued token. No network access and nothing is
    /// written to the token store.
    pub fn use_token(&self, token: &str) -> Result<AuthData> {
        let data = token::parse_auth_data(token)?;
        *self.lock_state() = AuthState::Loaded(Some(data.clone()));
        Ok(data)
    }

    /// Hydrate the cache from the token store if it has not been loaded yet.
    ///
    /// A stored token that cannot be decoded is reported as `DecodeError` and
    /// the cache stays unloaded.
    pub async fn ensure_loaded(&self) -> Result<()> {
        if self.is_loaded() {
            return Ok(());
        }

        let stored = self.transport.token_store().get_token(None).await?;
        let data = match stored.as_deref().filter(|t| !t.is_empty()) {
            Some(token) => Some(token::parse_auth_data(token)?),
            None => None,
        };

        let mut state = self.lock_state();
        // A login or use_token may have completed while the store was read.
        if *state == AuthState::Unloaded {
            debug!("[FS_AUTH] Loaded auth state from store (token present: {})", data.is_some());
            *state = AuthState::Loaded(data);
        }
        Ok(())
    }

    /// Current auth data, hydrating from the store on first use.
    pub async fn data(&self) -> Result<Option<AuthData>> {
        self.ensure_loaded().await?;
        Ok(self.cached())
    }

    /// Cached auth data without touching the store.
    pub fn cached(&self) -> Option<AuthData> {
        match &*self.lock_state() {
            AuthState::Loaded(data) => data.clone(),
            AuthState::Unloaded => None,
        }
    }

    pub fn state(&self) -> AuthState {
        self.lock_state().clone()
    }

    pub fn is_loaded(&self) -> bool {
        matches!(*self.lock_state(), AuthState::Loaded(_))
    }

    /// Fetch the authenticated user from `/auth/me`.
    pub async fn me(&self) -> Result<User> {
        self.transport.get("/auth/me").await
    }

    /// Forget the session: the cache becomes empty and the stored token is
    /// removed.
    pub async fn logout(&self) -> Result<()> {
        *self.lock_state() = AuthState::Loaded(None);
        self.transport.token_store().clear_token(None).await?;
        debug!("[FS_AUTH] Logged out");
        Ok(())
    }
}
