//! Token storage for FastSchema clients.
//!
//! The client persists the access token it receives from `login` through a
//! [`TokenStore`] and reads it back before every authenticated request and
//! realtime handshake. Every method takes an optional key so one process can
//! hold tokens for several users; `None` means the store's default key.
//!
//! Two backends ship with the crate:
//!
//! - [`MemoryTokenStore`]: keyed in-memory map, the default
//! - [`FileTokenStore`]: TOML file in the user's config directory, written
//!   with owner-only permissions

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use crate::error::{FastSchemaError, Result};

/// Default key used when no key is supplied.
pub const DEFAULT_TOKEN_KEY: &str = "token";

/// Storage backend for access tokens.
///
/// # Example Implementation
///
/// ```rust,ignore
/// use fastschema_link::{Result, TokenStore};
///
/// struct EnvTokenStore;
///
/// #[async_trait::async_trait]
/// impl TokenStore for EnvTokenStore {
///     fn default_key(&self) -> &str {
///         "FASTSCHEMA_TOKEN"
///     }
///
///     async fn set_token(&self, _token: &str, _key: Option<&str>) -> Result<()> {
///         Ok(())
///     }
///
///     async fn get_token(&self, key: Option<&str>) -> Result<Option<String>> {
///         Ok(std::env::var(key.unwrap_or(self.default_key())).ok())
///     }
///
///     async fn clear_token(&self, _key: Option<&str>) -> Result<()> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Key used when a call passes `None`.
    fn default_key(&self) -> &str;

    /// Store `token`, overwriting any previous value under the same key.
    async fn set_token(&self, token: &str, key: Option<&str>) -> Result<()>;

    /// Read the token stored under `key`. `Ok(None)` when nothing is stored.
    async fn get_token(&self, key: Option<&str>) -> Result<Option<String>>;

    /// Remove the token stored under `key`. Succeeds when nothing is stored.
    async fn clear_token(&self, key: Option<&str>) -> Result<()>;
}

/// In-memory token store.
///
/// Tokens do not survive a restart.
///
/// ```rust
/// use fastschema_link::{MemoryTokenStore, TokenStore};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> fastschema_link::Result<()> {
/// let store = MemoryTokenStore::new("token");
/// store.set_token("abc", None).await?;
/// store.set_token("xyz", Some("alice")).await?;
/// assert_eq!(store.get_token(None).await?, Some("abc".to_string()));
/// assert_eq!(store.get_token(Some("alice")).await?, Some("xyz".to_string()));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MemoryTokenStore {
    default_key: String,
    tokens: RwLock<HashMap<String, String>>,
}

impl MemoryTokenStore {
    pub fn new(default_key: impl Into<String>) -> Self {
        Self {
            default_key: default_key.into(),
            tokens: RwLock::new(HashMap::new()),
        }
    }

    fn resolve<'a>(&'a self, key: Option<&'a str>) -> &'a str {
        key.unwrap_or(&self.default_key)
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new(DEFAULT_TOKEN_KEY)
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    fn default_key(&self) -> &str {
        &self.default_key
    }

    async fn set_token(&self, token: &str, key: Option<&str>) -> Result<()> {
        let key = self.resolve(key).to_string();
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| FastSchemaError::StoreError("token store lock poisoned".into()))?;
        tokens.insert(key, token.to_string());
        Ok(())
    }

    async fn get_token(&self, key: Option<&str>) -> Result<Option<String>> {
        let tokens = self
            .tokens
            .read()
            .map_err(|_| FastSchemaError::StoreError("token store lock poisoned".into()))?;
        Ok(tokens.get(self.resolve(key)).cloned())
    }

    async fn clear_token(&self, key: Option<&str>) -> Result<()> {
        let mut tokens = self
            .tokens
            .write()
            .map_err(|_| FastSchemaError::StoreError("token store lock poisoned".into()))?;
        tokens.remove(self.resolve(key));
        Ok(())
    }
}

/// On-disk layout of the token file.
///
/// ```toml
/// [tokens]
/// token = "eyJhbGciOi..."
/// alice = "eyJhbGciOi..."
/// ```
#[derive(Debug, Default, Serialize, Deserialize)]
struct TokenFile {
    #[serde(default)]
    tokens: BTreeMap<String, String>,
}

/// File-based token store.
///
/// Loads the file once on construction and rewrites it on every change.
/// Default location: `<config dir>/fastschema/tokens.toml`.
#[derive(Debug)]
pub struct FileTokenStore {
    file_path: PathBuf,
    default_key: String,
    cache: Mutex<BTreeMap<String, String>>,
}

impl FileTokenStore {
    /// Default token file path.
    pub fn default_path() -> PathBuf {
        if let Some(config_dir) = dirs::config_dir() {
            config_dir.join("fastschema").join("tokens.toml")
        } else if let Some(home_dir) = dirs::home_dir() {
            home_dir.join(".fastschema").join("tokens.toml")
        } else {
            PathBuf::from(".fastschema").join("tokens.toml")
        }
    }

    /// Open the store at the default location.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_path())
    }

    /// Open the store at a custom location. A missing file is an empty store.
    pub fn with_path(file_path: impl Into<PathBuf>) -> Result<Self> {
        let file_path = file_path.into();
        let tokens = Self::load(&file_path)?;
        Ok(Self {
            file_path,
            default_key: DEFAULT_TOKEN_KEY.to_string(),
            cache: Mutex::new(tokens),
        })
    }

    pub fn with_default_key(mut self, key: impl Into<String>) -> Self {
        self.default_key = key.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            FastSchemaError::StoreError(format!(
                "Cannot read token file '{}': {}",
                path.display(),
                e
            ))
        })?;

        let file: TokenFile = toml::from_str(&contents).map_err(|e| {
            FastSchemaError::StoreError(format!(
                "Corrupted token file '{}': {}",
                path.display(),
                e.message()
            ))
        })?;
        Ok(file.tokens)
    }

    fn save(&self, tokens: &BTreeMap<String, String>) -> Result<()> {
        let file = TokenFile {
            tokens: tokens.clone(),
        };
        let contents = toml::to_string_pretty(&file).map_err(|e| {
            FastSchemaError::StoreError(format!("Failed to serialize tokens: {}", e))
        })?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    FastSchemaError::StoreError(format!(
                        "Failed to create token directory '{}': {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        fs::write(&self.file_path, contents).map_err(|e| {
            FastSchemaError::StoreError(format!(
                "Failed to write token file '{}': {}",
                self.file_path.display(),
                e
            ))
        })?;

        // Owner read/write only
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.file_path, fs::Permissions::from_mode(0o600)).map_err(
                |e| {
                    FastSchemaError::StoreError(format!(
                        "Failed to set permissions on '{}': {}",
                        self.file_path.display(),
                        e
                    ))
                },
            )?;
        }

        Ok(())
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| FastSchemaError::StoreError("token store lock poisoned".into()))?;
        f(&mut cache);
        self.save(&cache)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    fn default_key(&self) -> &str {
        &self.default_key
    }

    async fn set_token(&self, token: &str, key: Option<&str>) -> Result<()> {
        let key = key.unwrap_or(&self.default_key).to_string();
        self.update(|tokens| {
            tokens.insert(key, token.to_string());
        })
    }

    async fn get_token(&self, key: Option<&str>) -> Result<Option<String>> {
        let cache = self
            .cache
            .lock()
            .map_err(|_| FastSchemaError::StoreError("token store lock poisoned".into()))?;
        Ok(cache.get(key.unwrap_or(&self.default_key)).cloned())
    }

    async fn clear_token(&self, key: Option<&str>) -> Result<()> {
        let key = key.unwrap_or(&self.default_key).to_string();
        self.update(|tokens| {
            tokens.remove(&key);
        })
    }
}
