//! FastSchema client with builder pattern.
//!
//! [`FastSchemaClient`] wires the transport, auth, schema registry and
//! realtime engine together. Clones share every piece of state: the token
//! store, the schema cache and the set of active subscriptions.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::Auth,
    credentials::{MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY},
    error::{FastSchemaError, Result},
    event_handlers::EventHandlers,
    realtime::{Connector, Realtime, TungsteniteConnector},
    schema::{FileSchema, Schema, Schemas, FILE_SCHEMA},
    timeouts::ClientTimeouts,
    transport::{AuthHeaderMode, Transport},
};

const DEFAULT_API_BASE_NAME: &str = "api";

/// Main client for a FastSchema server.
///
/// # Examples
///
/// ```rust,no_run
/// use fastschema_link::{Content, EventCallback, EventKind, FastSchemaClient};
///
/// # async fn example() -> fastschema_link::Result<()> {
/// let client = FastSchemaClient::builder()
///     .base_url("http://localhost:8000")
///     .build()?;
///
/// client.init().await?;
///
/// let tags = client.schema("tag");
/// let tag: Content = tags.create(&serde_json::json!({ "name": "rust" })).await?;
///
/// let callback = EventCallback::<Content>::new(|event| {
///     if let Ok(event) = event {
///         println!("{:?}", event.event);
///     }
/// });
/// tags.on(EventKind::Create, callback.clone()).await?;
/// tags.off(&callback);
/// # let _ = tag;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct FastSchemaClient {
    transport: Transport,
    auth: Auth,
    schemas: Schemas,
    realtime: Realtime,
    timeouts: ClientTimeouts,
}

impl std::fmt::Debug for FastSchemaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FastSchemaClient")
            .field("transport", &self.transport)
            .field("realtime", &self.realtime)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

impl FastSchemaClient {
    /// Create a new client builder.
    pub fn builder() -> FastSchemaClientBuilder {
        FastSchemaClientBuilder::new()
    }

    /// Fetch the schema definitions so that [`schema`](Self::schema) returns
    /// populated handles.
    pub async fn init(&self) -> Result<()> {
        self.schemas.sync().await
    }

    /// Refresh the cached schema definitions.
    pub async fn sync_schemas(&self) -> Result<()> {
        self.schemas.sync().await
    }

    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    pub fn transport(&self) -> &Transport {
        &self.transport
    }

    pub fn schemas(&self) -> &Schemas {
        &self.schemas
    }

    /// Handle for one schema. See [`Schemas::schema`].
    pub fn schema(&self, name: &str) -> Schema {
        self.schemas.schema(name)
    }

    /// The built-in `file` schema with uploads.
    pub fn file(&self) -> FileSchema {
        FileSchema::new(self.schemas.schema(FILE_SCHEMA))
    }

    pub fn realtime(&self) -> &Realtime {
        &self.realtime
    }

    pub fn base_url(&self) -> &str {
        self.transport.base_url()
    }

    pub fn base_api_url(&self) -> &str {
        self.transport.base_api_url()
    }

    /// Get the configured timeouts
    pub fn timeouts(&self) -> &ClientTimeouts {
        &self.timeouts
    }
}

/// Builder for configuring [`FastSchemaClient`] instances.
pub struct FastSchemaClientBuilder {
    base_url: Option<String>,
    api_base_name: String,
    auth_key: String,
    token_store: Option<Arc<dyn TokenStore>>,
    header_mode: AuthHeaderMode,
    timeouts: ClientTimeouts,
    connector: Option<Arc<dyn Connector>>,
    event_handlers: EventHandlers,
}

impl FastSchemaClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            api_base_name: DEFAULT_API_BASE_NAME.to_string(),
            auth_key: DEFAULT_TOKEN_KEY.to_string(),
            token_store: None,
            header_mode: AuthHeaderMode::default(),
            timeouts: ClientTimeouts::default(),
            connector: None,
            event_handlers: EventHandlers::default(),
        }
    }

    /// Server root URL, e.g. `http://localhost:8000`.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Path segment for the API under the base URL. Defaults to `api`.
    pub fn api_base_name(mut self, name: impl Into<String>) -> Self {
        self.api_base_name = name.into();
        self
    }

    /// Key the default in-memory store files the token under. Ignored when a
    /// custom [`token_store`](Self::token_store) is supplied.
    pub fn auth_key(mut self, key: impl Into<String>) -> Self {
        self.auth_key = key.into();
        self
    }

    pub fn token_store(mut self, store: Arc<dyn TokenStore>) -> Self {
        self.token_store = Some(store);
        self
    }

    pub fn auth_header(mut self, mode: AuthHeaderMode) -> Self {
        self.header_mode = mode;
        self
    }

    /// Set the HTTP request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    pub fn timeouts(mut self, timeouts: ClientTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Replace the realtime connection factory.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<FastSchemaClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| FastSchemaError::ConfigurationError("base_url is required".into()))?;

        let mut client_builder = reqwest::Client::builder();
        if !ClientTimeouts::is_no_timeout(self.timeouts.request_timeout) {
            client_builder = client_builder.timeout(self.timeouts.request_timeout);
        }
        if !ClientTimeouts::is_no_timeout(self.timeouts.connection_timeout) {
            client_builder = client_builder.connect_timeout(self.timeouts.connection_timeout);
        }
        let http_client = client_builder.build().map_err(|e| {
            FastSchemaError::ConfigurationError(format!("Failed to build HTTP client: {}", e))
        })?;

        let token_store = self
            .token_store
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::new(self.auth_key)));

        let transport = Transport::new(
            &base_url,
            &self.api_base_name,
            http_client,
            token_store,
            self.header_mode,
        )?;

        let connector = self
            .connector
            .unwrap_or_else(|| Arc::new(TungsteniteConnector::new()));
        let realtime = Realtime::new(
            transport.clone(),
            connector,
            self.event_handlers,
            self.timeouts.connection_timeout,
        );
        let schemas = Schemas::new(transport.clone(), realtime.clone());
        let auth = Auth::new(transport.clone());

        Ok(FastSchemaClient {
            transport,
            auth,
            schemas,
            realtime,
            timeouts: self.timeouts,
        })
    }
}
