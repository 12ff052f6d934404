//! # fastschema-link
//!
//! Async Rust client for a FastSchema headless CMS server: content CRUD,
//! schema management, token-based authentication and realtime change
//! subscriptions over WebSocket.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use fastschema_link::{Content, EventCallback, EventKind, FastSchemaClient, LoginData};
//!
//! # async fn example() -> fastschema_link::Result<()> {
//! let client = FastSchemaClient::builder()
//!     .base_url("http://localhost:8000")
//!     .build()?;
//!
//! client.auth().login("local", &LoginData::new("admin", "123")).await?;
//! client.init().await?;
//!
//! let posts = client.schema("post");
//! let page = posts.list::<Content>(None).await?;
//! println!("{} post(s)", page.total);
//!
//! let handle = posts
//!     .on(EventKind::All, EventCallback::<Content>::new(|event| match event {
//!         Ok(change) => println!("{} {:?}", change.event, change.data),
//!         Err(e) => eprintln!("subscription ended: {}", e),
//!     }))
//!     .await?;
//! handle.close();
//! # Ok(())
//! # }
//! ```
//!
//! ## Listing with filters
//!
//! ```rust
//! use fastschema_link::helpers::content_filter_query;
//! use fastschema_link::{Filter, FilterOperator, ListOptions};
//!
//! let options = ListOptions::new()
//!     .with_limit(10)
//!     .with_filter(Filter::new().op("name", FilterOperator::Like, "%rust%"));
//! let query = content_filter_query(Some(&options)).unwrap();
//! assert!(query.starts_with("limit=10&filter="));
//! ```
//!
//! ## Logging
//!
//! The crate logs through the `log` facade with `[FS_HTTP]`, `[FS_AUTH]`,
//! `[FS_REALTIME]` and `[FS_SCHEMA]` tags. Install any logger to see them.

pub mod auth;
pub mod client;
pub mod credentials;
pub mod error;
pub mod event_handlers;
pub mod helpers;
pub mod models;
pub mod realtime;
pub mod schema;
pub mod timeouts;
pub mod transport;

pub use auth::{Auth, AuthState};
pub use client::{FastSchemaClient, FastSchemaClientBuilder};
pub use credentials::{FileTokenStore, MemoryTokenStore, TokenStore, DEFAULT_TOKEN_KEY};
pub use error::{FastSchemaError, Result};
pub use event_handlers::{DisconnectReason, EventHandlers, SocketError};
pub use models::{
    AuthData, ChangeEvent, Content, EventFrame, EventKind, EventPayload, Field, Filter,
    FilterOperator, ListOptions, LoginData, LoginResponse, Media, Pagination, RecordId,
    ResponseEnvelope, ResponseError, Role, SchemaData, SchemaUpdateData, Scope, SubscribeConfig,
    TokenHeader, TokenPayload, UploadFile, UploadResult, User,
};
pub use realtime::{
    CallbackKey, ConnectRequest, Connector, EventCallback, Inbound, Realtime, RealtimeConnection,
    SubscriptionHandle, TungsteniteConnector,
};
pub use schema::{FileSchema, Schema, Schemas, FILE_SCHEMA};
pub use timeouts::{ClientTimeouts, ClientTimeoutsBuilder};
pub use transport::{AuthHeaderMode, RequestOptions, Transport};
