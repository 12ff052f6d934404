//! Realtime subscription engine.
//!
//! Every [`Realtime::subscribe`] call opens one dedicated connection to
//! `<ws|wss>://<host>/<api>/realtime/content` scoped by schema, event kind and
//! the optional id / select / filter, and spawns a reader task that delivers
//! each pushed change to the subscription's [`EventCallback`].
//!
//! Delivery contract:
//!
//! - `Ok(ChangeEvent)` for every frame, in the order the server sent them
//! - `Err(FastSchemaError::ConnectionError)` once, when the connection ends
//!   with a code other than 1000 or with a non-empty reason; the subscription
//!   is then gone
//! - `Err(FastSchemaError::DecodeError)` for a frame that cannot be decoded;
//!   the subscription stays active
//!
//! There is no reconnect. A dropped connection ends that subscription.
//!
//! ```rust,no_run
//! use fastschema_link::{Content, EventCallback, EventKind, FastSchemaClient, SubscribeConfig};
//!
//! # async fn example() -> fastschema_link::Result<()> {
//! let client = FastSchemaClient::builder().base_url("http://localhost:8000").build()?;
//!
//! let callback = EventCallback::<Content>::new(|result| match result {
//!     Ok(change) => println!("{} -> {} record(s)", change.event, change.data.len()),
//!     Err(err) => eprintln!("subscription ended: {}", err),
//! });
//!
//! let tags = client.schema("tag");
//! tags.on(SubscribeConfig::new(EventKind::Update).with_id(5), callback.clone()).await?;
//! // ...
//! tags.off(&callback);
//! # Ok(())
//! # }
//! ```

pub mod connection;
mod reader;
mod registry;

use log::debug;
use serde::de::DeserializeOwned;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;

use crate::error::{FastSchemaError, Result};
use crate::event_handlers::{EventHandlers, SocketError};
use crate::models::{ChangeEvent, Content, EventFrame, EventPayload, Scope, SubscribeConfig};
use crate::timeouts::ClientTimeouts;
use crate::transport::Transport;

pub use connection::{ConnectRequest, Connector, Inbound, RealtimeConnection, TungsteniteConnector};
pub use registry::CallbackKey;

use reader::{realtime_reader_loop, ReaderContext};
use registry::{Registration, Registry};

/// Type-erased callback stored by the engine.
pub(crate) type RawCallback = Arc<dyn Fn(Result<EventFrame>) + Send + Sync>;

type CallbackFn<T> = dyn Fn(Result<ChangeEvent<T>>) + Send + Sync;

/// Subscription callback.
///
/// Clones share identity: registering a clone and passing the first handle to
/// `unsubscribe` removes it.
pub struct EventCallback<T = Content> {
    inner: Arc<CallbackFn<T>>,
}

impl<T> EventCallback<T> {
    pub fn new(f: impl Fn(Result<ChangeEvent<T>>) + Send + Sync + 'static) -> Self {
        Self { inner: Arc::new(f) }
    }

    /// Identity used by the subscription registry.
    pub fn key(&self) -> CallbackKey {
        CallbackKey(Arc::as_ptr(&self.inner) as *const () as usize)
    }

    /// `true` when both handles refer to the same callback.
    pub fn same(&self, other: &EventCallback<T>) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn call(&self, result: Result<ChangeEvent<T>>) {
        (self.inner)(result)
    }
}

impl<T> Clone for EventCallback<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> fmt::Debug for EventCallback<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EventCallback").field(&self.key()).finish()
    }
}

/// Wrap a typed callback so the engine can hand it raw frames.
fn erase<T>(callback: EventCallback<T>) -> RawCallback
where
    T: DeserializeOwned + 'static,
{
    Arc::new(move |frame: Result<EventFrame>| {
        let result = frame.and_then(|frame| {
            EventPayload::from_value(frame.data).map(|data| ChangeEvent {
                event: frame.event,
                data,
            })
        });
        callback.call(result);
    })
}

/// Query string of a realtime connection: `schema`, `event`, then `id`,
/// `select` and `filter` when set.
pub fn realtime_query(schema: &str, config: &SubscribeConfig) -> Result<String> {
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    query.append_pair("schema", schema);
    query.append_pair("event", config.event.as_str());
    if let Some(id) = config.id.filter(|id| *id > 0) {
        query.append_pair("id", &id.to_string());
    }
    if let Some(select) = config.select.as_deref().filter(|s| !s.is_empty()) {
        query.append_pair("select", select);
    }
    if let Some(filter) = &config.filter {
        query.append_pair("filter", &filter.to_json()?);
    }
    Ok(query.finish())
}

/// Handle to one active subscription.
#[derive(Clone)]
pub struct SubscriptionHandle {
    id: u64,
    registry: Registry,
}

impl SubscriptionHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// `true` until the subscription is unsubscribed or its connection ends.
    pub fn is_active(&self) -> bool {
        self.registry.contains_id(self.id)
    }

    /// Close this subscription only, leaving other subscriptions that share
    /// its callback untouched. Returns `false` if it was already closed.
    pub fn close(&self) -> bool {
        match self.registry.remove_by_id(self.id) {
            Some(registration) => {
                registration.signal_close();
                true
            },
            None => false,
        }
    }
}

impl fmt::Debug for SubscriptionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

/// The subscription engine. Cheap to clone; clones share the active set.
#[derive(Clone)]
pub struct Realtime {
    transport: Transport,
    connector: Arc<dyn Connector>,
    handlers: EventHandlers,
    registry: Registry,
    next_id: Arc<AtomicU64>,
    connect_timeout: Duration,
}

impl fmt::Debug for Realtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Realtime")
            .field("active", &self.registry.len())
            .field("connect_timeout", &self.connect_timeout)
            .field("handlers", &self.handlers)
            .finish()
    }
}

impl Realtime {
    pub(crate) fn new(
        transport: Transport,
        connector: Arc<dyn Connector>,
        handlers: EventHandlers,
        connect_timeout: Duration,
    ) -> Self {
        Self {
            transport,
            connector,
            handlers,
            registry: Registry::default(),
            next_id: Arc::new(AtomicU64::new(1)),
            connect_timeout,
        }
    }

    /// Open a subscription on `schema`.
    ///
    /// Fails with `InvalidArgument("callback is required")` when `callback`
    /// is `None`, before any connection is attempted. A failed handshake is
    /// returned as `ConnectionError`; nothing is registered in that case.
    ///
    /// Handshake failures never reach `callback`: check the returned `Result`.
    /// Only errors after the connection is up (abnormal closes, undecodable
    /// frames) are delivered through the callback.
    pub async fn subscribe<T>(
        &self,
        schema: &str,
        scope: impl Into<Scope>,
        callback: Option<EventCallback<T>>,
    ) -> Result<SubscriptionHandle>
    where
        T: DeserializeOwned + 'static,
    {
        let callback =
            callback.ok_or_else(|| FastSchemaError::invalid_argument("callback is required"))?;
        let schema = schema.trim();
        if schema.is_empty() {
            return Err(FastSchemaError::invalid_argument("schema name is required"));
        }

        let config = scope.into().into_config();
        let query = realtime_query(schema, &config)?;
        let url = self.transport.realtime_url(&query)?;
        let token = self.transport.auth_token().await?;

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            "[FS_REALTIME] [{}] Connecting: schema={} event={} id={:?} once={}",
            id, schema, config.event, config.id, config.once
        );

        let connection = match self.open(ConnectRequest { url, token }).await {
            Ok(connection) => connection,
            Err(e) => {
                debug!("[FS_REALTIME] [{}] Handshake failed: {}", id, e);
                self.handlers.emit_error(id, SocketError::new(e.to_string()));
                return Err(e);
            },
        };
        self.handlers.emit_connect(id);

        let key = callback.key();
        let (close_tx, close_rx) = oneshot::channel();
        self.registry.insert(Registration {
            id,
            key,
            schema: schema.to_string(),
            close_tx: Some(close_tx),
        });

        tokio::spawn(realtime_reader_loop(
            connection,
            close_rx,
            ReaderContext {
                id,
                key,
                schema: schema.to_string(),
                once: config.once,
                callback: erase(callback),
                registry: self.registry.clone(),
                handlers: self.handlers.clone(),
            },
        ));

        Ok(SubscriptionHandle {
            id,
            registry: self.registry.clone(),
        })
    }

    async fn open(&self, request: ConnectRequest) -> Result<Box<dyn RealtimeConnection>> {
        if ClientTimeouts::is_no_timeout(self.connect_timeout) {
            return self.connector.connect(request).await;
        }
        match tokio::time::timeout(self.connect_timeout, self.connector.connect(request)).await {
            Ok(result) => result,
            Err(_) => Err(FastSchemaError::ConnectionError(format!(
                "Connection timeout ({:?})",
                self.connect_timeout
            ))),
        }
    }

    /// Remove every subscription registered under `callback` and close their
    /// connections normally. Returns how many were removed; `0` is not an
    /// error.
    pub fn unsubscribe<T>(&self, callback: &EventCallback<T>) -> usize {
        let removed = self.registry.remove_by_key(callback.key());
        let count = removed.len();
        for registration in removed {
            registration.signal_close();
        }
        if count > 0 {
            debug!("[FS_REALTIME] Unsubscribed {} subscription(s)", count);
        }
        count
    }

    /// Like [`Realtime::unsubscribe`], but only for subscriptions on
    /// `schema`. Registrations of the same callback on other schemas stay
    /// open.
    pub fn unsubscribe_from<T>(&self, schema: &str, callback: &EventCallback<T>) -> usize {
        let removed = self
            .registry
            .remove_by_key_and_schema(callback.key(), schema.trim());
        let count = removed.len();
        for registration in removed {
            registration.signal_close();
        }
        if count > 0 {
            debug!("[FS_REALTIME] Unsubscribed {} subscription(s) on {}", count, schema);
        }
        count
    }

    pub fn is_subscribed<T>(&self, callback: &EventCallback<T>) -> bool {
        self.registry.contains_key(callback.key())
    }

    /// Number of active subscriptions.
    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    /// Number of active subscriptions on `schema`.
    pub fn active_count_for(&self, schema: &str) -> usize {
        self.registry.count_for_schema(schema)
    }
}
