//! Lifecycle hooks for realtime connections.
//!
//! Hooks observe every subscription of a client; they never replace the
//! per-subscription callback, which is where change events and terminal
//! errors are delivered. Each hook receives the id of the subscription whose
//! connection triggered it.
//!
//! - [`on_connect`](EventHandlers::on_connect): handshake completed
//! - [`on_disconnect`](EventHandlers::on_disconnect): connection ended, for any reason
//! - [`on_error`](EventHandlers::on_error): handshake failure or socket-level error
//! - [`on_receive`](EventHandlers::on_receive): raw inbound text frame (debug hook)
//!
//! # Example
//!
//! ```rust,no_run
//! use fastschema_link::{EventHandlers, FastSchemaClient};
//!
//! # fn example() -> fastschema_link::Result<()> {
//! let handlers = EventHandlers::new()
//!     .on_connect(|id| println!("subscription {} connected", id))
//!     .on_disconnect(|id, reason| println!("subscription {} closed: {}", id, reason))
//!     .on_error(|id, err| eprintln!("subscription {} error: {}", id, err));
//!
//! let client = FastSchemaClient::builder()
//!     .base_url("http://localhost:8000")
//!     .event_handlers(handlers)
//!     .build()?;
//! # Ok(())
//! # }
//! ```

use std::fmt;
use std::sync::Arc;

/// Normal closure code.
pub const CLOSE_NORMAL: u16 = 1000;

/// Reason attached to a disconnect event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReason {
    pub message: String,
    /// Close code, when the connection ended with one (1000 = normal, 1006 = abnormal)
    pub code: Option<u16>,
}

impl DisconnectReason {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code: Some(code),
        }
    }

    /// `true` for a client- or server-initiated normal closure.
    pub fn is_normal(&self) -> bool {
        self.code == Some(CLOSE_NORMAL)
    }
}

impl fmt::Display for DisconnectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(code) = self.code {
            write!(f, "{} (code: {})", self.message, code)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Socket-level error passed to the `on_error` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketError {
    pub message: String,
}

impl SocketError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

pub type OnConnectCallback = Arc<dyn Fn(u64) + Send + Sync>;
pub type OnDisconnectCallback = Arc<dyn Fn(u64, DisconnectReason) + Send + Sync>;
pub type OnErrorCallback = Arc<dyn Fn(u64, SocketError) + Send + Sync>;
pub type OnReceiveCallback = Arc<dyn Fn(u64, &str) + Send + Sync>;

/// Realtime lifecycle hooks. All optional.
#[derive(Clone, Default)]
pub struct EventHandlers {
    pub(crate) on_connect: Option<OnConnectCallback>,
    pub(crate) on_disconnect: Option<OnDisconnectCallback>,
    pub(crate) on_error: Option<OnErrorCallback>,
    pub(crate) on_receive: Option<OnReceiveCallback>,
}

impl fmt::Debug for EventHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventHandlers")
            .field("on_connect", &self.on_connect.is_some())
            .field("on_disconnect", &self.on_disconnect.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_receive", &self.on_receive.is_some())
            .finish()
    }
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_connect(mut self, f: impl Fn(u64) + Send + Sync + 'static) -> Self {
        self.on_connect = Some(Arc::new(f));
        self
    }

    /// Fired once per connection, whatever ended it.
    pub fn on_disconnect(
        mut self,
        f: impl Fn(u64, DisconnectReason) + Send + Sync + 'static,
    ) -> Self {
        self.on_disconnect = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(u64, SocketError) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    /// Raw text of every inbound frame, before decoding.
    pub fn on_receive(mut self, f: impl Fn(u64, &str) + Send + Sync + 'static) -> Self {
        self.on_receive = Some(Arc::new(f));
        self
    }

    pub fn has_any(&self) -> bool {
        self.on_connect.is_some()
            || self.on_disconnect.is_some()
            || self.on_error.is_some()
            || self.on_receive.is_some()
    }

    pub(crate) fn emit_connect(&self, id: u64) {
        if let Some(cb) = &self.on_connect {
            cb(id);
        }
    }

    pub(crate) fn emit_disconnect(&self, id: u64, reason: DisconnectReason) {
        if let Some(cb) = &self.on_disconnect {
            cb(id, reason);
        }
    }

    pub(crate) fn emit_error(&self, id: u64, error: SocketError) {
        if let Some(cb) = &self.on_error {
            cb(id, error);
        }
    }

    pub(crate) fn emit_receive(&self, id: u64, raw: &str) {
        if let Some(cb) = &self.on_receive {
            cb(id, raw);
        }
    }
}
