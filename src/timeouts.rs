//! Timeout configuration for FastSchema client operations.

use std::time::Duration;

/// Timeouts applied to HTTP requests and realtime handshakes.
///
/// `Duration::ZERO` disables a timeout.
///
/// # Examples
///
/// ```rust
/// use fastschema_link::ClientTimeouts;
/// use std::time::Duration;
///
/// let timeouts = ClientTimeouts::builder()
///     .connection_timeout(Duration::from_secs(3))
///     .request_timeout_secs(60)
///     .build();
/// assert_eq!(timeouts.request_timeout, Duration::from_secs(60));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTimeouts {
    /// TCP + TLS connect time for HTTP calls, and the full websocket
    /// handshake for realtime subscriptions.
    /// Default: 10 seconds
    pub connection_timeout: Duration,

    /// Total time allowed for one HTTP request/response exchange.
    /// Default: 30 seconds
    pub request_timeout: Duration,
}

impl Default for ClientTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientTimeouts {
    pub fn builder() -> ClientTimeoutsBuilder {
        ClientTimeoutsBuilder::new()
    }

    /// Short timeouts for a server on localhost.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
        }
    }

    /// Long timeouts for remote or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(120),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }
}

/// Builder for [`ClientTimeouts`].
#[derive(Debug, Clone)]
pub struct ClientTimeoutsBuilder {
    timeouts: ClientTimeouts,
}

impl ClientTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: ClientTimeouts::default(),
        }
    }

    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    pub fn connection_timeout_secs(self, secs: u64) -> Self {
        self.connection_timeout(Duration::from_secs(secs))
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request_timeout = timeout;
        self
    }

    pub fn request_timeout_secs(self, secs: u64) -> Self {
        self.request_timeout(Duration::from_secs(secs))
    }

    pub fn build(self) -> ClientTimeouts {
        self.timeouts
    }
}
