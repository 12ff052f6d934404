//! Per-subscription background reader task.
//!
//! Owns the connection once the handshake has completed. Decodes inbound
//! frames and hands them to the subscription callback in arrival order,
//! classifies closes, honors `once` (scoped to its own schema) and shuts down on the close signal sent by
//! `unsubscribe`.

use log::{debug, error};
use tokio::sync::oneshot;

use super::connection::{Inbound, RealtimeConnection, CLOSE_ABNORMAL};
use super::registry::{CallbackKey, Registry};
use super::RawCallback;
use crate::error::FastSchemaError;
use crate::event_handlers::{DisconnectReason, EventHandlers, SocketError, CLOSE_NORMAL};
use crate::models::EventFrame;

pub(crate) struct ReaderContext {
    pub(crate) id: u64,
    pub(crate) key: CallbackKey,
    pub(crate) schema: String,
    pub(crate) once: bool,
    pub(crate) callback: RawCallback,
    pub(crate) registry: Registry,
    pub(crate) handlers: EventHandlers,
}

/// Message delivered to the callback when a connection ends abnormally.
pub(crate) fn close_error_message(code: u16, reason: &str) -> String {
    format!("WS Closed with code = '{}' and reason = '{}'", code, reason)
}

pub(crate) async fn realtime_reader_loop(
    mut connection: Box<dyn RealtimeConnection>,
    mut close_rx: oneshot::Receiver<()>,
    ctx: ReaderContext,
) {
    let ReaderContext {
        id,
        key,
        schema,
        once,
        callback,
        registry,
        handlers,
    } = ctx;

    loop {
        let inbound = tokio::select! {
            biased;

            // Unsubscribed by the caller (or by a sibling `once` entry)
            _ = &mut close_rx => {
                debug!("[FS_REALTIME] [{}] Closing connection on request", id);
                connection.close(CLOSE_NORMAL).await;
                handlers.emit_disconnect(
                    id,
                    DisconnectReason::with_code("Subscription closed by client", CLOSE_NORMAL),
                );
                return;
            }

            inbound = connection.next_inbound() => inbound,
        };

        match inbound {
            Some(Inbound::Text(text)) => {
                handlers.emit_receive(id, &text);
                if !registry.contains_id(id) {
                    // Removed while the frame was in flight; the close
                    // signal is picked up on the next iteration.
                    continue;
                }

                callback(EventFrame::parse(&text));

                if once {
                    debug!("[FS_REALTIME] [{}] once subscription delivered, unsubscribing", id);
                    for sibling in registry.remove_by_key_and_schema(key, &schema) {
                        if sibling.id != id {
                            sibling.signal_close();
                        }
                    }
                    connection.close(CLOSE_NORMAL).await;
                    handlers.emit_disconnect(
                        id,
                        DisconnectReason::with_code(
                            "Subscription closed after first event",
                            CLOSE_NORMAL,
                        ),
                    );
                    return;
                }
            },
            Some(Inbound::Error(message)) => {
                error!("[FS_REALTIME] [{}] Connection error: {}", id, message);
                handlers.emit_error(id, SocketError::new(message));
            },
            Some(Inbound::Close { code, reason }) => {
                finish(id, code, reason, &callback, &registry, &handlers, &mut connection).await;
                return;
            },
            None => {
                finish(
                    id,
                    CLOSE_ABNORMAL,
                    String::new(),
                    &callback,
                    &registry,
                    &handlers,
                    &mut connection,
                )
                .await;
                return;
            },
        }
    }
}

async fn finish(
    id: u64,
    code: u16,
    reason: String,
    callback: &RawCallback,
    registry: &Registry,
    handlers: &EventHandlers,
    connection: &mut Box<dyn RealtimeConnection>,
) {
    let was_active = registry.remove_by_id(id).is_some();
    debug!(
        "[FS_REALTIME] [{}] Connection closed: code={} reason=\"{}\" active={}",
        id, code, reason, was_active
    );

    if was_active && (code != CLOSE_NORMAL || !reason.is_empty()) {
        callback(Err(FastSchemaError::ConnectionError(close_error_message(code, &reason))));
    }

    connection.close(code).await;

    let message = if reason.is_empty() {
        "Connection closed by server".to_string()
    } else {
        reason
    };
    handlers.emit_disconnect(id, DisconnectReason::with_code(message, code));
}
