use super::event_kind::EventKind;
use super::event_payload::EventPayload;
use super::content::Content;

/// A decoded change delivered to a subscription callback.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeEvent<T = Content> {
    /// `create`, `update` or `delete` (never the wildcard)
    pub event: EventKind,
    pub data: EventPayload<T>,
}
