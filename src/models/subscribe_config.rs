use super::event_kind::EventKind;
use super::filter::Filter;

/// Full description of what a realtime subscription listens to.
///
/// ```rust
/// use fastschema_link::{EventKind, Filter, SubscribeConfig};
///
/// let config = SubscribeConfig::new(EventKind::Update)
///     .with_select("id,name")
///     .with_filter(Filter::new().eq("name", "tag1"))
///     .once();
/// assert!(config.once);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SubscribeConfig {
    pub event: EventKind,

    /// Narrow delivery to one record. Turns `update`/`delete` payloads into
    /// single records.
    pub id: Option<u64>,

    /// Field projection, passed through untouched
    pub select: Option<String>,

    pub filter: Option<Filter>,

    /// Unsubscribe automatically after the first delivered frame
    pub once: bool,
}

impl SubscribeConfig {
    pub fn new(event: EventKind) -> Self {
        Self {
            event,
            id: None,
            select: None,
            filter: None,
            once: false,
        }
    }

    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_select(mut self, select: impl Into<String>) -> Self {
        self.select = Some(select.into());
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}
