use super::event_kind::EventKind;
use super::subscribe_config::SubscribeConfig;

/// Argument accepted by `subscribe` / `on`.
///
/// Anything convertible works: an [`EventKind`], an `(EventKind, id)` pair, or
/// a full [`SubscribeConfig`].
#[derive(Debug, Clone, PartialEq)]
pub enum Scope {
    Event(EventKind),
    /// Positional id form. Requires a callback like every other form.
    Item(EventKind, u64),
    Config(SubscribeConfig),
}

impl Scope {
    pub fn into_config(self) -> SubscribeConfig {
        match self {
            Scope::Event(event) => SubscribeConfig::new(event),
            Scope::Item(event, id) => SubscribeConfig::new(event).with_id(id),
            Scope::Config(config) => config,
        }
    }
}

impl From<EventKind> for Scope {
    fn from(event: EventKind) -> Self {
        Scope::Event(event)
    }
}

impl From<(EventKind, u64)> for Scope {
    fn from((event, id): (EventKind, u64)) -> Self {
        Scope::Item(event, id)
    }
}

impl From<SubscribeConfig> for Scope {
    fn from(config: SubscribeConfig) -> Self {
        Scope::Config(config)
    }
}
