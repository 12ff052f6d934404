//! Active subscription set.
//!
//! Mutated by `subscribe` (insert), `unsubscribe`/`close` (remove by callback
//! or id) and by a reader task when its connection ends (remove by id). Every
//! removal is idempotent: whoever removes an entry first gets it, later
//! attempts find nothing.

use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::oneshot;

/// Identity of a subscription callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CallbackKey(pub(crate) usize);

pub(crate) struct Registration {
    pub(crate) id: u64,
    pub(crate) key: CallbackKey,
    pub(crate) schema: String,
    pub(crate) close_tx: Option<oneshot::Sender<()>>,
}

impl Registration {
    /// Ask the owning reader task to close its connection normally.
    pub(crate) fn signal_close(mut self) {
        if let Some(tx) = self.close_tx.take() {
            let _ = tx.send(());
        }
    }
}

#[derive(Clone, Default)]
pub(crate) struct Registry {
    entries: Arc<Mutex<Vec<Registration>>>,
}

impl Registry {
    fn lock(&self) -> MutexGuard<'_, Vec<Registration>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn insert(&self, registration: Registration) {
        self.lock().push(registration);
    }

    /// Remove every entry registered under `key`.
    pub(crate) fn remove_by_key(&self, key: CallbackKey) -> Vec<Registration> {
        let mut entries = self.lock();
        let (removed, kept): (Vec<_>, Vec<_>) = entries.drain(..).partition(|r| r.key == key);
        *entries = kept;
        removed
    }

    /// Remove the entries registered under `key` on `schema` only.
    pub(crate) fn remove_by_key_and_schema(
        &self,
        key: CallbackKey,
        schema: &str,
    ) -> Vec<Registration> {
        let mut entries = self.lock();
        let (removed, kept): (Vec<_>, Vec<_>) = entries
            .drain(..)
            .partition(|r| r.key == key && r.schema == schema);
        *entries = kept;
        removed
    }

    pub(crate) fn remove_by_id(&self, id: u64) -> Option<Registration> {
        let mut entries = self.lock();
        let index = entries.iter().position(|r| r.id == id)?;
        Some(entries.remove(index))
    }

    pub(crate) fn contains_id(&self, id: u64) -> bool {
        self.lock().iter().any(|r| r.id == id)
    }

    pub(crate) fn contains_key(&self, key: CallbackKey) -> bool {
        self.lock().iter().any(|r| r.key == key)
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn count_for_schema(&self, schema: &str) -> usize {
        self.lock().iter().filter(|r| r.schema == schema).count()
    }
}
