//! In-memory storage, shared between handles.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::broadcast;
use uuid::Uuid;

use super::{EVENT_CAPACITY, KeyValueStorage, StorageError, StorageEvent, publish};

/// Storage kept in process memory.
///
/// Cloning shares the slots but keeps the origin; use [`MemoryStorage::handle`]
/// to get a second handle that observes this one's writes.
#[derive(Clone)]
pub struct MemoryStorage {
    origin: Uuid,
    shared: Arc<Shared>,
}

struct Shared {
    slots: RwLock<HashMap<String, String>>,
    events: broadcast::Sender<StorageEvent>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    /// Create an empty storage with a single handle.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::new(Shared {
                slots: RwLock::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Open another handle onto the same slots with a fresh origin.
    #[must_use]
    pub fn handle(&self) -> Self {
        Self {
            origin: Uuid::new_v4(),
            shared: Arc::clone(&self.shared),
        }
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let slots = self
            .shared
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.shared
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());

        publish(
            &self.shared.events,
            StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                origin: self.origin,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let removed = self
            .shared
            .slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);

        if removed.is_some() {
            publish(
                &self.shared.events,
                StorageEvent {
                    key: key.to_string(),
                    new_value: None,
                    origin: self.origin,
                },
            );
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.shared.events.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let storage = MemoryStorage::new();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.set("k", "v").unwrap();
        assert_eq!(storage.get("k").unwrap().as_deref(), Some("v"));
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
        storage.remove("k").unwrap();
    }

    #[test]
    fn test_handles_share_slots_with_distinct_origins() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.handle();
        assert_ne!(tab_a.origin(), tab_b.origin());

        tab_a.set("k", "from a").unwrap();
        assert_eq!(tab_b.get("k").unwrap().as_deref(), Some("from a"));
    }

    #[test]
    fn test_events_carry_origin() {
        let tab_a = MemoryStorage::new();
        let tab_b = tab_a.handle();
        let mut events = tab_b.subscribe();

        tab_a.set("k", "v").unwrap();
        let event = events.try_recv().unwrap();
        assert_eq!(event.key, "k");
        assert_eq!(event.new_value.as_deref(), Some("v"));
        assert_eq!(event.origin, tab_a.origin());

        tab_a.remove("k").unwrap();
        assert_eq!(events.try_recv().unwrap().new_value, None);
    }
}
