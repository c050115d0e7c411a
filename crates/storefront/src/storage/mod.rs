//! Key-value storage slots backing the persisted cart.
//!
//! A storage is shared by one or more *handles*. Each handle has its own
//! origin ID, and every write is broadcast to all handles of the same
//! storage as a [`StorageEvent`]. Listeners skip events carrying their own
//! origin, so a handle only observes changes made elsewhere (the way a
//! browser tab observes `storage` events from other tabs).

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Capacity of the change-event channel shared by a storage's handles.
pub(crate) const EVENT_CAPACITY: usize = 64;

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value could not be serialized for storage.
    #[error("Storage serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The key cannot be mapped onto the backend.
    #[error("Invalid storage key: {0}")]
    InvalidKey(String),
}

/// A change to a storage slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    /// Key that changed.
    pub key: String,
    /// New value, or `None` if the key was removed.
    pub new_value: Option<String>,
    /// Origin of the handle that made the change.
    pub origin: Uuid,
}

/// A string key-value store with change notification.
pub trait KeyValueStorage: Send + Sync {
    /// Read a slot.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Write a slot and notify other handles.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete a slot and notify other handles. Missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Subscribe to changes made through any handle of this storage.
    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;

    /// Origin ID stamped on events from this handle.
    fn origin(&self) -> Uuid;
}

/// Send an event, ignoring the absence of subscribers.
pub(crate) fn publish(events: &broadcast::Sender<StorageEvent>, event: StorageEvent) {
    let _ = events.send(event);
}
