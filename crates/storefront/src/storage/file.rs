//! File-backed storage: one JSON file per key in a directory.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::broadcast;
use uuid::Uuid;

use super::{EVENT_CAPACITY, KeyValueStorage, StorageError, StorageEvent, publish};

/// Storage persisted under a directory.
///
/// Writes go to a temporary file that is renamed over the slot, so readers
/// never observe a partially written value. Change events reach handles
/// opened from the same `FileStorage` (see [`FileStorage::handle`]); other
/// processes see the new value on their next read.
#[derive(Clone)]
pub struct FileStorage {
    origin: Uuid,
    dir: Arc<PathBuf>,
    events: broadcast::Sender<StorageEvent>,
}

impl FileStorage {
    /// Open (creating if needed) a storage directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            origin: Uuid::new_v4(),
            dir: Arc::new(dir),
            events,
        })
    }

    /// Open another handle onto the same directory with a fresh origin.
    #[must_use]
    pub fn handle(&self) -> Self {
        Self {
            origin: Uuid::new_v4(),
            dir: Arc::clone(&self.dir),
            events: self.events.clone(),
        }
    }

    /// Directory holding the slots.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn slot_path(&self, key: &str) -> Result<PathBuf, StorageError> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.slot_path(key)?) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(key)?;
        let tmp = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        fs::write(&tmp, value)?;
        if let Err(e) = fs::rename(&tmp, &path) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }

        publish(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                new_value: Some(value.to_string()),
                origin: self.origin,
            },
        );
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.slot_path(key)?) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        }

        publish(
            &self.events,
            StorageEvent {
                key: key.to_string(),
                new_value: None,
                origin: self.origin,
            },
        );
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.events.subscribe()
    }

    fn origin(&self) -> Uuid {
        self.origin
    }
}
