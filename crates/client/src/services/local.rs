//! Guest-mode lists persisted in client storage.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::storage::{SharedStorage, StorageError, get_json, set_json};

/// Whether a state holder is backed by client storage or by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Signed out: the list lives in client storage.
    Guest,
    /// Signed in: the backend owns the list.
    Authenticated,
}

impl Mode {
    /// Mode for the current sign-in state.
    #[must_use]
    pub const fn for_login(logged_in: bool) -> Self {
        if logged_in {
            Self::Authenticated
        } else {
            Self::Guest
        }
    }
}

/// A JSON array of `T` stored under one key.
pub(crate) struct GuestList<T> {
    storage: SharedStorage,
    key: &'static str,
    _item: PhantomData<fn() -> T>,
}

impl<T: Serialize + DeserializeOwned> GuestList<T> {
    pub(crate) fn new(storage: SharedStorage, key: &'static str) -> Self {
        Self {
            storage,
            key,
            _item: PhantomData,
        }
    }

    /// Stored items. An unreadable snapshot is discarded and reads as empty.
    pub(crate) fn load(&self) -> Result<Vec<T>, StorageError> {
        match get_json::<Vec<T>>(self.storage.as_ref(), self.key) {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(StorageError::Serialization(e)) => {
                warn!(key = self.key, error = %e, "Discarding unreadable guest list");
                self.storage.remove(self.key)?;
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) fn save(&self, items: &[T]) -> Result<(), StorageError> {
        set_json(self.storage.as_ref(), self.key, items)
    }

    pub(crate) fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(self.key)
    }
}

/// One guest entry the backend refused during a merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeFailure {
    pub book_id: kotob_core::BookId,
    /// User-facing reason.
    pub reason: String,
}

/// Outcome of replaying guest entries against the backend after login.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Entries the backend accepted.
    pub merged: usize,
    /// Entries the backend refused; the merge carried on past them.
    pub failures: Vec<MergeFailure>,
}

impl MergeReport {
    /// Whether every guest entry was accepted.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use std::sync::Arc;

    #[test]
    fn test_guest_list_roundtrip() {
        let storage = MemoryStorage::shared();
        let list: GuestList<u32> = GuestList::new(Arc::clone(&storage), "numbers");
        assert!(list.load().unwrap().is_empty());

        list.save(&[1, 2]).unwrap();
        assert_eq!(list.load().unwrap(), vec![1, 2]);

        list.clear().unwrap();
        assert!(storage.get("numbers").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_guest_list_reads_empty_and_is_dropped() {
        let storage = MemoryStorage::shared();
        storage.set("numbers", "[1, oops").unwrap();
        let list: GuestList<u32> = GuestList::new(Arc::clone(&storage), "numbers");

        assert!(list.load().unwrap().is_empty());
        assert!(storage.get("numbers").unwrap().is_none());
    }

    #[test]
    fn test_mode_for_login() {
        assert_eq!(Mode::for_login(true), Mode::Authenticated);
        assert_eq!(Mode::for_login(false), Mode::Guest);
    }
}
