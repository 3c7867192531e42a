//! Key-value persistence behind the cart store.

use std::collections::HashMap;

use thiserror::Error;

/// Errors a storage backend can report.
///
/// The cart store swallows these after logging; they exist so backends and
/// their own callers can tell failures apart.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend cannot be reached or is disabled.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A string-to-string store with `localStorage` semantics.
pub trait KeyValueStorage {
    /// Read the value under `key`; `Ok(None)` when never written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replace the value under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the backend cannot be written.
    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError>;
}

impl<S: KeyValueStorage + ?Sized> KeyValueStorage for &mut S {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }
}

/// In-process storage.
///
/// Used by tests, and by the storefront to run cart operations against the
/// raw value it keeps in the shopper's session.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one entry.
    #[must_use]
    pub fn with_item(key: impl Into<String>, value: impl Into<String>) -> Self {
        let mut items = HashMap::new();
        items.insert(key.into(), value.into());
        Self { items }
    }

    /// Borrow the raw value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.items.get(key).map(String::as_str)
    }

    /// Take the raw value under `key` out of the storage.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.items.remove(key)
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: String) -> Result<(), StorageError> {
        self.items.insert(key.to_owned(), value);
        Ok(())
    }
}
