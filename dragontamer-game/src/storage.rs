//! Key-value persistence boundary.
use std::collections::HashMap;
use std::convert::Infallible;
use std::sync::{Arc, Mutex, PoisonError};

/// Trait for abstracting save slot operations.
/// Platform-specific implementations should provide this.
pub trait SaveStorage {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Overwrite the slot with a full payload.
    ///
    /// # Errors
    ///
    /// Returns an error if the payload cannot be written.
    fn write_slot(&self, key: &str, payload: &str) -> Result<(), Self::Error>;

    /// Read a slot, returning `None` when nothing has been saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot exists but cannot be read.
    fn read_slot(&self, key: &str) -> Result<Option<String>, Self::Error>;

    /// Remove a slot. Clearing a missing slot is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the slot cannot be removed.
    fn clear_slot(&self, key: &str) -> Result<(), Self::Error>;
}

/// In-process storage. Clones share the same slots, so a caller can keep a
/// handle to inspect what an engine wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one slot.
    #[must_use]
    pub fn with_slot(key: &str, payload: &str) -> Self {
        let storage = Self::default();
        storage
            .slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), payload.to_string());
        storage
    }

    #[must_use]
    pub fn peek(&self, key: &str) -> Option<String> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

impl SaveStorage for MemoryStorage {
    type Error = Infallible;

    fn write_slot(&self, key: &str, payload: &str) -> Result<(), Self::Error> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), payload.to_string());
        Ok(())
    }

    fn read_slot(&self, key: &str) -> Result<Option<String>, Self::Error> {
        Ok(self.peek(key))
    }

    fn clear_slot(&self, key: &str) -> Result<(), Self::Error> {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
