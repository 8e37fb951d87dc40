//! SelectionCache: the last display chosen for each touchscreen.
//!
//! Only the in-memory lookup of the current process; nothing is persisted.
//! The mapping engine uses it to re-apply a previous choice without asking
//! the user again.
//!
//! # Single writer per key
//!
//! The engine records a digitizer's choice only while it holds that
//! digitizer's assignment lock, so each key has at most one writer at a time.
//! Readers may run concurrently with writers of other keys.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// In-memory `digitizer id → display id` lookup.
#[derive(Debug, Default)]
pub struct SelectionCache {
    selections: Mutex<HashMap<String, String>>,
}

impl SelectionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `display_id` as the choice for `digitizer_id`.
    pub fn record(&self, digitizer_id: &str, display_id: &str) {
        self.lock()
            .insert(digitizer_id.to_string(), display_id.to_string());
    }

    /// Returns the last display chosen for `digitizer_id`.
    pub fn get(&self, digitizer_id: &str) -> Option<String> {
        self.lock().get(digitizer_id).cloned()
    }

    // A panic while holding the lock cannot leave the map half-updated.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, String>> {
        self.selections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
