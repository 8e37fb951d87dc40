//! Touchscreen-to-monitor assignments.
//!
//! The OS configuration store is a flat table.  Each value name is an opaque
//! token that *embeds* a digitizer id, and each value is the id of the display
//! the digitizer drives.  A [`MappingTable`] is a read-only copy of that table
//! taken at one point in time; it is never cached between assignments.

use serde::{Deserialize, Serialize};

/// One `store key → display id` pair read from the configuration store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingEntry {
    /// Store-assigned value name.  Contains the digitizer id as a substring.
    pub store_key: String,
    /// Display interface id currently assigned to the digitizer.
    pub display_id: String,
}

impl MappingEntry {
    pub fn new(store_key: impl Into<String>, display_id: impl Into<String>) -> Self {
        Self {
            store_key: store_key.into(),
            display_id: display_id.into(),
        }
    }
}

/// Every mapping entry currently readable from the store, in store order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingTable {
    entries: Vec<MappingEntry>,
}

impl MappingTable {
    pub fn new(entries: Vec<MappingEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[MappingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the display id stored under `store_key`, if any.
    pub fn display_for_key(&self, store_key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.store_key == store_key)
            .map(|e| e.display_id.as_str())
    }
}
