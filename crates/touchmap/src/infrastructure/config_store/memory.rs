//! In-memory configuration store.
//!
//! Holds a single store path as an ordered list of `(value name, value)`
//! pairs.  Knobs let tests simulate a machine without the path
//! ([`InMemoryConfigStore::missing`]) or a non-elevated process
//! ([`InMemoryConfigStore::set_deny_writes`]).

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::mapping_store::{ConfigStore, StoreError};

/// A [`ConfigStore`] backed by a `Vec` in enumeration order.
#[derive(Debug)]
pub struct InMemoryConfigStore {
    path: String,
    present: bool,
    entries: Mutex<Vec<(String, String)>>,
    deny_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryConfigStore {
    /// Creates an existing, empty store path.
    pub fn new(path: impl Into<String>) -> Self {
        Self::with_entries(path, &[])
    }

    /// Creates a store path pre-populated with `entries`.
    pub fn with_entries(path: impl Into<String>, entries: &[(&str, &str)]) -> Self {
        Self {
            path: path.into(),
            present: true,
            entries: Mutex::new(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            ),
            deny_writes: AtomicBool::new(false),
            writes: AtomicUsize::new(0),
        }
    }

    /// Creates a store on which `path` does not exist.
    pub fn missing(path: impl Into<String>) -> Self {
        Self {
            present: false,
            ..Self::new(path)
        }
    }

    /// When `true`, every `set_value` fails with `AccessDenied`.
    pub fn set_deny_writes(&self, deny: bool) {
        self.deny_writes.store(deny, Ordering::SeqCst);
    }

    /// Returns a copy of all entries.
    pub fn snapshot(&self) -> Vec<(String, String)> {
        self.entries.lock().unwrap().clone()
    }

    /// Returns the value of `key`, bypassing the trait.
    pub fn value(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
    }

    /// Sets `key` directly, inserting it if absent.  Simulates the OS
    /// rewriting the store behind the engine's back.
    pub fn overwrite(&self, key: &str, value: &str) {
        let mut entries = self.entries.lock().unwrap();
        match entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, v)) => *v = value.to_string(),
            None => entries.push((key.to_string(), value.to_string())),
        }
    }

    /// Number of successful `set_value` calls.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_path(&self, path: &str) -> Result<(), StoreError> {
        if self.present && path == self.path {
            Ok(())
        } else {
            Err(StoreError::StoreUnavailable {
                path: path.to_string(),
            })
        }
    }
}

impl ConfigStore for InMemoryConfigStore {
    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.check_path(path)?;
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn get_value(&self, path: &str, key: &str) -> Result<Option<String>, StoreError> {
        self.check_path(path)?;
        Ok(self.value(key))
    }

    fn set_value(&self, path: &str, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_path(path)?;
        if self.deny_writes.load(Ordering::SeqCst) {
            return Err(StoreError::AccessDenied {
                path: path.to_string(),
            });
        }
        let mut entries = self.entries.lock().unwrap();
        let slot = entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .ok_or_else(|| StoreError::KeyNotFound {
                key: key.to_string(),
            })?;
        slot.1 = value.to_string();
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = r"SOFTWARE\Microsoft\Wisp\Pen\Digimon";

    #[test]
    fn test_list_keys_preserves_insertion_order() {
        let store = InMemoryConfigStore::with_entries(PATH, &[("b", "1"), ("a", "2")]);
        assert_eq!(store.list_keys(PATH).unwrap(), vec!["b", "a"]);
    }

    #[test]
    fn test_other_path_is_unavailable() {
        let store = InMemoryConfigStore::new(PATH);
        let err = store.list_keys(r"SOFTWARE\Other").unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
    }

    #[test]
    fn test_missing_store_rejects_every_operation() {
        let store = InMemoryConfigStore::missing(PATH);
        assert!(store.list_keys(PATH).is_err());
        assert!(store.get_value(PATH, "k").is_err());
        assert!(store.set_value(PATH, "k", "v").is_err());
    }

    #[test]
    fn test_set_value_counts_only_successful_writes() {
        let store = InMemoryConfigStore::with_entries(PATH, &[("k", "v")]);
        store.set_value(PATH, "k", "w").unwrap();
        assert!(store.set_value(PATH, "absent", "w").is_err());
        assert_eq!(store.write_count(), 1);
        assert_eq!(store.get_value(PATH, "k").unwrap().as_deref(), Some("w"));
    }
}
