//! MappingStore: the configuration-store accessor.
//!
//! The OS keeps touchscreen-to-monitor assignments under one fixed store path
//! as a flat `value name → string` table.  This module wraps a
//! [`ConfigStore`] bound to that path and adds the operations the engine
//! needs:
//!
//! - [`MappingStore::resolve`] – list the keys and run the identity matcher.
//! - [`MappingStore::write`] – overwrite the value of an existing key.
//! - [`MappingStore::read_table`] – read every entry for display.
//!
//! # Elevation
//!
//! Reading is allowed for standard users; writing requires an elevated
//! process.  A rejected write surfaces as [`StoreError::AccessDenied`], which
//! is distinct from [`StoreError::StoreUnavailable`] (the path does not exist
//! because the machine has no pen/touch subsystem).

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};
use touchmap_core::{resolve_store_key, MappingEntry, MappingTable, MatchError, MatchPolicy};

/// Well-known store path holding digitizer-to-display assignments, relative
/// to `HKEY_LOCAL_MACHINE`.
pub const DEFAULT_KEY_PATH: &str = r"SOFTWARE\Microsoft\Wisp\Pen\Digimon";

/// Error type for configuration store operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store path does not exist on this machine.
    #[error("configuration store path {path:?} does not exist on this machine")]
    StoreUnavailable { path: String },

    /// The OS rejected the open or write for lack of elevation.
    #[error("access to configuration store path {path:?} was denied")]
    AccessDenied { path: String },

    /// The value to overwrite does not exist.  Stores never create keys.
    #[error("configuration store value {key:?} does not exist")]
    KeyNotFound { key: String },

    /// The value exists but does not hold a string.
    #[error("configuration store value {key:?} is not a string")]
    NotAString { key: String },

    /// Any other OS failure.
    #[error("configuration store operation failed: {0}")]
    Os(String),
}

/// A flat key→string-value table addressed by path.
///
/// Implementations must be all-or-nothing per call: a failed `set_value`
/// leaves the stored value untouched.
pub trait ConfigStore: Send + Sync {
    /// Returns every value name under `path`, in store enumeration order.
    fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError>;

    /// Returns the string value of `key`, or `None` if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotAString`] when `key` holds a non-string value.
    fn get_value(&self, path: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Overwrites the value of an existing `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::KeyNotFound`] rather than creating a new key.
    fn set_value(&self, path: &str, key: &str, value: &str) -> Result<(), StoreError>;
}

/// Error type for [`MappingStore::resolve`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    Match(#[from] MatchError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Accessor for the digitizer mapping key.
pub struct MappingStore {
    store: Arc<dyn ConfigStore>,
    key_path: String,
    policy: MatchPolicy,
}

impl MappingStore {
    pub fn new(store: Arc<dyn ConfigStore>, key_path: impl Into<String>, policy: MatchPolicy) -> Self {
        Self {
            store,
            key_path: key_path.into(),
            policy,
        }
    }

    /// Finds the store key that embeds `digitizer_id`.
    ///
    /// The key list is re-read on every call.
    pub fn resolve(&self, digitizer_id: &str) -> Result<String, ResolveError> {
        let keys = self.store.list_keys(&self.key_path)?;
        debug!(count = keys.len(), path = %self.key_path, "listed store keys");
        Ok(resolve_store_key(&keys, digitizer_id, self.policy)?)
    }

    /// Sets the value of `store_key` to `display_id`.
    pub fn write(&self, store_key: &str, display_id: &str) -> Result<(), StoreError> {
        self.store.set_value(&self.key_path, store_key, display_id)?;
        info!(store_key, display_id, "mapping written");
        Ok(())
    }

    /// Reads every entry under the store path.
    ///
    /// Keys that disappear between listing and reading are skipped, as are
    /// values that do not hold a string.
    pub fn read_table(&self) -> Result<MappingTable, StoreError> {
        let keys = self.store.list_keys(&self.key_path)?;
        let mut entries = Vec::with_capacity(keys.len());
        for key in keys {
            match self.store.get_value(&self.key_path, &key) {
                Ok(Some(value)) => entries.push(MappingEntry::new(key, value)),
                Ok(None) => debug!(key = %key, "store key vanished while reading"),
                Err(StoreError::NotAString { .. }) => {
                    debug!(key = %key, "skipping non-string store value")
                }
                Err(e) => return Err(e),
            }
        }
        Ok(MappingTable::new(entries))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config_store::memory::InMemoryConfigStore;

    fn store_with(entries: &[(&str, &str)]) -> Arc<InMemoryConfigStore> {
        Arc::new(InMemoryConfigStore::with_entries(DEFAULT_KEY_PATH, entries))
    }

    fn accessor(store: &Arc<InMemoryConfigStore>, policy: MatchPolicy) -> MappingStore {
        MappingStore::new(Arc::clone(store) as Arc<dyn ConfigStore>, DEFAULT_KEY_PATH, policy)
    }

    #[test]
    fn test_resolve_finds_key_embedding_digitizer_id() {
        let store = store_with(&[("20-Digitizer_ABC123", "old")]);
        let key = accessor(&store, MatchPolicy::Strict)
            .resolve("ABC123")
            .expect("resolve");
        assert_eq!(key, "20-Digitizer_ABC123");
    }

    #[test]
    fn test_resolve_on_missing_path_is_store_unavailable() {
        let store = Arc::new(InMemoryConfigStore::missing(DEFAULT_KEY_PATH));
        let err = accessor(&store, MatchPolicy::Strict)
            .resolve("ABC123")
            .unwrap_err();
        assert!(matches!(
            err,
            ResolveError::Store(StoreError::StoreUnavailable { .. })
        ));
    }

    #[test]
    fn test_resolve_reports_ambiguity_under_strict_policy() {
        let store = store_with(&[("10-ABC123", "a"), ("20-ABC123", "b")]);
        let err = accessor(&store, MatchPolicy::Strict)
            .resolve("ABC123")
            .unwrap_err();
        assert!(matches!(err, ResolveError::Match(MatchError::Ambiguous { .. })));
    }

    #[test]
    fn test_resolve_first_match_policy_returns_first_key() {
        let store = store_with(&[("10-ABC123", "a"), ("20-ABC123", "b")]);
        let key = accessor(&store, MatchPolicy::FirstMatch)
            .resolve("ABC123")
            .expect("resolve");
        assert_eq!(key, "10-ABC123");
    }

    #[test]
    fn test_write_overwrites_existing_value() {
        // Arrange
        let store = store_with(&[("20-Digitizer_ABC123", "old")]);

        // Act
        accessor(&store, MatchPolicy::Strict)
            .write("20-Digitizer_ABC123", r"\\.\DISPLAY2")
            .expect("write");

        // Assert
        assert_eq!(
            store.value("20-Digitizer_ABC123").as_deref(),
            Some(r"\\.\DISPLAY2")
        );
    }

    #[test]
    fn test_write_never_creates_a_key() {
        let store = store_with(&[("20-Digitizer_ABC123", "old")]);
        let before = store.snapshot();
        let err = accessor(&store, MatchPolicy::Strict)
            .write("brand-new-key", "value")
            .unwrap_err();
        assert_eq!(
            err,
            StoreError::KeyNotFound {
                key: "brand-new-key".to_string()
            }
        );
        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn test_write_denied_leaves_store_untouched() {
        let store = store_with(&[("20-Digitizer_ABC123", "old")]);
        store.set_deny_writes(true);
        let err = accessor(&store, MatchPolicy::Strict)
            .write("20-Digitizer_ABC123", "new")
            .unwrap_err();
        assert!(matches!(err, StoreError::AccessDenied { .. }));
        assert_eq!(store.value("20-Digitizer_ABC123").as_deref(), Some("old"));
    }

    #[test]
    fn test_read_table_returns_all_entries_in_store_order() {
        let store = store_with(&[("20-A", r"\\.\DISPLAY1"), ("20-B", r"\\.\DISPLAY2")]);
        let table = accessor(&store, MatchPolicy::Strict)
            .read_table()
            .expect("read");
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].store_key, "20-A");
        assert_eq!(table.display_for_key("20-B"), Some(r"\\.\DISPLAY2"));
    }

    /// Reports one key as holding a binary value.
    struct MixedTypeStore {
        inner: InMemoryConfigStore,
        binary_key: &'static str,
    }

    impl ConfigStore for MixedTypeStore {
        fn list_keys(&self, path: &str) -> Result<Vec<String>, StoreError> {
            self.inner.list_keys(path)
        }
        fn get_value(&self, path: &str, key: &str) -> Result<Option<String>, StoreError> {
            if key == self.binary_key {
                return Err(StoreError::NotAString { key: key.to_string() });
            }
            self.inner.get_value(path, key)
        }
        fn set_value(&self, path: &str, key: &str, value: &str) -> Result<(), StoreError> {
            self.inner.set_value(path, key, value)
        }
    }

    #[test]
    fn test_read_table_skips_non_string_value() {
        // Arrange
        let store = Arc::new(MixedTypeStore {
            inner: InMemoryConfigStore::with_entries(
                DEFAULT_KEY_PATH,
                &[("20-A", r"\\.\DISPLAY1"), ("Flags", "1"), ("20-B", r"\\.\DISPLAY2")],
            ),
            binary_key: "Flags",
        });
        let accessor = MappingStore::new(store, DEFAULT_KEY_PATH, MatchPolicy::Strict);

        // Act
        let table = accessor.read_table().expect("read");

        // Assert
        assert_eq!(table.len(), 2);
        assert_eq!(table.entries()[0].store_key, "20-A");
        assert_eq!(table.entries()[1].store_key, "20-B");
    }

    #[test]
    fn test_read_table_propagates_other_read_errors() {
        let store = Arc::new(InMemoryConfigStore::missing(DEFAULT_KEY_PATH));
        let err = accessor(&store, MatchPolicy::Strict)
            .read_table()
            .unwrap_err();
        assert!(matches!(err, StoreError::StoreUnavailable { .. }));
    }
}
