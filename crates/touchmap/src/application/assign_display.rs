//! MappingEngine: assigns a display to a touchscreen.
//!
//! This use case is the heart of touchmap.  It takes a `(digitizer id,
//! display id)` pair chosen by the user and walks the state machine
//!
//! ```text
//! Idle → Resolving → Writing → Applying → Done | Failed(kind)
//! ```
//!
//! - **Resolving** – [`MappingStore::resolve`] finds the store key.
//! - **Writing** – [`MappingStore::write`] overwrites its value.
//! - **Applying** – [`ApplyTrigger::apply_changes`] restarts the compositor.
//!
//! Failures while resolving or writing are returned as [`AssignError`] and
//! leave the store unmodified.  A failure while applying cannot undo the
//! write, so it is returned as [`AssignmentOutcome::Written`].  Nothing is
//! retried automatically.
//!
//! # Concurrency
//!
//! Two assignments for the same digitizer race on the same store key, so
//! they are serialized by a per-digitizer async lock.  Assignments for
//! different digitizers take different locks and proceed independently.
//! Once the lock is held the Resolve → Write → Apply chain runs
//! synchronously with no suspension point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;
use tracing::{debug, info, warn};
use touchmap_core::{AssignPhase, AssignmentOutcome, MappingTable, MatchError};

use crate::application::{
    apply_trigger::ApplyTrigger,
    mapping_store::{MappingStore, ResolveError, StoreError},
    selection_cache::SelectionCache,
};

/// Error type for the assign use case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssignError {
    /// No store key embeds the digitizer id.
    #[error("touchscreen {digitizer_id:?} does not exist in the configuration store")]
    DigitizerNotRegistered { digitizer_id: String },

    /// Several store keys embed the digitizer id.
    #[error("touchscreen {digitizer_id:?} matches several configuration store keys: {candidates:?}")]
    Ambiguous {
        digitizer_id: String,
        candidates: Vec<String>,
    },

    /// The store path does not exist; touch mapping is unsupported here.
    #[error("configuration store {path:?} not found; touch mapping is not supported on this machine")]
    StoreUnavailable { path: String, phase: AssignPhase },

    /// The store rejected the operation; the process must run elevated.
    #[error("access to configuration store {path:?} denied; run touchmap as administrator")]
    AccessDenied { path: String, phase: AssignPhase },

    /// Any other store failure.
    #[error("configuration store failed while {phase}: {source}")]
    Store {
        phase: AssignPhase,
        #[source]
        source: StoreError,
    },

    /// `reapply` was called for a digitizer with no recorded choice.
    #[error("no display has been chosen for touchscreen {digitizer_id:?} yet")]
    NoCachedSelection { digitizer_id: String },
}

impl AssignError {
    /// The state-machine phase in which the assignment failed.
    pub fn phase(&self) -> AssignPhase {
        match self {
            Self::DigitizerNotRegistered { .. } | Self::Ambiguous { .. } => AssignPhase::Resolving,
            Self::StoreUnavailable { phase, .. }
            | Self::AccessDenied { phase, .. }
            | Self::Store { phase, .. } => *phase,
            Self::NoCachedSelection { .. } => AssignPhase::Idle,
        }
    }

    /// `true` if re-running the process elevated may succeed.
    pub fn needs_elevation(&self) -> bool {
        matches!(self, Self::AccessDenied { .. })
    }

    fn from_store(phase: AssignPhase, digitizer_id: &str, err: StoreError) -> Self {
        match err {
            StoreError::StoreUnavailable { path } => Self::StoreUnavailable { path, phase },
            StoreError::AccessDenied { path } => Self::AccessDenied { path, phase },
            // The matched key vanished between resolving and writing.
            StoreError::KeyNotFound { .. } => Self::DigitizerNotRegistered {
                digitizer_id: digitizer_id.to_string(),
            },
            other => Self::Store {
                phase,
                source: other,
            },
        }
    }

    fn from_resolve(digitizer_id: &str, err: ResolveError) -> Self {
        match err {
            ResolveError::Match(MatchError::DigitizerNotRegistered { digitizer_id }) => {
                Self::DigitizerNotRegistered { digitizer_id }
            }
            ResolveError::Match(MatchError::Ambiguous {
                digitizer_id,
                candidates,
            }) => Self::Ambiguous {
                digitizer_id,
                candidates,
            },
            ResolveError::Store(e) => Self::from_store(AssignPhase::Resolving, digitizer_id, e),
        }
    }
}

/// The mapping engine.
///
/// Construct once per process and share behind an `Arc`; every method takes
/// `&self`.
pub struct MappingEngine {
    store: MappingStore,
    trigger: ApplyTrigger,
    selections: Arc<SelectionCache>,
    in_flight: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl MappingEngine {
    /// Creates an engine with an injected selection cache.
    pub fn new(store: MappingStore, trigger: ApplyTrigger, selections: Arc<SelectionCache>) -> Self {
        Self {
            store,
            trigger,
            selections,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Assigns `display_id` to the digitizer `digitizer_id`.
    ///
    /// The choice is recorded in the selection cache before resolving, so a
    /// failed attempt can be retried with [`reapply`](Self::reapply).
    ///
    /// # Errors
    ///
    /// Returns [`AssignError`] if resolving or writing fails; in that case the
    /// store is unchanged and the compositor is not touched.
    pub async fn assign(
        &self,
        digitizer_id: &str,
        display_id: &str,
    ) -> Result<AssignmentOutcome, AssignError> {
        let lock = self.digitizer_lock(digitizer_id);
        let result = {
            let _guard = lock.lock().await;
            self.selections.record(digitizer_id, display_id);
            self.run(digitizer_id, display_id)
        };
        self.release_lock(digitizer_id, lock);
        result
    }

    /// Re-runs the assignment with the display last chosen for `digitizer_id`.
    pub async fn reapply(&self, digitizer_id: &str) -> Result<AssignmentOutcome, AssignError> {
        let display_id =
            self.selections
                .get(digitizer_id)
                .ok_or_else(|| AssignError::NoCachedSelection {
                    digitizer_id: digitizer_id.to_string(),
                })?;
        self.assign(digitizer_id, &display_id).await
    }

    /// Reads the current mapping table from the store.
    pub fn mapping_table(&self) -> Result<MappingTable, StoreError> {
        self.store.read_table()
    }

    fn run(&self, digitizer_id: &str, display_id: &str) -> Result<AssignmentOutcome, AssignError> {
        debug!(digitizer_id, phase = %AssignPhase::Resolving, "assignment started");
        let store_key = self
            .store
            .resolve(digitizer_id)
            .map_err(|e| AssignError::from_resolve(digitizer_id, e))
            .map_err(|e| log_failure(digitizer_id, e))?;

        debug!(digitizer_id, store_key = %store_key, phase = %AssignPhase::Writing, "writing mapping");
        self.store
            .write(&store_key, display_id)
            .map_err(|e| AssignError::from_store(AssignPhase::Writing, digitizer_id, e))
            .map_err(|e| log_failure(digitizer_id, e))?;

        debug!(digitizer_id, phase = %AssignPhase::Applying, "applying mapping");
        match self.trigger.apply_changes() {
            Ok(()) => {
                info!(digitizer_id, display_id, "mapping applied");
                Ok(AssignmentOutcome::WrittenAndApplied {
                    store_key,
                    display_id: display_id.to_string(),
                })
            }
            Err(e) => {
                warn!(
                    digitizer_id,
                    display_id,
                    "mapping saved but not applied: {e}"
                );
                Ok(AssignmentOutcome::Written {
                    store_key,
                    display_id: display_id.to_string(),
                    apply_error: e,
                })
            }
        }
    }

    fn digitizer_lock(&self, digitizer_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(digitizer_id.to_string()).or_default())
    }

    /// Drops the lock entry for `digitizer_id` unless another assignment
    /// holds or awaits it.  The map and `lock` account for two references.
    fn release_lock(&self, digitizer_id: &str, lock: Arc<tokio::sync::Mutex<()>>) {
        let mut locks = self
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if Arc::strong_count(&lock) <= 2 {
            locks.remove(digitizer_id);
        }
    }
}

fn log_failure(digitizer_id: &str, err: AssignError) -> AssignError {
    warn!(digitizer_id, phase = %err.phase(), "assignment failed: {err}");
    err
}

// ── Tests ─────────────────────────────────────────────────────────────────────
