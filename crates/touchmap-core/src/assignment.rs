//! Assignment state machine types.
//!
//! ```text
//! Idle ──► Resolving ──► Writing ──► Applying ──► Ok(WrittenAndApplied)
//!              │            │            │
//!              ▼            ▼            ▼
//!             Err          Err     Ok(Written { apply_error })
//! ```
//!
//! The terminal states are the `Result` itself: success is an
//! [`AssignmentOutcome`], failure is an error carrying the [`AssignPhase`] it
//! happened in.  A failure while applying does not undo the write, so it is
//! reported as [`AssignmentOutcome::Written`] with the typed [`ApplyError`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The step an assignment is in (or failed in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignPhase {
    Idle,
    /// Looking up the store key for the digitizer.
    Resolving,
    /// Writing the display id under the resolved key.
    Writing,
    /// Restarting the compositor so it re-reads the store.
    Applying,
}

impl fmt::Display for AssignPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssignPhase::Idle => "idle",
            AssignPhase::Resolving => "resolving",
            AssignPhase::Writing => "writing",
            AssignPhase::Applying => "applying",
        };
        f.write_str(s)
    }
}

/// Why the compositor could not be restarted.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApplyError {
    /// No process with the compositor's name is running.
    #[error("compositor process {name:?} was not found")]
    CompositorProcessNotFound { name: String },

    /// More than one candidate process; refusing to guess.
    #[error("{count} processes named {name:?} found in this session")]
    MultipleCompositors { name: String, count: usize },

    /// The process was found but could not be terminated.
    #[error("failed to terminate compositor process {name:?}: {reason}")]
    TerminateFailed { name: String, reason: String },
}

/// What a successful assignment achieved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AssignmentOutcome {
    /// The store was updated and the compositor was restarted.
    WrittenAndApplied {
        store_key: String,
        display_id: String,
    },
    /// The store was updated but the compositor restart failed.  The new
    /// mapping takes effect the next time the compositor starts.
    Written {
        store_key: String,
        display_id: String,
        apply_error: ApplyError,
    },
}

impl AssignmentOutcome {
    pub fn store_key(&self) -> &str {
        match self {
            Self::WrittenAndApplied { store_key, .. } | Self::Written { store_key, .. } => {
                store_key
            }
        }
    }

    pub fn display_id(&self) -> &str {
        match self {
            Self::WrittenAndApplied { display_id, .. } | Self::Written { display_id, .. } => {
                display_id
            }
        }
    }

    /// `true` when the mapping was saved but not applied.
    pub fn is_partially_applied(&self) -> bool {
        matches!(self, Self::Written { .. })
    }
}
