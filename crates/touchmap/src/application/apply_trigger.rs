//! ApplyTrigger: makes a freshly written mapping take effect.
//!
//! The compositor (`dwm.exe` on Windows) reads the digitizer mapping when it
//! starts.  Terminating it is enough: the OS relaunches the compositor within
//! a second and the desktop session survives.  The trigger is fire-and-forget
//! and does not wait for or verify the relaunch.

use std::sync::Arc;

use tracing::info;

pub use touchmap_core::ApplyError;

/// Default compositor process name on Windows.
pub const DEFAULT_COMPOSITOR_PROCESS: &str = "dwm.exe";

/// OS process control.
pub trait ProcessControl: Send + Sync {
    /// Terminates the single process called `name` and returns its PID.
    ///
    /// # Errors
    ///
    /// Returns [`ApplyError::CompositorProcessNotFound`] when no such process
    /// exists and [`ApplyError::MultipleCompositors`] when the name is not
    /// unique.
    fn terminate_by_name(&self, name: &str) -> Result<u32, ApplyError>;
}

/// Restarts the compositor through a [`ProcessControl`].
pub struct ApplyTrigger {
    processes: Arc<dyn ProcessControl>,
    compositor_name: String,
}

impl ApplyTrigger {
    pub fn new(processes: Arc<dyn ProcessControl>, compositor_name: impl Into<String>) -> Self {
        Self {
            processes,
            compositor_name: compositor_name.into(),
        }
    }

    pub fn compositor_name(&self) -> &str {
        &self.compositor_name
    }

    /// Terminates the compositor so the OS relaunches it.
    pub fn apply_changes(&self) -> Result<(), ApplyError> {
        let pid = self.processes.terminate_by_name(&self.compositor_name)?;
        info!(pid, name = %self.compositor_name, "compositor terminated; relaunch left to the OS");
        Ok(())
    }
}
