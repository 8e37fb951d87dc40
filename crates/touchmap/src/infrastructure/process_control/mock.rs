//! Mock process control for tests.
//!
//! Holds a fixed list of "running" processes.  Terminating one records its
//! name; the process stays in the list because the real OS relaunches the
//! compositor straight away.

use std::sync::Mutex;

use super::process_name_matches;
use crate::application::apply_trigger::{ApplyError, ProcessControl};

/// A [`ProcessControl`] over an in-memory process list.
#[derive(Debug)]
pub struct MockProcessControl {
    /// `(pid, executable name)` pairs considered running.
    pub running: Vec<(u32, String)>,
    /// Names passed to successful `terminate_by_name` calls, in order.
    pub terminated: Mutex<Vec<String>>,
}

impl MockProcessControl {
    /// A process list containing one `dwm.exe`.
    pub fn with_compositor() -> Self {
        Self::with_processes(&[(1234, "dwm.exe"), (4321, "explorer.exe")])
    }

    /// A process list without any compositor.
    pub fn without_compositor() -> Self {
        Self::with_processes(&[(4321, "explorer.exe")])
    }

    pub fn with_processes(processes: &[(u32, &str)]) -> Self {
        Self {
            running: processes
                .iter()
                .map(|(pid, name)| (*pid, name.to_string()))
                .collect(),
            terminated: Mutex::new(Vec::new()),
        }
    }

    pub fn termination_count(&self) -> usize {
        self.terminated.lock().unwrap().len()
    }
}

impl ProcessControl for MockProcessControl {
    fn terminate_by_name(&self, name: &str) -> Result<u32, ApplyError> {
        let matches: Vec<u32> = self
            .running
            .iter()
            .filter(|(_, exe)| process_name_matches(exe, name))
            .map(|(pid, _)| *pid)
            .collect();

        match matches.as_slice() {
            [] => Err(ApplyError::CompositorProcessNotFound {
                name: name.to_string(),
            }),
            [pid] => {
                self.terminated.lock().unwrap().push(name.to_string());
                Ok(*pid)
            }
            many => Err(ApplyError::MultipleCompositors {
                name: name.to_string(),
                count: many.len(),
            }),
        }
    }
}
