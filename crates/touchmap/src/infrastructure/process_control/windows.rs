//! Windows process control via a Toolhelp snapshot and `TerminateProcess`.
//!
//! Every interactive session (console, each RDP connection) runs its own
//! `dwm.exe`.  Only the one in the caller's session reads the mapping for the
//! caller's desktop, so candidates are filtered by session id first.

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
    TH32CS_SNAPPROCESS,
};
use windows::Win32::System::RemoteDesktop::ProcessIdToSessionId;
use windows::Win32::System::Threading::{
    GetCurrentProcessId, OpenProcess, TerminateProcess, PROCESS_TERMINATE,
};

use super::process_name_matches;
use crate::application::apply_trigger::{ApplyError, ProcessControl};

/// [`ProcessControl`] backed by the Win32 Toolhelp API.
pub struct ToolhelpProcessControl;

impl ToolhelpProcessControl {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ToolhelpProcessControl {
    fn default() -> Self {
        Self::new()
    }
}

/// A kernel handle closed on drop.
struct OwnedHandle(HANDLE);

impl Drop for OwnedHandle {
    fn drop(&mut self) {
        // SAFETY: the handle was returned by a successful Win32 call and is
        // closed exactly once.
        unsafe {
            let _ = CloseHandle(self.0);
        }
    }
}

impl ProcessControl for ToolhelpProcessControl {
    fn terminate_by_name(&self, name: &str) -> Result<u32, ApplyError> {
        let terminate_failed = |reason: String| ApplyError::TerminateFailed {
            name: name.to_string(),
            reason,
        };

        let session = session_of(unsafe { GetCurrentProcessId() });
        let candidates: Vec<u32> = list_processes()
            .map_err(|e| terminate_failed(e.to_string()))?
            .into_iter()
            .filter(|(_, exe)| process_name_matches(exe, name))
            .map(|(pid, _)| pid)
            .filter(|&pid| session.is_none() || session_of(pid) == session)
            .collect();

        let pid = match candidates.as_slice() {
            [] => {
                return Err(ApplyError::CompositorProcessNotFound {
                    name: name.to_string(),
                })
            }
            [pid] => *pid,
            many => {
                return Err(ApplyError::MultipleCompositors {
                    name: name.to_string(),
                    count: many.len(),
                })
            }
        };

        // SAFETY: OpenProcess/TerminateProcess take plain values; the handle
        // is owned by `OwnedHandle` and closed on every path.
        unsafe {
            let process = OpenProcess(PROCESS_TERMINATE, false, pid)
                .map(OwnedHandle)
                .map_err(|e| terminate_failed(e.to_string()))?;
            TerminateProcess(process.0, 1).map_err(|e| terminate_failed(e.to_string()))?;
        }
        Ok(pid)
    }
}

/// Returns `(pid, executable name)` for every running process.
fn list_processes() -> windows::core::Result<Vec<(u32, String)>> {
    let mut processes = Vec::new();
    // SAFETY: the snapshot handle is owned and closed on drop; `entry.dwSize`
    // is initialised as the API requires.
    unsafe {
        let snapshot = OwnedHandle(CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)?);
        let mut entry = PROCESSENTRY32W {
            dwSize: std::mem::size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut more = Process32FirstW(snapshot.0, &mut entry).is_ok();
        while more {
            let len = entry
                .szExeFile
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(entry.szExeFile.len());
            processes.push((
                entry.th32ProcessID,
                String::from_utf16_lossy(&entry.szExeFile[..len]),
            ));
            more = Process32NextW(snapshot.0, &mut entry).is_ok();
        }
    }
    Ok(processes)
}

fn session_of(pid: u32) -> Option<u32> {
    let mut session = 0u32;
    // SAFETY: `session` is a valid out-pointer.
    unsafe { ProcessIdToSessionId(pid, &mut session) }
        .ok()
        .map(|()| session)
}
