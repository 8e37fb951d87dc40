//! touchmap library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does touchmap do? (for beginners)
//!
//! Windows decides on its own which monitor each touchscreen controls, and on
//! multi-monitor desktops it frequently gets this wrong.  The pairing lives in
//! the pen/touch configuration store (`HKLM\SOFTWARE\Microsoft\Wisp\Pen\Digimon`).
//! touchmap:
//!
//! 1. Enumerates the touchscreens (HID usage page 0x0D, usage 0x04) and the
//!    monitors attached to the machine.
//! 2. Finds the store key belonging to the chosen touchscreen.
//! 3. Overwrites that key's value with the chosen monitor's id.
//! 4. Restarts the desktop window manager (`dwm.exe`), which the OS relaunches
//!    immediately and which re-reads the store on startup.

/// Application layer: catalog refresh, store access, apply trigger, and the
/// mapping engine that orchestrates them.
pub mod application;

/// Infrastructure layer: OS adapters and configuration file storage.
pub mod infrastructure;
