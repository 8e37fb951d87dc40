//! Infrastructure layer.
//!
//! Contains OS-facing adapters and file storage.
//!
//! **Dependency rule**: this layer may depend on `application` and
//! `touchmap_core`, but MUST NOT be imported by the `application` layer
//! outside of its tests.
//!
//! # Sub-modules
//!
//! - **`device_discovery`** – Implementations of `DeviceDiscovery`.  On
//!   Windows, WinRT `DeviceInformation` queries; everywhere, a mock.
//!
//! - **`config_store`** – Implementations of `ConfigStore`.  On Windows, the
//!   registry under `HKEY_LOCAL_MACHINE`; everywhere, an in-memory table.
//!
//! - **`process_control`** – Implementations of `ProcessControl`.  On Windows,
//!   a Toolhelp snapshot + `TerminateProcess`; everywhere, a mock.
//!
//! - **`storage`** – The TOML configuration file.

pub mod config_store;
pub mod device_discovery;
pub mod process_control;
pub mod storage;
