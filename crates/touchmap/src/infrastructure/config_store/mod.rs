//! Configuration store adapters.
//!
//! | Module    | OS      | Backing                                       |
//! |-----------|---------|-----------------------------------------------|
//! | `windows` | Windows | Registry values under `HKEY_LOCAL_MACHINE`    |
//! | `memory`  | any     | In-memory table, used by tests                |
//!
//! The Windows adapter is re-exported as `NativeConfigStore` so the binary
//! does not need to know the OS at compile time.

pub mod memory;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::RegistryConfigStore as NativeConfigStore;
