//! Device discovery adapters: touchscreens and monitors.
//!
//! Each adapter implements
//! [`DeviceDiscovery`](crate::application::device_catalog::DeviceDiscovery);
//! the native one is re-exported as `NativeDeviceDiscovery`:
//!
//! | Module    | OS      | API used                                                       |
//! |-----------|---------|----------------------------------------------------------------|
//! | `windows` | Windows | `DeviceInformation::FindAllAsync` + `DisplayMonitor` (WinRT)   |
//! | `mock`    | any     | Fixed device lists                                             |
//!
//! [`MockDeviceDiscovery`](mock::MockDeviceDiscovery) is always compiled so
//! catalog tests run on any platform without hardware.

pub mod mock;

#[cfg(target_os = "windows")]
pub mod windows;

#[cfg(target_os = "windows")]
pub use windows::WinRtDeviceDiscovery as NativeDeviceDiscovery;
