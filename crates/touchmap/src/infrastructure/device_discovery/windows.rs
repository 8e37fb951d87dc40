//! Windows device discovery via WinRT `DeviceInformation`.
//!
//! Selectors become AQS filter strings (`HidDevice::GetDeviceSelector`,
//! `DisplayMonitor::GetDeviceSelector`).  WinRT async operations are awaited
//! with the blocking `.get()` on a `spawn_blocking` thread so the tokio
//! workers never block on the OS.

use tokio::task;
use tracing::trace;
use windows::core::HSTRING;
use windows::Devices::Display::DisplayMonitor;
use windows::Devices::Enumeration::DeviceInformation;
use windows::Devices::HumanInterfaceDevice::HidDevice;
use windows::Win32::System::WinRT::{RoInitialize, RO_INIT_MULTITHREADED};

use async_trait::async_trait;
use touchmap_core::{DeviceRecord, DeviceSelector};

use crate::application::device_catalog::{DeviceDiscovery, DiscoveryError, DisplayInfo};

/// [`DeviceDiscovery`] backed by `Windows.Devices.Enumeration`.
pub struct WinRtDeviceDiscovery;

impl WinRtDeviceDiscovery {
    pub fn new() -> Self {
        Self
    }
}

impl Default for WinRtDeviceDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DeviceDiscovery for WinRtDeviceDiscovery {
    async fn find_devices(
        &self,
        selector: DeviceSelector,
    ) -> Result<Vec<DeviceRecord>, DiscoveryError> {
        task::spawn_blocking(move || find_all(selector).map_err(query_error))
            .await
            .map_err(|e| DiscoveryError::Query(e.to_string()))?
    }

    async fn display_info(&self, id: &str) -> Result<DisplayInfo, DiscoveryError> {
        let id = id.to_string();
        task::spawn_blocking(move || {
            monitor_name(&id).map_err(|e| DiscoveryError::DisplayInfo {
                id: id.clone(),
                reason: e.message().to_string(),
            })
        })
        .await
        .map_err(|e| DiscoveryError::Query(e.to_string()))?
    }
}

fn find_all(selector: DeviceSelector) -> windows::core::Result<Vec<DeviceRecord>> {
    init_apartment();
    let aqs = match selector {
        DeviceSelector::HidUsage {
            usage_page,
            usage_id,
        } => HidDevice::GetDeviceSelector(usage_page, usage_id)?,
        DeviceSelector::DisplayMonitor => DisplayMonitor::GetDeviceSelector()?,
    };
    trace!(aqs = %aqs, "querying devices");

    let collection = DeviceInformation::FindAllAsyncAqsFilter(&aqs)?.get()?;
    let mut records = Vec::with_capacity(collection.Size()? as usize);
    for i in 0..collection.Size()? {
        let info = collection.GetAt(i)?;
        records.push(DeviceRecord::new(
            info.Id()?.to_string_lossy(),
            info.Name()?.to_string_lossy(),
        ));
    }
    Ok(records)
}

fn monitor_name(id: &str) -> windows::core::Result<DisplayInfo> {
    init_apartment();
    let monitor = DisplayMonitor::FromInterfaceIdAsync(&HSTRING::from(id))?.get()?;
    let name = monitor.DisplayName()?.to_string_lossy();
    Ok(DisplayInfo {
        display_name: Some(name).filter(|n| !n.trim().is_empty()),
    })
}

/// Joins the multithreaded apartment.  Repeat calls on a pooled thread
/// return `S_FALSE`, which is harmless.
fn init_apartment() {
    // SAFETY: no pointers are passed.
    let _ = unsafe { RoInitialize(RO_INIT_MULTITHREADED) };
}

fn query_error(e: windows::core::Error) -> DiscoveryError {
    DiscoveryError::Query(format!("{} (0x{:08X})", e.message(), e.code().0))
}
