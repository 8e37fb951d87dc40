//! Mock device discovery for unit testing.
//!
//! Returns fixed digitizer and display lists and records every selector it
//! is queried with.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use touchmap_core::{DeviceRecord, DeviceSelector};

use crate::application::device_catalog::{DeviceDiscovery, DiscoveryError, DisplayInfo};

/// A [`DeviceDiscovery`] over in-memory device lists.
#[derive(Debug, Default)]
pub struct MockDeviceDiscovery {
    /// Returned for every `HidUsage` selector.
    pub digitizers: Vec<DeviceRecord>,
    /// Returned for the `DisplayMonitor` selector.
    pub displays: Vec<DeviceRecord>,
    /// Display id → monitor name reported by `display_info`.  Displays not
    /// listed here have no monitor name.
    pub display_names: HashMap<String, String>,
    /// When `true`, `find_devices` fails with `DiscoveryError::Query`.
    pub should_fail: bool,
    /// Selectors passed to `find_devices`, in call order.
    pub queries: Mutex<Vec<DeviceSelector>>,
}

impl MockDeviceDiscovery {
    pub const TOUCH_A: &'static str =
        r"\\?\HID#VID_222A&PID_0001&Col02#7&2bb1d3f4&0&0001#{4d1e55b2-f16f-11cf-88cb-001111000030}";
    pub const TOUCH_B: &'static str =
        r"\\?\HID#VID_0EEF&PID_C002&Col01#8&1c9a0e55&0&0000#{4d1e55b2-f16f-11cf-88cb-001111000030}";
    pub const DISPLAY_1: &'static str =
        r"\\?\DISPLAY#DELA0F3#5&2d7c2b1&0&UID4353#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";
    pub const DISPLAY_2: &'static str =
        r"\\?\DISPLAY#GSM5B7F#5&2d7c2b1&0&UID4357#{e6f07b5f-ee97-4a90-b076-33f57bf4eaa7}";

    /// Two touchscreens and two monitors; only the first monitor reports a
    /// monitor name.
    pub fn dual_touch_dual_display() -> Self {
        Self {
            digitizers: vec![
                DeviceRecord::new(Self::TOUCH_A, "HID-compliant touch screen"),
                DeviceRecord::new(Self::TOUCH_B, "HID-compliant touch screen"),
            ],
            displays: vec![
                DeviceRecord::new(Self::DISPLAY_1, "Generic PnP Monitor"),
                DeviceRecord::new(Self::DISPLAY_2, "Generic PnP Monitor"),
            ],
            display_names: HashMap::from([(
                Self::DISPLAY_1.to_string(),
                "DELL P2418HT".to_string(),
            )]),
            ..Self::default()
        }
    }
}

#[async_trait]
impl DeviceDiscovery for MockDeviceDiscovery {
    async fn find_devices(
        &self,
        selector: DeviceSelector,
    ) -> Result<Vec<DeviceRecord>, DiscoveryError> {
        self.queries.lock().unwrap().push(selector);
        if self.should_fail {
            return Err(DiscoveryError::Query("mock discovery failure".to_string()));
        }
        Ok(match selector {
            DeviceSelector::HidUsage { .. } => self.digitizers.clone(),
            DeviceSelector::DisplayMonitor => self.displays.clone(),
        })
    }

    async fn display_info(&self, id: &str) -> Result<DisplayInfo, DiscoveryError> {
        if !self.displays.iter().any(|d| d.id == id) {
            return Err(DiscoveryError::DisplayInfo {
                id: id.to_string(),
                reason: "unknown display".to_string(),
            });
        }
        Ok(DisplayInfo {
            display_name: self.display_names.get(id).cloned(),
        })
    }
}
