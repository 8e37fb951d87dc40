//! Touchscreen (digitizer) and monitor (display) entities.
//!
//! A catalog refresh asks the OS for two device lists and turns every raw
//! [`DeviceRecord`] into either a [`DigitizerDevice`] or a [`DisplayDevice`]
//! with a human-readable label.  Both lists live inside a [`CatalogSnapshot`]
//! which is thrown away on the next refresh; device identifiers are only
//! guaranteed stable within the current session.

use serde::{Deserialize, Serialize};

/// HID usage page for digitizers.
pub const HID_USAGE_PAGE_DIGITIZER: u16 = 0x0D;

/// HID usage for a touch screen on the digitizer page.
pub const HID_USAGE_DIGITIZER_TOUCH_SCREEN: u16 = 0x04;

/// Which class of devices a discovery query should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceSelector {
    /// HID devices with the given top-level usage page and usage id.
    HidUsage { usage_page: u16, usage_id: u16 },
    /// Display monitor interfaces.
    DisplayMonitor,
}

impl DeviceSelector {
    /// The selector for touch-screen digitizers (usage page 0x0D, usage 0x04).
    pub const fn touch_screen() -> Self {
        Self::HidUsage {
            usage_page: HID_USAGE_PAGE_DIGITIZER,
            usage_id: HID_USAGE_DIGITIZER_TOUCH_SCREEN,
        }
    }
}

/// A device as reported by the OS discovery service, before labelling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceRecord {
    /// OS device (interface) identifier.
    pub id: String,
    /// Friendly name reported by the OS; may be empty.
    pub name: String,
}

impl DeviceRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// A touch-input digitizer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitizerDevice {
    /// Raw OS device identifier.  Configuration-store keys embed this string.
    pub id: String,
    /// Label shown to the user.
    pub display_label: String,
}

impl DigitizerDevice {
    /// Builds a digitizer from the `index`-th (0-based) discovery record.
    ///
    /// Falls back to `"Touchscreen #<n>"` when the OS reports no name.
    pub fn from_record(record: &DeviceRecord, index: usize) -> Self {
        let display_label = non_blank(&record.name)
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Touchscreen #{}", index + 1));
        Self {
            id: record.id.clone(),
            display_label,
        }
    }
}

/// A display monitor that a digitizer can be assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayDevice {
    /// Display interface identifier.  This is the value written to the store.
    pub id: String,
    /// Label shown to the user.
    pub display_label: String,
}

impl DisplayDevice {
    /// Builds a display from the `index`-th (0-based) discovery record.
    ///
    /// The label prefers the monitor's own display name, then the device
    /// name, then `"Display #<n>"`.
    pub fn from_record(record: &DeviceRecord, display_name: Option<&str>, index: usize) -> Self {
        let display_label = display_name
            .and_then(non_blank)
            .or_else(|| non_blank(&record.name))
            .map(str::to_owned)
            .unwrap_or_else(|| format!("Display #{}", index + 1));
        Self {
            id: record.id.clone(),
            display_label,
        }
    }
}

fn non_blank(s: &str) -> Option<&str> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// The result of one catalog refresh: both device lists in enumeration order.
///
/// Positions are stable for the lifetime of the snapshot, so callers may
/// refer to devices by their 1-based index when presenting a menu.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub digitizers: Vec<DigitizerDevice>,
    pub displays: Vec<DisplayDevice>,
}

impl CatalogSnapshot {
    /// Finds a digitizer by 1-based position or by exact device id.
    pub fn select_digitizer(&self, selector: &str) -> Option<&DigitizerDevice> {
        match parse_position(selector, self.digitizers.len()) {
            Some(i) => self.digitizers.get(i),
            None => self.digitizers.iter().find(|d| d.id == selector),
        }
    }

    /// Finds a display by 1-based position or by exact device id.
    pub fn select_display(&self, selector: &str) -> Option<&DisplayDevice> {
        match parse_position(selector, self.displays.len()) {
            Some(i) => self.displays.get(i),
            None => self.displays.iter().find(|d| d.id == selector),
        }
    }
}

fn parse_position(selector: &str, len: usize) -> Option<usize> {
    match selector.trim().parse::<usize>() {
        Ok(n) if n >= 1 && n <= len => Some(n - 1),
        _ => None,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
