//! DeviceCatalog: enumerates touchscreens and monitors.
//!
//! A refresh is purely observational.  It issues two discovery queries (the
//! touch-digitizer HID selector and the display-monitor selector), then one
//! detail lookup per monitor to get a human-readable name.  Every one of
//! those calls may suspend, so the whole refresh is `async`.
//!
//! # Superseded refreshes
//!
//! A UI can start a new refresh before the previous one has finished (the
//! user right-clicks the tray icon twice).  Each refresh takes a generation
//! number; after every suspension point it checks that no newer refresh has
//! started and otherwise gives up with [`CatalogError::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};
use touchmap_core::{CatalogSnapshot, DeviceRecord, DeviceSelector, DigitizerDevice, DisplayDevice};

/// Error type for the device discovery service.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    /// The OS device query failed.
    #[error("device query failed: {0}")]
    Query(String),

    /// The per-display detail lookup failed.
    #[error("display {id:?} could not be opened: {reason}")]
    DisplayInfo { id: String, reason: String },
}

/// Per-display details beyond what the device query returns.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DisplayInfo {
    /// The monitor's own name (from EDID), when available.
    pub display_name: Option<String>,
}

/// OS device discovery service.
///
/// Implementations are read-only and may be slow; both methods are async so
/// a caller's UI stays responsive while the OS answers.
#[async_trait]
pub trait DeviceDiscovery: Send + Sync {
    /// Returns every device matching `selector`, in OS enumeration order.
    async fn find_devices(&self, selector: DeviceSelector)
        -> Result<Vec<DeviceRecord>, DiscoveryError>;

    /// Looks up details for the display with interface id `id`.
    async fn display_info(&self, id: &str) -> Result<DisplayInfo, DiscoveryError>;
}

/// Error type for catalog refreshes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CatalogError {
    /// No touchscreen or no monitor was found.  Assignment is impossible.
    #[error("no touchscreen or no monitor found ({digitizers} touchscreens, {displays} displays)")]
    EmptyCatalog { digitizers: usize, displays: usize },

    /// A newer refresh started before this one completed.
    #[error("catalog refresh superseded by a newer refresh")]
    Superseded,

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

/// Builds [`CatalogSnapshot`]s from a [`DeviceDiscovery`] service.
pub struct DeviceCatalog {
    discovery: Arc<dyn DeviceDiscovery>,
    touch_selector: DeviceSelector,
    generation: AtomicU64,
}

impl DeviceCatalog {
    /// Creates a catalog that queries digitizers with `touch_selector`.
    ///
    /// Production code passes [`DeviceSelector::touch_screen()`] or the
    /// selector from the config file.
    pub fn new(discovery: Arc<dyn DeviceDiscovery>, touch_selector: DeviceSelector) -> Self {
        Self {
            discovery,
            touch_selector,
            generation: AtomicU64::new(0),
        }
    }

    /// Enumerates all touchscreens and monitors.
    ///
    /// If a monitor's detail lookup fails, its label falls back to the device
    /// name; the monitor itself is still listed.
    ///
    /// # Errors
    ///
    /// - [`CatalogError::EmptyCatalog`] if either list is empty.
    /// - [`CatalogError::Superseded`] if another refresh started meanwhile.
    /// - [`CatalogError::Discovery`] if a device query fails.
    pub async fn refresh(&self) -> Result<CatalogSnapshot, CatalogError> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let digitizer_records = self.discovery.find_devices(self.touch_selector).await?;
        self.ensure_current(generation)?;
        let display_records = self
            .discovery
            .find_devices(DeviceSelector::DisplayMonitor)
            .await?;
        self.ensure_current(generation)?;

        debug!(
            digitizers = digitizer_records.len(),
            displays = display_records.len(),
            "device queries complete"
        );

        if digitizer_records.is_empty() || display_records.is_empty() {
            return Err(CatalogError::EmptyCatalog {
                digitizers: digitizer_records.len(),
                displays: display_records.len(),
            });
        }

        let digitizers: Vec<DigitizerDevice> = digitizer_records
            .iter()
            .enumerate()
            .map(|(i, record)| DigitizerDevice::from_record(record, i))
            .collect();

        let mut displays = Vec::with_capacity(display_records.len());
        for (i, record) in display_records.iter().enumerate() {
            let info = match self.discovery.display_info(&record.id).await {
                Ok(info) => info,
                Err(e) => {
                    debug!(display_id = %record.id, "display detail lookup failed: {e}");
                    DisplayInfo::default()
                }
            };
            self.ensure_current(generation)?;
            displays.push(DisplayDevice::from_record(
                record,
                info.display_name.as_deref(),
                i,
            ));
        }

        info!(
            digitizers = digitizers.len(),
            displays = displays.len(),
            "device catalog refreshed"
        );
        Ok(CatalogSnapshot {
            digitizers,
            displays,
        })
    }

    fn ensure_current(&self, generation: u64) -> Result<(), CatalogError> {
        if self.generation.load(Ordering::SeqCst) == generation {
            Ok(())
        } else {
            debug!(generation, "abandoning superseded catalog refresh");
            Err(CatalogError::Superseded)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::device_discovery::mock::MockDeviceDiscovery;
    use std::sync::atomic::AtomicBool;
    use tokio::sync::Notify;

    fn catalog(discovery: MockDeviceDiscovery) -> DeviceCatalog {
        DeviceCatalog::new(Arc::new(discovery), DeviceSelector::touch_screen())
    }

    #[tokio::test]
    async fn test_refresh_lists_digitizers_and_displays_in_order() {
        // Arrange
        let cat = catalog(MockDeviceDiscovery::dual_touch_dual_display());

        // Act
        let snap = cat.refresh().await.expect("refresh");

        // Assert
        assert_eq!(snap.digitizers.len(), 2);
        assert_eq!(snap.displays.len(), 2);
        assert_eq!(snap.digitizers[0].id, MockDeviceDiscovery::TOUCH_A);
        assert_eq!(snap.displays[1].id, MockDeviceDiscovery::DISPLAY_2);
    }

    #[tokio::test]
    async fn test_refresh_uses_monitor_display_name_as_label() {
        let cat = catalog(MockDeviceDiscovery::dual_touch_dual_display());
        let snap = cat.refresh().await.expect("refresh");
        assert_eq!(snap.displays[0].display_label, "DELL P2418HT");
        // Second display has no EDID name; falls back to device name.
        assert_eq!(snap.displays[1].display_label, "Generic PnP Monitor");
    }

    #[tokio::test]
    async fn test_refresh_with_zero_displays_is_empty_catalog() {
        let mut discovery = MockDeviceDiscovery::dual_touch_dual_display();
        discovery.displays.clear();
        let err = catalog(discovery).refresh().await.unwrap_err();
        assert_eq!(
            err,
            CatalogError::EmptyCatalog {
                digitizers: 2,
                displays: 0
            }
        );
    }

    #[tokio::test]
    async fn test_refresh_with_zero_digitizers_is_empty_catalog() {
        let mut discovery = MockDeviceDiscovery::dual_touch_dual_display();
        discovery.digitizers.clear();
        let err = catalog(discovery).refresh().await.unwrap_err();
        assert!(matches!(err, CatalogError::EmptyCatalog { digitizers: 0, .. }));
    }

    #[tokio::test]
    async fn test_refresh_propagates_query_failure() {
        let mut discovery = MockDeviceDiscovery::dual_touch_dual_display();
        discovery.should_fail = true;
        let err = catalog(discovery).refresh().await.unwrap_err();
        assert!(matches!(err, CatalogError::Discovery(DiscoveryError::Query(_))));
    }

    #[tokio::test]
    async fn test_refresh_queries_configured_touch_selector() {
        // Arrange
        let discovery = Arc::new(MockDeviceDiscovery::dual_touch_dual_display());
        let selector = DeviceSelector::HidUsage {
            usage_page: 0x0D,
            usage_id: 0x02,
        };
        let cat = DeviceCatalog::new(Arc::clone(&discovery) as Arc<dyn DeviceDiscovery>, selector);

        // Act
        cat.refresh().await.expect("refresh");

        // Assert
        let queries = discovery.queries.lock().unwrap();
        assert_eq!(queries[0], selector);
        assert_eq!(queries[1], DeviceSelector::DisplayMonitor);
    }

    /// Parks the first digitizer query until `release` is notified.
    struct GatedDiscovery {
        inner: MockDeviceDiscovery,
        gate_used: AtomicBool,
        parked: Notify,
        release: Notify,
    }

    #[async_trait]
    impl DeviceDiscovery for GatedDiscovery {
        async fn find_devices(
            &self,
            selector: DeviceSelector,
        ) -> Result<Vec<DeviceRecord>, DiscoveryError> {
            if !self.gate_used.swap(true, Ordering::SeqCst) {
                self.parked.notify_one();
                self.release.notified().await;
            }
            self.inner.find_devices(selector).await
        }

        async fn display_info(&self, id: &str) -> Result<DisplayInfo, DiscoveryError> {
            self.inner.display_info(id).await
        }
    }

    #[tokio::test]
    async fn test_older_refresh_is_superseded_by_newer_refresh() {
        // Arrange
        let discovery = Arc::new(GatedDiscovery {
            inner: MockDeviceDiscovery::dual_touch_dual_display(),
            gate_used: AtomicBool::new(false),
            parked: Notify::new(),
            release: Notify::new(),
        });
        let cat = Arc::new(DeviceCatalog::new(
            Arc::clone(&discovery) as Arc<dyn DeviceDiscovery>,
            DeviceSelector::touch_screen(),
        ));

        // Act: first refresh parks inside its digitizer query
        let first = tokio::spawn({
            let cat = Arc::clone(&cat);
            async move { cat.refresh().await }
        });
        discovery.parked.notified().await;
        let second = cat.refresh().await;
        discovery.release.notify_one();
        let first = first.await.expect("join");

        // Assert
        assert!(second.is_ok(), "newer refresh must complete: {second:?}");
        assert_eq!(first.unwrap_err(), CatalogError::Superseded);
    }
}
