//! Application layer use cases.
//!
//! Use cases in this layer depend on traits (`DeviceDiscovery`,
//! `ConfigStore`, `ProcessControl`) rather than OS APIs, so the
//! infrastructure can be swapped for in-memory doubles in tests.
//!
//! # Sub-modules
//!
//! - **`device_catalog`** – Enumerates touchscreens and monitors into a
//!   [`CatalogSnapshot`](touchmap_core::CatalogSnapshot).
//!
//! - **`mapping_store`** – Reads and writes the configuration-store key that
//!   maps each touchscreen to a monitor, using the identity matcher to locate
//!   the key.
//!
//! - **`apply_trigger`** – Restarts the compositor so a new mapping takes
//!   effect without signing out.
//!
//! - **`selection_cache`** – Remembers the last display chosen per
//!   touchscreen so an assignment can be re-applied without re-prompting.
//!
//! - **`assign_display`** – The mapping engine: Resolve → Write → Apply.

pub mod apply_trigger;
pub mod assign_display;
pub mod device_catalog;
pub mod mapping_store;
pub mod selection_cache;
