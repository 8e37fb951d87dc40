//! # touchmap-core
//!
//! Shared library for TouchMap containing the device and mapping entities,
//! the identity matcher, and the assignment state machine types.
//!
//! This crate has zero dependencies on OS APIs.  Everything here can be
//! compiled and tested on any platform.
//!
//! # Architecture overview (for beginners)
//!
//! On a desktop with several touchscreens and several monitors, Windows often
//! guesses wrong about which touchscreen belongs to which monitor: touching
//! the left screen moves the cursor on the right one.  TouchMap lets the user
//! pick the pairing explicitly.
//!
//! Windows keeps the pairing in a registry key where each *value name* embeds
//! a touchscreen's device identifier and each *value* is the identifier of the
//! monitor it drives.  This crate defines:
//!
//! - **`domain`** – The entities: [`DigitizerDevice`], [`DisplayDevice`],
//!   [`CatalogSnapshot`], [`MappingEntry`], and [`MappingTable`].
//!
//! - **`matcher`** – The identity matcher that finds the store key belonging
//!   to a touchscreen by substring containment.
//!
//! - **`assignment`** – The phases an assignment walks through and the typed
//!   outcome that distinguishes "saved" from "saved and applied".

pub mod assignment;
pub mod domain;
pub mod matcher;

// Re-export the most-used types at the crate root so callers can write
// `touchmap_core::MappingTable` instead of `touchmap_core::domain::mapping::MappingTable`.
pub use assignment::{ApplyError, AssignPhase, AssignmentOutcome};
pub use domain::device::{
    CatalogSnapshot, DeviceRecord, DeviceSelector, DigitizerDevice, DisplayDevice,
};
pub use domain::mapping::{MappingEntry, MappingTable};
pub use matcher::{resolve_store_key, MatchError, MatchPolicy};
