//! Domain entities for TouchMap.
//!
//! This module contains pure data types with no infrastructure dependencies.
//! Code in the application and infrastructure layers depends on these types,
//! but the domain never depends on them.

/// Touchscreen and monitor descriptions produced by a catalog refresh.
pub mod device;

/// Touchscreen-to-monitor assignments as stored by the OS.
pub mod mapping;
