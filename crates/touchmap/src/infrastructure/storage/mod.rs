//! Storage infrastructure: the mapper's own configuration file.
//!
//! Distinct from the configuration *store* the mappings live in; this is the
//! TOML file telling the mapper where that store is and which process to
//! restart.

pub mod config;
