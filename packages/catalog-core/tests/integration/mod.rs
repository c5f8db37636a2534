//! Integration test suite for the catalog core.
//!
//! 1. Layout scenarios through the public [`catalog_core::Catalog`] API
//! 2. Snapshot persistence and recovery

pub mod helpers;
pub mod layout_scenarios;
pub mod persistence_tests;
