//! Vector Engine Integration Tests
//!
//! End-to-end tests through the `vexil` facade:
//! - Index lifecycle, configuration and optimization
//! - Similarity, keyword, hybrid search and aggregation
//! - Collections and the backup catalog
//! - Command surface and batch execution
//! - Property tests for search ordering and filters

mod common;

mod backup;
mod batch;
mod collections;
mod index_lifecycle;
mod properties;
mod search;
