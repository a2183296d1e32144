//! Data ingestion layer for the site metrics aggregator.
//!
//! Responsible for discovering and parsing snapshot files, merging them into
//! deduplicated daily series and running the end-to-end aggregation.

pub mod aggregator;
pub mod analysis;
pub mod reader;

pub use metrics_core as core;
