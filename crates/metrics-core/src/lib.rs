//! Core types for the site metrics aggregator.
//!
//! Holds the snapshot data model, the error taxonomy, CLI settings, date
//! formatting, the 7-day moving average and chart-series serialization.

pub mod calculations;
pub mod error;
pub mod formatting;
pub mod models;
pub mod settings;
pub mod time_utils;
