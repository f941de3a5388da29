//! Data layer for Trelliq.
//!
//! Reads and validates Trello board exports, extracts one canonical record per
//! task, aggregates summary tables, flattens them into presentation-neutral
//! tables, serializes exports, and runs the top-level report pipeline.

pub mod aggregator;
pub mod analysis;
pub mod exporter;
pub mod extractor;
mod proptests;
pub mod reader;
pub mod tables;

pub use trelliq_core as core;
