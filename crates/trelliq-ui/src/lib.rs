//! Terminal presentation layer for trelliq.
//!
//! Provides themes, the header and progress-bar components, table and bar
//! chart views, the plain-text report and the tabbed dashboard event loop,
//! all built on top of [`ratatui`].

pub mod app;
pub mod chart_view;
pub mod components;
pub mod table_view;
pub mod text_report;
pub mod themes;

pub use trelliq_core as core;
