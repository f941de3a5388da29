//! Core types for Trelliq.
//!
//! Holds the board-export and task-record models, the error type, the group
//! registry and status classifier that drive task attribution, the TOML
//! configuration layer, CLI settings, and the formatting and time helpers
//! shared by the data and UI crates.

pub mod config;
pub mod error;
pub mod formatting;
pub mod groups;
pub mod models;
pub mod settings;
pub mod status;
pub mod time_utils;

pub use config::ReportConfig;
pub use error::{ReportError, Result};
pub use groups::{Group, GroupMember, GroupRegistry, UNASSIGNED_GROUP_ID, UNASSIGNED_GROUP_NAME};
pub use models::{BoardExport, StatusCategory, TaskRecord};
pub use status::{StatusClassifier, StatusRule};
