//! Small reusable widgets shared by the dashboard tabs.

pub mod header;
pub mod progress_bar;
