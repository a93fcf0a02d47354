//! Small helpers shared by chrome and pages.

pub mod format;
pub mod html;
