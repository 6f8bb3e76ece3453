//! Reporting utilities: progress lines and the run summary.
//!
//! We keep formatting code in one place so:
//! - the grouping/averaging code stays clean and testable
//! - output changes are localized (important for future snapshot tests)

pub mod format;

pub use format::*;
