//! From reader rows to the written report.
//!
//! - [`aggregate`] — drops test-project and ignored rows, then deduplicates.
//! - [`xlsx`] — the `Packages` spreadsheet.
//! - [`terminal`] — console summary of what was written.

pub mod aggregate;
pub mod terminal;
pub mod xlsx;
