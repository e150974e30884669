//! Report document, JSON persistence, and console summary.
mod summary;
mod types;
mod writer;

pub use summary::summary_lines;
pub use types::{TestOutput, TestResult, TestSettings};
pub use writer::write_report;
