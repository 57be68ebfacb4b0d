//! Batch coordinator.
//!
//! Filters the manifest against the status log, makes sure every output
//! directory exists, then runs clips sequentially or on a bounded pool of
//! blocking workers. Each finished clip yields one [`FetchOutcome`]; the full
//! list is written as a JSON report at the end.

mod outcome;
mod report;
mod run;

pub use outcome::{BatchSummary, FetchOutcome, EXISTS};
pub use report::{read_report, write_report};
pub use run::{process_row, run_batch, BatchContext, BatchOptions};
