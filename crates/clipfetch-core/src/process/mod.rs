//! Narrow seam over external command-line tools.
//!
//! Everything the fetcher shells out to (URL resolver, encoder, ssh) goes
//! through [`ProcessRunner`], so tests can swap in a scripted fake. Failures
//! are classified here, once, into [`ErrorKind`](crate::retry::ErrorKind).

mod classify;
mod runner;

pub use classify::{classify_output, http_status_in};
pub use runner::{run_checked, CommandSpec, ProcessFailure, ProcessOutput, ProcessRunner, SystemRunner};
