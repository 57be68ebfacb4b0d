//! Retry and backoff policy.
//!
//! Failures from external tools are classified once at the process boundary
//! (throttled, failed, could not launch); this module turns those kinds into
//! retry decisions so the fetcher only has to say what one attempt does.

mod policy;
mod run;

pub use policy::{ErrorKind, RetryDecision, RetryPolicy};
pub use run::{run_with_retry, Classified};
