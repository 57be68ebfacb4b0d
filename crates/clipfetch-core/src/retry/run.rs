//! Retry loop: run an attempt until success or policy says stop.

use super::policy::{ErrorKind, RetryDecision, RetryPolicy};

/// Errors that carry their own retry classification.
pub trait Classified {
    fn kind(&self) -> ErrorKind;
}

/// Runs `f` until it succeeds or the retry policy says to stop, returning the
/// last error in the latter case. `f` receives the 1-based attempt number.
/// On retryable failure, sleeps for the backoff duration then tries again.
pub fn run_with_retry<T, E, F>(policy: &RetryPolicy, mut f: F) -> Result<T, E>
where
    E: Classified,
    F: FnMut(u32) -> Result<T, E>,
{
    let mut attempt = 1u32;
    loop {
        match f(attempt) {
            Ok(v) => return Ok(v),
            Err(e) => match policy.decide(attempt, e.kind()) {
                RetryDecision::NoRetry => return Err(e),
                RetryDecision::RetryAfter(d) => {
                    if !d.is_zero() {
                        std::thread::sleep(d);
                    }
                    attempt += 1;
                }
            },
        }
    }
}
