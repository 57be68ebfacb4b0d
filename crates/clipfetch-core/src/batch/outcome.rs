use crate::fetch::{FailureKind, FetchError, FetchReport};

/// Message for clips whose output file was already on disk.
pub const EXISTS: &str = "Exists";

/// What happened to one manifest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    /// Output file stem, `<id>_<start>_<end>` (the bare video id if planning failed).
    pub item_id: String,
    /// Video identifier, the key used in the status log.
    pub identifier: String,
    pub succeeded: bool,
    pub message: String,
    pub failure: Option<FailureKind>,
}

impl FetchOutcome {
    pub fn exists(item_id: String, identifier: &str) -> Self {
        Self {
            item_id,
            identifier: identifier.to_string(),
            succeeded: true,
            message: EXISTS.to_string(),
            failure: None,
        }
    }

    pub fn fetched(item_id: String, identifier: &str, report: FetchReport) -> Self {
        Self {
            item_id,
            identifier: identifier.to_string(),
            succeeded: report.succeeded,
            message: report.message,
            failure: None,
        }
    }

    pub fn failed(item_id: String, identifier: &str, kind: FailureKind, message: String) -> Self {
        Self {
            item_id,
            identifier: identifier.to_string(),
            succeeded: false,
            message,
            failure: Some(kind),
        }
    }

    pub fn from_error(item_id: String, identifier: &str, err: &FetchError) -> Self {
        Self::failed(item_id, identifier, err.kind(), err.to_string())
    }

    pub fn is_rate_limited(&self) -> bool {
        self.failure == Some(FailureKind::RateLimited)
    }

    /// Rate-limited or starved of proxies: the clip never got a fair try and
    /// is left out of the status log so the next run picks it up again.
    pub fn is_transient(&self) -> bool {
        matches!(
            self.failure,
            Some(FailureKind::RateLimited | FailureKind::PoolExhausted)
        )
    }

    pub fn is_skipped(&self) -> bool {
        self.succeeded && self.message == EXISTS
    }
}

/// Outcomes of a run plus counters for the closing summary line.
#[derive(Debug, Clone, Default)]
pub struct BatchSummary {
    pub outcomes: Vec<FetchOutcome>,
    /// Rows dropped because the status log already had their identifier.
    pub skipped_from_log: usize,
}

impl BatchSummary {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.succeeded).count()
    }

    pub fn existed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_skipped()).count()
    }

    pub fn rate_limited(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_rate_limited()).count()
    }
}
