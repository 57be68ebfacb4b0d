//! Per-attempt progress emitted by the fetcher for operator output.

use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

use super::error::Stage;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchEvent {
    /// A proxy was picked for a resolution attempt.
    UsingProxy { identifier: String, proxy: String },
    /// One external step failed through `proxy`.
    AttemptFailed {
        identifier: String,
        stage: Stage,
        attempt: u32,
        proxy: String,
        diagnostic: String,
    },
    /// Encoder finished for `identifier`.
    Downloaded { identifier: String, proxy: String },
}

impl fmt::Display for FetchEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchEvent::UsingProxy { identifier, proxy } => {
                write!(f, "{} - using {} proxy", identifier, proxy)
            }
            FetchEvent::AttemptFailed {
                identifier,
                stage,
                attempt,
                proxy,
                diagnostic,
            } => {
                let first_line = diagnostic.lines().next().unwrap_or("");
                write!(
                    f,
                    "{} - {} attempt {} failed: {}, proxy {}",
                    identifier, stage, attempt, first_line, proxy
                )
            }
            FetchEvent::Downloaded { identifier, proxy } => {
                write!(f, "{} - downloaded - proxy: {}", identifier, proxy)
            }
        }
    }
}

/// Where fetch events go; a closed receiver is ignored.
pub type EventSink = UnboundedSender<FetchEvent>;
