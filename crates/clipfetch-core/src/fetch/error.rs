use std::fmt;

use crate::proxy_pool::PoolError;

/// Which external step a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Resolve,
    Encode,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Resolve => f.write_str("resolve"),
            Stage::Encode => f.write_str("encode"),
        }
    }
}

/// Coarse failure category recorded with each outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Identifier or plan was malformed; never reaches an external tool.
    Invalid,
    /// No proxy left in the pool.
    PoolExhausted,
    /// Last attempt was answered with HTTP 429. Not written to the status
    /// log so the clip is tried again on the next run.
    RateLimited,
    ResolutionFailed,
    EncodeFailed,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("video identifier {0:?} must be exactly 11 characters")]
    InvalidIdentifier(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
    #[error("{diagnostic}")]
    RateLimited { stage: Stage, diagnostic: String },
    #[error("{0}")]
    ResolutionFailed(String),
    #[error("{0}")]
    EncodeFailed(String),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::InvalidIdentifier(_) => FailureKind::Invalid,
            FetchError::Pool(_) => FailureKind::PoolExhausted,
            FetchError::RateLimited { .. } => FailureKind::RateLimited,
            FetchError::ResolutionFailed(_) => FailureKind::ResolutionFailed,
            FetchError::EncodeFailed(_) => FailureKind::EncodeFailed,
        }
    }
}
