use std::path::PathBuf;

/// Errors from loading, picking from, or rewriting the proxy pool.
///
/// Load-time variants are fatal for the whole run; `Exhausted` and `Persist`
/// only fail the clip that hit them.
#[derive(Debug, thiserror::Error)]
pub enum PoolError {
    #[error("failed reading proxy list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("proxy list {} has no entries", path.display())]
    Empty { path: PathBuf },
    #[error("proxy list line {line}: {entry:?} is not a proxy URI with a host")]
    InvalidEntry { line: usize, entry: String },
    #[error("no proxies left in the pool")]
    Exhausted,
    #[error("failed rewriting proxy list {}: {source}", path.display())]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PoolError {
    /// True for errors that mean the pool could not be set up at all.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PoolError::Read { .. } | PoolError::Empty { .. } | PoolError::InvalidEntry { .. }
        )
    }
}
