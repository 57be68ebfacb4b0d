//! Shared pool of egress proxies.
//!
//! Loaded once per process from a newline-separated list. Workers pick at
//! random; a proxy that gets rate-limited is removed for the rest of the run
//! and the list on disk is rewritten before `remove` returns. Picks only take
//! the read side of the lock, so they never wait on each other.

mod error;
mod persist;
mod relay;

pub use error::PoolError;
pub use persist::{parse_list, relay_host};
pub use relay::{NoopRelay, RelayDisabler, SshRelayDisabler};

use rand::seq::SliceRandom;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub struct ProxyPool {
    path: PathBuf,
    entries: RwLock<Vec<String>>,
    relay: Box<dyn RelayDisabler>,
}

impl std::fmt::Debug for ProxyPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyPool")
            .field("path", &self.path)
            .field("entries", &*self.read())
            .finish_non_exhaustive()
    }
}

impl ProxyPool {
    /// Load the pool from `path`. Fails if the file is unreadable, empty, or holds a non-URI line.
    pub fn load(path: &Path, relay: Box<dyn RelayDisabler>) -> Result<Self, PoolError> {
        let entries = persist::load(path)?;
        tracing::info!(count = entries.len(), path = %path.display(), "loaded proxy pool");
        Ok(Self {
            path: path.to_path_buf(),
            entries: RwLock::new(entries),
            relay,
        })
    }

    // Poisoning is ignored: the only mutation swaps in a whole list, which cannot leave it torn.
    fn read(&self) -> RwLockReadGuard<'_, Vec<String>> {
        self.entries.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<String>> {
        self.entries.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Pick one proxy uniformly at random.
    pub fn pick(&self) -> Result<String, PoolError> {
        self.read()
            .choose(&mut rand::thread_rng())
            .cloned()
            .ok_or(PoolError::Exhausted)
    }

    /// Remove every occurrence of `proxy`, persist the shrunken list, then
    /// disable the relay behind it. Returns how many entries were removed
    /// (0 if another worker already evicted it; the relay is left alone then).
    ///
    /// If the rewrite fails the pool is left untouched and the relay is not
    /// disabled. Relay failures are logged and swallowed.
    pub fn remove(&self, proxy: &str) -> Result<usize, PoolError> {
        let removed = {
            let mut entries = self.write();
            let kept: Vec<String> = entries.iter().filter(|p| *p != proxy).cloned().collect();
            let removed = entries.len() - kept.len();
            if removed > 0 {
                persist::save(&self.path, &kept)?;
                *entries = kept;
            }
            removed
        };

        if removed > 0 {
            tracing::warn!(%proxy, remaining = self.len(), "evicted rate-limited proxy");
            if let Err(e) = self.relay.disable(proxy) {
                tracing::warn!(%proxy, "relay disable failed: {:#}", e);
            }
        }
        Ok(removed)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn contains(&self, proxy: &str) -> bool {
        self.read().iter().any(|p| p == proxy)
    }

    /// Copy of the current entries.
    pub fn snapshot(&self) -> Vec<String> {
        self.read().clone()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
