#![allow(dead_code)]

pub mod fake_tools;

use clipfetch_core::config::RelayConfig;
use clipfetch_core::fetch::{ClipFetcher, FetchSettings};
use clipfetch_core::proxy_pool::{ProxyPool, SshRelayDisabler};
use std::path::Path;
use std::sync::Arc;

use fake_tools::FakeTools;

/// Write `count` proxies to `<dir>/proxies.txt` and load them with an ssh relay backed by `tools`.
pub fn pool(dir: &Path, count: usize, tools: &Arc<FakeTools>) -> Arc<ProxyPool> {
    let path = dir.join("proxies.txt");
    let list: String = (1..=count).map(|i| format!("http://10.0.0.{}:3128\n", i)).collect();
    std::fs::write(&path, list).unwrap();
    let relay = SshRelayDisabler::new(tools.clone(), &RelayConfig::default());
    Arc::new(ProxyPool::load(&path, Box::new(relay)).unwrap())
}

pub fn fetcher(pool: Arc<ProxyPool>, tools: Arc<FakeTools>) -> Arc<ClipFetcher> {
    Arc::new(ClipFetcher::new(pool, tools, FetchSettings::default()))
}
