//! Run one batch: load proxies and manifest, fetch, print progress and summary.

use anyhow::{Context, Result};
use clipfetch_core::batch::{self, FetchOutcome};
use clipfetch_core::config::ClipfetchConfig;
use clipfetch_core::fetch::{ClipFetcher, FetchEvent, FetchSettings};
use clipfetch_core::manifest::Manifest;
use clipfetch_core::process::{ProcessRunner, SystemRunner};
use clipfetch_core::proxy_pool::{ProxyPool, SshRelayDisabler};
use std::sync::Arc;

use super::Cli;

fn progress_line(o: &FetchOutcome) -> String {
    let status = if o.succeeded { "ok" } else { "FAILED" };
    let first_line = o.message.lines().next().unwrap_or("");
    format!("{} - {} - {}", o.item_id, status, first_line)
}

pub async fn run_download(cli: &Cli, cfg: &ClipfetchConfig) -> Result<()> {
    let opts = cli.batch_options(cfg)?;
    let runner: Arc<dyn ProcessRunner> = Arc::new(SystemRunner);

    // Without proxies nothing can be fetched; stop before touching the manifest.
    let relay = SshRelayDisabler::new(Arc::clone(&runner), &cfg.relay);
    let pool = ProxyPool::load(&cfg.proxy_file, Box::new(relay))?;
    println!("Loaded {} proxies from {}", pool.len(), cfg.proxy_file.display());

    let manifest = Manifest::load(&cli.input_manifest)
        .with_context(|| format!("read manifest: {}", cli.input_manifest.display()))?;
    println!("{} clips in {}", manifest.rows.len(), cli.input_manifest.display());

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel::<FetchEvent>();
    let event_handle = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            println!("{}", event);
        }
    });

    let fetcher = Arc::new(
        ClipFetcher::new(Arc::new(pool), runner, FetchSettings::from_config(cfg)).with_events(event_tx),
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<FetchOutcome>(64);
    let progress_handle = tokio::spawn(async move {
        while let Some(outcome) = progress_rx.recv().await {
            println!("{}", progress_line(&outcome));
        }
    });

    let summary = batch::run_batch(manifest, Arc::clone(&fetcher), &opts, Some(progress_tx)).await?;
    let _ = progress_handle.await;

    if summary.skipped_from_log > 0 {
        println!("Skipped {} clip(s) already in the status log.", summary.skipped_from_log);
    }
    println!(
        "{} clip(s): {} ok ({} already present), {} failed ({} rate-limited). {} proxies left. Report: {}",
        summary.outcomes.len(),
        summary.succeeded(),
        summary.existed(),
        summary.failed(),
        summary.rate_limited(),
        fetcher.pool().len(),
        opts.report_path.display()
    );
    // Dropping the fetcher closes the event channel so the printer drains and exits.
    drop(fetcher);
    let _ = event_handle.await;
    Ok(())
}
