//! Run a whole manifest: directory setup, resume filtering, dispatch, report.

use anyhow::{Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::fetch::{ClipFetcher, FailureKind};
use crate::manifest::{Manifest, ManifestRow};
use crate::plan::{self, LabelDirs, TrimFormat};
use crate::status_log::{self, StatusLog};

use super::outcome::{BatchSummary, FetchOutcome};
use super::report::write_report;

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Scratch directory, created up front and removed recursively when the batch ends.
    pub tmp_dir: PathBuf,
    pub trim_format: TrimFormat,
    /// Worker count; 1 (or 0) runs clips one after another.
    pub num_jobs: usize,
    pub status_log: Option<PathBuf>,
    pub report_path: PathBuf,
}

/// Everything a worker needs to turn one manifest row into an outcome.
pub struct BatchContext {
    pub fetcher: Arc<ClipFetcher>,
    pub dirs: LabelDirs,
    pub trim_format: TrimFormat,
    pub status_log: Option<Arc<StatusLog>>,
}

/// Plan, skip-or-fetch, and record one row. Blocking.
pub fn process_row(ctx: &BatchContext, row: &ManifestRow) -> FetchOutcome {
    let id = row.video_id.as_str();
    let outcome = match plan::plan(row, &ctx.dirs, &ctx.trim_format) {
        Err(e) => FetchOutcome::failed(id.to_string(), id, FailureKind::Invalid, e.to_string()),
        Ok(item) if item.output_path.exists() => FetchOutcome::exists(item.clip_id(), id),
        Ok(item) => match ctx.fetcher.fetch_item(&item) {
            Ok(report) => FetchOutcome::fetched(item.clip_id(), id, report),
            Err(e) => FetchOutcome::from_error(item.clip_id(), id, &e),
        },
    };

    if let Some(log) = &ctx.status_log {
        if !outcome.is_transient() {
            if let Err(e) = log.append(&outcome.identifier, &outcome.message) {
                tracing::warn!(identifier = %outcome.identifier, "status log append failed: {:#}", e);
            }
        }
    }
    outcome
}

fn create_dirs(opts: &BatchOptions, dirs: &LabelDirs) -> Result<()> {
    for dir in [opts.output_dir.as_path(), opts.tmp_dir.as_path()]
        .into_iter()
        .chain(dirs.dirs())
    {
        std::fs::create_dir_all(dir).with_context(|| format!("create dir: {}", dir.display()))?;
    }
    Ok(())
}

fn remove_tmp_dir(tmp_dir: &Path) {
    match std::fs::remove_dir_all(tmp_dir) {
        Ok(()) => tracing::debug!(path = %tmp_dir.display(), "removed tmp dir"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(path = %tmp_dir.display(), "could not remove tmp dir: {}", e),
    }
}

/// Runs every row of `manifest` and writes the report.
///
/// Rows already present in the status log are dropped first. With
/// `num_jobs > 1`, up to `num_jobs` clips run at once on blocking worker
/// threads; completion order is arbitrary. Each outcome is also sent to
/// `progress_tx` as soon as it is known.
pub async fn run_batch(
    mut manifest: Manifest,
    fetcher: Arc<ClipFetcher>,
    opts: &BatchOptions,
    progress_tx: Option<mpsc::Sender<FetchOutcome>>,
) -> Result<BatchSummary> {
    let dirs = LabelDirs::new(&opts.output_dir, manifest.has_labels.then(|| manifest.labels()));
    create_dirs(opts, &dirs)?;

    let mut skipped_from_log = 0;
    let status_log = match &opts.status_log {
        Some(path) => {
            let log = StatusLog::open(path)?;
            let seen = status_log::load_skip_set(path)?;
            skipped_from_log = manifest.retain_unseen(|id| seen.contains(id));
            tracing::info!(
                skipped = skipped_from_log,
                remaining = manifest.rows.len(),
                "filtered manifest against {}",
                path.display()
            );
            Some(Arc::new(log))
        }
        None => None,
    };

    let ctx = Arc::new(BatchContext {
        fetcher,
        dirs,
        trim_format: opts.trim_format.clone(),
        status_log,
    });

    let mut outcomes = Vec::with_capacity(manifest.rows.len());
    let max_concurrent = opts.num_jobs.max(1);

    if max_concurrent == 1 {
        for row in manifest.rows {
            let ctx = Arc::clone(&ctx);
            let outcome = tokio::task::spawn_blocking(move || process_row(&ctx, &row))
                .await
                .map_err(|e| anyhow::anyhow!("clip task join: {}", e))?;
            notify(&progress_tx, &outcome).await;
            outcomes.push(outcome);
        }
    } else {
        let mut queue: VecDeque<ManifestRow> = manifest.rows.into();
        let mut join_set = tokio::task::JoinSet::new();

        loop {
            while join_set.len() < max_concurrent {
                let Some(row) = queue.pop_front() else {
                    break;
                };
                let ctx = Arc::clone(&ctx);
                join_set.spawn_blocking(move || process_row(&ctx, &row));
            }

            let Some(res) = join_set.join_next().await else {
                break;
            };
            let outcome = res.map_err(|e| anyhow::anyhow!("clip task join: {}", e))?;
            notify(&progress_tx, &outcome).await;
            outcomes.push(outcome);
        }
    }

    remove_tmp_dir(&opts.tmp_dir);
    write_report(&opts.report_path, &outcomes)?;

    let summary = BatchSummary {
        outcomes,
        skipped_from_log,
    };
    tracing::info!(
        total = summary.outcomes.len(),
        succeeded = summary.succeeded(),
        failed = summary.failed(),
        existed = summary.existed(),
        rate_limited = summary.rate_limited(),
        "batch finished; report at {}",
        opts.report_path.display()
    );
    Ok(summary)
}

async fn notify(tx: &Option<mpsc::Sender<FetchOutcome>>, outcome: &FetchOutcome) {
    if let Some(tx) = tx {
        // Receiver gone just means nobody is printing progress.
        let _ = tx.send(outcome.clone()).await;
    }
}
