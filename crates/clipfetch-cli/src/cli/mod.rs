//! CLI for clipfetch.

mod run;

use anyhow::Result;
use clap::Parser;
use clipfetch_core::batch::BatchOptions;
use clipfetch_core::config::{self, ClipfetchConfig};
use clipfetch_core::plan::TrimFormat;
use std::path::PathBuf;

/// Download and trim the clips listed in a dataset manifest.
#[derive(Debug, Parser)]
#[command(name = "clipfetch")]
#[command(about = "Download and trim labeled video clips listed in a dataset manifest", long_about = None)]
pub struct Cli {
    /// CSV manifest with columns `youtube_id,time_start,time_end,label[,is_cc]`
    /// or `video-id,start-time,end-time[,label-name]`.
    pub input_manifest: PathBuf,

    /// Output directory where clips will be saved (one subdirectory per label).
    pub output_dir: PathBuf,

    /// File name format for start/end times: `<id>_<fmt(start)>_<fmt(end)>.mp4` (default %06d).
    #[arg(short = 'f', long, value_name = "FMT")]
    pub trim_format: Option<String>,

    /// Number of clips processed in parallel; 1 runs sequentially (default 24).
    #[arg(short = 'n', long, value_name = "N")]
    pub num_jobs: Option<usize>,

    /// Scratch directory, removed when the run finishes (default /tmp/kinetics).
    #[arg(short = 't', long, value_name = "DIR")]
    pub tmp_dir: Option<PathBuf>,

    /// CSV file of clips already processed; they are skipped and new results appended.
    #[arg(short = 'c', long, value_name = "PATH")]
    pub csv_status_file: Option<PathBuf>,

    /// Newline-separated proxy list, rewritten when a proxy is evicted (default proxies.txt).
    #[arg(long, value_name = "PATH")]
    pub proxy_file: Option<PathBuf>,

    /// Where to write the JSON report (default download_report.json).
    #[arg(long, value_name = "PATH")]
    pub report: Option<PathBuf>,

    /// URL-resolution attempts per clip (default 5).
    #[arg(long, value_name = "N")]
    pub attempts: Option<u32>,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded config.
    pub fn apply_overrides(&self, cfg: &mut ClipfetchConfig) {
        if let Some(fmt) = &self.trim_format {
            cfg.trim_format = fmt.clone();
        }
        if let Some(n) = self.num_jobs {
            cfg.num_jobs = n;
        }
        if let Some(dir) = &self.tmp_dir {
            cfg.tmp_dir = dir.clone();
        }
        if let Some(path) = &self.proxy_file {
            cfg.proxy_file = path.clone();
        }
        if let Some(path) = &self.report {
            cfg.report_path = path.clone();
        }
        if let Some(attempts) = self.attempts {
            let mut retry = cfg.retry.clone().unwrap_or_default();
            retry.max_attempts = attempts;
            cfg.retry = Some(retry);
        }
    }

    pub fn batch_options(&self, cfg: &ClipfetchConfig) -> Result<BatchOptions> {
        Ok(BatchOptions {
            output_dir: self.output_dir.clone(),
            tmp_dir: cfg.tmp_dir.clone(),
            trim_format: TrimFormat::parse(&cfg.trim_format)?,
            num_jobs: cfg.num_jobs,
            status_log: self.csv_status_file.clone(),
            report_path: cfg.report_path.clone(),
        })
    }
}

pub async fn run_from_args() -> Result<()> {
    let cli = Cli::parse();
    let mut cfg = config::load_or_init()?;
    cli.apply_overrides(&mut cfg);
    tracing::debug!("effective config: {:?}", cfg);
    run::run_download(&cli, &cfg).await
}
