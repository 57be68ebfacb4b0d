use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::retry::RetryPolicy;

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of URL-resolution attempts per clip (including the first).
    pub max_attempts: u32,
    /// Base delay in seconds for exponential backoff (0 = retry immediately).
    pub base_delay_secs: f64,
    /// Maximum backoff delay in seconds.
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_secs: 0.0,
            max_delay_secs: 30,
        }
    }
}

impl RetryConfig {
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            base_delay: Duration::from_secs_f64(self.base_delay_secs.max(0.0)),
            max_delay: Duration::from_secs(self.max_delay_secs),
        }
    }
}

/// External tool that turns a video page into a direct media URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    pub program: String,
    /// Format selector passed with `-f` (18 = 640x360 h264).
    pub format: String,
    /// Prefix joined with the video identifier to form the page URL.
    pub url_base: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            program: "youtube-dl".to_string(),
            format: "18".to_string(),
            url_base: "https://www.youtube.com/watch?v=".to_string(),
        }
    }
}

/// External tool that cuts and re-encodes the requested time range.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub program: String,
    pub video_codec: String,
    pub preset: String,
    pub audio_codec: String,
    pub threads: u32,
    pub loglevel: String,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            program: "ffmpeg".to_string(),
            video_codec: "libx264".to_string(),
            preset: "ultrafast".to_string(),
            audio_codec: "aac".to_string(),
            threads: 1,
            loglevel: "panic".to_string(),
        }
    }
}

/// Remote relay shut down when its proxy gets evicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelayConfig {
    pub ssh_program: String,
    /// systemd unit stopped and disabled on the proxy host.
    pub service: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ssh_program: "ssh".to_string(),
            service: "squid".to_string(),
        }
    }
}

/// Global configuration loaded from `~/.config/clipfetch/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipfetchConfig {
    /// Newline-separated proxy URIs; rewritten in place when proxies are evicted.
    pub proxy_file: PathBuf,
    /// Where the JSON report of the run is written.
    pub report_path: PathBuf,
    /// Scratch directory removed at the end of every run.
    pub tmp_dir: PathBuf,
    /// Default worker count (1 = sequential).
    pub num_jobs: usize,
    /// printf-style integer format for start/end times in file names.
    pub trim_format: String,
    #[serde(default)]
    pub resolver: ResolverConfig,
    #[serde(default)]
    pub encoder: EncoderConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
}

impl Default for ClipfetchConfig {
    fn default() -> Self {
        Self {
            proxy_file: PathBuf::from("proxies.txt"),
            report_path: PathBuf::from("download_report.json"),
            tmp_dir: PathBuf::from("/tmp/kinetics"),
            num_jobs: 24,
            trim_format: "%06d".to_string(),
            resolver: ResolverConfig::default(),
            encoder: EncoderConfig::default(),
            relay: RelayConfig::default(),
            retry: None,
        }
    }
}

impl ClipfetchConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry.clone().unwrap_or_default().to_policy()
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("clipfetch")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ClipfetchConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ClipfetchConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)?;
    let cfg: ClipfetchConfig = toml::from_str(&data)?;
    Ok(cfg)
}
