use std::path::Path;
use std::sync::Arc;

use crate::config::{ClipfetchConfig, EncoderConfig, ResolverConfig};
use crate::plan::{WorkItem, IDENTIFIER_LEN};
use crate::process::{run_checked, CommandSpec, ProcessFailure, ProcessRunner};
use crate::proxy_pool::{PoolError, ProxyPool};
use crate::retry::{run_with_retry, Classified, ErrorKind, RetryPolicy};

use super::error::{FetchError, Stage};
use super::event::{EventSink, FetchEvent};

/// Message recorded when the encode step ran to completion.
pub const DOWNLOADED: &str = "Downloaded";

/// Proxy environment variables set for the encoder (both spellings are honoured by different builds).
const PROXY_ENV: &[&str] = &["http_proxy", "https_proxy", "HTTP_proxy", "HTTPS_proxy"];

#[derive(Debug, Clone, Default)]
pub struct FetchSettings {
    pub resolver: ResolverConfig,
    pub encoder: EncoderConfig,
    pub retry: RetryPolicy,
}

impl FetchSettings {
    pub fn from_config(cfg: &ClipfetchConfig) -> Self {
        Self {
            resolver: cfg.resolver.clone(),
            encoder: cfg.encoder.clone(),
            retry: cfg.retry_policy(),
        }
    }
}

/// Result of a fetch that got through both external steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchReport {
    /// Whether the output file exists after encoding.
    pub succeeded: bool,
    pub message: String,
    /// Proxy the clip was fetched through.
    pub proxy: String,
}

/// Failure of one resolution attempt.
enum ResolveError {
    NoProxy(PoolError),
    Tool(ProcessFailure),
}

impl Classified for ResolveError {
    fn kind(&self) -> ErrorKind {
        match self {
            ResolveError::NoProxy(_) => ErrorKind::Permanent,
            ResolveError::Tool(f) => f.kind,
        }
    }
}

pub struct ClipFetcher {
    pool: Arc<ProxyPool>,
    runner: Arc<dyn ProcessRunner>,
    settings: FetchSettings,
    events: Option<EventSink>,
}

impl ClipFetcher {
    pub fn new(pool: Arc<ProxyPool>, runner: Arc<dyn ProcessRunner>, settings: FetchSettings) -> Self {
        Self {
            pool,
            runner,
            settings,
            events: None,
        }
    }

    /// Also report every proxy pick, failed attempt and finished encode to `tx`.
    pub fn with_events(mut self, tx: EventSink) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn pool(&self) -> &ProxyPool {
        &self.pool
    }

    pub fn fetch_item(&self, item: &WorkItem) -> Result<FetchReport, FetchError> {
        self.fetch(&item.identifier, item.start_time, item.end_time, &item.output_path)
    }

    /// Download `[start_time, end_time)` of `identifier` into `output_path`.
    ///
    /// `Ok` means both tools exited cleanly; `succeeded` is then decided by
    /// whether the encoder actually left a file at `output_path`.
    pub fn fetch(
        &self,
        identifier: &str,
        start_time: f64,
        end_time: f64,
        output_path: &Path,
    ) -> Result<FetchReport, FetchError> {
        if identifier.chars().count() != IDENTIFIER_LEN {
            return Err(FetchError::InvalidIdentifier(identifier.to_string()));
        }

        let (url, proxy) = self.resolve(identifier)?;

        let cmd = self.encode_command(&url, &proxy, start_time, end_time - start_time, output_path);
        if let Err(failure) = run_checked(self.runner.as_ref(), &cmd) {
            tracing::warn!(%identifier, %proxy, "encode failed: {}", failure);
            self.emit(FetchEvent::AttemptFailed {
                identifier: identifier.to_string(),
                stage: Stage::Encode,
                attempt: 1,
                proxy: proxy.clone(),
                diagnostic: failure.diagnostic.clone(),
            });
            if failure.kind == ErrorKind::Throttled {
                self.evict(&proxy);
                return Err(FetchError::RateLimited {
                    stage: Stage::Encode,
                    diagnostic: failure.diagnostic,
                });
            }
            return Err(FetchError::EncodeFailed(failure.diagnostic));
        }

        self.emit(FetchEvent::Downloaded {
            identifier: identifier.to_string(),
            proxy: proxy.clone(),
        });
        let succeeded = output_path.exists();
        if succeeded {
            tracing::info!(%identifier, %proxy, "downloaded {}", output_path.display());
        } else {
            tracing::warn!(%identifier, %proxy, "encoder exited cleanly but wrote no {}", output_path.display());
        }
        Ok(FetchReport {
            succeeded,
            message: DOWNLOADED.to_string(),
            proxy,
        })
    }

    /// Resolve the direct media URL, retrying with a freshly picked proxy each attempt.
    ///
    /// When the pool runs dry because this clip's own 429s evicted the last
    /// proxies, the clip is reported as rate-limited rather than as a pool failure.
    fn resolve(&self, identifier: &str) -> Result<(String, String), FetchError> {
        let mut last_throttle: Option<String> = None;
        let res = run_with_retry(&self.settings.retry, |attempt| -> Result<(String, String), ResolveError> {
            let proxy = self.pool.pick().map_err(ResolveError::NoProxy)?;
            self.emit(FetchEvent::UsingProxy {
                identifier: identifier.to_string(),
                proxy: proxy.clone(),
            });
            let cmd = self.resolve_command(identifier, &proxy);
            tracing::debug!(%identifier, attempt, "running {}", cmd);

            let failure = match run_checked(self.runner.as_ref(), &cmd) {
                Ok(out) => match direct_url(&out.stdout) {
                    Some(url) => return Ok((url, proxy)),
                    None => ProcessFailure {
                        kind: ErrorKind::Failed,
                        diagnostic: format!("{} printed no media URL", cmd.program),
                    },
                },
                Err(failure) => failure,
            };

            tracing::warn!(%identifier, %proxy, attempt, "resolve failed: {}", failure);
            self.emit(FetchEvent::AttemptFailed {
                identifier: identifier.to_string(),
                stage: Stage::Resolve,
                attempt,
                proxy: proxy.clone(),
                diagnostic: failure.diagnostic.clone(),
            });
            if failure.kind == ErrorKind::Throttled {
                self.evict(&proxy);
                last_throttle = Some(failure.diagnostic.clone());
            } else {
                last_throttle = None;
            }
            Err(ResolveError::Tool(failure))
        });

        res.map_err(|e| match e {
            ResolveError::NoProxy(e) => match last_throttle {
                Some(diagnostic) => FetchError::RateLimited {
                    stage: Stage::Resolve,
                    diagnostic,
                },
                None => FetchError::Pool(e),
            },
            ResolveError::Tool(f) if f.kind == ErrorKind::Throttled => FetchError::RateLimited {
                stage: Stage::Resolve,
                diagnostic: f.diagnostic,
            },
            ResolveError::Tool(f) => FetchError::ResolutionFailed(f.diagnostic),
        })
    }

    fn emit(&self, event: FetchEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    fn evict(&self, proxy: &str) {
        if let Err(e) = self.pool.remove(proxy) {
            tracing::warn!(%proxy, "could not evict proxy: {}", e);
        }
    }

    fn resolve_command(&self, identifier: &str, proxy: &str) -> CommandSpec {
        let r = &self.settings.resolver;
        CommandSpec::new(&r.program)
            .args(["-f", r.format.as_str(), "--proxy", proxy, "--get-url"])
            .arg(format!("{}{}", r.url_base, identifier))
    }

    fn encode_command(
        &self,
        url: &str,
        proxy: &str,
        start_time: f64,
        duration: f64,
        output_path: &Path,
    ) -> CommandSpec {
        let e = &self.settings.encoder;
        let mut cmd = CommandSpec::new(&e.program)
            .args(["-ss".to_string(), start_time.to_string()])
            .args(["-t".to_string(), duration.to_string()])
            .args(["-i", url])
            .args(["-c:v", e.video_codec.as_str(), "-preset", e.preset.as_str()])
            .args(["-c:a", e.audio_codec.as_str()])
            .args(["-threads".to_string(), e.threads.to_string()])
            .args(["-loglevel", e.loglevel.as_str()])
            .arg(output_path.to_string_lossy());
        for key in PROXY_ENV {
            cmd = cmd.env(*key, proxy);
        }
        cmd
    }
}

/// The resolver prints one URL per requested format; take the last non-empty line.
fn direct_url(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .last()
        .map(String::from)
}
