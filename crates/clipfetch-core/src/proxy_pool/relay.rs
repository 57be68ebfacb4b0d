//! Best-effort shutdown of the relay service behind an evicted proxy.

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::config::RelayConfig;
use crate::process::{run_checked, CommandSpec, ProcessRunner};

use super::persist::relay_host;

/// Side effect run after a proxy has been removed from the pool.
pub trait RelayDisabler: Send + Sync {
    fn disable(&self, proxy: &str) -> Result<()>;
}

/// Stops and disables the relay's systemd unit over ssh.
pub struct SshRelayDisabler {
    runner: Arc<dyn ProcessRunner>,
    ssh_program: String,
    service: String,
}

impl SshRelayDisabler {
    pub fn new(runner: Arc<dyn ProcessRunner>, cfg: &RelayConfig) -> Self {
        Self {
            runner,
            ssh_program: cfg.ssh_program.clone(),
            service: cfg.service.clone(),
        }
    }

    fn systemctl(&self, host: &str, action: &str) -> CommandSpec {
        CommandSpec::new(&self.ssh_program).args([
            "-o",
            "StrictHostKeyChecking=no",
            host,
            "sudo",
            "systemctl",
            action,
            self.service.as_str(),
        ])
    }
}

impl RelayDisabler for SshRelayDisabler {
    fn disable(&self, proxy: &str) -> Result<()> {
        let Some(host) = relay_host(proxy) else {
            bail!("proxy {} has no host", proxy);
        };
        // Disable even if stop failed: the unit may already be down.
        let stop = run_checked(self.runner.as_ref(), &self.systemctl(&host, "stop"));
        let disable = run_checked(self.runner.as_ref(), &self.systemctl(&host, "disable"));
        if let Err(e) = stop {
            bail!("stop {} on {}: {}", self.service, host, e);
        }
        if let Err(e) = disable {
            bail!("disable {} on {}: {}", self.service, host, e);
        }
        tracing::info!(%host, service = %self.service, "relay disabled");
        Ok(())
    }
}

/// Relay disabler that does nothing (proxies without a managed relay).
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRelay;

impl RelayDisabler for NoopRelay {
    fn disable(&self, _proxy: &str) -> Result<()> {
        Ok(())
    }
}
