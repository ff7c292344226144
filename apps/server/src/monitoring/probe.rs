use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::net::TcpStream;
use tokio::process::Command;
use tokio::time::timeout;

/// Which probe mechanism to use for every device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeKind {
    Ping,
    Tcp,
}

/// A single reachability check against a network address.
///
/// Implementations resolve within their configured timeout. Any failure,
/// timeout included, is an error here; the monitor records it as DOWN, so
/// a failed probe and an unreachable device are indistinguishable
/// downstream.
#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, address: &str) -> Result<()>;
}

pub fn build_prober(kind: ProbeKind, timeout: Duration) -> Arc<dyn Prober> {
    match kind {
        ProbeKind::Ping => Arc::new(PingProber::new(timeout)),
        ProbeKind::Tcp => Arc::new(TcpProber::new(timeout)),
    }
}

/// ICMP reachability via the system `ping` utility, one echo request per
/// probe. Shelling out avoids the raw-socket privileges an in-process
/// pinger would need.
pub struct PingProber {
    timeout: Duration,
}

impl PingProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Prober for PingProber {
    async fn probe(&self, address: &str) -> Result<()> {
        let count_flag = if cfg!(windows) { "-n" } else { "-c" };

        let child = Command::new("ping")
            .arg(count_flag)
            .arg("1")
            .arg(address)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .context("failed to spawn ping")?;

        let output = timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| anyhow!("ping timed out after {:?}", self.timeout))?
            .context("failed to wait for ping")?;

        if output.status.success() {
            Ok(())
        } else {
            Err(anyhow!("ping exited with {}", output.status))
        }
    }
}

/// TCP connect reachability check for `host:port` targets.
pub struct TcpProber {
    timeout: Duration,
}

impl TcpProber {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl Prober for TcpProber {
    async fn probe(&self, address: &str) -> Result<()> {
        let connect = TcpStream::connect(address);

        timeout(self.timeout, connect)
            .await
            .map_err(|_| anyhow!("TCP connection timed out after {:?}", self.timeout))?
            .map_err(|e| anyhow!("TCP connection failed: {e}"))?;

        Ok(())
    }
}
