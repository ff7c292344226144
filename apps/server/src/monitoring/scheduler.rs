use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::interval;

use super::probe::Prober;
use super::types::{DeviceStatus, Observation};
use crate::storage::StatusLog;

/// One monitored endpoint, fixed at startup.
#[derive(Debug, Clone)]
pub struct Device {
    pub name: String,
    pub address: String,
    pub interval: Duration,
}

/// Spawns and coordinates the independent per-device check loops.
///
/// Each device gets its own task that forever alternates probe -> record
/// -> wait. The loops share nothing with each other, only the status log,
/// and stop together when the shutdown signal fires.
pub struct MonitorScheduler {
    prober: Arc<dyn Prober>,
    log: Arc<dyn StatusLog>,
    shutdown: watch::Receiver<bool>,
}

impl MonitorScheduler {
    pub fn new(
        prober: Arc<dyn Prober>,
        log: Arc<dyn StatusLog>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self { prober, log, shutdown }
    }

    /// Schedule one device for periodic checking.
    ///
    /// A failed probe is recorded as DOWN and a failed append is logged
    /// and skipped; neither ends the loop. A probe that overruns its
    /// timeout still yields a DOWN record on this tick and the timer
    /// catches up on the next one.
    pub fn schedule_device(&self, device: Device) -> tokio::task::JoinHandle<()> {
        let prober = self.prober.clone();
        let log = self.log.clone();
        let mut shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            tracing::info!(
                "monitoring {} ({}) every {:?}",
                device.name,
                device.address,
                device.interval
            );

            let mut timer = interval(device.interval);

            loop {
                tokio::select! {
                    _ = timer.tick() => {
                        check_once(prober.as_ref(), log.as_ref(), &device).await;
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("stopping monitor for {}", device.name);
                        break;
                    }
                }
            }
        })
    }

    /// Schedule every configured device.
    pub fn schedule_devices(&self, devices: Vec<Device>) -> Vec<tokio::task::JoinHandle<()>> {
        devices.into_iter().map(|device| self.schedule_device(device)).collect()
    }
}

/// A single probe -> record iteration.
async fn check_once(prober: &dyn Prober, log: &dyn StatusLog, device: &Device) {
    let status = match prober.probe(&device.address).await {
        Ok(()) => DeviceStatus::Up,
        Err(error) => {
            tracing::debug!("probe of {} ({}) failed: {error:#}", device.name, device.address);
            DeviceStatus::Down
        }
    };

    tracing::info!("{} ({}) is {}", device.name, device.address, status);

    let observation = Observation::now(&device.name, &device.address, status);
    if let Err(error) = log.append(&observation).await {
        // Bounded data loss: this tick is dropped, the loop continues.
        tracing::error!("failed to record observation for {}: {error:#}", device.name);
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use anyhow::{Result, anyhow};
    use async_trait::async_trait;
    use tempfile::tempdir;
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::storage::{CsvStatusLog, Watermark};

    struct StaticProber {
        reachable: bool,
    }

    #[async_trait]
    impl Prober for StaticProber {
        async fn probe(&self, _address: &str) -> Result<()> {
            if self.reachable { Ok(()) } else { Err(anyhow!("unreachable")) }
        }
    }

    /// Prober whose work always overruns its own timeout.
    struct SlowProber {
        delay: Duration,
        timeout: Duration,
    }

    #[async_trait]
    impl Prober for SlowProber {
        async fn probe(&self, _address: &str) -> Result<()> {
            tokio::time::timeout(self.timeout, sleep(self.delay))
                .await
                .map_err(|_| anyhow!("probe timed out"))
        }
    }

    struct FailingLog {
        attempts: AtomicUsize,
    }

    #[async_trait]
    impl StatusLog for FailingLog {
        async fn append(&self, _observation: &Observation) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(anyhow!("storage unavailable"))
        }

        async fn read_all(&self) -> Result<Vec<Observation>> {
            Ok(Vec::new())
        }

        fn current_watermark(&self) -> Watermark {
            Watermark::NONE
        }
    }

    fn device(name: &str, interval: Duration) -> Device {
        Device { name: name.to_string(), address: "10.0.0.1".to_string(), interval }
    }

    #[tokio::test]
    async fn reachable_and_unreachable_devices_record_their_own_status() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn StatusLog> =
            Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let up = MonitorScheduler::new(
            Arc::new(StaticProber { reachable: true }),
            log.clone(),
            shutdown_rx.clone(),
        );
        let down = MonitorScheduler::new(
            Arc::new(StaticProber { reachable: false }),
            log.clone(),
            shutdown_rx,
        );

        let interval = Duration::from_millis(50);
        let handles = vec![
            up.schedule_device(device("alpha", interval)),
            down.schedule_device(device("beta", interval)),
        ];

        sleep(Duration::from_millis(180)).await;
        shutdown_tx.send(true).unwrap();
        for handle in handles {
            timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        }

        let stored = log.read_all().await.unwrap();
        let alpha: Vec<_> = stored.iter().filter(|o| o.device_name == "alpha").collect();
        let beta: Vec<_> = stored.iter().filter(|o| o.device_name == "beta").collect();

        assert!(alpha.len() >= 3);
        assert!(beta.len() >= 3);
        assert!(alpha.iter().all(|o| o.status == DeviceStatus::Up));
        assert!(beta.iter().all(|o| o.status == DeviceStatus::Down));
        assert!(!log.current_watermark().is_none());

        for records in [alpha, beta] {
            assert!(records.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
        }
    }

    #[tokio::test]
    async fn probe_overrun_records_down_and_stays_on_schedule() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn StatusLog> =
            Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        // Every probe overruns its 20ms timeout; the 60ms tick cadence
        // must keep delivering one DOWN record per tick regardless.
        let prober = Arc::new(SlowProber {
            delay: Duration::from_secs(5),
            timeout: Duration::from_millis(20),
        });
        let scheduler = MonitorScheduler::new(prober, log.clone(), shutdown_rx);
        let handle = scheduler.schedule_device(device("alpha", Duration::from_millis(60)));

        sleep(Duration::from_millis(250)).await;
        assert!(!handle.is_finished());
        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();

        let stored = log.read_all().await.unwrap();
        // Ticks at 0/60/120/180ms at least; the overrun never stalls the
        // loop past a single probe timeout.
        assert!(stored.len() >= 3);
        assert!(stored.iter().all(|o| o.status == DeviceStatus::Down));
        assert!(stored.windows(2).all(|pair| pair[0].timestamp <= pair[1].timestamp));
    }

    #[tokio::test]
    async fn append_failures_do_not_stop_the_loop() {
        let log = Arc::new(FailingLog { attempts: AtomicUsize::new(0) });
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler = MonitorScheduler::new(
            Arc::new(StaticProber { reachable: true }),
            log.clone(),
            shutdown_rx,
        );
        let handle = scheduler.schedule_device(device("alpha", Duration::from_millis(20)));

        sleep(Duration::from_millis(100)).await;
        assert!(!handle.is_finished());
        assert!(log.attempts.load(Ordering::SeqCst) >= 2);

        shutdown_tx.send(true).unwrap();
        timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn shutdown_signal_stops_every_monitor() {
        let dir = tempdir().unwrap();
        let log: Arc<dyn StatusLog> =
            Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let scheduler =
            MonitorScheduler::new(Arc::new(StaticProber { reachable: true }), log, shutdown_rx);
        let handles = scheduler.schedule_devices(vec![
            device("alpha", Duration::from_millis(50)),
            device("beta", Duration::from_millis(50)),
        ]);

        sleep(Duration::from_millis(60)).await;
        shutdown_tx.send(true).unwrap();

        for handle in handles {
            timeout(Duration::from_secs(1), handle).await.unwrap().unwrap();
        }
    }
}
