use std::sync::Arc;

use super::{StatusLog, Watermark};

/// Answers "has anything changed since checkpoint T?" with a single
/// watermark comparison.
///
/// Deliberately coarse: it reports that the log changed, never what
/// changed, so a positive answer always means "re-read the log". Clients
/// loop through `WAITING(checkpoint)` -> notified -> re-read -> wait on
/// the new checkpoint; retry and backoff are theirs to handle.
#[derive(Clone)]
pub struct ChangeOracle {
    log: Arc<dyn StatusLog>,
}

impl ChangeOracle {
    pub fn new(log: Arc<dyn StatusLog>) -> Self {
        Self { log }
    }

    /// True once any append completed after `checkpoint` was taken.
    pub fn has_changed(&self, checkpoint: Watermark) -> bool {
        self.log.current_watermark() > checkpoint
    }

    /// The log's current watermark, to be used as the next checkpoint.
    pub fn watermark(&self) -> Watermark {
        self.log.current_watermark()
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::monitoring::types::{DeviceStatus, Observation};
    use crate::storage::CsvStatusLog;

    #[tokio::test]
    async fn fresh_checkpoint_reports_no_change_until_an_append() {
        let dir = tempdir().unwrap();
        let log = Arc::new(CsvStatusLog::open(dir.path().join("log.csv")).await.unwrap());
        let oracle = ChangeOracle::new(log.clone());

        // Empty log: nothing has changed relative to "never saw anything".
        assert!(!oracle.has_changed(Watermark::NONE));

        log.append(&Observation::now("Router", "10.0.0.1", DeviceStatus::Up)).await.unwrap();
        assert!(oracle.has_changed(Watermark::NONE));

        let checkpoint = oracle.watermark();
        assert!(!oracle.has_changed(checkpoint));

        log.append(&Observation::now("Router", "10.0.0.1", DeviceStatus::Down)).await.unwrap();
        assert!(oracle.has_changed(checkpoint));
    }
}
