use std::cmp;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDateTime};
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{StatusLog, Watermark};
use crate::monitoring::types::{Observation, TIMESTAMP_FORMAT};

/// Field names of the very first record in the store.
pub const HEADER: &str = "Timestamp,Device Name,Address,Status";

/// Flat-file status log: a header record followed by one CSV record per
/// observation, only ever appended to.
///
/// Appends are serialized by a mutex over the write handle; the watermark
/// advances inside that critical section so no reader can observe a new
/// record without its watermark update.
pub struct CsvStatusLog {
    path: PathBuf,
    writer: Mutex<File>,
    watermark: AtomicI64,
}

impl CsvStatusLog {
    /// Open the log file, creating it with a header record if it does not
    /// exist, and recover the watermark from the last valid record.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .with_context(|| format!("failed to open status log at {}", path.display()))?;

        if file.metadata().await?.len() == 0 {
            file.write_all(format!("{HEADER}\n").as_bytes()).await?;
            file.flush().await?;
        }

        let recovered =
            read_records(&path).await?.last().map_or(0, Observation::timestamp_millis);

        Ok(Self { path, writer: Mutex::new(file), watermark: AtomicI64::new(recovered) })
    }

    /// Strictly advance the watermark. Bumping past the previous value
    /// keeps back-to-back appends within the same millisecond distinct.
    fn advance_watermark(&self) {
        let now = Local::now().timestamp_millis();
        let previous = self.watermark.load(Ordering::Acquire);
        self.watermark.store(cmp::max(now, previous + 1), Ordering::Release);
    }
}

#[async_trait]
impl StatusLog for CsvStatusLog {
    async fn append(&self, observation: &Observation) -> Result<()> {
        let record = format_record(observation);

        let mut file = self.writer.lock().await;
        file.write_all(record.as_bytes()).await.context("failed to append to status log")?;
        file.flush().await?;
        file.sync_data().await.context("failed to sync status log")?;
        self.advance_watermark();

        Ok(())
    }

    async fn read_all(&self) -> Result<Vec<Observation>> {
        read_records(&self.path).await
    }

    fn current_watermark(&self) -> Watermark {
        Watermark::from_millis(self.watermark.load(Ordering::Acquire))
    }
}

fn format_record(observation: &Observation) -> String {
    format!(
        "{},{},{},{}\n",
        observation.timestamp.format(TIMESTAMP_FORMAT),
        observation.device_name,
        observation.address,
        observation.status,
    )
}

fn parse_record(line: &str) -> Option<Observation> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 4 {
        return None;
    }

    let timestamp = NaiveDateTime::parse_from_str(fields[0], TIMESTAMP_FORMAT).ok()?;
    let status = fields[3].parse().ok()?;

    Some(Observation {
        timestamp,
        device_name: fields[1].to_string(),
        address: fields[2].to_string(),
        status,
    })
}

/// Read every valid record from the file. A missing file is an empty log;
/// malformed records (a torn write from a crash) are skipped.
async fn read_records(path: &Path) -> Result<Vec<Observation>> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(error) if error.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(error) => {
            return Err(error)
                .with_context(|| format!("failed to read status log at {}", path.display()));
        }
    };

    let mut observations = Vec::new();
    for line in raw.lines() {
        if line.is_empty() || line == HEADER {
            continue;
        }
        match parse_record(line) {
            Some(observation) => observations.push(observation),
            None => tracing::warn!("skipping malformed status log record: {line:?}"),
        }
    }

    Ok(observations)
}
