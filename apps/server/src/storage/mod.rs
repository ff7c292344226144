/// Storage layer for the append-only status log.
///
/// The `StatusLog` trait keeps the backend swappable: the flat-file CSV
/// implementation lives in `csv_log`, and monitor logic only ever sees
/// the trait.
pub mod csv_log;
pub mod oracle;
pub mod watermark;

pub use csv_log::CsvStatusLog;
pub use oracle::ChangeOracle;
pub use watermark::Watermark;

use anyhow::Result;
use async_trait::async_trait;

use crate::monitoring::types::Observation;

/// Durable, append-only record of observations.
#[async_trait]
pub trait StatusLog: Send + Sync {
    /// Durably persist one observation, then advance the watermark.
    ///
    /// Safe to call concurrently from every device monitor; appends are
    /// serialized so records never interleave and none are lost.
    async fn append(&self, observation: &Observation) -> Result<()>;

    /// Every observation ever appended, in append order.
    ///
    /// A torn trailing record from a crash mid-write is skipped, never an
    /// error.
    async fn read_all(&self) -> Result<Vec<Observation>>;

    /// Watermark of the most recent append, in O(1).
    ///
    /// Returns `Watermark::NONE` if the log has never been written.
    fn current_watermark(&self) -> Watermark;
}
