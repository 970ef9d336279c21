use std::time::Duration;

use crate::aggregate::AggregateRecord;
use crate::error::ImportError;
use crate::store::SalesStore;

/// Bounds for how long a commit may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommitConfig {
    /// How long to wait for other writers before the commit starts
    pub max_wait: Duration,
    /// How long the commit itself may take
    pub timeout: Duration,
}

impl Default for CommitConfig {
    fn default() -> Self {
        Self {
            max_wait: Duration::from_secs(30),
            timeout: Duration::from_secs(60),
        }
    }
}

/// Stores a validated batch. Either every record is stored or none is.
/// Returns the number of stored records.
pub async fn commit_batch(
    store: &impl SalesStore,
    records: &[AggregateRecord],
    config: &CommitConfig,
) -> Result<usize, ImportError> {
    log::info!("Committing {} daily summaries...", records.len());
    store
        .persist_batch_atomically(records, config)
        .await
        .map_err(ImportError::persistence)?;
    log::info!("Committing {} daily summaries...done", records.len());
    Ok(records.len())
}
