use crate::aggregate::AggregateRecord;
use crate::commit::{commit_batch, CommitConfig};
use crate::error::ImportError;
use crate::import::{prepare_batch, InputFormat};
use crate::store::SalesStore;
use crate::validate::validate_batch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSummary {
    pub inserted: usize,
    pub records: Vec<AggregateRecord>,
}

/// Runs a whole input file through parsing, aggregation, validation and commit.
/// On any error nothing has been written to the store.
pub async fn import_batch(
    store: &impl SalesStore,
    format: InputFormat,
    content: &str,
    config: &CommitConfig,
) -> Result<ImportSummary, ImportError> {
    let result = run(store, format, content, config).await;
    if let Err(err) = &result {
        log::warn!("Batch refused: {err}");
    }
    result
}

async fn run(
    store: &impl SalesStore,
    format: InputFormat,
    content: &str,
    config: &CommitConfig,
) -> Result<ImportSummary, ImportError> {
    let batch = prepare_batch(format, content)?;
    validate_batch(store, &batch.records).await?;
    let inserted = commit_batch(store, &batch.records, config).await?;
    Ok(ImportSummary {
        inserted,
        records: batch.records,
    })
}
