use std::collections::{BTreeSet, HashMap};

use crate::aggregate::{AggregateKey, AggregateRecord};
use crate::db::PointOfSaleId;
use crate::error::{DuplicateId, ImportError};
use crate::import::tabular::TabularRow;
use crate::store::SalesStore;

/// Refuses a transaction export in which any transaction ID occurs more than once.
/// Each repeated ID is reported once, with every line it appears on, in order of first appearance.
pub fn check_duplicate_transaction_ids(rows: &[TabularRow]) -> Result<(), ImportError> {
    let mut seen: Vec<DuplicateId> = Vec::new();
    let mut index_of: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        match index_of.get(row.id.as_str()) {
            Some(&index) => seen[index].lines.push(row.line),
            None => {
                index_of.insert(&row.id, seen.len());
                seen.push(DuplicateId {
                    id: row.id.clone(),
                    lines: vec![row.line],
                });
            }
        }
    }

    let duplicates: Vec<DuplicateId> = seen
        .into_iter()
        .filter(|entry| entry.lines.len() > 1)
        .collect();
    if duplicates.is_empty() {
        Ok(())
    } else {
        Err(ImportError::DuplicateInBatch { duplicates })
    }
}

/// Checks a batch against what's already in the store. Unknown points of sale are
/// reported before the more expensive lookup of already imported days runs.
pub async fn validate_batch(
    store: &impl SalesStore,
    records: &[AggregateRecord],
) -> Result<(), ImportError> {
    check_points_of_sale_exist(store, records).await?;
    check_not_already_persisted(store, records).await
}

async fn check_points_of_sale_exist(
    store: &impl SalesStore,
    records: &[AggregateRecord],
) -> Result<(), ImportError> {
    let referenced: BTreeSet<PointOfSaleId> = records
        .iter()
        .map(|record| record.key.point_of_sale_id)
        .collect();
    let existing = store
        .find_existing_points_of_sale(&referenced)
        .await
        .map_err(ImportError::persistence)?;
    let missing: Vec<PointOfSaleId> = referenced.difference(&existing).copied().collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::UnknownPointOfSale { ids: missing })
    }
}

async fn check_not_already_persisted(
    store: &impl SalesStore,
    records: &[AggregateRecord],
) -> Result<(), ImportError> {
    let keys: BTreeSet<AggregateKey> = records.iter().map(|record| record.key).collect();
    let existing = store
        .find_existing_aggregate_keys(&keys)
        .await
        .map_err(ImportError::persistence)?;
    if existing.is_empty() {
        Ok(())
    } else {
        Err(ImportError::AlreadyPersisted {
            keys: existing.into_iter().collect(),
        })
    }
}
