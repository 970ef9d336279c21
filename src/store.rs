use anyhow::{anyhow, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};

use crate::aggregate::{AggregateKey, AggregateRecord};
use crate::commit::CommitConfig;
use crate::db::{DatabaseV1, PointOfSale, PointOfSaleId};

/// What the import pipeline needs from persistent storage.
#[allow(async_fn_in_trait)]
pub trait SalesStore {
    /// Returns the subset of `ids` that are registered.
    async fn find_existing_points_of_sale(
        &self,
        ids: &BTreeSet<PointOfSaleId>,
    ) -> Result<BTreeSet<PointOfSaleId>>;

    /// Returns the subset of `keys` that already have committed daily sales.
    async fn find_existing_aggregate_keys(
        &self,
        keys: &BTreeSet<AggregateKey>,
    ) -> Result<BTreeSet<AggregateKey>>;

    /// Stores all records or none of them. Gives up if the write can't start within
    /// `limits.max_wait` or doesn't finish within `limits.timeout`.
    async fn persist_batch_atomically(
        &self,
        records: &[AggregateRecord],
        limits: &CommitConfig,
    ) -> Result<()>;
}

pub(crate) async fn lock_with_timeout<T>(
    mutex: &Mutex<T>,
    max_wait: Duration,
) -> Result<MutexGuard<'_, T>> {
    tokio::time::timeout(max_wait, mutex.lock())
        .await
        .map_err(|_| anyhow!("Timed out after {max_wait:?} waiting to start the write"))
}

/// Keeps the database in memory. Writes go to a copy that is swapped in only on success.
pub struct InMemoryStore {
    db: Mutex<DatabaseV1>,
}

impl InMemoryStore {
    pub fn new(db: DatabaseV1) -> Self {
        Self { db: Mutex::new(db) }
    }

    pub fn with_points_of_sale(ids: impl IntoIterator<Item = PointOfSaleId>) -> Self {
        let mut db = DatabaseV1::new();
        for id in ids {
            db.points_of_sale
                .insert(id, PointOfSale::new(format!("Point of sale {id}")));
        }
        Self::new(db)
    }

    pub async fn snapshot(&self) -> DatabaseV1 {
        self.db.lock().await.clone()
    }
}

impl SalesStore for InMemoryStore {
    async fn find_existing_points_of_sale(
        &self,
        ids: &BTreeSet<PointOfSaleId>,
    ) -> Result<BTreeSet<PointOfSaleId>> {
        Ok(self.db.lock().await.existing_points_of_sale(ids))
    }

    async fn find_existing_aggregate_keys(
        &self,
        keys: &BTreeSet<AggregateKey>,
    ) -> Result<BTreeSet<AggregateKey>> {
        Ok(self.db.lock().await.existing_keys(keys))
    }

    async fn persist_batch_atomically(
        &self,
        records: &[AggregateRecord],
        limits: &CommitConfig,
    ) -> Result<()> {
        let mut db = lock_with_timeout(&self.db, limits.max_wait).await?;
        let mut staged = db.clone();
        staged.insert_batch(records, Utc::now())?;
        *db = staged;
        Ok(())
    }
}
