use anyhow::{anyhow, bail, Result};
use chrono::Utc;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

use super::crypto::XChaCha20Poly1305Cipher;
use super::database::DatabaseV1;
use super::file;
use super::point_of_sale::PointOfSaleId;
use crate::aggregate::{AggregateKey, AggregateRecord};
use crate::commit::CommitConfig;
use crate::store::{lock_with_timeout, SalesStore};

/// Sales database kept in an encrypted file. Writes within this process are serialized,
/// and each write becomes visible through a single rename.
pub struct FileStore {
    path: PathBuf,
    cipher: XChaCha20Poly1305Cipher,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: PathBuf, cipher: XChaCha20Poly1305Cipher) -> Self {
        Self {
            path,
            cipher,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Creates an empty database file. Fails if one already exists.
    pub async fn create(&self) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        if tokio::fs::try_exists(&self.path).await? {
            bail!("Database file {} already exists", self.path.display());
        }
        file::save(&DatabaseV1::new(), &self.path, &self.cipher).await
    }

    pub async fn load(&self) -> Result<DatabaseV1> {
        file::load(&self.path, &self.cipher).await?.ok_or_else(|| {
            anyhow!(
                "Database file {} doesn't exist. Run the init command first.",
                self.path.display()
            )
        })
    }

    /// Loads the database, applies `update` and saves the result. Nothing is saved if `update` fails.
    pub async fn update<R>(&self, update: impl FnOnce(&mut DatabaseV1) -> Result<R>) -> Result<R> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await?;
        let result = update(&mut db)?;
        file::save(&db, &self.path, &self.cipher).await?;
        Ok(result)
    }

    async fn stage_batch(&self, records: &[AggregateRecord]) -> Result<PathBuf> {
        let mut db = self.load().await?;
        db.insert_batch(records, Utc::now())?;
        file::stage(&db, &self.path, &self.cipher).await
    }
}

impl SalesStore for FileStore {
    async fn find_existing_points_of_sale(
        &self,
        ids: &BTreeSet<PointOfSaleId>,
    ) -> Result<BTreeSet<PointOfSaleId>> {
        Ok(self.load().await?.existing_points_of_sale(ids))
    }

    async fn find_existing_aggregate_keys(
        &self,
        keys: &BTreeSet<AggregateKey>,
    ) -> Result<BTreeSet<AggregateKey>> {
        Ok(self.load().await?.existing_keys(keys))
    }

    async fn persist_batch_atomically(
        &self,
        records: &[AggregateRecord],
        limits: &CommitConfig,
    ) -> Result<()> {
        let _guard = lock_with_timeout(&self.write_lock, limits.max_wait).await?;

        // Only staging may be abandoned. Once the rename starts it runs to completion.
        let tmppath = match tokio::time::timeout(limits.timeout, self.stage_batch(records)).await {
            Ok(Ok(tmppath)) => tmppath,
            Ok(Err(err)) => {
                file::discard(&self.path).await;
                return Err(err);
            }
            Err(_) => {
                file::discard(&self.path).await;
                bail!("Timed out after {:?} while writing the batch", limits.timeout);
            }
        };
        file::publish(&tmppath, &self.path).await
    }
}
