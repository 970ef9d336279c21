use anyhow::{bail, ensure, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{btree_map::Entry, BTreeMap, BTreeSet};

use super::point_of_sale::{PointOfSale, PointOfSaleId};
use crate::aggregate::{AggregateKey, AggregateRecord};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct DailySales {
    pub record: AggregateRecord,
    pub imported_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct DatabaseV1 {
    pub points_of_sale: BTreeMap<PointOfSaleId, PointOfSale>,
    pub daily_sales: BTreeMap<AggregateKey, DailySales>,
}

impl DatabaseV1 {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_point_of_sale(&mut self, id: PointOfSaleId, point_of_sale: PointOfSale) -> Result<()> {
        match self.points_of_sale.entry(id) {
            Entry::Occupied(entry) => {
                bail!(
                    "Point of sale {id} is already registered as '{}'",
                    entry.get().name
                )
            }
            Entry::Vacant(entry) => {
                entry.insert(point_of_sale);
                Ok(())
            }
        }
    }

    pub fn existing_points_of_sale(&self, ids: &BTreeSet<PointOfSaleId>) -> BTreeSet<PointOfSaleId> {
        ids.iter()
            .filter(|id| self.points_of_sale.contains_key(*id))
            .copied()
            .collect()
    }

    pub fn existing_keys(&self, keys: &BTreeSet<AggregateKey>) -> BTreeSet<AggregateKey> {
        keys.iter()
            .filter(|key| self.daily_sales.contains_key(*key))
            .copied()
            .collect()
    }

    /// Adds all records or, if any of them can't be added, none of them.
    pub fn insert_batch(&mut self, records: &[AggregateRecord], imported_at: DateTime<Utc>) -> Result<()> {
        let mut keys = BTreeSet::new();
        for record in records {
            ensure!(
                keys.insert(record.key),
                "Batch contains {} more than once",
                record.key
            );
            ensure!(
                self.points_of_sale.contains_key(&record.key.point_of_sale_id),
                "Point of sale {} is not registered",
                record.key.point_of_sale_id
            );
        }
        let existing = self.existing_keys(&keys);
        if !existing.is_empty() {
            bail!(
                "Daily sales already exist for {}",
                existing
                    .iter()
                    .map(|key| key.to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }

        for record in records {
            self.daily_sales.insert(
                record.key,
                DailySales {
                    record: record.clone(),
                    imported_at,
                },
            );
        }
        Ok(())
    }

    pub fn daily_sales_of(
        &self,
        point_of_sale_id: PointOfSaleId,
    ) -> impl Iterator<Item = &DailySales> {
        self.daily_sales
            .values()
            .filter(move |sales| sales.record.key.point_of_sale_id == point_of_sale_id)
    }
}
