use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{self, Display};

use crate::db::PointOfSaleId;
use crate::error::{ImportError, RowProblem};
use crate::import::utils::round_to_cents;
use crate::import::NormalizedRow;

/// Identifies one daily summary. Orders by point of sale first, then by date.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AggregateKey {
    pub point_of_sale_id: PointOfSaleId,
    pub date: NaiveDate,
}

impl AggregateKey {
    pub fn new(point_of_sale_id: PointOfSaleId, date: NaiveDate) -> Self {
        Self {
            point_of_sale_id,
            date,
        }
    }
}

impl Display for AggregateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.point_of_sale_id,
            self.date.format("%Y-%m-%d")
        )
    }
}

/// Payment channel a transaction's amount is summed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Qr,
    Debit,
    Credit,
    Transfer,
    /// Counted in the total sales but in no channel sum
    Uncategorized,
    /// Counted in neither the total sales nor any channel sum
    Excluded,
}

impl Channel {
    pub fn from_payment_method(description: &str) -> Self {
        match description.trim().to_lowercase().as_str() {
            "tarjetadebito" => Channel::Debit,
            "tarjetacredito" => Channel::Credit,
            "transf30" => Channel::Qr,
            _ => Channel::Uncategorized,
        }
    }

    pub fn from_concept(concept: &str) -> Self {
        let concept = concept.trim().to_uppercase();
        if concept.contains("OPERACION COBRO QR") || concept.contains("QR MAX") {
            Channel::Qr
        } else if concept == "OPERACION TARJETA DEBITO (PRISMA-WEB)" {
            Channel::Debit
        } else if concept == "OPERACION TRANSFERENCIA" {
            Channel::Transfer
        } else {
            Channel::Excluded
        }
    }
}

/// Daily summary of one point of sale.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AggregateRecord {
    pub key: AggregateKey,
    /// All transactions seen, including the ones that weren't accredited
    pub total_transactions_count: u32,
    pub valid_transactions_count: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub qr_sales: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub debit_sales: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub credit_sales: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub transfer_sales: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_sales: Decimal,
}

impl AggregateRecord {
    pub fn channel_sum(&self) -> Decimal {
        self.qr_sales + self.debit_sales + self.credit_sales + self.transfer_sales
    }
}

#[derive(Default)]
struct Accumulator {
    total_transactions_count: u32,
    valid_transactions_count: u32,
    qr_sales: Decimal,
    debit_sales: Decimal,
    credit_sales: Decimal,
    transfer_sales: Decimal,
    uncategorized_sales: Decimal,
    last_line: u64,
}

impl Accumulator {
    /// Returns None if the channel sum would leave the range of `Decimal`. The sums are unchanged then.
    fn add(&mut self, row: &NormalizedRow) -> Option<()> {
        self.total_transactions_count += 1;
        self.last_line = row.source_line;
        if !row.valid {
            return Some(());
        }
        self.valid_transactions_count += 1;
        let sum = match row.channel {
            Channel::Qr => &mut self.qr_sales,
            Channel::Debit => &mut self.debit_sales,
            Channel::Credit => &mut self.credit_sales,
            Channel::Transfer => &mut self.transfer_sales,
            Channel::Uncategorized => &mut self.uncategorized_sales,
            Channel::Excluded => return Some(()),
        };
        *sum = sum.checked_add(row.amount)?;
        Some(())
    }

    fn finalize(self, key: AggregateKey) -> Option<AggregateRecord> {
        let qr_sales = round_to_cents(self.qr_sales);
        let debit_sales = round_to_cents(self.debit_sales);
        let credit_sales = round_to_cents(self.credit_sales);
        let transfer_sales = round_to_cents(self.transfer_sales);
        // Sum of the rounded components, so the reported channels always add up to the total
        let total_sales = qr_sales
            .checked_add(debit_sales)?
            .checked_add(credit_sales)?
            .checked_add(transfer_sales)?
            .checked_add(round_to_cents(self.uncategorized_sales))?;
        Some(AggregateRecord {
            key,
            total_transactions_count: self.total_transactions_count,
            valid_transactions_count: self.valid_transactions_count,
            qr_sales,
            debit_sales,
            credit_sales,
            transfer_sales,
            total_sales,
        })
    }
}

/// Groups normalized rows by point of sale and calendar day.
#[derive(Default)]
pub struct Aggregator {
    groups: BTreeMap<AggregateKey, Accumulator>,
    problems: Vec<RowProblem>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, row: &NormalizedRow) {
        let key = AggregateKey::new(row.point_of_sale_id, row.date);
        if row.valid && row.channel == Channel::Uncategorized {
            log::warn!(
                "Unknown payment method on line {} ({}), counted in the total but in no channel",
                row.source_line,
                key,
            );
        }
        if self.groups.entry(key).or_default().add(row).is_none() {
            self.problems.push(RowProblem {
                line: row.source_line,
                message: format!("Amount {} makes the sales of {key} too large", row.amount),
            });
        }
    }

    /// Rounded records, sorted by point of sale and date. Fails listing every row
    /// whose amount pushed a sum out of range.
    pub fn finalize(self) -> Result<Vec<AggregateRecord>, ImportError> {
        let mut problems = self.problems;
        let mut records = Vec::with_capacity(self.groups.len());
        for (key, accumulator) in self.groups {
            let last_line = accumulator.last_line;
            match accumulator.finalize(key) {
                Some(record) => records.push(record),
                None => problems.push(RowProblem {
                    line: last_line,
                    message: format!("Total sales of {key} are too large"),
                }),
            }
        }
        if !problems.is_empty() {
            problems.sort_by_key(|problem| problem.line);
            return Err(ImportError::Validation { problems });
        }
        Ok(records)
    }
}

pub fn aggregate<'a>(
    rows: impl IntoIterator<Item = &'a NormalizedRow>,
) -> Result<Vec<AggregateRecord>, ImportError> {
    let mut aggregator = Aggregator::new();
    for row in rows {
        aggregator.add(row);
    }
    aggregator.finalize()
}
