use chrono::NaiveDate;
use rust_decimal::Decimal;

use super::html::HtmlRow;
use super::tabular::TabularRow;
use super::utils::{parse_amount, parse_date, parse_date_time};
use crate::aggregate::Channel;
use crate::db::PointOfSaleId;
use crate::error::{ImportError, RowProblem};

const POINT_OF_SALE_PREFIX: char = 'C';
const ACCREDITED_STATUS: &str = "ACREDITADO";

/// A transaction with every field converted to its proper type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedRow {
    /// Line (tabular) or row number (html) in the input, for diagnostics
    pub source_line: u64,
    pub point_of_sale_id: PointOfSaleId,
    /// Calendar day of the transaction; any time of day is dropped
    pub date: NaiveDate,
    pub amount: Decimal,
    /// Counts towards the valid transactions and the sales sums
    pub valid: bool,
    pub channel: Channel,
}

/// Normalize all rows of a transaction export. Fails listing every row that couldn't be normalized.
pub fn normalize_tabular(rows: &[TabularRow]) -> Result<Vec<NormalizedRow>, ImportError> {
    let mut normalized = Vec::with_capacity(rows.len());
    let mut problems = Vec::new();
    for row in rows {
        match normalize_tabular_row(row) {
            Ok(row) => normalized.push(row),
            Err(message) => problems.push(RowProblem {
                line: row.line,
                message,
            }),
        }
    }
    if !problems.is_empty() {
        return Err(ImportError::Validation { problems });
    }
    Ok(normalized)
}

fn normalize_tabular_row(row: &TabularRow) -> Result<NormalizedRow, String> {
    let point_of_sale_id = parse_point_of_sale_code(&row.point_of_sale)?;
    let amount = parse_amount(&row.amount)
        .map_err(|err| format!("Amount '{}' is not a valid number: {err}", row.amount))?;
    let date_time = parse_date_time(&row.date)
        .map_err(|err| format!("Date '{}' doesn't have the expected format: {err}", row.date))?;
    Ok(NormalizedRow {
        source_line: row.line,
        point_of_sale_id,
        date: date_time.date(),
        amount,
        valid: row.status.trim().to_uppercase() == ACCREDITED_STATUS,
        channel: Channel::from_payment_method(&row.payment_method),
    })
}

fn parse_point_of_sale_code(code: &str) -> Result<PointOfSaleId, String> {
    let number = code.strip_prefix(POINT_OF_SALE_PREFIX).ok_or_else(|| {
        format!("Point of sale '{code}' doesn't have the expected format (must start with '{POINT_OF_SALE_PREFIX}')")
    })?;
    parse_point_of_sale_number(number)
        .ok_or_else(|| format!("Point of sale '{code}' doesn't have a numeric identifier"))
}

fn parse_point_of_sale_number(content: &str) -> Option<PointOfSaleId> {
    let content = content.trim();
    if content.is_empty() || !content.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    content.parse().ok().map(PointOfSaleId)
}

/// Normalize the rows of a bank portal table. Rows that don't normalize are skipped, they're
/// usually caption rows that happen to have enough cells.
pub fn normalize_html(rows: &[HtmlRow]) -> Result<Vec<NormalizedRow>, ImportError> {
    let normalized: Vec<NormalizedRow> = rows
        .iter()
        .filter_map(|row| match normalize_html_row(row) {
            Ok(normalized) => Some(normalized),
            Err(err) => {
                log::warn!("Skipping table row {}: {err}", row.row_number);
                None
            }
        })
        .collect();
    if normalized.is_empty() {
        return Err(ImportError::NoValidRows);
    }
    Ok(normalized)
}

fn normalize_html_row(row: &HtmlRow) -> Result<NormalizedRow, String> {
    let date = parse_date(&row.date).map_err(|err| format!("invalid date '{}': {err}", row.date))?;
    let point_of_sale_id = parse_point_of_sale_number(&row.point_of_sale)
        .ok_or_else(|| format!("invalid point of sale '{}'", row.point_of_sale))?;
    let amount =
        parse_amount(&row.amount).map_err(|err| format!("invalid amount '{}': {err}", row.amount))?;
    Ok(NormalizedRow {
        source_line: row.row_number as u64,
        point_of_sale_id,
        date,
        amount,
        valid: true,
        channel: Channel::from_concept(&row.concept),
    })
}
