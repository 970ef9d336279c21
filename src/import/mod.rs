use std::path::Path;

use crate::aggregate::{aggregate, AggregateRecord};
use crate::error::ImportError;
use crate::validate::check_duplicate_transaction_ids;

pub mod html;
mod normalize;
pub mod tabular;
pub mod utils;

pub use normalize::{normalize_html, normalize_tabular, NormalizedRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum InputFormat {
    /// Semicolon separated transaction export
    Tabular,
    /// Bank portal export containing an HTML table
    Html,
}

impl InputFormat {
    /// Bank portal exports are HTML even when they're saved with a spreadsheet extension.
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        match extension.as_deref() {
            Some("html" | "htm" | "xls") => InputFormat::Html,
            _ => InputFormat::Tabular,
        }
    }
}

/// Aggregates of one input file that passed every check not requiring the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBatch {
    pub format: InputFormat,
    /// Sorted by point of sale and date
    pub records: Vec<AggregateRecord>,
}

/// Parse, normalize and aggregate a whole input file.
pub fn prepare_batch(format: InputFormat, content: &str) -> Result<PreparedBatch, ImportError> {
    let content = maybe_remove_byte_order_mark(content);
    let normalized = match format {
        InputFormat::Tabular => {
            let rows = tabular::parse(content)?;
            log::info!("Parsed {} rows from transaction export", rows.len());
            check_duplicate_transaction_ids(&rows)?;
            normalize_tabular(&rows)?
        }
        InputFormat::Html => {
            let rows = html::parse(content)?;
            log::info!("Parsed {} rows from HTML table", rows.len());
            normalize_html(&rows)?
        }
    };
    let records = aggregate(&normalized)?;
    log::info!(
        "Aggregated {} transactions into {} daily summaries",
        normalized.len(),
        records.len()
    );
    Ok(PreparedBatch { format, records })
}

fn maybe_remove_byte_order_mark(content: &str) -> &str {
    content.strip_prefix('\u{FEFF}').unwrap_or(content)
}
