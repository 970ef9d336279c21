use std::fmt::{self, Display};

use crate::aggregate::AggregateKey;
use crate::db::PointOfSaleId;

/// Reasons a batch is refused. Every variant lists all offending rows or keys, never just the first.
#[derive(thiserror::Error, Debug)]
pub enum ImportError {
    #[error("Failed to parse the file: {0}")]
    Parse(String),

    #[error("The file is empty or doesn't contain any data rows after parsing")]
    EmptyInput,

    #[error("No valid data rows found in the table")]
    NoValidRows,

    #[error("Found formatting errors in the file:\n{}\n\nNothing was imported.", join(.problems, "\n"))]
    Validation { problems: Vec<RowProblem> },

    #[error("Found duplicate transaction IDs in the file: {}. Nothing was imported.", join(.duplicates, ", "))]
    DuplicateInBatch { duplicates: Vec<DuplicateId> },

    #[error("The following points of sale are not registered: {}. Nothing was imported.", join(.ids, ", "))]
    UnknownPointOfSale { ids: Vec<PointOfSaleId> },

    #[error("Daily sales already exist for the following points of sale and dates:\n{}\n\nNothing was imported to avoid duplicates.", join(.keys, "\n"))]
    AlreadyPersisted { keys: Vec<AggregateKey> },

    /// The store failed to answer a lookup or to write the batch. Nothing was written.
    #[error("Failed to process the batch: {message}")]
    Persistence {
        message: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl ImportError {
    pub fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence {
            message: format!("{err:#}"),
            source: err.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowProblem {
    pub line: u64,
    pub message: String,
}

impl Display for RowProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}: {}", self.line, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateId {
    pub id: String,
    pub lines: Vec<u64>,
}

impl Display for DuplicateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (lines {})", self.id, join(&self.lines, ", "))
    }
}

fn join<T: Display>(items: &[T], separator: &str) -> String {
    items
        .iter()
        .map(|item| item.to_string())
        .collect::<Vec<_>>()
        .join(separator)
}
