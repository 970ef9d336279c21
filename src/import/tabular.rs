use serde::Deserialize;

use crate::error::ImportError;

/// One data line of the semicolon separated transaction export. Columns not listed here are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TabularRow {
    #[serde(skip)]
    pub line: u64,
    #[serde(rename = "Id")]
    pub id: String,
    /// e.g. `2/5/2025 17:25:53`
    #[serde(rename = "Fecha")]
    pub date: String,
    /// e.g. `11000,0000000`
    #[serde(rename = "Importe")]
    pub amount: String,
    /// e.g. `C11682`
    #[serde(rename = "Comercio")]
    pub point_of_sale: String,
    /// e.g. `ACREDITADO`, `DEVUELTA`, `RECHAZADO`
    #[serde(rename = "Estado")]
    pub status: String,
    /// e.g. `Tarjetadebito`, `Tarjetacredito`, `Transf30`
    #[serde(rename = "MedioPagoDescripcion")]
    pub payment_method: String,
}

pub fn parse(content: &str) -> Result<Vec<TabularRow>, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| ImportError::Parse(err.to_string()))?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| ImportError::Parse(err.to_string()))?;
        let line = record.position().map(|pos| pos.line()).unwrap_or_default();
        let mut row: TabularRow = record
            .deserialize(Some(&headers))
            .map_err(|err| ImportError::Parse(format!("line {line}: {err}")))?;
        row.line = line;
        rows.push(row);
    }

    if rows.is_empty() {
        return Err(ImportError::EmptyInput);
    }
    Ok(rows)
}
