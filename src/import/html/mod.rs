use scraper::Html;

use crate::error::ImportError;

mod tree;

pub use tree::TreeNode;
use tree::{direct_children_named, find_all, find_first};

const DATE_COLUMN: usize = 1;
const POINT_OF_SALE_COLUMN: usize = 4;
const CONCEPT_COLUMN: usize = 5;
const AMOUNT_COLUMN: usize = 7;
const MIN_CELLS: usize = AMOUNT_COLUMN + 1;

/// The cells of one data row of the bank portal's movement table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlRow {
    /// 1-based position among all `<tr>` elements of the table
    pub row_number: usize,
    /// e.g. `02/05/2025`
    pub date: String,
    pub point_of_sale: String,
    /// e.g. `OPERACION COBRO QR`
    pub concept: String,
    /// e.g. `85926,02`
    pub amount: String,
}

pub fn parse(content: &str) -> Result<Vec<HtmlRow>, ImportError> {
    let document = Html::parse_document(content);
    parse_tree(document.root_element())
}

/// Extract data rows from the first `<table>` below `root`.
///
/// Every `<tr>` anywhere below that table is a candidate row, but only its direct `<td>`/`<th>`
/// children count as cells, so a table nested inside a cell can't shift the column positions.
/// Rows with too few cells or an empty required cell are headers, footers or decoration and
/// are skipped.
pub fn parse_tree<N: TreeNode>(root: N) -> Result<Vec<HtmlRow>, ImportError> {
    let table = find_first(root, "table")
        .ok_or_else(|| ImportError::Parse("No table found in the HTML document".to_string()))?;
    let table_rows = find_all(table, "tr");
    if table_rows.is_empty() {
        return Err(ImportError::Parse("The table doesn't contain any rows".to_string()));
    }

    let rows: Vec<HtmlRow> = table_rows
        .iter()
        .enumerate()
        .filter_map(|(index, row)| extract_row(index + 1, row))
        .collect();

    if rows.is_empty() {
        return Err(ImportError::NoValidRows);
    }
    Ok(rows)
}

fn extract_row<N: TreeNode>(row_number: usize, row: &N) -> Option<HtmlRow> {
    let cells = direct_children_named(row, &["td", "th"]);
    if cells.len() < MIN_CELLS {
        return None;
    }
    let cell_text = |column: usize| Some(cells[column].text()).filter(|text| !text.is_empty());
    Some(HtmlRow {
        row_number,
        date: cell_text(DATE_COLUMN)?,
        point_of_sale: cell_text(POINT_OF_SALE_COLUMN)?,
        concept: cell_text(CONCEPT_COLUMN)?,
        amount: cell_text(AMOUNT_COLUMN)?,
    })
}
