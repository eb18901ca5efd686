use tracing::info;

use crate::errors::ParserError;
use crate::layout::SheetLayout;
use crate::model::{CellValue, SheetGrid};

/// Returns the zero-based index of the first row among the leading
/// `layout.header_scan_rows` rows that carries all three required labels.
pub fn locate_header_row(grid: &SheetGrid, layout: &SheetLayout) -> Result<usize, ParserError> {
    let required = layout.required_labels();
    let scanned = layout.header_scan_rows.min(grid.height());

    let found = grid
        .rows()
        .take(scanned)
        .position(|row| row_has_labels(row, &required));

    match found {
        Some(index) => {
            info!(header_row = index, sheet = %layout.sheet_name, "located header row");
            Ok(index)
        }
        None => Err(ParserError::HeaderNotFound {
            required: required.iter().map(|label| label.to_string()).collect(),
            scanned,
            preview: grid.preview(layout.header_scan_rows),
        }),
    }
}

/// True when the non-blank, trimmed values of `row` include every label in `labels`.
pub fn row_has_labels(row: &[CellValue], labels: &[&str]) -> bool {
    let values: Vec<String> = row.iter().filter_map(CellValue::as_label).collect();
    labels
        .iter()
        .all(|label| values.iter().any(|value| value == label))
}
