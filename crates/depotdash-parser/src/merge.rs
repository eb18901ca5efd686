//! Splices the employee-role sub-header columns into the main table.
//!
//! The cargo-turnover sheet nests the employee role labels one row below the main
//! header. The sheet is therefore read twice: once with the located header row as
//! column names and once with the row beneath it. Employee columns from the second
//! read are attached to the first by row position.
//!
//! Precondition: after the main table's blank rows are removed, row `i` of the
//! employee table describes the same shift as row `i` of the main table. Nothing
//! here checks that; there is no key to join on.

use std::collections::HashMap;

use tracing::debug;

use crate::errors::ParserError;
use crate::layout::SheetLayout;
use crate::model::{RawColumn, RawTable, SheetGrid};

const PLACEHOLDER_PREFIX: &str = "Unnamed";

/// Reads `grid` using `header_row` as the column-name row. Blank header cells get a
/// generated placeholder name and repeated names are suffixed `.1`, `.2`, ...
pub fn table_with_header(grid: &SheetGrid, header_row: usize) -> RawTable {
    let Some(header) = grid.row(header_row) else {
        return RawTable::default();
    };

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut columns: Vec<RawColumn> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let (base, placeholder) = match cell.as_label() {
                Some(label) => (label, false),
                None => (format!("{PLACEHOLDER_PREFIX}: {idx}"), true),
            };
            let occurrence = seen.entry(base.clone()).or_insert(0);
            let name = if *occurrence == 0 {
                base
            } else {
                format!("{base}.{occurrence}")
            };
            *occurrence += 1;
            RawColumn {
                name,
                placeholder,
                cells: Vec::with_capacity(grid.height().saturating_sub(header_row + 1)),
            }
        })
        .collect();

    for row in grid.rows().skip(header_row + 1) {
        for (column, cell) in columns.iter_mut().zip(row) {
            column.cells.push(cell.clone());
        }
    }

    // Every column was filled from the same padded rows.
    RawTable::new(columns).unwrap_or_default()
}

/// The main table: fully blank rows and placeholder-named columns removed.
pub fn load_main_table(grid: &SheetGrid, header_row: usize) -> RawTable {
    let mut table = table_with_header(grid, header_row);
    let blank_rows: Vec<bool> = (0..table.height())
        .map(|row| {
            table
                .columns()
                .iter()
                .all(|column| column.cells[row].is_empty())
        })
        .collect();
    table.retain_rows(|row| !blank_rows[row]);

    let before = table.width();
    table.retain_columns(|column| !column.placeholder);
    debug!(
        rows = table.height(),
        dropped_columns = before - table.width(),
        "loaded main table"
    );
    table
}

/// The employee sub-header table restricted to `allow_list`, in allow-list order.
pub fn load_employee_table(grid: &SheetGrid, header_row: usize, allow_list: &[String]) -> RawTable {
    let sub_header_row = header_row + 1;
    let table = table_with_header(grid, sub_header_row);

    let columns: Vec<RawColumn> = allow_list
        .iter()
        .filter_map(|label| table.column(label).cloned())
        .collect();
    RawTable::new(columns).unwrap_or_default()
}

/// Builds the merged raw table for the sheet, with employee-role columns attached to
/// the main table by row position.
pub fn merge_dual_headers(
    grid: &SheetGrid,
    header_row: usize,
    layout: &SheetLayout,
) -> Result<RawTable, ParserError> {
    let mut main = load_main_table(grid, header_row);
    let mut employees = load_employee_table(grid, header_row, &layout.employee_columns);

    if employees.width() == 0 {
        debug!("no employee-role columns found under the header row");
        return Ok(main);
    }

    let aligned = main.height().min(employees.height());
    if aligned != main.height() || aligned != employees.height() {
        debug!(
            main_rows = main.height(),
            employee_rows = employees.height(),
            aligned,
            "truncating tables to a common row count"
        );
    }
    main.truncate(aligned);
    employees.truncate(aligned);

    for column in employees.into_columns() {
        debug!(column = %column.name, "attaching employee column");
        main.set_column(RawColumn {
            placeholder: false,
            ..column
        })?;
    }

    Ok(main)
}
