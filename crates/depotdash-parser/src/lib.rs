pub mod errors;
pub mod header;
pub mod layout;
pub mod merge;
pub mod model;
mod workbook;

pub use errors::ParserError;
pub use header::{locate_header_row, row_has_labels};
pub use layout::SheetLayout;
pub use merge::{load_employee_table, load_main_table, merge_dual_headers, table_with_header};
pub use model::{CellValue, RawColumn, RawTable, SheetGrid};
pub use workbook::{
    cell_from_data, excel_serial_to_datetime, grid_from_range, load_cargo_sheet,
    load_workbook_bytes, load_workbook_path, read_sheet_grid,
};

#[cfg(test)]
mod tests;
