use std::io::{Cursor, Read, Seek};
use std::path::Path;

use calamine::{open_workbook, Data, Range, Reader, Xlsx};
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use tracing::info;

use crate::errors::ParserError;
use crate::header::locate_header_row;
use crate::layout::SheetLayout;
use crate::merge::merge_dual_headers;
use crate::model::{CellValue, RawTable, SheetGrid};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Opens an `.xlsx` workbook on disk and extracts the merged cargo-turnover table.
pub fn load_workbook_path(path: impl AsRef<Path>, layout: &SheetLayout) -> Result<RawTable, ParserError> {
    let mut workbook: Xlsx<_> = open_workbook(path.as_ref())?;
    let grid = read_sheet_grid(&mut workbook, &layout.sheet_name)?;
    load_cargo_sheet(&grid, layout)
}

/// Same as [`load_workbook_path`] for an in-memory upload.
pub fn load_workbook_bytes(bytes: &[u8], layout: &SheetLayout) -> Result<RawTable, ParserError> {
    let mut workbook = Xlsx::new(Cursor::new(bytes))?;
    let grid = read_sheet_grid(&mut workbook, &layout.sheet_name)?;
    load_cargo_sheet(&grid, layout)
}

/// Locates the header row, merges the employee sub-header columns and checks that the
/// required columns survived.
pub fn load_cargo_sheet(grid: &SheetGrid, layout: &SheetLayout) -> Result<RawTable, ParserError> {
    if grid.is_empty() {
        return Err(ParserError::EmptySheet {
            sheet: layout.sheet_name.clone(),
        });
    }

    let header_row = locate_header_row(grid, layout)?;
    let table = merge_dual_headers(grid, header_row, layout)?;
    table.require_columns(&layout.required_labels())?;

    info!(
        rows = table.height(),
        columns = table.width(),
        "loaded cargo turnover sheet"
    );
    Ok(table)
}

pub fn read_sheet_grid<RS: Read + Seek>(
    workbook: &mut Xlsx<RS>,
    sheet: &str,
) -> Result<SheetGrid, ParserError> {
    let available = workbook.sheet_names();
    if !available.iter().any(|name| name == sheet) {
        return Err(ParserError::SheetNotFound {
            sheet: sheet.to_string(),
            available,
        });
    }

    let range = workbook.worksheet_range(sheet)?;
    Ok(grid_from_range(&range))
}

/// Converts a calamine range into a grid anchored at A1, so row indices count from the
/// top of the sheet even when the used range starts lower.
pub fn grid_from_range(range: &Range<Data>) -> SheetGrid {
    let Some((start_row, start_col)) = range.start() else {
        return SheetGrid::default();
    };

    let mut rows: Vec<Vec<CellValue>> = vec![Vec::new(); start_row as usize];
    for source in range.rows() {
        let mut row = vec![CellValue::Empty; start_col as usize];
        row.extend(source.iter().map(cell_from_data));
        rows.push(row);
    }
    SheetGrid::from_rows(rows)
}

pub fn cell_from_data(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(text) => CellValue::Text(text.clone()),
        Data::Float(value) => CellValue::Number(*value),
        Data::Int(value) => CellValue::Number(*value as f64),
        Data::Bool(value) => CellValue::Bool(*value),
        Data::DateTime(value) => excel_serial_to_datetime(value.as_f64())
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Number(value.as_f64())),
        Data::DateTimeIso(text) => parse_iso_datetime(text)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::Text(text.clone())),
        Data::DurationIso(text) => CellValue::Text(text.clone()),
        Data::Error(err) => CellValue::Error(format!("{err:?}")),
    }
}

/// Excel 1900-system serial to a timestamp. Serial 0 is 1899-12-30, which is exact for
/// every serial after the phantom 1900-02-29.
pub fn excel_serial_to_datetime(serial: f64) -> Option<NaiveDateTime> {
    if !serial.is_finite() {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?.and_hms_opt(0, 0, 0)?;
    let millis = (serial * MILLIS_PER_DAY).round() as i64;
    epoch.checked_add_signed(TimeDelta::try_milliseconds(millis)?)
}

fn parse_iso_datetime(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
