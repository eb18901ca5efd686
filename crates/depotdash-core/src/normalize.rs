//! Turns the merged raw table into the canonical table.
//!
//! Order of operations: forward-fill the date column, map shift numbers and drop the
//! rows that do not map, parse dates and drop the rows that do not parse, canonicalize
//! shift times, coerce every remaining column to a number.

use chrono::{NaiveDate, NaiveTime};
use depotdash_parser::{CellValue, RawTable, SheetLayout};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::schema::{DAY_SHIFT, NIGHT_SHIFT, SHIFT_NUMBERS};
use crate::table::{CanonicalTable, MetricColumn};

static DIGIT_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[0-9]+").expect("static pattern"));

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d.%m.%Y", "%d.%m.%y", "%d/%m/%Y", "%Y/%m/%d"];
const DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Row counts observed while normalizing. Dropping rows is silent, so callers read the
/// counts from here.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub input_rows: usize,
    pub unmapped_shift_numbers: usize,
    pub unparseable_dates: usize,
    pub output_rows: usize,
}

impl NormalizationReport {
    pub fn dropped_rows(&self) -> usize {
        self.unmapped_shift_numbers + self.unparseable_dates
    }
}

/// Canonical shift label for a free-form cell; `None` for blank cells.
pub fn normalize_shift_time(cell: &CellValue) -> Option<String> {
    let text = match cell {
        CellValue::Empty => return None,
        // A bare time typed into the cell comes back as a timestamp on the Excel epoch.
        CellValue::DateTime(value) if Some(value.date()) == excel_epoch() => {
            format_time(value.time())
        }
        other => other.to_string(),
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(canonicalize_shift_time(trimmed))
}

/// Maps spelling variants of the two shift windows onto `6:00-18:00` / `18:00-6:00`.
///
/// Only the starting hour decides: any text with at least two digit runs whose first
/// run is the number 6 or 18 is canonical. Everything else comes back partially
/// cleaned (dashes unified, spaces removed, dots turned into colons). Only ASCII digits
/// count as digits.
pub fn canonicalize_shift_time(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed == DAY_SHIFT || trimmed == NIGHT_SHIFT {
        return trimmed.to_string();
    }

    let cleaned: String = trimmed
        .chars()
        .filter(|c| *c != ' ')
        .map(|c| match c {
            '\u{2013}' | '\u{2014}' => '-',
            '.' => ':',
            other => other,
        })
        .collect();

    let runs: Vec<&str> = DIGIT_RUNS.find_iter(&cleaned).map(|m| m.as_str()).collect();
    if runs.len() < 2 {
        return cleaned;
    }

    match runs[0].parse::<u32>() {
        Ok(6) => DAY_SHIFT.to_string(),
        Ok(18) => NIGHT_SHIFT.to_string(),
        _ => cleaned,
    }
}

/// `"1".."4"` pass through; the shift letters А-Г (Cyrillic or Latin look-alikes) map
/// to their ordinal. Anything else is unmappable.
pub fn map_shift_number(cell: &CellValue) -> Option<String> {
    let label = cell.to_string().trim().to_uppercase();
    if SHIFT_NUMBERS.contains(&label.as_str()) {
        return Some(label);
    }
    let mapped = match label.as_str() {
        "А" | "A" => "1",
        "Б" | "B" => "2",
        "В" | "C" => "3",
        "Г" | "D" => "4",
        _ => return None,
    };
    Some(mapped.to_string())
}

/// Fills blank cells with the last non-blank cell above them. Leading blanks stay blank.
pub fn forward_fill(cells: &[CellValue]) -> Vec<CellValue> {
    let mut last: Option<&CellValue> = None;
    cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                last.cloned().unwrap_or(CellValue::Empty)
            } else {
                last = Some(cell);
                cell.clone()
            }
        })
        .collect()
}

/// Date-typed cells keep their calendar day; text is tried against ISO and day-first
/// formats. Bare numbers are not interpreted as dates.
pub fn parse_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(value) => Some(value.date()),
        CellValue::Text(text) => {
            let trimmed = text.trim();
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
                .or_else(|| {
                    DATE_TIME_FORMATS.iter().find_map(|fmt| {
                        chrono::NaiveDateTime::parse_from_str(trimmed, fmt)
                            .ok()
                            .map(|value| value.date())
                    })
                })
        }
        _ => None,
    }
}

/// Numeric reading of a metric cell. Anything that is not a finite number becomes the
/// missing marker.
pub fn coerce_numeric(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(value) => *value,
        CellValue::Bool(value) => f64::from(u8::from(*value)),
        CellValue::Text(text) => text.trim().parse::<f64>().ok()?,
        CellValue::Empty | CellValue::DateTime(_) | CellValue::Error(_) => return None,
    };
    value.is_finite().then_some(value)
}

/// Normalizes the merged raw table. Every column other than the three required ones
/// becomes a numeric metric column, in source order.
pub fn normalize(raw: &RawTable, layout: &SheetLayout) -> Result<(CanonicalTable, NormalizationReport)> {
    raw.require_columns(&layout.required_labels())?;

    let dates = forward_fill(column_cells(raw, &layout.date_label));
    let times = column_cells(raw, &layout.time_label);
    let numbers = column_cells(raw, &layout.shift_number_label);

    let mut report = NormalizationReport {
        input_rows: raw.height(),
        ..NormalizationReport::default()
    };

    let mut kept: Vec<usize> = Vec::with_capacity(raw.height());
    let mut kept_dates: Vec<NaiveDate> = Vec::with_capacity(raw.height());
    let mut kept_numbers: Vec<String> = Vec::with_capacity(raw.height());
    for row in 0..raw.height() {
        let Some(number) = map_shift_number(&numbers[row]) else {
            report.unmapped_shift_numbers += 1;
            continue;
        };
        let Some(date) = parse_date(&dates[row]) else {
            report.unparseable_dates += 1;
            continue;
        };
        kept.push(row);
        kept_dates.push(date);
        kept_numbers.push(number);
    }
    report.output_rows = kept.len();

    let shift_times: Vec<Option<String>> = kept
        .iter()
        .map(|row| normalize_shift_time(&times[*row]))
        .collect();

    let required = layout.required_labels();
    let metrics: Vec<MetricColumn> = raw
        .columns()
        .iter()
        .filter(|column| !required.contains(&column.name.as_str()))
        .map(|column| MetricColumn {
            name: column.name.clone(),
            values: kept.iter().map(|row| coerce_numeric(&column.cells[*row])).collect(),
        })
        .collect();

    if report.dropped_rows() > 0 {
        warn!(
            unmapped_shift_numbers = report.unmapped_shift_numbers,
            unparseable_dates = report.unparseable_dates,
            "dropped rows during normalization"
        );
    }
    info!(
        input_rows = report.input_rows,
        output_rows = report.output_rows,
        metrics = metrics.len(),
        "normalized cargo turnover table"
    );

    let table = CanonicalTable::from_parts(kept_dates, shift_times, kept_numbers, metrics)?;
    Ok((table, report))
}

fn column_cells<'a>(raw: &'a RawTable, label: &str) -> &'a [CellValue] {
    raw.column(label)
        .map(|column| column.cells.as_slice())
        .unwrap_or_default()
}

fn excel_epoch() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1899, 12, 30)
}

fn format_time(time: NaiveTime) -> String {
    time.format("%-H:%M").to_string()
}
