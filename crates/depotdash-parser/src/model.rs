use std::fmt;

use chrono::NaiveDateTime;

use crate::errors::ParserError;

/// A single untyped spreadsheet cell as read from the workbook.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
    Bool(bool),
    DateTime(NaiveDateTime),
    Error(String),
}

impl CellValue {
    pub fn text(value: impl Into<String>) -> Self {
        CellValue::Text(value.into())
    }

    /// True for blank cells and zero-length strings.
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(text) => text.is_empty(),
            _ => false,
        }
    }

    /// Trimmed textual form used when matching header labels. Blank cells yield `None`.
    pub fn as_label(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        Some(self.to_string().trim().to_string())
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(text) => f.write_str(text),
            CellValue::Number(value) => {
                if value.fract() == 0.0 && value.abs() < 9_007_199_254_740_992.0 {
                    write!(f, "{value:.0}")
                } else {
                    write!(f, "{value}")
                }
            }
            CellValue::Bool(value) => f.write_str(if *value { "TRUE" } else { "FALSE" }),
            CellValue::DateTime(value) => write!(f, "{}", value.format("%Y-%m-%d %H:%M:%S")),
            CellValue::Error(code) => write!(f, "#{code}"),
        }
    }
}

/// Rectangular view of a worksheet anchored at cell A1. Short rows are padded with
/// [`CellValue::Empty`].
#[derive(Debug, Clone, Default)]
pub struct SheetGrid {
    rows: Vec<Vec<CellValue>>,
    width: usize,
}

impl SheetGrid {
    pub fn from_rows(mut rows: Vec<Vec<CellValue>>) -> Self {
        let width = rows.iter().map(Vec::len).max().unwrap_or(0);
        for row in &mut rows {
            row.resize(width, CellValue::Empty);
        }
        Self { rows, width }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.width == 0
    }

    pub fn row(&self, index: usize) -> Option<&[CellValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[CellValue]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// Textual rendering of the first `count` rows.
    pub fn preview(&self, count: usize) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .take(count)
            .map(|row| row.iter().map(ToString::to_string).collect())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    /// Set when the header cell was blank and the name was generated.
    pub placeholder: bool,
    pub cells: Vec<CellValue>,
}

impl RawColumn {
    pub fn new(name: impl Into<String>, cells: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            placeholder: false,
            cells,
        }
    }
}

/// Column-oriented table of untyped cells. Row `i` of every column forms one raw record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    columns: Vec<RawColumn>,
    height: usize,
}

impl RawTable {
    pub fn new(columns: Vec<RawColumn>) -> Result<Self, ParserError> {
        let height = columns.first().map_or(0, |column| column.cells.len());
        if let Some(column) = columns.iter().find(|column| column.cells.len() != height) {
            return Err(ParserError::Validation {
                message: format!(
                    "column '{}' had {} rows, expected {height}",
                    column.name,
                    column.cells.len()
                ),
            });
        }
        Ok(Self { columns, height })
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn columns(&self) -> &[RawColumn] {
        &self.columns
    }

    pub fn into_columns(self) -> Vec<RawColumn> {
        self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&RawColumn> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// The raw record at `index` as (label, cell) pairs in column order.
    pub fn record(&self, index: usize) -> Option<Vec<(&str, &CellValue)>> {
        if index >= self.height {
            return None;
        }
        Some(
            self.columns
                .iter()
                .map(|column| (column.name.as_str(), &column.cells[index]))
                .collect(),
        )
    }

    pub fn truncate(&mut self, len: usize) {
        if len >= self.height {
            return;
        }
        for column in &mut self.columns {
            column.cells.truncate(len);
        }
        self.height = len;
    }

    /// Keeps only the rows whose index satisfies `keep`.
    pub fn retain_rows(&mut self, mut keep: impl FnMut(usize) -> bool) {
        let mask: Vec<bool> = (0..self.height).map(&mut keep).collect();
        for column in &mut self.columns {
            let mut index = 0;
            column.cells.retain(|_| {
                let retained = mask[index];
                index += 1;
                retained
            });
        }
        self.height = mask.iter().filter(|kept| **kept).count();
    }

    pub fn retain_columns(&mut self, keep: impl FnMut(&RawColumn) -> bool) {
        self.columns.retain(keep);
        if self.columns.is_empty() {
            self.height = 0;
        }
    }

    /// Replaces the column with the same name in place, or appends it.
    pub fn set_column(&mut self, column: RawColumn) -> Result<(), ParserError> {
        if !self.columns.is_empty() && column.cells.len() != self.height {
            return Err(ParserError::Validation {
                message: format!(
                    "column '{}' had {} rows, expected {}",
                    column.name,
                    column.cells.len(),
                    self.height
                ),
            });
        }
        if self.columns.is_empty() {
            self.height = column.cells.len();
        }
        match self.columns.iter_mut().find(|existing| existing.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    pub fn require_columns(&self, labels: &[&str]) -> Result<(), ParserError> {
        let missing: Vec<String> = labels
            .iter()
            .filter(|label| self.column(label).is_none())
            .map(|label| label.to_string())
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(ParserError::MissingColumns {
            missing,
            found: self.column_names().into_iter().map(String::from).collect(),
        })
    }
}
