use serde::{Deserialize, Serialize};

pub const DEFAULT_SHEET_NAME: &str = "Грузооборот";
pub const DEFAULT_DATE_LABEL: &str = "Дата";
pub const DEFAULT_TIME_LABEL: &str = "Время";
pub const DEFAULT_SHIFT_NUMBER_LABEL: &str = "№ смены";
pub const DEFAULT_HEADER_SCAN_ROWS: usize = 5;

pub const DEFAULT_EMPLOYEE_COLUMNS: [&str; 6] = [
    "Старший смены",
    "Помощник старшего смены",
    "Кладовщик",
    "Водитель погрузчика",
    "Рабочий склада",
    "Всего сотрудников",
];

/// Describes where the cargo-turnover table lives inside the workbook and which labels
/// identify its columns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetLayout {
    pub sheet_name: String,
    pub date_label: String,
    pub time_label: String,
    pub shift_number_label: String,
    /// Number of leading rows searched for the header row.
    pub header_scan_rows: usize,
    /// Employee-role columns taken from the sub-header row, in output order.
    pub employee_columns: Vec<String>,
}

impl Default for SheetLayout {
    fn default() -> Self {
        Self {
            sheet_name: DEFAULT_SHEET_NAME.to_string(),
            date_label: DEFAULT_DATE_LABEL.to_string(),
            time_label: DEFAULT_TIME_LABEL.to_string(),
            shift_number_label: DEFAULT_SHIFT_NUMBER_LABEL.to_string(),
            header_scan_rows: DEFAULT_HEADER_SCAN_ROWS,
            employee_columns: DEFAULT_EMPLOYEE_COLUMNS
                .iter()
                .map(|label| label.to_string())
                .collect(),
        }
    }
}

impl SheetLayout {
    pub fn required_labels(&self) -> [&str; 3] {
        [
            self.date_label.as_str(),
            self.time_label.as_str(),
            self.shift_number_label.as_str(),
        ]
    }
}
