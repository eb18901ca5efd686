use calamine::{Data, Range};
use chrono::NaiveDate;

use crate::errors::ParserError;
use crate::layout::SheetLayout;
use crate::model::{CellValue, RawColumn, RawTable, SheetGrid};
use crate::{
    excel_serial_to_datetime, grid_from_range, load_cargo_sheet, load_employee_table,
    load_main_table, load_workbook_bytes, load_workbook_path, locate_header_row,
    merge_dual_headers, table_with_header,
};

fn t(value: &str) -> CellValue {
    CellValue::text(value)
}

fn n(value: f64) -> CellValue {
    CellValue::Number(value)
}

fn e() -> CellValue {
    CellValue::Empty
}

fn date(y: i32, m: u32, d: u32) -> CellValue {
    CellValue::DateTime(
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap(),
    )
}

/// Title row, main header, employee sub-header, then three shifts with a blank line.
fn cargo_grid() -> SheetGrid {
    SheetGrid::from_rows(vec![
        vec![t("Отчёт по складу")],
        vec![
            t("Дата"),
            t("Время"),
            t("№ смены"),
            t("Грузооборот всего"),
            e(),
            e(),
            e(),
        ],
        vec![
            e(),
            e(),
            e(),
            e(),
            t("Старший смены"),
            t("Кладовщик"),
            t("Всего сотрудников"),
        ],
        vec![date(2024, 1, 5), t("6:00-18:00"), t("А"), n(100.0), n(1.0), n(2.0), n(3.0)],
        vec![e(), t("18:00-6:00"), t("Б"), n(80.0), n(1.0), n(1.0), n(2.0)],
        vec![],
        vec![date(2024, 1, 6), t("6.00 - 18.00"), t("1"), n(90.0), n(2.0), n(2.0), n(4.0)],
    ])
}

fn cells(table: &RawTable, column: &str) -> Vec<CellValue> {
    table
        .column(column)
        .unwrap_or_else(|| panic!("missing column {column}"))
        .cells
        .clone()
}

#[test]
fn locates_header_below_title_rows() {
    let index = locate_header_row(&cargo_grid(), &SheetLayout::default()).expect("header");
    assert_eq!(index, 1);
}

#[test]
fn header_labels_match_in_any_order_after_trimming() {
    let grid = SheetGrid::from_rows(vec![
        vec![t("x"), t(" № смены "), e(), t("Дата"), t("Время  ")],
        vec![t("Дата"), t("Время"), t("№ смены")],
    ]);
    assert_eq!(locate_header_row(&grid, &SheetLayout::default()).unwrap(), 0);
}

#[test]
fn header_outside_scan_window_reports_preview() {
    let mut rows: Vec<Vec<CellValue>> = (0..5).map(|idx| vec![n(idx as f64)]).collect();
    rows.push(vec![t("Дата"), t("Время"), t("№ смены")]);
    let grid = SheetGrid::from_rows(rows);

    let err = locate_header_row(&grid, &SheetLayout::default()).unwrap_err();
    assert!(err.is_structural());
    match err {
        ParserError::HeaderNotFound {
            scanned, preview, ..
        } => {
            assert_eq!(scanned, 5);
            assert_eq!(preview.len(), 5);
            assert_eq!(preview[3][0], "3");
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn header_requires_all_three_labels() {
    let grid = SheetGrid::from_rows(vec![vec![t("Дата"), t("Время"), t("Смена")]]);
    assert!(matches!(
        locate_header_row(&grid, &SheetLayout::default()),
        Err(ParserError::HeaderNotFound { .. })
    ));
}

#[test]
fn blank_header_cells_become_placeholders_and_duplicates_are_suffixed() {
    let grid = SheetGrid::from_rows(vec![
        vec![t("A"), e(), t("A"), t("A")],
        vec![n(1.0), n(2.0), n(3.0), n(4.0)],
    ]);
    let table = table_with_header(&grid, 0);
    assert_eq!(table.column_names(), vec!["A", "Unnamed: 1", "A.1", "A.2"]);
    assert!(table.columns()[1].placeholder);
    assert_eq!(table.height(), 1);
}

#[test]
fn main_table_drops_blank_rows_and_placeholder_columns() {
    let table = load_main_table(&cargo_grid(), 1);

    assert_eq!(
        table.column_names(),
        vec!["Дата", "Время", "№ смены", "Грузооборот всего"]
    );
    // Sub-header row, two shifts and the shift after the blank line.
    assert_eq!(table.height(), 4);
    assert_eq!(
        cells(&table, "Дата"),
        vec![e(), date(2024, 1, 5), e(), date(2024, 1, 6)]
    );
}

#[test]
fn employee_table_keeps_allow_listed_columns_in_allow_list_order() {
    let layout = SheetLayout::default();
    let table = load_employee_table(&cargo_grid(), 1, &layout.employee_columns);

    assert_eq!(
        table.column_names(),
        vec!["Старший смены", "Кладовщик", "Всего сотрудников"]
    );
    assert_eq!(table.height(), 4);
    assert_eq!(
        cells(&table, "Всего сотрудников"),
        vec![n(3.0), n(2.0), e(), n(4.0)]
    );
}

#[test]
fn merge_attaches_employee_columns_by_row_position() {
    let layout = SheetLayout::default();
    let grid = cargo_grid();
    let main = load_main_table(&grid, 1);
    let employees = load_employee_table(&grid, 1, &layout.employee_columns);

    let merged = merge_dual_headers(&grid, 1, &layout).expect("merge");

    assert_eq!(merged.width(), 7);
    assert_eq!(merged.height(), 4);
    for name in ["Старший смены", "Кладовщик", "Всего сотрудников"] {
        assert_eq!(cells(&merged, name), cells(&employees, name));
    }
    assert_eq!(cells(&merged, "Время"), cells(&main, "Время"));
}

#[test]
fn merge_truncates_both_tables_to_the_shorter_row_count() {
    let layout = SheetLayout::default();
    let grid = SheetGrid::from_rows(vec![
        vec![t("Дата"), t("Время"), t("№ смены"), e()],
        vec![e(), e(), e(), t("Всего сотрудников")],
        vec![t("2024-01-01"), t("6:00-18:00"), t("1"), n(5.0)],
        vec![e(), e(), e(), n(6.0)],
        vec![e(), e(), e(), n(7.0)],
    ]);

    // Main reads four rows (the sub-header row included); the employee table reads three.
    assert_eq!(load_main_table(&grid, 0).height(), 4);
    let merged = merge_dual_headers(&grid, 0, &layout).expect("merge");
    assert_eq!(merged.height(), 3);
    assert_eq!(
        cells(&merged, "Всего сотрудников"),
        vec![n(5.0), n(6.0), n(7.0)]
    );
    assert_eq!(cells(&merged, "№ смены"), vec![e(), t("1"), e()]);
}

#[test]
fn merge_without_employee_sub_header_returns_main_table() {
    let layout = SheetLayout::default();
    let grid = SheetGrid::from_rows(vec![
        vec![t("Дата"), t("Время"), t("№ смены")],
        vec![t("2024-01-01"), t("6:00-18:00"), t("1")],
        vec![t("2024-01-02"), t("18:00-6:00"), t("2")],
    ]);
    let merged = merge_dual_headers(&grid, 0, &layout).expect("merge");
    assert_eq!(merged.column_names(), vec!["Дата", "Время", "№ смены"]);
    assert_eq!(merged.height(), 2);
}

#[test]
fn employee_column_with_main_header_name_is_replaced_in_place() {
    let layout = SheetLayout::default();
    let grid = SheetGrid::from_rows(vec![
        vec![t("Дата"), t("Всего сотрудников"), t("Время"), t("№ смены")],
        vec![e(), t("Всего сотрудников"), e(), e()],
        vec![t("2024-01-01"), n(9.0), t("6:00-18:00"), t("1")],
    ]);
    let merged = merge_dual_headers(&grid, 0, &layout).expect("merge");
    assert_eq!(
        merged.column_names(),
        vec!["Дата", "Всего сотрудников", "Время", "№ смены"]
    );
    assert_eq!(cells(&merged, "Всего сотрудников"), vec![n(9.0)]);
}

#[test]
fn require_columns_lists_missing_and_found() {
    let table = RawTable::new(vec![RawColumn::new("Дата", vec![e()])]).unwrap();
    let err = table.require_columns(&["Дата", "Время"]).unwrap_err();
    match err {
        ParserError::MissingColumns { missing, found } => {
            assert_eq!(missing, vec!["Время".to_string()]);
            assert_eq!(found, vec!["Дата".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn raw_table_rejects_ragged_columns() {
    let result = RawTable::new(vec![
        RawColumn::new("a", vec![e(), e()]),
        RawColumn::new("b", vec![e()]),
    ]);
    assert!(matches!(result, Err(ParserError::Validation { .. })));
}

#[test]
fn load_cargo_sheet_rejects_empty_grid() {
    let err = load_cargo_sheet(&SheetGrid::default(), &SheetLayout::default()).unwrap_err();
    assert!(matches!(err, ParserError::EmptySheet { .. }));
    assert!(!err.is_structural());
}

#[test]
fn excel_serials_convert_to_timestamps() {
    let noon = excel_serial_to_datetime(45296.5).expect("valid serial");
    assert_eq!(noon.date(), NaiveDate::from_ymd_opt(2024, 1, 5).unwrap());
    assert_eq!(noon.format("%H:%M").to_string(), "12:00");
    assert!(excel_serial_to_datetime(f64::NAN).is_none());
}

#[test]
fn grid_is_anchored_at_a1() {
    let mut range: Range<Data> = Range::new((2, 1), (3, 2));
    range.set_value((2, 1), Data::String("Дата".into()));
    range.set_value((3, 2), Data::Float(4.0));

    let grid = grid_from_range(&range);
    assert_eq!(grid.height(), 4);
    assert_eq!(grid.width(), 3);
    assert_eq!(grid.row(2).unwrap()[1], t("Дата"));
    assert_eq!(grid.row(3).unwrap()[2], n(4.0));
    assert!(grid.row(0).unwrap().iter().all(CellValue::is_empty));
}

#[test]
fn reads_cargo_sheet_from_xlsx_file() -> Result<(), Box<dyn std::error::Error>> {
    use rust_xlsxwriter::{Format, Workbook};

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("depot.xlsx");

    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();
    sheet.set_name("Грузооборот")?;
    sheet.write_string(0, 0, "Дата")?;
    sheet.write_string(0, 1, "Время")?;
    sheet.write_string(0, 2, "№ смены")?;
    sheet.write_string(0, 3, "Грузооборот всего")?;
    sheet.write_string(1, 4, "Всего сотрудников")?;
    sheet.write_number_with_format(2, 0, 45296.0, &date_format)?;
    sheet.write_string(2, 1, "6:00-18:00")?;
    sheet.write_string(2, 2, "А")?;
    sheet.write_number(2, 3, 120.0)?;
    sheet.write_number(2, 4, 6.0)?;
    sheet.write_number_with_format(3, 0, 45297.0, &date_format)?;
    sheet.write_string(3, 1, "18:00-6:00")?;
    sheet.write_string(3, 2, "Б")?;
    sheet.write_number(3, 3, 80.0)?;
    sheet.write_number(3, 4, 5.0)?;
    workbook.save(&path)?;

    let table = load_workbook_path(&path, &SheetLayout::default())?;
    assert_eq!(
        table.column_names(),
        vec!["Дата", "Время", "№ смены", "Грузооборот всего", "Всего сотрудников"]
    );
    assert_eq!(table.height(), 2);
    assert_eq!(cells(&table, "Дата")[1], date(2024, 1, 5));
    assert_eq!(cells(&table, "Грузооборот всего")[1], n(120.0));
    assert_eq!(cells(&table, "Всего сотрудников"), vec![n(6.0), n(5.0)]);

    let bytes = std::fs::read(&path)?;
    let from_bytes = load_workbook_bytes(&bytes, &SheetLayout::default())?;
    assert_eq!(from_bytes, table);
    Ok(())
}

#[test]
fn missing_sheet_is_a_read_error() -> Result<(), Box<dyn std::error::Error>> {
    use rust_xlsxwriter::Workbook;

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("other.xlsx");
    let mut workbook = Workbook::new();
    workbook.add_worksheet().set_name("Sheet1")?;
    workbook.save(&path)?;

    let err = load_workbook_path(&path, &SheetLayout::default()).unwrap_err();
    assert!(!err.is_structural());
    match err {
        ParserError::SheetNotFound { sheet, available } => {
            assert_eq!(sheet, "Грузооборот");
            assert_eq!(available, vec!["Sheet1".to_string()]);
        }
        other => panic!("unexpected error {other:?}"),
    }
    Ok(())
}

#[test]
fn corrupt_bytes_are_a_read_error() {
    let err = load_workbook_bytes(b"not a workbook", &SheetLayout::default()).unwrap_err();
    assert!(matches!(err, ParserError::Workbook { .. }));
}

#[test]
fn unreadable_path_is_a_read_error() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let err = load_workbook_path(dir.path().join("absent.xlsx"), &SheetLayout::default())
        .unwrap_err();
    assert!(matches!(err, ParserError::Workbook { .. }));
    assert!(!err.is_structural());
    Ok(())
}
