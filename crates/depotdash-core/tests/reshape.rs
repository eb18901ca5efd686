use chrono::NaiveDate;
use depotdash_core::reshape::{dynamics_frame, melt_long};
use depotdash_core::schema::{DATE_TIME_KEY, VALUE, VARIABLE};
use depotdash_core::table::{CanonicalTable, MetricColumn};
use depotdash_core::DashboardError;
use polars::prelude::*;

fn table() -> CanonicalTable {
    let day = |d: u32| NaiveDate::from_ymd_opt(2024, 7, d).unwrap();
    CanonicalTable::from_parts(
        vec![day(2), day(1)],
        vec![Some("6:00-18:00".to_string()), Some("6:00-18:00".to_string())],
        vec!["1".to_string(), "2".to_string()],
        vec![
            MetricColumn {
                name: "Принято паллет".to_string(),
                values: vec![Some(4.0), None],
            },
            MetricColumn {
                name: "Отгружено паллет".to_string(),
                values: vec![Some(6.0), Some(8.0)],
            },
        ],
    )
    .unwrap()
}

#[test]
fn melt_orders_rows_by_variable_then_record() -> PolarsResult<()> {
    let long = melt_long(
        table().dataframe(),
        &["shift_number"],
        &["Принято паллет", "Отгружено паллет"],
    )
    .unwrap();

    assert_eq!(
        long.get_column_names_str(),
        vec!["shift_number", VARIABLE, VALUE]
    );
    let variables: Vec<Option<&str>> = long.column(VARIABLE)?.str()?.into_iter().collect();
    assert_eq!(
        variables,
        vec![
            Some("Принято паллет"),
            Some("Принято паллет"),
            Some("Отгружено паллет"),
            Some("Отгружено паллет"),
        ]
    );
    let values: Vec<Option<f64>> = long.column(VALUE)?.f64()?.into_iter().collect();
    assert_eq!(values, vec![Some(4.0), None, Some(6.0), Some(8.0)]);
    let ids: Vec<Option<&str>> = long.column("shift_number")?.str()?.into_iter().collect();
    assert_eq!(ids, vec![Some("1"), Some("2"), Some("1"), Some("2")]);
    Ok(())
}

#[test]
fn melt_without_value_columns_is_empty() {
    let long = melt_long(table().dataframe(), &["shift_number"], &[]).unwrap();
    assert_eq!(long.height(), 0);
    assert_eq!(long.width(), 3);
}

#[test]
fn melt_rejects_unknown_columns() {
    let err = melt_long(table().dataframe(), &["shift_number"], &["missing"]).unwrap_err();
    assert!(matches!(err, DashboardError::UnknownColumn(name) if name == "missing"));
}

#[test]
fn dynamics_frame_is_sorted_by_date_time_key() -> PolarsResult<()> {
    let long = dynamics_frame(&table(), &["Отгружено паллет"]).unwrap();
    let keys: Vec<Option<&str>> = long.column(DATE_TIME_KEY)?.str()?.into_iter().collect();
    assert_eq!(
        keys,
        vec![Some("2024-07-01 6:00-18:00"), Some("2024-07-02 6:00-18:00")]
    );
    let values: Vec<Option<f64>> = long.column(VALUE)?.f64()?.into_iter().collect();
    assert_eq!(values, vec![Some(8.0), Some(6.0)]);
    Ok(())
}
