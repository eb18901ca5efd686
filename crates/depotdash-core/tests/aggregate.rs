use chrono::NaiveDate;
use depotdash_core::aggregate::{
    kpi_summary, shift_aggregates, shift_cards, shift_means, shift_totals,
};
use depotdash_core::config::MetricLabels;
use depotdash_core::metrics::MetricGroups;
use depotdash_core::schema::{EFFICIENCY, RECORDS, SHIFT_NUMBER};
use depotdash_core::table::{CanonicalTable, MetricColumn};
use polars::prelude::*;

const TURNOVER: &str = "Грузооборот всего";
const EMPLOYEES: &str = "Всего сотрудников";
const UNLOADED: &str = "Разгружено машин";
const LOADED: &str = "Загружено машин";
const RECEIVED: &str = "Принято паллет";

fn metric(name: &str, values: Vec<Option<f64>>) -> MetricColumn {
    MetricColumn {
        name: name.to_string(),
        values,
    }
}

fn table(metrics: Vec<MetricColumn>) -> CanonicalTable {
    let rows = metrics.first().map_or(0, |metric| metric.values.len());
    let day = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
    let numbers = ["1", "2", "1", "3"];
    CanonicalTable::from_parts(
        vec![day; rows],
        vec![Some("6:00-18:00".to_string()); rows],
        numbers[..rows].iter().map(|n| n.to_string()).collect(),
        metrics,
    )
    .unwrap()
}

fn full_table() -> CanonicalTable {
    table(vec![
        metric(UNLOADED, vec![Some(2.0), Some(1.0), Some(3.0), None]),
        metric(LOADED, vec![Some(1.0), Some(1.0), Some(1.0), Some(4.0)]),
        metric(RECEIVED, vec![Some(10.0), None, Some(5.0), Some(1.0)]),
        metric(TURNOVER, vec![Some(100.0), Some(50.0), Some(60.0), Some(30.0)]),
        metric(EMPLOYEES, vec![Some(4.0), Some(0.0), Some(6.0), None]),
    ])
}

#[test]
fn metric_groups_detect_present_columns_only() {
    let groups = MetricGroups::detect(&full_table(), &MetricLabels::default());
    assert_eq!(groups.turnover.as_deref(), Some(TURNOVER));
    assert_eq!(groups.vehicles, vec![UNLOADED, LOADED]);
    assert_eq!(groups.pallets, vec![RECEIVED]);
    assert_eq!(groups.employees, vec![EMPLOYEES]);
    assert!(groups.supports_efficiency());
    assert_eq!(
        groups.summed_columns(),
        vec![UNLOADED, LOADED, RECEIVED, EMPLOYEES, TURNOVER]
    );
}

#[test]
fn totals_sum_per_present_shift_with_efficiency() -> PolarsResult<()> {
    let view = full_table();
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let totals = shift_totals(&view, &groups).unwrap();

    assert_eq!(totals.height(), 3);
    let numbers: Vec<Option<&str>> = totals.column(SHIFT_NUMBER)?.str()?.into_iter().collect();
    assert_eq!(numbers, vec![Some("1"), Some("2"), Some("3")]);

    let turnover: Vec<Option<f64>> = totals.column(TURNOVER)?.f64()?.into_iter().collect();
    assert_eq!(turnover, vec![Some(160.0), Some(50.0), Some(30.0)]);

    let records: Vec<Option<u32>> = totals.column(RECORDS)?.u32()?.into_iter().collect();
    assert_eq!(records, vec![Some(2), Some(1), Some(1)]);

    // Shift 2 has zero employees and shift 3 only a missing value, which sums to zero.
    let efficiency: Vec<Option<f64>> = totals.column(EFFICIENCY)?.f64()?.into_iter().collect();
    assert_eq!(efficiency, vec![Some(16.0), None, None]);
    Ok(())
}

#[test]
fn absent_shift_numbers_get_no_synthetic_rows() {
    let view = table(vec![metric(TURNOVER, vec![Some(1.0), Some(2.0), Some(3.0)])]);
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let aggregates = shift_aggregates(&view, &groups).unwrap();
    let numbers: Vec<&str> = aggregates.iter().map(|a| a.shift_number.as_str()).collect();
    assert_eq!(numbers, vec!["1", "2"]);
    assert!(aggregates.iter().all(|a| a.efficiency.is_none()));
}

#[test]
fn efficiency_column_is_omitted_without_employee_totals() {
    let view = table(vec![metric(TURNOVER, vec![Some(1.0), Some(2.0)])]);
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let totals = shift_totals(&view, &groups).unwrap();
    assert!(totals.column(EFFICIENCY).is_err());
    assert!(totals.column(TURNOVER).is_ok());
}

#[test]
fn means_are_unrounded() -> PolarsResult<()> {
    let view = full_table();
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let means = shift_means(&view, &groups).unwrap();

    let employees: Vec<Option<f64>> = means.column(EMPLOYEES)?.f64()?.into_iter().collect();
    assert_eq!(employees, vec![Some(5.0), Some(0.0), None]);

    let unloaded: Vec<Option<f64>> = means.column(UNLOADED)?.f64()?.into_iter().collect();
    assert_eq!(unloaded, vec![Some(2.5), Some(1.0), None]);
    Ok(())
}

#[test]
fn shift_cards_combine_groups_and_report_absent_ones() {
    let view = full_table();
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let cards = shift_cards(&view, &groups).unwrap();

    assert_eq!(cards.len(), 3);
    let first = &cards[0];
    assert_eq!(first.shift_number, "1");
    assert_eq!(first.records, 2);
    assert_eq!(first.vehicles, Some(7.0));
    assert_eq!(first.pallets, Some(15.0));
    assert_eq!(first.turnover, Some(160.0));
    assert_eq!(first.employees, Some(10.0));

    let sparse = table(vec![metric(TURNOVER, vec![Some(5.0)])]);
    let groups = MetricGroups::detect(&sparse, &MetricLabels::default());
    let cards = shift_cards(&sparse, &groups).unwrap();
    assert_eq!(cards[0].vehicles, None);
    assert_eq!(cards[0].pallets, None);
    assert_eq!(cards[0].employees, None);
    assert_eq!(cards[0].turnover, Some(5.0));
}

#[test]
fn kpi_summary_treats_missing_columns_as_zero() {
    let view = full_table();
    let groups = MetricGroups::detect(&view, &MetricLabels::default());
    let kpis = kpi_summary(&view, &groups).unwrap();
    assert_eq!(kpis.records, 4);
    assert_eq!(kpis.total_turnover, 240.0);
    assert_eq!(kpis.mean_turnover, 60.0);
    assert_eq!(kpis.unloaded_vehicles, 6.0);
    assert_eq!(kpis.loaded_vehicles, 7.0);

    let sparse = table(vec![metric(RECEIVED, vec![Some(1.0), Some(2.0)])]);
    let groups = MetricGroups::detect(&sparse, &MetricLabels::default());
    let kpis = kpi_summary(&sparse, &groups).unwrap();
    assert_eq!(kpis.records, 2);
    assert_eq!(kpis.total_turnover, 0.0);
    assert_eq!(kpis.mean_turnover, 0.0);
    assert_eq!(kpis.unloaded_vehicles, 0.0);
}
