//! Per-shift aggregation of the filtered view.

use std::collections::HashMap;

use polars::prelude::*;
use serde::Serialize;

use crate::error::Result;
use crate::metrics::MetricGroups;
use crate::schema::{EFFICIENCY, RECORDS, SHIFT_NUMBER};
use crate::table::CanonicalTable;

/// One row per shift number present in `view`, holding the record count, the sum of
/// every available metric group column and, when both turnover and total employees
/// exist, `efficiency = turnover / total employees`. Efficiency is null for a shift
/// whose employee sum is zero.
pub fn shift_totals(view: &CanonicalTable, groups: &MetricGroups) -> Result<DataFrame> {
    let aggs: Vec<Expr> = groups
        .summed_columns()
        .into_iter()
        .map(|column| col(column).sum())
        .collect();
    let mut df = group_by_shift(view, aggs)?;

    if let (Some(turnover), Some(employees)) = (
        groups.turnover.as_deref(),
        groups.total_employees.as_deref(),
    ) {
        let turnover = df.column(turnover)?.f64()?;
        let employees = df.column(employees)?.f64()?;
        let efficiency: Vec<Option<f64>> = turnover
            .into_iter()
            .zip(employees.into_iter())
            .map(|(turnover, employees)| match (turnover, employees) {
                (Some(turnover), Some(employees)) if employees != 0.0 => Some(turnover / employees),
                _ => None,
            })
            .collect();
        let mut columns: [Column; 1] = [Series::new(EFFICIENCY.into(), efficiency).into()];
        df.hstack_mut(columns.as_mut_slice())?;
    }

    Ok(df)
}

/// Mean of turnover, total employees, vehicle and pallet columns per shift. Values are
/// unrounded.
pub fn shift_means(view: &CanonicalTable, groups: &MetricGroups) -> Result<DataFrame> {
    let aggs: Vec<Expr> = groups
        .mean_columns()
        .into_iter()
        .map(|column| col(column).mean())
        .collect();
    group_by_shift(view, aggs)
}

fn group_by_shift(view: &CanonicalTable, aggs: Vec<Expr>) -> Result<DataFrame> {
    let mut df = view
        .dataframe()
        .clone()
        .lazy()
        .group_by([col(SHIFT_NUMBER)])
        .agg(aggs)
        .sort([SHIFT_NUMBER], SortMultipleOptions::default())
        .collect()?;

    let mut counts: HashMap<String, u32> = HashMap::new();
    for number in view.shift_numbers()? {
        *counts.entry(number).or_insert(0) += 1;
    }
    let records: Vec<u32> = df
        .column(SHIFT_NUMBER)?
        .str()?
        .into_iter()
        .map(|number| number.and_then(|n| counts.get(n)).copied().unwrap_or(0))
        .collect();
    let mut columns: [Column; 1] = [Series::new(RECORDS.into(), records).into()];
    df.hstack_mut(columns.as_mut_slice())?;
    Ok(df)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftAggregate {
    pub shift_number: String,
    pub records: usize,
    /// Summed metric columns in [`MetricGroups::summed_columns`] order.
    pub sums: Vec<(String, f64)>,
    pub efficiency: Option<f64>,
}

impl ShiftAggregate {
    pub fn sum_of(&self, column: &str) -> Option<f64> {
        self.sums
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| *value)
    }

    fn sum_over(&self, columns: &[String]) -> Option<f64> {
        if columns.is_empty() {
            return None;
        }
        Some(columns.iter().filter_map(|column| self.sum_of(column)).sum())
    }
}

pub fn shift_aggregates(view: &CanonicalTable, groups: &MetricGroups) -> Result<Vec<ShiftAggregate>> {
    let df = shift_totals(view, groups)?;
    let numbers = df.column(SHIFT_NUMBER)?.str()?;
    let records = df.column(RECORDS)?.u32()?;
    let efficiency = if groups.supports_efficiency() {
        Some(df.column(EFFICIENCY)?.f64()?)
    } else {
        None
    };
    let summed = groups.summed_columns();
    let sums = summed
        .iter()
        .map(|column| Ok((*column, df.column(column)?.f64()?)))
        .collect::<Result<Vec<_>>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        rows.push(ShiftAggregate {
            shift_number: numbers.get(idx).unwrap_or_default().to_string(),
            records: records.get(idx).unwrap_or(0) as usize,
            sums: sums
                .iter()
                .map(|(name, values)| (name.to_string(), values.get(idx).unwrap_or(0.0)))
                .collect(),
            efficiency: efficiency.and_then(|values| values.get(idx)),
        });
    }
    Ok(rows)
}

/// Headline numbers of one shift. A group absent from the sheet reads as `None`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShiftCard {
    pub shift_number: String,
    pub records: usize,
    pub vehicles: Option<f64>,
    pub pallets: Option<f64>,
    pub turnover: Option<f64>,
    pub employees: Option<f64>,
}

pub fn shift_cards(view: &CanonicalTable, groups: &MetricGroups) -> Result<Vec<ShiftCard>> {
    Ok(shift_aggregates(view, groups)?
        .into_iter()
        .map(|aggregate| ShiftCard {
            vehicles: aggregate.sum_over(&groups.vehicles),
            pallets: aggregate.sum_over(&groups.pallets),
            turnover: groups
                .turnover
                .as_deref()
                .and_then(|column| aggregate.sum_of(column)),
            employees: groups
                .total_employees
                .as_deref()
                .and_then(|column| aggregate.sum_of(column)),
            shift_number: aggregate.shift_number,
            records: aggregate.records,
        })
        .collect())
}

/// Dashboard headline figures. Missing columns count as zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct KpiSummary {
    pub records: usize,
    pub total_turnover: f64,
    pub mean_turnover: f64,
    pub unloaded_vehicles: f64,
    pub loaded_vehicles: f64,
}

pub fn kpi_summary(view: &CanonicalTable, groups: &MetricGroups) -> Result<KpiSummary> {
    let turnover = column_values(view, groups.turnover.as_deref())?;
    Ok(KpiSummary {
        records: view.height(),
        total_turnover: safe_sum(&turnover),
        mean_turnover: safe_mean(&turnover),
        unloaded_vehicles: safe_sum(&column_values(view, groups.unloaded_vehicles.as_deref())?),
        loaded_vehicles: safe_sum(&column_values(view, groups.loaded_vehicles.as_deref())?),
    })
}

fn column_values(view: &CanonicalTable, column: Option<&str>) -> Result<Vec<Option<f64>>> {
    match column {
        Some(column) => view.metric_values(column),
        None => Ok(Vec::new()),
    }
}

pub fn safe_sum(values: &[Option<f64>]) -> f64 {
    values.iter().flatten().sum()
}

pub fn safe_mean(values: &[Option<f64>]) -> f64 {
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    if present.is_empty() {
        return 0.0;
    }
    present.iter().sum::<f64>() / present.len() as f64
}
