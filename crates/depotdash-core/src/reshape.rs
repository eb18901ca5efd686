use polars::prelude::*;

use crate::error::{DashboardError, Result};
use crate::schema::{DATE_TIME_KEY, VALUE, VARIABLE};
use crate::table::CanonicalTable;

/// Wide-to-long reshape for charting: one output row per (value column, input row)
/// holding the id columns, the value column's name under `variable` and its value
/// under `value`. Rows are grouped by value column, input order within each group.
pub fn melt_long(df: &DataFrame, id_columns: &[&str], value_columns: &[&str]) -> Result<DataFrame> {
    for name in id_columns.iter().chain(value_columns) {
        if df.column(name).is_err() {
            return Err(DashboardError::UnknownColumn(name.to_string()));
        }
    }

    let ids = df.select(id_columns.iter().copied())?;
    let rows = df.height();

    let mut frames: Vec<DataFrame> = Vec::with_capacity(value_columns.len());
    for name in value_columns {
        let variable = Series::new(VARIABLE.into(), vec![*name; rows]);
        let value = df
            .column(name)?
            .as_materialized_series()
            .cast(&DataType::Float64)?
            .with_name(VALUE.into());
        frames.push(long_frame(&ids, variable, value)?);
    }

    let mut iter = frames.into_iter();
    let Some(mut combined) = iter.next() else {
        let variable = Series::new(VARIABLE.into(), Vec::<&str>::new());
        let value = Series::new(VALUE.into(), Vec::<f64>::new());
        return long_frame(&ids.clear(), variable, value);
    };
    for frame in iter {
        combined.vstack_mut(&frame)?;
    }
    Ok(combined)
}

fn long_frame(ids: &DataFrame, variable: Series, value: Series) -> Result<DataFrame> {
    let mut columns: Vec<Column> = ids.get_columns().to_vec();
    columns.push(variable.into());
    columns.push(value.into());
    Ok(DataFrame::new(columns)?)
}

/// Metric values over time in long format, ordered by `date_time_key` within each
/// metric.
pub fn dynamics_frame(view: &CanonicalTable, metrics: &[&str]) -> Result<DataFrame> {
    if let Some(unknown) = metrics.iter().find(|metric| !view.has_metric(metric)) {
        return Err(DashboardError::UnknownColumn(unknown.to_string()));
    }
    let sorted = view.sorted_by_date_time_key()?;
    melt_long(sorted.dataframe(), &[DATE_TIME_KEY], metrics)
}
