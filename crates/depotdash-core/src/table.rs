use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate};
use depotdash_parser::{CellValue, RawColumn, RawTable, SheetLayout};
use polars::prelude::*;

use crate::error::{DashboardError, Result};
use crate::schema::{DATE, DATE_TIME_KEY, SHIFT_NUMBER, SHIFT_TIME};

/// `NaiveDate::num_days_from_ce` of 1970-01-01, the zero point of polars dates.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

#[derive(Debug, Clone, PartialEq)]
pub struct MetricColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

/// The cleaned, typed table every analysis reads from.
///
/// Column order: `date` (Date, never null), `shift_time` (String, nullable),
/// `shift_number` (String, one of "1".."4"), the metric columns in source order
/// (Float64, nullable, named by their sheet labels) and `date_time_key` last.
#[derive(Debug, Clone)]
pub struct CanonicalTable {
    df: DataFrame,
    metrics: Vec<String>,
}

impl CanonicalTable {
    pub fn from_parts(
        dates: Vec<NaiveDate>,
        shift_times: Vec<Option<String>>,
        shift_numbers: Vec<String>,
        metrics: Vec<MetricColumn>,
    ) -> Result<Self> {
        let keys: Vec<String> = dates
            .iter()
            .zip(&shift_times)
            .map(|(date, time)| date_time_key(*date, time.as_deref()))
            .collect();

        let days: Vec<i32> = dates.iter().map(|date| days_since_epoch(*date)).collect();
        let date_series = Series::new(DATE.into(), days).cast(&DataType::Date)?;

        let mut columns: Vec<Column> = Vec::with_capacity(metrics.len() + 4);
        columns.push(date_series.into());
        columns.push(
            Series::new(
                SHIFT_TIME.into(),
                shift_times
                    .iter()
                    .map(|opt| opt.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            )
            .into(),
        );
        columns.push(Series::new(SHIFT_NUMBER.into(), shift_numbers).into());

        let names: Vec<String> = metrics.iter().map(|metric| metric.name.clone()).collect();
        for metric in metrics {
            columns.push(Series::new(metric.name.as_str().into(), metric.values).into());
        }
        columns.push(Series::new(DATE_TIME_KEY.into(), keys).into());

        Ok(Self {
            df: DataFrame::new(columns)?,
            metrics: names,
        })
    }

    pub fn dataframe(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Metric columns selectable for dynamics and anomaly analysis, in source order.
    pub fn numeric_columns(&self) -> &[String] {
        &self.metrics
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|metric| metric == name)
    }

    pub fn dates(&self) -> Result<Vec<NaiveDate>> {
        let days = self.df.column(DATE)?.cast(&DataType::Int32)?;
        Ok(days
            .i32()?
            .into_iter()
            .flatten()
            .filter_map(date_from_days)
            .collect())
    }

    pub fn shift_times(&self) -> Result<Vec<Option<String>>> {
        Ok(self
            .df
            .column(SHIFT_TIME)?
            .str()?
            .into_iter()
            .map(|value| value.map(str::to_string))
            .collect())
    }

    pub fn shift_numbers(&self) -> Result<Vec<String>> {
        Ok(self
            .df
            .column(SHIFT_NUMBER)?
            .str()?
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect())
    }

    pub fn date_time_keys(&self) -> Result<Vec<String>> {
        Ok(self
            .df
            .column(DATE_TIME_KEY)?
            .str()?
            .into_iter()
            .map(|value| value.unwrap_or_default().to_string())
            .collect())
    }

    pub fn metric_values(&self, name: &str) -> Result<Vec<Option<f64>>> {
        if !self.has_metric(name) {
            return Err(DashboardError::UnknownColumn(name.to_string()));
        }
        Ok(self.df.column(name)?.f64()?.into_iter().collect())
    }

    /// Sorted distinct shift windows, missing values excluded.
    pub fn shift_time_options(&self) -> Result<Vec<String>> {
        let options: BTreeSet<String> = self.shift_times()?.into_iter().flatten().collect();
        Ok(options.into_iter().collect())
    }

    pub fn shift_number_options(&self) -> Result<Vec<String>> {
        let options: BTreeSet<String> = self.shift_numbers()?.into_iter().collect();
        Ok(options.into_iter().collect())
    }

    /// Rows whose mask entry is `true`, in their original order.
    pub fn filter_rows(&self, mask: &[bool]) -> Result<Self> {
        let mask = BooleanChunked::from_slice("mask".into(), mask);
        Ok(Self {
            df: self.df.filter(&mask)?,
            metrics: self.metrics.clone(),
        })
    }

    /// Stable sort by `date_time_key`; rows sharing a key keep their relative order.
    pub fn sorted_by_date_time_key(&self) -> Result<Self> {
        let df = self
            .df
            .clone()
            .lazy()
            .sort(
                [DATE_TIME_KEY],
                SortMultipleOptions::default().with_maintain_order(true),
            )
            .collect()?;
        Ok(Self {
            df,
            metrics: self.metrics.clone(),
        })
    }

    /// Renders the table back into raw cells under the sheet labels of `layout`, so it
    /// can be fed through normalization again.
    pub fn to_raw(&self, layout: &SheetLayout) -> Result<RawTable> {
        let dates: Vec<CellValue> = self
            .dates()?
            .into_iter()
            .map(|date| {
                date.and_hms_opt(0, 0, 0)
                    .map(CellValue::DateTime)
                    .unwrap_or(CellValue::Empty)
            })
            .collect();
        let times: Vec<CellValue> = self
            .shift_times()?
            .into_iter()
            .map(|time| time.map(CellValue::Text).unwrap_or(CellValue::Empty))
            .collect();
        let numbers: Vec<CellValue> = self
            .shift_numbers()?
            .into_iter()
            .map(CellValue::Text)
            .collect();

        let mut columns = vec![
            RawColumn::new(layout.date_label.as_str(), dates),
            RawColumn::new(layout.time_label.as_str(), times),
            RawColumn::new(layout.shift_number_label.as_str(), numbers),
        ];
        for name in &self.metrics {
            let cells = self
                .metric_values(name)?
                .into_iter()
                .map(|value| value.map(CellValue::Number).unwrap_or(CellValue::Empty))
                .collect();
            columns.push(RawColumn::new(name.as_str(), cells));
        }

        Ok(RawTable::new(columns)?)
    }
}

/// `"{date} {shift_time}"`, or just the date when the shift window is missing.
pub fn date_time_key(date: NaiveDate, shift_time: Option<&str>) -> String {
    match shift_time {
        Some(time) => format!("{} {time}", date.format("%Y-%m-%d")),
        None => date.format("%Y-%m-%d").to_string(),
    }
}

pub(crate) fn days_since_epoch(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub(crate) fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}
