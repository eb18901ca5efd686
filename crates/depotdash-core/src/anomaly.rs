//! Standard-deviation outlier detection over the filtered view.
//!
//! Mean and standard deviation are population statistics of the non-missing values.
//! A value is flagged only when it lies strictly beyond `mean ± threshold·σ`, so a
//! value sitting exactly on a bound is not an anomaly.

use std::fmt;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::Serialize;
use tracing::debug;

use crate::error::{DashboardError, Result};
use crate::schema::{
    ANOMALY_KIND, DATE, DEVIATION, DEVIATION_IN_SIGMA, SHIFT_NUMBER, SHIFT_TIME,
};
use crate::table::{days_since_epoch, CanonicalTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnomalyKind {
    High,
    Low,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnomalyKind::High => f.write_str("High"),
            AnomalyKind::Low => f.write_str("Low"),
        }
    }
}

/// A flagged canonical record. `row` is its position in the analysed view and
/// `metrics` holds every metric column of that row, in table order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyRecord {
    pub row: usize,
    pub date: NaiveDate,
    pub shift_time: Option<String>,
    pub shift_number: String,
    pub date_time_key: String,
    pub value: f64,
    pub kind: AnomalyKind,
    pub deviation: f64,
    pub deviation_in_sigma: f64,
    pub metrics: Vec<(String, Option<f64>)>,
}

impl AnomalyRecord {
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|(column, _)| column == name)
            .and_then(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AnomalyStats {
    pub mean: f64,
    pub std_dev: f64,
    pub upper_bound: f64,
    pub lower_bound: f64,
}

impl AnomalyStats {
    fn from_values(values: &[f64], threshold: f64) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
        let std_dev = variance.sqrt();
        Some(Self {
            mean,
            std_dev,
            upper_bound: mean + threshold * std_dev,
            lower_bound: mean - threshold * std_dev,
        })
    }

    fn classify(&self, value: f64) -> Option<AnomalyKind> {
        if value > self.upper_bound {
            Some(AnomalyKind::High)
        } else if value < self.lower_bound {
            Some(AnomalyKind::Low)
        } else {
            None
        }
    }
}

/// Flagged records, largest |deviation_in_sigma| first. `stats` is `None` when the
/// metric column is absent or holds no values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnomalyReport {
    pub metric: String,
    pub threshold: f64,
    pub stats: Option<AnomalyStats>,
    pub records: Vec<AnomalyRecord>,
}

impl AnomalyReport {
    fn empty(metric: &str, threshold: f64) -> Self {
        Self {
            metric: metric.to_string(),
            threshold,
            stats: None,
            records: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Display table: date, shift time, shift number, the metric, kind, deviation and
    /// deviation in σ.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let days: Vec<i32> = self
            .records
            .iter()
            .map(|record| days_since_epoch(record.date))
            .collect();
        let columns: Vec<Column> = vec![
            Series::new(DATE.into(), days).cast(&DataType::Date)?.into(),
            Series::new(
                SHIFT_TIME.into(),
                self.records
                    .iter()
                    .map(|record| record.shift_time.as_deref())
                    .collect::<Vec<Option<&str>>>(),
            )
            .into(),
            Series::new(
                SHIFT_NUMBER.into(),
                self.records
                    .iter()
                    .map(|record| record.shift_number.as_str())
                    .collect::<Vec<&str>>(),
            )
            .into(),
            Series::new(
                self.metric.as_str().into(),
                self.records.iter().map(|record| record.value).collect::<Vec<f64>>(),
            )
            .into(),
            Series::new(
                ANOMALY_KIND.into(),
                self.records
                    .iter()
                    .map(|record| record.kind.to_string())
                    .collect::<Vec<String>>(),
            )
            .into(),
            Series::new(
                DEVIATION.into(),
                self.records.iter().map(|record| record.deviation).collect::<Vec<f64>>(),
            )
            .into(),
            Series::new(
                DEVIATION_IN_SIGMA.into(),
                self.records
                    .iter()
                    .map(|record| record.deviation_in_sigma)
                    .collect::<Vec<f64>>(),
            )
            .into(),
        ];
        Ok(DataFrame::new(columns)?)
    }
}

pub fn validate_threshold(threshold: f64) -> Result<f64> {
    if threshold.is_finite() && threshold > 0.0 {
        Ok(threshold)
    } else {
        Err(DashboardError::InvalidThreshold(threshold))
    }
}

/// Flags records of `view` whose `metric` value lies outside `mean ± threshold·σ`.
/// An absent metric column yields an empty report.
pub fn detect_anomalies(view: &CanonicalTable, metric: &str, threshold: f64) -> Result<AnomalyReport> {
    let threshold = validate_threshold(threshold)?;
    if !view.has_metric(metric) {
        debug!(metric, "anomaly metric absent from the dataset");
        return Ok(AnomalyReport::empty(metric, threshold));
    }

    let values = view.metric_values(metric)?;
    let present: Vec<f64> = values.iter().flatten().copied().collect();
    let Some(stats) = AnomalyStats::from_values(&present, threshold) else {
        return Ok(AnomalyReport::empty(metric, threshold));
    };

    let dates = view.dates()?;
    let times = view.shift_times()?;
    let numbers = view.shift_numbers()?;
    let keys = view.date_time_keys()?;
    let columns: Vec<(String, Vec<Option<f64>>)> = view
        .numeric_columns()
        .iter()
        .map(|name| Ok((name.clone(), view.metric_values(name)?)))
        .collect::<Result<_>>()?;

    let mut records: Vec<AnomalyRecord> = Vec::new();
    for (idx, value) in values.iter().enumerate() {
        let Some(value) = *value else {
            continue;
        };
        let Some(kind) = stats.classify(value) else {
            continue;
        };
        let deviation = value - stats.mean;
        records.push(AnomalyRecord {
            row: idx,
            date: dates[idx],
            shift_time: times[idx].clone(),
            shift_number: numbers[idx].clone(),
            date_time_key: keys[idx].clone(),
            value,
            kind,
            deviation,
            // Zero σ cannot reach here: every value equals the mean.
            deviation_in_sigma: deviation / stats.std_dev,
            metrics: columns
                .iter()
                .map(|(name, column)| (name.clone(), column[idx]))
                .collect(),
        });
    }
    records.sort_by(|a, b| {
        b.deviation_in_sigma
            .abs()
            .total_cmp(&a.deviation_in_sigma.abs())
    });

    debug!(metric, flagged = records.len(), "anomaly detection finished");
    Ok(AnomalyReport {
        metric: metric.to_string(),
        threshold,
        stats: Some(stats),
        records,
    })
}
