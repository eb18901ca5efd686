use serde::Serialize;

use crate::error::Result;
use crate::table::CanonicalTable;

/// Ordinary least-squares line through (sequence index, value).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendFit {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
    /// Number of non-missing values the line was fitted to.
    pub points: usize,
    /// Fitted value at every sequence index, missing inputs included.
    pub fitted: Vec<f64>,
}

impl TrendFit {
    pub fn value_at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Fits `y = slope * x + intercept` with `x` the position in `values`. Missing values
/// are skipped but keep their position. `None` when fewer than two values are present.
pub fn fit_linear_trend(values: &[Option<f64>]) -> Option<TrendFit> {
    let points: Vec<(f64, f64)> = values
        .iter()
        .enumerate()
        .filter_map(|(idx, value)| value.map(|y| (idx as f64, y)))
        .collect();
    if points.len() < 2 {
        return None;
    }

    let n = points.len() as f64;
    let (sum_x, sum_y, sum_xy, sum_xx) = points.iter().fold(
        (0.0, 0.0, 0.0, 0.0),
        |(sx, sy, sxy, sxx), (x, y)| (sx + x, sy + y, sxy + x * y, sxx + x * x),
    );

    let denominator = n * sum_xx - sum_x * sum_x;
    if denominator == 0.0 {
        return None;
    }
    let slope = (n * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / n;

    let mean_y = sum_y / n;
    let (ss_res, ss_tot) = points.iter().fold((0.0, 0.0), |(res, tot), (x, y)| {
        let predicted = slope * x + intercept;
        (res + (y - predicted).powi(2), tot + (y - mean_y).powi(2))
    });
    let r_squared = if ss_tot == 0.0 { 0.0 } else { 1.0 - ss_res / ss_tot };

    let fitted = (0..values.len())
        .map(|idx| slope * idx as f64 + intercept)
        .collect();

    Some(TrendFit {
        slope,
        intercept,
        r_squared,
        points: points.len(),
        fitted,
    })
}

/// A metric in `date_time_key` order together with its trend line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendSeries {
    pub metric: String,
    pub keys: Vec<String>,
    pub values: Vec<Option<f64>>,
    pub fit: Option<TrendFit>,
}

pub fn trend_for_metric(view: &CanonicalTable, metric: &str) -> Result<TrendSeries> {
    let sorted = view.sorted_by_date_time_key()?;
    let values = sorted.metric_values(metric)?;
    let fit = fit_linear_trend(&values);
    Ok(TrendSeries {
        metric: metric.to_string(),
        keys: sorted.date_time_keys()?,
        values,
        fit,
    })
}
