//! End-to-end flow: workbook → raw table → canonical table → filtered view → analyses.

use std::path::Path;

use depotdash_parser::{load_workbook_bytes, load_workbook_path, RawTable};
use polars::prelude::DataFrame;
use tracing::info;

use crate::aggregate::{kpi_summary, shift_cards, shift_means, shift_totals, KpiSummary, ShiftCard};
use crate::anomaly::{detect_anomalies, AnomalyReport};
use crate::config::DashboardConfig;
use crate::error::Result;
use crate::filter::{apply_filters, FilterSet};
use crate::hierarchy::DateHierarchy;
use crate::metrics::MetricGroups;
use crate::normalize::{normalize, NormalizationReport};
use crate::table::CanonicalTable;
use crate::trend::{trend_for_metric, TrendSeries};

/// The cleaned upload. Built once per file and read-only afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    pub table: CanonicalTable,
    pub hierarchy: DateHierarchy,
    pub groups: MetricGroups,
    pub report: NormalizationReport,
}

pub fn build_dataset(raw: &RawTable, config: &DashboardConfig) -> Result<Dataset> {
    let (table, report) = normalize(raw, &config.layout)?;
    let hierarchy = DateHierarchy::from_table(&table)?;
    let groups = MetricGroups::detect(&table, &config.metrics);
    info!(
        rows = table.height(),
        years = hierarchy.years().len(),
        "dataset ready"
    );
    Ok(Dataset {
        table,
        hierarchy,
        groups,
        report,
    })
}

pub fn load_dataset_path(path: impl AsRef<Path>, config: &DashboardConfig) -> Result<Dataset> {
    let raw = load_workbook_path(path, &config.layout)?;
    build_dataset(&raw, config)
}

pub fn load_dataset_bytes(bytes: &[u8], config: &DashboardConfig) -> Result<Dataset> {
    let raw = load_workbook_bytes(bytes, &config.layout)?;
    build_dataset(&raw, config)
}

/// Everything one dashboard refresh depends on besides the dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisParams {
    pub filters: FilterSet,
    pub anomaly_metric: String,
    pub threshold: f64,
    /// Metric whose trend is fitted; skipped when unset.
    pub trend_metric: Option<String>,
}

impl AnalysisParams {
    /// All dates and shifts, the configured anomaly metric and threshold, and a trend on
    /// turnover when the sheet has it.
    pub fn defaults(dataset: &Dataset, config: &DashboardConfig) -> Result<Self> {
        Ok(Self {
            filters: FilterSet::all_of(&dataset.table)?,
            anomaly_metric: config.anomaly_metric().to_string(),
            threshold: config.anomaly.threshold,
            trend_metric: dataset.groups.turnover.clone(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub view: CanonicalTable,
    pub kpis: KpiSummary,
    pub shift_totals: DataFrame,
    pub shift_means: DataFrame,
    pub shift_cards: Vec<ShiftCard>,
    pub trend: Option<TrendSeries>,
    pub anomalies: AnomalyReport,
}

impl Dataset {
    /// Recomputes every analysis for `params`. Fails with
    /// [`crate::DashboardError::EmptySelection`] when the filters leave nothing.
    pub fn analyze(&self, params: &AnalysisParams) -> Result<Analysis> {
        let view = apply_filters(&self.table, &params.filters)?;
        let trend = params
            .trend_metric
            .as_deref()
            .map(|metric| trend_for_metric(&view, metric))
            .transpose()?;

        Ok(Analysis {
            kpis: kpi_summary(&view, &self.groups)?,
            shift_totals: shift_totals(&view, &self.groups)?,
            shift_means: shift_means(&view, &self.groups)?,
            shift_cards: shift_cards(&view, &self.groups)?,
            trend,
            anomalies: detect_anomalies(&view, &params.anomaly_metric, params.threshold)?,
            view,
        })
    }
}
