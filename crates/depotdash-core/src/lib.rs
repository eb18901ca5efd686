pub mod aggregate;
pub mod anomaly;
pub mod config;
pub mod error;
pub mod export;
pub mod filter;
pub mod hierarchy;
pub mod metrics;
pub mod normalize;
pub mod pipeline;
pub mod reshape;
pub mod schema;
pub mod table;
pub mod trend;

pub use aggregate::{
    kpi_summary, shift_aggregates, shift_cards, shift_means, shift_totals, KpiSummary,
    ShiftAggregate, ShiftCard,
};
pub use anomaly::{detect_anomalies, AnomalyKind, AnomalyRecord, AnomalyReport, AnomalyStats};
pub use config::{AnomalyDefaults, DashboardConfig, MetricLabels};
pub use error::{DashboardError, Result};
pub use export::{anomalies_csv_bytes, export_anomalies_csv, write_anomaly_csv};
pub use filter::{apply_filters, FilterSet};
pub use hierarchy::{DateHierarchy, DateSelection};
pub use metrics::MetricGroups;
pub use normalize::{normalize, NormalizationReport};
pub use pipeline::{
    build_dataset, load_dataset_bytes, load_dataset_path, Analysis, AnalysisParams, Dataset,
};
pub use reshape::{dynamics_frame, melt_long};
pub use table::{CanonicalTable, MetricColumn};
pub use trend::{fit_linear_trend, trend_for_metric, TrendFit, TrendSeries};
