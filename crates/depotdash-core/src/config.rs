use std::fs;
use std::path::Path;

use depotdash_parser::layout::DEFAULT_EMPLOYEE_COLUMNS;
use depotdash_parser::SheetLayout;
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub const DEFAULT_ANOMALY_THRESHOLD: f64 = 2.0;

/// Labels of the optional analytical columns. A label that does not occur in a given
/// file simply disables the charts and aggregates that depend on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricLabels {
    pub turnover: String,
    pub unloaded_vehicles: String,
    pub loaded_vehicles: String,
    pub vehicles: Vec<String>,
    pub pallets: Vec<String>,
    pub employees: Vec<String>,
    pub total_employees: String,
}

impl Default for MetricLabels {
    fn default() -> Self {
        Self {
            turnover: "Грузооборот всего".to_string(),
            unloaded_vehicles: "Разгружено машин".to_string(),
            loaded_vehicles: "Загружено машин".to_string(),
            vehicles: [
                "Разгружено машин",
                "Загружено машин",
                "Разгружено тракторов",
                "Загружено тракторов",
            ]
            .iter()
            .map(|label| label.to_string())
            .collect(),
            pallets: ["Принято паллет", "Отгружено паллет", "Паллет без системы"]
                .iter()
                .map(|label| label.to_string())
                .collect(),
            employees: DEFAULT_EMPLOYEE_COLUMNS
                .iter()
                .map(|label| label.to_string())
                .collect(),
            total_employees: "Всего сотрудников".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnomalyDefaults {
    pub threshold: f64,
    /// Metric analysed when none is chosen; the turnover column when unset.
    pub metric: Option<String>,
}

impl Default for AnomalyDefaults {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_ANOMALY_THRESHOLD,
            metric: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub layout: SheetLayout,
    pub metrics: MetricLabels,
    pub anomaly: AnomalyDefaults,
}

impl DashboardConfig {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn anomaly_metric(&self) -> &str {
        self.anomaly
            .metric
            .as_deref()
            .unwrap_or(self.metrics.turnover.as_str())
    }
}
