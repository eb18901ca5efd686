//! Capability check for the optional metric groups. A group whose columns are absent
//! from the uploaded sheet is left out of every aggregate instead of failing.

use serde::Serialize;
use tracing::debug;

use crate::config::MetricLabels;
use crate::table::CanonicalTable;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricGroups {
    pub turnover: Option<String>,
    pub unloaded_vehicles: Option<String>,
    pub loaded_vehicles: Option<String>,
    pub vehicles: Vec<String>,
    pub pallets: Vec<String>,
    pub employees: Vec<String>,
    pub total_employees: Option<String>,
}

impl MetricGroups {
    pub fn detect(table: &CanonicalTable, labels: &MetricLabels) -> Self {
        let single = |label: &str| table.has_metric(label).then(|| label.to_string());
        let present = |group: &[String]| -> Vec<String> {
            group
                .iter()
                .filter(|label| table.has_metric(label))
                .cloned()
                .collect()
        };

        let groups = Self {
            turnover: single(labels.turnover.as_str()),
            unloaded_vehicles: single(labels.unloaded_vehicles.as_str()),
            loaded_vehicles: single(labels.loaded_vehicles.as_str()),
            vehicles: present(labels.vehicles.as_slice()),
            pallets: present(labels.pallets.as_slice()),
            employees: present(labels.employees.as_slice()),
            total_employees: single(labels.total_employees.as_str()),
        };

        if groups.turnover.is_none() {
            debug!(label = %labels.turnover, "turnover column absent");
        }
        if groups.vehicles.is_empty() {
            debug!("vehicle columns absent");
        }
        if groups.pallets.is_empty() {
            debug!("pallet columns absent");
        }
        if groups.employees.is_empty() {
            debug!("employee columns absent");
        }
        groups
    }

    /// Columns summed per shift: vehicles, pallets, employee roles, turnover. Each label
    /// appears once.
    pub fn summed_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        let candidates = self
            .vehicles
            .iter()
            .chain(&self.pallets)
            .chain(&self.employees)
            .chain(self.turnover.iter())
            .chain(self.total_employees.iter());
        for label in candidates {
            if !columns.contains(&label.as_str()) {
                columns.push(label);
            }
        }
        columns
    }

    /// Columns averaged per shift.
    pub fn mean_columns(&self) -> Vec<&str> {
        let mut columns: Vec<&str> = Vec::new();
        let candidates = self
            .turnover
            .iter()
            .chain(self.total_employees.iter())
            .chain(&self.vehicles)
            .chain(&self.pallets);
        for label in candidates {
            if !columns.contains(&label.as_str()) {
                columns.push(label);
            }
        }
        columns
    }

    pub fn supports_efficiency(&self) -> bool {
        self.turnover.is_some() && self.total_employees.is_some()
    }
}
