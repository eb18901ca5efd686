use std::collections::BTreeSet;

use chrono::NaiveDate;
use tracing::info;

use crate::error::{DashboardError, Result};
use crate::hierarchy::{DateHierarchy, DateSelection};
use crate::table::CanonicalTable;

/// Membership filter over the canonical table. `None` shift sets are unrestricted.
/// Records without a shift time never match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSet {
    pub dates: BTreeSet<NaiveDate>,
    pub shift_times: Option<BTreeSet<String>>,
    pub shift_numbers: Option<BTreeSet<String>>,
}

impl FilterSet {
    /// Every date in the table, every shift.
    pub fn all_of(table: &CanonicalTable) -> Result<Self> {
        Ok(Self {
            dates: table.dates()?.into_iter().collect(),
            shift_times: None,
            shift_numbers: None,
        })
    }

    pub fn from_selection(hierarchy: &DateHierarchy, selection: &DateSelection) -> Self {
        Self {
            dates: hierarchy.select(selection),
            shift_times: None,
            shift_numbers: None,
        }
    }

    pub fn with_shift_times<S: Into<String>>(mut self, times: impl IntoIterator<Item = S>) -> Self {
        self.shift_times = Some(times.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_shift_numbers<S: Into<String>>(
        mut self,
        numbers: impl IntoIterator<Item = S>,
    ) -> Self {
        self.shift_numbers = Some(numbers.into_iter().map(Into::into).collect());
        self
    }

    fn keeps(&self, date: &NaiveDate, shift_time: Option<&str>, shift_number: &str) -> bool {
        if !self.dates.contains(date) {
            return false;
        }
        let Some(time) = shift_time else {
            return false;
        };
        if let Some(times) = &self.shift_times {
            if !times.contains(time) {
                return false;
            }
        }
        self.shift_numbers
            .as_ref()
            .map_or(true, |numbers| numbers.contains(shift_number))
    }
}

/// The filtered view. An empty date set or an empty result is reported as
/// [`DashboardError::EmptySelection`].
pub fn apply_filters(table: &CanonicalTable, filters: &FilterSet) -> Result<CanonicalTable> {
    if filters.dates.is_empty() {
        info!("no dates selected");
        return Err(DashboardError::EmptySelection(
            "no dates selected".to_string(),
        ));
    }

    let dates = table.dates()?;
    let times = table.shift_times()?;
    let numbers = table.shift_numbers()?;
    let mask: Vec<bool> = dates
        .iter()
        .zip(&times)
        .zip(&numbers)
        .map(|((date, time), number)| filters.keeps(date, time.as_deref(), number))
        .collect();

    let view = table.filter_rows(&mask)?;
    if view.is_empty() {
        info!(
            dates = filters.dates.len(),
            "no records match the current filters"
        );
        return Err(DashboardError::EmptySelection(
            "no records match the current filters".to_string(),
        ));
    }
    Ok(view)
}
