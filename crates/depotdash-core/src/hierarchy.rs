//! Year → month → ISO week → day index over the cleaned dates, plus the cascading
//! date selection made against it.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::error::Result;
use crate::table::CanonicalTable;

type WeekIndex = BTreeMap<u32, BTreeSet<NaiveDate>>;
type MonthIndex = BTreeMap<u32, WeekIndex>;

/// Weeks are ISO week numbers filed under the calendar year and month of the day, so
/// 2021-01-01 sits under 2021 / 1 / week 53.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DateHierarchy {
    years: BTreeMap<i32, MonthIndex>,
}

impl DateHierarchy {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut years: BTreeMap<i32, MonthIndex> = BTreeMap::new();
        for date in dates {
            years
                .entry(date.year())
                .or_default()
                .entry(date.month())
                .or_default()
                .entry(date.iso_week().week())
                .or_default()
                .insert(date);
        }
        Self { years }
    }

    pub fn from_table(table: &CanonicalTable) -> Result<Self> {
        Ok(Self::from_dates(table.dates()?))
    }

    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    pub fn years(&self) -> Vec<i32> {
        self.years.keys().copied().collect()
    }

    pub fn months(&self, year: i32) -> Vec<u32> {
        self.years
            .get(&year)
            .map(|months| months.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn weeks(&self, year: i32, month: u32) -> Vec<u32> {
        self.years
            .get(&year)
            .and_then(|months| months.get(&month))
            .map(|weeks| weeks.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn days(&self, year: i32, month: u32, week: u32) -> Vec<NaiveDate> {
        self.years
            .get(&year)
            .and_then(|months| months.get(&month))
            .and_then(|weeks| weeks.get(&week))
            .map(|days| days.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn all_dates(&self) -> BTreeSet<NaiveDate> {
        self.years
            .values()
            .flat_map(|months| months.values())
            .flat_map(|weeks| weeks.values())
            .flatten()
            .copied()
            .collect()
    }

    /// Dates covered by `selection`. Levels left unset select everything beneath the
    /// level above them.
    pub fn select(&self, selection: &DateSelection) -> BTreeSet<NaiveDate> {
        let mut selected = BTreeSet::new();
        for (year, months) in &self.years {
            if selection.year.is_some_and(|wanted| wanted != *year) {
                continue;
            }
            for (month, weeks) in months {
                if selection.month.is_some_and(|wanted| wanted != *month) {
                    continue;
                }
                for (week, days) in weeks {
                    if selection.week.is_some_and(|wanted| wanted != *week) {
                        continue;
                    }
                    selected.extend(days.iter().filter(|day| {
                        selection
                            .days
                            .as_ref()
                            .map_or(true, |wanted| wanted.contains(*day))
                    }));
                }
            }
        }
        selected
    }
}

/// The user's date choice. Each level narrows the one above it; `None` means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSelection {
    pub year: Option<i32>,
    pub month: Option<u32>,
    pub week: Option<u32>,
    pub days: Option<BTreeSet<NaiveDate>>,
}

impl DateSelection {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn year(year: i32) -> Self {
        Self {
            year: Some(year),
            ..Self::default()
        }
    }

    pub fn month(year: i32, month: u32) -> Self {
        Self {
            month: Some(month),
            ..Self::year(year)
        }
    }

    pub fn week(year: i32, month: u32, week: u32) -> Self {
        Self {
            week: Some(week),
            ..Self::month(year, month)
        }
    }

    pub fn day(date: NaiveDate) -> Self {
        Self::default().with_days([date])
    }

    /// Restricts the selection to the given days within whatever is already chosen.
    pub fn with_days(mut self, days: impl IntoIterator<Item = NaiveDate>) -> Self {
        self.days = Some(days.into_iter().collect());
        self
    }
}
