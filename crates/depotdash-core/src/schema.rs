//! Column names of the canonical table and its derived frames.

pub const DATE: &str = "date";
pub const SHIFT_TIME: &str = "shift_time";
pub const SHIFT_NUMBER: &str = "shift_number";
pub const DATE_TIME_KEY: &str = "date_time_key";

pub const DAY_SHIFT: &str = "6:00-18:00";
pub const NIGHT_SHIFT: &str = "18:00-6:00";

pub const SHIFT_NUMBERS: [&str; 4] = ["1", "2", "3", "4"];

pub const EFFICIENCY: &str = "efficiency";
pub const RECORDS: &str = "records";

pub const VARIABLE: &str = "variable";
pub const VALUE: &str = "value";

pub const ANOMALY_KIND: &str = "anomaly_kind";
pub const DEVIATION: &str = "deviation";
pub const DEVIATION_IN_SIGMA: &str = "deviation_in_sigma";
