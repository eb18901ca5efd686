// crates/depotdash-core/src/error.rs

use depotdash_parser::ParserError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error(transparent)]
    Parser(#[from] ParserError),

    #[error("Polars operation failed: {0}")]
    Polars(#[from] polars::error::PolarsError),

    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV writing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    /// The current selection leaves nothing to analyse. Informational, not a failure.
    #[error("Nothing to show: {0}")]
    EmptySelection(String),

    #[error("Column '{0}' is not a numeric column of this dataset")]
    UnknownColumn(String),

    #[error("Anomaly threshold must be a positive number of standard deviations, got {0}")]
    InvalidThreshold(f64),
}

impl DashboardError {
    /// Structural and read errors halt processing of the upload.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DashboardError::EmptySelection(_))
    }
}

pub type Result<T> = std::result::Result<T, DashboardError>;
