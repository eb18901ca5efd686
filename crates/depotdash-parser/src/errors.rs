use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParserError {
    #[error("failed to read workbook: {source}")]
    Workbook {
        #[source]
        source: calamine::XlsxError,
    },

    #[error("sheet '{sheet}' not found; workbook contains {available:?}")]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("sheet '{sheet}' is empty")]
    EmptySheet { sheet: String },

    #[error("no header row with {required:?} found in the first {scanned} rows")]
    HeaderNotFound {
        required: Vec<String>,
        scanned: usize,
        /// Raw text of the scanned rows, for display to the user.
        preview: Vec<Vec<String>>,
    },

    #[error("required columns {missing:?} not found; found columns {found:?}")]
    MissingColumns {
        missing: Vec<String>,
        found: Vec<String>,
    },

    #[error("table validation error: {message}")]
    Validation { message: String },
}

impl ParserError {
    /// Structural errors describe a readable workbook whose layout does not match the
    /// expected cargo-turnover sheet. Everything else is a read failure.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            ParserError::HeaderNotFound { .. } | ParserError::MissingColumns { .. }
        )
    }
}

impl From<calamine::XlsxError> for ParserError {
    fn from(source: calamine::XlsxError) -> Self {
        ParserError::Workbook { source }
    }
}
