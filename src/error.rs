use thiserror::Error;

/// Main error type for the well sheet crate.
/// Aggregates errors from the standard library, dependencies, and internal modules.
#[derive(Error, Debug)]
pub enum WellSheetError {
    /// The bytes are not a spreadsheet container this crate can decode.
    #[error("Unreadable workbook: {0}")]
    UnreadableWorkbookError(String),

    /// The workbook has no sheets, or the selected sheet has no rows.
    #[error("Empty workbook: {0}")]
    EmptyWorkbookError(String),

    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    #[error("{0}")]
    ParseIntError(#[from] std::num::ParseIntError),

    // Third-party library errors
    #[error("{0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("{0}")]
    XmlError(#[from] quick_xml::Error),

    #[error("{0}")]
    XmlEncodingError(#[from] quick_xml::encoding::EncodingError),

    #[error("{0}")]
    XmlAttributeError(#[from] quick_xml::events::attributes::AttrError),

    #[error("{0}")]
    JsonError(#[from] serde_json::Error),

    #[error("{0}")]
    PatternError(#[from] glob::PatternError),

    // Helper module errors
    #[error("{0}")]
    XmlHelperError(#[from] crate::helpers::xml::XmlError),

    // Spreadsheet module errors
    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    OdsError(#[from] crate::spreadsheet::ods::OdsError),

    // Catalog and calculation module errors
    #[error("{0}")]
    CatalogError(#[from] crate::catalog::CatalogError),

    #[error("{0}")]
    CalculationError(#[from] crate::calculation::CalculationError),
}

impl WellSheetError {
    /// Folds any decoding failure into `UnreadableWorkbookError`, keeping the two
    /// fatal extraction kinds untouched.
    pub(crate) fn into_unreadable(self) -> Self {
        match self {
            error @ (Self::UnreadableWorkbookError(_) | Self::EmptyWorkbookError(_)) => error,
            error => Self::UnreadableWorkbookError(error.to_string()),
        }
    }
}

pub(crate) trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, WellSheetError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| WellSheetError::WithContextError(format!("{}: {}", message, e)))
    }
}
