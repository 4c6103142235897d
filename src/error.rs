use thiserror::Error;

/// Main error type for Rusty Export.
/// Aggregates errors from the standard library and every pipeline module.
#[derive(Error, Debug)]
pub enum RustyExportError {
    #[error("{0}")]
    WithContextError(String),

    // Standard library errors
    #[error("{0}")]
    IoError(#[from] std::io::Error),

    // Pipeline module errors
    #[error("{0}")]
    TableError(#[from] crate::table::TableError),

    #[error("{0}")]
    SpreadsheetError(#[from] crate::spreadsheet::SpreadsheetError),

    #[error("{0}")]
    SourceError(#[from] crate::source::SourceError),

    #[error("{0}")]
    CleanError(#[from] crate::cleaner::CleanError),

    #[error("{0}")]
    QueryError(#[from] crate::query::QueryError),

    #[error("{0}")]
    ExportError(#[from] crate::export::ExportError),

    // Surrounding layers
    #[error("{0}")]
    ConfigError(#[from] crate::config::ConfigError),

    #[error("{0}")]
    AuthError(#[from] crate::auth::AuthError),

    #[error("{0}")]
    LoggingError(#[from] crate::logging::LoggingError),

    #[error("{0}")]
    SessionError(#[from] crate::session::SessionError),
}

pub trait ResultMessage {
    fn with_prefix(self, message: &str) -> Self;
}

impl<T> ResultMessage for Result<T, RustyExportError> {
    fn with_prefix(self, message: &str) -> Self {
        self.map_err(|e| RustyExportError::WithContextError(format!("{}: {}", message, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaner::CleanError;

    #[test]
    fn prefix_keeps_message() {
        let result: Result<(), RustyExportError> = Err(CleanError::NoFillableColumns.into());
        let error = result.with_prefix("Fill missing values").unwrap_err();
        assert_eq!(error.to_string(), "Fill missing values: No numeric columns to fill");
        assert!(matches!(error, RustyExportError::WithContextError(_)));
    }
}
