use std::path::PathBuf;

use thiserror::Error;

/// Convenience result type for ingestion and analysis operations.
pub type IngestionResult<T> = Result<T, IngestionError>;

/// Boxed underlying cause carried by [`IngestionError::Format`].
pub type BoxedCause = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by the reader, the normalizer and the pipeline.
///
/// Per-cell numeric parse failures are not errors: the statistics engine skips those cells.
#[derive(Debug, Error)]
pub enum IngestionError {
    /// The input path does not exist or is not a regular file. Nothing was parsed.
    #[error("input not found or not a regular file: {}", path.display())]
    NotFound { path: PathBuf },

    /// The input could not be interpreted: unsupported extension, empty or malformed workbook,
    /// a transient-file write failure, or text that does not decode under any allowed encoding.
    #[error("format error in {}: {message}", path.display())]
    Format {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<BoxedCause>,
    },

    /// An optional capability needed for this input was not compiled in.
    #[error("{capability} is unavailable: rebuild with the cargo feature '{feature}'")]
    Dependency {
        capability: &'static str,
        feature: &'static str,
    },

    /// Reader/engine options are unusable (e.g. a zero chunk size).
    #[error("invalid options: {message}")]
    InvalidOptions { message: String },

    /// Underlying I/O error while streaming.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV framing error while streaming.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl IngestionError {
    pub(crate) fn format(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
            source: None,
        }
    }

    pub(crate) fn format_with_source(
        path: impl Into<PathBuf>,
        message: impl Into<String>,
        source: impl Into<BoxedCause>,
    ) -> Self {
        Self::Format {
            path: path.into(),
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns `true` for [`IngestionError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns `true` for [`IngestionError::Format`].
    pub fn is_format(&self) -> bool {
        matches!(self, Self::Format { .. })
    }

    /// Returns `true` for [`IngestionError::Dependency`].
    pub fn is_dependency(&self) -> bool {
        matches!(self, Self::Dependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::IngestionError;

    #[test]
    fn format_error_exposes_its_cause() {
        let cause = std::io::Error::other("disk full");
        let err = IngestionError::format_with_source("book.xlsx", "writing transient csv", cause);
        let source = std::error::Error::source(&err).map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("disk full"));
        assert!(err.to_string().contains("book.xlsx"));
        assert!(err.is_format());
    }

    #[test]
    fn dependency_error_names_feature() {
        let err = IngestionError::Dependency {
            capability: "spreadsheet parsing",
            feature: "excel",
        };
        assert!(err.to_string().contains("spreadsheet parsing"));
        assert!(err.to_string().contains("'excel'"));
    }
}
