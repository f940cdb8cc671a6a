//! Error types for GenomeTrace
//!
//! Defines all error types used throughout the library.

use thiserror::Error;

/// Main error type for GenomeTrace operations
///
/// None of these are retried: the inputs are static for a given call, so a
/// failure aborts the whole plot build.
#[derive(Debug, Error)]
pub enum GenomeTraceError {
    /// Structurally invalid input (too few model points, chromosome id out of
    /// range, mismatched parallel lists, malformed model lines)
    #[error("Invalid input shape: {0}")]
    InputShape(String),

    /// Zero total 3D arc length for a chromosome
    #[error("Degenerate geometry on chromosome {chrom}: total 3D length is zero")]
    DegenerateGeometry { chrom: u8 },

    /// Data source returned nothing usable for a request
    #[error("Data source error: {0}")]
    DataSource(String),

    /// SQLite errors
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl GenomeTraceError {
    pub(crate) fn input_shape(message: impl Into<String>) -> Self {
        GenomeTraceError::InputShape(message.into())
    }

    pub(crate) fn data_source(message: impl Into<String>) -> Self {
        GenomeTraceError::DataSource(message.into())
    }

    /// True for errors coming from the backing store
    pub fn is_data_source(&self) -> bool {
        matches!(self, GenomeTraceError::DataSource(_) | GenomeTraceError::Sqlite(_))
    }
}

/// Result type alias for GenomeTrace operations
pub type Result<T> = std::result::Result<T, GenomeTraceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GenomeTraceError::DegenerateGeometry { chrom: 4 };
        assert_eq!(
            err.to_string(),
            "Degenerate geometry on chromosome 4: total 3D length is zero"
        );

        let err = GenomeTraceError::input_shape("need at least 2 points");
        assert_eq!(err.to_string(), "Invalid input shape: need at least 2 points");
    }

    #[test]
    fn test_is_data_source() {
        assert!(GenomeTraceError::data_source("no length row").is_data_source());
        assert!(!GenomeTraceError::input_shape("x").is_data_source());
    }
}
