use thiserror::Error;

/// Errors raised by the conversion, annotation and export operations.
#[derive(Debug, Error)]
pub enum ContactsError {
    /// A stateful call was made before the step it depends on.
    #[error("{step} requires {requires} to be computed first")]
    MissingPrerequisite {
        step: &'static str,
        requires: &'static str,
    },

    /// The coordinate table has no row for this (already shifted) index.
    #[error("coordinate table has no row with index {index}")]
    CoordinateNotFound { index: usize },

    /// The distance matrix has no entry at this position (non-square input).
    #[error("distance matrix has no entry at [{row}, {col}]")]
    MatrixIndex { row: usize, col: usize },

    /// A filename placeholder with no matching metadata key.
    #[error("no metadata value for placeholder '{{{key}}}'")]
    MissingTemplateKey { key: String },

    #[error("malformed filename template '{template}': {message}")]
    MalformedTemplate { template: String, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, ContactsError>;
