use thiserror::Error;

/// Failures of the listing pipeline itself (loading, preparation, grouping).
///
/// File-level I/O and decoding problems travel as `anyhow::Error` with
/// context; these variants are the ones the dashboard reports by name.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DataError {
    #[error("row {row}: date_posted '{value}' does not match YYYY-MM-DD")]
    MalformedDate { row: usize, value: String },

    #[error("row {row}: model field is empty, no make to extract")]
    MalformedModel { row: usize },

    #[error("required column '{column}' is missing")]
    MissingColumn { column: String },

    #[error("unknown group key '{key}' (expected type, make or model)")]
    UnknownGroupKey { key: String },
}

pub type Result<T> = std::result::Result<T, DataError>;
