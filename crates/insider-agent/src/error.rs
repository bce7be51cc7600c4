use insider_models::ParamError;
use thiserror::Error;

/// The fetched table did not match the screener schema. Nothing from the
/// table is kept when this is raised.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DataFormatError {
    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Row {row} has {found} cells, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row}, column `{column}`: cannot parse {value:?} ({reason})")]
    Cell {
        row: usize,
        column: &'static str,
        value: String,
        reason: String,
    },
}

/// The gateway could not produce a table.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Source unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum QueryError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(#[from] ParamError),

    #[error("Data format error: {0}")]
    DataFormat(#[from] DataFormatError),

    #[error("Fetch failed: {0}")]
    Fetch(#[from] FetchError),
}
