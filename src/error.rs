use std::path::PathBuf;

use thiserror::Error;

// ---------------------------------------------------------------------------
// Load-time errors (fatal to startup)
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unsupported file extension: .{0}")]
    UnsupportedFormat(String),

    #[error("workbook error: {0}")]
    Workbook(#[from] calamine::Error),

    #[error("sheet '{sheet}' not found (available: {})", available.join(", "))]
    SheetNotFound {
        sheet: String,
        available: Vec<String>,
    },

    #[error("required column '{column}' is missing (headers: {})", headers.join(", "))]
    MissingColumn {
        column: &'static str,
        headers: Vec<String>,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("malformed input: {0}")]
    Malformed(String),

    #[error("invalid classification rules in {path}: {reason}")]
    Rules { path: PathBuf, reason: String },
}

// ---------------------------------------------------------------------------
// Per-row parse errors (recovered, counted, reported)
// ---------------------------------------------------------------------------

/// An investment size that could not be read as a non-negative number.
/// `row` is 1-based and counts data rows below the header.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("row {row} ({fund}): investment size {value:?} {reason}")]
pub struct ParseError {
    pub row: usize,
    pub fund: String,
    pub value: String,
    pub reason: &'static str,
}

// ---------------------------------------------------------------------------
// Request-time errors (fail one render cycle)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("unknown sort direction '{0}' (expected asc or desc)")]
    UnknownDirection(String),

    #[error("'{value}' is not a known {axis} value")]
    UnknownFilterValue { axis: &'static str, value: String },

    #[error("page size must be between 1 and {max}, got {0}", max = crate::view::table::MAX_PAGE_SIZE)]
    InvalidPageSize(usize),

    #[error("offset {offset} is past the last row ({total} rows)")]
    PageOutOfRange { offset: usize, total: usize },

    #[error("parameter '{param}' expects a number, got '{value}'")]
    InvalidNumber { param: String, value: String },
}
