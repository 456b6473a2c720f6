//! Error type shared by every stage of a run.
//!
//! All variants are fatal for the run that produced them: a missing column or a
//! malformed schema cannot be fixed by retrying the same read, so callers are
//! expected to abort rather than recover.

use crate::partition::Partition;
use arrow::datatypes::DataType;
use arrow::error::ArrowError;
use parquet::errors::ParquetError;
use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Error, Debug)]
pub enum Error {
    /// Input files or the requested table could not be resolved.
    ///
    /// Raised while computing partitions, before any slot starts.
    #[error("cannot resolve dataset: {0}")]
    DatasetResolution(String),

    /// A lifecycle hook was called out of order (slot initialized twice,
    /// parallelism changed after the plan was fixed, read without a current row).
    #[error("invalid lifecycle: {0}")]
    InvalidLifecycle(String),

    /// A slot was asked to move outside the partition it owns.
    #[error("row {row} is outside partition {range} of slot {slot}")]
    OutOfPartition {
        slot: usize,
        row: u64,
        range: Partition,
    },

    #[error("column `{0}` not found")]
    ColumnNotFound(String),

    /// The column exists but its storage cannot be read as the requested type.
    #[error("column `{column}` of type {found} cannot be read as {expected}")]
    ColumnTypeMismatch {
        column: String,
        expected: String,
        found: DataType,
    },

    /// A scalar column holds a null at the row being read.
    #[error("column `{column}` is null at row {row}")]
    NullValue { column: String, row: u64 },

    /// Two tables (or a writer and a table) disagree on their columns.
    #[error("schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot build slot thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Failure raised by caller-supplied slot code.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub(crate) fn lifecycle(msg: impl Into<String>) -> Self {
        Self::InvalidLifecycle(msg.into())
    }

    pub(crate) fn schema(msg: impl Into<String>) -> Self {
        Self::SchemaMismatch(msg.into())
    }
}
