//! File-level I/O: input expansion and Parquet table storage.

pub mod glob;
pub mod parquet;
