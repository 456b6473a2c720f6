//! Test support for code built on slot sources.
//!
//! - **Fixtures**: generate event tables with scalar, numeric-array and
//!   boolean-array columns and write them as one or more Parquet files.
//! - **Assertions**: compare tables as multisets of rows, which is the only
//!   ordering a merge guarantees.
//!
//! ```no_run
//! use slotsource::testing::*;
//! use slotsource::DatasetSource;
//!
//! # fn main() -> slotsource::Result<()> {
//! let dir = tempfile::tempdir()?;
//! let dataset = events_dataset(dir.path(), &[4, 6])?;
//! let mut source = DatasetSource::new(dataset);
//! assert_eq!(source.compute_partitions()?.iter().map(|p| p.len()).sum::<u64>(), 10);
//! # Ok(())
//! # }
//! ```

pub mod assertions;
pub mod fixtures;

pub use assertions::*;
pub use fixtures::*;
