//! # slotsource
//!
//! A **dataset source and snapshot writer** for slot-parallel columnar analysis.
//! An analysis engine splits a dataset into slots, runs each slot on its own
//! thread, reads typed columns row by row and writes derived columns into a
//! per-slot output table; this crate provides everything between the engine and
//! the Parquet files.
//!
//! ## Key Features
//!
//! - **Row-range partitioning** - one contiguous, disjoint partition per slot
//!   covering the union of all input files
//! - **Typed column readers** - scalars, numeric arrays (zero-copy views) and
//!   bit-packed boolean arrays behind one per-row read call
//! - **Snapshot writer** - append typed tuples into an Arrow table per slot,
//!   then merge the slot tables into one
//! - **Checked lifecycle** - out-of-order hooks, out-of-partition moves and
//!   schema mismatches are reported as typed [`Error`]s
//!
//! ## Quick Start
//!
//! ```no_run
//! use slotsource::*;
//!
//! # fn main() -> Result<()> {
//! let mut source = DatasetSource::new(Dataset::new(["data/run-*.parquet"], "events"));
//! source.set_parallelism(4)?;
//! let partitions = source.compute_partitions()?;
//!
//! let slot = source.initialize_slot(0, partitions[0])?;
//! let pt = slot.column_reader::<ArrayView<f32>>("pt")?;
//! let mut out = Snapshot::<(i64, u64)>::new("counts", &["row", "n"])?;
//! for row in slot.range().rows() {
//!     slot.advance(row)?;
//!     out.append((row as i64, pt.read(row)?.len() as u64));
//! }
//! slot.finalize();
//! let table = out.result()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Overview
//!
//! - [`partition`] - row-range partitioning
//! - [`dataset`] - dataset identity and footer resolution
//! - [`source`] - slot lifecycle and reader factory
//! - [`column`] / [`reader`] - readable value types and readers
//! - [`snapshot`] - output tables and merge
//! - [`runner`] - parallel driver for a whole run
//! - [`io`] - glob expansion and Parquet table storage
//! - [`options`] - configuration
//! - [`testing`] - fixtures and assertions

pub mod column;
mod cursor;
pub mod dataset;
pub mod error;
pub mod io;
pub mod options;
pub mod partition;
pub mod reader;
pub mod runner;
pub mod snapshot;
pub mod source;
pub mod testing;

pub use column::{ArrayView, ColumnValue, NumericElement, Representation};
pub use dataset::{Dataset, ResolvedDataset};
pub use error::{Error, Result};
pub use io::parquet::{read_table, write_table};
pub use options::SourceOptions;
pub use partition::{Partition, partition_rows};
pub use reader::ColumnReader;
pub use runner::Runner;
pub use snapshot::{Snapshot, SnapshotRow, SnapshotValue, Table, merge_tables};
pub use source::{DatasetSource, Slot};
