//! Parallel driver for a full source → snapshot run.
//!
//! [`Runner`] plays the engine's part of the lifecycle: it fixes the partition
//! plan, runs one slot per partition on a dedicated rayon pool, hands each slot
//! and a fresh [`Snapshot`] to caller code, and merges the per-slot results once
//! every slot has finished.
//!
//! ```no_run
//! use slotsource::{Dataset, DatasetSource, Runner};
//!
//! # fn main() -> slotsource::Result<()> {
//! let mut source = DatasetSource::new(Dataset::single("events.parquet", "events"));
//! let table = Runner::new(4).run::<(i64,), _>(&mut source, "ids", &["id"], |slot, out| {
//!     let id = slot.column_reader::<i64>("id")?;
//!     for row in slot.range().rows() {
//!         slot.advance(row)?;
//!         out.append((id.read(row)?,));
//!     }
//!     Ok(())
//! })?;
//! println!("{} rows", table.num_rows());
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::snapshot::{Snapshot, SnapshotRow, Table};
use crate::source::{DatasetSource, Slot};
use rayon::prelude::*;

#[derive(Clone, Copy, Debug, Default)]
pub struct Runner {
    /// Slot count; `None` keeps the source's configured parallelism.
    pub slots: Option<usize>,
}

impl Runner {
    #[must_use]
    pub fn new(slots: usize) -> Self {
        Self { slots: Some(slots) }
    }

    /// Run `task` once per slot and merge the resulting tables.
    ///
    /// The task receives an initialized slot and that slot's snapshot; it is
    /// responsible for advancing through `slot.range()` and appending rows.
    /// Slots are finalized when the task returns, whether it succeeded or not.
    /// Per-slot tables are merged in slot order.
    ///
    /// # Errors
    ///
    /// Any error from partitioning, slot initialization, the task, or the merge.
    /// The first failing slot aborts the run.
    pub fn run<R, F>(
        &self,
        source: &mut DatasetSource,
        table_name: &str,
        column_names: &[&str],
        task: F,
    ) -> Result<Table>
    where
        R: SnapshotRow,
        F: Fn(&Slot<'_>, &mut Snapshot<R>) -> Result<()> + Sync,
    {
        if let Some(n) = self.slots {
            source.set_parallelism(n)?;
        }
        let partitions = source.compute_partitions()?;
        let template = Snapshot::<R>::new(table_name, column_names)?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(partitions.len())
            .build()?;
        let source: &DatasetSource = source;
        let tables: Vec<Table> = pool.install(|| {
            partitions
                .par_iter()
                .enumerate()
                .map(|(index, range)| {
                    let slot = source.initialize_slot(index, *range)?;
                    let mut out = Snapshot::<R>::new(table_name, column_names)?;
                    task(&slot, &mut out)?;
                    slot.finalize();
                    out.result()
                })
                .collect::<Result<Vec<_>>>()
        })?;

        template.merge(&tables)
    }
}
