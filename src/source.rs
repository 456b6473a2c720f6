//! Dataset source: slot count, partition plan and per-slot lifecycle.
//!
//! The engine drives a [`DatasetSource`] through a fixed sequence of hooks:
//!
//! 1. [`set_parallelism`](DatasetSource::set_parallelism) (optional; defaults
//!    come from [`SourceOptions`]),
//! 2. [`compute_partitions`](DatasetSource::compute_partitions), exactly once,
//! 3. per slot, possibly on different threads:
//!    [`initialize_slot`](DatasetSource::initialize_slot), then repeated
//!    [`Slot::advance`] with column reads, then [`Slot::finalize`].
//!
//! Steps 1 and 2 take `&mut self` while slots borrow the source, so the borrow
//! checker already rules out changing the plan while a slot is running. The
//! remaining ordering rules are checked at runtime and reported as
//! [`Error::InvalidLifecycle`].

use crate::column::ColumnValue;
use crate::cursor::RowCursor;
use crate::dataset::{Dataset, ResolvedDataset};
use crate::error::{Error, Result};
use crate::options::SourceOptions;
use crate::partition::{Partition, partition_rows};
use crate::reader::ColumnReader;
use arrow::datatypes::SchemaRef;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

struct Plan {
    resolved: ResolvedDataset,
    partitions: Vec<Partition>,
    active: Vec<AtomicBool>,
}

/// Bridges a [`Dataset`] to slot-parallel execution.
pub struct DatasetSource {
    dataset: Dataset,
    options: SourceOptions,
    plan: Option<Plan>,
}

impl DatasetSource {
    #[must_use]
    pub fn new(dataset: Dataset) -> Self {
        Self::with_options(dataset, SourceOptions::default())
    }

    #[must_use]
    pub fn with_options(dataset: Dataset, options: SourceOptions) -> Self {
        Self {
            dataset,
            options,
            plan: None,
        }
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    #[must_use]
    pub fn options(&self) -> &SourceOptions {
        &self.options
    }

    #[must_use]
    pub fn parallelism(&self) -> usize {
        self.options.parallelism
    }

    /// Record the number of slots.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for `n == 0`; [`Error::InvalidLifecycle`] once
    /// partitions have been computed.
    pub fn set_parallelism(&mut self, n: usize) -> Result<()> {
        if self.plan.is_some() {
            return Err(Error::lifecycle(
                "parallelism cannot change after partitions are computed",
            ));
        }
        if n == 0 {
            return Err(Error::InvalidArgument("parallelism must be at least 1".into()));
        }
        self.options.parallelism = n;
        Ok(())
    }

    /// Resolve the dataset and fix one partition per slot for this run.
    ///
    /// # Errors
    ///
    /// [`Error::DatasetResolution`] if the inputs or table cannot be resolved;
    /// [`Error::InvalidLifecycle`] if partitions were already computed.
    pub fn compute_partitions(&mut self) -> Result<Vec<Partition>> {
        if self.plan.is_some() {
            return Err(Error::lifecycle("partitions were already computed"));
        }
        let resolved = self.dataset.resolve()?;
        let partitions = partition_rows(resolved.total_rows(), self.options.parallelism)?;
        log::debug!(
            "table `{}`: {} rows over {} slot(s): {:?}",
            resolved.table(),
            resolved.total_rows(),
            partitions.len(),
            partitions
        );

        let active = partitions.iter().map(|_| AtomicBool::new(false)).collect();
        self.plan = Some(Plan {
            resolved,
            partitions: partitions.clone(),
            active,
        });
        Ok(partitions)
    }

    fn plan(&self) -> Result<&Plan> {
        self.plan
            .as_ref()
            .ok_or_else(|| Error::lifecycle("partitions have not been computed"))
    }

    /// The fixed partition plan.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycle`] before [`compute_partitions`](Self::compute_partitions).
    pub fn partitions(&self) -> Result<&[Partition]> {
        Ok(&self.plan()?.partitions)
    }

    /// Total logical row count of the dataset.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycle`] before partitions are computed.
    pub fn total_rows(&self) -> Result<u64> {
        Ok(self.plan()?.resolved.total_rows())
    }

    /// Columns of the dataset.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycle`] before partitions are computed.
    pub fn schema(&self) -> Result<&SchemaRef> {
        Ok(self.plan()?.resolved.schema())
    }

    /// Open storage for `slot` and position its cursor at `range.begin`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLifecycle`] if partitions are not computed, the slot is
    /// unknown, `range` is not the slot's planned partition, or the slot is
    /// already active. Storage errors while positioning the cursor are
    /// propagated and leave the slot inactive.
    pub fn initialize_slot(&self, slot: usize, range: Partition) -> Result<Slot<'_>> {
        let plan = self.plan()?;
        let planned = plan.partitions.get(slot).copied().ok_or_else(|| {
            Error::lifecycle(format!(
                "slot {slot} does not exist ({} slots planned)",
                plan.partitions.len()
            ))
        })?;
        if planned != range {
            return Err(Error::lifecycle(format!(
                "slot {slot} was assigned {planned}, not {range}"
            )));
        }
        if plan.active[slot]
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(Error::lifecycle(format!("slot {slot} is already initialized")));
        }

        let slot = Slot {
            source: self,
            plan,
            index: slot,
            range,
            cursor: RefCell::new(RowCursor::new(
                plan.resolved.files().clone(),
                range,
                self.options.batch_size,
            )),
        };
        if !range.is_empty() {
            slot.cursor.borrow_mut().seek(range.begin)?;
        }
        log::debug!("slot {} initialized on {range}", slot.index);
        Ok(slot)
    }
}

/// One execution slot: a partition, its cursor, and the readers bound to it.
///
/// Dropping the slot (normally through [`finalize`](Self::finalize), but also on
/// error paths or unwinding) releases the cursor and marks the slot inactive.
pub struct Slot<'src> {
    source: &'src DatasetSource,
    plan: &'src Plan,
    index: usize,
    range: Partition,
    cursor: RefCell<RowCursor>,
}

impl Slot<'_> {
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn range(&self) -> Partition {
        self.range
    }

    #[must_use]
    pub fn source(&self) -> &DatasetSource {
        self.source
    }

    /// Row the cursor currently holds.
    #[must_use]
    pub fn current_row(&self) -> Option<u64> {
        self.cursor.borrow().row()
    }

    /// Move the cursor to absolute row `row`.
    ///
    /// # Errors
    ///
    /// [`Error::OutOfPartition`] if `row` is outside this slot's range; storage
    /// errors while loading the row are propagated.
    pub fn advance(&self, row: u64) -> Result<()> {
        if !self.range.contains(row) {
            return Err(Error::OutOfPartition {
                slot: self.index,
                row,
                range: self.range,
            });
        }
        self.cursor.borrow_mut().seek(row)
    }

    /// Bind a reader for column `name` read as `T`.
    ///
    /// Readers for the same column are independent of each other and all follow
    /// this slot's cursor.
    ///
    /// # Errors
    ///
    /// [`Error::ColumnNotFound`] if the table has no such column;
    /// [`Error::ColumnTypeMismatch`] if its storage cannot be read as `T`.
    pub fn column_reader<T: ColumnValue>(&self, name: &str) -> Result<ColumnReader<'_, T>> {
        let schema = self.plan.resolved.schema();
        let index = schema
            .index_of(name)
            .map_err(|_| Error::ColumnNotFound(name.to_string()))?;
        let found = schema.field(index).data_type();
        if !T::accepts(found) {
            return Err(Error::ColumnTypeMismatch {
                column: name.to_string(),
                expected: format!("{} ({})", T::type_name(), T::REPRESENTATION),
                found: found.clone(),
            });
        }
        Ok(ColumnReader::new(name, index, &self.cursor))
    }

    /// Release the cursor and every reader bound to it.
    ///
    /// Consuming the slot runs its `Drop` impl, which clears the slot's active
    /// flag; there is nothing else to do here.
    pub fn finalize(self) {}
}

impl Drop for Slot<'_> {
    fn drop(&mut self) {
        self.plan.active[self.index].store(false, Ordering::Release);
        log::debug!("slot {} finalized", self.index);
    }
}
