//! Per-slot row cursor.
//!
//! The cursor streams the rows of one partition, which may span several input
//! files. It keeps at most one decoded batch; moving forward pulls further
//! batches from the open reader, while moving backwards or into another file
//! re-opens a reader at the target row.

use crate::dataset::FileSpan;
use crate::error::{Error, Result};
use crate::io::parquet::open_row_range;
use crate::partition::Partition;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReader;
use std::sync::Arc;

struct OpenReader {
    reader: ParquetRecordBatchReader,
    /// Global row of the next batch the reader will yield.
    next_row: u64,
    /// Global end (exclusive) of the reader's selection.
    end_row: u64,
}

struct LoadedBatch {
    batch: RecordBatch,
    first_row: u64,
}

impl LoadedBatch {
    fn contains(&self, row: u64) -> bool {
        self.first_row <= row && row < self.first_row + self.batch.num_rows() as u64
    }
}

pub(crate) struct RowCursor {
    files: Arc<[FileSpan]>,
    range: Partition,
    batch_size: usize,
    reader: Option<OpenReader>,
    loaded: Option<LoadedBatch>,
    row: Option<u64>,
}

impl RowCursor {
    pub(crate) fn new(files: Arc<[FileSpan]>, range: Partition, batch_size: usize) -> Self {
        Self {
            files,
            range,
            batch_size,
            reader: None,
            loaded: None,
            row: None,
        }
    }

    /// Current row, if the cursor has been positioned.
    pub(crate) fn row(&self) -> Option<u64> {
        self.row
    }

    /// Batch holding the current row and the row's index inside it.
    pub(crate) fn current(&self) -> Option<(&RecordBatch, usize)> {
        let row = self.row?;
        let loaded = self.loaded.as_ref()?;
        let local = usize::try_from(row - loaded.first_row).ok()?;
        Some((&loaded.batch, local))
    }

    /// Position the cursor at global `row`, which must lie in the partition.
    pub(crate) fn seek(&mut self, row: u64) -> Result<()> {
        debug_assert!(self.range.contains(row));
        if self.loaded.as_ref().is_some_and(|b| b.contains(row)) {
            self.row = Some(row);
            return Ok(());
        }

        let can_stream = self
            .reader
            .as_ref()
            .is_some_and(|r| r.next_row <= row && row < r.end_row);
        if !can_stream {
            self.open_at(row)?;
        }
        self.pull_until(row)?;
        self.row = Some(row);
        Ok(())
    }

    fn open_at(&mut self, row: u64) -> Result<()> {
        let idx = self.files.partition_point(|f| f.end_row() <= row);
        let file = self.files.get(idx).ok_or_else(|| {
            Error::DatasetResolution(format!("row {row} is beyond the last input file"))
        })?;
        let end_row = file.end_row().min(self.range.end);
        let offset = to_usize(row - file.first_row)?;
        let limit = to_usize(end_row - row)?;

        log::trace!(
            "opening {} at local row {offset} ({limit} rows)",
            file.path.display()
        );
        let reader = open_row_range(&file.path, offset, limit, self.batch_size)?;
        self.reader = Some(OpenReader {
            reader,
            next_row: row,
            end_row,
        });
        self.loaded = None;
        Ok(())
    }

    fn pull_until(&mut self, row: u64) -> Result<()> {
        let open = self
            .reader
            .as_mut()
            .ok_or_else(|| Error::lifecycle("cursor has no open reader"))?;
        loop {
            let batch = open.reader.next().transpose()?.ok_or_else(|| {
                Error::DatasetResolution(format!(
                    "input ended before row {row} (expected rows up to {})",
                    open.end_row
                ))
            })?;
            let loaded = LoadedBatch {
                first_row: open.next_row,
                batch,
            };
            open.next_row += loaded.batch.num_rows() as u64;
            if loaded.contains(row) {
                self.loaded = Some(loaded);
                return Ok(());
            }
        }
    }
}

fn to_usize(n: u64) -> Result<usize> {
    usize::try_from(n).map_err(|_| Error::InvalidArgument(format!("row count {n} exceeds usize")))
}
