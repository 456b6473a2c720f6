//! Parquet storage for tables.
//!
//! This module provides:
//! - [`write_table`] / [`read_table`] to persist a [`Table`] and load it back,
//!   with the table name stored in the file key-value metadata under
//!   [`TABLE_NAME_KEY`].
//! - [`inspect_file`] to read just the footer (table name, schema, row count),
//!   which is what dataset resolution needs.
//! - [`open_row_range`] to stream a contiguous row range of one file, which is
//!   what a slot cursor needs.

use crate::error::{Error, Result};
use crate::snapshot::Table;
use anyhow::Context;
use arrow::compute::concat_batches;
use arrow::datatypes::{Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::{ParquetRecordBatchReader, ParquetRecordBatchReaderBuilder};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::file::metadata::{KeyValue, ParquetMetaData};
use parquet::file::properties::WriterProperties;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Key-value metadata entry naming the table stored in a file.
pub const TABLE_NAME_KEY: &str = "slotsource.table";

/// Footer summary of one Parquet file.
#[derive(Clone, Debug)]
pub struct FileInfo {
    pub path: PathBuf,
    /// Value of [`TABLE_NAME_KEY`], if present.
    pub table: Option<String>,
    pub schema: SchemaRef,
    pub num_rows: u64,
}

fn table_name_of(meta: &ParquetMetaData) -> Option<String> {
    meta.file_metadata()
        .key_value_metadata()?
        .iter()
        .find(|kv| kv.key == TABLE_NAME_KEY)
        .and_then(|kv| kv.value.clone())
}

/// Read a file footer.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or is not valid Parquet.
pub fn inspect_file(path: impl AsRef<Path>) -> anyhow::Result<FileInfo> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .with_context(|| format!("read parquet footer of {}", path.display()))?;
    let meta = builder.metadata();
    let num_rows = u64::try_from(meta.file_metadata().num_rows())
        .with_context(|| format!("negative row count in {}", path.display()))?;

    Ok(FileInfo {
        path: path.to_path_buf(),
        table: table_name_of(meta),
        schema: Arc::clone(builder.schema()),
        num_rows,
    })
}

/// Open a streaming reader over `limit` rows starting at file-local row `offset`.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or the reader cannot be built.
pub fn open_row_range(
    path: &Path,
    offset: usize,
    limit: usize,
    batch_size: usize,
) -> Result<ParquetRecordBatchReader> {
    let file = File::open(path)?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)?
        .with_batch_size(batch_size.max(1))
        .with_offset(offset)
        .with_limit(limit)
        .build()?;
    Ok(reader)
}

/// Write a table to a single Parquet file.
///
/// Schema-level metadata carried by the batch is dropped; the file metadata
/// only records the table name. Zero-row tables are written as well.
///
/// Returns the number of rows written.
///
/// # Errors
///
/// Returns an error if the file cannot be created or writing fails.
pub fn write_table(path: impl AsRef<Path>, table: &Table) -> Result<usize> {
    write_table_inner(path.as_ref(), table).map_err(Error::from)
}

fn write_table_inner(path: &Path, table: &Table) -> anyhow::Result<usize> {
    let batch = table.batch();
    let schema = Arc::new(Schema::new(batch.schema().fields().clone()));
    let batch = RecordBatch::try_new(Arc::clone(&schema), batch.columns().to_vec())
        .context("strip schema metadata")?;

    let props = WriterProperties::builder()
        .set_key_value_metadata(Some(vec![KeyValue::new(
            TABLE_NAME_KEY.to_string(),
            table.name().to_string(),
        )]))
        .build();

    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    let mut writer = ArrowWriter::try_new(file, schema, Some(props)).context("create ArrowWriter")?;
    writer.write(&batch).context("write batch to parquet")?;
    writer.close().context("close ArrowWriter")?;

    log::debug!(
        "wrote table `{}` ({} rows) to {}",
        table.name(),
        batch.num_rows(),
        path.display()
    );
    Ok(batch.num_rows())
}

/// Read a whole file into a table, checking that it stores `table_name`.
///
/// # Errors
///
/// Returns [`Error::DatasetResolution`] if the file does not contain the table,
/// or an I/O / Parquet error if reading fails.
pub fn read_table(path: impl AsRef<Path>, table_name: &str) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)?;
    match table_name_of(builder.metadata()).as_deref() {
        Some(found) if found == table_name => {}
        found => {
            return Err(Error::DatasetResolution(format!(
                "{} does not contain table `{table_name}` (found {found:?})",
                path.display()
            )));
        }
    }

    let schema = Arc::clone(builder.schema());
    let batches = builder
        .build()?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let batch = concat_batches(&schema, &batches)?;
    Ok(Table::new(table_name, batch))
}
