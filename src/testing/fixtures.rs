//! Generated event tables for tests.
//!
//! Row `id` of the generated table has:
//!
//! | column   | type             | value                                   |
//! |----------|------------------|-----------------------------------------|
//! | `id`     | `Int64`          | `id`                                    |
//! | `weight` | `Float32`        | `id * 0.5`                              |
//! | `label`  | `Utf8`           | `"ev{id}"`                              |
//! | `pt`     | `List<Float32>`  | [`expected_pt`], empty when `id % 4 == 0` |
//! | `passed` | `List<Boolean>`  | [`expected_passed`]                     |

use crate::dataset::Dataset;
use crate::error::Result;
use crate::io::parquet::write_table;
use crate::snapshot::Table;
use arrow::array::{
    ArrayRef, BooleanBuilder, Float32Array, Float32Builder, Int64Array, ListBuilder, StringArray,
};
use arrow::record_batch::RecordBatch;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Table name used by the generated event files.
pub const EVENTS_TABLE: &str = "events";

/// Expected `pt` array for event `id`.
#[must_use]
pub fn expected_pt(id: i64) -> Vec<f32> {
    (0..id.rem_euclid(4)).map(|j| (id * 10 + j) as f32).collect()
}

/// Expected `passed` array for event `id`.
#[must_use]
pub fn expected_passed(id: i64) -> Vec<bool> {
    (0..id.rem_euclid(5)).map(|j| (id + j) % 2 == 0).collect()
}

/// Build `n` events with ids `first_id..first_id + n`.
///
/// # Panics
///
/// Panics if the generated columns do not form a valid batch, which would be a
/// bug in this function.
#[must_use]
pub fn sample_events(first_id: i64, n: usize) -> RecordBatch {
    let ids: Vec<i64> = (first_id..).take(n).collect();

    let mut pt = ListBuilder::new(Float32Builder::new());
    let mut passed = ListBuilder::new(BooleanBuilder::new());
    for &id in &ids {
        pt.values().append_slice(&expected_pt(id));
        pt.append(true);
        passed.values().append_slice(&expected_passed(id));
        passed.append(true);
    }

    let columns: Vec<(&str, ArrayRef)> = vec![
        ("id", Arc::new(Int64Array::from(ids.clone()))),
        (
            "weight",
            Arc::new(Float32Array::from_iter_values(
                ids.iter().map(|&id| id as f32 * 0.5),
            )),
        ),
        (
            "label",
            Arc::new(StringArray::from_iter_values(
                ids.iter().map(|id| format!("ev{id}")),
            )),
        ),
        ("pt", Arc::new(pt.finish())),
        ("passed", Arc::new(passed.finish())),
    ];
    RecordBatch::try_from_iter(columns).expect("valid event batch")
}

/// Write `batch` as table `table_name` into `path`.
///
/// # Errors
///
/// Returns an error if the file cannot be written.
pub fn write_fixture(path: impl AsRef<Path>, table_name: &str, batch: RecordBatch) -> Result<()> {
    write_table(path, &Table::new(table_name, batch))?;
    Ok(())
}

/// Write consecutive event ranges of the given sizes into
/// `dir/part-000.parquet`, `dir/part-001.parquet`, ... and return the paths.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn split_fixture(dir: &Path, table_name: &str, sizes: &[usize]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(sizes.len());
    let mut first_id = 0i64;
    for (i, &n) in sizes.iter().enumerate() {
        let path = dir.join(format!("part-{i:03}.parquet"));
        write_fixture(&path, table_name, sample_events(first_id, n))?;
        first_id += n as i64;
        paths.push(path);
    }
    Ok(paths)
}

/// Write an event dataset split into files of the given sizes and describe it
/// with a glob pattern over `dir`.
///
/// # Errors
///
/// Returns an error if a file cannot be written.
pub fn events_dataset(dir: &Path, sizes: &[usize]) -> Result<Dataset> {
    split_fixture(dir, EVENTS_TABLE, sizes)?;
    let pattern = dir.join("part-*.parquet").display().to_string();
    Ok(Dataset::new([pattern], EVENTS_TABLE))
}
