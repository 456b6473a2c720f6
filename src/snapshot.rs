//! Snapshot writer: per-slot output tables and their merge.
//!
//! A [`Snapshot<R>`] is declared for a fixed tuple type `R` of output values,
//! e.g. `Snapshot<(i64, f32, Vec<bool>)>`, plus one column name per tuple
//! element. Each slot owns its own snapshot and appends one tuple per accepted
//! row; after every slot has produced its [`result`](Snapshot::result), a single
//! [`merge`](Snapshot::merge) concatenates the per-slot tables.
//!
//! ```
//! use slotsource::snapshot::Snapshot;
//!
//! let mut snap = Snapshot::<(i64, f64)>::new("out", &["id", "weight"])?;
//! snap.append((1, 0.5));
//! snap.append((2, 1.5));
//! let table = snap.result()?;
//! assert_eq!(table.num_rows(), 2);
//!
//! let merged = snap.merge(&[table.clone(), table])?;
//! assert_eq!(merged.num_rows(), 4);
//! # Ok::<(), slotsource::Error>(())
//! ```

use crate::column::{ArrayView, NumericElement};
use crate::error::{Error, Result};
use arrow::array::{
    ArrayBuilder, ArrayRef, BooleanBuilder, ListBuilder, PrimitiveBuilder, StringBuilder,
};
use arrow::compute::concat_batches;
use arrow::datatypes::{Field, Schema, SchemaRef};
use arrow::record_batch::RecordBatch;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::sync::Arc;

/// An in-memory output table: a name and one Arrow record batch.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    name: String,
    batch: RecordBatch,
}

impl Table {
    pub fn new(name: impl Into<String>, batch: RecordBatch) -> Self {
        Self {
            name: name.into(),
            batch,
        }
    }

    /// Zero-row table with the given schema.
    pub fn empty(name: impl Into<String>, schema: SchemaRef) -> Self {
        Self::new(name, RecordBatch::new_empty(schema))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn schema(&self) -> SchemaRef {
        self.batch.schema()
    }

    #[must_use]
    pub fn num_rows(&self) -> usize {
        self.batch.num_rows()
    }

    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.batch.num_columns()
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&ArrayRef> {
        self.batch.column_by_name(name)
    }

    #[must_use]
    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    #[must_use]
    pub fn into_batch(self) -> RecordBatch {
        self.batch
    }

    /// Deserialize every row into `T` (field names map to column names).
    ///
    /// # Errors
    ///
    /// Returns an error if the columns cannot be mapped onto `T`.
    pub fn rows<T: DeserializeOwned>(&self) -> Result<Vec<T>> {
        let rows = serde_arrow::from_record_batch(&self.batch).map_err(anyhow::Error::from)?;
        Ok(rows)
    }
}

/// A value type that can be appended to a snapshot column.
pub trait SnapshotValue: Sized {
    type Builder: ArrayBuilder;

    fn new_builder() -> Self::Builder;

    fn append_to(self, builder: &mut Self::Builder);
}

macro_rules! numeric_snapshot_values {
    ($($native:ty),+ $(,)?) => {
        $(
            impl SnapshotValue for $native {
                type Builder = PrimitiveBuilder<<$native as NumericElement>::Arrow>;

                fn new_builder() -> Self::Builder {
                    PrimitiveBuilder::new()
                }

                fn append_to(self, builder: &mut Self::Builder) {
                    builder.append_value(self);
                }
            }

            impl SnapshotValue for Vec<$native> {
                type Builder = ListBuilder<PrimitiveBuilder<<$native as NumericElement>::Arrow>>;

                fn new_builder() -> Self::Builder {
                    ListBuilder::new(PrimitiveBuilder::new())
                }

                fn append_to(self, builder: &mut Self::Builder) {
                    builder.values().append_slice(&self);
                    builder.append(true);
                }
            }
        )+
    };
}

numeric_snapshot_values!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl<T: NumericElement> SnapshotValue for ArrayView<T> {
    type Builder = ListBuilder<PrimitiveBuilder<T::Arrow>>;

    fn new_builder() -> Self::Builder {
        ListBuilder::new(PrimitiveBuilder::new())
    }

    fn append_to(self, builder: &mut Self::Builder) {
        builder.values().append_slice(self.as_slice());
        builder.append(true);
    }
}

impl SnapshotValue for bool {
    type Builder = BooleanBuilder;

    fn new_builder() -> Self::Builder {
        BooleanBuilder::new()
    }

    fn append_to(self, builder: &mut Self::Builder) {
        builder.append_value(self);
    }
}

impl SnapshotValue for Vec<bool> {
    type Builder = ListBuilder<BooleanBuilder>;

    fn new_builder() -> Self::Builder {
        ListBuilder::new(BooleanBuilder::new())
    }

    fn append_to(self, builder: &mut Self::Builder) {
        builder.values().append_slice(&self);
        builder.append(true);
    }
}

impl SnapshotValue for String {
    type Builder = StringBuilder;

    fn new_builder() -> Self::Builder {
        StringBuilder::new()
    }

    fn append_to(self, builder: &mut Self::Builder) {
        builder.append_value(self);
    }
}

/// A fixed-arity tuple of [`SnapshotValue`]s forming one output row.
///
/// Implemented for tuples of 1 to 8 elements.
pub trait SnapshotRow: Sized {
    type Builders: Send + Sync;

    const ARITY: usize;

    fn new_builders() -> Self::Builders;

    /// Push every element into its builder. Builders never fail, so the row
    /// is either fully appended or (on panic) the snapshot is gone.
    fn append_row(self, builders: &mut Self::Builders);

    fn finish_cloned(builders: &Self::Builders) -> Vec<ArrayRef>;
}

macro_rules! snapshot_rows {
    ($($arity:literal => ($($T:ident $idx:tt),+);)+) => {
        $(
            impl<$($T: SnapshotValue),+> SnapshotRow for ($($T,)+) {
                type Builders = ($(<$T as SnapshotValue>::Builder,)+);

                const ARITY: usize = $arity;

                fn new_builders() -> Self::Builders {
                    ($(<$T as SnapshotValue>::new_builder(),)+)
                }

                fn append_row(self, builders: &mut Self::Builders) {
                    $(self.$idx.append_to(&mut builders.$idx);)+
                }

                fn finish_cloned(builders: &Self::Builders) -> Vec<ArrayRef> {
                    vec![$(ArrayBuilder::finish_cloned(&builders.$idx)),+]
                }
            }
        )+
    };
}

snapshot_rows! {
    1 => (A 0);
    2 => (A 0, B 1);
    3 => (A 0, B 1, C 2);
    4 => (A 0, B 1, C 2, D 3);
    5 => (A 0, B 1, C 2, D 3, E 4);
    6 => (A 0, B 1, C 2, D 3, E 4, F 5);
    7 => (A 0, B 1, C 2, D 3, E 4, F 5, G 6);
    8 => (A 0, B 1, C 2, D 3, E 4, F 5, G 6, H 7);
}

/// Builds one output table for a fixed tuple of typed columns.
pub struct Snapshot<R: SnapshotRow> {
    table_name: String,
    schema: SchemaRef,
    builders: R::Builders,
    rows: usize,
}

impl<R: SnapshotRow> Snapshot<R> {
    /// Declare the output table. `names[i]` names the `i`-th tuple element.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if the number of names differs from the tuple
    /// arity or a name repeats.
    pub fn new(table_name: impl Into<String>, names: &[&str]) -> Result<Self> {
        if names.len() != R::ARITY {
            return Err(Error::schema(format!(
                "{} column names given for a {}-column snapshot",
                names.len(),
                R::ARITY
            )));
        }
        let mut seen = HashSet::new();
        if let Some(dup) = names.iter().find(|n| !seen.insert(**n)) {
            return Err(Error::schema(format!("duplicate column name `{dup}`")));
        }

        let builders = R::new_builders();
        // Column types come from the builders themselves so the schema always
        // matches the arrays `result` produces.
        let fields: Vec<Field> = names
            .iter()
            .zip(R::finish_cloned(&builders))
            .map(|(name, array)| Field::new(*name, array.data_type().clone(), false))
            .collect();

        Ok(Self {
            table_name: table_name.into(),
            schema: Arc::new(Schema::new(fields)),
            builders,
            rows: 0,
        })
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    #[must_use]
    pub fn schema(&self) -> &SchemaRef {
        &self.schema
    }

    /// Rows appended so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    /// Append one row: one value to every column.
    pub fn append(&mut self, row: R) {
        row.append_row(&mut self.builders);
        self.rows += 1;
    }

    /// The table accumulated so far. Appending later does not affect tables
    /// already returned.
    ///
    /// # Errors
    ///
    /// Returns an Arrow error if the columns cannot form a record batch.
    pub fn result(&self) -> Result<Table> {
        let batch =
            RecordBatch::try_new(Arc::clone(&self.schema), R::finish_cloned(&self.builders))?;
        debug_assert_eq!(batch.num_rows(), self.rows);
        Ok(Table::new(self.table_name.clone(), batch))
    }

    /// Concatenate per-slot tables, in the order given, into one table.
    ///
    /// # Errors
    ///
    /// [`Error::SchemaMismatch`] if any table's columns differ from this
    /// snapshot's schema.
    pub fn merge(&self, tables: &[Table]) -> Result<Table> {
        merge_tables(&self.table_name, &self.schema, tables)
    }
}

/// Check that `table` has exactly the columns of `schema` (names and types),
/// with no nulls where `schema` forbids them.
fn check_schema(schema: &SchemaRef, table: &Table, position: usize) -> Result<()> {
    let theirs = table.schema();
    if theirs.fields().len() != schema.fields().len() {
        return Err(Error::schema(format!(
            "table {position} has {} columns, expected {}",
            theirs.fields().len(),
            schema.fields().len()
        )));
    }
    let columns = table.batch().columns();
    let fields = schema.fields().iter().zip(theirs.fields().iter());
    for ((ours, other), column) in fields.zip(columns.iter()) {
        if ours.name() != other.name() || ours.data_type() != other.data_type() {
            return Err(Error::schema(format!(
                "table {position} has column `{}: {}`, expected `{}: {}`",
                other.name(),
                other.data_type(),
                ours.name(),
                ours.data_type()
            )));
        }
        if !ours.is_nullable() && column.null_count() > 0 {
            return Err(Error::schema(format!(
                "table {position} has {} null(s) in non-nullable column `{}`",
                column.null_count(),
                ours.name()
            )));
        }
    }
    Ok(())
}

/// Concatenate `tables` into one table named `name` with `schema`.
///
/// Rows keep the order of `tables`; an empty slice yields an empty table.
///
/// # Errors
///
/// [`Error::SchemaMismatch`] if any table's columns differ from `schema`; no
/// partial table is produced.
pub fn merge_tables(name: &str, schema: &SchemaRef, tables: &[Table]) -> Result<Table> {
    for (i, table) in tables.iter().enumerate() {
        check_schema(schema, table, i)?;
    }

    let batches: Vec<RecordBatch> = tables
        .iter()
        .map(|t| RecordBatch::try_new(Arc::clone(schema), t.batch().columns().to_vec()))
        .collect::<std::result::Result<_, _>>()?;
    let merged = concat_batches(schema, &batches)?;
    log::debug!(
        "merged {} table(s) into `{name}` ({} rows)",
        tables.len(),
        merged.num_rows()
    );
    Ok(Table::new(name, merged))
}
