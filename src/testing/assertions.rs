//! Row-level assertions for tables.

use crate::snapshot::Table;
use arrow::util::display::{ArrayFormatter, FormatOptions};

/// Render every row of `table` as one string per column.
///
/// # Panics
///
/// Panics if a column type has no display formatter.
#[must_use]
pub fn table_rows(table: &Table) -> Vec<Vec<String>> {
    let options = FormatOptions::default();
    let formatters: Vec<ArrayFormatter<'_>> = table
        .batch()
        .columns()
        .iter()
        .map(|col| ArrayFormatter::try_new(col.as_ref(), &options).expect("displayable column"))
        .collect();

    (0..table.num_rows())
        .map(|row| formatters.iter().map(|f| f.value(row).to_string()).collect())
        .collect()
}

/// Assert that two tables hold the same multiset of rows, ignoring row order.
///
/// # Panics
///
/// Panics if the column names or the rows differ.
pub fn assert_same_rows(actual: &Table, expected: &Table) {
    let names = |t: &Table| -> Vec<String> {
        t.schema().fields().iter().map(|f| f.name().clone()).collect()
    };
    assert_eq!(
        names(actual),
        names(expected),
        "Column mismatch:\n  Expected: {:?}\n  Actual: {:?}",
        names(expected),
        names(actual)
    );

    let mut a = table_rows(actual);
    let mut e = table_rows(expected);
    a.sort();
    e.sort();
    assert_eq!(
        a.len(),
        e.len(),
        "Row count mismatch:\n  Expected: {}\n  Actual: {}",
        e.len(),
        a.len()
    );
    assert_eq!(a, e, "Row multiset mismatch");
}
