//! Column readers bound to a slot cursor.

use crate::column::{ColumnValue, Representation};
use crate::cursor::RowCursor;
use crate::error::{Error, Result};
use std::cell::RefCell;
use std::marker::PhantomData;

/// Reads one column at the current row of a slot.
///
/// A reader borrows its slot's cursor without owning it: the slot advances the
/// cursor and every reader bound to it observes the new row. Because the borrow
/// ties the reader's lifetime to the [`Slot`](crate::source::Slot), a reader can
/// never be used after the slot is finalized.
pub struct ColumnReader<'slot, T: ColumnValue> {
    name: String,
    index: usize,
    cursor: &'slot RefCell<RowCursor>,
    _t: PhantomData<fn() -> T>,
}

impl<'slot, T: ColumnValue> ColumnReader<'slot, T> {
    pub(crate) fn new(name: &str, index: usize, cursor: &'slot RefCell<RowCursor>) -> Self {
        Self {
            name: name.to_string(),
            index,
            cursor,
            _t: PhantomData,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn representation(&self) -> Representation {
        T::REPRESENTATION
    }

    /// Value at `row`, which must be the row the slot cursor currently holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLifecycle`] if the cursor is not at `row`, or
    /// [`Error::NullValue`] if a scalar column is null there.
    pub fn read(&self, row: u64) -> Result<T> {
        let cursor = self.cursor.borrow();
        match cursor.row() {
            Some(current) if current == row => self.extract(&cursor),
            current => Err(Error::lifecycle(format!(
                "reader `{}` asked for row {row} but the cursor is at {current:?}",
                self.name
            ))),
        }
    }

    /// Value at whatever row the cursor currently holds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidLifecycle`] if the cursor has no current row, or
    /// [`Error::NullValue`] if a scalar column is null there.
    pub fn value(&self) -> Result<T> {
        self.extract(&self.cursor.borrow())
    }

    fn extract(&self, cursor: &RowCursor) -> Result<T> {
        let (batch, local) = cursor.current().ok_or_else(|| {
            Error::lifecycle(format!("reader `{}` used with no current row", self.name))
        })?;
        T::extract(batch.column(self.index), local).ok_or_else(|| Error::NullValue {
            column: self.name.clone(),
            row: cursor.row().unwrap_or_default(),
        })
    }
}
