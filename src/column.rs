//! Column value types and their storage representations.
//!
//! Every readable Rust type maps to exactly one [`Representation`]:
//!
//! | Rust type          | Representation   | Arrow storage                         |
//! |--------------------|------------------|---------------------------------------|
//! | numeric, `bool`, `String` | `Scalar`  | primitive / `Boolean` / `Utf8`        |
//! | [`ArrayView<T>`]   | `NumericArray`   | `List` / `LargeList` of primitive `T` |
//! | `Vec<bool>`        | `BooleanArray`   | `List` / `LargeList` of `Boolean`     |
//!
//! Boolean lists store their values bit-packed, so they are decoded element by
//! element into a `Vec<bool>`; numeric lists are handed out as zero-copy views
//! into the list's value buffer.

use arrow::array::{Array, ArrayRef, AsArray, GenericListArray, OffsetSizeTrait};
use arrow::buffer::ScalarBuffer;
use arrow::datatypes::{
    ArrowNativeType, ArrowPrimitiveType, DataType, Float32Type, Float64Type, Int8Type, Int16Type,
    Int32Type, Int64Type, UInt8Type, UInt16Type, UInt32Type, UInt64Type,
};
use std::fmt;
use std::ops::{Deref, Range};

/// Storage shape of a column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Representation {
    /// One fixed-size value per row.
    Scalar,
    /// A variable-length sequence of numbers per row.
    NumericArray,
    /// A variable-length sequence of booleans per row, bit-packed on storage.
    BooleanArray,
}

impl fmt::Display for Representation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Scalar => "scalar",
            Self::NumericArray => "numeric array",
            Self::BooleanArray => "boolean array",
        })
    }
}

/// Native numeric element with a matching Arrow primitive type.
pub trait NumericElement: ArrowNativeType {
    type Arrow: ArrowPrimitiveType<Native = Self>;
}

macro_rules! numeric_elements {
    ($($native:ty => $arrow:ty),+ $(,)?) => {
        $(impl NumericElement for $native {
            type Arrow = $arrow;
        })+
    };
}

numeric_elements! {
    i8 => Int8Type,
    i16 => Int16Type,
    i32 => Int32Type,
    i64 => Int64Type,
    u8 => UInt8Type,
    u16 => UInt16Type,
    u32 => UInt32Type,
    u64 => UInt64Type,
    f32 => Float32Type,
    f64 => Float64Type,
}

/// Row-local view of a numeric array column.
///
/// Wraps a slice of the list's value buffer without copying elements. Every
/// read produces a new view; a view describes the row it was read at only.
#[derive(Clone, PartialEq)]
pub struct ArrayView<T: NumericElement>(ScalarBuffer<T>);

impl<T: NumericElement> ArrayView<T> {
    #[must_use]
    pub fn empty() -> Self {
        Self(ScalarBuffer::from(Vec::new()))
    }

    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.0
    }

    #[must_use]
    pub fn to_vec(&self) -> Vec<T> {
        self.0.to_vec()
    }

    /// The underlying Arrow buffer slice.
    #[must_use]
    pub fn into_buffer(self) -> ScalarBuffer<T> {
        self.0
    }
}

impl<T: NumericElement> Default for ArrayView<T> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: NumericElement> Deref for ArrayView<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        &self.0
    }
}

impl<T: NumericElement> fmt::Debug for ArrayView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.0.iter()).finish()
    }
}

impl<T: NumericElement> From<Vec<T>> for ArrayView<T> {
    fn from(v: Vec<T>) -> Self {
        Self(ScalarBuffer::from(v))
    }
}

/// A Rust type that a column can be read as.
///
/// `accepts` is checked once when a reader is bound; `extract` is then called
/// for every read and may assume the array has the accepted type. Scalars
/// return `None` for a null cell; array types read a null row as empty.
pub trait ColumnValue: Sized + 'static {
    const REPRESENTATION: Representation;

    /// Human-readable type name used in error messages.
    fn type_name() -> String;

    fn accepts(data_type: &DataType) -> bool;

    fn extract(array: &ArrayRef, row: usize) -> Option<Self>;
}

macro_rules! scalar_columns {
    ($($native:ty),+ $(,)?) => {
        $(impl ColumnValue for $native {
            const REPRESENTATION: Representation = Representation::Scalar;

            fn type_name() -> String {
                stringify!($native).to_string()
            }

            fn accepts(data_type: &DataType) -> bool {
                *data_type == <<$native as NumericElement>::Arrow as ArrowPrimitiveType>::DATA_TYPE
            }

            fn extract(array: &ArrayRef, row: usize) -> Option<Self> {
                let values = array.as_primitive::<<$native as NumericElement>::Arrow>();
                values.is_valid(row).then(|| values.value(row))
            }
        })+
    };
}

scalar_columns!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

impl ColumnValue for bool {
    const REPRESENTATION: Representation = Representation::Scalar;

    fn type_name() -> String {
        "bool".to_string()
    }

    fn accepts(data_type: &DataType) -> bool {
        *data_type == DataType::Boolean
    }

    fn extract(array: &ArrayRef, row: usize) -> Option<Self> {
        let values = array.as_boolean();
        values.is_valid(row).then(|| values.value(row))
    }
}

impl ColumnValue for String {
    const REPRESENTATION: Representation = Representation::Scalar;

    fn type_name() -> String {
        "String".to_string()
    }

    fn accepts(data_type: &DataType) -> bool {
        *data_type == DataType::Utf8
    }

    fn extract(array: &ArrayRef, row: usize) -> Option<Self> {
        let values = array.as_string::<i32>();
        values.is_valid(row).then(|| values.value(row).to_string())
    }
}

/// Element data type of a `List`/`LargeList` column.
fn list_item_type(data_type: &DataType) -> Option<&DataType> {
    match data_type {
        DataType::List(field) | DataType::LargeList(field) => Some(field.data_type()),
        _ => None,
    }
}

/// Value-buffer range of `row` in a list array; empty for null rows.
fn row_span<O: OffsetSizeTrait>(list: &GenericListArray<O>, row: usize) -> Range<usize> {
    if list.is_null(row) {
        return 0..0;
    }
    let offsets = list.value_offsets();
    offsets[row].as_usize()..offsets[row + 1].as_usize()
}

fn numeric_row<T: NumericElement, O: OffsetSizeTrait>(
    list: &GenericListArray<O>,
    row: usize,
) -> ArrayView<T> {
    let span = row_span(list, row);
    if span.is_empty() {
        return ArrayView::empty();
    }
    let values = list.values().as_primitive::<T::Arrow>().values();
    ArrayView(values.slice(span.start, span.len()))
}

fn boolean_row<O: OffsetSizeTrait>(list: &GenericListArray<O>, row: usize) -> Vec<bool> {
    let span = row_span(list, row);
    if span.is_empty() {
        return Vec::new();
    }
    // Bit-packed storage: decode one element at a time.
    let bits = list.values().as_boolean().values();
    bits.slice(span.start, span.len()).iter().collect()
}

impl<T: NumericElement> ColumnValue for ArrayView<T> {
    const REPRESENTATION: Representation = Representation::NumericArray;

    fn type_name() -> String {
        format!("ArrayView<{}>", std::any::type_name::<T>())
    }

    fn accepts(data_type: &DataType) -> bool {
        list_item_type(data_type) == Some(&<T::Arrow as ArrowPrimitiveType>::DATA_TYPE)
    }

    fn extract(array: &ArrayRef, row: usize) -> Option<Self> {
        Some(match array.data_type() {
            DataType::LargeList(_) => numeric_row(array.as_list::<i64>(), row),
            _ => numeric_row(array.as_list::<i32>(), row),
        })
    }
}

impl ColumnValue for Vec<bool> {
    const REPRESENTATION: Representation = Representation::BooleanArray;

    fn type_name() -> String {
        "Vec<bool>".to_string()
    }

    fn accepts(data_type: &DataType) -> bool {
        list_item_type(data_type) == Some(&DataType::Boolean)
    }

    fn extract(array: &ArrayRef, row: usize) -> Option<Self> {
        Some(match array.data_type() {
            DataType::LargeList(_) => boolean_row(array.as_list::<i64>(), row),
            _ => boolean_row(array.as_list::<i32>(), row),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{
        BooleanArray, BooleanBuilder, Float32Array, Float32Builder, ListBuilder, StringArray,
    };
    use std::sync::Arc;

    fn float_lists(rows: &[&[f32]]) -> ArrayRef {
        let mut b = ListBuilder::new(Float32Builder::new());
        for row in rows {
            b.values().append_slice(row);
            b.append(true);
        }
        Arc::new(b.finish())
    }

    #[test]
    fn numeric_view_slices_the_right_row() {
        let arr = float_lists(&[&[1.0, 2.0], &[], &[3.0, 4.0, 5.0]]);
        let view = |row| ArrayView::<f32>::extract(&arr, row).unwrap().to_vec();
        assert_eq!(view(0), vec![1.0, 2.0]);
        assert!(view(1).is_empty());
        assert_eq!(view(2), vec![3.0, 4.0, 5.0]);
    }

    #[test]
    fn null_scalars_are_reported_not_defaulted() {
        let floats: ArrayRef = Arc::new(Float32Array::from(vec![Some(1.5), None]));
        let labels: ArrayRef = Arc::new(StringArray::from(vec![Some("a"), None]));
        let flags: ArrayRef = Arc::new(BooleanArray::from(vec![None, Some(false)]));

        assert_eq!(f32::extract(&floats, 0), Some(1.5));
        assert_eq!(f32::extract(&floats, 1), None);
        assert_eq!(String::extract(&labels, 0).as_deref(), Some("a"));
        assert_eq!(String::extract(&labels, 1), None);
        assert_eq!(bool::extract(&flags, 0), None);
        assert_eq!(bool::extract(&flags, 1), Some(false));
    }

    #[test]
    fn null_list_rows_read_as_empty() {
        let mut b = ListBuilder::new(BooleanBuilder::new());
        b.append(false);
        let arr: ArrayRef = Arc::new(b.finish());
        assert_eq!(Vec::<bool>::extract(&arr, 0), Some(Vec::new()));
    }

    #[test]
    fn boolean_lists_decode_bit_by_bit() {
        let mut b = ListBuilder::new(BooleanBuilder::new());
        // Offset the second row inside a byte so packing matters.
        b.values().append_slice(&[false, true, true, false, true]);
        b.append(true);
        b.values().append_slice(&[true, false, true]);
        b.append(true);
        let arr: ArrayRef = Arc::new(b.finish());

        assert_eq!(Vec::<bool>::extract(&arr, 1), Some(vec![true, false, true]));
        assert_eq!(
            Vec::<bool>::extract(&arr, 0),
            Some(vec![false, true, true, false, true])
        );
    }

    #[test]
    fn acceptance_is_representation_specific() {
        let f32_list = float_lists(&[]).data_type().clone();
        assert!(ArrayView::<f32>::accepts(&f32_list));
        assert!(!ArrayView::<f64>::accepts(&f32_list));
        assert!(!Vec::<bool>::accepts(&f32_list));
        assert!(!f32::accepts(&f32_list));
        assert!(f32::accepts(&DataType::Float32));
        assert!(!f64::accepts(&DataType::Float32));
        assert_eq!(<ArrayView<f32>>::REPRESENTATION, Representation::NumericArray);
    }
}
