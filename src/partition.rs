//! Row-range partitioning across execution slots.
//!
//! A dataset exposes one logical row space `[0, total)` (the union of all its
//! files, taken as contiguous). [`partition_rows`] cuts that space into one
//! half-open [`Partition`] per slot, in slot order, with no gaps or overlaps.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A half-open range `[begin, end)` of global row indices owned by one slot.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Partition {
    pub begin: u64,
    pub end: u64,
}

impl Partition {
    /// Construct a partition. `end` is clamped so that `end >= begin`.
    #[must_use]
    pub fn new(begin: u64, end: u64) -> Self {
        Self {
            begin,
            end: end.max(begin),
        }
    }

    #[must_use]
    pub fn len(&self) -> u64 {
        self.end - self.begin
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.begin == self.end
    }

    #[must_use]
    pub fn contains(&self, row: u64) -> bool {
        self.begin <= row && row < self.end
    }

    /// Row indices in visiting order.
    #[must_use]
    pub fn rows(&self) -> Range<u64> {
        self.begin..self.end
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.begin, self.end)
    }
}

/// Split `[0, total)` into `slots` contiguous partitions.
///
/// Every slot receives `total / slots` rows; the first `total % slots` slots
/// take one extra row each. The result always has exactly `slots` entries, so
/// `total == 0` yields `slots` empty partitions and no row is processed.
///
/// ```
/// use slotsource::partition::{partition_rows, Partition};
///
/// let parts = partition_rows(10, 3)?;
/// assert_eq!(parts, vec![Partition::new(0, 4), Partition::new(4, 7), Partition::new(7, 10)]);
/// # Ok::<(), slotsource::Error>(())
/// ```
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] when `slots == 0`.
pub fn partition_rows(total: u64, slots: usize) -> Result<Vec<Partition>> {
    if slots == 0 {
        return Err(Error::InvalidArgument("slot count must be at least 1".into()));
    }
    let n = slots as u64;
    let base = total / n;
    let extra = total % n;

    let mut out = Vec::with_capacity(slots);
    let mut begin = 0u64;
    for i in 0..n {
        let len = base + u64::from(i < extra);
        out.push(Partition::new(begin, begin + len));
        begin += len;
    }
    debug_assert_eq!(begin, total);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_cover(parts: &[Partition], total: u64) {
        assert_eq!(parts.first().map(|p| p.begin), Some(0));
        assert_eq!(parts.last().map(|p| p.end), Some(total));
        for w in parts.windows(2) {
            assert_eq!(w[0].end, w[1].begin);
        }
        assert_eq!(parts.iter().map(Partition::len).sum::<u64>(), total);
    }

    #[test]
    fn covers_every_row_for_small_grids() {
        for total in 0..40u64 {
            for slots in 1..9usize {
                let parts = partition_rows(total, slots).unwrap();
                assert_eq!(parts.len(), slots);
                assert_cover(&parts, total);
                let max = parts.iter().map(Partition::len).max().unwrap();
                let min = parts.iter().map(Partition::len).min().unwrap();
                assert!(max - min <= 1, "unbalanced split for ({total}, {slots})");
            }
        }
    }

    #[test]
    fn single_slot_takes_everything() {
        assert_eq!(partition_rows(17, 1).unwrap(), vec![Partition::new(0, 17)]);
    }

    #[test]
    fn empty_dataset_gives_empty_ranges() {
        let parts = partition_rows(0, 4).unwrap();
        assert!(parts.iter().all(Partition::is_empty));
    }

    #[test]
    fn more_slots_than_rows() {
        let parts = partition_rows(2, 5).unwrap();
        assert_eq!(
            parts,
            vec![
                Partition::new(0, 1),
                Partition::new(1, 2),
                Partition::new(2, 2),
                Partition::new(2, 2),
                Partition::new(2, 2),
            ]
        );
    }

    #[test]
    fn zero_slots_is_rejected() {
        assert!(matches!(partition_rows(10, 0), Err(Error::InvalidArgument(_))));
    }

    #[test]
    fn display_is_half_open() {
        assert_eq!(Partition::new(4, 7).to_string(), "[4, 7)");
    }
}
