use std::cmp::Ordering;
use std::ops::Range;
use std::sync::Arc;
use crate::bits::BitVector;
use crate::blob::Blob;
use crate::core::error::{Error, ErrorKind, Result};
use crate::data::{PackedInts, Value, ValueEncoder};
use crate::index::RowMarker;

/// Permutation of value-ids in ascending value order.
///
/// `search` follows the usual binary-search contract: a hit returns the
/// permutation position, a miss returns `-(insertion_point + 1)`.
pub struct SortedIndex {
    permutation: PackedInts,
}

impl SortedIndex {
    pub const REGIONS: usize = 1;

    pub fn open(blob: Arc<dyn Blob>, slot: usize, cardinality: u64, rows_per_block: u64) -> Result<Self> {
        Ok(SortedIndex {
            permutation: PackedInts::open(blob, slot, cardinality, rows_per_block)?,
        })
    }

    pub fn len(&self) -> u64 {
        self.permutation.len()
    }

    pub fn is_empty(&self) -> bool {
        self.permutation.is_empty()
    }

    /// Largest value-id the permutation can hold.
    pub fn max_value_id(&self) -> u32 {
        self.permutation.max_value()
    }

    /// Value-id stored at permutation position `pos`.
    pub fn value_id(&self, pos: u64) -> Result<u32> {
        self.permutation.get(pos)
    }

    pub fn search(&self, encoder: &ValueEncoder, value: &Value) -> Result<i64> {
        let mut low: i64 = 0;
        let mut high: i64 = self.permutation.len() as i64 - 1;

        while low <= high {
            let mid = low + (high - low) / 2;
            let id = self.permutation.get(mid as u64)?;
            let mid_val = encoder.get(id)?;

            match encoder.compare(&mid_val, value) {
                Ordering::Less => low = mid + 1,
                Ordering::Greater => high = mid - 1,
                Ordering::Equal => return Ok(mid),
            }
        }
        Ok(-(low + 1))
    }

    /// Insertion point encoded in a `search` result.
    pub fn insertion_point(search: i64) -> u64 {
        if search >= 0 {
            search as u64
        } else {
            (-(search + 1)) as u64
        }
    }

    /// Place `value_id` so the permutation stays ordered.
    ///
    /// An existing equal value is an error with `ensure_unique`, otherwise
    /// the call leaves the permutation untouched.
    pub fn sort(&mut self, encoder: &ValueEncoder, value: &Value, value_id: u32, ensure_unique: bool) -> Result<()> {
        let found = self.search(encoder, value)?;
        if found >= 0 {
            if ensure_unique {
                let existing = self.permutation.get(found as u64)?;
                return Err(Error::new(
                    ErrorKind::UniquenessViolation,
                    format!("key {} already stored as value-id {}, repeat value-id {}", value, existing, value_id),
                ));
            }
            return Ok(());
        }

        let at = Self::insertion_point(found);
        if at >= self.permutation.len() {
            self.permutation.add(value_id)?;
        } else {
            self.permutation.insert(at, value_id)?;
        }
        Ok(())
    }

    /// Value-ids held at permutation positions `range`, in order.
    pub fn ids_in(&self, range: Range<u64>) -> Result<Vec<u32>> {
        if range.start >= range.end {
            return Ok(Vec::new());
        }
        let width = self.permutation.width();
        let raw = self.permutation.read_rows(range.start, range.end - range.start)?;
        Ok(raw.chunks_exact(width).map(PackedInts::from_bytes).collect())
    }

    /// Positions of the values in `values` that are present.
    pub fn eq_positions(&self, encoder: &ValueEncoder, values: &[Value]) -> Result<Vec<u64>> {
        let mut positions = Vec::with_capacity(values.len());
        for value in values {
            let found = self.search(encoder, value)?;
            if found >= 0 && !positions.contains(&(found as u64)) {
                positions.push(found as u64);
            }
        }
        Ok(positions)
    }

    /// Positions holding values strictly greater than `value`.
    pub fn gt_range(&self, encoder: &ValueEncoder, value: &Value) -> Result<Range<u64>> {
        let found = self.search(encoder, value)?;
        let start = if found >= 0 { found as u64 + 1 } else { Self::insertion_point(found) };
        Ok(start..self.len())
    }

    /// Positions holding values strictly smaller than `value`.
    pub fn lt_range(&self, encoder: &ValueEncoder, value: &Value) -> Result<Range<u64>> {
        let found = self.search(encoder, value)?;
        Ok(0..Self::insertion_point(found))
    }

    /// `[|search(low)|, min(|search(high)|, len))`, empty when the start is
    /// already past the end.
    ///
    /// A present `low` is included and a present `high` is excluded. An
    /// absent `low` also skips the first stored value above it; an absent
    /// `high` also takes the first stored value above it.
    pub fn between_range(&self, encoder: &ValueEncoder, low: &Value, high: &Value) -> Result<Range<u64>> {
        let n = self.len();
        let from = self.search(encoder, low)?.unsigned_abs();
        if from >= n {
            return Ok(0..0);
        }
        let to = self.search(encoder, high)?.unsigned_abs().min(n);
        Ok(from..to.max(from))
    }

    pub fn eq(
        &self,
        encoder: &ValueEncoder,
        values: &[Value],
        marker: &dyn RowMarker,
        rows: usize,
    ) -> Result<BitVector> {
        let mut set = BitVector::new(rows);
        for pos in self.eq_positions(encoder, values)? {
            marker.mark(&mut set, self.permutation.get(pos)?)?;
        }
        Ok(set)
    }

    /// Complement of [`eq`](Self::eq) over `[0, rows)`.
    pub fn not(
        &self,
        encoder: &ValueEncoder,
        values: &[Value],
        marker: &dyn RowMarker,
        rows: usize,
    ) -> Result<BitVector> {
        let mut set = self.eq(encoder, values, marker, rows)?;
        set.not();
        Ok(set)
    }

    pub fn gt(&self, encoder: &ValueEncoder, value: &Value, marker: &dyn RowMarker, rows: usize) -> Result<BitVector> {
        let range = self.gt_range(encoder, value)?;
        self.mark_range(range, marker, rows)
    }

    pub fn lt(&self, encoder: &ValueEncoder, value: &Value, marker: &dyn RowMarker, rows: usize) -> Result<BitVector> {
        let range = self.lt_range(encoder, value)?;
        self.mark_range(range, marker, rows)
    }

    pub fn between(
        &self,
        encoder: &ValueEncoder,
        low: &Value,
        high: &Value,
        marker: &dyn RowMarker,
        rows: usize,
    ) -> Result<BitVector> {
        let range = self.between_range(encoder, low, high)?;
        self.mark_range(range, marker, rows)
    }

    fn mark_range(&self, range: Range<u64>, marker: &dyn RowMarker, rows: usize) -> Result<BitVector> {
        let mut set = BitVector::new(rows);
        for id in self.ids_in(range)? {
            marker.mark(&mut set, id)?;
        }
        Ok(set)
    }
}
