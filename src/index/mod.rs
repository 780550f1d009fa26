//! Secondary structures over a column's value encoder.
//!
//! [`SortedIndex`] keeps value-ids ordered by the encoder's comparator and
//! answers range lookups. How a matching value-id turns into row bits is
//! left to a [`RowMarker`]: a unique column maps value-id to row directly,
//! a deduplicating column goes through its [`BitmapIndex`].

pub mod bitmap;
pub mod sorted;

use crate::bits::BitVector;
use crate::core::error::Result;

pub use bitmap::{compute_bitmap_layout, BitmapIndex, BitmapLayout, IndexState};
pub use sorted::SortedIndex;

/// Sets the row bits belonging to one value-id.
pub trait RowMarker {
    fn mark(&self, set: &mut BitVector, value_id: u32) -> Result<()>;
}

/// Value-id and row are the same number.
pub struct UniqueRowMarker;

impl RowMarker for UniqueRowMarker {
    fn mark(&self, set: &mut BitVector, value_id: u32) -> Result<()> {
        let row = value_id as usize;
        if row < set.len() {
            set.set(row);
        }
        Ok(())
    }
}
