use std::sync::Arc;
use crate::bits::BitVector;
use crate::blob::Blob;
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::data::PackedInts;
use crate::index::RowMarker;
use crate::region::FixedRegion;

/// Rows read per chunk while scanning during a rebuild.
const SCAN_CHUNK: u64 = 64 * 1024;

/// Leading bitmap words: rows covered by the last build, then its block length.
const META_WORDS: u64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapLayout {
    /// Rows covered by one bitmap bit.
    pub block_len: u64,
    /// 64-bit words reserved per value-id.
    pub words: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexState {
    Unbuilt,
    Built,
}

/// Pick the coarsest block length that keeps the bitmap under `max_bytes`.
///
/// The block length is a positive multiple of `block_multiple`; each value
/// always gets at least one word.
pub fn compute_bitmap_layout(rows: u64, distinct: u64, max_bytes: u64, block_multiple: u64) -> BitmapLayout {
    let multiple = block_multiple.max(1);
    let required = rows as f64 * distinct as f64 / (max_bytes.max(1) as f64 * 8.0);
    let rounded = (required / multiple as f64).ceil() * multiple as f64;

    let block_len = if rounded.is_finite() && rounded < u64::MAX as f64 {
        (rounded as u64).max(multiple)
    } else {
        u64::MAX
    };

    let blocks = rows.div_ceil(block_len);
    let words = blocks.div_ceil(64).max(1);
    BitmapLayout { block_len, words }
}

/// Row array plus a coarse inverted bitmap over it.
///
/// For every value-id the bitmap holds `layout.words` words; bit `b` is set
/// when some row in `[b * block_len, (b + 1) * block_len)` carries that
/// value-id. A set bit is only a hint, the block is confirmed by scanning
/// its raw row bytes.
///
/// The bitmap region starts with the row count and block length of the
/// build that produced it, so a reopened index reads the words with the
/// layout they were written in.
pub struct BitmapIndex {
    rows: PackedInts,
    bitmap: FixedRegion,
    ceiling: u64,
    max_bytes: u64,
    block_multiple: u64,
    layout: BitmapLayout,
    built_uniques: u64,
    state: IndexState,
}

impl BitmapIndex {
    /// `rows` then `bitmap`.
    pub const REGIONS: usize = 2;

    /// Open the row array and bitmap at `slot` and `slot + 1`.
    ///
    /// A stored bitmap keeps answering queries for the value-ids it covers.
    /// The index counts as built only when that bitmap covers every current
    /// row and all `distinct` value-ids.
    pub fn open(blob: Arc<dyn Blob>, slot: usize, cardinality: u64, distinct: u64, config: &Config) -> Result<Self> {
        let rows = PackedInts::open(Arc::clone(&blob), slot, cardinality, config.rows_per_block)?;
        let bitmap = FixedRegion::open(blob, slot + 1, 8, config.rows_per_block)?;

        let mut layout = compute_bitmap_layout(rows.len(), distinct, config.bitmap_max_bytes, config.bitmap_block_multiple);
        let mut built_uniques = 0;
        let mut state = IndexState::Unbuilt;

        if bitmap.len() >= META_WORDS {
            let built_rows = bitmap.get_u64(0)?;
            let block_len = bitmap.get_u64(1)?;
            if block_len > 0 && built_rows <= rows.len() {
                let words = built_rows.div_ceil(block_len).div_ceil(64).max(1);
                let body = bitmap.len() - META_WORDS;
                if body % words == 0 && body / words <= distinct {
                    layout = BitmapLayout { block_len, words };
                    built_uniques = body / words;
                    if built_uniques == distinct && built_rows == rows.len() && distinct > 0 {
                        state = IndexState::Built;
                    }
                }
            }
        }

        Ok(BitmapIndex {
            rows,
            bitmap,
            ceiling: cardinality,
            max_bytes: config.bitmap_max_bytes,
            block_multiple: config.bitmap_block_multiple,
            layout,
            built_uniques,
            state,
        })
    }

    pub fn len(&self) -> u64 {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn state(&self) -> IndexState {
        self.state
    }

    pub fn layout(&self) -> BitmapLayout {
        self.layout
    }

    pub fn ceiling(&self) -> u64 {
        self.ceiling
    }

    /// Value-id stored at `row`.
    pub fn value_id(&self, row: u64) -> Result<u32> {
        self.rows.get(row)
    }

    /// Append a row; a built index becomes stale.
    pub fn add(&mut self, value_id: u32) -> Result<u64> {
        let row = self.rows.add(value_id)?;
        self.state = IndexState::Unbuilt;
        Ok(row)
    }

    /// Rebuild, logging and swallowing a capacity skip.
    pub fn rebuild(&mut self, distinct: u64) -> Result<()> {
        match self.try_rebuild(distinct) {
            Err(e) if e.kind() == ErrorKind::CapacityExceeded => Ok(()),
            other => other,
        }
    }

    /// Regenerate the bitmap from the current rows.
    ///
    /// When `distinct` is over the ceiling the bitmap is emptied and the
    /// index stays unbuilt.
    pub fn try_rebuild(&mut self, distinct: u64) -> Result<()> {
        self.bitmap.reset()?;

        if distinct > self.ceiling {
            self.built_uniques = 0;
            self.state = IndexState::Unbuilt;
            tracing::warn!(distinct, ceiling = self.ceiling, "too many unique values, bitmap rebuild skipped");
            return Err(Error::new(
                ErrorKind::CapacityExceeded,
                format!("{} unique values exceed the ceiling of {}", distinct, self.ceiling),
            ));
        }

        let n = self.rows.len();
        self.layout = compute_bitmap_layout(n, distinct, self.max_bytes, self.block_multiple);
        let BitmapLayout { block_len, words } = self.layout;

        self.bitmap.append_u64(n)?;
        self.bitmap.append_u64(block_len)?;
        for _ in 0..distinct * words {
            self.bitmap.append_u64(0)?;
        }

        let width = self.rows.width();
        // (bitmap position, word) not yet written back
        let mut pending: Option<(u64, u64)> = None;
        let mut end = n;

        while end > 0 {
            let start = end.saturating_sub(SCAN_CHUNK);
            let raw = self.rows.read_rows(start, end - start)?;

            for (i, chunk) in raw.chunks_exact(width).enumerate().rev() {
                let row = start + i as u64;
                let value_id = u64::from(PackedInts::from_bytes(chunk));
                if value_id >= distinct {
                    continue;
                }
                let block = row / block_len;
                let pos = META_WORDS + value_id * words + block / 64;

                let word = match pending {
                    Some((p, w)) if p == pos => w,
                    Some((p, w)) => {
                        self.bitmap.set_u64(p, w)?;
                        self.bitmap.get_u64(pos)?
                    }
                    None => self.bitmap.get_u64(pos)?,
                };
                pending = Some((pos, word | (1u64 << (block % 64))));
            }
            end = start;
        }

        if let Some((p, w)) = pending {
            self.bitmap.set_u64(p, w)?;
        }

        self.built_uniques = distinct;
        self.state = IndexState::Built;
        tracing::debug!(rows = n, distinct, block_len, words, "rebuilt bitmap index");
        Ok(())
    }
}

impl RowMarker for BitmapIndex {
    fn mark(&self, set: &mut BitVector, value_id: u32) -> Result<()> {
        let value_id = u64::from(value_id);
        if value_id >= self.built_uniques {
            return Ok(());
        }

        let BitmapLayout { block_len, words } = self.layout;
        let target = self.rows.to_bytes(value_id as u32);
        let width = self.rows.width();
        let n = self.rows.len().min(set.len() as u64);
        let base = META_WORDS + value_id * words;

        for y in 0..words {
            let mut word = self.bitmap.get_u64(base + y)?;

            while word != 0 {
                let bit = u64::from(word.trailing_zeros());
                word &= word - 1;

                let block_start = (y * 64 + bit).saturating_mul(block_len);
                if block_start >= n {
                    continue;
                }
                let count = block_len.min(n - block_start);
                let raw = self.rows.read_rows(block_start, count)?;

                for (i, chunk) in raw.chunks_exact(width).enumerate() {
                    if chunk == target.as_slice() {
                        set.set((block_start + i as u64) as usize);
                    }
                }
            }
        }
        Ok(())
    }
}
