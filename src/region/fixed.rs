use std::sync::Arc;
use crate::blob::Blob;
use crate::core::error::{Error, Result};
use crate::region::Region;

/// Fixed-width rows packed `rows_per_block` to a block.
///
/// The header state word holds the row count.
pub struct FixedRegion {
    region: Region,
    width: u64,
    rows_per_block: u64,
    len: u64,
}

impl FixedRegion {
    pub fn open(blob: Arc<dyn Blob>, slot: usize, width: usize, rows_per_block: u64) -> Result<Self> {
        let width = width as u64;
        let mut region = Region::new(blob, slot, width * rows_per_block);

        let len = if region.blob.is_new() {
            region.set_state(0)?;
            region.alloc_block()?;
            0
        } else {
            region.read()?;
            region.state()?
        };

        Ok(FixedRegion { region, width, rows_per_block, len })
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn rows_per_block(&self) -> u64 {
        self.rows_per_block
    }

    pub fn block_count(&self) -> usize {
        self.region.block_count()
    }

    pub fn blob(&self) -> &Arc<dyn Blob> {
        self.region.blob()
    }

    /// Absolute offset of row `index`.
    pub fn position(&self, index: u64) -> Result<u64> {
        if index >= self.len {
            return Err(Error::bounds(index, self.len));
        }
        Ok(self.slot(index))
    }

    fn slot(&self, index: u64) -> u64 {
        self.region.blocks[(index / self.rows_per_block) as usize]
            + (index % self.rows_per_block) * self.width
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        self.len = len;
        self.region.set_state(len)
    }

    fn ensure_block(&mut self, block: u64) -> Result<()> {
        while self.region.blocks.len() as u64 <= block {
            self.region.alloc_block()?;
        }
        Ok(())
    }

    fn padded(&self, bytes: &[u8]) -> Vec<u8> {
        let mut row = vec![0u8; self.width as usize];
        let n = bytes.len().min(row.len());
        row[..n].copy_from_slice(&bytes[..n]);
        row
    }

    /// Append one row and return its index.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let index = self.len;
        self.ensure_block(index / self.rows_per_block)?;
        let row = self.padded(bytes);
        self.region.blob.write_at(self.slot(index), &row)?;
        self.set_len(index + 1)?;
        Ok(index)
    }

    pub fn append_u64(&mut self, v: u64) -> Result<u64> {
        self.append(&v.to_le_bytes())
    }

    pub fn get(&self, index: u64) -> Result<Vec<u8>> {
        self.region.blob.get_bytes(self.position(index)?, self.width as usize)
    }

    pub fn get_u64(&self, index: u64) -> Result<u64> {
        self.region.blob.get_u64(self.position(index)?)
    }

    /// Overwrite row `index` in place.
    pub fn set(&self, index: u64, bytes: &[u8]) -> Result<()> {
        let row = self.padded(bytes);
        self.region.blob.write_at(self.position(index)?, &row)
    }

    pub fn set_u64(&self, index: u64, v: u64) -> Result<()> {
        self.region.blob.put_u64(self.position(index)?, v)
    }

    /// Insert `bytes` at `index`, shifting every later row one slot right.
    ///
    /// A full block hands its last row to slot 0 of the following block;
    /// the carry keeps moving until it lands in a block with a free slot.
    pub fn insert(&mut self, index: u64, bytes: &[u8]) -> Result<()> {
        if index > self.len {
            return Err(Error::bounds(index, self.len));
        }
        if index == self.len {
            self.append(bytes)?;
            return Ok(());
        }

        let row = self.padded(bytes);
        let rpb = self.rows_per_block;
        let width = self.width;

        // the row currently at len - 1 ends up at len
        self.ensure_block(self.len / rpb)?;

        let blob = Arc::clone(&self.region.blob);
        let mut block = (index / rpb) as usize;
        let mut begin = index % rpb;
        let mut carry: Option<Vec<u8>> = None;

        loop {
            let first_row = block as u64 * rpb;
            let occupied = self.len.saturating_sub(first_row).min(rpb);
            let base = self.region.blocks[block];

            let overflow = if occupied == rpb {
                Some(blob.get_bytes(base + (rpb - 1) * width, width as usize)?)
            } else {
                None
            };

            let moving = occupied - begin - u64::from(overflow.is_some());
            blob.copy(base + begin * width, base + (begin + 1) * width, moving * width)?;

            if let Some(c) = carry.take() {
                blob.write_at(base, &c)?;
            }

            match overflow {
                Some(o) => {
                    carry = Some(o);
                    block += 1;
                    begin = 0;
                }
                None => break,
            }
        }

        self.set_len(self.len + 1)?;
        blob.write_at(self.slot(index), &row)
    }

    /// Raw bytes of rows `[from, from + count)`, possibly spanning blocks.
    pub fn read_rows(&self, from: u64, count: u64) -> Result<Vec<u8>> {
        let end = from.checked_add(count).filter(|&e| e <= self.len)
            .ok_or_else(|| Error::bounds(from.saturating_add(count), self.len))?;

        let mut out = Vec::with_capacity((count * self.width) as usize);
        let mut row = from;
        while row < end {
            let in_block = row % self.rows_per_block;
            let n = (self.rows_per_block - in_block).min(end - row);
            let bytes = self.region.blob.get_bytes(self.slot(row), (n * self.width) as usize)?;
            out.extend_from_slice(&bytes);
            row += n;
        }
        Ok(out)
    }

    /// Forget all rows but keep the blocks for reuse.
    pub fn reset(&mut self) -> Result<()> {
        self.set_len(0)
    }
}
