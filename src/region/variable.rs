use std::sync::Arc;
use crate::blob::Blob;
use crate::core::error::{Error, ErrorKind, Result};
use crate::region::Region;

const LEN_PREFIX: u64 = 4;

/// Length-prefixed records bump-allocated inside large blocks.
///
/// The header state word holds the next write offset. A record never spans
/// two blocks; whatever is left at the end of a block is wasted.
pub struct VariableRegion {
    region: Region,
    next: u64,
}

impl VariableRegion {
    pub fn open(blob: Arc<dyn Blob>, slot: usize, block_size: u64) -> Result<Self> {
        let mut region = Region::new(blob, slot, block_size);

        let next = if region.blob.is_new() {
            let first = region.alloc_block()?;
            region.set_state(first)?;
            first
        } else {
            region.read()?;
            region.state()?
        };

        Ok(VariableRegion { region, next })
    }

    pub fn block_count(&self) -> usize {
        self.region.block_count()
    }

    /// Largest payload a single record can hold.
    pub fn max_record(&self) -> u64 {
        self.region.block_width.saturating_sub(LEN_PREFIX)
    }

    fn active_end(&self) -> Option<u64> {
        self.region.blocks.last().map(|&b| b + self.region.block_width)
    }

    /// Store `bytes` and return its offset, a permanent handle.
    pub fn append(&mut self, bytes: &[u8]) -> Result<u64> {
        let need = LEN_PREFIX + bytes.len() as u64;
        if need > self.region.block_width {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("record of {} bytes exceeds block size {}", bytes.len(), self.region.block_width),
            ));
        }

        let fits = matches!(self.active_end(), Some(end) if self.next + need <= end);
        if !fits {
            self.next = self.region.alloc_block()?;
        }

        let pos = self.next;
        self.region.blob.put_u32(pos, bytes.len() as u32)?;
        self.region.blob.write_at(pos + LEN_PREFIX, bytes)?;

        self.next = pos + need;
        self.region.set_state(self.next)?;

        Ok(pos)
    }

    pub fn get(&self, offset: u64) -> Result<Vec<u8>> {
        let len = self.region.blob.get_u32(offset)?;
        self.region.blob.get_bytes(offset + LEN_PREFIX, len as usize)
    }
}
