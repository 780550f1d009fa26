//! Linked-block regions carved out of a [`Blob`].
//!
//! Every block is `[body][next link: u64][reserved: u64]`. The header slot
//! of a region stores an 8-byte state word followed by the offset of the
//! first block, so the whole chain can be rebuilt on reopen.

pub mod fixed;
pub mod variable;

use std::sync::Arc;
use crate::blob::{header_pos, Blob};
use crate::core::error::Result;

pub use fixed::FixedRegion;
pub use variable::VariableRegion;

/// Trailing bytes reserved after each block body.
pub const BLOCK_TRAILER: u64 = 16;

pub struct Region {
    pub(crate) blob: Arc<dyn Blob>,
    pub(crate) header_pos: u64,
    pub(crate) block_width: u64,
    pub(crate) blocks: Vec<u64>,
}

impl Region {
    pub fn new(blob: Arc<dyn Blob>, slot: usize, block_width: u64) -> Self {
        Region {
            blob,
            header_pos: header_pos(slot),
            block_width,
            blocks: Vec::with_capacity(10),
        }
    }

    pub fn blob(&self) -> &Arc<dyn Blob> {
        &self.blob
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Region-specific word stored in the first half of the header slot.
    pub fn state(&self) -> Result<u64> {
        self.blob.get_u64(self.header_pos)
    }

    pub fn set_state(&self, v: u64) -> Result<()> {
        self.blob.put_u64(self.header_pos, v)
    }

    /// Allocate a block and link it after the current tail.
    pub fn alloc_block(&mut self) -> Result<u64> {
        let pos = self.blob.alloc(self.block_width + BLOCK_TRAILER)?;
        self.blob.put_u64(pos + self.block_width, 0)?;

        match self.blocks.last() {
            None => self.blob.put_u64(self.header_pos + 8, pos)?,
            Some(&prev) => self.blob.put_u64(prev + self.block_width, pos)?,
        }

        self.blocks.push(pos);
        tracing::trace!(header = self.header_pos, block = self.blocks.len(), offset = pos, "allocated region block");
        Ok(pos)
    }

    /// Rebuild the block list by walking the chain from the header.
    pub fn read(&mut self) -> Result<()> {
        self.blocks.clear();
        let mut next = self.blob.get_u64(self.header_pos + 8)?;

        while next > 0 {
            self.blocks.push(next);
            next = self.blob.get_u64(next + self.block_width)?;
        }

        tracing::debug!(header = self.header_pos, blocks = self.blocks.len(), "reopened region");
        Ok(())
    }
}
