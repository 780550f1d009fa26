use std::sync::Arc;
use crate::blob::Blob;
use crate::core::error::{Error, ErrorKind, Result};
use crate::region::{FixedRegion, VariableRegion};

/// Dictionary-encoded strings.
///
/// Payloads live in a variable region; a parallel fixed region records
/// the payload offset for each value-id.
pub struct Dictionary {
    offsets: FixedRegion,
    payload: VariableRegion,
    max_width: usize,
}

impl Dictionary {
    pub const REGIONS: usize = 2;

    pub fn open(
        blob: Arc<dyn Blob>,
        slot: usize,
        max_width: usize,
        rows_per_block: u64,
        block_size: u64,
    ) -> Result<Self> {
        let offsets = FixedRegion::open(Arc::clone(&blob), slot, 8, rows_per_block)?;
        let payload = VariableRegion::open(blob, slot + 1, block_size)?;
        Ok(Dictionary { offsets, payload, max_width })
    }

    pub fn len(&self) -> u64 {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    pub fn max_width(&self) -> usize {
        self.max_width
    }

    /// Fails with `InvalidInput` when `value` cannot be stored.
    pub fn validate(&self, value: &str) -> Result<()> {
        if value.len() > self.max_width {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("'{}' is {} bytes, dictionary max width is {}", value, value.len(), self.max_width),
            ));
        }
        if value.len() as u64 > self.payload.max_record() {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("'{}' does not fit a {} byte payload block", value, self.payload.max_record()),
            ));
        }
        Ok(())
    }

    pub fn add(&mut self, value: &str) -> Result<u64> {
        self.validate(value)?;
        let pos = self.payload.append(value.as_bytes())?;
        self.offsets.append_u64(pos)
    }

    pub fn get(&self, id: u64) -> Result<String> {
        let pos = self.offsets.get_u64(id)?;
        let bytes = self.payload.get(pos)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::new(ErrorKind::Parse, format!("invalid UTF-8 in dictionary entry {}: {}", id, e)))
    }
}
