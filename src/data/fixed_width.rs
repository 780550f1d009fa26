use std::sync::Arc;
use crate::blob::Blob;
use crate::core::error::Result;
use crate::data::{ScalarCodec, Value};
use crate::region::FixedRegion;

/// Scalar values stored row-per-value in one fixed region.
pub struct FixedWidthEncoder {
    data: FixedRegion,
    codec: ScalarCodec,
}

impl FixedWidthEncoder {
    pub const REGIONS: usize = 1;

    pub fn open(blob: Arc<dyn Blob>, slot: usize, codec: ScalarCodec, rows_per_block: u64) -> Result<Self> {
        let data = FixedRegion::open(blob, slot, codec.width(), rows_per_block)?;
        Ok(FixedWidthEncoder { data, codec })
    }

    pub fn codec(&self) -> &ScalarCodec {
        &self.codec
    }

    pub fn len(&self) -> u64 {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn add(&mut self, value: &Value) -> Result<u64> {
        let bytes = self.codec.encode(value)?;
        self.data.append(&bytes)
    }

    pub fn get(&self, id: u64) -> Result<Value> {
        Ok(self.codec.decode(&self.data.get(id)?))
    }
}
