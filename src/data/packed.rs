use std::cmp::Ordering;
use std::sync::Arc;
use crate::blob::Blob;
use crate::core::error::{Error, ErrorKind, Result};
use crate::data::Value;
use crate::region::FixedRegion;

/// Unsigned integers packed into 1 to 4 bytes.
///
/// The width is fixed when the array is opened, from the largest
/// cardinality it must index. Used for sorted permutations and row arrays.
pub struct PackedInts {
    data: FixedRegion,
    width: usize,
}

impl PackedInts {
    pub const REGIONS: usize = 1;

    pub fn width_for_cardinality(count: u64) -> usize {
        if count < 256 {
            1
        } else if count < 65_535 {
            2
        } else if count < 16_777_215 {
            3
        } else {
            4
        }
    }

    pub fn open(blob: Arc<dyn Blob>, slot: usize, cardinality: u64, rows_per_block: u64) -> Result<Self> {
        let width = Self::width_for_cardinality(cardinality);
        let data = FixedRegion::open(blob, slot, width, rows_per_block)?;
        Ok(PackedInts { data, width })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn max_value(&self) -> u32 {
        match self.width {
            4 => u32::MAX,
            w => (1u32 << (8 * w)) - 1,
        }
    }

    pub fn len(&self) -> u64 {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn to_bytes(&self, v: u32) -> Vec<u8> {
        v.to_le_bytes()[..self.width].to_vec()
    }

    pub fn from_bytes(bytes: &[u8]) -> u32 {
        bytes.iter().rev().fold(0u32, |acc, &b| (acc << 8) | u32::from(b))
    }

    fn encode(&self, v: u32) -> Result<Vec<u8>> {
        if v > self.max_value() {
            return Err(Error::new(
                ErrorKind::CapacityExceeded,
                format!("{} does not fit in {} packed bytes", v, self.width),
            ));
        }
        Ok(self.to_bytes(v))
    }

    pub fn add(&mut self, v: u32) -> Result<u64> {
        let bytes = self.encode(v)?;
        self.data.append(&bytes)
    }

    pub fn insert(&mut self, index: u64, v: u32) -> Result<()> {
        let bytes = self.encode(v)?;
        self.data.insert(index, &bytes)
    }

    pub fn get(&self, index: u64) -> Result<u32> {
        Ok(Self::from_bytes(&self.data.get(index)?))
    }

    /// Raw packed bytes of `count` entries starting at `from`.
    pub fn read_rows(&self, from: u64, count: u64) -> Result<Vec<u8>> {
        self.data.read_rows(from, count)
    }

    pub fn compare(&self, a: u32, b: u32) -> Ordering {
        a.cmp(&b)
    }

    pub fn parse(&self, value: &Value) -> Result<u32> {
        let parsed = match value {
            Value::Int(v) => u32::try_from(*v).ok(),
            Value::Long(v) => u32::try_from(*v).ok(),
            Value::Str(s) => s.trim().parse::<u32>().ok(),
            _ => None,
        };
        parsed
            .filter(|&v| v <= self.max_value())
            .ok_or_else(|| Error::type_mismatch(&format!("unsigned int of {} bytes", self.width), value))
    }

    pub fn to_display_string(&self, v: u32) -> String {
        v.to_string()
    }
}
