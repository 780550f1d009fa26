use std::cmp::Ordering;
use std::sync::Arc;
use crate::blob::Blob;
use crate::core::config::Config;
use crate::core::error::{Error, Result};
use crate::data::codec::parse_text;
use crate::data::{compare_values, DataType, Dictionary, FixedWidthEncoder, ScalarCodec, Value};

/// Logical column of typed values addressed by value-id.
pub enum ValueEncoder {
    Dictionary(Dictionary),
    Fixed(FixedWidthEncoder),
}

impl ValueEncoder {
    /// Header slots the encoder registers for `data_type`.
    pub fn region_count(data_type: &DataType) -> usize {
        match data_type {
            DataType::Dictionary { .. } => Dictionary::REGIONS,
            _ => FixedWidthEncoder::REGIONS,
        }
    }

    pub fn open(blob: Arc<dyn Blob>, slot: usize, data_type: &DataType, config: &Config) -> Result<Self> {
        match data_type {
            DataType::Dictionary { max_width } => Ok(ValueEncoder::Dictionary(Dictionary::open(
                blob,
                slot,
                *max_width,
                config.rows_per_block,
                config.variable_block_size,
            )?)),
            other => {
                let codec = ScalarCodec::for_type(other)
                    .ok_or_else(|| Error::type_mismatch("fixed-width type", other))?;
                Ok(ValueEncoder::Fixed(FixedWidthEncoder::open(blob, slot, codec, config.rows_per_block)?))
            }
        }
    }

    pub fn len(&self) -> u64 {
        match self {
            ValueEncoder::Dictionary(d) => d.len(),
            ValueEncoder::Fixed(f) => f.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Check that a parsed value can be written, without writing it.
    pub fn validate(&self, value: &Value) -> Result<()> {
        match (self, value) {
            (ValueEncoder::Dictionary(d), Value::Str(s)) => d.validate(s),
            (ValueEncoder::Dictionary(_), other) => Err(Error::type_mismatch("string", other)),
            (ValueEncoder::Fixed(f), v) => f.codec().encode(v).map(|_| ()),
        }
    }

    /// Append an already parsed value; returns its value-id.
    pub fn add(&mut self, value: &Value) -> Result<u32> {
        let id = match (self, value) {
            (ValueEncoder::Dictionary(d), Value::Str(s)) => d.add(s)?,
            (ValueEncoder::Dictionary(_), other) => return Err(Error::type_mismatch("string", other)),
            (ValueEncoder::Fixed(f), v) => f.add(v)?,
        };
        Ok(id as u32)
    }

    pub fn get(&self, id: u32) -> Result<Value> {
        match self {
            ValueEncoder::Dictionary(d) => Ok(Value::Str(d.get(u64::from(id))?)),
            ValueEncoder::Fixed(f) => f.get(u64::from(id)),
        }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        match self {
            ValueEncoder::Dictionary(_) => compare_values(a, b),
            ValueEncoder::Fixed(f) => f.codec().compare(a, b),
        }
    }

    pub fn parse(&self, value: &Value) -> Result<Value> {
        match self {
            ValueEncoder::Dictionary(_) => parse_text(value),
            ValueEncoder::Fixed(f) => f.codec().parse(value),
        }
    }

    pub fn to_display_string(&self, value: &Value) -> String {
        match self {
            ValueEncoder::Dictionary(_) => value.to_string(),
            ValueEncoder::Fixed(f) => f.codec().to_display_string(value),
        }
    }

    pub fn is_text(&self) -> bool {
        match self {
            ValueEncoder::Dictionary(_) => true,
            ValueEncoder::Fixed(f) => f.codec().is_text(),
        }
    }
}
