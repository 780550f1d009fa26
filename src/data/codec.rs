use std::cmp::Ordering;
use std::fmt::Write;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use crate::core::error::{Error, Result};
use crate::data::{compare_values, DataType, Value};

/// Encode/decode rules for every fixed-width scalar kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScalarCodec {
    FixedString { width: usize },
    Int,
    Long,
    Double,
    Boolean,
    Timestamp { format: String },
}

impl ScalarCodec {
    /// Codec for a declared type. Dictionary columns are not fixed-width.
    pub fn for_type(data_type: &DataType) -> Option<Self> {
        match data_type {
            DataType::Dictionary { .. } => None,
            DataType::FixedString { width } => Some(ScalarCodec::FixedString { width: *width }),
            DataType::Int => Some(ScalarCodec::Int),
            DataType::Long => Some(ScalarCodec::Long),
            DataType::Double => Some(ScalarCodec::Double),
            DataType::Boolean => Some(ScalarCodec::Boolean),
            DataType::Timestamp { format } => Some(ScalarCodec::Timestamp { format: format.clone() }),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            ScalarCodec::FixedString { width } => *width,
            ScalarCodec::Int => 4,
            ScalarCodec::Long | ScalarCodec::Double | ScalarCodec::Timestamp { .. } => 8,
            ScalarCodec::Boolean => 1,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ScalarCodec::FixedString { .. } | ScalarCodec::Timestamp { .. })
    }

    fn name(&self) -> &'static str {
        match self {
            ScalarCodec::FixedString { .. } => "string",
            ScalarCodec::Int => "int",
            ScalarCodec::Long => "long",
            ScalarCodec::Double => "double",
            ScalarCodec::Boolean => "boolean",
            ScalarCodec::Timestamp { .. } => "timestamp",
        }
    }

    pub fn encode(&self, value: &Value) -> Result<Vec<u8>> {
        let bytes = match (self, value) {
            (ScalarCodec::FixedString { width }, Value::Str(s)) => {
                let mut end = s.len().min(*width);
                while !s.is_char_boundary(end) {
                    end -= 1;
                }
                let mut row = vec![0u8; *width];
                row[..end].copy_from_slice(&s.as_bytes()[..end]);
                row
            }
            (ScalarCodec::Int, Value::Int(v)) => v.to_le_bytes().to_vec(),
            (ScalarCodec::Long, Value::Long(v)) => v.to_le_bytes().to_vec(),
            (ScalarCodec::Double, Value::Double(v)) => v.to_bits().to_le_bytes().to_vec(),
            (ScalarCodec::Boolean, Value::Bool(v)) => vec![u8::from(*v)],
            (ScalarCodec::Timestamp { .. }, Value::Timestamp(v)) => v.to_le_bytes().to_vec(),
            (codec, other) => return Err(Error::type_mismatch(codec.name(), other)),
        };
        Ok(bytes)
    }

    pub fn decode(&self, bytes: &[u8]) -> Value {
        match self {
            ScalarCodec::FixedString { .. } => {
                let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
                let s = String::from_utf8_lossy(&bytes[..end]);
                Value::Str(s.trim_end().to_string())
            }
            ScalarCodec::Int => Value::Int(i32::from_le_bytes(le_array(bytes))),
            ScalarCodec::Long => Value::Long(i64::from_le_bytes(le_array(bytes))),
            ScalarCodec::Double => Value::Double(f64::from_bits(u64::from_le_bytes(le_array(bytes)))),
            ScalarCodec::Boolean => Value::Bool(bytes.first().copied().unwrap_or(0) != 0),
            ScalarCodec::Timestamp { .. } => Value::Timestamp(i64::from_le_bytes(le_array(bytes))),
        }
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        compare_values(a, b)
    }

    /// Coerce an external value into this codec's kind.
    pub fn parse(&self, value: &Value) -> Result<Value> {
        match self {
            ScalarCodec::FixedString { .. } => parse_text(value),
            ScalarCodec::Int => match value {
                Value::Int(v) => Ok(Value::Int(*v)),
                Value::Long(v) => i32::try_from(*v)
                    .map(Value::Int)
                    .map_err(|_| Error::type_mismatch("int", value)),
                Value::Str(s) => s.trim().parse::<i32>()
                    .map(Value::Int)
                    .map_err(|_| Error::type_mismatch("int", value)),
                other => Err(Error::type_mismatch("int", other)),
            },
            ScalarCodec::Long => match value {
                Value::Int(v) => Ok(Value::Long(i64::from(*v))),
                Value::Long(v) => Ok(Value::Long(*v)),
                Value::Str(s) => s.trim().parse::<i64>()
                    .map(Value::Long)
                    .map_err(|_| Error::type_mismatch("long", value)),
                other => Err(Error::type_mismatch("long", other)),
            },
            ScalarCodec::Double => match value {
                Value::Double(v) => Ok(Value::Double(*v)),
                Value::Int(v) => Ok(Value::Double(f64::from(*v))),
                Value::Long(v) => Ok(Value::Double(*v as f64)),
                Value::Str(s) => s.trim().parse::<f64>()
                    .map(Value::Double)
                    .map_err(|_| Error::type_mismatch("double", value)),
                other => Err(Error::type_mismatch("double", other)),
            },
            ScalarCodec::Boolean => match value {
                Value::Bool(v) => Ok(Value::Bool(*v)),
                Value::Str(s) if s.trim().eq_ignore_ascii_case("true") => Ok(Value::Bool(true)),
                Value::Str(s) if s.trim().eq_ignore_ascii_case("false") => Ok(Value::Bool(false)),
                other => Err(Error::type_mismatch("boolean", other)),
            },
            ScalarCodec::Timestamp { format } => match value {
                Value::Timestamp(v) | Value::Long(v) => Ok(Value::Timestamp(*v)),
                Value::Str(s) => parse_timestamp(s.trim(), format)
                    .map(Value::Timestamp)
                    .ok_or_else(|| Error::type_mismatch(&format!("timestamp '{}'", format), value)),
                other => Err(Error::type_mismatch("timestamp", other)),
            },
        }
    }

    pub fn to_display_string(&self, value: &Value) -> String {
        match (self, value) {
            (ScalarCodec::Timestamp { format }, Value::Timestamp(millis)) => format_timestamp(*millis, format),
            (_, other) => other.to_string(),
        }
    }
}

/// String kinds accept anything printable; null becomes the empty string.
pub fn parse_text(value: &Value) -> Result<Value> {
    match value {
        Value::Null => Ok(Value::Str(String::new())),
        Value::Str(s) => Ok(Value::Str(s.clone())),
        other => Ok(Value::Str(other.to_string())),
    }
}

fn le_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    let n = bytes.len().min(N);
    out[..n].copy_from_slice(&bytes[..n]);
    out
}

fn parse_timestamp(s: &str, format: &str) -> Option<i64> {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
        return Some(dt.and_utc().timestamp_millis());
    }
    NaiveDate::parse_from_str(s, format)
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn format_timestamp(millis: i64, format: &str) -> String {
    let Some(dt) = DateTime::from_timestamp_millis(millis) else {
        return millis.to_string();
    };

    // chrono reports a bad pattern as a fmt error instead of failing up front
    let mut out = String::new();
    if write!(out, "{}", dt.format(format)).is_err() {
        return millis.to_string();
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    #[test]
    fn fixed_string_pads_and_trims() {
        let codec = ScalarCodec::FixedString { width: 6 };
        let bytes = codec.encode(&"ab  ".into()).unwrap();
        assert_eq!(bytes.len(), 6);
        assert_eq!(codec.decode(&bytes), Value::Str("ab".into()));

        let truncated = codec.encode(&"abcdefgh".into()).unwrap();
        assert_eq!(codec.decode(&truncated), Value::Str("abcdef".into()));
    }

    #[test]
    fn fixed_string_truncates_on_char_boundary() {
        let codec = ScalarCodec::FixedString { width: 3 };
        let bytes = codec.encode(&"aé€".into()).unwrap();
        assert_eq!(codec.decode(&bytes), Value::Str("aé".into()));
    }

    #[test]
    fn int_parse_rejects_garbage() {
        let codec = ScalarCodec::Int;
        assert_eq!(codec.parse(&"42".into()).unwrap(), Value::Int(42));
        assert_eq!(codec.parse(&Value::Long(7)).unwrap(), Value::Int(7));
        let err = codec.parse(&"forty".into()).unwrap_err();
        assert_eq!(err.kind, crate::core::error::ErrorKind::TypeMismatch);
        assert!(codec.parse(&Value::Null).is_err());
        assert!(codec.parse(&Value::Long(i64::MAX)).is_err());
    }

    #[test]
    fn encode_rejects_wrong_kind() {
        assert!(ScalarCodec::Double.encode(&Value::Int(1)).is_err());
    }

    #[test]
    fn timestamp_formats_and_parses() {
        let codec = ScalarCodec::Timestamp { format: FORMAT.to_string() };
        let v = codec.parse(&"2024-02-29 13:45:10".into()).unwrap();
        assert_eq!(codec.to_display_string(&v), "2024-02-29 13:45:10");

        let date_only = ScalarCodec::Timestamp { format: "%Y-%m-%d".to_string() };
        let d = date_only.parse(&"2024-02-29".into()).unwrap();
        assert_eq!(d, Value::Timestamp(1_709_164_800_000));
    }

    #[test]
    fn boolean_parse_is_strict() {
        let codec = ScalarCodec::Boolean;
        assert_eq!(codec.parse(&"TRUE".into()).unwrap(), Value::Bool(true));
        assert!(codec.parse(&"yes".into()).is_err());
    }

    #[test]
    fn text_accepts_null() {
        assert_eq!(parse_text(&Value::Null).unwrap(), Value::Str(String::new()));
        assert_eq!(parse_text(&Value::Int(5)).unwrap(), Value::Str("5".into()));
    }
}
