pub mod codec;
pub mod dictionary;
pub mod encoder;
pub mod fixed_width;
pub mod packed;

use std::cmp::Ordering;
use std::fmt;
use serde::{Serialize, Deserialize};

pub use codec::ScalarCodec;
pub use dictionary::Dictionary;
pub use encoder::ValueEncoder;
pub use fixed_width::FixedWidthEncoder;
pub use packed::PackedInts;

/// Scalar handed to and returned from columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Str(String),
    Int(i32),
    Long(i64),
    Double(f64),
    Bool(bool),
    Timestamp(i64),     // epoch millis
}

impl Value {
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) => 2,
            Value::Long(_) => 3,
            Value::Double(_) => 4,
            Value::Timestamp(_) => 5,
            Value::Str(_) => 6,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// Ordering used by every encoder comparator.
///
/// Strings compare by bytes, doubles by IEEE total order, `false < true`.
/// Values of different kinds order by kind.
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Long(x), Value::Long(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => x.total_cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        _ => a.rank().cmp(&b.rank()),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Str(s) => f.write_str(s),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Timestamp(v) => write!(f, "{}", v),
        }
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Double(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

/// Declared type of a column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Strings stored once in a variable region, referenced by offset.
    Dictionary { max_width: usize },
    /// Strings padded or truncated to `width` bytes.
    FixedString { width: usize },
    Int,
    Long,
    Double,
    Boolean,
    /// Epoch millis; `format` is a chrono strftime pattern for display and parsing.
    Timestamp { format: String },
}

impl DataType {
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            DataType::Dictionary { .. } | DataType::FixedString { .. } | DataType::Timestamp { .. }
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            DataType::Dictionary { .. } | DataType::FixedString { .. } => "text",
            DataType::Int => "int",
            DataType::Long => "long",
            DataType::Double => "double",
            DataType::Boolean => "boolean",
            DataType::Timestamp { .. } => "timestamp",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn doubles_use_total_order() {
        assert_eq!(compare_values(&Value::Double(-0.0), &Value::Double(0.0)), Ordering::Less);
        assert_eq!(compare_values(&Value::Double(1.5), &Value::Double(1.5)), Ordering::Equal);
        assert_eq!(compare_values(&Value::Double(f64::NAN), &Value::Double(f64::INFINITY)), Ordering::Greater);
    }

    #[test]
    fn strings_compare_bytewise() {
        assert_eq!(compare_values(&"B".into(), &"a".into()), Ordering::Less);
        assert_eq!(compare_values(&"abc".into(), &"ab".into()), Ordering::Greater);
    }

    #[test]
    fn booleans_order_false_first() {
        assert_eq!(compare_values(&Value::Bool(false), &Value::Bool(true)), Ordering::Less);
    }
}
