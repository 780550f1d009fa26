use std::fmt;
use std::str::FromStr;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};

/// Predicate understood by indexed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    Eq,
    Not,
    Gt,
    Lt,
    Between,
}

enum Alias {
    Exact(&'static str),
    Prefix(&'static str),
}

// checked in order, first hit wins
const ALIASES: &[(Alias, Operator)] = &[
    (Alias::Exact("="), Operator::Eq),
    (Alias::Exact("eq"), Operator::Eq),
    (Alias::Exact("!="), Operator::Not),
    (Alias::Exact("<>"), Operator::Not),
    (Alias::Prefix("not"), Operator::Not),
    (Alias::Exact(">"), Operator::Gt),
    (Alias::Prefix("gt"), Operator::Gt),
    (Alias::Exact("<"), Operator::Lt),
    (Alias::Prefix("lt"), Operator::Lt),
    (Alias::Exact("b"), Operator::Between),
    (Alias::Exact("r"), Operator::Between),
    (Alias::Exact("btwn"), Operator::Between),
    (Alias::Exact("between"), Operator::Between),
    (Alias::Exact("range"), Operator::Between),
];

impl Operator {
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Not => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Between => "between",
        }
    }

    /// Values the operator needs at minimum.
    pub fn arity(&self) -> usize {
        match self {
            Operator::Eq | Operator::Not | Operator::Gt | Operator::Lt => 1,
            Operator::Between => 2,
        }
    }
}

impl FromStr for Operator {
    type Err = Error;

    /// Case-insensitive; an empty operator means equality.
    fn from_str(s: &str) -> Result<Self> {
        let op = s.trim().to_lowercase();
        if op.is_empty() {
            return Ok(Operator::Eq);
        }

        ALIASES
            .iter()
            .find(|(alias, _)| match alias {
                Alias::Exact(a) => op == *a,
                Alias::Prefix(p) => op.starts_with(p),
            })
            .map(|(_, operator)| *operator)
            .ok_or_else(|| Error::new(ErrorKind::InvalidArgument, format!("Unknown operator: {}", s)))
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_aliases() {
        let cases = [
            ("=", Operator::Eq),
            ("EQ", Operator::Eq),
            ("", Operator::Eq),
            ("!=", Operator::Not),
            ("<>", Operator::Not),
            ("not_in", Operator::Not),
            (">", Operator::Gt),
            ("gte", Operator::Gt),
            ("<", Operator::Lt),
            ("lt", Operator::Lt),
            ("b", Operator::Between),
            ("R", Operator::Between),
            ("btwn", Operator::Between),
            ("between", Operator::Between),
            ("range", Operator::Between),
        ];
        for (text, expected) in cases {
            assert_eq!(text.parse::<Operator>().unwrap(), expected, "operator {:?}", text);
        }
    }

    #[test]
    fn rejects_unknown() {
        let err = "like".parse::<Operator>().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert!("bt".parse::<Operator>().is_err());
    }

    #[test]
    fn display_round_trips() {
        for op in [Operator::Eq, Operator::Not, Operator::Gt, Operator::Lt, Operator::Between] {
            assert_eq!(op.to_string().parse::<Operator>().unwrap(), op);
        }
    }
}
