//! State queries.
//!
//! Queries are read-only: asking a component for a value never changes
//! what it will do next.

use std::fmt;

/// A queried value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    String(String),
}

impl Value {
    /// Numeric view of the value; booleans read as 0 or 1.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::Bool(v) => Some(u64::from(v)),
            Value::U8(v) => Some(u64::from(v)),
            Value::U16(v) => Some(u64::from(v)),
            Value::U32(v) => Some(u64::from(v)),
            Value::U64(v) => Some(v),
            Value::String(_) => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{v}"),
            Value::U8(v) => write!(f, "${v:02X}"),
            Value::U16(v) => write!(f, "${v:04X}"),
            Value::U32(v) => write!(f, "${v:08X}"),
            Value::U64(v) => write!(f, "{v}"),
            Value::String(v) => f.write_str(v),
        }
    }
}

/// A component whose state can be inspected by path.
///
/// Paths are dotted names such as `pc`, `d3` or `flags.z`.
pub trait Observable {
    /// Value at `path`, or `None` if the path is unknown (or names
    /// something this particular component does not have).
    fn query(&self, path: &str) -> Option<Value>;

    /// Every path [`query`](Self::query) may answer.
    fn query_paths(&self) -> &'static [&'static str];

    /// All answerable paths with their current values, in
    /// [`query_paths`](Self::query_paths) order.
    fn snapshot(&self) -> Vec<(&'static str, Value)> {
        self.query_paths()
            .iter()
            .filter_map(|&path| self.query(path).map(|value| (path, value)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Latch {
        level: u8,
    }

    impl Observable for Latch {
        fn query(&self, path: &str) -> Option<Value> {
            match path {
                "level" => Some(Value::U8(self.level)),
                "high" => Some(Value::Bool(self.level > 3)),
                _ => None,
            }
        }

        fn query_paths(&self) -> &'static [&'static str] {
            &["level", "high", "absent"]
        }
    }

    #[test]
    fn snapshot_skips_unanswered_paths() {
        let latch = Latch { level: 5 };
        let snap = latch.snapshot();
        assert_eq!(snap, vec![("level", Value::U8(5)), ("high", Value::Bool(true))]);
    }

    #[test]
    fn values_format_as_hex() {
        assert_eq!(Value::U16(0x2700).to_string(), "$2700");
        assert_eq!(Value::U32(0x400).to_string(), "$00000400");
        assert_eq!(Value::Bool(true).as_u64(), Some(1));
        assert_eq!(Value::String("MC68000".into()).as_u64(), None);
    }
}
