//! Typed column values carried in tuples.

use std::fmt;

/// One field of a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Null,
    /// 32-bit signed integer.
    Int(i32),
    /// 64-bit signed integer.
    BigInt(i64),
    Bool(bool),
    /// UTF-8 text, at most `u16::MAX` bytes when encoded.
    Text(String),
}

impl Value {
    pub const TAG_NULL: u8 = 0;
    pub const TAG_INT: u8 = 1;
    pub const TAG_BIGINT: u8 = 2;
    pub const TAG_BOOL: u8 = 3;
    pub const TAG_TEXT: u8 = 4;

    /// The type tag written in front of this value.
    pub fn tag(&self) -> u8 {
        match self {
            Value::Null => Self::TAG_NULL,
            Value::Int(_) => Self::TAG_INT,
            Value::BigInt(_) => Self::TAG_BIGINT,
            Value::Bool(_) => Self::TAG_BOOL,
            Value::Text(_) => Self::TAG_TEXT,
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Bytes this value occupies once encoded, tag included.
    pub fn encoded_len(&self) -> usize {
        1 + match self {
            Value::Null => 0,
            Value::Int(_) => 4,
            Value::BigInt(_) => 8,
            Value::Bool(_) => 1,
            Value::Text(s) => 2 + s.len(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}
