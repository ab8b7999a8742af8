use serde::{Deserialize, Serialize};
use chrono::{NaiveDate, NaiveDateTime, DateTime, Utc};
use uuid::Uuid;
use rust_decimal::Decimal;

/// A single column value as reported by the driver or bound as a parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Value {
    Null,
    // Numeric types
    SmallInt(i16),
    Integer(i64),
    Real(f64),
    Numeric(Decimal),  // NUMERIC/DECIMAL with precision
    // String types
    Text(String),
    Char(String),      // Fixed-length CHAR(n)
    // Boolean
    Boolean(bool),
    // Date/Time types
    Date(NaiveDate),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    // Special types
    Uuid(Uuid),
    Json(String),      // JSON as text
    Bytea(Vec<u8>),    // Binary data
}

impl Value {
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Integral view of the value, widening small ints
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::SmallInt(i) => Some(i64::from(*i)),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::Char(s) | Self::Json(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Short type label used in coercion error messages
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::SmallInt(_) => "SMALLINT",
            Self::Integer(_) => "INTEGER",
            Self::Real(_) => "REAL",
            Self::Numeric(_) => "NUMERIC",
            Self::Text(_) => "TEXT",
            Self::Char(_) => "CHAR",
            Self::Boolean(_) => "BOOLEAN",
            Self::Date(_) => "DATE",
            Self::Timestamp(_) => "TIMESTAMP",
            Self::TimestampTz(_) => "TIMESTAMPTZ",
            Self::Uuid(_) => "UUID",
            Self::Json(_) => "JSON",
            Self::Bytea(_) => "BYTEA",
        }
    }

    /// Converts the value into its JSON representation
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::SmallInt(i) => serde_json::Value::from(*i),
            Self::Integer(i) => serde_json::Value::from(*i),
            Self::Real(r) => serde_json::Value::from(*r),
            Self::Boolean(b) => serde_json::Value::Bool(*b),
            Self::Json(j) => serde_json::from_str(j)
                .unwrap_or_else(|_| serde_json::Value::String(j.clone())),
            other => serde_json::Value::String(other.to_string()),
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::SmallInt(i) => write!(f, "{i}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r}"),
            Self::Numeric(d) => write!(f, "{d}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::Char(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            Self::Timestamp(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S")),
            Self::TimestampTz(t) => write!(f, "{}", t.format("%Y-%m-%d %H:%M:%S %Z")),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Json(j) => write!(f, "{j}"),
            Self::Bytea(b) => write!(f, "\\x{}", hex::encode(b)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Integer(i64::from(v))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}
