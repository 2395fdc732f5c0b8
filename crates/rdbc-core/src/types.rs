//! Value types for rdbc-core
//!
//! Parameter and result values exchanged with drivers:
//! - Primitive types (bool, integers, floats, text, bytes)
//! - SQL temporal types backed by the canonical codec in [`crate::temporal`]

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::security::escape_string_literal;
use crate::temporal::{SqlDate, SqlTemporal, SqlTime, SqlTimestamp, TemporalKind};

/// SQL value type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean value
    Bool(bool),
    /// 32-bit signed integer (INTEGER)
    Int32(i32),
    /// 64-bit signed integer (BIGINT)
    Int64(i64),
    /// 64-bit floating point (DOUBLE PRECISION)
    Float64(f64),
    /// Text string (VARCHAR, TEXT, CHAR)
    String(String),
    /// Binary data (VARBINARY, BLOB)
    Bytes(Vec<u8>),
    /// Date without time (DATE)
    Date(SqlDate),
    /// Time without date (TIME)
    Time(SqlTime),
    /// Date and time with nanoseconds (TIMESTAMP)
    Timestamp(SqlTimestamp),
}

impl Value {
    /// Check if value is NULL
    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get SQL type name
    pub fn sql_type(&self) -> &'static str {
        match self {
            Self::Null => "NULL",
            Self::Bool(_) => "BOOLEAN",
            Self::Int32(_) => "INTEGER",
            Self::Int64(_) => "BIGINT",
            Self::Float64(_) => "DOUBLE PRECISION",
            Self::String(_) => "VARCHAR",
            Self::Bytes(_) => "VARBINARY",
            Self::Date(v) => v.kind().sql_type(),
            Self::Time(v) => v.kind().sql_type(),
            Self::Timestamp(v) => v.kind().sql_type(),
        }
    }

    /// Parse canonical text into a temporal value of the given kind
    pub fn parse_temporal(kind: TemporalKind, text: &str) -> Result<Self> {
        Ok(match kind {
            TemporalKind::Date => Self::Date(SqlDate::parse(text)?),
            TemporalKind::Time => Self::Time(SqlTime::parse(text)?),
            TemporalKind::Timestamp => Self::Timestamp(SqlTimestamp::parse(text)?),
        })
    }

    /// Try to convert to i64
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(n) => Some(i64::from(*n)),
            Self::Int64(n) => Some(*n),
            Self::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    /// Try to convert to string
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Try to convert to a date; timestamps are truncated to their date
    pub fn as_date(&self) -> Option<SqlDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Timestamp(ts) => Some(SqlDate::from_naive_date(ts.to_naive_date_time().date())),
            Self::String(s) => SqlDate::parse(s).ok(),
            _ => None,
        }
    }

    /// Try to convert to a timestamp
    pub fn as_timestamp(&self) -> Option<SqlTimestamp> {
        match self {
            Self::Timestamp(ts) => Some(*ts),
            Self::Date(d) => SqlTimestamp::from_millis(d.time()).ok(),
            Self::String(s) => SqlTimestamp::parse(s).ok(),
            _ => None,
        }
    }

    /// Render as an inline SQL literal.
    ///
    /// Temporal values use the JDBC escape syntax, e.g. `{ts '2023-03-05 10:20:30.5'}`.
    pub fn to_sql_literal(&self) -> Result<String> {
        Ok(match self {
            Self::Null => "NULL".to_string(),
            Self::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).to_string(),
            Self::Int32(n) => n.to_string(),
            Self::Int64(n) => n.to_string(),
            Self::Float64(n) => {
                if !n.is_finite() {
                    return Err(Error::invalid_argument(format!(
                        "non-finite float {n} has no SQL literal"
                    )));
                }
                n.to_string()
            }
            Self::String(s) => format!("'{}'", escape_string_literal(s)),
            Self::Bytes(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Date(v) => escape_literal(v.kind(), v),
            Self::Time(v) => escape_literal(v.kind(), v),
            Self::Timestamp(v) => escape_literal(v.kind(), v),
        })
    }
}

fn escape_literal(kind: TemporalKind, value: &impl std::fmt::Display) -> String {
    format!("{{{} '{}'}}", kind.escape_keyword(), value)
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float64(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_owned())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<SqlDate> for Value {
    fn from(v: SqlDate) -> Self {
        Self::Date(v)
    }
}

impl From<SqlTime> for Value {
    fn from(v: SqlTime) -> Self {
        Self::Time(v)
    }
}

impl From<SqlTimestamp> for Value {
    fn from(v: SqlTimestamp) -> Self {
        Self::Timestamp(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(val) => val.into(),
            None => Self::Null,
        }
    }
}

/// Database row as ordered column values
#[derive(Debug, Clone)]
pub struct Row {
    /// Column names
    columns: Vec<String>,
    /// Column values (same order as columns)
    values: Vec<Value>,
}

impl Row {
    /// Create a new row
    pub fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Self { columns, values }
    }

    /// Get column count
    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Check if row is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Get column names
    #[inline]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Get value by column index
    #[inline]
    pub fn get(&self, idx: usize) -> Option<&Value> {
        self.values.get(idx)
    }

    /// Get value by column name (case-insensitive)
    pub fn get_by_name(&self, name: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c.eq_ignore_ascii_case(name))
            .and_then(|idx| self.values.get(idx))
    }
}
