//! Error types for rdbc-core
//!
//! Errors are split by what went wrong, not by where:
//! - Malformed input and range violations (`InvalidArgument`)
//! - Operations that make no sense for a value kind (`Unsupported`)
//! - Permission and visibility denials (`AccessDenied`)
//! - Database failures carrying a SQL-state (`Sql`)

use std::fmt;
use thiserror::Error;

/// Result type for rdbc-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error source
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Standard SQL-state codes emitted by this crate
pub mod sql_state {
    /// SQL client unable to establish SQL connection
    pub const UNABLE_TO_CONNECT: &str = "08001";
}

/// Arithmetic overflow, used as the source of range errors
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("long overflow")]
pub struct Overflow;

/// Error categories for classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Malformed input or value out of range
    InvalidArgument,
    /// Operation not valid for this value kind
    Unsupported,
    /// Permission or visibility denied
    AccessDenied,
    /// Connection establishment failed (retriable)
    Connection,
    /// Error reported by a driver or the database
    Database,
    /// Configuration error
    Configuration,
    /// Unknown/other errors
    Other,
}

impl ErrorCategory {
    /// Whether errors in this category are generally retriable
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

/// Main error type for rdbc-core
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Malformed input or a value outside its valid range
    #[error("invalid argument: {message}")]
    InvalidArgument {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Operation is structurally invalid for this kind of value
    #[error("unsupported: {message}")]
    Unsupported { message: String },

    /// Caller lacks permission, or cannot see the driver it is acting on
    #[error("access denied: {message}")]
    AccessDenied { message: String },

    /// Database error with an optional SQL-state
    #[error("{message}")]
    Sql {
        message: String,
        sql_state: Option<String>,
        vendor_code: i32,
        #[source]
        source: Option<BoxError>,
    },

    /// Connection failed
    #[error("connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Configuration error
    #[error("configuration error: {message}")]
    Configuration { message: String },

    /// Internal error
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument { .. } => ErrorCategory::InvalidArgument,
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
            Self::AccessDenied { .. } => ErrorCategory::AccessDenied,
            Self::Sql { .. } => ErrorCategory::Database,
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Configuration { .. } => ErrorCategory::Configuration,
            Self::Internal { .. } => ErrorCategory::Other,
        }
    }

    /// Whether this error is retriable
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// SQL-state carried by this error, if any
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Sql { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            source: None,
        }
    }

    /// Create an invalid argument error with source
    pub fn invalid_argument_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::InvalidArgument {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Create an access denied error
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Create a SQL error without a SQL-state
    pub fn sql(message: impl Into<String>) -> Self {
        Self::Sql {
            message: message.into(),
            sql_state: None,
            vendor_code: 0,
            source: None,
        }
    }

    /// Create a SQL error with a SQL-state
    pub fn sql_with_state(message: impl Into<String>, sql_state: impl Into<String>) -> Self {
        Self::Sql {
            message: message.into(),
            sql_state: Some(sql_state.into()),
            vendor_code: 0,
            source: None,
        }
    }

    /// Create a connection error
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "invalid_argument"),
            Self::Unsupported => write!(f, "unsupported"),
            Self::AccessDenied => write!(f, "access_denied"),
            Self::Connection => write!(f, "connection"),
            Self::Database => write!(f, "database"),
            Self::Configuration => write!(f, "configuration"),
            Self::Other => write!(f, "other"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_category_retriable() {
        assert!(ErrorCategory::Connection.is_retriable());

        assert!(!ErrorCategory::InvalidArgument.is_retriable());
        assert!(!ErrorCategory::AccessDenied.is_retriable());
        assert!(!ErrorCategory::Database.is_retriable());
    }

    #[test]
    fn test_sql_state() {
        let err = Error::sql_with_state("No suitable driver", sql_state::UNABLE_TO_CONNECT);
        assert_eq!(err.sql_state(), Some("08001"));
        assert_eq!(err.to_string(), "No suitable driver");

        assert_eq!(Error::sql("boom").sql_state(), None);
        assert_eq!(Error::connection("refused").sql_state(), None);
    }

    #[test]
    fn test_error_source_chain() {
        let cause = "x".parse::<i32>().unwrap_err();
        let err = Error::invalid_argument_with_source("bad number", cause);

        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("bad number"));
    }
}
