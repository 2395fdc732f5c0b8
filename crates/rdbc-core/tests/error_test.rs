//! Unit tests for rdbc-core error module

use rdbc_core::error::{sql_state, Error, ErrorCategory, Overflow};

#[test]
fn test_error_connection() {
    let err = Error::connection("Failed to connect");

    assert_eq!(err.category(), ErrorCategory::Connection);
    assert!(err.to_string().contains("Failed to connect"));
    assert!(err.is_retriable());
}

#[test]
fn test_error_config() {
    let err = Error::config("Invalid driver list");

    assert_eq!(err.category(), ErrorCategory::Configuration);
    assert!(err.to_string().contains("Invalid driver list"));
    assert!(!err.is_retriable());
}

#[test]
fn test_error_sql_state() {
    let err = Error::sql_with_state("No suitable driver", sql_state::UNABLE_TO_CONNECT);

    assert_eq!(err.category(), ErrorCategory::Database);
    assert_eq!(err.sql_state(), Some("08001"));
    assert_eq!(err.to_string(), "No suitable driver");
    assert!(!err.is_retriable());
}

#[test]
fn test_error_sql_without_state() {
    let err = Error::sql("deadlock detected");

    assert_eq!(err.sql_state(), None);
    assert_eq!(err.category(), ErrorCategory::Database);
}

#[test]
fn test_error_access_denied() {
    let err = Error::access_denied("permission 'setLog' denied");

    assert_eq!(err.category(), ErrorCategory::AccessDenied);
    assert!(err.to_string().starts_with("access denied"));
    assert_eq!(err.sql_state(), None);
}

#[test]
fn test_error_invalid_argument_with_source() {
    let err = Error::invalid_argument_with_source("instant exceeds timestamp range", Overflow);

    assert_eq!(err.category(), ErrorCategory::InvalidArgument);
    let source = std::error::Error::source(&err).unwrap();
    assert_eq!(source.to_string(), "long overflow");
}

#[test]
fn test_error_unsupported() {
    let err = Error::unsupported("hours is not available on a DATE value");

    assert_eq!(err.category(), ErrorCategory::Unsupported);
    assert!(err.to_string().contains("DATE"));
}

#[test]
fn test_error_category_display() {
    assert_eq!(ErrorCategory::Connection.to_string(), "connection");
    assert_eq!(ErrorCategory::AccessDenied.to_string(), "access_denied");
}
