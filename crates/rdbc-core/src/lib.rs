//! # rdbc-core
//!
//! Relational database connectivity core: SQL temporal values and the driver
//! registry.
//!
//! ## Features
//!
//! - **Temporal Codec**: `DATE`, `TIME` and `TIMESTAMP` values with lenient
//!   field normalization, canonical text encoding and nanosecond timestamps
//! - **Driver Registry**: ordered, copy-on-write registry with one-time lazy
//!   discovery and first-match URL resolution
//! - **Visibility**: drivers are filtered per caller through [`loader::DriverLoader`]
//! - **Permissions**: privileged registry operations go through a
//!   [`security::SecurityPolicy`]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use rdbc_core::prelude::*;
//!
//! let ts = SqlTimestamp::parse("2023-03-05 10:20:30.000000001")?;
//! assert_eq!(ts.to_string(), "2023-03-05 10:20:30.000000001");
//!
//! let manager = DriverManager::global();
//! manager.register_driver(Arc::new(PgDriver::new()));
//! let conn = manager
//!     .get_connection_default(&manager.system_caller(), "rdbc:pg://localhost/app")
//!     .await?;
//! let rows = conn.query("SELECT created_at FROM events", &[]).await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod driver;
pub mod error;
pub mod loader;
pub mod log;
pub mod manager;
pub mod security;
pub mod temporal;
pub mod types;

/// Prelude module for convenient imports
pub mod prelude {
    // Error types
    pub use crate::error::{Error, ErrorCategory, Result};

    // Temporal values
    pub use crate::temporal::{SqlDate, SqlTemporal, SqlTime, SqlTimestamp, TemporalKind};

    // Value and type system
    pub use crate::types::{Row, Value};

    // Driver and connection contracts
    pub use crate::connection::{Connection, ConnectionProperties};
    pub use crate::driver::{Driver, DriverAction, DriverPropertyInfo};

    // Registry
    pub use crate::config::DriverManagerConfig;
    pub use crate::loader::DriverLoader;
    pub use crate::log::LogSink;
    pub use crate::manager::{CallerContext, DriverInfo, DriverManager};
    pub use crate::security::{AllowAll, DenyPermissions, SecurityPolicy, SqlPermission};

    pub use std::sync::Arc;
}

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use manager::DriverManager;
pub use types::Value;

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_imports() {
        let _value = Value::Int32(42);
        let _props = ConnectionProperties::new();
        let _config = DriverManagerConfig::default();
        let _permission = SqlPermission::SetLog;
    }

    #[test]
    fn test_error_types() {
        let err = Error::connection("test error");
        assert!(err.is_retriable());
        assert_eq!(err.category(), ErrorCategory::Connection);
    }

    #[test]
    fn test_temporal_values() {
        let date = SqlDate::parse("2023-02-31").unwrap();
        assert_eq!(date.to_string(), "2023-03-03");

        let ts = SqlTimestamp::parse("2023-03-05 10:20:30.5").unwrap();
        assert_eq!(ts.nanos(), 500_000_000);
        assert_eq!(ts.kind(), TemporalKind::Timestamp);
    }

    #[test]
    fn test_empty_manager() {
        let manager = DriverManager::new(
            DriverManagerConfig::default(),
            Arc::new(DriverLoader::new("system")),
        );
        assert!(!manager.is_initialized());
        assert!(manager.drivers(&manager.system_caller()).is_empty());
        assert!(manager.is_initialized());
    }
}
