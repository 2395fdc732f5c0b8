//! Connection contract for rdbc-core
//!
//! Drivers hand back a [`Connection`] from a successful connect attempt.
//! The driver manager never looks inside it; the trait only fixes the
//! surface callers program against.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::Result;
use crate::types::{Row, Value};

/// Property key for the user name
pub const USER: &str = "user";
/// Property key for the password
pub const PASSWORD: &str = "password";

/// A connection to a database
#[async_trait]
pub trait Connection: Send + Sync {
    /// Execute a query that returns rows
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Execute a query that modifies data, returns affected row count
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// Execute a query and return the first row (convenience method)
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        let rows = self.query(sql, params).await?;
        Ok(rows.into_iter().next())
    }

    /// Check if connection is valid/alive
    async fn is_valid(&self) -> bool;

    /// Close the connection
    async fn close(&self) -> Result<()>;
}

/// Connection properties passed to drivers on connect
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionProperties {
    properties: HashMap<String, String>,
    /// Login timeout in seconds (0 = driver default)
    pub login_timeout_secs: u32,
}

impl std::fmt::Debug for ConnectionProperties {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the password.
        let redacted: HashMap<&str, &str> = self
            .properties
            .iter()
            .map(|(k, v)| {
                if k == PASSWORD {
                    (k.as_str(), "***")
                } else {
                    (k.as_str(), v.as_str())
                }
            })
            .collect();

        f.debug_struct("ConnectionProperties")
            .field("properties", &redacted)
            .field("login_timeout_secs", &self.login_timeout_secs)
            .finish()
    }
}

impl ConnectionProperties {
    /// Create an empty property set
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a property set carrying credentials
    pub fn with_credentials(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self::new()
            .with_property(USER, user)
            .with_property(PASSWORD, password)
    }

    /// Add a property
    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set login timeout
    pub fn with_login_timeout(mut self, secs: u32) -> Self {
        self.login_timeout_secs = secs;
        self
    }

    /// Insert or replace a property
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Look up a property
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    /// User name, if set
    pub fn user(&self) -> Option<&str> {
        self.get(USER)
    }

    /// Password, if set
    pub fn password(&self) -> Option<&str> {
        self.get(PASSWORD)
    }

    /// Number of properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    /// Whether no properties are set
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }
}

/// Redact the password component of a connection URL for diagnostics.
///
/// Strings that do not parse as a URL are returned unchanged; JDBC-style
/// URLs such as `jdbc:postgresql://host/db` parse with an opaque path and
/// carry no password component.
pub fn redact_url(url: &str) -> String {
    match url::Url::parse(url) {
        Ok(mut parsed) if parsed.password().is_some() => {
            let _ = parsed.set_password(Some("***"));
            parsed.to_string()
        }
        _ => url.to_string(),
    }
}
