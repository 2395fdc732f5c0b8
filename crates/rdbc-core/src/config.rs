//! Driver manager configuration

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable holding the colon-separated list of driver class names
pub const DRIVERS_ENV: &str = "RDBC_DRIVERS";

/// Environment variable holding the default login timeout in seconds
pub const LOGIN_TIMEOUT_ENV: &str = "RDBC_LOGIN_TIMEOUT";

/// Configuration for a [`DriverManager`](crate::manager::DriverManager)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverManagerConfig {
    /// Driver class names loaded through the system loader during discovery,
    /// in order
    pub drivers: Vec<String>,

    /// Login timeout in seconds handed to drivers (0 = driver default)
    pub login_timeout_secs: u32,

    /// Enumerate the system loader's providers during discovery
    pub discover_providers: bool,
}

impl Default for DriverManagerConfig {
    fn default() -> Self {
        Self {
            drivers: Vec::new(),
            login_timeout_secs: 0,
            discover_providers: true,
        }
    }
}

impl DriverManagerConfig {
    /// Create a new configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the configuration from `RDBC_DRIVERS` and `RDBC_LOGIN_TIMEOUT`.
    ///
    /// Unset variables keep their defaults. A login timeout that is not a
    /// non-negative integer is a configuration error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(list) = std::env::var(DRIVERS_ENV) {
            config.drivers = parse_driver_list(&list);
        }

        if let Ok(raw) = std::env::var(LOGIN_TIMEOUT_ENV) {
            config.login_timeout_secs = raw.trim().parse().map_err(|_| {
                Error::config(format!(
                    "{LOGIN_TIMEOUT_ENV} must be a number of seconds, got '{raw}'"
                ))
            })?;
        }

        Ok(config)
    }

    /// Set the configured driver list
    pub fn with_drivers(mut self, drivers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.drivers = drivers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the login timeout
    pub fn with_login_timeout(mut self, secs: u32) -> Self {
        self.login_timeout_secs = secs;
        self
    }

    /// Enable or disable provider enumeration
    pub fn with_provider_discovery(mut self, enabled: bool) -> Self {
        self.discover_providers = enabled;
        self
    }
}

/// Split a colon-separated driver list, skipping empty entries.
///
/// Only a lone `:` separates entries; `::` is a path separator inside a
/// type name such as `my_driver::PgDriver`.
pub fn parse_driver_list(list: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut current = String::new();
    let mut chars = list.chars().peekable();

    while let Some(c) = chars.next() {
        if c != ':' {
            current.push(c);
        } else if chars.peek() == Some(&':') {
            chars.next();
            current.push_str("::");
        } else {
            push_name(&mut names, &mut current);
        }
    }
    push_name(&mut names, &mut current);
    names
}

fn push_name(names: &mut Vec<String>, current: &mut String) {
    let name = current.trim();
    if !name.is_empty() {
        names.push(name.to_string());
    }
    current.clear();
}
