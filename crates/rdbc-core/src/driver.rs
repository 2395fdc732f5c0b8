//! Driver contract for rdbc-core
//!
//! A [`Driver`] is a handle that knows how to open connections for a family
//! of URLs. Drivers are registered with the
//! [`DriverManager`](crate::manager::DriverManager), which tries them in
//! registration order.

use async_trait::async_trait;
use std::any::Any;

use crate::connection::{Connection, ConnectionProperties};
use crate::error::Result;

/// A database driver
#[async_trait]
pub trait Driver: Send + Sync + 'static {
    /// Whether this driver can open the given URL.
    ///
    /// Returning an error is treated as "no" by the driver manager.
    fn accepts_url(&self, url: &str) -> Result<bool>;

    /// Attempt a connection.
    ///
    /// Returns `Ok(None)` when the URL is not meant for this driver, so the
    /// driver manager can move on to the next one.
    async fn connect(
        &self,
        url: &str,
        properties: &ConnectionProperties,
    ) -> Result<Option<Box<dyn Connection>>>;

    /// Properties this driver understands for the given URL
    fn property_info(
        &self,
        _url: &str,
        _properties: &ConnectionProperties,
    ) -> Result<Vec<DriverPropertyInfo>> {
        Ok(Vec::new())
    }

    /// Major version number
    fn major_version(&self) -> u32 {
        1
    }

    /// Minor version number
    fn minor_version(&self) -> u32 {
        0
    }

    /// Whether the driver passes the compliance suite
    fn jdbc_compliant(&self) -> bool {
        false
    }

    /// Fully qualified type name, used to re-resolve the driver through a
    /// [`DriverLoader`](crate::loader::DriverLoader)
    fn class_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Concrete type access for visibility checks
    fn as_any(&self) -> &dyn Any;
}

/// Hook invoked when a driver is deregistered
pub trait DriverAction: Send + Sync {
    /// Called before the driver is removed from the registry
    fn deregister(&self);
}

/// Description of a connection property a driver accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverPropertyInfo {
    /// Property name
    pub name: String,
    /// Current value, if known
    pub value: Option<String>,
    /// Human-readable description
    pub description: Option<String>,
    /// Whether a value must be supplied
    pub required: bool,
    /// Allowed values, if the property is an enumeration
    pub choices: Vec<String>,
}

impl DriverPropertyInfo {
    /// Create a property description
    pub fn new(name: impl Into<String>, value: Option<String>) -> Self {
        Self {
            name: name.into(),
            value,
            description: None,
            required: false,
            choices: Vec::new(),
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Mark as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the allowed values
    pub fn with_choices(mut self, choices: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.choices = choices.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct NullDriver;

    #[async_trait]
    impl Driver for NullDriver {
        fn accepts_url(&self, url: &str) -> Result<bool> {
            Ok(url.starts_with("null:"))
        }

        async fn connect(
            &self,
            _url: &str,
            _properties: &ConnectionProperties,
        ) -> Result<Option<Box<dyn Connection>>> {
            Ok(None)
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    #[test]
    fn test_driver_defaults() {
        let driver = NullDriver;
        assert_eq!(driver.major_version(), 1);
        assert_eq!(driver.minor_version(), 0);
        assert!(!driver.jdbc_compliant());
        assert!(driver.class_name().ends_with("NullDriver"));
        assert!(driver
            .property_info("null:", &ConnectionProperties::new())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_class_name_through_trait_object() {
        let driver: Box<dyn Driver> = Box::new(NullDriver);
        assert!(driver.class_name().ends_with("NullDriver"));
        assert!(driver.as_any().is::<NullDriver>());
    }

    #[test]
    fn test_property_info_builder() {
        let info = DriverPropertyInfo::new("sslmode", Some("prefer".into()))
            .with_description("TLS negotiation")
            .with_choices(["disable", "prefer", "require"])
            .required();

        assert!(info.required);
        assert_eq!(info.choices.len(), 3);
        assert_eq!(info.description.as_deref(), Some("TLS negotiation"));
    }
}
