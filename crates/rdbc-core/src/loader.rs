//! Driver loading contexts for rdbc-core
//!
//! A [`DriverLoader`] is a namespace of driver types. It serves two purposes:
//!
//! - **Discovery**: drivers can be loaded by class name (the configured
//!   driver list) or enumerated as providers.
//! - **Visibility**: a registered driver is usable by a caller only if the
//!   caller's loader resolves the driver's class name to the driver's own
//!   concrete type. A driver created in an unrelated loader is invisible.
//!
//! Loaders delegate to their parent first, so a child loader sees every
//! driver type its parent knows about.
//!
//! Visibility is decided per type, not per instance. Rust has one `TypeId`
//! per type in the process, so two unrelated loaders that both register the
//! same driver type see each other's instances of it. Isolation between
//! loaders holds only for types one of them does not register.
//!
//! # Example
//!
//! ```rust,ignore
//! use rdbc_core::loader::DriverLoader;
//! use std::sync::Arc;
//!
//! let system = Arc::new(DriverLoader::new("system").with_driver(|| Ok(PgDriver::new())));
//! let app = DriverLoader::new("app").with_parent(system.clone());
//! assert!(app.resolve(std::any::type_name::<PgDriver>()).is_some());
//! ```

use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::sync::Arc;

use crate::driver::Driver;
use crate::error::{Error, Result};

type Factory = Box<dyn Fn() -> Result<Arc<dyn Driver>> + Send + Sync>;

/// A driver type known to a loader
struct DriverClass {
    name: &'static str,
    type_id: TypeId,
    provider: bool,
    factory: Factory,
    /// Loaded at most once per loader
    instance: Mutex<Option<Arc<dyn Driver>>>,
}

impl DriverClass {
    fn instance(&self) -> Result<Arc<dyn Driver>> {
        let mut slot = self.instance.lock();
        if let Some(driver) = slot.as_ref() {
            return Ok(driver.clone());
        }
        let driver = (self.factory)()?;
        *slot = Some(driver.clone());
        Ok(driver)
    }
}

/// A namespace of loadable driver types
pub struct DriverLoader {
    name: String,
    parent: Option<Arc<DriverLoader>>,
    classes: Vec<DriverClass>,
}

impl std::fmt::Debug for DriverLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverLoader")
            .field("name", &self.name)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .field(
                "classes",
                &self.classes.iter().map(|c| c.name).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DriverLoader {
    /// Create an empty loader
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            classes: Vec::new(),
        }
    }

    /// Delegate lookups to `parent` before this loader's own types
    pub fn with_parent(mut self, parent: Arc<DriverLoader>) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Add a driver type that is enumerated during provider discovery
    pub fn with_driver<D, F>(self, factory: F) -> Self
    where
        D: Driver,
        F: Fn() -> Result<D> + Send + Sync + 'static,
    {
        self.with_class_impl(factory, true)
    }

    /// Add a driver type that is loadable by name only
    pub fn with_class<D, F>(self, factory: F) -> Self
    where
        D: Driver,
        F: Fn() -> Result<D> + Send + Sync + 'static,
    {
        self.with_class_impl(factory, false)
    }

    fn with_class_impl<D, F>(mut self, factory: F, provider: bool) -> Self
    where
        D: Driver,
        F: Fn() -> Result<D> + Send + Sync + 'static,
    {
        self.classes.push(DriverClass {
            name: std::any::type_name::<D>(),
            type_id: TypeId::of::<D>(),
            provider,
            factory: Box::new(move || factory().map(|d| Arc::new(d) as Arc<dyn Driver>)),
            instance: Mutex::new(None),
        });
        self
    }

    /// Loader name
    pub fn name(&self) -> &str {
        &self.name
    }

    fn find(&self, class_name: &str) -> Option<&DriverClass> {
        if let Some(found) = self.parent.as_ref().and_then(|p| p.find(class_name)) {
            return Some(found);
        }
        self.classes.iter().find(|c| c.name == class_name)
    }

    /// Resolve a class name to the concrete type it denotes in this loader
    pub fn resolve(&self, class_name: &str) -> Option<TypeId> {
        self.find(class_name).map(|class| class.type_id)
    }

    /// Load a driver by class name.
    ///
    /// The driver is instantiated once per defining loader; later loads
    /// return the same handle.
    pub fn load(&self, class_name: &str) -> Result<Arc<dyn Driver>> {
        let class = self.find(class_name).ok_or_else(|| {
            Error::config(format!(
                "driver class '{}' not found in loader '{}'",
                class_name, self.name
            ))
        })?;
        class.instance()
    }

    /// Instantiate every provider driver, parent first.
    ///
    /// Each element is the outcome of one provider; a failing provider does
    /// not stop the enumeration.
    pub fn providers(&self) -> Vec<Result<Arc<dyn Driver>>> {
        let mut drivers = self
            .parent
            .as_ref()
            .map(|p| p.providers())
            .unwrap_or_default();
        drivers.extend(
            self.classes
                .iter()
                .filter(|c| c.provider)
                .map(DriverClass::instance),
        );
        drivers
    }

    /// Whether `driver` belongs to a type this loader resolves to the same
    /// concrete type.
    pub fn is_visible(&self, driver: &dyn Driver) -> bool {
        self.resolve(driver.class_name()) == Some(Any::type_id(driver.as_any()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::{Connection, ConnectionProperties};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct AlphaDriver;
    struct BetaDriver;

    macro_rules! impl_driver {
        ($ty:ty) => {
            #[async_trait]
            impl Driver for $ty {
                fn accepts_url(&self, _url: &str) -> Result<bool> {
                    Ok(false)
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
        };
    }

    impl_driver!(AlphaDriver);
    impl_driver!(BetaDriver);

    #[test]
    fn test_load_is_cached() {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let loader = DriverLoader::new("system").with_driver(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(AlphaDriver)
        });

        let name = std::any::type_name::<AlphaDriver>();
        let a = loader.load(name).unwrap();
        let b = loader.load(name).unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_load_unknown_class() {
        let loader = DriverLoader::new("system");
        let err = loader.load("no::such::Driver").err().unwrap();
        assert!(err.to_string().contains("no::such::Driver"));
    }

    #[test]
    fn test_providers_skip_name_only_classes() {
        let loader = DriverLoader::new("system")
            .with_driver(|| Ok(AlphaDriver))
            .with_class(|| Ok(BetaDriver));

        let providers = loader.providers();
        assert_eq!(providers.len(), 1);
        assert!(providers[0].as_ref().unwrap().as_any().is::<AlphaDriver>());
    }

    #[test]
    fn test_failing_provider_does_not_stop_enumeration() {
        let loader = DriverLoader::new("system")
            .with_driver::<BetaDriver, _>(|| Err(Error::config("broken provider")))
            .with_driver(|| Ok(AlphaDriver));

        let providers = loader.providers();
        assert_eq!(providers.len(), 2);
        assert!(providers[0].is_err());
        assert!(providers[1].is_ok());
    }

    #[test]
    fn test_visibility_follows_parent_delegation() {
        let system = Arc::new(DriverLoader::new("system").with_driver(|| Ok(AlphaDriver)));
        let app = DriverLoader::new("app")
            .with_parent(system.clone())
            .with_driver(|| Ok(BetaDriver));
        let isolated = DriverLoader::new("isolated");

        let alpha = system.load(std::any::type_name::<AlphaDriver>()).unwrap();
        let beta = app.load(std::any::type_name::<BetaDriver>()).unwrap();

        assert!(system.is_visible(alpha.as_ref()));
        assert!(app.is_visible(alpha.as_ref()));
        assert!(app.is_visible(beta.as_ref()));
        assert!(!system.is_visible(beta.as_ref()));
        assert!(!isolated.is_visible(alpha.as_ref()));
    }

    #[test]
    fn test_visibility_is_keyed_on_type() {
        let first = DriverLoader::new("first").with_driver(|| Ok(AlphaDriver));
        let second = DriverLoader::new("second").with_driver(|| Ok(AlphaDriver));

        let name = std::any::type_name::<AlphaDriver>();
        let from_first = first.load(name).unwrap();
        let from_second = second.load(name).unwrap();

        assert!(!Arc::ptr_eq(&from_first, &from_second));
        assert!(second.is_visible(from_first.as_ref()));
        assert!(first.is_visible(from_second.as_ref()));
    }

    #[test]
    fn test_child_load_returns_parent_instance() {
        let system = Arc::new(DriverLoader::new("system").with_driver(|| Ok(AlphaDriver)));
        let app = DriverLoader::new("app").with_parent(system.clone());

        let name = std::any::type_name::<AlphaDriver>();
        assert!(Arc::ptr_eq(&system.load(name).unwrap(), &app.load(name).unwrap()));
    }
}
