//! Driver registry and resolver
//!
//! [`DriverManager`] keeps the registered drivers in registration order and
//! hands out connections by trying each driver in turn.
//!
//! # Concurrency
//!
//! - The registry is copy-on-write behind an [`ArcSwap`]: readers load an
//!   `Arc` snapshot without taking any lock, writers publish a new vector.
//! - Discovery runs at most once, guarded by a dedicated lock with an
//!   acquire/release flag as the fast path.
//! - Deregistration is serialized on the same lock as discovery.
//!
//! # Visibility
//!
//! Every query is made on behalf of a [`CallerContext`]. Drivers whose type
//! the caller's [`DriverLoader`] does not resolve are skipped, exactly as if
//! they were not registered.
//!
//! # Example
//!
//! ```rust,ignore
//! use rdbc_core::prelude::*;
//!
//! let manager = DriverManager::global();
//! manager.register_driver(Arc::new(PgDriver::new()));
//!
//! let caller = manager.system_caller();
//! let conn = manager
//!     .get_connection_with_credentials(
//!         &caller,
//!         "rdbc:pg://localhost/app",
//!         Some("app"),
//!         Some("secret"),
//!     )
//!     .await?;
//! ```

use arc_swap::ArcSwap;
use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use crate::config::DriverManagerConfig;
use crate::connection::{redact_url, Connection, ConnectionProperties, PASSWORD, USER};
use crate::driver::{Driver, DriverAction};
use crate::error::{sql_state, Error, Result};
use crate::loader::DriverLoader;
use crate::log::{LogSink, LogWriter};
use crate::security::{AllowAll, SecurityPolicy, SqlPermission};

static GLOBAL: OnceLock<DriverManager> = OnceLock::new();

/// Identity of the party asking the driver manager for something
#[derive(Clone)]
pub struct CallerContext {
    loader: Arc<DriverLoader>,
    policy: Arc<dyn SecurityPolicy>,
}

impl CallerContext {
    /// Create a caller with the given loader and security policy
    pub fn new(loader: Arc<DriverLoader>, policy: Arc<dyn SecurityPolicy>) -> Self {
        Self { loader, policy }
    }

    /// Create a caller that holds every permission
    pub fn trusted(loader: Arc<DriverLoader>) -> Self {
        Self::new(loader, Arc::new(AllowAll))
    }

    /// The caller's loader
    pub fn loader(&self) -> &Arc<DriverLoader> {
        &self.loader
    }

    fn check_permission(&self, permission: SqlPermission) -> Result<()> {
        self.policy.check_permission(permission)
    }

    fn can_see(&self, driver: &dyn Driver) -> bool {
        self.loader.is_visible(driver)
    }
}

impl fmt::Debug for CallerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallerContext")
            .field("loader", &self.loader.name())
            .finish_non_exhaustive()
    }
}

/// A registered driver and its optional deregistration hook.
///
/// Two entries are equal when they hold the same driver handle; the hook
/// plays no part.
#[derive(Clone)]
pub struct DriverInfo {
    driver: Arc<dyn Driver>,
    action: Option<Arc<dyn DriverAction>>,
}

impl DriverInfo {
    /// The driver handle
    pub fn driver(&self) -> &Arc<dyn Driver> {
        &self.driver
    }

    /// Whether a deregistration hook is attached
    pub fn has_action(&self) -> bool {
        self.action.is_some()
    }

    fn is(&self, driver: &Arc<dyn Driver>) -> bool {
        same_driver(&self.driver, driver)
    }
}

impl PartialEq for DriverInfo {
    fn eq(&self, other: &Self) -> bool {
        self.is(&other.driver)
    }
}

impl Eq for DriverInfo {}

impl fmt::Display for DriverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "driver[className={}]", self.driver.class_name())
    }
}

impl fmt::Debug for DriverInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverInfo")
            .field("class_name", &self.driver.class_name())
            .field("has_action", &self.has_action())
            .finish()
    }
}

/// Handle identity, ignoring vtable metadata
fn same_driver(a: &Arc<dyn Driver>, b: &Arc<dyn Driver>) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const (), Arc::as_ptr(b) as *const ())
}

/// Registry of database drivers
pub struct DriverManager {
    config: DriverManagerConfig,
    system_loader: Arc<DriverLoader>,
    registry: ArcSwap<Vec<DriverInfo>>,
    /// Guards discovery and deregistration. Reentrant so a deregistration
    /// hook may itself deregister.
    init_lock: ReentrantMutex<()>,
    initialized: AtomicBool,
    login_timeout: AtomicU32,
    log: LogWriter,
}

impl fmt::Debug for DriverManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DriverManager")
            .field("config", &self.config)
            .field("system_loader", &self.system_loader.name())
            .field("registered", &self.registry.load().len())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl DriverManager {
    /// Create a driver manager that discovers drivers through `system_loader`
    pub fn new(config: DriverManagerConfig, system_loader: Arc<DriverLoader>) -> Self {
        let login_timeout = AtomicU32::new(config.login_timeout_secs);
        Self {
            config,
            system_loader,
            registry: ArcSwap::from_pointee(Vec::new()),
            init_lock: ReentrantMutex::new(()),
            initialized: AtomicBool::new(false),
            login_timeout,
            log: LogWriter::default(),
        }
    }

    /// The process-wide driver manager.
    ///
    /// Unless [`install_global`](Self::install_global) ran first, it is
    /// configured from the environment with an empty system loader.
    pub fn global() -> &'static DriverManager {
        GLOBAL.get_or_init(|| {
            let config = DriverManagerConfig::from_env().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "invalid driver manager environment, using defaults");
                DriverManagerConfig::default()
            });
            DriverManager::new(config, Arc::new(DriverLoader::new("system")))
        })
    }

    /// Install the process-wide driver manager.
    ///
    /// Fails if [`global`](Self::global) was already initialized.
    pub fn install_global(
        config: DriverManagerConfig,
        system_loader: Arc<DriverLoader>,
    ) -> Result<&'static DriverManager> {
        let mut installed = false;
        let manager = GLOBAL.get_or_init(|| {
            installed = true;
            DriverManager::new(config, system_loader)
        });
        if !installed {
            return Err(Error::config("global driver manager is already initialized"));
        }
        Ok(manager)
    }

    /// The configuration this manager was created with
    pub fn config(&self) -> &DriverManagerConfig {
        &self.config
    }

    /// The loader used for discovery
    pub fn system_loader(&self) -> &Arc<DriverLoader> {
        &self.system_loader
    }

    /// A fully trusted caller in the system loader's context
    pub fn system_caller(&self) -> CallerContext {
        CallerContext::trusted(self.system_loader.clone())
    }

    /// Whether discovery has completed
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_initialized(&self) {
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        let _guard = self.init_lock.lock();
        if self.initialized.load(Ordering::Acquire) {
            return;
        }

        self.discover();
        self.initialized.store(true, Ordering::Release);
        self.println("JDBC DriverManager initialized");
    }

    fn discover(&self) {
        for name in &self.config.drivers {
            self.println(&format!("DriverManager.Initialize: loading {name}"));
            match self.system_loader.load(name) {
                Ok(driver) => self.register(driver, None),
                Err(e) => {
                    tracing::warn!(driver = %name, error = %e, "failed to load configured driver");
                    self.println(&format!("DriverManager.Initialize: load failed: {e}"));
                }
            }
        }

        if !self.config.discover_providers {
            return;
        }
        for provider in self.system_loader.providers() {
            match provider {
                Ok(driver) => self.register(driver, None),
                Err(e) => {
                    tracing::warn!(error = %e, "driver provider failed to load");
                    self.println(&format!("DriverManager.Initialize: provider failed: {e}"));
                }
            }
        }
    }

    fn snapshot(&self) -> Arc<Vec<DriverInfo>> {
        self.registry.load_full()
    }

    /// Register a driver. Registering the same handle twice is a no-op.
    pub fn register_driver(&self, driver: Arc<dyn Driver>) {
        self.register(driver, None);
    }

    /// Register a driver with a hook that runs when it is deregistered
    pub fn register_driver_with_action(
        &self,
        driver: Arc<dyn Driver>,
        action: Arc<dyn DriverAction>,
    ) {
        self.register(driver, Some(action));
    }

    fn register(&self, driver: Arc<dyn Driver>, action: Option<Arc<dyn DriverAction>>) {
        let info = DriverInfo { driver, action };
        let mut added = false;
        self.registry.rcu(|current| {
            added = !current.contains(&info);
            if !added {
                return Arc::clone(current);
            }
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(info.clone());
            Arc::new(next)
        });
        if added {
            self.println(&format!("registerDriver: {info}"));
        }
    }

    /// Remove a driver from the registry.
    ///
    /// Requires [`SqlPermission::DeregisterDriver`]. A registered driver the
    /// caller cannot see is an access violation; an unregistered one is
    /// ignored. The driver's hook, if any, runs before removal.
    pub fn deregister_driver(
        &self,
        caller: &CallerContext,
        driver: &Arc<dyn Driver>,
    ) -> Result<()> {
        caller.check_permission(SqlPermission::DeregisterDriver)?;
        self.println(&format!("DriverManager.deregisterDriver: {}", driver.class_name()));

        let _guard = self.init_lock.lock();

        let found = self
            .registry
            .load()
            .iter()
            .find(|info| info.is(driver))
            .cloned();
        let Some(info) = found else {
            self.println("    couldn't find driver to unload");
            return Ok(());
        };

        if !caller.can_see(driver.as_ref()) {
            return Err(Error::access_denied(format!(
                "driver {} is not visible to loader '{}'",
                driver.class_name(),
                caller.loader.name()
            )));
        }

        if let Some(action) = &info.action {
            action.deregister();
        }

        self.registry.rcu(|current| {
            current
                .iter()
                .filter(|entry| !entry.is(driver))
                .cloned()
                .collect::<Vec<_>>()
        });
        tracing::debug!(driver = driver.class_name(), "driver deregistered");
        Ok(())
    }

    /// Find the first visible driver that accepts `url`.
    ///
    /// A driver whose URL check fails is treated as declining.
    pub fn get_driver(&self, caller: &CallerContext, url: &str) -> Result<Arc<dyn Driver>> {
        self.println(&format!("DriverManager.getDriver(\"{}\")", redact_url(url)));
        self.ensure_initialized();

        for info in self.snapshot().iter() {
            if !caller.can_see(info.driver.as_ref()) {
                self.println(&format!("    skipping: {info}"));
                continue;
            }
            match info.driver.accepts_url(url) {
                Ok(true) => {
                    self.println(&format!("getDriver returning {info}"));
                    return Ok(info.driver.clone());
                }
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(
                        driver = info.driver.class_name(),
                        error = %e,
                        "accepts_url failed"
                    );
                }
            }
        }

        self.println("getDriver: no suitable driver");
        Err(Error::sql_with_state(
            "No suitable driver",
            sql_state::UNABLE_TO_CONNECT,
        ))
    }

    /// Open a connection with the first visible driver that produces one.
    ///
    /// Driver failures do not stop the search. If no driver connects, the
    /// first failure is returned unchanged; without any failure the result
    /// is a `08001` "No suitable driver found" error. An empty `url` fails
    /// before discovery runs.
    pub async fn get_connection(
        &self,
        caller: &CallerContext,
        url: &str,
        properties: &ConnectionProperties,
    ) -> Result<Box<dyn Connection>> {
        if url.is_empty() {
            return Err(Error::sql_with_state(
                "The url cannot be null",
                sql_state::UNABLE_TO_CONNECT,
            ));
        }

        self.println(&format!("DriverManager.getConnection(\"{}\")", redact_url(url)));
        self.ensure_initialized();

        let mut properties = properties.clone();
        if properties.login_timeout_secs == 0 {
            properties.login_timeout_secs = self.login_timeout();
        }

        let mut first_error: Option<Error> = None;
        for info in self.snapshot().iter() {
            if !caller.can_see(info.driver.as_ref()) {
                self.println(&format!("    skipping: {info}"));
                continue;
            }

            self.println(&format!("    trying {info}"));
            match info.driver.connect(url, &properties).await {
                Ok(Some(connection)) => {
                    self.println(&format!("getConnection returning {info}"));
                    return Ok(connection);
                }
                Ok(None) => {}
                Err(e) => {
                    self.println(&format!("    {info} failed: {e}"));
                    first_error.get_or_insert(e);
                }
            }
        }

        if let Some(e) = first_error {
            self.println(&format!("getConnection failed: {e}"));
            return Err(e);
        }

        self.println(&format!(
            "getConnection: no suitable driver found for {}",
            redact_url(url)
        ));
        Err(Error::sql_with_state(
            format!("No suitable driver found for {url}"),
            sql_state::UNABLE_TO_CONNECT,
        ))
    }

    /// [`get_connection`](Self::get_connection) with optional credentials
    pub async fn get_connection_with_credentials(
        &self,
        caller: &CallerContext,
        url: &str,
        user: Option<&str>,
        password: Option<&str>,
    ) -> Result<Box<dyn Connection>> {
        let mut properties = ConnectionProperties::new();
        if let Some(user) = user {
            properties.set(USER, user);
        }
        if let Some(password) = password {
            properties.set(PASSWORD, password);
        }
        self.get_connection(caller, url, &properties).await
    }

    /// [`get_connection`](Self::get_connection) with no properties
    pub async fn get_connection_default(
        &self,
        caller: &CallerContext,
        url: &str,
    ) -> Result<Box<dyn Connection>> {
        self.get_connection(caller, url, &ConnectionProperties::new())
            .await
    }

    /// Registered drivers visible to `caller`, in registration order
    pub fn drivers(&self, caller: &CallerContext) -> Vec<Arc<dyn Driver>> {
        self.ensure_initialized();

        self.snapshot()
            .iter()
            .filter(|info| {
                let visible = caller.can_see(info.driver.as_ref());
                if !visible {
                    self.println(&format!("    skipping: {info}"));
                }
                visible
            })
            .map(|info| info.driver.clone())
            .collect()
    }

    /// Set the login timeout in seconds passed to drivers that were not
    /// given one explicitly
    pub fn set_login_timeout(&self, secs: u32) {
        self.login_timeout.store(secs, Ordering::Relaxed);
    }

    /// Current login timeout in seconds
    pub fn login_timeout(&self) -> u32 {
        self.login_timeout.load(Ordering::Relaxed)
    }

    /// Install or clear the log sink. Requires [`SqlPermission::SetLog`].
    pub fn set_log_sink(&self, caller: &CallerContext, sink: Option<LogSink>) -> Result<()> {
        caller.check_permission(SqlPermission::SetLog)?;
        self.log.replace(sink);
        Ok(())
    }

    /// Whether a log sink is installed
    pub fn has_log_sink(&self) -> bool {
        self.log.is_enabled()
    }

    /// Write one line to the log sink
    pub fn println(&self, message: &str) {
        self.log.println(message);
    }
}
