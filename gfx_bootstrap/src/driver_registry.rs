//! Driver registry and loading stage.
//!
//! Maps driver names to factories and turns a name plus configuration into
//! an initialized backend. Constructed at startup and passed by value.

use gfx::config::BootstrapConfig;
use gfx::driver::{Driver, DriverFactory};
use gfx::error::BootstrapError;
use std::collections::BTreeMap;
use tracing::{error, info};

/// Named driver factories, kept in name order.
pub struct DriverRegistry {
    factories: BTreeMap<&'static str, DriverFactory>,
}

impl DriverRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            factories: BTreeMap::new(),
        }
    }

    /// Create a registry holding every built-in driver.
    pub fn with_builtin_drivers() -> Self {
        let mut registry = Self::new();
        crate::drivers::register_all_drivers(&mut registry);
        registry
    }

    /// Register a driver factory.
    ///
    /// # Panics
    /// Panics if `name` is already taken; built-in names are fixed at
    /// compile time, so a clash is a programming error.
    pub fn register(&mut self, name: &'static str, factory: DriverFactory) {
        let previous = self.factories.insert(name, factory);
        assert!(previous.is_none(), "Driver '{name}' is already registered");
    }

    /// Whether a driver called `name` is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered driver names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }

    /// Construct the driver called `name` and initialize it with `config`.
    ///
    /// # Errors
    /// - `DriverNotFound` if no driver is registered under `name`
    /// - `DriverUnavailable` if the driver cannot initialize (for example the
    ///   native loader is missing)
    pub fn load(
        &self,
        name: &str,
        config: &BootstrapConfig,
    ) -> Result<Box<dyn Driver>, BootstrapError> {
        let Some(factory) = self.factories.get(name) else {
            error!(
                "Unknown driver '{}'; registered: {}",
                name,
                self.names().collect::<Vec<_>>().join(", ")
            );
            return Err(BootstrapError::DriverNotFound(name.to_string()));
        };

        let mut driver = factory();
        driver
            .init(config)
            .map_err(BootstrapError::DriverUnavailable)?;

        info!("Loaded driver '{}' v{}", driver.name(), driver.version());
        Ok(driver)
    }
}

impl Default for DriverRegistry {
    fn default() -> Self {
        Self::with_builtin_drivers()
    }
}
