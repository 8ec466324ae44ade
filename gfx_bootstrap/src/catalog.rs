//! Capability catalog.
//!
//! Answers whether the optional capabilities (layers) requested for
//! diagnostics are installed on the host.

use gfx::driver::Driver;
use gfx::types::CapabilityName;
use tracing::{debug, warn};

/// Read-only view over the capabilities a driver reports.
pub struct CapabilityCatalog<'a> {
    driver: &'a dyn Driver,
}

impl<'a> CapabilityCatalog<'a> {
    /// Create a catalog backed by `driver`.
    pub fn new(driver: &'a dyn Driver) -> Self {
        Self { driver }
    }

    /// Capabilities installed on the host.
    ///
    /// A failing query is treated as "nothing installed".
    pub fn available(&self) -> Vec<CapabilityName> {
        match self.driver.enumerate_capabilities() {
            Ok(available) => {
                debug!(
                    "Driver '{}' reports {} installed capabilities",
                    self.driver.name(),
                    available.len()
                );
                available
            }
            Err(e) => {
                warn!(
                    "Capability query on driver '{}' failed: {}. Treating as none installed.",
                    self.driver.name(),
                    e
                );
                Vec::new()
            }
        }
    }

    /// Requested names that are not installed, in request order.
    pub fn missing(&self, requested: &[CapabilityName]) -> Vec<CapabilityName> {
        if requested.is_empty() {
            return Vec::new();
        }

        let available = self.available();
        requested
            .iter()
            .filter(|name| !available.contains(name))
            .cloned()
            .collect()
    }

    /// Whether every requested capability is installed.
    pub fn supports(&self, requested: &[CapabilityName]) -> bool {
        self.missing(requested).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::simulation::{DriverCall, SimulationDriver};

    fn names(list: &[&str]) -> Vec<CapabilityName> {
        list.iter().map(|n| CapabilityName::new(*n)).collect()
    }

    #[test]
    fn supports_installed_layer() {
        let driver = SimulationDriver::new().with_installed_layers(names(&["layer.a", "layer.b"]));
        let catalog = CapabilityCatalog::new(&driver);

        assert!(catalog.supports(&names(&["layer.b"])));
        assert!(catalog.supports(&names(&["layer.a", "layer.b"])));
        assert_eq!(catalog.available().len(), 2);
    }

    #[test]
    fn missing_lists_absent_names_in_order() {
        let driver = SimulationDriver::new().with_installed_layers(names(&["layer.a"]));
        let catalog = CapabilityCatalog::new(&driver);

        let missing = catalog.missing(&names(&["layer.c", "layer.a", "layer.b"]));
        assert_eq!(missing, names(&["layer.c", "layer.b"]));
        assert!(!catalog.supports(&names(&["layer.c"])));
    }

    #[test]
    fn failed_query_means_nothing_installed() {
        let driver = SimulationDriver::new()
            .with_installed_layers(names(&["layer.a"]))
            .failing_enumeration();
        let catalog = CapabilityCatalog::new(&driver);

        assert!(catalog.available().is_empty());
        assert!(!catalog.supports(&names(&["layer.a"])));
    }

    #[test]
    fn empty_request_is_supported_without_query() {
        let driver = SimulationDriver::new().failing_enumeration();
        let catalog = CapabilityCatalog::new(&driver);

        assert!(catalog.supports(&[]));
        assert!(!driver.calls().contains(&DriverCall::EnumerateCapabilities));
    }
}
