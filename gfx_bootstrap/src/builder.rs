//! Instance builder and the owned driver instance.
//!
//! `InstanceBuilder` negotiates capabilities and extensions and creates the
//! driver instance in one call. `DriverInstance` owns the driver, the
//! instance handle and every diagnostic channel attached to it; its release
//! routine destroys the channels before the instance.

use crate::catalog::CapabilityCatalog;
use crate::channel::DiagnosticChannel;
use crate::resolver::ExtensionResolver;
use gfx::consts::VALIDATION_LAYER;
use gfx::driver::{ChannelRequest, Driver, DriverError, InstanceHandle, InstanceRequest};
use gfx::error::BootstrapError;
use gfx::types::{ApplicationDescriptor, CapabilityName, ExtensionSet};
use tracing::{debug, info, warn};

/// Builds a `DriverInstance` from a driver backend.
pub struct InstanceBuilder {
    driver: Box<dyn Driver>,
    resolver: ExtensionResolver,
    capabilities: Vec<CapabilityName>,
}

impl InstanceBuilder {
    /// Builder requesting the validation layer when diagnostics are on.
    pub fn new(driver: Box<dyn Driver>, resolver: ExtensionResolver) -> Self {
        Self {
            driver,
            resolver,
            capabilities: vec![CapabilityName::new(VALIDATION_LAYER)],
        }
    }

    /// Replace the capabilities requested when diagnostics are on.
    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityName>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Create the driver instance.
    ///
    /// With diagnostics on, the requested capabilities are checked before the
    /// driver is asked for anything else. With diagnostics off the catalog
    /// is never consulted and no capability is requested.
    ///
    /// # Errors
    /// - `CapabilityUnavailable` if a requested capability is not installed
    /// - `DriverCreationFailed` if the driver rejects the request
    pub fn build(
        self,
        app: &ApplicationDescriptor,
        diagnostics_enabled: bool,
    ) -> Result<DriverInstance, BootstrapError> {
        let mut driver = self.driver;

        let capabilities = if diagnostics_enabled {
            let missing = CapabilityCatalog::new(&*driver).missing(&self.capabilities);
            if !missing.is_empty() {
                return Err(BootstrapError::CapabilityUnavailable { missing });
            }
            self.capabilities
        } else {
            Vec::new()
        };

        debug!(
            "Window system requires {:?}",
            self.resolver.window_extensions()
        );
        let extensions = self.resolver.resolve(diagnostics_enabled);
        debug!(
            "Requesting {} capabilities and {} extensions: {:?}",
            capabilities.len(),
            extensions.len(),
            extensions.as_slice()
        );

        let request = InstanceRequest {
            application: app.clone(),
            capabilities,
            extensions,
        };
        let handle = driver
            .create_instance(&request)
            .map_err(BootstrapError::DriverCreationFailed)?;

        info!(
            "Created {} instance {} for '{}' v{} (API {})",
            driver.name(),
            handle,
            app.app_name(),
            app.app_version(),
            app.api_version()
        );

        Ok(DriverInstance {
            driver,
            handle,
            request,
            channels: Vec::new(),
            released: false,
        })
    }
}

/// Live driver instance and the channels attached to it.
///
/// Released exactly once, by `destroy()` or on drop; attached channels are
/// always destroyed first, newest first.
pub struct DriverInstance {
    driver: Box<dyn Driver>,
    handle: InstanceHandle,
    request: InstanceRequest,
    channels: Vec<DiagnosticChannel>,
    released: bool,
}

impl DriverInstance {
    /// Native instance handle.
    pub fn handle(&self) -> InstanceHandle {
        self.handle
    }

    /// Name of the driver backend.
    pub fn driver_name(&self) -> &'static str {
        self.driver.name()
    }

    /// Application metadata the instance was created with.
    pub fn application(&self) -> &ApplicationDescriptor {
        &self.request.application
    }

    /// Capabilities enabled on the instance.
    pub fn capabilities(&self) -> &[CapabilityName] {
        &self.request.capabilities
    }

    /// Extensions enabled on the instance.
    pub fn extensions(&self) -> &ExtensionSet {
        &self.request.extensions
    }

    /// Channels attached to the instance, oldest first.
    pub fn channels(&self) -> &[DiagnosticChannel] {
        &self.channels
    }

    /// Register a channel with the driver and take ownership of it.
    pub(crate) fn adopt_channel(
        &mut self,
        request: ChannelRequest,
    ) -> Result<DiagnosticChannel, DriverError> {
        let handle = self.driver.create_channel(self.handle, &request)?;
        debug!("Attached diagnostic channel {} to instance {}", handle, self.handle);
        let channel = DiagnosticChannel::new(handle, request.filter);
        self.channels.push(channel.clone());
        Ok(channel)
    }

    /// Destroy attached channels, then the instance.
    pub fn destroy(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        while let Some(channel) = self.channels.pop() {
            self.driver.destroy_channel(self.handle, channel.handle());
            debug!("Destroyed diagnostic channel {}", channel.handle());
        }
        self.driver.destroy_instance(self.handle);
        info!("Destroyed {} instance {}", self.driver.name(), self.handle);
    }
}

impl Drop for DriverInstance {
    fn drop(&mut self) {
        if !self.released {
            warn!("Instance {} dropped without destroy(); releasing", self.handle);
        }
        self.release();
    }
}
