//! Simulation driver implementation.
//!
//! The `SimulationDriver` implements the `Driver` trait against an emulated
//! host, for development and testing without a GPU or a Vulkan loader.
//! Clones share the same host, so a clone kept outside the bootstrap core can
//! inspect the call log and inject driver messages.

use super::state::{
    DriverCall, ERROR_EXTENSION_NOT_PRESENT, ERROR_INITIALIZATION_FAILED,
    ERROR_LAYER_NOT_PRESENT, HostState, LiveChannel, LiveInstance,
};
use gfx::config::BootstrapConfig;
use gfx::consts::{DEBUG_UTILS_EXTENSION, VALIDATION_LAYER};
use gfx::driver::{
    ChannelHandle, ChannelRequest, DiagnosticSink, Driver, DriverError, InstanceHandle,
    InstanceRequest,
};
use gfx::types::{CapabilityName, MessageTypes, Severity};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Simulation driver implementing the Driver trait.
#[derive(Clone)]
pub struct SimulationDriver {
    /// Driver name
    name: &'static str,
    /// Driver version
    version: &'static str,
    /// Emulated host, shared between clones
    host: Arc<Mutex<HostState>>,
}

impl SimulationDriver {
    /// Create a simulated host with the validation layer installed.
    pub fn new() -> Self {
        Self {
            name: "simulation",
            version: env!("CARGO_PKG_VERSION"),
            host: Arc::new(Mutex::new(HostState::new(vec![CapabilityName::new(
                VALIDATION_LAYER,
            )]))),
        }
    }

    /// Replace the set of installed layers.
    pub fn with_installed_layers(self, layers: Vec<CapabilityName>) -> Self {
        self.host.lock().installed_layers = layers;
        self
    }

    /// Make `init()` fail with `error`, as a missing loader would.
    pub fn failing_init(self, error: DriverError) -> Self {
        self.host.lock().init_failure = Some(error);
        self
    }

    /// Make every capability query fail.
    pub fn failing_enumeration(self) -> Self {
        self.host.lock().enumeration_fails = true;
        self
    }

    /// Make instance creation fail with `error`.
    pub fn failing_instance_creation(self, error: DriverError) -> Self {
        self.host.lock().instance_failure = Some(error);
        self
    }

    /// Make channel registration fail with `error`.
    pub fn failing_channel_creation(self, error: DriverError) -> Self {
        self.host.lock().channel_failure = Some(error);
        self
    }

    /// Every call made so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.host.lock().calls.clone()
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count_calls(&self, predicate: impl Fn(&DriverCall) -> bool) -> usize {
        self.host.lock().calls.iter().filter(|c| predicate(c)).count()
    }

    /// Handle of the live instance, if any.
    pub fn live_instance(&self) -> Option<InstanceHandle> {
        self.host.lock().instance.as_ref().map(|i| i.handle)
    }

    /// Number of live diagnostic channels.
    pub fn live_channels(&self) -> usize {
        self.host.lock().channels.len()
    }

    /// Emit a driver message to every channel whose filter accepts it.
    ///
    /// Sinks are called after the host lock is released, so a sink may
    /// query this driver. Returns the number of channels that received it.
    pub fn emit(&self, severity: Severity, types: MessageTypes, message: &str) -> usize {
        let sinks: Vec<Arc<dyn DiagnosticSink>> = {
            let host = self.host.lock();
            host.channels
                .iter()
                .filter(|c| c.request.filter.accepts(severity, types))
                .map(|c| Arc::clone(&c.request.sink))
                .collect()
        };

        for sink in &sinks {
            sink.report(severity, message);
        }
        sinks.len()
    }
}

impl Default for SimulationDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for SimulationDriver {
    fn name(&self) -> &'static str {
        self.name
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn init(&mut self, config: &BootstrapConfig) -> Result<(), DriverError> {
        if let Some(error) = self.host.lock().init_failure.clone() {
            return Err(error);
        }

        let layers = config.simulation.installed_layers.clone();
        info!(
            "Initializing simulation driver with {} installed layers",
            layers.len()
        );
        self.host.lock().installed_layers = layers;
        Ok(())
    }

    fn enumerate_capabilities(&self) -> Result<Vec<CapabilityName>, DriverError> {
        let mut host = self.host.lock();
        host.calls.push(DriverCall::EnumerateCapabilities);

        if host.enumeration_fails {
            return Err(DriverError::with_code(
                ERROR_INITIALIZATION_FAILED,
                "simulated layer enumeration failure",
            ));
        }
        Ok(host.installed_layers.clone())
    }

    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, DriverError> {
        let mut host = self.host.lock();
        host.calls.push(DriverCall::CreateInstance {
            capabilities: request.capabilities.clone(),
            extensions: request.extensions.clone(),
        });

        if let Some(error) = host.instance_failure.clone() {
            return Err(error);
        }
        if host.instance.is_some() {
            return Err(DriverError::with_code(
                ERROR_INITIALIZATION_FAILED,
                "an instance already exists",
            ));
        }
        if let Some(missing) = request
            .capabilities
            .iter()
            .find(|layer| !host.installed_layers.contains(layer))
        {
            return Err(DriverError::with_code(
                ERROR_LAYER_NOT_PRESENT,
                format!("layer {missing} not present"),
            ));
        }

        let handle = InstanceHandle::from_raw(host.allocate_handle());
        debug!(
            "Simulated instance {} created for '{}' ({} layers, {} extensions)",
            handle,
            request.application.app_name(),
            request.capabilities.len(),
            request.extensions.len()
        );
        host.instance = Some(LiveInstance {
            handle,
            request: request.clone(),
        });
        Ok(handle)
    }

    fn create_channel(
        &mut self,
        instance: InstanceHandle,
        request: &ChannelRequest,
    ) -> Result<ChannelHandle, DriverError> {
        let mut host = self.host.lock();
        host.calls.push(DriverCall::CreateChannel);

        if let Some(error) = host.channel_failure.clone() {
            return Err(error);
        }
        let debug_utils_enabled = match &host.instance {
            Some(live) if live.handle == instance => {
                live.request.extensions.contains(DEBUG_UTILS_EXTENSION)
            }
            _ => {
                return Err(DriverError::with_code(
                    ERROR_INITIALIZATION_FAILED,
                    format!("unknown instance {instance}"),
                ));
            }
        };
        if !debug_utils_enabled {
            return Err(DriverError::with_code(
                ERROR_EXTENSION_NOT_PRESENT,
                format!("{DEBUG_UTILS_EXTENSION} not enabled on instance {instance}"),
            ));
        }

        let handle = ChannelHandle::from_raw(host.allocate_handle());
        host.channels.push(LiveChannel {
            handle,
            request: request.clone(),
        });
        debug!("Simulated channel {} registered on {}", handle, instance);
        Ok(handle)
    }

    fn destroy_channel(&mut self, instance: InstanceHandle, channel: ChannelHandle) {
        let mut host = self.host.lock();
        host.calls.push(DriverCall::DestroyChannel(channel));

        let position = host.channels.iter().position(|c| c.handle == channel);
        match position {
            Some(idx) => {
                host.channels.remove(idx);
            }
            None => warn!("Destroying unknown channel {} on {}", channel, instance),
        }
    }

    fn destroy_instance(&mut self, instance: InstanceHandle) {
        let mut host = self.host.lock();
        host.calls.push(DriverCall::DestroyInstance(instance));

        if !host.channels.is_empty() {
            warn!(
                "Instance {} destroyed with {} channels still live",
                instance,
                host.channels.len()
            );
        }
        let live = host.instance.take();
        match live {
            Some(live) if live.handle == instance => {}
            Some(live) => {
                warn!("Destroying unknown instance {}", instance);
                host.instance = Some(live);
            }
            None => warn!("Destroying instance {} with none live", instance),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gfx::types::{ApplicationDescriptor, ChannelFilter, ExtensionSet, Version};

    fn request(capabilities: &[&str], extensions: &[&str]) -> InstanceRequest {
        InstanceRequest {
            application: ApplicationDescriptor::new("test", Version::new(0, 1, 0)),
            capabilities: capabilities.iter().map(|c| CapabilityName::new(*c)).collect(),
            extensions: extensions.iter().copied().collect::<ExtensionSet>(),
        }
    }

    fn channel_request(filter: ChannelFilter) -> ChannelRequest {
        ChannelRequest {
            filter,
            sink: Arc::new(|_: Severity, _: &str| {}),
        }
    }

    #[test]
    fn init_applies_configured_layers() {
        let mut driver = SimulationDriver::new();
        let mut config = BootstrapConfig::default();
        config.simulation.installed_layers = vec![CapabilityName::new("layer.x")];

        driver.init(&config).unwrap();
        assert_eq!(
            driver.enumerate_capabilities().unwrap(),
            vec![CapabilityName::new("layer.x")]
        );
    }

    #[test]
    fn create_instance_rejects_missing_layer() {
        let mut driver = SimulationDriver::new().with_installed_layers(Vec::new());
        let err = driver
            .create_instance(&request(&[VALIDATION_LAYER], &[]))
            .unwrap_err();
        assert_eq!(err.code, Some(ERROR_LAYER_NOT_PRESENT));
        assert!(driver.live_instance().is_none());
    }

    #[test]
    fn only_one_instance_at_a_time() {
        let mut driver = SimulationDriver::new();
        driver.create_instance(&request(&[], &[])).unwrap();
        let err = driver.create_instance(&request(&[], &[])).unwrap_err();
        assert_eq!(err.code, Some(ERROR_INITIALIZATION_FAILED));
    }

    #[test]
    fn channel_requires_debug_utils_extension() {
        let mut driver = SimulationDriver::new();
        let instance = driver.create_instance(&request(&[], &["ext.surface"])).unwrap();

        let err = driver
            .create_channel(instance, &channel_request(ChannelFilter::default()))
            .unwrap_err();
        assert_eq!(err.code, Some(ERROR_EXTENSION_NOT_PRESENT));
        assert_eq!(driver.live_channels(), 0);
    }

    #[test]
    fn emit_respects_channel_filter() {
        let mut driver = SimulationDriver::new();
        let instance = driver
            .create_instance(&request(&[], &[DEBUG_UTILS_EXTENSION]))
            .unwrap();
        let filter = ChannelFilter {
            severities: gfx::types::Severities::ERROR,
            message_types: MessageTypes::all(),
        };
        driver.create_channel(instance, &channel_request(filter)).unwrap();

        assert_eq!(driver.emit(Severity::Info, MessageTypes::GENERAL, "hi"), 0);
        assert_eq!(driver.emit(Severity::Error, MessageTypes::VALIDATION, "bad"), 1);
    }

    #[test]
    fn clones_share_the_host() {
        let mut driver = SimulationDriver::new();
        let host = driver.clone();
        let instance = driver.create_instance(&request(&[], &[])).unwrap();

        assert_eq!(host.live_instance(), Some(instance));
        driver.destroy_instance(instance);
        assert!(host.live_instance().is_none());
        assert_eq!(host.count_calls(DriverCall::is_destroy), 1);
    }
}
