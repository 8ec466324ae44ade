//! Simulated host state.
//!
//! Everything the simulation driver knows about the emulated host: installed
//! layers, injected failures, live objects, and the log of every call made
//! against it.

use gfx::driver::{
    ChannelHandle, ChannelRequest, DriverError, InstanceHandle, InstanceRequest,
};
use gfx::types::{CapabilityName, ExtensionSet};

/// `VK_ERROR_INITIALIZATION_FAILED`
pub const ERROR_INITIALIZATION_FAILED: i32 = -3;
/// `VK_ERROR_LAYER_NOT_PRESENT`
pub const ERROR_LAYER_NOT_PRESENT: i32 = -6;
/// `VK_ERROR_EXTENSION_NOT_PRESENT`
pub const ERROR_EXTENSION_NOT_PRESENT: i32 = -7;

/// One call made against the simulated driver, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// Installed capabilities were queried
    EnumerateCapabilities,
    /// Instance creation was attempted
    CreateInstance {
        /// Layers requested
        capabilities: Vec<CapabilityName>,
        /// Extensions requested
        extensions: ExtensionSet,
    },
    /// Channel registration was attempted
    CreateChannel,
    /// A channel was destroyed
    DestroyChannel(ChannelHandle),
    /// An instance was destroyed
    DestroyInstance(InstanceHandle),
}

impl DriverCall {
    /// Whether this call released a driver object.
    pub fn is_destroy(&self) -> bool {
        matches!(
            self,
            DriverCall::DestroyChannel(_) | DriverCall::DestroyInstance(_)
        )
    }
}

pub(super) struct LiveInstance {
    pub handle: InstanceHandle,
    pub request: InstanceRequest,
}

pub(super) struct LiveChannel {
    pub handle: ChannelHandle,
    pub request: ChannelRequest,
}

pub(super) struct HostState {
    pub installed_layers: Vec<CapabilityName>,
    pub init_failure: Option<DriverError>,
    pub enumeration_fails: bool,
    pub instance_failure: Option<DriverError>,
    pub channel_failure: Option<DriverError>,
    pub instance: Option<LiveInstance>,
    pub channels: Vec<LiveChannel>,
    pub calls: Vec<DriverCall>,
    next_handle: u64,
}

impl HostState {
    pub fn new(installed_layers: Vec<CapabilityName>) -> Self {
        Self {
            installed_layers,
            init_failure: None,
            enumeration_fails: false,
            instance_failure: None,
            channel_failure: None,
            instance: None,
            channels: Vec::new(),
            calls: Vec::new(),
            next_handle: 0x1000,
        }
    }

    /// Non-zero, never reused.
    pub fn allocate_handle(&mut self) -> u64 {
        self.next_handle += 1;
        self.next_handle
    }
}
