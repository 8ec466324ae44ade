//! Graphics driver trait and request types.
//!
//! This module defines:
//! - `Driver` trait - Interface for pluggable graphics driver backends
//! - `DriverError` - Error reported by a backend, with its native code
//! - `InstanceRequest` / `ChannelRequest` - Atomic creation requests
//! - `DriverFactory` type alias - Factory function type
//! - `DiagnosticSink` trait - Receiver of driver-reported messages

use crate::config::BootstrapConfig;
use crate::types::{ApplicationDescriptor, CapabilityName, ChannelFilter, ExtensionSet, Severity};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Error reported by a driver backend.
///
/// `code` carries the driver's own result code when it reported one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}{}", .code.map(|c| format!(" (driver code {c})")).unwrap_or_default())]
pub struct DriverError {
    /// Native result code, if any
    pub code: Option<i32>,
    /// Human-readable description
    pub message: String,
}

impl DriverError {
    /// Error without a native result code.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Error carrying the driver's result code.
    pub fn with_code(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }
}

/// Opaque handle of a live driver instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InstanceHandle(u64);

impl InstanceHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle of a live diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle(u64);

impl ChannelHandle {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for InstanceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Receiver of driver-reported diagnostic messages.
///
/// Called synchronously from inside driver operations, possibly reentrantly.
/// Implementations must return promptly, must not panic, and must never call
/// back into the driver.
pub trait DiagnosticSink: Send + Sync {
    /// Deliver one message tagged with its severity.
    fn report(&self, severity: Severity, message: &str);
}

impl<F> DiagnosticSink for F
where
    F: Fn(Severity, &str) + Send + Sync,
{
    fn report(&self, severity: Severity, message: &str) {
        self(severity, message)
    }
}

/// Everything the driver needs to create an instance in one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceRequest {
    /// Application metadata
    pub application: ApplicationDescriptor,
    /// Layers to enable (empty when diagnostics are off)
    pub capabilities: Vec<CapabilityName>,
    /// Extensions to enable
    pub extensions: ExtensionSet,
}

/// Registration of a diagnostic callback.
#[derive(Clone)]
pub struct ChannelRequest {
    /// Messages the driver should deliver
    pub filter: ChannelFilter,
    /// Where delivered messages go
    pub sink: Arc<dyn DiagnosticSink>,
}

impl fmt::Debug for ChannelRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelRequest")
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

/// Factory function type for creating driver instances.
pub type DriverFactory = fn() -> Box<dyn Driver>;

/// Trait defining the interface for graphics driver backends.
///
/// The bootstrap core reaches the native driver only through this trait,
/// so backends (native Vulkan, simulation) are interchangeable.
///
/// # Lifecycle
///
/// 1. `init()` - load the native entry points
/// 2. `enumerate_capabilities()` - optional, before instance creation
/// 3. `create_instance()` - exactly once
/// 4. `create_channel()` / `destroy_channel()` - against the live instance
/// 5. `destroy_instance()` - after every channel is destroyed
///
/// Ordering between 4 and 5 is enforced by the caller; backends may assume it.
pub trait Driver: Send {
    /// Returns the driver's unique identifier (e.g., "vulkan", "simulation").
    fn name(&self) -> &'static str;

    /// Returns the driver's semantic version.
    fn version(&self) -> &'static str;

    /// Load native entry points and apply driver-specific configuration.
    ///
    /// # Errors
    /// Returns `DriverError` if the native loader cannot be opened.
    fn init(&mut self, config: &BootstrapConfig) -> Result<(), DriverError>;

    /// List the optional capabilities (layers) installed on the host.
    fn enumerate_capabilities(&self) -> Result<Vec<CapabilityName>, DriverError>;

    /// Create the top-level instance in one atomic call.
    ///
    /// On error no instance exists and nothing must be destroyed.
    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, DriverError>;

    /// Register a diagnostic callback against a live instance.
    fn create_channel(
        &mut self,
        instance: InstanceHandle,
        request: &ChannelRequest,
    ) -> Result<ChannelHandle, DriverError>;

    /// Unregister a diagnostic callback.
    fn destroy_channel(&mut self, instance: InstanceHandle, channel: ChannelHandle);

    /// Release the instance. Every channel must already be destroyed.
    fn destroy_instance(&mut self, instance: InstanceHandle);
}
