//! Prelude module for common re-exports.
//!
//! Consumers can do `use gfx_common::prelude::*;` and get the most
//! important types without listing individual paths.

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{BootstrapConfig, ConfigError, ConfigLoader, LogLevel};

// ─── Constants ──────────────────────────────────────────────────────
pub use crate::consts::{DEBUG_UTILS_EXTENSION, DIAGNOSTICS_ENABLED, VALIDATION_LAYER};

// ─── Driver ─────────────────────────────────────────────────────────
pub use crate::driver::{
    ChannelHandle, ChannelRequest, DiagnosticSink, Driver, DriverError, DriverFactory,
    InstanceHandle, InstanceRequest,
};

// ─── Errors ─────────────────────────────────────────────────────────
pub use crate::error::{BootstrapError, LifecycleStage};

// ─── Data model ─────────────────────────────────────────────────────
pub use crate::types::{
    ApplicationDescriptor, CapabilityName, ChannelFilter, ExtensionSet, MessageType,
    MessageTypes, Severities, Severity, Version,
};
