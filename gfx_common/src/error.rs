//! Bootstrap error taxonomy.
//!
//! Every variant is fatal for the process; `stage()` names the bootstrap
//! stage that failed so the top level can report it.

use crate::config::ConfigError;
use crate::driver::DriverError;
use crate::types::CapabilityName;
use std::fmt;
use thiserror::Error;

/// Lifecycle state of the driver aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleStage {
    /// Nothing created yet.
    Uninitialized,
    /// Driver instance (and channel, if any) live.
    Running,
    /// Torn down, or `start()` failed. Terminal.
    Terminated,
}

impl fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LifecycleStage::Uninitialized => "uninitialized",
            LifecycleStage::Running => "running",
            LifecycleStage::Terminated => "terminated",
        })
    }
}

/// Error types for bootstrap operations.
#[derive(Debug, Clone, Error)]
pub enum BootstrapError {
    /// Requested optional capabilities are not installed on the host
    #[error("Capability unavailable: {}", join_names(.missing))]
    CapabilityUnavailable {
        /// Names the host does not provide
        missing: Vec<CapabilityName>,
    },

    /// Driver refused instance creation
    #[error("Driver creation failed: {0}")]
    DriverCreationFailed(DriverError),

    /// Driver refused diagnostic callback registration
    #[error("Diagnostic channel creation failed: {0}")]
    ChannelCreationFailed(DriverError),

    /// Lifecycle operation not legal in the current state
    #[error("Cannot {operation} while {state}")]
    InvalidTransition {
        /// Attempted operation
        operation: &'static str,
        /// State at the time of the attempt
        state: LifecycleStage,
    },

    /// No driver registered under this name
    #[error("Driver not found: {0}")]
    DriverNotFound(String),

    /// Driver could not be loaded or initialized
    #[error("Driver unavailable: {0}")]
    DriverUnavailable(DriverError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Windowing toolkit error
    #[error("Window error: {0}")]
    Window(String),
}

impl BootstrapError {
    /// Bootstrap stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            BootstrapError::CapabilityUnavailable { .. } => "capability-check",
            BootstrapError::DriverCreationFailed(_) => "instance-creation",
            BootstrapError::ChannelCreationFailed(_) => "channel-attach",
            BootstrapError::InvalidTransition { .. } => "lifecycle",
            BootstrapError::DriverNotFound(_) | BootstrapError::DriverUnavailable(_) => {
                "driver-loading"
            }
            BootstrapError::Config(_) => "configuration",
            BootstrapError::Window(_) => "window",
        }
    }
}

fn join_names(names: &[CapabilityName]) -> String {
    names
        .iter()
        .map(CapabilityName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
