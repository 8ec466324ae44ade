//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! of the bootstrap binary. Every section is optional; missing values fall
//! back to the defaults of the reference application.
//!
//! # Usage
//!
//! ```rust,no_run
//! use gfx_common::config::{BootstrapConfig, ConfigError, ConfigLoader};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = BootstrapConfig::load(Path::new("bootstrap.toml"))?;
//!     config.validate()?;
//!     println!("Application: {}", config.application.name);
//!     Ok(())
//! }
//! ```

use crate::consts::{
    DEFAULT_APP_NAME, DEFAULT_SERVICE_NAME, DEFAULT_WINDOW_HEIGHT, DEFAULT_WINDOW_TITLE,
    DEFAULT_WINDOW_WIDTH, VALIDATION_LAYER,
};
use crate::types::{
    ApplicationDescriptor, CapabilityName, ChannelFilter, MessageType, Severity, Version,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Error type for configuration loading operations.
///
/// This enum represents all possible errors that can occur when loading
/// configuration files.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, includes verbose driver diagnostics.
    Trace,
    /// Negotiation details.
    Debug,
    /// Lifecycle transitions.
    #[default]
    Info,
    /// Warnings, including driver warnings.
    Warn,
    /// Errors only.
    Error,
}

impl LogLevel {
    /// Directive string understood by tracing filters.
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "gfx-bootstrap"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SharedConfig {
    /// Logging verbosity level.
    pub log_level: LogLevel,

    /// Instance identifier used in log output.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
        }
    }
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// `[application]` - metadata handed to the driver at instance creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ApplicationConfig {
    pub name: String,
    pub version: Version,
    pub engine_name: String,
    pub engine_version: Version,
    pub api_version: Version,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_APP_NAME.to_string(),
            version: Version::new(0, 0, 1),
            engine_name: String::new(),
            engine_version: Version::new(0, 0, 1),
            api_version: Version::new(1, 0, 0),
        }
    }
}

impl ApplicationConfig {
    /// Build the immutable descriptor passed to the instance builder.
    pub fn descriptor(&self) -> ApplicationDescriptor {
        ApplicationDescriptor::new(self.name.clone(), self.version)
            .with_engine(self.engine_name.clone(), self.engine_version)
            .with_api_version(self.api_version)
    }
}

/// `[window]` - parameters for the window the event loop runs on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub resizable: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_WINDOW_TITLE.to_string(),
            width: DEFAULT_WINDOW_WIDTH,
            height: DEFAULT_WINDOW_HEIGHT,
            resizable: false,
        }
    }
}

/// `[diagnostics]` - what to request when diagnostics mode is on.
///
/// Whether diagnostics mode is on is decided at build time, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiagnosticsConfig {
    /// Layers that must be installed for diagnostics.
    pub layers: Vec<CapabilityName>,
    /// Severities the channel subscribes to.
    pub severities: Vec<Severity>,
    /// Message types the channel subscribes to.
    pub message_types: Vec<MessageType>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            layers: vec![CapabilityName::new(VALIDATION_LAYER)],
            severities: Severity::ALL.to_vec(),
            message_types: vec![
                MessageType::General,
                MessageType::Validation,
                MessageType::Performance,
            ],
        }
    }
}

impl DiagnosticsConfig {
    /// Channel filter built from the configured lists.
    pub fn filter(&self) -> ChannelFilter {
        ChannelFilter::from_lists(&self.severities, &self.message_types)
    }
}

/// `[simulation]` - host emulated by the simulation driver.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Layers the simulated host reports as installed.
    pub installed_layers: Vec<CapabilityName>,
    /// Surface extensions the simulated window system requires.
    pub surface_extensions: Vec<String>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            installed_layers: vec![CapabilityName::new(VALIDATION_LAYER)],
            surface_extensions: vec![
                "VK_KHR_surface".to_string(),
                "VK_KHR_xlib_surface".to_string(),
            ],
        }
    }
}

/// Complete configuration of the bootstrap binary.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BootstrapConfig {
    pub shared: SharedConfig,
    pub application: ApplicationConfig,
    pub window: WindowConfig,
    pub diagnostics: DiagnosticsConfig,
    pub simulation: SimulationConfig,
}

impl BootstrapConfig {
    /// Load from `path`, or use defaults when no path is given.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Validate all sections.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` or `application.name` is empty
    /// - the window has a zero dimension
    /// - a layer name is empty
    /// - the diagnostic channel would subscribe to nothing
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.application.name.is_empty() {
            return Err(ConfigError::ValidationError(
                "application.name cannot be empty".to_string(),
            ));
        }
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::ValidationError(format!(
                "window size must be non-zero (got {}x{})",
                self.window.width, self.window.height
            )));
        }
        if self
            .diagnostics
            .layers
            .iter()
            .chain(&self.simulation.installed_layers)
            .any(|l| l.as_str().is_empty())
        {
            return Err(ConfigError::ValidationError(
                "layer names cannot be empty".to_string(),
            ));
        }
        if self.diagnostics.severities.is_empty() || self.diagnostics.message_types.is_empty() {
            return Err(ConfigError::ValidationError(
                "diagnostics must subscribe to at least one severity and message type"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Trait for loading configuration from TOML files.
///
/// Default implementation works with any type implementing
/// `serde::de::DeserializeOwned`.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_log_level_default() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
    }

    #[test]
    fn test_log_level_deserialization() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct TestWrapper {
            level: LogLevel,
        }

        for (text, level) in [
            ("trace", LogLevel::Trace),
            ("debug", LogLevel::Debug),
            ("info", LogLevel::Info),
            ("warn", LogLevel::Warn),
            ("error", LogLevel::Error),
        ] {
            let parsed: TestWrapper = toml::from_str(&format!("level = \"{text}\"")).unwrap();
            assert_eq!(parsed.level, level);
            assert_eq!(level.as_str(), text);
        }
    }

    #[test]
    fn test_shared_config_validation_empty_service_name() {
        let config = SharedConfig {
            log_level: LogLevel::Info,
            service_name: "".to_string(),
        };
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_defaults_match_reference_application() {
        let config = BootstrapConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.application.name, "Triangle");
        assert_eq!(config.application.api_version, Version::new(1, 0, 0));
        assert_eq!(config.window.width, 800);
        assert_eq!(config.window.height, 600);
        assert!(!config.window.resizable);
        assert_eq!(
            config.diagnostics.layers,
            vec![CapabilityName::new(VALIDATION_LAYER)]
        );
        assert_eq!(config.diagnostics.filter(), ChannelFilter::default());
    }

    #[test]
    fn test_descriptor_from_application_config() {
        let app = ApplicationConfig {
            name: "Demo".to_string(),
            version: Version::new(2, 1, 0),
            engine_name: "none".to_string(),
            engine_version: Version::new(0, 3, 0),
            api_version: Version::new(1, 2, 0),
        };
        let descriptor = app.descriptor();
        assert_eq!(descriptor.app_name(), "Demo");
        assert_eq!(descriptor.app_version(), Version::new(2, 1, 0));
        assert_eq!(descriptor.engine_name(), "none");
        assert_eq!(descriptor.api_version(), Version::new(1, 2, 0));
    }

    #[test]
    fn test_validation_rejects_zero_window() {
        let mut config = BootstrapConfig::default();
        config.window.height = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validation_rejects_empty_subscription() {
        let mut config = BootstrapConfig::default();
        config.diagnostics.severities.clear();
        assert!(matches!(config.validate(), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_config_loader_file_not_found() {
        let result = BootstrapConfig::load(Path::new("/nonexistent/path/bootstrap.toml"));
        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_config_loader_parse_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "invalid toml {{{{").unwrap();

        let result = BootstrapConfig::load(file.path());
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_load_or_default_without_path() {
        let config = BootstrapConfig::load_or_default(None).unwrap();
        assert_eq!(config.shared.service_name, DEFAULT_SERVICE_NAME);
    }
}
