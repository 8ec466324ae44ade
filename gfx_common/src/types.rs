//! Data model shared by every bootstrap stage.
//!
//! This module defines:
//! - `Version` - `major.minor.patch` packed with the Vulkan version layout
//! - `ApplicationDescriptor` - immutable application metadata
//! - `CapabilityName` / `ExtensionSet` - negotiated driver names
//! - `Severity`, `Severities`, `MessageTypes`, `ChannelFilter` - diagnostic classification

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error returned when a version string cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid version '{input}': {reason}")]
pub struct VersionError {
    /// Offending input
    pub input: String,
    /// What was wrong with it
    pub reason: &'static str,
}

/// Semantic version in the driver's packed API layout.
///
/// Serialized as a `"major.minor.patch"` string; `"major.minor"` is accepted
/// with an implicit zero patch.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct Version {
    /// Major component (7 bits)
    pub major: u32,
    /// Minor component (10 bits)
    pub minor: u32,
    /// Patch component (12 bits)
    pub patch: u32,
}

impl Version {
    /// Largest encodable major component.
    pub const MAX_MAJOR: u32 = 0x7F;
    /// Largest encodable minor component.
    pub const MAX_MINOR: u32 = 0x3FF;
    /// Largest encodable patch component.
    pub const MAX_PATCH: u32 = 0xFFF;

    /// Create a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Pack as `major << 22 | minor << 12 | patch` (variant 0).
    pub const fn packed(&self) -> u32 {
        ((self.major & Self::MAX_MAJOR) << 22)
            | ((self.minor & Self::MAX_MINOR) << 12)
            | (self.patch & Self::MAX_PATCH)
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = |reason| VersionError {
            input: s.to_string(),
            reason,
        };

        let parts = s
            .trim()
            .split('.')
            .map(|p| p.parse::<u32>().map_err(|_| error("components must be integers")))
            .collect::<Result<Vec<_>, _>>()?;

        let (major, minor, patch) = match parts.as_slice() {
            [major, minor] => (*major, *minor, 0),
            [major, minor, patch] => (*major, *minor, *patch),
            _ => return Err(error("expected major.minor[.patch]")),
        };

        if major > Self::MAX_MAJOR || minor > Self::MAX_MINOR || patch > Self::MAX_PATCH {
            return Err(error("component out of range"));
        }

        Ok(Self::new(major, minor, patch))
    }
}

impl TryFrom<String> for Version {
    type Error = VersionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.to_string()
    }
}

/// Immutable application metadata passed to the driver at instance creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationDescriptor {
    app_name: String,
    app_version: Version,
    engine_name: String,
    engine_version: Version,
    api_version: Version,
}

impl ApplicationDescriptor {
    /// Describe an application with no engine, targeting API 1.0.
    pub fn new(app_name: impl Into<String>, app_version: Version) -> Self {
        Self {
            app_name: app_name.into(),
            app_version,
            engine_name: String::new(),
            engine_version: Version::default(),
            api_version: Version::new(1, 0, 0),
        }
    }

    /// Set the engine name and version.
    pub fn with_engine(mut self, engine_name: impl Into<String>, engine_version: Version) -> Self {
        self.engine_name = engine_name.into();
        self.engine_version = engine_version;
        self
    }

    /// Set the target API version.
    pub fn with_api_version(mut self, api_version: Version) -> Self {
        self.api_version = api_version;
        self
    }

    pub fn app_name(&self) -> &str {
        &self.app_name
    }

    pub fn app_version(&self) -> Version {
        self.app_version
    }

    pub fn engine_name(&self) -> &str {
        &self.engine_name
    }

    pub fn engine_version(&self) -> Version {
        self.engine_version
    }

    pub fn api_version(&self) -> Version {
        self.api_version
    }
}

/// Name of an optional driver capability (an instance layer).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CapabilityName(String);

impl CapabilityName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CapabilityName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CapabilityName {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CapabilityName {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Ordered list of instance extension names.
///
/// Duplicates are tolerated; the driver treats the list as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionSet(Vec<String>);

impl ExtensionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) {
        self.0.push(name.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl<S: Into<String>> FromIterator<S> for ExtensionSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Severity of a driver-reported diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Diagnostic chatter (loader and layer internals).
    Verbose,
    /// Informational, e.g. resource creation details.
    Info,
    /// Likely application bug or suboptimal usage.
    Warning,
    /// Invalid API usage.
    Error,
}

impl Severity {
    /// All severities, lowest first.
    pub const ALL: [Severity; 4] = [
        Severity::Verbose,
        Severity::Info,
        Severity::Warning,
        Severity::Error,
    ];

    /// Flag bit matching this severity.
    pub const fn flag(self) -> Severities {
        match self {
            Severity::Verbose => Severities::VERBOSE,
            Severity::Info => Severities::INFO,
            Severity::Warning => Severities::WARNING,
            Severity::Error => Severities::ERROR,
        }
    }

    /// Upper-case tag used in log output.
    pub const fn label(self) -> &'static str {
        match self {
            Severity::Verbose => "VERBOSE",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Category of a driver-reported diagnostic message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    /// Unrelated to specification or performance.
    General,
    /// Specification violation.
    Validation,
    /// Potentially non-optimal use of the API.
    Performance,
}

impl MessageType {
    /// Flag bit matching this message type.
    pub const fn flag(self) -> MessageTypes {
        match self {
            MessageType::General => MessageTypes::GENERAL,
            MessageType::Validation => MessageTypes::VALIDATION,
            MessageType::Performance => MessageTypes::PERFORMANCE,
        }
    }
}

bitflags! {
    /// Set of severities a diagnostic channel subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Severities: u8 {
        const VERBOSE = 0x01;
        const INFO    = 0x02;
        const WARNING = 0x04;
        const ERROR   = 0x08;
    }
}

bitflags! {
    /// Set of message types a diagnostic channel subscribes to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct MessageTypes: u8 {
        const GENERAL     = 0x01;
        const VALIDATION  = 0x02;
        const PERFORMANCE = 0x04;
    }
}

/// Subscription filter registered with a diagnostic channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelFilter {
    pub severities: Severities,
    pub message_types: MessageTypes,
}

impl ChannelFilter {
    /// Build a filter from explicit severity and message-type lists.
    pub fn from_lists(severities: &[Severity], message_types: &[MessageType]) -> Self {
        Self {
            severities: severities
                .iter()
                .fold(Severities::empty(), |acc, s| acc | s.flag()),
            message_types: message_types
                .iter()
                .fold(MessageTypes::empty(), |acc, t| acc | t.flag()),
        }
    }

    /// Whether a message with this severity and these types is delivered.
    pub fn accepts(&self, severity: Severity, types: MessageTypes) -> bool {
        self.severities.contains(severity.flag()) && self.message_types.intersects(types)
    }
}

impl Default for ChannelFilter {
    fn default() -> Self {
        Self {
            severities: Severities::all(),
            message_types: MessageTypes::all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_packing_matches_driver_layout() {
        assert_eq!(Version::new(1, 0, 0).packed(), 1 << 22);
        assert_eq!(Version::new(1, 3, 250).packed(), (1 << 22) | (3 << 12) | 250);
        assert_eq!(Version::new(0, 0, 1).packed(), 1);
    }

    #[test]
    fn test_version_parse() {
        assert_eq!("1.2.3".parse::<Version>().unwrap(), Version::new(1, 2, 3));
        assert_eq!("1.3".parse::<Version>().unwrap(), Version::new(1, 3, 0));
        assert!("1".parse::<Version>().is_err());
        assert!("1.x.0".parse::<Version>().is_err());
        assert!("128.0.0".parse::<Version>().is_err());
        assert!("1.0.4096".parse::<Version>().is_err());
    }

    #[test]
    fn test_version_serde_as_string() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Wrapper {
            v: Version,
        }

        let parsed: Wrapper = toml::from_str("v = \"1.2.0\"").unwrap();
        assert_eq!(parsed.v, Version::new(1, 2, 0));
        assert!(toml::to_string(&parsed).unwrap().contains("\"1.2.0\""));
        assert!(toml::from_str::<Wrapper>("v = \"nope\"").is_err());
    }

    #[test]
    fn test_application_descriptor_defaults() {
        let app = ApplicationDescriptor::new("Triangle", Version::new(0, 0, 1));
        assert_eq!(app.app_name(), "Triangle");
        assert_eq!(app.engine_name(), "");
        assert_eq!(app.api_version(), Version::new(1, 0, 0));

        let app = app
            .with_engine("none", Version::new(0, 1, 0))
            .with_api_version(Version::new(1, 3, 0));
        assert_eq!(app.engine_name(), "none");
        assert_eq!(app.api_version(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_extension_set_keeps_order() {
        let set: ExtensionSet = ["b", "a", "b"].into_iter().collect();
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b", "a", "b"]);
        assert!(set.contains("a"));
        assert!(!set.contains("c"));
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_channel_filter_default_accepts_everything() {
        let filter = ChannelFilter::default();
        for severity in Severity::ALL {
            assert!(filter.accepts(severity, MessageTypes::GENERAL));
            assert!(filter.accepts(severity, MessageTypes::PERFORMANCE));
        }
    }

    #[test]
    fn test_channel_filter_from_lists() {
        let filter = ChannelFilter::from_lists(
            &[Severity::Warning, Severity::Error],
            &[MessageType::Validation],
        );
        assert!(filter.accepts(Severity::Error, MessageTypes::VALIDATION));
        assert!(filter.accepts(
            Severity::Warning,
            MessageTypes::VALIDATION | MessageTypes::PERFORMANCE
        ));
        assert!(!filter.accepts(Severity::Info, MessageTypes::VALIDATION));
        assert!(!filter.accepts(Severity::Error, MessageTypes::GENERAL));
    }

    #[test]
    fn test_severity_labels() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Verbose.label(), "VERBOSE");
        assert!(Severity::Error > Severity::Warning);
    }
}
