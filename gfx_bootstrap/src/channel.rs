//! Diagnostic channel.
//!
//! A channel is a live callback registration against a `DriverInstance`.
//! The instance owns it; the only way to create one is `attach()`, and the
//! only way to destroy one is the instance's own teardown.

use crate::builder::DriverInstance;
use gfx::driver::{ChannelHandle, ChannelRequest, DiagnosticSink};
use gfx::error::BootstrapError;
use gfx::types::{ChannelFilter, Severity};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Live diagnostic callback registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticChannel {
    handle: ChannelHandle,
    filter: ChannelFilter,
}

impl DiagnosticChannel {
    pub(crate) fn new(handle: ChannelHandle, filter: ChannelFilter) -> Self {
        Self { handle, filter }
    }

    /// Register `sink` with the driver and attach the channel to `instance`.
    ///
    /// The instance keeps the channel; the returned value describes it.
    ///
    /// # Errors
    /// Returns `ChannelCreationFailed` if the driver refuses the
    /// registration. `instance` is left unchanged in that case.
    pub fn attach(
        instance: &mut DriverInstance,
        sink: Arc<dyn DiagnosticSink>,
        filter: ChannelFilter,
    ) -> Result<DiagnosticChannel, BootstrapError> {
        debug!(
            "Attaching diagnostic channel (severities={:?}, types={:?})",
            filter.severities, filter.message_types
        );
        instance
            .adopt_channel(ChannelRequest { filter, sink })
            .map_err(BootstrapError::ChannelCreationFailed)
    }

    /// Native channel handle.
    pub fn handle(&self) -> ChannelHandle {
        self.handle
    }

    /// Messages the driver delivers through this channel.
    pub fn filter(&self) -> ChannelFilter {
        self.filter
    }
}

/// Sink forwarding driver messages to `tracing`.
///
/// verbose → TRACE, info → INFO, warning → WARN, error → ERROR, each tagged
/// with its severity under the `gfx::driver` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&self, severity: Severity, message: &str) {
        match severity {
            Severity::Verbose => trace!(target: "gfx::driver", severity = %severity, "{message}"),
            Severity::Info => info!(target: "gfx::driver", severity = %severity, "{message}"),
            Severity::Warning => warn!(target: "gfx::driver", severity = %severity, "{message}"),
            Severity::Error => error!(target: "gfx::driver", severity = %severity, "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::InstanceBuilder;
    use crate::drivers::simulation::{DriverCall, ERROR_EXTENSION_NOT_PRESENT, SimulationDriver};
    use crate::resolver::ExtensionResolver;
    use gfx::driver::DriverError;
    use gfx::types::{ApplicationDescriptor, MessageTypes, Severities, Version};
    use parking_lot::Mutex;

    fn instance(host: &SimulationDriver, diagnostics: bool) -> DriverInstance {
        InstanceBuilder::new(Box::new(host.clone()), ExtensionResolver::new(["ext.surface"]))
            .build(
                &ApplicationDescriptor::new("test", Version::new(0, 1, 0)),
                diagnostics,
            )
            .unwrap()
    }

    fn recording() -> (Arc<Mutex<Vec<(Severity, String)>>>, Arc<dyn DiagnosticSink>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let sink: Arc<dyn DiagnosticSink> = Arc::new(move |severity: Severity, message: &str| {
            captured.lock().push((severity, message.to_string()));
        });
        (seen, sink)
    }

    #[test]
    fn attach_registers_and_delivers() {
        let host = SimulationDriver::new();
        let mut instance = instance(&host, true);
        let (seen, sink) = recording();

        let attached =
            DiagnosticChannel::attach(&mut instance, sink, ChannelFilter::default()).unwrap();
        assert_eq!(instance.channels(), [attached.clone()]);
        assert_eq!(attached.filter(), ChannelFilter::default());

        host.emit(Severity::Error, MessageTypes::VALIDATION, "bad usage");
        assert_eq!(*seen.lock(), vec![(Severity::Error, "bad usage".to_string())]);
    }

    #[test]
    fn attach_without_debug_utils_fails() {
        let host = SimulationDriver::new();
        let mut instance = instance(&host, false);
        let (_seen, sink) = recording();

        let result = DiagnosticChannel::attach(&mut instance, sink, ChannelFilter::default());
        match result {
            Err(BootstrapError::ChannelCreationFailed(err)) => {
                assert_eq!(err.code, Some(ERROR_EXTENSION_NOT_PRESENT));
            }
            other => panic!("expected ChannelCreationFailed, got {other:?}"),
        }
        assert!(instance.channels().is_empty());
    }

    #[test]
    fn driver_refusal_maps_to_channel_error() {
        let host =
            SimulationDriver::new().failing_channel_creation(DriverError::new("no callbacks"));
        let mut instance = instance(&host, true);
        let (_seen, sink) = recording();

        let err = DiagnosticChannel::attach(&mut instance, sink, ChannelFilter::default())
            .unwrap_err();
        assert_eq!(err.stage(), "channel-attach");
        assert_eq!(host.live_channels(), 0);
    }

    #[test]
    fn filtered_messages_never_reach_sink() {
        let host = SimulationDriver::new();
        let mut instance = instance(&host, true);
        let (seen, sink) = recording();
        let filter = ChannelFilter {
            severities: Severities::WARNING | Severities::ERROR,
            message_types: MessageTypes::all(),
        };
        DiagnosticChannel::attach(&mut instance, sink, filter).unwrap();

        host.emit(Severity::Verbose, MessageTypes::GENERAL, "chatter");
        host.emit(Severity::Info, MessageTypes::GENERAL, "info");
        host.emit(Severity::Warning, MessageTypes::PERFORMANCE, "slow");
        assert_eq!(*seen.lock(), vec![(Severity::Warning, "slow".to_string())]);
    }

    #[test]
    fn instance_teardown_destroys_channels_first() {
        let host = SimulationDriver::new();
        let mut instance = instance(&host, true);
        let (_seen, first) = recording();
        let (_seen2, second) = recording();
        let a = DiagnosticChannel::attach(&mut instance, first, ChannelFilter::default())
            .unwrap()
            .handle();
        let b = DiagnosticChannel::attach(&mut instance, second, ChannelFilter::default())
            .unwrap()
            .handle();
        let handle = instance.handle();

        instance.destroy();

        let destroys: Vec<_> = host
            .calls()
            .into_iter()
            .filter(DriverCall::is_destroy)
            .collect();
        assert_eq!(
            destroys,
            vec![
                DriverCall::DestroyChannel(b),
                DriverCall::DestroyChannel(a),
                DriverCall::DestroyInstance(handle),
            ]
        );
    }

    #[test]
    fn tracing_sink_accepts_every_severity() {
        let sink = TracingSink;
        for severity in Severity::ALL {
            sink.report(severity, "message");
        }
    }
}
