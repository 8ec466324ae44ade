//! Lifecycle manager.
//!
//! Composes the bootstrap stages into a `GraphicsContext` and owns it while
//! the external event loop runs.
//!
//! # State machine
//!
//! ```text
//! Uninitialized ──start()──► Running ──stop()──► Terminated
//!       │                                            ▲
//!       └────────────start() fails───────────────────┘
//! ```
//!
//! Any other transition (`stop()` before `start()`, a second `stop()`,
//! a second `start()`) fails with `InvalidTransition` and makes no driver
//! call.

use crate::builder::{DriverInstance, InstanceBuilder};
use crate::channel::{DiagnosticChannel, TracingSink};
use crate::resolver::ExtensionResolver;
use gfx::config::DiagnosticsConfig;
use gfx::consts::VALIDATION_LAYER;
use gfx::driver::{DiagnosticSink, Driver};
use gfx::error::{BootstrapError, LifecycleStage};
use gfx::types::{ApplicationDescriptor, CapabilityName, ChannelFilter};
use std::sync::Arc;
use tracing::{error, info, warn};

/// The driver instance and its optional diagnostic channel.
pub struct GraphicsContext {
    instance: DriverInstance,
}

impl GraphicsContext {
    /// The live driver instance.
    pub fn instance(&self) -> &DriverInstance {
        &self.instance
    }

    /// The diagnostic channel; present only when diagnostics are enabled.
    pub fn channel(&self) -> Option<&DiagnosticChannel> {
        self.instance.channels().first()
    }

    fn teardown(self) {
        self.instance.destroy();
    }
}

/// Owns the `GraphicsContext` between `start()` and `stop()`.
pub struct LifecycleManager {
    diagnostics_enabled: bool,
    capabilities: Vec<CapabilityName>,
    filter: ChannelFilter,
    sink: Arc<dyn DiagnosticSink>,
    stage: LifecycleStage,
    /// Present exactly while `Running`.
    context: Option<GraphicsContext>,
}

impl LifecycleManager {
    /// Manager reporting driver messages to `tracing`.
    ///
    /// `diagnostics_enabled` is normally `gfx_common::consts::DIAGNOSTICS_ENABLED`.
    pub fn new(diagnostics_enabled: bool) -> Self {
        Self {
            diagnostics_enabled,
            capabilities: vec![CapabilityName::new(VALIDATION_LAYER)],
            filter: ChannelFilter::default(),
            sink: Arc::new(TracingSink),
            stage: LifecycleStage::Uninitialized,
            context: None,
        }
    }

    /// Manager requesting the configured layers and subscription.
    pub fn from_config(config: &DiagnosticsConfig, diagnostics_enabled: bool) -> Self {
        Self::new(diagnostics_enabled)
            .with_capabilities(config.layers.clone())
            .with_filter(config.filter())
    }

    /// Replace the observability sink.
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Replace the capabilities requested when diagnostics are on.
    pub fn with_capabilities(mut self, capabilities: Vec<CapabilityName>) -> Self {
        self.capabilities = capabilities;
        self
    }

    /// Replace the diagnostic channel filter.
    pub fn with_filter(mut self, filter: ChannelFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Current lifecycle stage.
    pub fn stage(&self) -> LifecycleStage {
        self.stage
    }

    /// The running context, if any.
    pub fn context(&self) -> Option<&GraphicsContext> {
        self.context.as_ref()
    }

    /// Build the instance and, with diagnostics on, attach the channel.
    ///
    /// On failure whatever was already created is destroyed and the manager
    /// moves to `Terminated`.
    ///
    /// # Errors
    /// - `InvalidTransition` unless `Uninitialized`
    /// - `CapabilityUnavailable`, `DriverCreationFailed`, `ChannelCreationFailed`
    pub fn start(
        &mut self,
        driver: Box<dyn Driver>,
        resolver: ExtensionResolver,
        app: &ApplicationDescriptor,
    ) -> Result<&GraphicsContext, BootstrapError> {
        if self.stage != LifecycleStage::Uninitialized {
            return Err(self.invalid("start"));
        }

        info!(
            "Starting graphics context for '{}' (diagnostics {})",
            app.app_name(),
            if self.diagnostics_enabled { "on" } else { "off" }
        );

        let context = match self.compose(driver, resolver, app) {
            Ok(context) => context,
            Err(e) => {
                error!("Graphics context start failed at {}: {}", e.stage(), e);
                self.stage = LifecycleStage::Terminated;
                return Err(e);
            }
        };

        info!(
            "Graphics context running on {} instance {}",
            context.instance().driver_name(),
            context.instance().handle()
        );
        self.stage = LifecycleStage::Running;
        Ok(self.context.insert(context))
    }

    /// Destroy the channel (if any), then the instance.
    ///
    /// # Errors
    /// Returns `InvalidTransition` unless `Running`; nothing is destroyed.
    pub fn stop(&mut self) -> Result<(), BootstrapError> {
        let Some(context) = self.context.take() else {
            return Err(self.invalid("stop"));
        };

        info!("Stopping graphics context");
        context.teardown();
        self.stage = LifecycleStage::Terminated;
        info!("Graphics context terminated");
        Ok(())
    }

    fn compose(
        &self,
        driver: Box<dyn Driver>,
        resolver: ExtensionResolver,
        app: &ApplicationDescriptor,
    ) -> Result<GraphicsContext, BootstrapError> {
        let mut instance = InstanceBuilder::new(driver, resolver)
            .with_capabilities(self.capabilities.clone())
            .build(app, self.diagnostics_enabled)?;

        if self.diagnostics_enabled {
            if let Err(e) =
                DiagnosticChannel::attach(&mut instance, Arc::clone(&self.sink), self.filter)
            {
                warn!("Diagnostic channel refused; destroying instance {}", instance.handle());
                instance.destroy();
                return Err(e);
            }
        }

        Ok(GraphicsContext { instance })
    }

    fn invalid(&self, operation: &'static str) -> BootstrapError {
        let state = self.stage();
        error!("Invalid lifecycle transition: {} while {}", operation, state);
        BootstrapError::InvalidTransition { operation, state }
    }
}

impl Drop for LifecycleManager {
    fn drop(&mut self) {
        if self.context.is_some() {
            warn!("Lifecycle manager dropped while running; stopping");
            let _ = self.stop();
        }
    }
}
