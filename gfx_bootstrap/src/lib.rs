//! # Graphics Bootstrap Library
//!
//! Brings up a graphics driver instance with an optional diagnostic channel,
//! and tears both down in reverse order.
//!
//! Drivers implement the `Driver` trait defined in `gfx_common::driver`.
//!
//! # Module Structure
//!
//! - [`catalog`] - Installed capability queries
//! - [`resolver`] - Instance extension negotiation
//! - [`builder`] - Instance creation and the owned `DriverInstance`
//! - [`channel`] - Diagnostic channel and the tracing sink
//! - [`lifecycle`] - Start/stop state machine
//! - [`driver_registry`] - Driver factory registration
//! - [`drivers`] - Driver implementations
//! - `window` - Desktop window host (feature `vulkan`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        LifecycleManager                          │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────────┐  │
//! │  │  Capability  │──►│ InstanceBuilder  │◄──│ ExtensionResolver│  │
//! │  │  Catalog     │   └────────┬─────────┘   └──────────────────┘  │
//! │  └──────────────┘            │ owns                              │
//! │                              ▼                                   │
//! │                   ┌────────────────────┐   ┌──────────────────┐  │
//! │                   │  DriverInstance    │──►│ DiagnosticChannel│  │
//! │                   └────────┬───────────┘   └──────────────────┘  │
//! │                            ▼                                     │
//! │                   ┌────────────────┐                             │
//! │                   │  Driver        │ (trait object)              │
//! │                   └────────────────┘                             │
//! └──────────────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod catalog;
pub mod channel;
pub mod driver_registry;
pub mod drivers;
pub mod lifecycle;
pub mod resolver;
#[cfg(feature = "vulkan")]
pub mod window;

pub use crate::builder::{DriverInstance, InstanceBuilder};
pub use crate::catalog::CapabilityCatalog;
pub use crate::channel::{DiagnosticChannel, TracingSink};
pub use crate::driver_registry::DriverRegistry;
pub use crate::lifecycle::{GraphicsContext, LifecycleManager};
pub use crate::resolver::ExtensionResolver;
