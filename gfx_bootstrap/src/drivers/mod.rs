//! Graphics driver implementations.
//!
//! - [`simulation`] - Emulated host for development and testing
//! - `vulkan` - Native Vulkan loader via `ash` (feature `vulkan`)
//!
//! # Adding New Drivers
//!
//! 1. Create a new submodule under `drivers/`
//! 2. Implement the `Driver` trait from `gfx_common::driver`
//! 3. Register the driver in `register_all_drivers()`

pub mod simulation;
#[cfg(feature = "vulkan")]
pub mod vulkan;

use crate::driver_registry::DriverRegistry;

/// Register all built-in drivers.
pub fn register_all_drivers(registry: &mut DriverRegistry) {
    registry.register("simulation", simulation::create_driver);

    #[cfg(feature = "vulkan")]
    registry.register("vulkan", vulkan::create_driver);
}
