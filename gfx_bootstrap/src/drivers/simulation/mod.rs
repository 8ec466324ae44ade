//! Simulation driver module.
//!
//! This module provides a software simulation driver for development and
//! testing without a GPU or a Vulkan loader.

mod driver;
mod state;

pub use driver::SimulationDriver;
pub use state::{
    DriverCall, ERROR_EXTENSION_NOT_PRESENT, ERROR_INITIALIZATION_FAILED, ERROR_LAYER_NOT_PRESENT,
};

use gfx::driver::Driver;

/// Factory function to create a simulation driver instance.
pub fn create_driver() -> Box<dyn Driver> {
    Box::new(SimulationDriver::new())
}
