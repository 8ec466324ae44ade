//! Desktop window host.
//!
//! Opens the application window, reports the instance extensions the
//! platform needs to present to it, and runs the event loop until the window
//! is closed or shutdown is requested.

use gfx::config::WindowConfig;
use gfx::error::BootstrapError;
use raw_window_handle::HasDisplayHandle;
use std::ffi::CStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};

/// How often the loop wakes to check the shutdown flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// An open window and its event loop.
pub struct WindowHost {
    event_loop: EventLoop<()>,
    window: Window,
}

impl WindowHost {
    /// Create the event loop and open the window.
    pub fn open(config: &WindowConfig) -> Result<Self, BootstrapError> {
        let event_loop =
            EventLoop::new().map_err(|e| BootstrapError::Window(format!("event loop: {e}")))?;
        let window = WindowBuilder::new()
            .with_title(config.title.as_str())
            .with_inner_size(LogicalSize::new(config.width, config.height))
            .with_resizable(config.resizable)
            .build(&event_loop)
            .map_err(|e| BootstrapError::Window(format!("window creation: {e}")))?;

        info!(
            "Opened window '{}' ({}x{})",
            config.title, config.width, config.height
        );
        Ok(Self { event_loop, window })
    }

    /// Instance extensions required to present to this window.
    pub fn required_extensions(&self) -> Result<Vec<String>, BootstrapError> {
        let display = self
            .window
            .display_handle()
            .map_err(|e| BootstrapError::Window(format!("display handle: {e}")))?;
        let names = ash_window::enumerate_required_extensions(display.as_raw())
            .map_err(|e| BootstrapError::Window(format!("surface extensions: {e}")))?;

        let extensions: Vec<String> = names
            .iter()
            // SAFETY: ash-window returns pointers to static NUL-terminated names.
            .map(|&name| unsafe { CStr::from_ptr(name) }.to_string_lossy().into_owned())
            .collect();
        debug!("Window requires extensions {:?}", extensions);
        Ok(extensions)
    }

    /// Run the event loop until the window closes or `running` is cleared.
    ///
    /// Returns the window so the caller can keep it alive until the graphics
    /// context has been stopped.
    pub fn run(self, running: Arc<AtomicBool>) -> Result<Window, BootstrapError> {
        let Self { event_loop, window } = self;
        let window_id = window.id();

        event_loop
            .run(move |event, target| {
                target.set_control_flow(ControlFlow::wait_duration(POLL_INTERVAL));
                match event {
                    Event::WindowEvent {
                        window_id: id,
                        event: WindowEvent::CloseRequested,
                    } if id == window_id => {
                        info!("Window close requested");
                        running.store(false, Ordering::SeqCst);
                        target.exit();
                    }
                    Event::AboutToWait if !running.load(Ordering::SeqCst) => {
                        target.exit();
                    }
                    _ => {}
                }
            })
            .map_err(|e| BootstrapError::Window(format!("event loop: {e}")))?;

        Ok(window)
    }
}
