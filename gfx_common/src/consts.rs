//! Bootstrap constants.
//!
//! Names negotiated with the driver and the defaults of the reference
//! application.

/// Build-time diagnostics policy.
///
/// On in debug builds, off in release builds unless the `diagnostics`
/// feature is enabled. Not controlled by any runtime flag.
pub const DIAGNOSTICS_ENABLED: bool = cfg!(any(debug_assertions, feature = "diagnostics"));

/// Validation layer requested when diagnostics are on.
pub const VALIDATION_LAYER: &str = "VK_LAYER_KHRONOS_validation";

/// Instance extension required for the diagnostic channel.
pub const DEBUG_UTILS_EXTENSION: &str = "VK_EXT_debug_utils";

/// Payload reported when the driver delivers a message without text.
pub const NO_MESSAGE: &str = "<no message>";

/// Default service name used in log output.
pub const DEFAULT_SERVICE_NAME: &str = "gfx-bootstrap";

/// Default application name.
pub const DEFAULT_APP_NAME: &str = "Triangle";

/// Default window title.
pub const DEFAULT_WINDOW_TITLE: &str = "Vulkan";

/// Default window width in logical pixels
pub const DEFAULT_WINDOW_WIDTH: u32 = 800;

/// Default window height in logical pixels
pub const DEFAULT_WINDOW_HEIGHT: u32 = 600;
