//! Extension resolution.
//!
//! Merges the surface extensions mandated by the windowing toolkit with the
//! diagnostics extension.

use gfx::consts::DEBUG_UTILS_EXTENSION;
use gfx::types::ExtensionSet;

/// Derives the instance extension list.
#[derive(Debug, Clone, Default)]
pub struct ExtensionResolver {
    /// Extensions the window system needs to present to a surface
    window_extensions: Vec<String>,
}

impl ExtensionResolver {
    /// Create a resolver over the windowing toolkit's mandatory extensions.
    pub fn new<I, S>(window_extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            window_extensions: window_extensions.into_iter().map(Into::into).collect(),
        }
    }

    /// Extensions supplied by the windowing toolkit.
    pub fn window_extensions(&self) -> &[String] {
        &self.window_extensions
    }

    /// Window extensions, followed by the diagnostics extension when enabled.
    pub fn resolve(&self, diagnostics_enabled: bool) -> ExtensionSet {
        let mut extensions: ExtensionSet = self.window_extensions.iter().cloned().collect();
        if diagnostics_enabled {
            extensions.push(DEBUG_UTILS_EXTENSION);
        }
        extensions
    }
}
