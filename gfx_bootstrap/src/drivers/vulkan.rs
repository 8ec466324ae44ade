//! Native Vulkan driver.
//!
//! Loads the system Vulkan loader through `ash`, creates the instance and
//! registers `VK_EXT_debug_utils` messengers whose callback forwards to a
//! `DiagnosticSink`.

use gfx::config::BootstrapConfig;
use gfx::consts::{DEBUG_UTILS_EXTENSION, NO_MESSAGE};
use gfx::driver::{
    ChannelHandle, ChannelRequest, DiagnosticSink, Driver, DriverError, InstanceHandle,
    InstanceRequest,
};
use gfx::types::{CapabilityName, ChannelFilter, MessageTypes, Severities, Severity};

use ash::ext::debug_utils;
use ash::vk::{self, Handle};
use std::ffi::{CStr, CString, c_char, c_void};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// State handed to the driver as the messenger's user data.
///
/// Boxed so its address stays fixed while the messenger is live.
struct CallbackData {
    sink: Arc<dyn DiagnosticSink>,
    filter: ChannelFilter,
}

struct Messenger {
    raw: vk::DebugUtilsMessengerEXT,
    /// Must outlive `raw`; dropped only after the messenger is destroyed.
    _data: Box<CallbackData>,
}

/// Vulkan driver implementing the Driver trait.
pub struct VulkanDriver {
    entry: Option<ash::Entry>,
    instance: Option<ash::Instance>,
    debug_utils: Option<debug_utils::Instance>,
    messengers: Vec<Messenger>,
}

impl VulkanDriver {
    /// Create an unloaded driver; `init()` opens the loader.
    pub fn new() -> Self {
        Self {
            entry: None,
            instance: None,
            debug_utils: None,
            messengers: Vec::new(),
        }
    }

    fn entry(&self) -> Result<&ash::Entry, DriverError> {
        self.entry
            .as_ref()
            .ok_or_else(|| DriverError::new("Vulkan loader not initialized"))
    }

    fn live_instance(&self, handle: InstanceHandle) -> Result<&ash::Instance, DriverError> {
        match &self.instance {
            Some(instance) if instance.handle().as_raw() == handle.raw() => Ok(instance),
            _ => Err(DriverError::with_code(
                vk::Result::ERROR_INITIALIZATION_FAILED.as_raw(),
                format!("unknown instance {handle}"),
            )),
        }
    }
}

impl Default for VulkanDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl Driver for VulkanDriver {
    fn name(&self) -> &'static str {
        "vulkan"
    }

    fn version(&self) -> &'static str {
        env!("CARGO_PKG_VERSION")
    }

    fn init(&mut self, _config: &BootstrapConfig) -> Result<(), DriverError> {
        // SAFETY: loading the system loader runs its initialization code;
        // nothing else in this process touches it concurrently.
        let entry = unsafe { ash::Entry::load() }
            .map_err(|e| DriverError::new(format!("failed to load Vulkan loader: {e}")))?;

        // SAFETY: entry was loaded above.
        match unsafe { entry.try_enumerate_instance_version() } {
            Ok(Some(version)) => info!(
                "Vulkan loader supports API {}.{}.{}",
                vk::api_version_major(version),
                vk::api_version_minor(version),
                vk::api_version_patch(version)
            ),
            Ok(None) => info!("Vulkan loader supports API 1.0"),
            Err(e) => warn!("Failed to query loader API version: {}", e),
        }

        self.entry = Some(entry);
        Ok(())
    }

    fn enumerate_capabilities(&self) -> Result<Vec<CapabilityName>, DriverError> {
        let entry = self.entry()?;

        // SAFETY: entry is loaded; the call has no other preconditions.
        let layers = unsafe { entry.enumerate_instance_layer_properties() }
            .map_err(|r| vk_error("vkEnumerateInstanceLayerProperties", r))?;

        Ok(layers
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok())
            .map(|name| CapabilityName::new(name.to_string_lossy()))
            .collect())
    }

    fn create_instance(&mut self, request: &InstanceRequest) -> Result<InstanceHandle, DriverError> {
        if self.instance.is_some() {
            return Err(DriverError::with_code(
                vk::Result::ERROR_INITIALIZATION_FAILED.as_raw(),
                "an instance already exists",
            ));
        }
        let entry = self.entry()?;

        let app = &request.application;
        let app_name = c_string(app.app_name())?;
        let engine_name = c_string(app.engine_name())?;
        let layer_names = request
            .capabilities
            .iter()
            .map(|c| c_string(c.as_str()))
            .collect::<Result<Vec<_>, _>>()?;
        let extension_names = request
            .extensions
            .iter()
            .map(c_string)
            .collect::<Result<Vec<_>, _>>()?;
        let layer_ptrs: Vec<*const c_char> = layer_names.iter().map(|n| n.as_ptr()).collect();
        let extension_ptrs: Vec<*const c_char> =
            extension_names.iter().map(|n| n.as_ptr()).collect();

        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(app.app_version().packed())
            .engine_name(&engine_name)
            .engine_version(app.engine_version().packed())
            .api_version(app.api_version().packed());

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_ptrs)
            .enabled_extension_names(&extension_ptrs);

        // SAFETY: every pointer in create_info borrows a CString that lives
        // until the end of this function.
        let instance = unsafe { entry.create_instance(&create_info, None) }
            .map_err(|r| vk_error("vkCreateInstance", r))?;

        let handle = InstanceHandle::from_raw(instance.handle().as_raw());
        let utils = request
            .extensions
            .contains(DEBUG_UTILS_EXTENSION)
            .then(|| debug_utils::Instance::new(entry, &instance));
        self.debug_utils = utils;
        self.instance = Some(instance);

        debug!(
            "vkCreateInstance succeeded: {} layers, {} extensions",
            layer_ptrs.len(),
            extension_ptrs.len()
        );
        Ok(handle)
    }

    fn create_channel(
        &mut self,
        instance: InstanceHandle,
        request: &ChannelRequest,
    ) -> Result<ChannelHandle, DriverError> {
        self.live_instance(instance)?;
        let utils = self.debug_utils.as_ref().ok_or_else(|| {
            DriverError::with_code(
                vk::Result::ERROR_EXTENSION_NOT_PRESENT.as_raw(),
                format!("{DEBUG_UTILS_EXTENSION} not enabled on instance {instance}"),
            )
        })?;

        let data = Box::new(CallbackData {
            sink: Arc::clone(&request.sink),
            filter: request.filter,
        });
        let create_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(severity_flags(request.filter.severities))
            .message_type(type_flags(request.filter.message_types))
            .pfn_user_callback(Some(debug_callback))
            .user_data(&*data as *const CallbackData as *mut c_void);

        // SAFETY: user_data points into `data`, which is stored alongside the
        // messenger and dropped only after it is destroyed.
        let raw = unsafe { utils.create_debug_utils_messenger(&create_info, None) }
            .map_err(|r| vk_error("vkCreateDebugUtilsMessengerEXT", r))?;

        self.messengers.push(Messenger { raw, _data: data });
        Ok(ChannelHandle::from_raw(raw.as_raw()))
    }

    fn destroy_channel(&mut self, instance: InstanceHandle, channel: ChannelHandle) {
        let Some(idx) = self
            .messengers
            .iter()
            .position(|m| m.raw.as_raw() == channel.raw())
        else {
            warn!("Destroying unknown messenger {} on {}", channel, instance);
            return;
        };
        let messenger = self.messengers.remove(idx);

        if let Some(utils) = &self.debug_utils {
            // SAFETY: the messenger was created from this loader and is
            // destroyed exactly once.
            unsafe { utils.destroy_debug_utils_messenger(messenger.raw, None) };
        }
    }

    fn destroy_instance(&mut self, instance: InstanceHandle) {
        if self.live_instance(instance).is_err() {
            warn!("Destroying unknown instance {}", instance);
            return;
        }
        if !self.messengers.is_empty() {
            warn!(
                "Instance {} still has {} messengers; destroying them first",
                instance,
                self.messengers.len()
            );
            while let Some(messenger) = self.messengers.last() {
                let channel = ChannelHandle::from_raw(messenger.raw.as_raw());
                self.destroy_channel(instance, channel);
            }
        }

        self.debug_utils = None;
        if let Some(live) = self.instance.take() {
            // SAFETY: no child object of the instance remains.
            unsafe { live.destroy_instance(None) };
        }
    }
}

/// Factory function to create a Vulkan driver instance.
pub fn create_driver() -> Box<dyn Driver> {
    Box::new(VulkanDriver::new())
}

/// Messenger callback. Never unwinds into the driver and always returns
/// `VK_FALSE` so the triggering call is not aborted.
unsafe extern "system" fn debug_callback(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    types: vk::DebugUtilsMessageTypeFlagsEXT,
    callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    user_data: *mut c_void,
) -> vk::Bool32 {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if user_data.is_null() {
            return;
        }
        // SAFETY: user_data is the CallbackData registered with this
        // messenger, alive until the messenger is destroyed.
        let data = unsafe { &*(user_data as *const CallbackData) };
        let Some(severity) = severity_from_vk(severity) else {
            return;
        };
        if !data.filter.accepts(severity, types_from_vk(types)) {
            return;
        }
        // SAFETY: the driver passes a valid (or null) callback data pointer.
        let message = unsafe { message_text(callback_data) };
        data.sink.report(severity, &message);
    }));
    vk::FALSE
}

unsafe fn message_text(data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>) -> String {
    if data.is_null() {
        return NO_MESSAGE.to_string();
    }
    // SAFETY: non-null and valid for the duration of the callback.
    let p_message = unsafe { (*data).p_message };
    if p_message.is_null() {
        return NO_MESSAGE.to_string();
    }
    // SAFETY: the driver guarantees a NUL-terminated string.
    unsafe { CStr::from_ptr(p_message) }
        .to_string_lossy()
        .into_owned()
}

fn severity_from_vk(flags: vk::DebugUtilsMessageSeverityFlagsEXT) -> Option<Severity> {
    if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        Some(Severity::Error)
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        Some(Severity::Warning)
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        Some(Severity::Info)
    } else if flags.contains(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE) {
        Some(Severity::Verbose)
    } else {
        None
    }
}

fn types_from_vk(flags: vk::DebugUtilsMessageTypeFlagsEXT) -> MessageTypes {
    let mut types = MessageTypes::empty();
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::GENERAL) {
        types |= MessageTypes::GENERAL;
    }
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        types |= MessageTypes::VALIDATION;
    }
    if flags.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        types |= MessageTypes::PERFORMANCE;
    }
    types
}

fn severity_flags(severities: Severities) -> vk::DebugUtilsMessageSeverityFlagsEXT {
    let mut flags = vk::DebugUtilsMessageSeverityFlagsEXT::empty();
    for (bit, vk_bit) in [
        (Severities::VERBOSE, vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
        (Severities::INFO, vk::DebugUtilsMessageSeverityFlagsEXT::INFO),
        (Severities::WARNING, vk::DebugUtilsMessageSeverityFlagsEXT::WARNING),
        (Severities::ERROR, vk::DebugUtilsMessageSeverityFlagsEXT::ERROR),
    ] {
        if severities.contains(bit) {
            flags |= vk_bit;
        }
    }
    flags
}

fn type_flags(types: MessageTypes) -> vk::DebugUtilsMessageTypeFlagsEXT {
    let mut flags = vk::DebugUtilsMessageTypeFlagsEXT::empty();
    for (bit, vk_bit) in [
        (MessageTypes::GENERAL, vk::DebugUtilsMessageTypeFlagsEXT::GENERAL),
        (MessageTypes::VALIDATION, vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION),
        (MessageTypes::PERFORMANCE, vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE),
    ] {
        if types.contains(bit) {
            flags |= vk_bit;
        }
    }
    flags
}

fn c_string(value: &str) -> Result<CString, DriverError> {
    CString::new(value).map_err(|_| DriverError::new(format!("name contains NUL: {value:?}")))
}

fn vk_error(call: &str, result: vk::Result) -> DriverError {
    DriverError::with_code(result.as_raw(), format!("{call} returned {result}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    fn recording() -> (Arc<Mutex<Vec<(Severity, String)>>>, Box<CallbackData>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&seen);
        let data = Box::new(CallbackData {
            sink: Arc::new(move |severity: Severity, message: &str| {
                captured.lock().push((severity, message.to_string()));
            }),
            filter: ChannelFilter::default(),
        });
        (seen, data)
    }

    #[test]
    fn callback_forwards_and_returns_false() {
        let (seen, data) = recording();
        let text = CString::new("vkCreateBuffer: size is zero").unwrap();
        let callback_data = vk::DebugUtilsMessengerCallbackDataEXT {
            p_message: text.as_ptr(),
            ..Default::default()
        };

        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                &callback_data,
                &*data as *const CallbackData as *mut c_void,
            )
        };

        assert_eq!(result, vk::FALSE);
        assert_eq!(
            *seen.lock(),
            vec![(Severity::Warning, "vkCreateBuffer: size is zero".to_string())]
        );
    }

    #[test]
    fn callback_tolerates_null_payload() {
        let (seen, data) = recording();
        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::INFO,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                std::ptr::null(),
                &*data as *const CallbackData as *mut c_void,
            )
        };

        assert_eq!(result, vk::FALSE);
        assert_eq!(*seen.lock(), vec![(Severity::Info, NO_MESSAGE.to_string())]);
    }

    #[test]
    fn callback_survives_panicking_sink() {
        let data = Box::new(CallbackData {
            sink: Arc::new(|_: Severity, _: &str| panic!("sink failure")),
            filter: ChannelFilter::default(),
        });
        let result = unsafe {
            debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR,
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL,
                std::ptr::null(),
                &*data as *const CallbackData as *mut c_void,
            )
        };
        assert_eq!(result, vk::FALSE);
    }

    #[test]
    fn severity_mapping_prefers_highest_bit() {
        assert_eq!(
            severity_from_vk(
                vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                    | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
            ),
            Some(Severity::Error)
        );
        assert_eq!(
            severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE),
            Some(Severity::Verbose)
        );
        assert_eq!(
            severity_from_vk(vk::DebugUtilsMessageSeverityFlagsEXT::empty()),
            None
        );
    }

    #[test]
    fn default_filter_subscribes_to_everything() {
        let filter = ChannelFilter::default();
        assert_eq!(
            severity_flags(filter.severities),
            vk::DebugUtilsMessageSeverityFlagsEXT::VERBOSE
                | vk::DebugUtilsMessageSeverityFlagsEXT::INFO
                | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING
                | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
        );
        assert_eq!(
            type_flags(filter.message_types),
            vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE
        );
        assert_eq!(types_from_vk(type_flags(MessageTypes::all())), MessageTypes::all());
    }

    #[test]
    fn uninitialized_driver_reports_error() {
        let driver = VulkanDriver::new();
        assert!(driver.enumerate_capabilities().is_err());
    }
}
