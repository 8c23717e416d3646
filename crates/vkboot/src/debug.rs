//! Debug messenger plumbing.

use ash::vk;
use std::ffi::c_void;

/// Target used by [`default_debug_callback`] for forwarded messages.
pub const DEBUG_MESSENGER_TARGET: &str = "vkboot::debug_messenger";

/// Severities reported when none are configured.
pub const DEFAULT_SEVERITY: vk::DebugUtilsMessageSeverityFlagsEXT =
    vk::DebugUtilsMessageSeverityFlagsEXT::from_raw(
        vk::DebugUtilsMessageSeverityFlagsEXT::WARNING.as_raw()
            | vk::DebugUtilsMessageSeverityFlagsEXT::ERROR.as_raw(),
    );

/// Message types reported when none are configured.
pub const DEFAULT_MESSAGE_TYPE: vk::DebugUtilsMessageTypeFlagsEXT =
    vk::DebugUtilsMessageTypeFlagsEXT::from_raw(
        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION.as_raw()
            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE.as_raw(),
    );

/// Forwards validation and driver messages to `tracing`.
///
/// # Safety
/// Only meant to be called by the Vulkan loader.
pub unsafe extern "system" fn default_debug_callback(
    message_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    p_callback_data: *const vk::DebugUtilsMessengerCallbackDataEXT<'_>,
    _p_user_data: *mut c_void,
) -> vk::Bool32 {
    // SAFETY: the loader passes either null or valid callback data.
    let message = unsafe { p_callback_data.as_ref().and_then(|data| data.message_as_c_str()) }
        .map(|message| message.to_string_lossy())
        .unwrap_or_default();

    let kind = message_type_name(message_type);

    if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR) {
        tracing::error!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", kind, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING) {
        tracing::warn!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", kind, message);
    } else if message_severity.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO) {
        tracing::info!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", kind, message);
    } else {
        tracing::trace!(target: DEBUG_MESSENGER_TARGET, "[{}] {}", kind, message);
    }

    vk::FALSE
}

fn message_type_name(message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> &'static str {
    if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION) {
        "VALIDATION"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE) {
        "PERFORMANCE"
    } else if message_type.contains(vk::DebugUtilsMessageTypeFlagsEXT::DEVICE_ADDRESS_BINDING) {
        "DEVICE_ADDRESS_BINDING"
    } else {
        "GENERAL"
    }
}

pub(crate) fn messenger_create_info(
    severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    user_data: *mut c_void,
) -> vk::DebugUtilsMessengerCreateInfoEXT<'static> {
    vk::DebugUtilsMessengerCreateInfoEXT::default()
        .message_severity(severity)
        .message_type(message_type)
        .pfn_user_callback(callback.or(Some(default_debug_callback)))
        .user_data(user_data)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_warnings_and_errors() {
        assert!(DEFAULT_SEVERITY.contains(vk::DebugUtilsMessageSeverityFlagsEXT::WARNING));
        assert!(DEFAULT_SEVERITY.contains(vk::DebugUtilsMessageSeverityFlagsEXT::ERROR));
        assert!(!DEFAULT_SEVERITY.contains(vk::DebugUtilsMessageSeverityFlagsEXT::INFO));
        assert!(DEFAULT_MESSAGE_TYPE.contains(vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE));
    }

    #[test]
    fn create_info_falls_back_to_default_callback() {
        let info = messenger_create_info(
            DEFAULT_SEVERITY,
            DEFAULT_MESSAGE_TYPE,
            None,
            std::ptr::null_mut(),
        );
        assert!(info.pfn_user_callback.is_some());
        assert_eq!(info.message_severity, DEFAULT_SEVERITY);
    }

    #[test]
    fn callback_tolerates_null_data() {
        let result = unsafe {
            default_debug_callback(
                vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION,
                std::ptr::null(),
                std::ptr::null_mut(),
            )
        };
        assert_eq!(result, vk::FALSE);
    }
}
