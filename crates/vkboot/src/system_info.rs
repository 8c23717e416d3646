//! Global capability snapshot of the Vulkan loader.

use crate::error::{InstanceError, Result};
use crate::version::ApiVersion;
use ash::vk;
use std::ffi::{CStr, CString};

/// Name of the Khronos validation layer.
pub const VALIDATION_LAYER_NAME: &CStr = c"VK_LAYER_KHRONOS_validation";

/// What the loader supports before any instance exists.
#[derive(Debug, Clone)]
pub struct SystemInfo {
    available_layers: Vec<CString>,
    available_extensions: Vec<CString>,
    validation_layers_available: bool,
    debug_utils_available: bool,
    /// `None` when the loader failed to report its version.
    instance_api_version: Option<ApiVersion>,
}

impl SystemInfo {
    /// Load the Vulkan loader and snapshot it.
    pub fn query() -> Result<Self> {
        // SAFETY: the entry is only used for global queries and dropped afterwards.
        let entry = unsafe { ash::Entry::load() }.map_err(InstanceError::VulkanUnavailable)?;
        Ok(Self::from_entry(&entry))
    }

    /// Snapshot an already loaded loader.
    ///
    /// Enumeration failures degrade to empty lists. A failed version query
    /// leaves the version unknown.
    pub fn from_entry(entry: &ash::Entry) -> Self {
        let layers = match unsafe { entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers,
            Err(e) => {
                tracing::warn!("Failed to enumerate instance layers: {e}");
                Vec::new()
            }
        };
        let layer_names: Vec<CString> = layers
            .iter()
            .filter_map(|layer| layer.layer_name_as_c_str().ok().map(CStr::to_owned))
            .collect();

        let mut extension_names = Vec::new();
        match unsafe { entry.enumerate_instance_extension_properties(None) } {
            Ok(extensions) => push_extension_names(&mut extension_names, &extensions),
            Err(e) => tracing::warn!("Failed to enumerate instance extensions: {e}"),
        }
        for layer in &layer_names {
            if let Ok(extensions) =
                unsafe { entry.enumerate_instance_extension_properties(Some(layer)) }
            {
                push_extension_names(&mut extension_names, &extensions);
            }
        }

        let info = Self::from_parts(layer_names, extension_names, ApiVersion::V1_0);
        match unsafe { entry.try_enumerate_instance_version() } {
            Ok(Some(version)) => info.with_instance_version(Some(ApiVersion::from_raw(version))),
            Ok(None) => info,
            Err(e) => {
                tracing::warn!("Failed to query instance version: {e}");
                info.with_instance_version(None)
            }
        }
    }

    pub(crate) fn from_parts(
        available_layers: Vec<CString>,
        available_extensions: Vec<CString>,
        instance_api_version: ApiVersion,
    ) -> Self {
        let validation_layers_available = available_layers
            .iter()
            .any(|name| name.as_c_str() == VALIDATION_LAYER_NAME);
        let debug_utils_available = available_extensions
            .iter()
            .any(|name| name.as_c_str() == ash::ext::debug_utils::NAME);

        Self {
            available_layers,
            available_extensions,
            validation_layers_available,
            debug_utils_available,
            instance_api_version: Some(instance_api_version),
        }
    }

    pub(crate) fn with_instance_version(mut self, version: Option<ApiVersion>) -> Self {
        self.instance_api_version = version;
        self
    }

    /// Get every instance layer the loader offers.
    pub fn available_layers(&self) -> &[CString] {
        &self.available_layers
    }

    /// Global extensions plus those provided by every available layer.
    pub fn available_extensions(&self) -> &[CString] {
        &self.available_extensions
    }

    pub fn is_layer_available(&self, name: &CStr) -> bool {
        self.available_layers.iter().any(|layer| layer.as_c_str() == name)
    }

    pub fn is_extension_available(&self, name: &CStr) -> bool {
        self.available_extensions.iter().any(|ext| ext.as_c_str() == name)
    }

    /// Whether the loader reports at least `major.minor`.
    pub fn is_instance_version_available(&self, major: u32, minor: u32) -> bool {
        self.instance_api_version() >= ApiVersion::new(major, minor, 0)
    }

    /// Whether the Khronos validation layer is installed.
    pub const fn validation_layers_available(&self) -> bool {
        self.validation_layers_available
    }

    /// Whether `VK_EXT_debug_utils` is available.
    pub const fn debug_utils_available(&self) -> bool {
        self.debug_utils_available
    }

    /// Loader version, 1.0 when it could not be queried.
    pub fn instance_api_version(&self) -> ApiVersion {
        self.instance_api_version.unwrap_or(ApiVersion::V1_0)
    }

    /// Loader version, or `None` when the query failed.
    pub const fn reported_instance_version(&self) -> Option<ApiVersion> {
        self.instance_api_version
    }
}

fn push_extension_names(names: &mut Vec<CString>, extensions: &[vk::ExtensionProperties]) {
    for extension in extensions {
        let Ok(name) = extension.extension_name_as_c_str() else {
            continue;
        };
        if !names.iter().any(|known| known.as_c_str() == name) {
            names.push(name.to_owned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_flags_follow_names() {
        let info = SystemInfo::from_parts(
            vec![VALIDATION_LAYER_NAME.to_owned()],
            vec![ash::ext::debug_utils::NAME.to_owned()],
            ApiVersion::V1_3,
        );
        assert!(info.validation_layers_available());
        assert!(info.debug_utils_available());
        assert!(info.is_layer_available(VALIDATION_LAYER_NAME));
        assert!(!info.is_extension_available(ash::khr::surface::NAME));

        let bare = SystemInfo::from_parts(Vec::new(), Vec::new(), ApiVersion::V1_0);
        assert!(!bare.validation_layers_available());
        assert!(!bare.debug_utils_available());
    }

    #[test]
    fn instance_version_check() {
        let info = SystemInfo::from_parts(Vec::new(), Vec::new(), ApiVersion::new(1, 2, 198));
        assert!(info.is_instance_version_available(1, 0));
        assert!(info.is_instance_version_available(1, 2));
        assert!(!info.is_instance_version_available(1, 3));
    }

    #[test]
    fn extension_names_are_deduplicated() {
        let mut names = Vec::new();
        let props = vk::ExtensionProperties::default()
            .extension_name(ash::khr::surface::NAME)
            .unwrap();
        push_extension_names(&mut names, &[props, props]);
        assert_eq!(names, vec![ash::khr::surface::NAME.to_owned()]);
    }

    #[test]
    fn failed_version_query_is_kept() {
        let info = SystemInfo::from_parts(Vec::new(), Vec::new(), ApiVersion::V1_3)
            .with_instance_version(None);
        assert_eq!(info.reported_instance_version(), None);
        assert_eq!(info.instance_api_version(), ApiVersion::V1_0);
        assert!(!info.is_instance_version_available(1, 1));
    }
}
