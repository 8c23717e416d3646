//! Vulkan instance creation.

use crate::debug::{self, DEFAULT_MESSAGE_TYPE, DEFAULT_SEVERITY};
use crate::error::{InstanceError, Result};
use crate::system_info::{SystemInfo, VALIDATION_LAYER_NAME};
use crate::version::ApiVersion;
use ash::vk;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::{c_char, c_void, CStr, CString};

/// Window-system surface extensions for the host platform.
#[cfg(target_os = "windows")]
const PLATFORM_SURFACE_EXTENSIONS: &[&CStr] = &[ash::khr::win32_surface::NAME];
#[cfg(target_os = "android")]
const PLATFORM_SURFACE_EXTENSIONS: &[&CStr] = &[ash::khr::android_surface::NAME];
#[cfg(any(target_os = "macos", target_os = "ios"))]
const PLATFORM_SURFACE_EXTENSIONS: &[&CStr] = &[ash::ext::metal_surface::NAME];
#[cfg(all(
    unix,
    not(any(target_os = "android", target_os = "macos", target_os = "ios"))
))]
const PLATFORM_SURFACE_EXTENSIONS: &[&CStr] = &[
    ash::khr::xcb_surface::NAME,
    ash::khr::xlib_surface::NAME,
    ash::khr::wayland_surface::NAME,
];
#[cfg(not(any(windows, unix)))]
const PLATFORM_SURFACE_EXTENSIONS: &[&CStr] = &[];

/// A created Vulkan instance and the loaders hanging off it.
pub struct Instance {
    entry: ash::Entry,
    instance: ash::Instance,
    surface_loader: Option<ash::khr::surface::Instance>,
    debug_utils: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: vk::DebugUtilsMessengerEXT,
    properties2: Option<ash::khr::get_physical_device_properties2::Instance>,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
    instance_version: ApiVersion,
    api_version: ApiVersion,
    headless: bool,
}

impl Instance {
    /// Get the raw instance handle.
    pub fn handle(&self) -> vk::Instance {
        self.instance.handle()
    }

    /// Get the ash instance function table.
    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }

    /// Get the loader entry the instance was created from.
    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    /// The messenger created at build time, or null.
    pub fn debug_messenger(&self) -> vk::DebugUtilsMessengerEXT {
        self.debug_messenger
    }

    /// Version reported by the loader.
    pub fn instance_version(&self) -> ApiVersion {
        self.instance_version
    }

    /// Version passed in `VkApplicationInfo::apiVersion`.
    pub fn api_version(&self) -> ApiVersion {
        self.api_version
    }

    /// Whether the instance was created without windowing extensions.
    pub fn is_headless(&self) -> bool {
        self.headless
    }

    /// Whether `VK_KHR_get_physical_device_properties2` was enabled.
    pub fn properties2_enabled(&self) -> bool {
        self.properties2.is_some()
    }

    /// Whether extended feature structs can be queried through
    /// `vkGetPhysicalDeviceFeatures2`.
    pub fn supports_features2(&self) -> bool {
        self.instance_version >= ApiVersion::V1_1 || self.properties2.is_some()
    }

    /// Get the surface extension loader, `None` when headless.
    pub fn surface_loader(&self) -> Option<&ash::khr::surface::Instance> {
        self.surface_loader.as_ref()
    }

    /// Get the allocation callbacks used for instance objects.
    pub fn allocation_callbacks(&self) -> Option<&vk::AllocationCallbacks<'static>> {
        self.allocation_callbacks.as_ref()
    }

    /// Query the extended features of `physical_device` through the core
    /// entry point or the properties2 extension. No-op when neither exists.
    ///
    /// # Safety
    /// `physical_device` must belong to this instance and `features` must head a valid chain.
    pub(crate) unsafe fn get_physical_device_features2(
        &self,
        physical_device: vk::PhysicalDevice,
        features: &mut vk::PhysicalDeviceFeatures2<'_>,
    ) {
        if self.instance_version >= ApiVersion::V1_1 {
            unsafe { self.instance.get_physical_device_features2(physical_device, features) };
        } else if let Some(loader) = &self.properties2 {
            unsafe { loader.get_physical_device_features2(physical_device, features) };
        }
    }

    /// Create a surface for `window`.
    ///
    /// # Safety
    /// The window must outlive the returned surface.
    pub unsafe fn create_surface<W>(&self, window: &W) -> Result<vk::SurfaceKHR>
    where
        W: HasDisplayHandle + HasWindowHandle,
    {
        if self.surface_loader.is_none() {
            return Err(InstanceError::WindowingExtensionsNotPresent.into());
        }

        let display = window.display_handle().map_err(InstanceError::from)?;
        let window_handle = window.window_handle().map_err(InstanceError::from)?;

        let surface = unsafe {
            ash_window::create_surface(
                &self.entry,
                &self.instance,
                display.as_raw(),
                window_handle.as_raw(),
                self.allocation_callbacks.as_ref(),
            )
        }
        .map_err(InstanceError::FailedCreateSurface)?;

        Ok(surface)
    }

    /// Destroy a surface created from this instance.
    ///
    /// # Safety
    /// The surface must not be in use.
    pub unsafe fn destroy_surface(&self, surface: vk::SurfaceKHR) {
        if let Some(loader) = &self.surface_loader {
            unsafe { loader.destroy_surface(surface, self.allocation_callbacks.as_ref()) };
        }
    }

    /// Destroy the debug messenger, then the instance.
    ///
    /// # Safety
    /// Every object created from this instance must already be destroyed.
    pub unsafe fn destroy(&self) {
        if let Some(debug_utils) = &self.debug_utils {
            unsafe {
                debug_utils.destroy_debug_utils_messenger(
                    self.debug_messenger,
                    self.allocation_callbacks.as_ref(),
                );
            }
        }
        unsafe { self.instance.destroy_instance(self.allocation_callbacks.as_ref()) };
    }
}

/// Layers, extensions and versions resolved against a [`SystemInfo`].
#[derive(Debug)]
pub(crate) struct InstancePlan {
    pub(crate) instance_version: ApiVersion,
    pub(crate) api_version: ApiVersion,
    pub(crate) extensions: Vec<CString>,
    pub(crate) layers: Vec<CString>,
    pub(crate) flags: vk::InstanceCreateFlags,
    pub(crate) debug_messenger: bool,
    pub(crate) properties2: bool,
}

/// Builder for creating an [`Instance`].
pub struct InstanceBuilder {
    app_name: String,
    engine_name: String,
    app_version: u32,
    engine_version: u32,
    required_api_version: ApiVersion,
    minimum_instance_version: Option<ApiVersion>,
    layers: Vec<CString>,
    extensions: Vec<CString>,
    flags: vk::InstanceCreateFlags,
    headless: bool,
    enable_validation_layers: bool,
    request_validation_layers: bool,
    use_debug_messenger: bool,
    debug_callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT,
    debug_user_data: *mut c_void,
    debug_severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    debug_message_type: vk::DebugUtilsMessageTypeFlagsEXT,
    disabled_validation_checks: Vec<vk::ValidationCheckEXT>,
    enabled_validation_features: Vec<vk::ValidationFeatureEnableEXT>,
    disabled_validation_features: Vec<vk::ValidationFeatureDisableEXT>,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
}

impl Default for InstanceBuilder {
    fn default() -> Self {
        Self {
            app_name: String::new(),
            engine_name: String::new(),
            app_version: 0,
            engine_version: 0,
            required_api_version: ApiVersion::V1_0,
            minimum_instance_version: None,
            layers: Vec::new(),
            extensions: Vec::new(),
            flags: vk::InstanceCreateFlags::empty(),
            headless: false,
            enable_validation_layers: false,
            request_validation_layers: false,
            use_debug_messenger: false,
            debug_callback: None,
            debug_user_data: std::ptr::null_mut(),
            debug_severity: DEFAULT_SEVERITY,
            debug_message_type: DEFAULT_MESSAGE_TYPE,
            disabled_validation_checks: Vec::new(),
            enabled_validation_features: Vec::new(),
            disabled_validation_features: Vec::new(),
            allocation_callbacks: None,
        }
    }
}

impl InstanceBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Application name reported to the driver.
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Engine name reported to the driver.
    pub fn engine_name(mut self, name: impl Into<String>) -> Self {
        self.engine_name = name.into();
        self
    }

    /// Set the application version (`VK_MAKE_VERSION` packed).
    pub fn app_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.app_version = vk::make_api_version(0, major, minor, patch);
        self
    }

    pub fn engine_version(mut self, major: u32, minor: u32, patch: u32) -> Self {
        self.engine_version = vk::make_api_version(0, major, minor, patch);
        self
    }

    /// API version the application targets. Fails the build if the loader
    /// is older and no lower minimum was given.
    pub fn require_api_version(mut self, version: ApiVersion) -> Self {
        self.required_api_version = version;
        self
    }

    /// Lowest loader version the application accepts.
    pub fn minimum_instance_version(mut self, version: ApiVersion) -> Self {
        self.minimum_instance_version = Some(version);
        self
    }

    /// Enable a layer. The build fails if it is not available.
    pub fn enable_layer(mut self, name: &CStr) -> Self {
        push_unique(&mut self.layers, name);
        self
    }

    /// Enable an extension. The build fails if it is not available.
    pub fn enable_extension(mut self, name: &CStr) -> Self {
        push_unique(&mut self.extensions, name);
        self
    }

    pub fn enable_extensions(mut self, names: &[&CStr]) -> Self {
        for name in names {
            push_unique(&mut self.extensions, name);
        }
        self
    }

    pub fn create_flags(mut self, flags: vk::InstanceCreateFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Skip the window-system surface extensions.
    pub fn headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Require the Khronos validation layer.
    pub fn enable_validation_layers(mut self, enable: bool) -> Self {
        self.enable_validation_layers = enable;
        self
    }

    /// Enable the Khronos validation layer when it is installed.
    pub fn request_validation_layers(mut self, request: bool) -> Self {
        self.request_validation_layers = request;
        self
    }

    /// Install a messenger that forwards to `tracing`.
    pub fn use_default_debug_messenger(mut self) -> Self {
        self.use_debug_messenger = true;
        self.debug_callback = None;
        self
    }

    /// Install a messenger with a custom callback.
    pub fn debug_callback(mut self, callback: vk::PFN_vkDebugUtilsMessengerCallbackEXT) -> Self {
        self.use_debug_messenger = true;
        self.debug_callback = callback;
        self
    }

    /// Pointer handed to the debug callback as `p_user_data`.
    pub fn debug_user_data(mut self, user_data: *mut c_void) -> Self {
        self.debug_user_data = user_data;
        self
    }

    /// Replace the severities the debug messenger reports.
    pub fn debug_messenger_severity(mut self, severity: vk::DebugUtilsMessageSeverityFlagsEXT) -> Self {
        self.debug_severity = severity;
        self
    }

    pub fn add_debug_messenger_severity(
        mut self,
        severity: vk::DebugUtilsMessageSeverityFlagsEXT,
    ) -> Self {
        self.debug_severity |= severity;
        self
    }

    /// Replace the message types the debug messenger reports.
    pub fn debug_messenger_type(mut self, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> Self {
        self.debug_message_type = message_type;
        self
    }

    pub fn add_debug_messenger_type(mut self, message_type: vk::DebugUtilsMessageTypeFlagsEXT) -> Self {
        self.debug_message_type |= message_type;
        self
    }

    /// Disable a validation check through `VkValidationFlagsEXT`.
    pub fn add_validation_disable(mut self, check: vk::ValidationCheckEXT) -> Self {
        self.disabled_validation_checks.push(check);
        self
    }

    /// Enable an extra validation feature.
    pub fn add_validation_feature_enable(mut self, feature: vk::ValidationFeatureEnableEXT) -> Self {
        self.enabled_validation_features.push(feature);
        self
    }

    /// Disable a validation feature.
    pub fn add_validation_feature_disable(mut self, feature: vk::ValidationFeatureDisableEXT) -> Self {
        self.disabled_validation_features.push(feature);
        self
    }

    /// Allocation callbacks for the instance, the messenger and surfaces.
    pub fn allocation_callbacks(mut self, callbacks: vk::AllocationCallbacks<'static>) -> Self {
        self.allocation_callbacks = Some(callbacks);
        self
    }

    /// Load the Vulkan loader and create the instance.
    pub fn build(self) -> Result<Instance> {
        // SAFETY: the entry is moved into the returned instance and outlives it.
        let entry = unsafe { ash::Entry::load() }.map_err(InstanceError::VulkanUnavailable)?;
        let system = SystemInfo::from_entry(&entry);
        self.build_with(entry, &system)
    }

    fn build_with(self, entry: ash::Entry, system: &SystemInfo) -> Result<Instance> {
        let plan = self.resolve(system)?;

        let app_name = CString::new(self.app_name.as_str()).map_err(InstanceError::from)?;
        let engine_name = CString::new(self.engine_name.as_str()).map_err(InstanceError::from)?;

        let mut app_info = vk::ApplicationInfo::default()
            .application_version(self.app_version)
            .engine_version(self.engine_version)
            .api_version(plan.api_version.raw());
        if !self.app_name.is_empty() {
            app_info = app_info.application_name(&app_name);
        }
        if !self.engine_name.is_empty() {
            app_info = app_info.engine_name(&engine_name);
        }

        let extension_names: Vec<*const c_char> =
            plan.extensions.iter().map(|ext| ext.as_ptr()).collect();
        let layer_names: Vec<*const c_char> = plan.layers.iter().map(|l| l.as_ptr()).collect();

        let mut messenger_info = debug::messenger_create_info(
            self.debug_severity,
            self.debug_message_type,
            self.debug_callback,
            self.debug_user_data,
        );
        let mut validation_features = vk::ValidationFeaturesEXT::default()
            .enabled_validation_features(&self.enabled_validation_features)
            .disabled_validation_features(&self.disabled_validation_features);
        let mut validation_flags =
            vk::ValidationFlagsEXT::default().disabled_validation_checks(&self.disabled_validation_checks);

        let mut create_info = vk::InstanceCreateInfo::default()
            .flags(plan.flags)
            .application_info(&app_info)
            .enabled_extension_names(&extension_names)
            .enabled_layer_names(&layer_names);
        if plan.debug_messenger {
            create_info = create_info.push_next(&mut messenger_info);
        }
        if !self.enabled_validation_features.is_empty()
            || !self.disabled_validation_features.is_empty()
        {
            create_info = create_info.push_next(&mut validation_features);
        }
        if !self.disabled_validation_checks.is_empty() {
            create_info = create_info.push_next(&mut validation_flags);
        }

        let allocator = self.allocation_callbacks.as_ref();
        let instance = unsafe { entry.create_instance(&create_info, allocator) }
            .map_err(InstanceError::FailedCreateInstance)?;

        let debug_utils = plan
            .debug_messenger
            .then(|| ash::ext::debug_utils::Instance::new(&entry, &instance));
        let debug_messenger = match &debug_utils {
            Some(loader) => {
                match unsafe { loader.create_debug_utils_messenger(&messenger_info, allocator) } {
                    Ok(messenger) => messenger,
                    Err(e) => {
                        unsafe { instance.destroy_instance(allocator) };
                        return Err(InstanceError::FailedCreateDebugMessenger(e).into());
                    }
                }
            }
            None => vk::DebugUtilsMessengerEXT::null(),
        };

        let surface_loader =
            (!self.headless).then(|| ash::khr::surface::Instance::new(&entry, &instance));
        let properties2 = plan
            .properties2
            .then(|| ash::khr::get_physical_device_properties2::Instance::new(&entry, &instance));

        tracing::info!(
            "Created Vulkan instance (loader {}, API {})",
            plan.instance_version,
            plan.api_version
        );

        Ok(Instance {
            entry,
            instance,
            surface_loader,
            debug_utils,
            debug_messenger,
            properties2,
            allocation_callbacks: self.allocation_callbacks,
            instance_version: plan.instance_version,
            api_version: plan.api_version,
            headless: self.headless,
        })
    }

    /// Resolve versions, extensions and layers without touching the driver.
    pub(crate) fn resolve(
        &self,
        system: &SystemInfo,
    ) -> std::result::Result<InstancePlan, InstanceError> {
        let instance_version = system.instance_api_version();

        if self.minimum_instance_version.is_some() || self.required_api_version > ApiVersion::V1_0 {
            let needed = self
                .minimum_instance_version
                .unwrap_or(self.required_api_version);
            let Some(reported) = system.reported_instance_version() else {
                return Err(InstanceError::VulkanVersionUnavailable {
                    requested: needed,
                    available: instance_version,
                });
            };
            if reported < needed {
                return Err(version_unavailable(needed, reported));
            }
        }

        let api_version = if instance_version < ApiVersion::V1_1 {
            instance_version
        } else {
            self.required_api_version
        };

        let mut extensions = self.extensions.clone();
        let mut flags = self.flags;

        let debug_messenger = self.use_debug_messenger && system.debug_utils_available();
        if debug_messenger {
            push_unique(&mut extensions, ash::ext::debug_utils::NAME);
        } else if self.use_debug_messenger {
            tracing::warn!("Debug messenger requested but VK_EXT_debug_utils is not available");
        }

        let portability = system.is_extension_available(ash::khr::portability_enumeration::NAME);
        if api_version < ApiVersion::V1_1 && portability {
            push_unique(&mut extensions, ash::khr::get_physical_device_properties2::NAME);
        }
        if portability {
            push_unique(&mut extensions, ash::khr::portability_enumeration::NAME);
            flags |= vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR;
        }

        if !self.headless {
            let mut add_if_available = |name: &CStr| {
                let available = system.is_extension_available(name);
                if available {
                    push_unique(&mut extensions, name);
                }
                available
            };
            let surface_added = add_if_available(ash::khr::surface::NAME);
            let platform_added = PLATFORM_SURFACE_EXTENSIONS
                .iter()
                .fold(false, |added, &name| add_if_available(name) || added);
            if !surface_added || !platform_added {
                return Err(InstanceError::WindowingExtensionsNotPresent);
            }
        }

        let missing = missing_names(&extensions, |name| system.is_extension_available(name));
        if !missing.is_empty() {
            return Err(InstanceError::RequestedExtensionsNotPresent(missing));
        }

        let mut layers = self.layers.clone();
        if self.enable_validation_layers
            || (self.request_validation_layers && system.validation_layers_available())
        {
            push_unique(&mut layers, VALIDATION_LAYER_NAME);
        } else if self.request_validation_layers {
            tracing::warn!("Validation layers requested but not available");
        }

        let missing = missing_names(&layers, |name| system.is_layer_available(name));
        if !missing.is_empty() {
            return Err(InstanceError::RequestedLayersNotPresent(missing));
        }

        let properties2 = api_version < ApiVersion::V1_1
            && extensions
                .iter()
                .any(|ext| ext.as_c_str() == ash::khr::get_physical_device_properties2::NAME);

        tracing::debug!("Instance extensions: {:?}", extensions);
        tracing::debug!("Instance layers: {:?}", layers);

        Ok(InstancePlan {
            instance_version,
            api_version,
            extensions,
            layers,
            flags,
            debug_messenger,
            properties2,
        })
    }
}

fn version_unavailable(requested: ApiVersion, available: ApiVersion) -> InstanceError {
    match (requested.major(), requested.minor()) {
        (1, 1) => InstanceError::VulkanVersion11Unavailable { available },
        (1, 2) => InstanceError::VulkanVersion12Unavailable { available },
        (1, 3) => InstanceError::VulkanVersion13Unavailable { available },
        (1, 4) => InstanceError::VulkanVersion14Unavailable { available },
        _ => InstanceError::VulkanVersionUnavailable {
            requested,
            available,
        },
    }
}

fn push_unique(names: &mut Vec<CString>, name: &CStr) {
    if !names.iter().any(|known| known.as_c_str() == name) {
        names.push(name.to_owned());
    }
}

fn missing_names(names: &[CString], available: impl Fn(&CStr) -> bool) -> Vec<String> {
    names
        .iter()
        .filter(|name| !available(name.as_c_str()))
        .map(|name| name.to_string_lossy().into_owned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn windowing_extensions() -> Vec<CString> {
        let mut names = vec![ash::khr::surface::NAME.to_owned()];
        names.extend(PLATFORM_SURFACE_EXTENSIONS.iter().map(|name| (*name).to_owned()));
        names
    }

    fn system(extensions: Vec<CString>, layers: Vec<CString>, version: ApiVersion) -> SystemInfo {
        SystemInfo::from_parts(layers, extensions, version)
    }

    #[test]
    fn missing_windowing_extensions_fail_before_creation() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_3);
        let result = InstanceBuilder::new().resolve(&info);
        assert!(matches!(result, Err(InstanceError::WindowingExtensionsNotPresent)));
    }

    #[test]
    fn surface_extension_alone_is_not_enough() {
        let info = system(
            vec![ash::khr::surface::NAME.to_owned()],
            Vec::new(),
            ApiVersion::V1_3,
        );
        let result = InstanceBuilder::new().resolve(&info);
        assert!(matches!(result, Err(InstanceError::WindowingExtensionsNotPresent)));
    }

    #[test]
    fn windowing_extensions_are_added_when_available() {
        let info = system(windowing_extensions(), Vec::new(), ApiVersion::V1_3);
        let plan = InstanceBuilder::new().resolve(&info).unwrap();
        for name in windowing_extensions() {
            assert!(plan.extensions.contains(&name));
        }
    }

    #[test]
    fn headless_skips_windowing() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_3);
        let plan = InstanceBuilder::new().headless(true).resolve(&info).unwrap();
        assert!(plan.extensions.is_empty());
        assert!(plan.layers.is_empty());
    }

    #[test]
    fn version_errors_follow_the_requested_tier() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_2);

        let result = InstanceBuilder::new()
            .headless(true)
            .require_api_version(ApiVersion::V1_3)
            .resolve(&info);
        assert!(matches!(
            result,
            Err(InstanceError::VulkanVersion13Unavailable { available }) if available == ApiVersion::V1_2
        ));

        let old_loader = system(Vec::new(), Vec::new(), ApiVersion::V1_0);
        let result = InstanceBuilder::new()
            .headless(true)
            .minimum_instance_version(ApiVersion::V1_1)
            .resolve(&old_loader);
        assert!(matches!(result, Err(InstanceError::VulkanVersion11Unavailable { .. })));

        let result = InstanceBuilder::new()
            .headless(true)
            .require_api_version(ApiVersion::new(2, 0, 0))
            .resolve(&info);
        assert!(matches!(result, Err(InstanceError::VulkanVersionUnavailable { .. })));
    }

    #[test]
    fn unknown_loader_version_fails_versioned_requests() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_3).with_instance_version(None);

        let result = InstanceBuilder::new()
            .headless(true)
            .require_api_version(ApiVersion::V1_1)
            .resolve(&info);
        assert!(matches!(
            result,
            Err(InstanceError::VulkanVersionUnavailable { requested, .. }) if requested == ApiVersion::V1_1
        ));

        let plan = InstanceBuilder::new().headless(true).resolve(&info).unwrap();
        assert_eq!(plan.api_version, ApiVersion::V1_0);
    }

    #[test]
    fn minimum_version_allows_lower_loader_than_required() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_2);
        let plan = InstanceBuilder::new()
            .headless(true)
            .minimum_instance_version(ApiVersion::V1_1)
            .require_api_version(ApiVersion::V1_3)
            .resolve(&info)
            .unwrap();
        assert_eq!(plan.api_version, ApiVersion::V1_3);
        assert_eq!(plan.instance_version, ApiVersion::V1_2);
    }

    #[test]
    fn pre_1_1_loader_pins_api_version() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_0);
        let plan = InstanceBuilder::new().headless(true).resolve(&info).unwrap();
        assert_eq!(plan.api_version, ApiVersion::V1_0);
    }

    #[test]
    fn portability_enumeration_sets_flag_and_properties2() {
        let info = system(
            vec![
                ash::khr::portability_enumeration::NAME.to_owned(),
                ash::khr::get_physical_device_properties2::NAME.to_owned(),
            ],
            Vec::new(),
            ApiVersion::V1_0,
        );
        let plan = InstanceBuilder::new().headless(true).resolve(&info).unwrap();

        assert!(plan
            .flags
            .contains(vk::InstanceCreateFlags::ENUMERATE_PORTABILITY_KHR));
        assert!(plan.properties2);
        assert_eq!(
            plan.extensions,
            vec![
                ash::khr::get_physical_device_properties2::NAME.to_owned(),
                ash::khr::portability_enumeration::NAME.to_owned(),
            ]
        );
    }

    #[test]
    fn missing_requested_extension_is_reported() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_3);
        let result = InstanceBuilder::new()
            .headless(true)
            .enable_extension(c"VK_EXT_made_up")
            .resolve(&info);
        match result {
            Err(InstanceError::RequestedExtensionsNotPresent(missing)) => {
                assert_eq!(missing, vec!["VK_EXT_made_up".to_string()]);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn requested_validation_is_optional_enabled_validation_is_not() {
        let info = system(Vec::new(), Vec::new(), ApiVersion::V1_3);

        let plan = InstanceBuilder::new()
            .headless(true)
            .request_validation_layers(true)
            .resolve(&info)
            .unwrap();
        assert!(plan.layers.is_empty());

        let result = InstanceBuilder::new()
            .headless(true)
            .enable_validation_layers(true)
            .resolve(&info);
        assert!(matches!(result, Err(InstanceError::RequestedLayersNotPresent(_))));

        let with_layer = system(
            Vec::new(),
            vec![VALIDATION_LAYER_NAME.to_owned()],
            ApiVersion::V1_3,
        );
        let plan = InstanceBuilder::new()
            .headless(true)
            .request_validation_layers(true)
            .resolve(&with_layer)
            .unwrap();
        assert_eq!(plan.layers, vec![VALIDATION_LAYER_NAME.to_owned()]);
    }

    #[test]
    fn debug_messenger_needs_debug_utils() {
        let without = system(Vec::new(), Vec::new(), ApiVersion::V1_3);
        let plan = InstanceBuilder::new()
            .headless(true)
            .use_default_debug_messenger()
            .resolve(&without)
            .unwrap();
        assert!(!plan.debug_messenger);

        let with = system(
            vec![ash::ext::debug_utils::NAME.to_owned()],
            Vec::new(),
            ApiVersion::V1_3,
        );
        let plan = InstanceBuilder::new()
            .headless(true)
            .use_default_debug_messenger()
            .resolve(&with)
            .unwrap();
        assert!(plan.debug_messenger);
        assert_eq!(plan.extensions, vec![ash::ext::debug_utils::NAME.to_owned()]);
    }
}
