//! Physical device selection.
//!
//! Every enumerated device is populated with its raw facts, classified
//! against a [`SelectionCriteria`] and ranked. Devices classified
//! [`Suitable::No`] are dropped, the rest are stable-sorted so that
//! [`Suitable::Yes`] comes before [`Suitable::Partial`] and enumeration order
//! breaks ties.

use crate::error::{PhysicalDeviceError, Result};
use crate::feature_chain::{FeatureChain, FeatureStruct};
use crate::features::{combine_features, supports_features};
use crate::instance::Instance;
use crate::physical_device::{PhysicalDevice, Suitable};
use crate::queue::{dedicated_queue_index, separate_queue_index};
use crate::surface::SurfaceSupportDetails;
use crate::version::ApiVersion;
use ash::vk;
use std::ffi::{CStr, CString};

/// What a device has to offer to be selected.
#[derive(Clone, Debug)]
pub struct SelectionCriteria {
    pub(crate) name: Option<String>,
    pub(crate) preferred_type: vk::PhysicalDeviceType,
    pub(crate) allow_any_type: bool,
    pub(crate) require_present: bool,
    pub(crate) require_dedicated_compute_queue: bool,
    pub(crate) require_dedicated_transfer_queue: bool,
    pub(crate) require_separate_compute_queue: bool,
    pub(crate) require_separate_transfer_queue: bool,
    pub(crate) required_mem_size: vk::DeviceSize,
    pub(crate) required_extensions: Vec<CString>,
    pub(crate) required_version: ApiVersion,
    pub(crate) required_features: vk::PhysicalDeviceFeatures,
    pub(crate) extended_features: FeatureChain,
    pub(crate) defer_surface_initialization: bool,
    pub(crate) use_first_gpu_unconditionally: bool,
    pub(crate) enable_portability_subset: bool,
}

impl SelectionCriteria {
    fn new(require_present: bool, required_version: ApiVersion) -> Self {
        Self {
            name: None,
            preferred_type: vk::PhysicalDeviceType::DISCRETE_GPU,
            allow_any_type: true,
            require_present,
            require_dedicated_compute_queue: false,
            require_dedicated_transfer_queue: false,
            require_separate_compute_queue: false,
            require_separate_transfer_queue: false,
            required_mem_size: 0,
            required_extensions: Vec::new(),
            required_version,
            required_features: vk::PhysicalDeviceFeatures::default(),
            extended_features: FeatureChain::new(),
            defer_surface_initialization: false,
            use_first_gpu_unconditionally: false,
            enable_portability_subset: true,
        }
    }

    /// Whether presentation support is required.
    pub fn require_present(&self) -> bool {
        self.require_present
    }

    /// Get the minimum device API version.
    pub fn required_version(&self) -> ApiVersion {
        self.required_version
    }

    /// Get the device extensions a candidate must support.
    pub fn required_extensions(&self) -> &[CString] {
        &self.required_extensions
    }

    /// Get the extended feature structs a candidate must report.
    pub fn extended_features(&self) -> &FeatureChain {
        &self.extended_features
    }

    /// OR `features` into the required core features.
    pub(crate) fn add_required_features(&mut self, features: &vk::PhysicalDeviceFeatures) {
        combine_features(&mut self.required_features, features);
    }

    /// Fail early when presentation is required but there is nothing to
    /// present to.
    pub(crate) fn check_surface(
        &self,
        surface: vk::SurfaceKHR,
    ) -> std::result::Result<(), PhysicalDeviceError> {
        if self.require_present
            && !self.defer_surface_initialization
            && surface == vk::SurfaceKHR::null()
        {
            return Err(PhysicalDeviceError::NoSurfaceProvided);
        }
        Ok(())
    }

    /// Classify and rank populated devices, or take the first one as is when
    /// selecting unconditionally.
    pub(crate) fn evaluate(&self, devices: Vec<PhysicalDevice>) -> Vec<PhysicalDevice> {
        if self.use_first_gpu_unconditionally {
            return devices
                .into_iter()
                .take(1)
                .map(|mut pd| {
                    pd.suitability = Suitable::Yes;
                    self.fill_out(&mut pd);
                    pd
                })
                .collect();
        }

        let devices = devices
            .into_iter()
            .map(|mut pd| {
                pd.suitability = self.classify(&pd);
                tracing::debug!("Physical device {}: {:?}", pd.name, pd.suitability);
                pd
            })
            .collect();
        rank_devices(devices, self)
    }

    /// Classify a populated device.
    pub(crate) fn classify(&self, pd: &PhysicalDevice) -> Suitable {
        if let Some(name) = &self.name {
            if !name.is_empty() && *name != pd.name {
                return Suitable::No;
            }
        }

        if pd.api_version() < self.required_version {
            return Suitable::No;
        }

        let families = &pd.queue_families;
        let compute = vk::QueueFlags::COMPUTE;
        let transfer = vk::QueueFlags::TRANSFER;
        if self.require_dedicated_compute_queue
            && dedicated_queue_index(families, compute, transfer).is_none()
        {
            return Suitable::No;
        }
        if self.require_dedicated_transfer_queue
            && dedicated_queue_index(families, transfer, compute).is_none()
        {
            return Suitable::No;
        }
        if self.require_separate_compute_queue
            && separate_queue_index(families, compute, transfer).is_none()
        {
            return Suitable::No;
        }
        if self.require_separate_transfer_queue
            && separate_queue_index(families, transfer, compute).is_none()
        {
            return Suitable::No;
        }

        let missing_extension = self.required_extensions.iter().any(|required| {
            !pd.available_extensions
                .iter()
                .any(|available| available == required)
        });
        if missing_extension {
            return Suitable::No;
        }

        if self.require_present && !self.defer_surface_initialization && !pd.present_supported {
            return Suitable::No;
        }

        if !supports_features(
            &pd.features,
            &self.required_features,
            &pd.extended_features,
            &self.extended_features,
        ) {
            return Suitable::No;
        }

        let heap_count = pd.memory_properties.memory_heap_count as usize;
        let too_small_heap = pd
            .memory_properties
            .memory_heaps
            .iter()
            .take(heap_count)
            .any(|heap| {
                heap.flags.contains(vk::MemoryHeapFlags::DEVICE_LOCAL)
                    && heap.size < self.required_mem_size
            });
        if too_small_heap {
            return Suitable::No;
        }

        if !self.allow_any_type && pd.properties.device_type != self.preferred_type {
            return Suitable::Partial;
        }

        Suitable::Yes
    }

    /// Overlay what will be enabled onto a selected device.
    pub(crate) fn fill_out(&self, pd: &mut PhysicalDevice) {
        pd.features = self.required_features;
        pd.extended_features = self.extended_features.clone();
        pd.defer_surface_initialization = self.defer_surface_initialization;

        let mut extensions = self.required_extensions.clone();
        let portability_subset = ash::khr::portability_subset::NAME;
        if self.enable_portability_subset
            && pd.is_extension_present(portability_subset)
            && !extensions.iter().any(|ext| ext.as_c_str() == portability_subset)
        {
            extensions.push(portability_subset.to_owned());
        }
        pd.extensions_to_enable = extensions;
    }
}

/// Drop unsuitable devices, rank the rest and fill them out.
pub(crate) fn rank_devices(
    mut devices: Vec<PhysicalDevice>,
    criteria: &SelectionCriteria,
) -> Vec<PhysicalDevice> {
    devices.retain(|pd| pd.suitability != Suitable::No);
    devices.sort_by_key(|pd| pd.suitability);
    for pd in &mut devices {
        criteria.fill_out(pd);
    }
    devices
}

/// Builder-style selector for a [`PhysicalDevice`].
pub struct PhysicalDeviceSelector<'a> {
    instance: &'a Instance,
    surface: vk::SurfaceKHR,
    criteria: SelectionCriteria,
}

impl<'a> PhysicalDeviceSelector<'a> {
    /// Defaults: discrete GPUs preferred but any type allowed, presentation
    /// required unless the instance is headless, and the instance API
    /// version as the minimum device version.
    pub fn new(instance: &'a Instance) -> Self {
        Self {
            instance,
            surface: vk::SurfaceKHR::null(),
            criteria: SelectionCriteria::new(!instance.is_headless(), instance.api_version()),
        }
    }

    /// Surface the device must be able to present to.
    pub fn surface(mut self, surface: vk::SurfaceKHR) -> Self {
        self.surface = surface;
        self
    }

    /// Only accept the device with this exact name.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.criteria.name = Some(name.into());
        self
    }

    /// Device type ranked first. Discrete GPUs by default.
    pub fn prefer_gpu_device_type(mut self, device_type: vk::PhysicalDeviceType) -> Self {
        self.criteria.preferred_type = device_type;
        self
    }

    /// When false, devices of another type are ranked [`Suitable::Partial`].
    pub fn allow_any_gpu_device_type(mut self, allow: bool) -> Self {
        self.criteria.allow_any_type = allow;
        self
    }

    /// Override the presentation requirement derived from the instance.
    pub fn require_present(mut self, require: bool) -> Self {
        self.criteria.require_present = require;
        self
    }

    /// Require a compute family without graphics or transfer.
    pub fn require_dedicated_compute_queue(mut self) -> Self {
        self.criteria.require_dedicated_compute_queue = true;
        self
    }

    /// Require a transfer family without graphics or compute.
    pub fn require_dedicated_transfer_queue(mut self) -> Self {
        self.criteria.require_dedicated_transfer_queue = true;
        self
    }

    /// Require a compute family without graphics.
    pub fn require_separate_compute_queue(mut self) -> Self {
        self.criteria.require_separate_compute_queue = true;
        self
    }

    /// Require a transfer family without graphics.
    pub fn require_separate_transfer_queue(mut self) -> Self {
        self.criteria.require_separate_transfer_queue = true;
        self
    }

    /// Every device-local heap must be at least `size` bytes.
    pub fn required_device_memory_size(mut self, size: vk::DeviceSize) -> Self {
        self.criteria.required_mem_size = size;
        self
    }

    /// Require a device extension and enable it on the selected device.
    pub fn add_required_extension(mut self, name: &CStr) -> Self {
        self.criteria.required_extensions.push(name.to_owned());
        self
    }

    /// Require several device extensions.
    pub fn add_required_extensions(mut self, names: &[&CStr]) -> Self {
        self.criteria
            .required_extensions
            .extend(names.iter().map(|name| (*name).to_owned()));
        self
    }

    /// Minimum device API version. Defaults to the instance API version.
    pub fn minimum_version(mut self, version: ApiVersion) -> Self {
        self.criteria.required_version = version;
        self
    }

    /// Do not enable `VK_KHR_portability_subset` automatically.
    pub fn disable_portability_subset(mut self) -> Self {
        self.criteria.enable_portability_subset = false;
        self
    }

    /// Require an extended feature struct. The device must report the
    /// registered structs exactly.
    pub fn add_required_extension_features<T: FeatureStruct>(mut self, features: &T) -> Self {
        self.criteria.extended_features.add(features);
        self
    }

    /// Require core features. Repeated calls add up.
    pub fn required_features(mut self, features: vk::PhysicalDeviceFeatures) -> Self {
        self.criteria.add_required_features(&features);
        self
    }

    /// Require Vulkan 1.1 features.
    pub fn required_features_11(self, features: vk::PhysicalDeviceVulkan11Features<'static>) -> Self {
        self.add_required_extension_features(&features)
    }

    /// Require Vulkan 1.2 features.
    pub fn required_features_12(self, features: vk::PhysicalDeviceVulkan12Features<'static>) -> Self {
        self.add_required_extension_features(&features)
    }

    /// Require Vulkan 1.3 features.
    pub fn required_features_13(self, features: vk::PhysicalDeviceVulkan13Features<'static>) -> Self {
        self.add_required_extension_features(&features)
    }

    /// Skip the surface presentation check and enable the swapchain
    /// extension regardless.
    pub fn defer_surface_initialization(mut self) -> Self {
        self.criteria.defer_surface_initialization = true;
        self
    }

    /// Return the first enumerated device without checking anything.
    pub fn select_first_device_unconditionally(mut self, unconditionally: bool) -> Self {
        self.criteria.use_first_gpu_unconditionally = unconditionally;
        self
    }

    /// Get the criteria built so far.
    pub fn criteria(&self) -> &SelectionCriteria {
        &self.criteria
    }

    /// The best suitable device.
    pub fn select(&self) -> Result<PhysicalDevice> {
        let device = self
            .select_impl()?
            .into_iter()
            .next()
            .ok_or(PhysicalDeviceError::NoSuitableDevice)?;
        tracing::info!("Selected GPU: {}", device.name);
        Ok(device)
    }

    /// Every suitable device, best first.
    pub fn select_devices(&self) -> Result<Vec<PhysicalDevice>> {
        self.select_impl()
    }

    /// Names of every suitable device, best first.
    pub fn select_device_names(&self) -> Result<Vec<String>> {
        Ok(self.select_impl()?.into_iter().map(|pd| pd.name).collect())
    }

    fn select_impl(&self) -> Result<Vec<PhysicalDevice>> {
        let criteria = &self.criteria;
        criteria.check_surface(self.surface)?;

        // SAFETY: the instance is alive for `'a`.
        let mut handles = unsafe { self.instance.instance().enumerate_physical_devices() }
            .map_err(PhysicalDeviceError::FailedEnumeratePhysicalDevices)?;
        if handles.is_empty() {
            return Err(PhysicalDeviceError::NoPhysicalDevicesFound.into());
        }
        if criteria.use_first_gpu_unconditionally {
            handles.truncate(1);
        }

        let devices = handles
            .into_iter()
            .map(|handle| self.populate(handle))
            .collect();

        let ranked = criteria.evaluate(devices);
        if ranked.is_empty() {
            return Err(PhysicalDeviceError::NoSuitableDevice.into());
        }
        Ok(ranked)
    }

    /// Read the raw facts of one device.
    fn populate(&self, handle: vk::PhysicalDevice) -> PhysicalDevice {
        let instance = self.instance.instance();

        // SAFETY: `handle` was just enumerated from this instance.
        let (queue_families, properties, features, memory_properties) = unsafe {
            (
                instance.get_physical_device_queue_family_properties(handle),
                instance.get_physical_device_properties(handle),
                instance.get_physical_device_features(handle),
                instance.get_physical_device_memory_properties(handle),
            )
        };
        let name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut pd = PhysicalDevice {
            name,
            handle,
            surface: self.surface,
            features,
            properties,
            memory_properties,
            queue_families,
            available_extensions: Vec::new(),
            extensions_to_enable: Vec::new(),
            extended_features: FeatureChain::new(),
            present_supported: false,
            defer_surface_initialization: self.criteria.defer_surface_initialization,
            instance_version: self.instance.instance_version(),
            properties2_enabled: self.instance.properties2_enabled(),
            suitability: Suitable::No,
        };

        pd.present_supported = self.surface_is_presentable(handle);

        match unsafe { instance.enumerate_device_extension_properties(handle) } {
            Ok(extensions) => {
                pd.available_extensions = extensions
                    .iter()
                    .filter_map(|ext| ext.extension_name_as_c_str().ok().map(CStr::to_owned))
                    .collect();
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to enumerate extensions of {}, treating it as having none: {e}",
                    pd.name
                );
                return pd;
            }
        }

        if !self.criteria.extended_features.is_empty() && self.instance.supports_features2() {
            let mut supported = self.criteria.extended_features.cleared();
            supported.chain_up(vk::PhysicalDeviceFeatures::default(), |head| {
                // SAFETY: `head` links only nodes owned by `supported`.
                unsafe { self.instance.get_physical_device_features2(handle, head) };
            });
            pd.extended_features = supported;
        }

        pd
    }

    fn surface_is_presentable(&self, handle: vk::PhysicalDevice) -> bool {
        let Some(loader) = self.instance.surface_loader() else {
            return false;
        };
        if self.surface == vk::SurfaceKHR::null() {
            return false;
        }
        // SAFETY: both handles belong to this instance.
        unsafe { SurfaceSupportDetails::query(loader, handle, self.surface) }
            .is_ok_and(|details| !details.formats.is_empty() && !details.present_modes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ash::vk::Handle;
    use crate::physical_device::fixtures::{device, ALL_QUEUES};
    use crate::queue::family;

    fn criteria() -> SelectionCriteria {
        SelectionCriteria::new(false, ApiVersion::V1_0)
    }

    fn classified(criteria: &SelectionCriteria, mut pd: PhysicalDevice) -> PhysicalDevice {
        pd.suitability = criteria.classify(&pd);
        pd
    }

    #[test]
    fn dedicated_compute_rejects_combined_family() {
        let mut criteria = criteria();
        criteria.require_dedicated_compute_queue = true;

        let combined = classified(&criteria, device("combined", vk::PhysicalDeviceType::DISCRETE_GPU));
        assert_eq!(combined.suitability, Suitable::No);

        let ranked = rank_devices(vec![combined], &criteria);
        assert!(ranked.is_empty());
    }

    #[test]
    fn dedicated_compute_accepts_compute_only_family() {
        let mut criteria = criteria();
        criteria.require_dedicated_compute_queue = true;

        let mut pd = device("async", vk::PhysicalDeviceType::DISCRETE_GPU);
        pd.queue_families.push(family(
            vk::QueueFlags::COMPUTE | vk::QueueFlags::SPARSE_BINDING,
            4,
        ));
        let pd = classified(&criteria, pd);
        assert_eq!(pd.suitability, Suitable::Yes);

        let ranked = rank_devices(vec![pd], &criteria);
        assert_eq!(ranked.len(), 1);
        assert!(ranked[0].queue_families.iter().any(|f| {
            f.queue_flags.contains(vk::QueueFlags::COMPUTE)
                && !f.queue_flags.contains(vk::QueueFlags::GRAPHICS)
                && !f.queue_flags.contains(vk::QueueFlags::TRANSFER)
        }));
    }

    #[test]
    fn separate_transfer_accepts_compute_transfer_family() {
        let mut criteria = criteria();
        criteria.require_separate_transfer_queue = true;

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(criteria.classify(&pd), Suitable::No);
        pd.queue_families.push(family(
            vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
            2,
        ));
        assert_eq!(criteria.classify(&pd), Suitable::Yes);
    }

    #[test]
    fn type_mismatch_is_partial_only_when_any_type_disallowed() {
        let mut criteria = criteria();
        let integrated = device("igpu", vk::PhysicalDeviceType::INTEGRATED_GPU);
        assert_eq!(criteria.classify(&integrated), Suitable::Yes);

        criteria.allow_any_type = false;
        assert_eq!(criteria.classify(&integrated), Suitable::Partial);
    }

    #[test]
    fn ranking_is_stable_and_drops_unsuitable() {
        let mut criteria = criteria();
        criteria.allow_any_type = false;
        criteria.required_mem_size = 4 << 30;

        let mut small = device("small", vk::PhysicalDeviceType::DISCRETE_GPU);
        small.memory_properties.memory_heaps[0].size = 1 << 30;

        let devices = vec![
            classified(&criteria, device("igpu-a", vk::PhysicalDeviceType::INTEGRATED_GPU)),
            classified(&criteria, small),
            classified(&criteria, device("dgpu-a", vk::PhysicalDeviceType::DISCRETE_GPU)),
            classified(&criteria, device("igpu-b", vk::PhysicalDeviceType::INTEGRATED_GPU)),
            classified(&criteria, device("dgpu-b", vk::PhysicalDeviceType::DISCRETE_GPU)),
        ];

        let names: Vec<_> = rank_devices(devices, &criteria)
            .into_iter()
            .map(|pd| pd.name)
            .collect();
        assert_eq!(names, ["dgpu-a", "dgpu-b", "igpu-a", "igpu-b"]);
    }

    #[test]
    fn name_version_and_extension_filters() {
        let mut criteria = criteria();
        criteria.name = Some("wanted".to_string());
        assert_eq!(
            criteria.classify(&device("other", vk::PhysicalDeviceType::DISCRETE_GPU)),
            Suitable::No
        );
        assert_eq!(
            criteria.classify(&device("wanted", vk::PhysicalDeviceType::DISCRETE_GPU)),
            Suitable::Yes
        );

        let mut criteria = self::criteria();
        criteria.required_version = ApiVersion::V1_4;
        assert_eq!(
            criteria.classify(&device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU)),
            Suitable::No
        );

        let mut criteria = self::criteria();
        criteria
            .required_extensions
            .push(ash::khr::swapchain::NAME.to_owned());
        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(criteria.classify(&pd), Suitable::No);
        pd.available_extensions
            .push(ash::khr::swapchain::NAME.to_owned());
        assert_eq!(criteria.classify(&pd), Suitable::Yes);
    }

    #[test]
    fn present_requirement_respects_deferral() {
        let mut criteria = criteria();
        criteria.require_present = true;

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        pd.present_supported = false;
        assert_eq!(criteria.classify(&pd), Suitable::No);

        criteria.defer_surface_initialization = true;
        assert_eq!(criteria.classify(&pd), Suitable::Yes);
    }

    #[test]
    fn required_features_are_checked() {
        let mut criteria = criteria();
        criteria.required_features = vk::PhysicalDeviceFeatures::default().geometry_shader(true);

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(criteria.classify(&pd), Suitable::No);
        pd.features = vk::PhysicalDeviceFeatures::default()
            .geometry_shader(true)
            .tessellation_shader(true);
        assert_eq!(criteria.classify(&pd), Suitable::Yes);
    }

    #[test]
    fn extended_features_must_match_the_device_chain() {
        let mut criteria = criteria();
        criteria
            .extended_features
            .add(&vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true));

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(criteria.classify(&pd), Suitable::No);

        pd.extended_features = criteria.extended_features.clone();
        assert_eq!(criteria.classify(&pd), Suitable::Yes);
    }

    #[test]
    fn fill_out_overlays_criteria() {
        let mut criteria = criteria();
        criteria.required_features = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        criteria
            .required_extensions
            .push(ash::khr::swapchain::NAME.to_owned());
        criteria
            .extended_features
            .add(&vk::PhysicalDeviceVulkan12Features::default().buffer_device_address(true));

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        pd.features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(true)
            .geometry_shader(true);
        pd.available_extensions = vec![
            ash::khr::swapchain::NAME.to_owned(),
            ash::khr::portability_subset::NAME.to_owned(),
        ];
        criteria.fill_out(&mut pd);

        assert_eq!(pd.features.geometry_shader, vk::FALSE);
        assert_eq!(pd.features.sampler_anisotropy, vk::TRUE);
        assert_eq!(pd.extended_features.len(), 1);
        assert_eq!(
            pd.extensions_to_enable,
            vec![
                ash::khr::swapchain::NAME.to_owned(),
                ash::khr::portability_subset::NAME.to_owned(),
            ]
        );

        criteria.enable_portability_subset = false;
        criteria.fill_out(&mut pd);
        assert_eq!(pd.extensions_to_enable, vec![ash::khr::swapchain::NAME.to_owned()]);
    }

    #[test]
    fn fixture_has_combined_queue() {
        let pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        assert_eq!(pd.queue_families[0].queue_flags, ALL_QUEUES);
    }

    #[test]
    fn missing_surface_fails_unless_deferred_or_headless() {
        let surface = vk::SurfaceKHR::from_raw(1);
        let mut criteria = criteria();
        assert!(criteria.check_surface(vk::SurfaceKHR::null()).is_ok());

        criteria.require_present = true;
        assert!(matches!(
            criteria.check_surface(vk::SurfaceKHR::null()),
            Err(PhysicalDeviceError::NoSurfaceProvided)
        ));
        assert!(criteria.check_surface(surface).is_ok());

        criteria.defer_surface_initialization = true;
        assert!(criteria.check_surface(vk::SurfaceKHR::null()).is_ok());
    }

    #[test]
    fn unconditional_selection_takes_the_first_device() {
        let mut criteria = criteria();
        criteria.name = Some("nothing matches".to_string());
        criteria
            .required_extensions
            .push(ash::khr::swapchain::NAME.to_owned());

        let devices = vec![
            device("first", vk::PhysicalDeviceType::CPU),
            device("second", vk::PhysicalDeviceType::DISCRETE_GPU),
        ];
        assert!(criteria.evaluate(devices.clone()).is_empty());

        criteria.use_first_gpu_unconditionally = true;
        let selected = criteria.evaluate(devices);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].name, "first");
        assert_eq!(selected[0].suitability, Suitable::Yes);
        assert_eq!(
            selected[0].extensions_to_enable,
            vec![ash::khr::swapchain::NAME.to_owned()]
        );
    }

    #[test]
    fn evaluate_classifies_before_ranking() {
        let mut criteria = criteria();
        criteria.allow_any_type = false;

        let devices = vec![
            device("igpu", vk::PhysicalDeviceType::INTEGRATED_GPU),
            device("dgpu", vk::PhysicalDeviceType::DISCRETE_GPU),
        ];
        let ranked = criteria.evaluate(devices);
        let order: Vec<_> = ranked.iter().map(|pd| (pd.name.as_str(), pd.suitability)).collect();
        assert_eq!(order, [("dgpu", Suitable::Yes), ("igpu", Suitable::Partial)]);
    }

    #[test]
    fn required_features_accumulate() {
        let mut criteria = criteria();
        criteria.add_required_features(&vk::PhysicalDeviceFeatures::default().geometry_shader(true));
        criteria.add_required_features(
            &vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true),
        );
        assert_eq!(criteria.required_features.geometry_shader, vk::TRUE);
        assert_eq!(criteria.required_features.sampler_anisotropy, vk::TRUE);

        let mut pd = device("gpu", vk::PhysicalDeviceType::DISCRETE_GPU);
        pd.features = vk::PhysicalDeviceFeatures::default().geometry_shader(true);
        assert_eq!(criteria.classify(&pd), Suitable::No);
    }
}
