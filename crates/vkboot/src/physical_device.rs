//! The physical device record produced by selection.

use crate::feature_chain::{FeatureChain, FeatureNode, FeatureStruct};
use crate::features::{combine_features, supports_base_features};
use crate::instance::Instance;
use crate::queue::{dedicated_queue_index, separate_queue_index};
use crate::version::ApiVersion;
use ash::vk;
use std::ffi::{CStr, CString};

/// How well a device matches the selection criteria.
///
/// Ordered best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Suitable {
    Yes,
    Partial,
    No,
}

/// A physical device and what will be enabled on it.
///
/// After selection `features` and `extended_features` hold what the
/// logical device will enable, not everything the device supports.
#[derive(Clone, Debug)]
pub struct PhysicalDevice {
    pub(crate) name: String,
    pub(crate) handle: vk::PhysicalDevice,
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) features: vk::PhysicalDeviceFeatures,
    pub(crate) properties: vk::PhysicalDeviceProperties,
    pub(crate) memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub(crate) queue_families: Vec<vk::QueueFamilyProperties>,
    pub(crate) available_extensions: Vec<CString>,
    pub(crate) extensions_to_enable: Vec<CString>,
    pub(crate) extended_features: FeatureChain,
    pub(crate) present_supported: bool,
    pub(crate) defer_surface_initialization: bool,
    pub(crate) instance_version: ApiVersion,
    pub(crate) properties2_enabled: bool,
    pub(crate) suitability: Suitable,
}

impl PhysicalDevice {
    /// Get the device name reported by the driver.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the raw physical device handle.
    pub fn handle(&self) -> vk::PhysicalDevice {
        self.handle
    }

    /// Get the surface the device was selected for, or null.
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the core features that will be enabled.
    pub fn features(&self) -> &vk::PhysicalDeviceFeatures {
        &self.features
    }

    /// Get the device properties.
    pub fn properties(&self) -> &vk::PhysicalDeviceProperties {
        &self.properties
    }

    /// Get the memory heaps and types.
    pub fn memory_properties(&self) -> &vk::PhysicalDeviceMemoryProperties {
        &self.memory_properties
    }

    /// Get the queue family properties in family index order.
    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_families
    }

    /// Extensions the logical device will be created with.
    pub fn extensions_to_enable(&self) -> &[CString] {
        &self.extensions_to_enable
    }

    /// Get every extension the device supports.
    pub fn available_extensions(&self) -> &[CString] {
        &self.available_extensions
    }

    /// Get the extended feature structs that will be enabled.
    pub fn extended_features(&self) -> &FeatureChain {
        &self.extended_features
    }

    /// Get how well the device matched the selection criteria.
    pub fn suitability(&self) -> Suitable {
        self.suitability
    }

    /// Whether the logical device should enable `VK_KHR_swapchain` without a surface.
    pub fn defer_surface_initialization(&self) -> bool {
        self.defer_surface_initialization
    }

    /// Get the loader version of the owning instance.
    pub fn instance_version(&self) -> ApiVersion {
        self.instance_version
    }

    /// Whether extended features can go through `VkPhysicalDeviceFeatures2`.
    pub fn supports_features2(&self) -> bool {
        self.instance_version >= ApiVersion::V1_1 || self.properties2_enabled
    }

    /// API version reported by the device.
    pub fn api_version(&self) -> ApiVersion {
        ApiVersion::from_raw(self.properties.api_version)
    }

    pub fn device_type(&self) -> vk::PhysicalDeviceType {
        self.properties.device_type
    }

    /// Whether a family supports compute without graphics or transfer.
    pub fn has_dedicated_compute_queue(&self) -> bool {
        dedicated_queue_index(
            &self.queue_families,
            vk::QueueFlags::COMPUTE,
            vk::QueueFlags::TRANSFER,
        )
        .is_some()
    }

    /// Whether a family supports transfer without graphics or compute.
    pub fn has_dedicated_transfer_queue(&self) -> bool {
        dedicated_queue_index(
            &self.queue_families,
            vk::QueueFlags::TRANSFER,
            vk::QueueFlags::COMPUTE,
        )
        .is_some()
    }

    /// Whether a family supports compute without graphics.
    pub fn has_separate_compute_queue(&self) -> bool {
        separate_queue_index(
            &self.queue_families,
            vk::QueueFlags::COMPUTE,
            vk::QueueFlags::TRANSFER,
        )
        .is_some()
    }

    /// Whether a family supports transfer without graphics.
    pub fn has_separate_transfer_queue(&self) -> bool {
        separate_queue_index(
            &self.queue_families,
            vk::QueueFlags::TRANSFER,
            vk::QueueFlags::COMPUTE,
        )
        .is_some()
    }

    /// Whether the device supports the extension `name`.
    pub fn is_extension_present(&self, name: &CStr) -> bool {
        self.available_extensions
            .iter()
            .any(|ext| ext.as_c_str() == name)
    }

    /// Enable `name` if the device exposes it.
    pub fn enable_extension_if_present(&mut self, name: &CStr) -> bool {
        if !self.is_extension_present(name) {
            return false;
        }
        if !self
            .extensions_to_enable
            .iter()
            .any(|ext| ext.as_c_str() == name)
        {
            self.extensions_to_enable.push(name.to_owned());
        }
        true
    }

    /// Enable every name in `names`, but only if all of them are exposed.
    pub fn enable_extensions_if_present(&mut self, names: &[&CStr]) -> bool {
        if !names.iter().all(|name| self.is_extension_present(name)) {
            return false;
        }
        for name in names {
            self.enable_extension_if_present(name);
        }
        true
    }

    /// Enable the requested base features if the device supports all of them.
    pub fn enable_features_if_present(
        &mut self,
        instance: &Instance,
        features: &vk::PhysicalDeviceFeatures,
    ) -> bool {
        // SAFETY: `handle` was enumerated from `instance`.
        let supported = unsafe { instance.instance().get_physical_device_features(self.handle) };
        if !supports_base_features(&supported, features) {
            return false;
        }
        combine_features(&mut self.features, features);
        true
    }

    /// Enable an extended feature struct if the device supports every flag
    /// set in it.
    pub fn enable_extension_features_if_present<T: FeatureStruct>(
        &mut self,
        instance: &Instance,
        features: &T,
    ) -> bool {
        if !instance.supports_features2() {
            return false;
        }

        let mut requested = FeatureChain::new();
        requested.add(features);

        let mut supported = requested.cleared();
        let handle = self.handle;
        supported.chain_up(vk::PhysicalDeviceFeatures::default(), |head| {
            // SAFETY: `head` links only nodes owned by `supported`.
            unsafe { instance.get_physical_device_features2(handle, head) };
        });

        if !supported.find_and_match(&requested) {
            return false;
        }
        self.extended_features.combine(&requested);
        true
    }

    /// Whether `features` is already part of what will be enabled.
    pub fn are_extension_features_present<T: FeatureStruct>(&self, features: &T) -> bool {
        let mut requested = FeatureChain::new();
        requested.add_node(FeatureNode::new(features));
        self.extended_features.find_and_match(&requested)
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use crate::queue::family;

    pub(crate) const ALL_QUEUES: vk::QueueFlags = vk::QueueFlags::from_raw(
        vk::QueueFlags::GRAPHICS.as_raw()
            | vk::QueueFlags::COMPUTE.as_raw()
            | vk::QueueFlags::TRANSFER.as_raw(),
    );

    /// A device with one combined queue family and one 8 GiB device-local heap.
    pub(crate) fn device(name: &str, device_type: vk::PhysicalDeviceType) -> PhysicalDevice {
        let mut properties = vk::PhysicalDeviceProperties::default()
            .device_type(device_type)
            .api_version(vk::API_VERSION_1_3);
        properties = properties.device_name(&CString::new(name).unwrap()).unwrap();

        let mut memory_properties = vk::PhysicalDeviceMemoryProperties::default();
        memory_properties.memory_heap_count = 1;
        memory_properties.memory_heaps[0] = vk::MemoryHeap::default()
            .size(8 << 30)
            .flags(vk::MemoryHeapFlags::DEVICE_LOCAL);

        PhysicalDevice {
            name: name.to_string(),
            handle: vk::PhysicalDevice::null(),
            surface: vk::SurfaceKHR::null(),
            features: vk::PhysicalDeviceFeatures::default(),
            properties,
            memory_properties,
            queue_families: vec![family(ALL_QUEUES, 16)],
            available_extensions: Vec::new(),
            extensions_to_enable: Vec::new(),
            extended_features: FeatureChain::new(),
            present_supported: true,
            defer_surface_initialization: false,
            instance_version: crate::version::ApiVersion::V1_3,
            properties2_enabled: false,
            suitability: Suitable::Yes,
        }
    }
}
