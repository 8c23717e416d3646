//! Logical device creation and queue lookup.

use crate::error::{DeviceError, QueueError, Result};
use crate::instance::Instance;
use crate::physical_device::PhysicalDevice;
use crate::pnext;
use crate::queue::{dedicated_queue_index_for, queue_index, CustomQueueDescription, QueueType};
use crate::version::ApiVersion;
use ash::vk;
use std::ffi::CString;
use std::marker::PhantomData;

/// A logical device and what it was created from.
pub struct Device {
    device: ash::Device,
    physical_device: PhysicalDevice,
    surface: vk::SurfaceKHR,
    queue_families: Vec<vk::QueueFamilyProperties>,
    surface_loader: Option<ash::khr::surface::Instance>,
    swapchain_loader: Option<ash::khr::swapchain::Device>,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
    instance_version: ApiVersion,
}

impl Device {
    /// Get the raw device handle.
    pub fn handle(&self) -> vk::Device {
        self.device.handle()
    }

    /// Get the loaded device function table.
    pub fn device(&self) -> &ash::Device {
        &self.device
    }

    /// Get the physical device this device was created on.
    pub fn physical_device(&self) -> &PhysicalDevice {
        &self.physical_device
    }

    /// Get the surface the device was selected for, or null.
    pub fn surface(&self) -> vk::SurfaceKHR {
        self.surface
    }

    /// Get the queue families of the physical device.
    pub fn queue_families(&self) -> &[vk::QueueFamilyProperties] {
        &self.queue_families
    }

    /// Get the loader version the instance was created with.
    pub fn instance_version(&self) -> ApiVersion {
        self.instance_version
    }

    /// Get the allocation callbacks used for device objects.
    pub fn allocation_callbacks(&self) -> Option<&vk::AllocationCallbacks<'static>> {
        self.allocation_callbacks.as_ref()
    }

    pub(crate) fn surface_loader(&self) -> Option<&ash::khr::surface::Instance> {
        self.surface_loader.as_ref()
    }

    /// Present when `VK_KHR_swapchain` was enabled.
    pub fn swapchain_loader(&self) -> Option<&ash::khr::swapchain::Device> {
        self.swapchain_loader.as_ref()
    }

    /// Family index serving `kind`.
    ///
    /// Present looks for the first family able to present to the device's
    /// surface. Compute and transfer prefer families without graphics.
    pub fn queue_index(&self, kind: QueueType) -> Result<u32> {
        let index = queue_index(&self.queue_families, kind, |family| {
            self.supports_present(family)
        })?;
        Ok(index)
    }

    /// Family index serving only `kind`. Compute and transfer only.
    pub fn dedicated_queue_index(&self, kind: QueueType) -> Result<u32> {
        Ok(dedicated_queue_index_for(&self.queue_families, kind)?)
    }

    /// Queue 0 of the family serving `kind`.
    pub fn queue(&self, kind: QueueType) -> Result<vk::Queue> {
        let family = self.queue_index(kind)?;
        self.queue_from_family(family, 0)
    }

    /// Queue 0 of the dedicated family serving `kind`.
    pub fn dedicated_queue(&self, kind: QueueType) -> Result<vk::Queue> {
        let family = self.dedicated_queue_index(kind)?;
        self.queue_from_family(family, 0)
    }

    /// Queue `index` of `family`.
    pub fn queue_from_family(&self, family: u32, index: u32) -> Result<vk::Queue> {
        let properties = self
            .queue_families
            .get(family as usize)
            .ok_or(QueueError::InvalidQueueFamilyIndex)?;
        if index >= properties.queue_count {
            return Err(QueueError::QueueIndexOutOfRange.into());
        }
        // SAFETY: family and index were checked against the device's families.
        Ok(unsafe { self.device.get_device_queue(family, index) })
    }

    fn supports_present(&self, family: u32) -> bool {
        let Some(loader) = &self.surface_loader else {
            return false;
        };
        if self.surface == vk::SurfaceKHR::null() {
            return false;
        }
        // SAFETY: the physical device and surface belong to the same instance.
        unsafe {
            loader.get_physical_device_surface_support(
                self.physical_device.handle,
                family,
                self.surface,
            )
        }
        .unwrap_or(false)
    }

    /// Destroy the logical device.
    ///
    /// # Safety
    /// Every object created from this device must already be destroyed.
    pub unsafe fn destroy(&self) {
        unsafe { self.device.destroy_device(self.allocation_callbacks.as_ref()) };
    }
}

/// Builder for a [`Device`].
pub struct DeviceBuilder<'a> {
    instance: &'a Instance,
    physical_device: &'a PhysicalDevice,
    queue_descriptions: Vec<CustomQueueDescription>,
    p_next: Vec<*mut vk::BaseOutStructure<'static>>,
    user_features2: bool,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
    flags: vk::DeviceCreateFlags,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> DeviceBuilder<'a> {
    /// Create a builder for a selected physical device.
    pub fn new(instance: &'a Instance, physical_device: &'a PhysicalDevice) -> Self {
        Self {
            instance,
            physical_device,
            queue_descriptions: Vec::new(),
            p_next: Vec::new(),
            user_features2: false,
            allocation_callbacks: instance.allocation_callbacks().copied(),
            flags: vk::DeviceCreateFlags::empty(),
            _marker: PhantomData,
        }
    }

    /// Replace the default of one queue per family.
    pub fn custom_queue_setup(mut self, descriptions: Vec<CustomQueueDescription>) -> Self {
        self.queue_descriptions = descriptions;
        self
    }

    /// Append a struct to the device create-info chain.
    ///
    /// A pushed `VkPhysicalDeviceFeatures2` replaces the features the
    /// selector resolved, and cannot be combined with extension features.
    pub fn push_next<T>(mut self, next: &'a mut T) -> Self
    where
        T: vk::ExtendsDeviceCreateInfo + vk::TaggedStructure,
    {
        if T::STRUCTURE_TYPE == vk::StructureType::PHYSICAL_DEVICE_FEATURES_2 {
            self.user_features2 = true;
        }
        self.p_next.push(pnext::erase(next));
        self
    }

    /// Allocation callbacks for the device and its children.
    pub fn allocation_callbacks(mut self, callbacks: vk::AllocationCallbacks<'static>) -> Self {
        self.allocation_callbacks = Some(callbacks);
        self
    }

    pub fn create_flags(mut self, flags: vk::DeviceCreateFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Create the logical device.
    pub fn build(self) -> Result<Device> {
        let pd = self.physical_device;

        let descriptions = if self.queue_descriptions.is_empty() {
            default_queue_descriptions(&pd.queue_families)
        } else {
            self.queue_descriptions.clone()
        };
        let queue_infos: Vec<_> = descriptions
            .iter()
            .map(|description| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(description.index)
                    .queue_priorities(&description.priorities)
            })
            .collect();

        let extensions = device_extensions(pd);
        let extension_ptrs: Vec<_> = extensions.iter().map(|name| name.as_ptr()).collect();
        tracing::debug!("Device extensions: {:?}", extensions);

        let feature_source = feature_source(self.user_features2, pd)?;

        // SAFETY: every pushed struct is borrowed for `'a`.
        let user_chain = unsafe { pnext::link(&self.p_next) };

        let mut info = vk::DeviceCreateInfo::default()
            .flags(self.flags)
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extension_ptrs);
        info.p_next = user_chain;

        let instance = self.instance.instance();
        let callbacks = self.allocation_callbacks.as_ref();
        let created = match feature_source {
            FeatureSource::Features2Chain => {
                let mut chain = pd.extended_features.clone();
                chain.chain_up(pd.features, |features2| {
                    let info = info.push_next(features2);
                    // SAFETY: the chain stays linked for the duration of the call.
                    unsafe { instance.create_device(pd.handle, &info, callbacks) }
                })
            }
            FeatureSource::CallerFeatures2 => {
                // SAFETY: the caller's chain is borrowed for `'a`.
                unsafe { instance.create_device(pd.handle, &info, callbacks) }
            }
            FeatureSource::EnabledFeatures => {
                let info = info.enabled_features(&pd.features);
                // SAFETY: as above.
                unsafe { instance.create_device(pd.handle, &info, callbacks) }
            }
        };
        let device = created.map_err(DeviceError::FailedCreateDevice)?;

        let swapchain_loader = extensions
            .iter()
            .any(|name| name.as_c_str() == ash::khr::swapchain::NAME)
            .then(|| ash::khr::swapchain::Device::new(instance, &device));

        tracing::info!(
            "Created device on {} with {} queue families",
            pd.name,
            queue_infos.len()
        );

        Ok(Device {
            device,
            physical_device: pd.clone(),
            surface: pd.surface,
            queue_families: pd.queue_families.clone(),
            surface_loader: self.instance.surface_loader().cloned(),
            swapchain_loader,
            allocation_callbacks: self.allocation_callbacks,
            instance_version: pd.instance_version,
        })
    }
}

/// One queue with priority 1.0 from every family.
pub(crate) fn default_queue_descriptions(
    families: &[vk::QueueFamilyProperties],
) -> Vec<CustomQueueDescription> {
    (0..families.len())
        .map(|index| {
            CustomQueueDescription::new(u32::try_from(index).unwrap_or(u32::MAX), vec![1.0])
        })
        .collect()
}

/// Extensions the device is created with.
pub(crate) fn device_extensions(pd: &PhysicalDevice) -> Vec<CString> {
    let mut extensions = pd.extensions_to_enable.clone();
    let wants_swapchain =
        pd.surface != vk::SurfaceKHR::null() || pd.defer_surface_initialization;
    if wants_swapchain
        && !extensions
            .iter()
            .any(|name| name.as_c_str() == ash::khr::swapchain::NAME)
    {
        extensions.push(ash::khr::swapchain::NAME.to_owned());
    }
    extensions
}

/// Where the device create-info takes its enabled features from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum FeatureSource {
    /// A `VkPhysicalDeviceFeatures2` built from the selected features, with
    /// the extended feature chain behind it.
    Features2Chain,
    /// A `VkPhysicalDeviceFeatures2` the caller pushed.
    CallerFeatures2,
    /// Legacy `pEnabledFeatures`.
    EnabledFeatures,
}

pub(crate) fn feature_source(
    user_features2: bool,
    pd: &PhysicalDevice,
) -> std::result::Result<FeatureSource, DeviceError> {
    if user_features2 {
        if !pd.extended_features.is_empty() {
            return Err(DeviceError::Features2InPNextChainWhileUsingExtensionFeatures);
        }
        return Ok(FeatureSource::CallerFeatures2);
    }
    if pd.supports_features2() {
        Ok(FeatureSource::Features2Chain)
    } else {
        Ok(FeatureSource::EnabledFeatures)
    }
}
