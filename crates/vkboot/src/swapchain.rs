//! Swapchain creation.
//!
//! [`SwapchainBuilder`] negotiates image count, format, extent and present
//! mode against what the surface reports, then creates the swapchain.
//! Recreating on resize is done by building again with
//! [`SwapchainBuilder::old_swapchain`]; the old swapchain is left for the
//! caller to destroy.

use crate::device::Device;
use crate::error::{Result, SwapchainError};
use crate::pnext;
use crate::queue::QueueType;
use crate::surface::{
    calculate_extent, is_unextended_present_mode, select_present_mode, select_surface_format,
    SurfaceSupportDetails,
};
use crate::version::ApiVersion;
use ash::vk;
use std::ffi::c_void;
use std::marker::PhantomData;

/// Formats tried when none are configured, most preferred first.
pub const DEFAULT_FORMATS: [vk::SurfaceFormatKHR; 2] = [
    vk::SurfaceFormatKHR {
        format: vk::Format::B8G8R8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
    vk::SurfaceFormatKHR {
        format: vk::Format::R8G8B8A8_SRGB,
        color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
    },
];

/// Present modes tried when none are configured, most preferred first.
pub const DEFAULT_PRESENT_MODES: [vk::PresentModeKHR; 2] =
    [vk::PresentModeKHR::MAILBOX, vk::PresentModeKHR::FIFO];

/// Negotiable swapchain parameters.
#[derive(Clone, Debug)]
pub struct SwapchainConfig {
    pub(crate) desired_formats: Vec<vk::SurfaceFormatKHR>,
    pub(crate) desired_present_modes: Vec<vk::PresentModeKHR>,
    pub(crate) desired_extent: vk::Extent2D,
    /// 0 when unset.
    pub(crate) desired_min_image_count: u32,
    /// 0 when unset.
    pub(crate) required_min_image_count: u32,
    pub(crate) array_layer_count: u32,
    pub(crate) image_usage: vk::ImageUsageFlags,
    pub(crate) pre_transform: vk::SurfaceTransformFlagsKHR,
    pub(crate) composite_alpha: vk::CompositeAlphaFlagsKHR,
    pub(crate) clipped: bool,
    pub(crate) create_flags: vk::SwapchainCreateFlagsKHR,
}

impl Default for SwapchainConfig {
    fn default() -> Self {
        Self {
            desired_formats: Vec::new(),
            desired_present_modes: Vec::new(),
            desired_extent: vk::Extent2D {
                width: 256,
                height: 256,
            },
            desired_min_image_count: 0,
            required_min_image_count: 0,
            array_layer_count: 1,
            image_usage: vk::ImageUsageFlags::COLOR_ATTACHMENT,
            pre_transform: vk::SurfaceTransformFlagsKHR::empty(),
            composite_alpha: vk::CompositeAlphaFlagsKHR::OPAQUE,
            clipped: true,
            create_flags: vk::SwapchainCreateFlagsKHR::empty(),
        }
    }
}

/// Parameters resolved against a surface.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SwapchainPlan {
    pub(crate) image_count: u32,
    pub(crate) surface_format: vk::SurfaceFormatKHR,
    pub(crate) extent: vk::Extent2D,
    pub(crate) array_layers: u32,
    pub(crate) pre_transform: vk::SurfaceTransformFlagsKHR,
    pub(crate) present_mode: vk::PresentModeKHR,
}

impl SwapchainConfig {
    /// Resolve every parameter against `details`.
    pub(crate) fn negotiate(
        &self,
        details: &SurfaceSupportDetails,
    ) -> std::result::Result<SwapchainPlan, SwapchainError> {
        let caps = &details.capabilities;

        let image_count = self.image_count(caps)?;

        let desired_formats: &[vk::SurfaceFormatKHR] = if self.desired_formats.is_empty() {
            &DEFAULT_FORMATS
        } else {
            &self.desired_formats
        };
        let surface_format = select_surface_format(&details.formats, desired_formats)
            .map_err(SwapchainError::FailedQuerySurfaceSupportDetails)?;

        let extent = calculate_extent(caps, self.desired_extent);

        let array_layers = self.array_layer_count.max(1).min(caps.max_image_array_layers.max(1));

        let pre_transform = if self.pre_transform.is_empty() {
            caps.current_transform
        } else {
            self.pre_transform
        };

        let desired_modes: &[vk::PresentModeKHR] = if self.desired_present_modes.is_empty() {
            &DEFAULT_PRESENT_MODES
        } else {
            &self.desired_present_modes
        };
        let present_mode = select_present_mode(&details.present_modes, desired_modes);

        if is_unextended_present_mode(present_mode)
            && !caps.supported_usage_flags.contains(self.image_usage)
        {
            return Err(SwapchainError::RequiredUsageNotSupported {
                requested: self.image_usage,
                supported: caps.supported_usage_flags,
            });
        }

        Ok(SwapchainPlan {
            image_count,
            surface_format,
            extent,
            array_layers,
            pre_transform,
            present_mode,
        })
    }

    fn image_count(
        &self,
        caps: &vk::SurfaceCapabilitiesKHR,
    ) -> std::result::Result<u32, SwapchainError> {
        let mut count = if self.required_min_image_count >= 1 {
            if self.required_min_image_count < caps.min_image_count {
                return Err(SwapchainError::RequiredMinImageCountTooLow {
                    required: self.required_min_image_count,
                    minimum: caps.min_image_count,
                });
            }
            self.required_min_image_count
        } else {
            (caps.min_image_count + 1).max(self.desired_min_image_count)
        };
        if caps.max_image_count > 0 {
            count = count.min(caps.max_image_count);
        }
        Ok(count)
    }
}

/// The surface loader to build with, or an error when there is no surface.
fn require_surface<L>(
    surface: vk::SurfaceKHR,
    loader: Option<&L>,
) -> std::result::Result<&L, SwapchainError> {
    if surface == vk::SurfaceKHR::null() {
        return Err(SwapchainError::SurfaceHandleNotProvided);
    }
    loader.ok_or(SwapchainError::SurfaceHandleNotProvided)
}

/// Images are shared between families only when graphics and present differ.
fn image_sharing_mode(graphics: u32, present: u32) -> vk::SharingMode {
    if graphics == present {
        vk::SharingMode::EXCLUSIVE
    } else {
        vk::SharingMode::CONCURRENT
    }
}

/// Whether image views get an `ImageViewUsageCreateInfo` carrying the
/// swapchain usage. Needs Vulkan 1.1 and is skipped when the caller chained one.
fn needs_view_usage_info(instance_version: ApiVersion, caller_provided: bool) -> bool {
    instance_version >= ApiVersion::V1_1 && !caller_provided
}

/// Builder for a [`Swapchain`].
pub struct SwapchainBuilder<'a> {
    device: &'a Device,
    surface: vk::SurfaceKHR,
    graphics_queue_index: Option<u32>,
    present_queue_index: Option<u32>,
    config: SwapchainConfig,
    old_swapchain: vk::SwapchainKHR,
    p_next: Vec<*mut vk::BaseOutStructure<'static>>,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
    _marker: PhantomData<&'a mut ()>,
}

impl<'a> SwapchainBuilder<'a> {
    pub const SINGLE_BUFFERING: u32 = 1;
    pub const DOUBLE_BUFFERING: u32 = 2;
    pub const TRIPLE_BUFFERING: u32 = 3;

    /// Build for the device's own surface.
    pub fn new(device: &'a Device) -> Self {
        Self::with_surface(device, device.surface())
    }

    /// Build for `surface` instead of the device's surface.
    pub fn with_surface(device: &'a Device, surface: vk::SurfaceKHR) -> Self {
        Self {
            device,
            surface,
            graphics_queue_index: None,
            present_queue_index: None,
            config: SwapchainConfig::default(),
            old_swapchain: vk::SwapchainKHR::null(),
            p_next: Vec::new(),
            allocation_callbacks: device.allocation_callbacks().copied(),
            _marker: PhantomData,
        }
    }

    /// Use explicit graphics and present families instead of looking them up.
    pub fn with_queue_families(
        device: &'a Device,
        surface: vk::SurfaceKHR,
        graphics_queue_index: u32,
        present_queue_index: u32,
    ) -> Self {
        let mut builder = Self::with_surface(device, surface);
        builder.graphics_queue_index = Some(graphics_queue_index);
        builder.present_queue_index = Some(present_queue_index);
        builder
    }

    /// Swapchain being replaced. It stays valid and is left for the caller to destroy.
    pub fn old_swapchain(mut self, old: vk::SwapchainKHR) -> Self {
        self.old_swapchain = old;
        self
    }

    /// Extent used when the surface lets the swapchain pick one.
    pub fn desired_extent(mut self, width: u32, height: u32) -> Self {
        self.config.desired_extent = vk::Extent2D { width, height };
        self
    }

    /// Try `format` before every other format.
    pub fn desired_format(mut self, format: vk::SurfaceFormatKHR) -> Self {
        self.config.desired_formats.insert(0, format);
        self
    }

    /// Try `format` after every other format.
    pub fn add_fallback_format(mut self, format: vk::SurfaceFormatKHR) -> Self {
        self.config.desired_formats.push(format);
        self
    }

    pub fn use_default_format_selection(mut self) -> Self {
        self.config.desired_formats = DEFAULT_FORMATS.to_vec();
        self
    }

    /// Try `mode` before every other present mode.
    pub fn desired_present_mode(mut self, mode: vk::PresentModeKHR) -> Self {
        self.config.desired_present_modes.insert(0, mode);
        self
    }

    /// Try `mode` after every other present mode.
    pub fn add_fallback_present_mode(mut self, mode: vk::PresentModeKHR) -> Self {
        self.config.desired_present_modes.push(mode);
        self
    }

    pub fn use_default_present_mode_selection(mut self) -> Self {
        self.config.desired_present_modes = DEFAULT_PRESENT_MODES.to_vec();
        self
    }

    /// Replace the image usage. Color attachment by default.
    pub fn image_usage_flags(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.config.image_usage = usage;
        self
    }

    pub fn add_image_usage_flags(mut self, usage: vk::ImageUsageFlags) -> Self {
        self.config.image_usage |= usage;
        self
    }

    pub fn use_default_image_usage_flags(mut self) -> Self {
        self.config.image_usage = vk::ImageUsageFlags::COLOR_ATTACHMENT;
        self
    }

    /// Array layers per image, clamped to what the surface allows.
    pub fn image_array_layer_count(mut self, count: u32) -> Self {
        self.config.array_layer_count = count;
        self
    }

    /// Preferred image count. Raised to one above the surface minimum.
    pub fn desired_min_image_count(mut self, count: u32) -> Self {
        self.config.desired_min_image_count = count;
        self
    }

    /// Exact image count. Fails the build when below the surface minimum.
    pub fn required_min_image_count(mut self, count: u32) -> Self {
        self.config.required_min_image_count = count;
        self
    }

    pub fn clipped(mut self, clipped: bool) -> Self {
        self.config.clipped = clipped;
        self
    }

    pub fn create_flags(mut self, flags: vk::SwapchainCreateFlagsKHR) -> Self {
        self.config.create_flags = flags;
        self
    }

    /// Transform applied before presentation. Defaults to the current surface transform.
    pub fn pre_transform_flags(mut self, transform: vk::SurfaceTransformFlagsKHR) -> Self {
        self.config.pre_transform = transform;
        self
    }

    pub fn composite_alpha_flags(mut self, alpha: vk::CompositeAlphaFlagsKHR) -> Self {
        self.config.composite_alpha = alpha;
        self
    }

    /// Append a struct to the swapchain create-info chain.
    pub fn push_next<T>(mut self, next: &'a mut T) -> Self
    where
        T: vk::ExtendsSwapchainCreateInfoKHR + vk::TaggedStructure,
    {
        self.p_next.push(pnext::erase(next));
        self
    }

    /// Allocation callbacks for the swapchain and its image views.
    pub fn allocation_callbacks(mut self, callbacks: vk::AllocationCallbacks<'static>) -> Self {
        self.allocation_callbacks = Some(callbacks);
        self
    }

    /// Get the parameters that will be negotiated.
    pub fn config(&self) -> &SwapchainConfig {
        &self.config
    }

    /// Negotiate against the surface and create the swapchain.
    pub fn build(self) -> Result<Swapchain> {
        let surface_loader = require_surface(self.surface, self.device.surface_loader())?;
        let loader = self
            .device
            .swapchain_loader()
            .ok_or(SwapchainError::FailedCreateSwapchain(
                vk::Result::ERROR_EXTENSION_NOT_PRESENT,
            ))?;

        let physical_device = self.device.physical_device().handle();
        // SAFETY: the device and surface come from the same instance.
        let details =
            unsafe { SurfaceSupportDetails::query(surface_loader, physical_device, self.surface) }
                .map_err(SwapchainError::FailedQuerySurfaceSupportDetails)?;

        let plan = self.config.negotiate(&details)?;

        let graphics = match self.graphics_queue_index {
            Some(index) => index,
            None => self.device.queue_index(QueueType::Graphics)?,
        };
        let present = match self.present_queue_index {
            Some(index) => index,
            None => self.device.queue_index(QueueType::Present)?,
        };
        let queue_families = [graphics, present];

        // SAFETY: every pushed struct is borrowed for `'a`.
        let user_chain = unsafe { pnext::link(&self.p_next) };

        let mut info = vk::SwapchainCreateInfoKHR::default()
            .flags(self.config.create_flags)
            .surface(self.surface)
            .min_image_count(plan.image_count)
            .image_format(plan.surface_format.format)
            .image_color_space(plan.surface_format.color_space)
            .image_extent(plan.extent)
            .image_array_layers(plan.array_layers)
            .image_usage(self.config.image_usage)
            .pre_transform(plan.pre_transform)
            .composite_alpha(self.config.composite_alpha)
            .present_mode(plan.present_mode)
            .clipped(self.config.clipped)
            .old_swapchain(self.old_swapchain);
        let sharing_mode = image_sharing_mode(graphics, present);
        info = info.image_sharing_mode(sharing_mode);
        if sharing_mode == vk::SharingMode::CONCURRENT {
            info = info.queue_family_indices(&queue_families);
        }
        info.p_next = user_chain;

        let callbacks = self.allocation_callbacks.as_ref();
        // SAFETY: `info` only borrows data that outlives the call.
        let handle = unsafe { loader.create_swapchain(&info, callbacks) }
            .map_err(SwapchainError::FailedCreateSwapchain)?;

        let images = match unsafe { loader.get_swapchain_images(handle) } {
            Ok(images) => images,
            Err(e) => {
                // SAFETY: the swapchain was just created and is unused.
                unsafe { loader.destroy_swapchain(handle, callbacks) };
                return Err(SwapchainError::FailedGetSwapchainImages(e).into());
            }
        };

        tracing::info!(
            "Created swapchain: {:?} {}x{} {:?}, {} images",
            plan.surface_format.format,
            plan.extent.width,
            plan.extent.height,
            plan.present_mode,
            images.len()
        );

        Ok(Swapchain {
            handle,
            device: self.device.device().clone(),
            loader: loader.clone(),
            image_format: plan.surface_format.format,
            color_space: plan.surface_format.color_space,
            image_usage: self.config.image_usage,
            extent: plan.extent,
            present_mode: plan.present_mode,
            image_count: u32::try_from(images.len()).unwrap_or(u32::MAX),
            requested_min_image_count: plan.image_count,
            instance_version: self.device.instance_version(),
            allocation_callbacks: self.allocation_callbacks,
        })
    }
}

/// A swapchain and its negotiated parameters.
pub struct Swapchain {
    handle: vk::SwapchainKHR,
    device: ash::Device,
    loader: ash::khr::swapchain::Device,
    image_format: vk::Format,
    color_space: vk::ColorSpaceKHR,
    image_usage: vk::ImageUsageFlags,
    extent: vk::Extent2D,
    present_mode: vk::PresentModeKHR,
    image_count: u32,
    requested_min_image_count: u32,
    instance_version: ApiVersion,
    allocation_callbacks: Option<vk::AllocationCallbacks<'static>>,
}

impl Swapchain {
    /// Get the raw swapchain handle.
    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    /// Get the negotiated image format.
    pub fn image_format(&self) -> vk::Format {
        self.image_format
    }

    pub fn color_space(&self) -> vk::ColorSpaceKHR {
        self.color_space
    }

    pub fn image_usage(&self) -> vk::ImageUsageFlags {
        self.image_usage
    }

    /// Get the negotiated image extent.
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    /// Get the negotiated present mode.
    pub fn present_mode(&self) -> vk::PresentModeKHR {
        self.present_mode
    }

    /// Number of images the driver actually created.
    pub fn image_count(&self) -> u32 {
        self.image_count
    }

    /// Image count passed to the driver as the minimum.
    pub fn requested_min_image_count(&self) -> u32 {
        self.requested_min_image_count
    }

    /// Get the swapchain extension loader, for acquire and present.
    pub fn loader(&self) -> &ash::khr::swapchain::Device {
        &self.loader
    }

    /// Get the swapchain images.
    pub fn images(&self) -> Result<Vec<vk::Image>> {
        // SAFETY: the swapchain is alive until `destroy`.
        let images = unsafe { self.loader.get_swapchain_images(self.handle) }
            .map_err(SwapchainError::FailedGetSwapchainImages)?;
        Ok(images)
    }

    /// One 2D color view per swapchain image.
    pub fn image_views(&self) -> Result<Vec<vk::ImageView>> {
        self.create_image_views(std::ptr::null())
    }

    /// Like [`Self::image_views`] with `next` chained into every create-info.
    pub fn image_views_with<T>(&self, next: &mut T) -> Result<Vec<vk::ImageView>>
    where
        T: vk::ExtendsImageViewCreateInfo + vk::TaggedStructure,
    {
        let structs = [pnext::erase(next)];
        // SAFETY: `next` is borrowed for the whole call.
        let chain = unsafe { pnext::link(&structs) };
        self.create_image_views(chain)
    }

    fn create_image_views(&self, user_chain: *const c_void) -> Result<Vec<vk::ImageView>> {
        let images = self.images()?;

        // SAFETY: `user_chain` is null or a live chain borrowed by the caller.
        let has_usage = unsafe {
            pnext::chain_contains(user_chain, vk::StructureType::IMAGE_VIEW_USAGE_CREATE_INFO)
        };
        let add_usage = needs_view_usage_info(self.instance_version, has_usage);

        let mut views = Vec::with_capacity(images.len());
        for image in images {
            let mut usage = vk::ImageViewUsageCreateInfo::default().usage(self.image_usage);
            usage.p_next = user_chain;

            let mut info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.image_format)
                .components(vk::ComponentMapping::default())
                .subresource_range(
                    vk::ImageSubresourceRange::default()
                        .aspect_mask(vk::ImageAspectFlags::COLOR)
                        .base_mip_level(0)
                        .level_count(1)
                        .base_array_layer(0)
                        .layer_count(1),
                );
            info.p_next = if add_usage {
                std::ptr::from_ref(&usage).cast()
            } else {
                user_chain
            };

            // SAFETY: `image` belongs to this swapchain.
            match unsafe {
                self.device
                    .create_image_view(&info, self.allocation_callbacks.as_ref())
            } {
                Ok(view) => views.push(view),
                Err(e) => {
                    // SAFETY: the views were just created and are unused.
                    unsafe { self.destroy_image_views(&views) };
                    return Err(SwapchainError::FailedCreateSwapchainImageViews(e).into());
                }
            }
        }
        Ok(views)
    }

    /// Destroy views returned by [`Self::image_views`].
    ///
    /// # Safety
    /// The views must not be in use.
    pub unsafe fn destroy_image_views(&self, views: &[vk::ImageView]) {
        for &view in views {
            unsafe {
                self.device
                    .destroy_image_view(view, self.allocation_callbacks.as_ref());
            }
        }
    }

    /// Destroy the swapchain. Its images go with it.
    ///
    /// # Safety
    /// The swapchain must not be in use and its views must already be destroyed.
    pub unsafe fn destroy(&self) {
        unsafe {
            self.loader
                .destroy_swapchain(self.handle, self.allocation_callbacks.as_ref());
        }
    }
}
