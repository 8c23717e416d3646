//! Surface support queries and swapchain parameter negotiation.

use crate::error::SurfaceSupportError;
use ash::vk;

/// What a physical device can present to a surface.
#[derive(Clone, Debug, Default)]
pub struct SurfaceSupportDetails {
    pub capabilities: vk::SurfaceCapabilitiesKHR,
    pub formats: Vec<vk::SurfaceFormatKHR>,
    pub present_modes: Vec<vk::PresentModeKHR>,
}

impl SurfaceSupportDetails {
    /// Query capabilities, formats and present modes.
    ///
    /// # Safety
    /// `physical_device` and `surface` must belong to the instance `loader`
    /// was created from.
    pub unsafe fn query(
        loader: &ash::khr::surface::Instance,
        physical_device: vk::PhysicalDevice,
        surface: vk::SurfaceKHR,
    ) -> Result<Self, SurfaceSupportError> {
        if surface == vk::SurfaceKHR::null() {
            return Err(SurfaceSupportError::SurfaceHandleNull);
        }

        let capabilities =
            unsafe { loader.get_physical_device_surface_capabilities(physical_device, surface) }
                .map_err(SurfaceSupportError::FailedGetSurfaceCapabilities)?;
        let formats = unsafe { loader.get_physical_device_surface_formats(physical_device, surface) }
            .map_err(SurfaceSupportError::FailedEnumerateSurfaceFormats)?;
        let present_modes =
            unsafe { loader.get_physical_device_surface_present_modes(physical_device, surface) }
                .map_err(SurfaceSupportError::FailedEnumeratePresentModes)?;

        Ok(Self {
            capabilities,
            formats,
            present_modes,
        })
    }
}

/// First desired format the surface offers, in desired order.
pub fn find_desired_surface_format(
    available: &[vk::SurfaceFormatKHR],
    desired: &[vk::SurfaceFormatKHR],
) -> Option<vk::SurfaceFormatKHR> {
    desired.iter().copied().find(|wanted| {
        available
            .iter()
            .any(|format| format.format == wanted.format && format.color_space == wanted.color_space)
    })
}

/// Select the best surface format.
///
/// Falls back to the first available format when none of `desired` is
/// offered.
pub fn select_surface_format(
    available: &[vk::SurfaceFormatKHR],
    desired: &[vk::SurfaceFormatKHR],
) -> Result<vk::SurfaceFormatKHR, SurfaceSupportError> {
    find_desired_surface_format(available, desired)
        .or_else(|| available.first().copied())
        .ok_or(SurfaceSupportError::NoSuitableDesiredFormat)
}

/// Select the best present mode. FIFO is always supported.
pub fn select_present_mode(
    available: &[vk::PresentModeKHR],
    desired: &[vk::PresentModeKHR],
) -> vk::PresentModeKHR {
    desired
        .iter()
        .copied()
        .find(|mode| available.contains(mode))
        .unwrap_or(vk::PresentModeKHR::FIFO)
}

/// Calculate swapchain extent.
pub fn calculate_extent(
    capabilities: &vk::SurfaceCapabilitiesKHR,
    desired: vk::Extent2D,
) -> vk::Extent2D {
    if capabilities.current_extent.width != u32::MAX {
        return capabilities.current_extent;
    }

    let min = capabilities.min_image_extent;
    let max = capabilities.max_image_extent;
    vk::Extent2D {
        width: desired.width.max(min.width).min(max.width),
        height: desired.height.max(min.height).min(max.height),
    }
}

/// Present modes whose images follow the surface's supported usage flags.
pub fn is_unextended_present_mode(mode: vk::PresentModeKHR) -> bool {
    matches!(
        mode,
        vk::PresentModeKHR::IMMEDIATE
            | vk::PresentModeKHR::MAILBOX
            | vk::PresentModeKHR::FIFO
            | vk::PresentModeKHR::FIFO_RELAXED
    )
}
