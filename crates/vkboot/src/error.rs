//! Error types for every bootstrap stage.

use crate::version::ApiVersion;
use ash::vk;
use thiserror::Error;

/// Errors raised while querying the loader or creating an instance.
#[derive(Error, Debug)]
pub enum InstanceError {
    /// The Vulkan loader could not be loaded.
    #[error("Vulkan loader unavailable")]
    VulkanUnavailable(#[source] ash::LoadingError),

    /// The loader does not reach the requested API version.
    #[error("Vulkan {requested} is unavailable, loader supports {available}")]
    VulkanVersionUnavailable {
        requested: ApiVersion,
        available: ApiVersion,
    },

    /// Vulkan 1.1 was requested but the loader is older.
    #[error("Vulkan 1.1 is unavailable, loader supports {available}")]
    VulkanVersion11Unavailable { available: ApiVersion },

    /// Vulkan 1.2 was requested but the loader is older.
    #[error("Vulkan 1.2 is unavailable, loader supports {available}")]
    VulkanVersion12Unavailable { available: ApiVersion },

    /// Vulkan 1.3 was requested but the loader is older.
    #[error("Vulkan 1.3 is unavailable, loader supports {available}")]
    VulkanVersion13Unavailable { available: ApiVersion },

    /// Vulkan 1.4 was requested but the loader is older.
    #[error("Vulkan 1.4 is unavailable, loader supports {available}")]
    VulkanVersion14Unavailable { available: ApiVersion },

    /// `vkCreateInstance` failed.
    #[error("Failed to create instance")]
    FailedCreateInstance(#[source] vk::Result),

    /// `vkCreateDebugUtilsMessengerEXT` failed.
    #[error("Failed to create debug messenger")]
    FailedCreateDebugMessenger(#[source] vk::Result),

    /// Some requested layers are not available.
    #[error("Requested layers not present: {0:?}")]
    RequestedLayersNotPresent(Vec<String>),

    /// Some requested extensions are not available.
    #[error("Requested extensions not present: {0:?}")]
    RequestedExtensionsNotPresent(Vec<String>),

    /// No usable window-system surface extensions were found.
    #[error("Windowing extensions not present")]
    WindowingExtensionsNotPresent,

    /// An application or engine name contained an interior nul byte.
    #[error("Invalid name: {0}")]
    InvalidName(#[from] std::ffi::NulError),

    /// The window did not provide usable raw handles.
    #[error("Window handle unavailable")]
    WindowHandleUnavailable(#[from] raw_window_handle::HandleError),

    /// Surface creation through the window system failed.
    #[error("Failed to create surface")]
    FailedCreateSurface(#[source] vk::Result),
}

/// Errors raised while selecting a physical device.
#[derive(Error, Debug)]
pub enum PhysicalDeviceError {
    /// Presentation is required but no surface was given.
    #[error("No surface provided")]
    NoSurfaceProvided,

    /// `vkEnumeratePhysicalDevices` failed.
    #[error("Failed to enumerate physical devices")]
    FailedEnumeratePhysicalDevices(#[source] vk::Result),

    /// The instance exposes no physical devices.
    #[error("No physical devices found")]
    NoPhysicalDevicesFound,

    /// No device satisfies the selection criteria.
    #[error("No suitable device")]
    NoSuitableDevice,
}

/// Errors raised when looking up queues on a device.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// No family can present to the surface.
    #[error("Present queue unavailable")]
    PresentUnavailable,

    /// No family supports graphics.
    #[error("Graphics queue unavailable")]
    GraphicsUnavailable,

    /// No family matches the requested compute queue kind.
    #[error("Compute queue unavailable")]
    ComputeUnavailable,

    /// No family matches the requested transfer queue kind.
    #[error("Transfer queue unavailable")]
    TransferUnavailable,

    /// The family has fewer queues than the requested index.
    #[error("Queue index out of range")]
    QueueIndexOutOfRange,

    /// The family index is past the last queue family.
    #[error("Invalid queue family index")]
    InvalidQueueFamilyIndex,
}

/// Errors raised while creating a logical device.
#[derive(Error, Debug)]
pub enum DeviceError {
    /// `vkCreateDevice` failed.
    #[error("Failed to create device")]
    FailedCreateDevice(#[source] vk::Result),

    /// A `VkPhysicalDeviceFeatures2` was pushed manually while extension
    /// features were also requested through the selector.
    #[error(
        "VkPhysicalDeviceFeatures2 in pNext chain while using required extension features"
    )]
    Features2InPNextChainWhileUsingExtensionFeatures,
}

/// Errors raised while querying what a surface supports.
#[derive(Error, Debug)]
pub enum SurfaceSupportError {
    /// The surface handle is null.
    #[error("Surface handle is null")]
    SurfaceHandleNull,

    /// `vkGetPhysicalDeviceSurfaceCapabilitiesKHR` failed.
    #[error("Failed to get surface capabilities")]
    FailedGetSurfaceCapabilities(#[source] vk::Result),

    /// `vkGetPhysicalDeviceSurfaceFormatsKHR` failed.
    #[error("Failed to enumerate surface formats")]
    FailedEnumerateSurfaceFormats(#[source] vk::Result),

    /// `vkGetPhysicalDeviceSurfacePresentModesKHR` failed.
    #[error("Failed to enumerate present modes")]
    FailedEnumeratePresentModes(#[source] vk::Result),

    /// The surface reports no formats to choose from.
    #[error("No suitable desired format")]
    NoSuitableDesiredFormat,
}

/// Errors raised while creating a swapchain or its image views.
#[derive(Error, Debug)]
pub enum SwapchainError {
    /// Neither the builder nor the device carries a surface.
    #[error("Surface handle not provided")]
    SurfaceHandleNotProvided,

    /// The surface support query failed.
    #[error("Failed to query surface support details")]
    FailedQuerySurfaceSupportDetails(#[source] SurfaceSupportError),

    /// `vkCreateSwapchainKHR` failed.
    #[error("Failed to create swapchain")]
    FailedCreateSwapchain(#[source] vk::Result),

    /// `vkGetSwapchainImagesKHR` failed.
    #[error("Failed to get swapchain images")]
    FailedGetSwapchainImages(#[source] vk::Result),

    /// `vkCreateImageView` failed for one of the swapchain images.
    #[error("Failed to create swapchain image views")]
    FailedCreateSwapchainImageViews(#[source] vk::Result),

    /// The required image count is below what the surface demands.
    #[error("Required min image count {required} is below the surface minimum {minimum}")]
    RequiredMinImageCountTooLow { required: u32, minimum: u32 },

    /// The present mode needs usage flags the surface does not support.
    #[error("Image usage {requested:?} not supported, surface allows {supported:?}")]
    RequiredUsageNotSupported {
        requested: vk::ImageUsageFlags,
        supported: vk::ImageUsageFlags,
    },
}

/// Any error raised by this crate.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Instance(#[from] InstanceError),
    #[error(transparent)]
    PhysicalDevice(#[from] PhysicalDeviceError),
    #[error(transparent)]
    Queue(#[from] QueueError),
    #[error(transparent)]
    Device(#[from] DeviceError),
    #[error(transparent)]
    Swapchain(#[from] SwapchainError),
    #[error(transparent)]
    SurfaceSupport(#[from] SurfaceSupportError),
}

/// Result type alias.
pub type Result<T> = std::result::Result<T, Error>;
