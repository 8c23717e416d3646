//! Builders that sequence Vulkan setup.
//!
//! This crate provides:
//! - A snapshot of what the loader offers ([`SystemInfo`])
//! - Instance creation with version negotiation and a debug messenger
//! - Physical device selection and ranking
//! - Logical device creation and queue lookup
//! - Swapchain negotiation, creation and image views
//!
//! Setup runs in this order:
//!
//! ```no_run
//! # fn main() -> vkboot::Result<()> {
//! let instance = vkboot::InstanceBuilder::new()
//!     .app_name("demo")
//!     .headless(true)
//!     .request_validation_layers(true)
//!     .use_default_debug_messenger()
//!     .build()?;
//! let physical_device = vkboot::PhysicalDeviceSelector::new(&instance).select()?;
//! let device = vkboot::DeviceBuilder::new(&instance, &physical_device).build()?;
//! unsafe {
//!     device.destroy();
//!     instance.destroy();
//! }
//! # Ok(())
//! # }
//! ```

pub mod debug;
pub mod device;
pub mod error;
pub mod feature_chain;
mod feature_structs;
pub mod features;
pub mod instance;
pub mod physical_device;
mod pnext;
pub mod queue;
pub mod selector;
pub mod surface;
pub mod swapchain;
pub mod system_info;
pub mod version;

pub use debug::default_debug_callback;
pub use device::{Device, DeviceBuilder};
pub use error::{
    DeviceError, Error, InstanceError, PhysicalDeviceError, QueueError, Result,
    SurfaceSupportError, SwapchainError,
};
pub use feature_chain::{FeatureChain, FeatureNode, FeatureStruct};
pub use instance::{Instance, InstanceBuilder};
pub use physical_device::{PhysicalDevice, Suitable};
pub use queue::{CustomQueueDescription, QueueType};
pub use selector::{PhysicalDeviceSelector, SelectionCriteria};
pub use surface::SurfaceSupportDetails;
pub use swapchain::{Swapchain, SwapchainBuilder};
pub use system_info::SystemInfo;
pub use version::ApiVersion;

pub use ash;
