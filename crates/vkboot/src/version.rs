//! Packed Vulkan API versions.

use ash::vk;
use std::fmt;

/// A packed `VK_MAKE_API_VERSION` value.
///
/// Ordering compares the packed value, so variant-0 versions order by
/// major, then minor, then patch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(u32);

impl ApiVersion {
    pub const V1_0: Self = Self(vk::API_VERSION_1_0);
    pub const V1_1: Self = Self(vk::API_VERSION_1_1);
    pub const V1_2: Self = Self(vk::API_VERSION_1_2);
    pub const V1_3: Self = Self(vk::API_VERSION_1_3);
    pub const V1_4: Self = Self(vk::make_api_version(0, 1, 4, 0));

    /// Build a version from its components.
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self(vk::make_api_version(0, major, minor, patch))
    }

    /// Wrap a raw packed version.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw packed value passed to Vulkan.
    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn major(self) -> u32 {
        vk::api_version_major(self.0)
    }

    pub const fn minor(self) -> u32 {
        vk::api_version_minor(self.0)
    }

    pub const fn patch(self) -> u32 {
        vk::api_version_patch(self.0)
    }
}

impl Default for ApiVersion {
    fn default() -> Self {
        Self::V1_0
    }
}

impl From<u32> for ApiVersion {
    fn from(raw: u32) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}
