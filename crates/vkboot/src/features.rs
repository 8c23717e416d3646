//! Helpers over the core `VkPhysicalDeviceFeatures` struct.

use crate::feature_chain::FeatureChain;
use ash::vk;
use std::mem;

const BASE_FEATURE_COUNT: usize =
    mem::size_of::<vk::PhysicalDeviceFeatures>() / mem::size_of::<vk::Bool32>();

const _: () = assert!(
    mem::size_of::<vk::PhysicalDeviceFeatures>() % mem::size_of::<vk::Bool32>() == 0
);

fn flags(features: &vk::PhysicalDeviceFeatures) -> &[vk::Bool32; BASE_FEATURE_COUNT] {
    // SAFETY: `PhysicalDeviceFeatures` is `repr(C)` and made only of `Bool32` fields.
    unsafe { &*std::ptr::from_ref(features).cast::<[vk::Bool32; BASE_FEATURE_COUNT]>() }
}

fn flags_mut(features: &mut vk::PhysicalDeviceFeatures) -> &mut [vk::Bool32; BASE_FEATURE_COUNT] {
    // SAFETY: see `flags`.
    unsafe { &mut *std::ptr::from_mut(features).cast::<[vk::Bool32; BASE_FEATURE_COUNT]>() }
}

/// Whether every feature set in `requested` is also set in `supported`.
pub fn supports_base_features(
    supported: &vk::PhysicalDeviceFeatures,
    requested: &vk::PhysicalDeviceFeatures,
) -> bool {
    flags(supported)
        .iter()
        .zip(flags(requested))
        .all(|(&have, &want)| want == vk::FALSE || have != vk::FALSE)
}

/// Base features are implied one flag at a time, extended features must
/// match the device's chain exactly.
pub fn supports_features(
    supported: &vk::PhysicalDeviceFeatures,
    requested: &vk::PhysicalDeviceFeatures,
    supported_extended: &FeatureChain,
    requested_extended: &FeatureChain,
) -> bool {
    supports_base_features(supported, requested) && supported_extended.match_all(requested_extended)
}

/// OR the flags of `other` into `target`.
pub fn combine_features(target: &mut vk::PhysicalDeviceFeatures, other: &vk::PhysicalDeviceFeatures) {
    for (field, &flag) in flags_mut(target).iter_mut().zip(flags(other)) {
        *field |= flag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_features_use_implication() {
        let supported = vk::PhysicalDeviceFeatures::default()
            .geometry_shader(true)
            .sampler_anisotropy(true);

        let subset = vk::PhysicalDeviceFeatures::default().sampler_anisotropy(true);
        assert!(supports_base_features(&supported, &subset));

        let missing = vk::PhysicalDeviceFeatures::default().tessellation_shader(true);
        assert!(!supports_base_features(&supported, &missing));
    }

    #[test]
    fn combine_ors_every_flag() {
        let mut target = vk::PhysicalDeviceFeatures::default().geometry_shader(true);
        let other = vk::PhysicalDeviceFeatures::default().shader_int64(true);
        combine_features(&mut target, &other);

        assert_eq!(target.geometry_shader, vk::TRUE);
        assert_eq!(target.shader_int64, vk::TRUE);
        assert_eq!(target.sampler_anisotropy, vk::FALSE);
    }

    #[test]
    fn extended_features_need_identical_chains() {
        let base = vk::PhysicalDeviceFeatures::default();
        let mut device_chain = FeatureChain::new();
        device_chain.add(&vk::PhysicalDeviceVulkan13Features::default().dynamic_rendering(true));

        let same = device_chain.clone();
        assert!(supports_features(&base, &base, &device_chain, &same));

        let empty = FeatureChain::new();
        assert!(!supports_features(&base, &base, &empty, &same));
    }
}
