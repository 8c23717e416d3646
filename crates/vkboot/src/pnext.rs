//! Raw extension-chain plumbing for caller supplied structs.

use ash::vk;
use std::ffi::c_void;

/// Link `structs` in order and return the head, or null when empty.
///
/// # Safety
/// Every pointer must point to a live Vulkan struct starting with
/// `s_type`/`p_next`. The returned chain is only valid while they live.
pub(crate) unsafe fn link(structs: &[*mut vk::BaseOutStructure<'static>]) -> *const c_void {
    for pair in structs.windows(2) {
        unsafe { (*pair[0]).p_next = pair[1] };
    }
    if let Some(&last) = structs.last() {
        unsafe { (*last).p_next = std::ptr::null_mut() };
    }
    structs
        .first()
        .map_or(std::ptr::null(), |&head| head.cast_const().cast())
}

/// Whether a chain contains a struct of type `s_type`.
///
/// # Safety
/// `head` must be null or the start of a valid chain.
pub(crate) unsafe fn chain_contains(head: *const c_void, s_type: vk::StructureType) -> bool {
    let mut current = head.cast::<vk::BaseInStructure<'_>>();
    while let Some(node) = unsafe { current.as_ref() } {
        if node.s_type == s_type {
            return true;
        }
        current = node.p_next;
    }
    false
}

/// Erase a caller struct to a chain entry.
pub(crate) fn erase<T: vk::TaggedStructure>(s: &mut T) -> *mut vk::BaseOutStructure<'static> {
    (s as *mut T).cast()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_in_order() {
        let mut first = vk::PhysicalDeviceVulkan12Features::default();
        let mut second = vk::PhysicalDeviceVulkan13Features::default();
        let structs = [erase(&mut first), erase(&mut second)];

        let head = unsafe { link(&structs) };
        assert_eq!(
            head,
            (&first as *const vk::PhysicalDeviceVulkan12Features<'_>).cast::<c_void>()
        );
        assert_eq!(
            first.p_next,
            (&mut second as *mut vk::PhysicalDeviceVulkan13Features<'_>).cast::<c_void>()
        );
        assert!(second.p_next.is_null());

        unsafe {
            assert!(chain_contains(
                head,
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES
            ));
            assert!(!chain_contains(
                head,
                vk::StructureType::PHYSICAL_DEVICE_FEATURES_2
            ));
        }
    }

    #[test]
    fn empty_chain_is_null() {
        let head = unsafe { link(&[]) };
        assert!(head.is_null());
        assert!(!unsafe { chain_contains(head, vk::StructureType::PHYSICAL_DEVICE_FEATURES_2) });
    }
}
