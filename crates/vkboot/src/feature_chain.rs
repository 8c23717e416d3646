//! Extended feature descriptors and the chains that hold them.
//!
//! Every `VkPhysicalDevice*Features` extension struct shares one layout: a
//! structure type, a next pointer and a flat run of `VkBool32` flags.
//! [`FeatureNode`] copies any of them into a fixed-capacity block tagged by
//! its structure type, so a [`FeatureChain`] can merge and compare
//! descriptors without knowing their concrete Rust type.
//!
//! Chains are plain vectors. The linked-list shape Vulkan expects only exists
//! for the duration of [`FeatureChain::chain_up`].

use ash::vk;
use std::ffi::c_void;
use std::fmt;
use std::{mem, ptr};

/// Maximum number of `VkBool32` flags a single descriptor can carry.
pub const FEATURE_FIELD_CAPACITY: usize = 256;

/// A Vulkan struct that can be stored in a [`FeatureChain`].
///
/// Implemented for every extended feature struct `ash` defines.
///
/// # Safety
/// Every field after `s_type` and `p_next` must be a `VkBool32`, and
/// `FLAG_COUNT` must be the number of those fields.
pub unsafe trait FeatureStruct:
    vk::TaggedStructure + vk::ExtendsPhysicalDeviceFeatures2 + Copy
{
    /// Number of `VkBool32` flags following the type/next prefix.
    const FLAG_COUNT: usize;
}

/// Byte offset of the first flag, the same in every feature struct.
const FLAGS_OFFSET: usize = mem::offset_of!(FeatureNode, fields);

/// One extended feature descriptor, stored by value.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct FeatureNode {
    s_type: vk::StructureType,
    p_next: *mut c_void,
    fields: [vk::Bool32; FEATURE_FIELD_CAPACITY],
}

// SAFETY: `p_next` is only non-null while `FeatureChain::chain_up` holds the
// owning chain by unique reference.
unsafe impl Send for FeatureNode {}
unsafe impl Sync for FeatureNode {}

impl FeatureNode {
    /// Copy the flags of a typed feature struct into a node.
    ///
    /// Panics if `T` is larger than the node capacity, or if its size does not
    /// agree with [`FeatureStruct::FLAG_COUNT`].
    pub fn new<T: FeatureStruct>(features: &T) -> Self {
        let flag_bytes = T::FLAG_COUNT * mem::size_of::<vk::Bool32>();
        let size = mem::size_of::<T>();
        assert!(
            T::FLAG_COUNT <= FEATURE_FIELD_CAPACITY,
            "{:?} does not fit in a feature node",
            T::STRUCTURE_TYPE
        );
        assert!(
            FLAGS_OFFSET + flag_bytes <= size
                && size - (FLAGS_OFFSET + flag_bytes) < mem::align_of::<T>(),
            "{:?} has a flag count that does not match its layout",
            T::STRUCTURE_TYPE
        );

        let mut node = Self::empty(T::STRUCTURE_TYPE);
        // SAFETY: `T` holds `FLAG_COUNT` initialized `VkBool32` fields starting
        // at `FLAGS_OFFSET`, and they fit in `node.fields`. Padding is not read.
        unsafe {
            ptr::copy_nonoverlapping(
                ptr::from_ref(features).cast::<u8>().add(FLAGS_OFFSET),
                node.fields.as_mut_ptr().cast::<u8>(),
                flag_bytes,
            );
        }
        node
    }

    fn empty(s_type: vk::StructureType) -> Self {
        Self {
            s_type,
            p_next: ptr::null_mut(),
            fields: [vk::FALSE; FEATURE_FIELD_CAPACITY],
        }
    }

    /// The structure type identifying the stored descriptor.
    pub const fn structure_type(&self) -> vk::StructureType {
        self.s_type
    }

    /// Raw flag words following the type/next prefix.
    pub const fn flags(&self) -> &[vk::Bool32; FEATURE_FIELD_CAPACITY] {
        &self.fields
    }

    /// Read the node back as `T`, or `None` if it stores a different type.
    pub fn get<T: FeatureStruct>(&self) -> Option<T> {
        if self.s_type != T::STRUCTURE_TYPE {
            return None;
        }
        // SAFETY: the tag matches, so the leading bytes were copied from a `T`
        // (or filled by the driver as one), and `T` is no more aligned than `Self`.
        Some(unsafe { ptr::read(ptr::from_ref(self).cast::<T>()) })
    }

    /// Same tag with every flag cleared.
    pub fn cleared(&self) -> Self {
        Self::empty(self.s_type)
    }

    /// Exact flag equality.
    ///
    /// Panics if the nodes hold different descriptor types.
    pub fn matches(&self, other: &Self) -> bool {
        self.assert_same_type(other);
        self.fields == other.fields
    }

    /// Whether every flag set in `requested` is also set here.
    ///
    /// Panics if the nodes hold different descriptor types.
    pub fn supports(&self, requested: &Self) -> bool {
        self.assert_same_type(requested);
        self.fields
            .iter()
            .zip(&requested.fields)
            .all(|(&have, &want)| want == vk::FALSE || have != vk::FALSE)
    }

    /// OR the flags of `other` into this node.
    ///
    /// Panics if the nodes hold different descriptor types.
    pub fn combine(&mut self, other: &Self) {
        self.assert_same_type(other);
        for (field, &flag) in self.fields.iter_mut().zip(&other.fields) {
            *field |= flag;
        }
    }

    fn assert_same_type(&self, other: &Self) {
        assert_eq!(
            self.s_type, other.s_type,
            "feature descriptors of different types cannot be compared"
        );
    }
}

impl fmt::Debug for FeatureNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let enabled: Vec<usize> = self
            .fields
            .iter()
            .enumerate()
            .filter(|(_, &flag)| flag != vk::FALSE)
            .map(|(index, _)| index)
            .collect();
        f.debug_struct("FeatureNode")
            .field("s_type", &self.s_type)
            .field("enabled", &enabled)
            .finish()
    }
}

/// Ordered set of feature descriptors, unique by structure type.
#[derive(Clone, Default, Debug)]
pub struct FeatureChain {
    nodes: Vec<FeatureNode>,
}

impl FeatureChain {
    /// Create an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a typed descriptor, merging into an existing entry of the same type.
    pub fn add<T: FeatureStruct>(&mut self, features: &T) {
        self.add_node(FeatureNode::new(features));
    }

    /// Add a node, merging into an existing entry of the same type.
    pub fn add_node(&mut self, node: FeatureNode) {
        match self.nodes.iter_mut().find(|n| n.s_type == node.s_type) {
            Some(existing) => existing.combine(&node),
            None => self.nodes.push(node),
        }
    }

    /// Merge every entry of `other` into this chain.
    pub fn combine(&mut self, other: &Self) {
        for node in &other.nodes {
            self.add_node(*node);
        }
    }

    /// Strict structural identity: same entry count and identical flags at
    /// every position.
    pub fn match_all(&self, requested: &Self) -> bool {
        if self.nodes.len() != requested.nodes.len() {
            return false;
        }
        self.nodes
            .iter()
            .zip(&requested.nodes)
            .all(|(supported, wanted)| supported.matches(wanted))
    }

    /// Every requested entry is present here with at least its flags set.
    pub fn find_and_match(&self, requested: &Self) -> bool {
        requested.nodes.iter().all(|wanted| {
            self.find(wanted.s_type)
                .is_some_and(|supported| supported.supports(wanted))
        })
    }

    /// The entry with the given structure type.
    pub fn find(&self, s_type: vk::StructureType) -> Option<&FeatureNode> {
        self.nodes.iter().find(|n| n.s_type == s_type)
    }

    /// Read an entry back as its typed struct.
    pub fn get<T: FeatureStruct>(&self) -> Option<T> {
        self.find(T::STRUCTURE_TYPE).and_then(FeatureNode::get)
    }

    /// Same entries, in the same order, with every flag cleared.
    ///
    /// Used as the output buffer of a features query.
    pub fn cleared(&self) -> Self {
        Self {
            nodes: self.nodes.iter().map(FeatureNode::cleared).collect(),
        }
    }

    /// Number of descriptors in the chain.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Iterate over the descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &FeatureNode> {
        self.nodes.iter()
    }

    /// Link every entry behind a `VkPhysicalDeviceFeatures2` seeded with
    /// `features` and run `f` on it.
    ///
    /// The links are torn down when `f` returns or unwinds. Anything the
    /// driver writes into the entries during `f` is kept.
    pub fn chain_up<R>(
        &mut self,
        features: vk::PhysicalDeviceFeatures,
        f: impl FnOnce(&mut vk::PhysicalDeviceFeatures2<'_>) -> R,
    ) -> R {
        let mut linked = LinkedChain::new(&mut self.nodes, features);
        f(&mut linked.head)
    }
}

/// A chain while it is physically linked. Unlinks on drop.
struct LinkedChain<'c> {
    head: vk::PhysicalDeviceFeatures2<'static>,
    nodes: &'c mut [FeatureNode],
}

impl<'c> LinkedChain<'c> {
    fn new(nodes: &'c mut [FeatureNode], features: vk::PhysicalDeviceFeatures) -> Self {
        let mut next: *mut c_void = ptr::null_mut();
        for node in nodes.iter_mut().rev() {
            node.p_next = next;
            next = ptr::from_mut(node).cast();
        }

        let mut head = vk::PhysicalDeviceFeatures2::default().features(features);
        head.p_next = next;
        Self { head, nodes }
    }
}

impl Drop for LinkedChain<'_> {
    fn drop(&mut self) {
        for node in self.nodes.iter_mut() {
            node.p_next = ptr::null_mut();
        }
        self.head.p_next = ptr::null_mut();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{self, AssertUnwindSafe};

    fn vulkan13(dynamic_rendering: bool, synchronization2: bool) -> vk::PhysicalDeviceVulkan13Features<'static> {
        vk::PhysicalDeviceVulkan13Features::default()
            .dynamic_rendering(dynamic_rendering)
            .synchronization2(synchronization2)
    }

    fn chain_of(nodes: &[FeatureNode]) -> FeatureChain {
        let mut chain = FeatureChain::new();
        for node in nodes {
            chain.add_node(*node);
        }
        chain
    }

    #[test]
    fn node_round_trips_typed_struct() {
        let features = vk::PhysicalDeviceVulkan12Features::default()
            .buffer_device_address(true)
            .descriptor_indexing(true);
        let node = FeatureNode::new(&features);

        assert_eq!(
            node.structure_type(),
            vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES
        );
        let back = node.get::<vk::PhysicalDeviceVulkan12Features>().unwrap();
        assert_eq!(back.buffer_device_address, vk::TRUE);
        assert_eq!(back.descriptor_indexing, vk::TRUE);
        assert_eq!(back.scalar_block_layout, vk::FALSE);
        assert!(node.get::<vk::PhysicalDeviceVulkan13Features>().is_none());
    }

    #[test]
    fn trailing_padding_is_not_a_flag() {
        let clean = vulkan13(true, false);
        let mut dirty = clean;
        let size = mem::size_of::<vk::PhysicalDeviceVulkan13Features>();
        assert_eq!(size, FLAGS_OFFSET + 16 * mem::size_of::<vk::Bool32>());
        unsafe {
            ptr::from_mut(&mut dirty)
                .cast::<u8>()
                .add(size - 4)
                .cast::<u32>()
                .write(1);
        }

        let a = FeatureNode::new(&dirty);
        let b = FeatureNode::new(&clean);
        assert_eq!(a.flags()[15], vk::FALSE);
        assert!(a.matches(&b));
        assert!(chain_of(&[a]).match_all(&chain_of(&[b])));
        assert!(chain_of(&[b]).find_and_match(&chain_of(&[a])));
    }

    #[test]
    fn last_flag_of_odd_struct_is_kept() {
        let features = vk::PhysicalDeviceVulkan13Features::default().maintenance4(true);
        let node = FeatureNode::new(&features);
        assert_eq!(node.flags()[14], vk::TRUE);
        assert_eq!(
            node.get::<vk::PhysicalDeviceVulkan13Features>()
                .unwrap()
                .maintenance4,
            vk::TRUE
        );
    }

    #[test]
    fn registered_counts_match_layouts() {
        FeatureNode::new(&vk::PhysicalDeviceVulkan11Features::default());
        FeatureNode::new(&vk::PhysicalDeviceVulkan12Features::default());
        FeatureNode::new(&vk::PhysicalDeviceVulkan13Features::default());
        FeatureNode::new(&vk::PhysicalDevicePortabilitySubsetFeaturesKHR::default());
        FeatureNode::new(&vk::PhysicalDeviceExtendedDynamicState3FeaturesEXT::default());
        FeatureNode::new(&vk::PhysicalDeviceASTCDecodeFeaturesEXT::default());
    }

    #[repr(C)]
    #[derive(Clone, Copy)]
    #[allow(dead_code)]
    struct Miscounted {
        s_type: vk::StructureType,
        p_next: *mut c_void,
        only: vk::Bool32,
    }

    unsafe impl vk::TaggedStructure for Miscounted {
        const STRUCTURE_TYPE: vk::StructureType = vk::StructureType::from_raw(1_000_999_000);
    }
    unsafe impl vk::ExtendsPhysicalDeviceFeatures2 for Miscounted {}
    unsafe impl FeatureStruct for Miscounted {
        const FLAG_COUNT: usize = 3;
    }

    #[test]
    #[should_panic(expected = "does not match its layout")]
    fn miscounted_struct_is_rejected() {
        FeatureNode::new(&Miscounted {
            s_type: <Miscounted as vk::TaggedStructure>::STRUCTURE_TYPE,
            p_next: ptr::null_mut(),
            only: vk::TRUE,
        });
    }

    #[test]
    fn add_merges_entries_with_the_same_type() {
        let mut chain = FeatureChain::new();
        chain.add(&vulkan13(true, false));
        chain.add(&vulkan13(false, true));

        assert_eq!(chain.len(), 1);
        let merged = chain.get::<vk::PhysicalDeviceVulkan13Features>().unwrap();
        assert_eq!(merged.dynamic_rendering, vk::TRUE);
        assert_eq!(merged.synchronization2, vk::TRUE);
    }

    #[test]
    fn combine_is_idempotent() {
        let mut once = FeatureChain::new();
        once.add(&vulkan13(true, false));
        let other = chain_of(&[FeatureNode::new(&vulkan13(false, true))]);

        once.combine(&other);
        let mut twice = once.clone();
        twice.combine(&other);

        assert!(once.match_all(&twice));
    }

    #[test]
    fn combine_appends_new_types_in_order() {
        let mut chain = FeatureChain::new();
        chain.add(&vk::PhysicalDeviceVulkan12Features::default().descriptor_indexing(true));

        let mut other = FeatureChain::new();
        other.add(&vulkan13(true, false));
        other.add(&vk::PhysicalDeviceVulkan11Features::default().multiview(true));
        chain.combine(&other);

        let types: Vec<_> = chain.iter().map(FeatureNode::structure_type).collect();
        assert_eq!(
            types,
            [
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES,
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_1_FEATURES,
            ]
        );
    }

    #[test]
    fn match_all_rejects_count_mismatch() {
        let mut a = FeatureChain::new();
        a.add(&vk::PhysicalDeviceVulkan12Features::default().descriptor_indexing(true));
        let mut b = FeatureChain::new();
        b.add(&vulkan13(true, false));

        a.combine(&b);

        assert_eq!(a.len(), 2);
        assert!(!a.match_all(&b));
    }

    #[test]
    fn match_all_compares_flags_exactly() {
        let requested = chain_of(&[FeatureNode::new(&vulkan13(true, true))]);

        let mut subset = chain_of(&[FeatureNode::new(&vulkan13(true, false))]);
        assert!(!subset.match_all(&requested));
        subset.combine(&requested);
        assert!(subset.match_all(&requested));

        let mut superset = chain_of(&[FeatureNode::new(&vulkan13(true, true))]);
        let narrow = chain_of(&[FeatureNode::new(&vulkan13(true, false))]);
        superset.combine(&narrow);
        assert!(!superset.match_all(&narrow));
    }

    #[test]
    fn find_and_match_is_reflexive() {
        let mut chain = FeatureChain::new();
        chain.add(&vk::PhysicalDeviceVulkan12Features::default().buffer_device_address(true));
        chain.add(&vulkan13(true, true));

        assert!(chain.find_and_match(&chain));
    }

    #[test]
    fn find_and_match_requires_presence_and_implication() {
        let mut supported = FeatureChain::new();
        supported.add(&vk::PhysicalDeviceVulkan12Features::default().buffer_device_address(true));
        supported.add(&vulkan13(true, true));

        let narrow = chain_of(&[FeatureNode::new(&vulkan13(true, false))]);
        assert!(supported.find_and_match(&narrow));

        let missing_type = chain_of(&[FeatureNode::new(
            &vk::PhysicalDeviceVulkan11Features::default().multiview(true),
        )]);
        assert!(!supported.find_and_match(&missing_type));

        let missing_flag = chain_of(&[FeatureNode::new(
            &vk::PhysicalDeviceVulkan13Features::default().maintenance4(true),
        )]);
        assert!(!supported.find_and_match(&missing_flag));
    }

    #[test]
    #[should_panic(expected = "different types")]
    fn comparing_different_types_panics() {
        let a = FeatureNode::new(&vulkan13(true, false));
        let b = FeatureNode::new(&vk::PhysicalDeviceVulkan12Features::default());
        a.matches(&b);
    }

    #[test]
    fn cleared_keeps_types_and_drops_flags() {
        let mut chain = FeatureChain::new();
        chain.add(&vulkan13(true, true));
        let cleared = chain.cleared();

        let features = cleared.get::<vk::PhysicalDeviceVulkan13Features>().unwrap();
        assert_eq!(features.dynamic_rendering, vk::FALSE);
        assert_eq!(features.synchronization2, vk::FALSE);
    }

    fn linked_types(head: &vk::PhysicalDeviceFeatures2<'_>) -> Vec<vk::StructureType> {
        let mut types = Vec::new();
        let mut next = head.p_next.cast::<vk::BaseOutStructure<'_>>();
        while !next.is_null() {
            unsafe {
                types.push((*next).s_type);
                next = (*next).p_next;
            }
        }
        types
    }

    #[test]
    fn chain_up_links_in_order_and_unlinks_after() {
        let mut chain = FeatureChain::new();
        chain.add(&vk::PhysicalDeviceVulkan12Features::default());
        chain.add(&vulkan13(false, false));

        let base = vk::PhysicalDeviceFeatures::default().robust_buffer_access(true);
        let types = chain.chain_up(base, |head| {
            assert_eq!(head.features.robust_buffer_access, vk::TRUE);
            linked_types(head)
        });

        assert_eq!(
            types,
            [
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_2_FEATURES,
                vk::StructureType::PHYSICAL_DEVICE_VULKAN_1_3_FEATURES,
            ]
        );
        assert!(chain.nodes.iter().all(|n| n.p_next.is_null()));
    }

    #[test]
    fn chain_up_keeps_driver_writes() {
        let mut chain = FeatureChain::new();
        chain.add(&vulkan13(false, false));

        chain.chain_up(vk::PhysicalDeviceFeatures::default(), |head| {
            let node = head.p_next.cast::<vk::PhysicalDeviceVulkan13Features<'_>>();
            unsafe { (*node).dynamic_rendering = vk::TRUE };
        });

        let filled = chain.get::<vk::PhysicalDeviceVulkan13Features>().unwrap();
        assert_eq!(filled.dynamic_rendering, vk::TRUE);
    }

    #[test]
    fn chain_up_unlinks_when_callback_panics() {
        let mut chain = FeatureChain::new();
        chain.add(&vk::PhysicalDeviceVulkan12Features::default());
        chain.add(&vulkan13(false, false));

        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            chain.chain_up(vk::PhysicalDeviceFeatures::default(), |_| {
                panic!("query failed");
            })
        }));

        assert!(result.is_err());
        assert!(chain.nodes.iter().all(|n| n.p_next.is_null()));
    }
}
