//! Queue family searches.

use crate::error::QueueError;
use ash::vk;

/// The role a queue is looked up for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum QueueType {
    Present,
    Graphics,
    Compute,
    Transfer,
}

/// A queue family index together with its queue priorities.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomQueueDescription {
    pub index: u32,
    pub priorities: Vec<f32>,
}

impl CustomQueueDescription {
    /// One queue per entry of `priorities`, all from family `index`.
    pub fn new(index: u32, priorities: Vec<f32>) -> Self {
        Self { index, priorities }
    }
}

fn family_index(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}

/// First family that has every bit of `desired`.
pub fn first_queue_index(
    families: &[vk::QueueFamilyProperties],
    desired: vk::QueueFlags,
) -> Option<u32> {
    families
        .iter()
        .position(|family| family.queue_flags.contains(desired))
        .map(family_index)
}

/// A family with `desired` but without graphics, preferring one that also
/// lacks `undesired`. Falls back to the last family lacking only graphics.
pub fn separate_queue_index(
    families: &[vk::QueueFamilyProperties],
    desired: vk::QueueFlags,
    undesired: vk::QueueFlags,
) -> Option<u32> {
    let mut fallback = None;
    for (index, family) in families.iter().enumerate() {
        let flags = family.queue_flags;
        if flags.contains(desired) && !flags.contains(vk::QueueFlags::GRAPHICS) {
            if !flags.intersects(undesired) {
                return Some(family_index(index));
            }
            fallback = Some(family_index(index));
        }
    }
    fallback
}

/// A family with `desired` and neither graphics nor `undesired`.
pub fn dedicated_queue_index(
    families: &[vk::QueueFamilyProperties],
    desired: vk::QueueFlags,
    undesired: vk::QueueFlags,
) -> Option<u32> {
    families
        .iter()
        .position(|family| {
            let flags = family.queue_flags;
            flags.contains(desired)
                && !flags.contains(vk::QueueFlags::GRAPHICS)
                && !flags.intersects(undesired)
        })
        .map(family_index)
}

/// First family for which `supports_present` reports true.
pub fn present_queue_index(
    family_count: usize,
    mut supports_present: impl FnMut(u32) -> bool,
) -> Option<u32> {
    (0..family_count)
        .map(family_index)
        .find(|&index| supports_present(index))
}

/// Resolve the family serving `kind`.
pub(crate) fn queue_index(
    families: &[vk::QueueFamilyProperties],
    kind: QueueType,
    supports_present: impl FnMut(u32) -> bool,
) -> Result<u32, QueueError> {
    match kind {
        QueueType::Present => present_queue_index(families.len(), supports_present)
            .ok_or(QueueError::PresentUnavailable),
        QueueType::Graphics => first_queue_index(families, vk::QueueFlags::GRAPHICS)
            .ok_or(QueueError::GraphicsUnavailable),
        QueueType::Compute => {
            separate_queue_index(families, vk::QueueFlags::COMPUTE, vk::QueueFlags::TRANSFER)
                .ok_or(QueueError::ComputeUnavailable)
        }
        QueueType::Transfer => {
            separate_queue_index(families, vk::QueueFlags::TRANSFER, vk::QueueFlags::COMPUTE)
                .ok_or(QueueError::TransferUnavailable)
        }
    }
}

/// Resolve a family serving only `kind`. Only compute and transfer have
/// dedicated families.
pub(crate) fn dedicated_queue_index_for(
    families: &[vk::QueueFamilyProperties],
    kind: QueueType,
) -> Result<u32, QueueError> {
    match kind {
        QueueType::Compute => {
            dedicated_queue_index(families, vk::QueueFlags::COMPUTE, vk::QueueFlags::TRANSFER)
                .ok_or(QueueError::ComputeUnavailable)
        }
        QueueType::Transfer => {
            dedicated_queue_index(families, vk::QueueFlags::TRANSFER, vk::QueueFlags::COMPUTE)
                .ok_or(QueueError::TransferUnavailable)
        }
        QueueType::Present | QueueType::Graphics => Err(QueueError::InvalidQueueFamilyIndex),
    }
}

#[cfg(test)]
pub(crate) fn family(flags: vk::QueueFlags, queue_count: u32) -> vk::QueueFamilyProperties {
    vk::QueueFamilyProperties::default()
        .queue_flags(flags)
        .queue_count(queue_count)
}
