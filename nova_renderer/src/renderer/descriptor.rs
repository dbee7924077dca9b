//! Descriptor set layouts and POD binding extraction
//!
//! A descriptor set layout is an ordered list of (slot type, byte offset)
//! entries describing how a plain `#[repr(C)]` binding struct maps to
//! shader-visible resources. The struct's byte layout must exactly match
//! the declared entries; `bind_descriptor_set` reads typed handles out of
//! the raw bytes at each declared offset.

use crate::renderer::handle::{BufferHandle, SamplerHandle, TextureHandle};

/// Type of resource bound at a layout slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorType {
    /// Uniform buffer; the buffer's committed size is the exposed range
    UniformBuffer,
    /// Storage buffer; the buffer's committed size is the exposed range
    StorageBuffer,
    /// Standalone sampler
    Sampler,
    /// Sampled texture
    Texture,
    /// Texture + sampler pair in one binding
    CombinedSampler,
}

impl DescriptorType {
    /// Bytes this slot occupies in the POD binding struct
    pub fn byte_span(self) -> u32 {
        match self {
            DescriptorType::UniformBuffer
            | DescriptorType::StorageBuffer
            | DescriptorType::Sampler
            | DescriptorType::Texture => 4,
            DescriptorType::CombinedSampler => 8,
        }
    }
}

/// One (type, byte offset) entry of a descriptor set layout
#[derive(Debug, Clone, Copy)]
pub struct DescriptorLayoutEntry {
    pub descriptor_type: DescriptorType,
    pub offset: u32,
}

/// Combined texture + sampler pair as it appears in POD binding structs
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CombinedSampler {
    pub tex: TextureHandle,
    pub sampler: SamplerHandle,
}

unsafe impl bytemuck::Zeroable for CombinedSampler {}
unsafe impl bytemuck::Pod for CombinedSampler {}

/// Validate a layout: entries must be offset-ordered and non-overlapping.
///
/// # Panics
///
/// Panics on an empty, unordered, or overlapping layout. Called by
/// `create_descriptor_set_layout` in every backend.
pub fn validate_layout(entries: &[DescriptorLayoutEntry]) {
    assert!(!entries.is_empty(), "descriptor set layout must not be empty");
    let mut end = 0u32;
    for entry in entries {
        assert!(
            entry.offset >= end,
            "descriptor layout entries overlap or are out of order at offset {}",
            entry.offset
        );
        end = entry.offset + entry.descriptor_type.byte_span();
    }
}

/// A resource reference extracted from a POD binding struct
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundResource {
    UniformBuffer(BufferHandle),
    StorageBuffer(BufferHandle),
    Sampler(SamplerHandle),
    Texture(TextureHandle),
    CombinedSampler(CombinedSampler),
}

/// Read the resource referenced by one layout entry out of `data`.
///
/// # Panics
///
/// Panics if `data` is too short for the entry. Handle liveness is the
/// backend's check, not this function's.
pub fn read_binding(entry: &DescriptorLayoutEntry, data: &[u8]) -> BoundResource {
    let offset = entry.offset as usize;
    let span = entry.descriptor_type.byte_span() as usize;
    assert!(
        offset + span <= data.len(),
        "binding struct too small: entry at offset {} spans {} bytes, struct has {}",
        offset,
        span,
        data.len()
    );

    let bytes = &data[offset..offset + span];
    match entry.descriptor_type {
        DescriptorType::UniformBuffer => {
            BoundResource::UniformBuffer(bytemuck::pod_read_unaligned(bytes))
        }
        DescriptorType::StorageBuffer => {
            BoundResource::StorageBuffer(bytemuck::pod_read_unaligned(bytes))
        }
        DescriptorType::Sampler => BoundResource::Sampler(bytemuck::pod_read_unaligned(bytes)),
        DescriptorType::Texture => BoundResource::Texture(bytemuck::pod_read_unaligned(bytes)),
        DescriptorType::CombinedSampler => {
            BoundResource::CombinedSampler(bytemuck::pod_read_unaligned(bytes))
        }
    }
}

#[cfg(test)]
#[path = "descriptor_tests.rs"]
mod tests;
