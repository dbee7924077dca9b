use crate::renderer::descriptor::{
    read_binding, validate_layout, BoundResource, CombinedSampler, DescriptorLayoutEntry,
    DescriptorType,
};
use crate::renderer::handle::{BufferHandle, Handle, SamplerHandle, TextureHandle};

#[test]
fn test_byte_spans() {
    assert_eq!(DescriptorType::UniformBuffer.byte_span(), 4);
    assert_eq!(DescriptorType::StorageBuffer.byte_span(), 4);
    assert_eq!(DescriptorType::Sampler.byte_span(), 4);
    assert_eq!(DescriptorType::Texture.byte_span(), 4);
    assert_eq!(DescriptorType::CombinedSampler.byte_span(), 8);
}

#[test]
fn test_validate_ordered_layout() {
    validate_layout(&[
        DescriptorLayoutEntry {
            descriptor_type: DescriptorType::UniformBuffer,
            offset: 0,
        },
        DescriptorLayoutEntry {
            descriptor_type: DescriptorType::CombinedSampler,
            offset: 8,
        },
    ]);
}

#[test]
#[should_panic(expected = "overlap")]
fn test_validate_rejects_overlap() {
    validate_layout(&[
        DescriptorLayoutEntry {
            descriptor_type: DescriptorType::CombinedSampler,
            offset: 0,
        },
        DescriptorLayoutEntry {
            descriptor_type: DescriptorType::UniformBuffer,
            offset: 4,
        },
    ]);
}

#[test]
#[should_panic(expected = "must not be empty")]
fn test_validate_rejects_empty() {
    validate_layout(&[]);
}

/// A uniform buffer at offset 0 followed by a combined sampler at offset 8
/// routes the 8-byte handle pair without corrupting the prefix.
#[test]
fn test_uniform_plus_combined_sampler_routing() {
    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Bindings {
        ubo: BufferHandle,
        _pad: u32,
        csampler: CombinedSampler,
    }
    unsafe impl bytemuck::Zeroable for Bindings {}
    unsafe impl bytemuck::Pod for Bindings {}

    let bindings = Bindings {
        ubo: Handle::from_raw(17),
        _pad: 0,
        csampler: CombinedSampler {
            tex: TextureHandle::from_raw(5),
            sampler: SamplerHandle::from_raw(9),
        },
    };
    let data = bytemuck::bytes_of(&bindings);

    let ubo_entry = DescriptorLayoutEntry {
        descriptor_type: DescriptorType::UniformBuffer,
        offset: 0,
    };
    let cs_entry = DescriptorLayoutEntry {
        descriptor_type: DescriptorType::CombinedSampler,
        offset: 8,
    };
    validate_layout(&[ubo_entry, cs_entry]);

    match read_binding(&ubo_entry, data) {
        BoundResource::UniformBuffer(h) => assert_eq!(h.raw(), 17),
        other => panic!("expected uniform buffer, got {:?}", other),
    }
    match read_binding(&cs_entry, data) {
        BoundResource::CombinedSampler(cs) => {
            assert_eq!(cs.tex.raw(), 5);
            assert_eq!(cs.sampler.raw(), 9);
        }
        other => panic!("expected combined sampler, got {:?}", other),
    }

    // Reading the pair must leave the prefix untouched.
    match read_binding(&ubo_entry, data) {
        BoundResource::UniformBuffer(h) => assert_eq!(h.raw(), 17),
        other => panic!("expected uniform buffer, got {:?}", other),
    }
}

#[test]
#[should_panic(expected = "binding struct too small")]
fn test_short_struct_rejected() {
    let entry = DescriptorLayoutEntry {
        descriptor_type: DescriptorType::CombinedSampler,
        offset: 4,
    };
    read_binding(&entry, &[0u8; 8]);
}
