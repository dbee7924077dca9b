use crate::renderer::descriptor::{BoundResource, DescriptorLayoutEntry, DescriptorType};
use crate::renderer::device::{RenderBackend, RendererDesc};
use crate::renderer::format::Format;
use crate::renderer::framebuffer::FramebufferDesc;
use crate::renderer::render_pass::{LoadOp, RenderPassDesc};
use crate::renderer::render_target::RenderTargetDesc;
use crate::renderer::shader::ShaderMacros;
use crate::renderer::texture::{TextureDesc, TextureUsage};

fn backend() -> crate::renderer::null::NullBackend {
    crate::renderer::null::NullBackend::new(&RendererDesc::default())
}

fn small_render_target(backend: &mut crate::renderer::null::NullBackend) -> crate::renderer::RenderTargetHandle {
    let desc = RenderTargetDesc::new()
        .width(64)
        .height(64)
        .format(Format::RGBA8)
        .name("rt");
    backend.create_render_target(&desc).unwrap()
}

#[test]
fn test_persistent_buffer_holds_contents() {
    let mut b = backend();
    let handle = b.create_buffer(8, &[1, 2, 3, 4]).unwrap();
    // Contents are padded to the committed size.
    assert_eq!(b.buffer_bytes(handle), &[1, 2, 3, 4, 0, 0, 0, 0]);
    b.delete_buffer(handle);
}

#[test]
fn test_buffer_alloc_accounting() {
    let mut b = backend();
    assert_eq!(b.mem_stats().allocation_count, 0);

    let handle = b.create_buffer(256, &[0; 256]).unwrap();
    assert_eq!(b.mem_stats().allocation_count, 1);
    assert_eq!(b.mem_stats().used_bytes, 256);

    b.delete_buffer(handle);
    assert_eq!(b.mem_stats().allocation_count, 0);
    assert_eq!(b.mem_stats().used_bytes, 0);
}

#[test]
fn test_ephemeral_buffer_lives_one_frame() {
    let mut b = backend();
    let rt = small_render_target(&mut b);

    b.begin_frame().unwrap();
    let eph = b.create_ephemeral_buffer(16, &[7; 16]).unwrap();
    assert_eq!(b.buffer_bytes(eph), &[7; 16]);
    assert_eq!(b.mem_stats().sub_allocation_count, 1);
    b.present_frame(rt).unwrap();

    assert_eq!(b.mem_stats().sub_allocation_count, 0);
}

#[test]
#[should_panic(expected = "use of removed resource slot")]
fn test_ephemeral_buffer_gone_after_present() {
    let mut b = backend();
    let rt = small_render_target(&mut b);

    b.begin_frame().unwrap();
    let eph = b.create_ephemeral_buffer(16, &[7; 16]).unwrap();
    b.present_frame(rt).unwrap();
    b.buffer_bytes(eph);
}

#[test]
#[should_panic(expected = "freed at present")]
fn test_deleting_ephemeral_buffer_panics() {
    let mut b = backend();
    b.begin_frame().unwrap();
    let eph = b.create_ephemeral_buffer(16, &[0; 16]).unwrap();
    b.delete_buffer(eph);
}

#[test]
fn test_ephemeral_ring_reuses_space_across_frames() {
    let mut b = backend();
    let rt = small_render_target(&mut b);
    let ring_size = RendererDesc::default().ephemeral_ring_buf_size;

    // Each frame allocates most of the ring; only the per-frame reset
    // makes the second frame fit.
    for _ in 0..2 {
        b.begin_frame().unwrap();
        b.create_ephemeral_buffer(ring_size / 2 + 1024, &[0; 64]).unwrap();
        b.present_frame(rt).unwrap();
    }
}

#[test]
fn test_texture_accounting_covers_mips() {
    let mut b = backend();
    let desc = TextureDesc::new()
        .width(4)
        .height(4)
        .format(Format::RGBA8)
        .num_mips(3)
        .mip_level_data(0, vec![0; 64])
        .mip_level_data(1, vec![0; 16])
        .mip_level_data(2, vec![0; 4])
        .name("mipped");
    let handle = b.create_texture(&desc).unwrap();
    // 4x4 + 2x2 + 1x1 texels at 4 bytes each
    assert_eq!(b.mem_stats().used_bytes, 64 + 16 + 4);
    b.delete_texture(handle);
    assert_eq!(b.mem_stats().used_bytes, 0);
}

#[test]
fn test_render_target_pairs_with_texture() {
    let mut b = backend();
    let rt = small_render_target(&mut b);
    let tex = b.render_target_texture(rt);
    assert!(tex.is_valid());
    b.delete_render_target(rt);
    assert_eq!(b.mem_stats().allocation_count, 0);
}

#[test]
#[should_panic(expected = "transfer-src usage")]
fn test_present_requires_transfer_src_usage() {
    let mut b = backend();
    let rt = b
        .create_render_target(
            &RenderTargetDesc::new()
                .width(64)
                .height(64)
                .format(Format::RGBA8)
                .usage(TextureUsage::SAMPLED)
                .name("offscreen only"),
        )
        .unwrap();
    b.begin_frame().unwrap();
    b.present_frame(rt).unwrap();
}

#[test]
#[should_panic(expected = "sampled usage")]
fn test_render_target_texture_requires_sampled_usage() {
    let mut b = backend();
    let rt = b
        .create_render_target(
            &RenderTargetDesc::new()
                .width(64)
                .height(64)
                .format(Format::RGBA8)
                .usage(TextureUsage::TRANSFER_SRC)
                .name("blit only"),
        )
        .unwrap();
    b.render_target_texture(rt);
}

#[test]
#[should_panic(expected = "format does not match render pass")]
fn test_framebuffer_attachment_format_must_match_pass() {
    let mut b = backend();
    let rt = b
        .create_render_target(
            &RenderTargetDesc::new()
                .width(64)
                .height(64)
                .format(Format::SRGBA8)
                .name("srgb target"),
        )
        .unwrap();
    let pass = b
        .create_render_pass(
            &RenderPassDesc::new()
                .color(0, Format::RGBA8, LoadOp::Clear)
                .name("unorm pass"),
        )
        .unwrap();
    let _ = b.create_framebuffer(
        &FramebufferDesc::new()
            .render_pass(pass)
            .color(0, rt)
            .name("mismatched"),
    );
}

#[test]
#[should_panic(expected = "retired by delete_render_target")]
fn test_render_target_texture_not_deletable_alone() {
    let mut b = backend();
    let rt = small_render_target(&mut b);
    let tex = b.render_target_texture(rt);
    b.delete_texture(tex);
}

#[test]
fn test_descriptor_set_rejects_dead_handle() {
    let mut b = backend();
    let layout = b
        .create_descriptor_set_layout(&[DescriptorLayoutEntry {
            descriptor_type: DescriptorType::UniformBuffer,
            offset: 0,
        }])
        .unwrap();

    let dead = crate::renderer::BufferHandle::from_raw(42);
    let err = b
        .bind_descriptor_set(0, layout, bytemuck::bytes_of(&dead))
        .unwrap_err();
    assert!(matches!(err, crate::Error::InvalidHandle(_)));
}

#[test]
fn test_descriptor_set_records_bindings() {
    let mut b = backend();
    let ubo = b.create_buffer(64, &[0; 64]).unwrap();
    let layout = b
        .create_descriptor_set_layout(&[DescriptorLayoutEntry {
            descriptor_type: DescriptorType::UniformBuffer,
            offset: 0,
        }])
        .unwrap();

    b.bind_descriptor_set(1, layout, bytemuck::bytes_of(&ubo)).unwrap();
    assert_eq!(b.bound_set(1), &[BoundResource::UniformBuffer(ubo)]);
}

#[test]
fn test_handles_not_reused_until_present() {
    let mut b = backend();
    let rt = small_render_target(&mut b);

    let first = b.create_buffer(16, &[0; 16]).unwrap();
    b.delete_buffer(first);
    let second = b.create_buffer(16, &[0; 16]).unwrap();
    assert_ne!(first, second);

    b.begin_frame().unwrap();
    b.present_frame(rt).unwrap();
    let third = b.create_buffer(16, &[0; 16]).unwrap();
    assert_eq!(third.raw(), first.raw());
}

#[test]
fn test_shader_creation_and_deletion() {
    let mut b = backend();
    let macros = ShaderMacros::default();
    let vs = b.create_vertex_shader("fullscreen", &macros).unwrap();
    let fs = b.create_fragment_shader("blit", &macros).unwrap();
    assert!(vs.is_valid() && fs.is_valid());
    b.delete_vertex_shader(vs);
    b.delete_fragment_shader(fs);
}
