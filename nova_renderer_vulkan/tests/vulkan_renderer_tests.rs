//! Integration tests for the VulkanBackend
//!
//! These tests verify that VulkanBackend correctly implements the
//! RenderBackend trait. All tests require a GPU and are marked with
//! #[ignore].
//!
//! Run with: cargo test --test vulkan_renderer_tests -- --ignored

use nova_renderer::renderer::{
    FilterMode, Format, FramebufferDesc, LoadOp, RenderBackend, RenderPassDesc, RenderTargetDesc,
    RendererDesc, SamplerDesc, ShaderLoader, ShaderMacros, ShaderStage, TextureDesc, WrapMode,
};
use nova_renderer::{Error, Result};
use nova_renderer_vulkan::VulkanBackend;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Helper to create a test window for Vulkan
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("VulkanBackend Test")
        .with_inner_size(winit::dpi::LogicalSize::new(800, 600))
        .with_visible(false); // Hidden window for tests
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

/// Loader stub for tests that never create shaders
struct NoShaders;

impl ShaderLoader for NoShaders {
    fn load(&self, name: &str, _stage: ShaderStage, _macros: &ShaderMacros) -> Result<Vec<u8>> {
        Err(Error::ShaderCompileFailed {
            name: name.to_string(),
            log: "no shaders in this test".to_string(),
        })
    }
}

fn create_backend(window: &Window) -> VulkanBackend {
    VulkanBackend::new(window, &RendererDesc::default(), Box::new(NoShaders)).unwrap()
}

// ============================================================================
// CAPABILITY TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_drawable_size() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);

    let size = backend.drawable_size();
    assert!(size.x > 0);
    assert!(size.y > 0);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_render_target_format_support() {
    let (window, _event_loop) = create_test_window();
    let backend = create_backend(&window);

    // RGBA8 color and D32 depth are universally supported.
    assert!(backend.is_render_target_format_supported(Format::RGBA8));
    assert!(backend.is_render_target_format_supported(Format::Depth32Float));
    assert!(!backend.is_render_target_format_supported(Format::Invalid));
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_buffer() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let data: Vec<u8> = (0..64).collect();
    let buffer = backend.create_buffer(1024, &data).unwrap();
    assert!(buffer.is_valid());

    backend.delete_buffer(buffer);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_buffer_memory_returns_to_allocator() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let baseline = backend.mem_stats();

    let buffer = backend.create_buffer(4096, &[0u8; 4096]).unwrap();
    let with_buffer = backend.mem_stats();
    assert!(with_buffer.sub_allocation_count > baseline.sub_allocation_count);

    backend.delete_buffer(buffer);
    let after = backend.mem_stats();
    assert_eq!(after.sub_allocation_count, baseline.sub_allocation_count);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_ephemeral_buffer_lifecycle() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let rt = backend
        .create_render_target(
            &RenderTargetDesc::new()
                .width(800)
                .height(600)
                .format(Format::RGBA8)
                .name("present target"),
        )
        .unwrap();

    backend.begin_frame().unwrap();
    let ephemeral = backend
        .create_ephemeral_buffer(256, &[7u8; 64])
        .unwrap();
    assert!(ephemeral.is_valid());
    backend.present_frame(rt).unwrap();

    backend.delete_render_target(rt);
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_texture_with_data() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    // 4x4 RGBA texture, 64 bytes
    let data: Vec<u8> = (0..64).collect();
    let texture = backend
        .create_texture(
            &TextureDesc::new()
                .width(4)
                .height(4)
                .format(Format::RGBA8)
                .mip_level_data(0, data)
                .name("test texture"),
        )
        .unwrap();
    assert!(texture.is_valid());

    backend.delete_texture(texture);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_texture_mip_chain() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let texture = backend
        .create_texture(
            &TextureDesc::new()
                .width(8)
                .height(8)
                .format(Format::RGBA8)
                .num_mips(3)
                .mip_level_data(0, vec![0xff; 8 * 8 * 4])
                .mip_level_data(1, vec![0x80; 4 * 4 * 4])
                .mip_level_data(2, vec![0x40; 2 * 2 * 4])
                .name("mip chain"),
        )
        .unwrap();
    assert!(texture.is_valid());

    backend.delete_texture(texture);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_create_sampler() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let sampler = backend
        .create_sampler(
            &SamplerDesc::new()
                .min_filter(FilterMode::Linear)
                .mag_filter(FilterMode::Linear)
                .wrap_mode(WrapMode::Clamp)
                .name("linear clamp"),
        )
        .unwrap();
    assert!(sampler.is_valid());

    backend.delete_sampler(sampler);
}

// ============================================================================
// RENDER TARGET TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_render_target_paired_texture() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let rt = backend
        .create_render_target(
            &RenderTargetDesc::new()
                .width(256)
                .height(256)
                .format(Format::RGBA8)
                .name("color target"),
        )
        .unwrap();

    let texture = backend.render_target_texture(rt);
    assert!(texture.is_valid());

    // The paired texture goes away with the render target.
    backend.delete_render_target(rt);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_depth_render_target() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let rt = backend
        .create_render_target(
            &RenderTargetDesc::new()
                .width(256)
                .height(256)
                .format(Format::Depth32Float)
                .name("depth target"),
        )
        .unwrap();
    assert!(rt.is_valid());

    backend.delete_render_target(rt);
}

#[test]
#[ignore] // Requires GPU
#[should_panic(expected = "format does not match render pass")]
fn test_vulkan_framebuffer_format_mismatch_rejected() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    // Pass declares UNORM, target is sRGB; the two must not pair up.
    let rt = backend
        .create_render_target(
            &RenderTargetDesc::new()
                .width(256)
                .height(256)
                .format(Format::SRGBA8)
                .name("srgb target"),
        )
        .unwrap();
    let pass = backend
        .create_render_pass(
            &RenderPassDesc::new()
                .color(0, Format::RGBA8, LoadOp::Clear)
                .name("unorm pass"),
        )
        .unwrap();
    let _ = backend.create_framebuffer(
        &FramebufferDesc::new()
            .render_pass(pass)
            .color(0, rt)
            .name("mismatched fb"),
    );
}

// ============================================================================
// FRAME LOOP TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
fn test_vulkan_clear_and_present() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let rt = backend
        .create_render_target(
            &RenderTargetDesc::new()
                .width(800)
                .height(600)
                .format(Format::RGBA8)
                .name("scene color"),
        )
        .unwrap();
    let pass = backend
        .create_render_pass(
            &RenderPassDesc::new()
                .color(0, Format::RGBA8, LoadOp::Clear)
                .clear_color([0.2, 0.3, 0.4, 1.0])
                .name("clear pass"),
        )
        .unwrap();
    let fb = backend
        .create_framebuffer(
            &FramebufferDesc::new()
                .render_pass(pass)
                .color(0, rt)
                .name("scene fb"),
        )
        .unwrap();

    for _ in 0..3 {
        backend.begin_frame().unwrap();
        backend.begin_render_pass(pass, fb);
        backend.set_viewport(0, 0, 800, 600);
        backend.set_scissor_rect(0, 0, 800, 600);
        backend.end_render_pass();
        backend.present_frame(rt).unwrap();
    }

    backend.wait_idle();
    backend.delete_framebuffer(fb);
    backend.delete_render_pass(pass);
    backend.delete_render_target(rt);
}

#[test]
#[ignore] // Requires GPU
fn test_vulkan_swapchain_recreate() {
    let (window, _event_loop) = create_test_window();
    let mut backend = create_backend(&window);

    let mut desc = RendererDesc::default().swapchain;
    desc.width = 640;
    desc.height = 480;
    backend.set_swapchain_desc(&desc).unwrap();

    let size = backend.drawable_size();
    assert!(size.x > 0);
    assert!(size.y > 0);
}
