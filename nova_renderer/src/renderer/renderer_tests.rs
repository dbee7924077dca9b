use glam::UVec2;

use crate::error::{Error, Result};
use crate::renderer::descriptor::{CombinedSampler, DescriptorLayoutEntry, DescriptorType};
use crate::renderer::device::{MemoryStats, RenderBackend, RendererDesc};
use crate::renderer::format::Format;
use crate::renderer::frame::FrameState;
use crate::renderer::framebuffer::FramebufferDesc;
use crate::renderer::handle::{
    BufferHandle, DSLayoutHandle, FragmentShaderHandle, FramebufferHandle, PipelineHandle,
    RenderPassHandle, RenderTargetHandle, SamplerHandle, TextureHandle, VertexShaderHandle,
};
use crate::renderer::null::NullBackend;
use crate::renderer::pipeline::PipelineDesc;
use crate::renderer::render_pass::{LoadOp, RenderPassDesc};
use crate::renderer::render_target::RenderTargetDesc;
use crate::renderer::renderer::Renderer;
use crate::renderer::sampler::SamplerDesc;
use crate::renderer::shader::ShaderMacros;
use crate::renderer::swapchain::SwapchainDesc;
use crate::renderer::texture::TextureDesc;

fn renderer() -> Renderer {
    Renderer::new(Box::new(NullBackend::new(&RendererDesc::default())))
}

struct Scene {
    render_target: RenderTargetHandle,
    render_pass: RenderPassHandle,
    framebuffer: FramebufferHandle,
    pipeline: PipelineHandle,
}

fn build_scene(r: &mut Renderer) -> Scene {
    let macros = ShaderMacros::default();
    let vs = r.create_vertex_shader("tri", &macros).unwrap();
    let fs = r.create_fragment_shader("flat", &macros).unwrap();

    let render_pass = r
        .create_render_pass(
            &RenderPassDesc::new()
                .color(0, Format::RGBA8, LoadOp::Clear)
                .clear_color([0.0, 0.0, 0.0, 1.0])
                .name("main"),
        )
        .unwrap();

    let render_target = r
        .create_render_target(
            &RenderTargetDesc::new()
                .width(128)
                .height(128)
                .format(Format::RGBA8)
                .name("main color"),
        )
        .unwrap();

    let framebuffer = r
        .create_framebuffer(
            &FramebufferDesc::new()
                .render_pass(render_pass)
                .color(0, render_target)
                .name("main"),
        )
        .unwrap();

    let pipeline = r
        .create_pipeline(
            &PipelineDesc::new()
                .vertex_shader(vs)
                .fragment_shader(fs)
                .render_pass(render_pass)
                .name("tri"),
        )
        .unwrap();

    Scene {
        render_target,
        render_pass,
        framebuffer,
        pipeline,
    }
}

#[test]
fn test_full_frame_through_facade() {
    let mut r = renderer();
    let scene = build_scene(&mut r);

    r.begin_frame().unwrap();
    let vbo = r.create_ephemeral_buffer(64, &[0; 64]).unwrap();
    r.begin_render_pass(scene.render_pass, scene.framebuffer);
    r.set_viewport(0, 0, 128, 128);
    r.bind_pipeline(scene.pipeline);
    r.bind_vertex_buffer(0, vbo);
    r.draw(0, 3);
    r.end_render_pass();
    r.present_frame(scene.render_target).unwrap();

    assert_eq!(r.state(), FrameState::Idle);
    assert_eq!(r.frame_num(), 1);
}

#[test]
fn test_descriptor_routing_through_facade() {
    let mut r = renderer();
    let scene = build_scene(&mut r);

    let ubo = r.create_buffer(256, &[0; 256]).unwrap();
    let tex = r
        .create_texture(
            &TextureDesc::new()
                .width(2)
                .height(2)
                .format(Format::RGBA8)
                .mip_level_data(0, vec![0xff; 16])
                .name("checker"),
        )
        .unwrap();
    let sampler = r.create_sampler(&SamplerDesc::new().name("nearest")).unwrap();

    let layout = r
        .create_descriptor_set_layout(&[
            DescriptorLayoutEntry {
                descriptor_type: DescriptorType::UniformBuffer,
                offset: 0,
            },
            DescriptorLayoutEntry {
                descriptor_type: DescriptorType::CombinedSampler,
                offset: 4,
            },
        ])
        .unwrap();

    #[repr(C)]
    #[derive(Clone, Copy)]
    struct Bindings {
        ubo: BufferHandle,
        color: CombinedSampler,
    }
    unsafe impl bytemuck::Zeroable for Bindings {}
    unsafe impl bytemuck::Pod for Bindings {}

    let bindings = Bindings {
        ubo,
        color: CombinedSampler { tex, sampler },
    };

    r.begin_frame().unwrap();
    r.begin_render_pass(scene.render_pass, scene.framebuffer);
    r.bind_pipeline(scene.pipeline);
    r.bind_descriptor_set(0, layout, bytemuck::bytes_of(&bindings)).unwrap();
    r.draw(0, 3);
    r.end_render_pass();
    r.present_frame(scene.render_target).unwrap();
}

#[test]
#[should_panic(expected = "only legal inside a frame")]
fn test_ephemeral_outside_frame_panics() {
    let mut r = renderer();
    r.create_ephemeral_buffer(64, &[0; 64]).unwrap();
}

#[test]
#[should_panic(expected = "no active render pass")]
fn test_render_pass_outside_frame_panics() {
    let mut r = renderer();
    let scene = build_scene(&mut r);
    r.begin_render_pass(scene.render_pass, scene.framebuffer);
}

#[test]
#[should_panic(expected = "never drawn with")]
fn test_pipeline_rebind_without_draw_panics() {
    let mut r = renderer();
    let scene = build_scene(&mut r);
    r.begin_frame().unwrap();
    r.begin_render_pass(scene.render_pass, scene.framebuffer);
    r.bind_pipeline(scene.pipeline);
    r.bind_pipeline(scene.pipeline);
}

#[test]
#[should_panic(expected = "empty handle")]
fn test_bind_empty_pipeline_panics() {
    let mut r = renderer();
    let scene = build_scene(&mut r);
    r.begin_frame().unwrap();
    r.begin_render_pass(scene.render_pass, scene.framebuffer);
    r.bind_pipeline(PipelineHandle::EMPTY);
}

#[test]
fn test_swapchain_change_between_frames() {
    let mut r = renderer();
    let desc = SwapchainDesc {
        width: 640,
        height: 480,
        ..SwapchainDesc::default()
    };
    r.set_swapchain_desc(&desc).unwrap();
    assert_eq!(r.drawable_size(), UVec2::new(640, 480));
}

#[test]
#[should_panic(expected = "between frames")]
fn test_swapchain_change_inside_frame_panics() {
    let mut r = renderer();
    r.begin_frame().unwrap();
    r.set_swapchain_desc(&SwapchainDesc::default()).unwrap();
}

#[test]
fn test_mem_stats_return_to_baseline() {
    let mut r = renderer();
    let baseline = r.mem_stats().allocation_count;

    let buf = r.create_buffer(1024, &[0; 1024]).unwrap();
    let tex = r
        .create_texture(
            &TextureDesc::new()
                .width(16)
                .height(16)
                .format(Format::RGBA8)
                .mip_level_data(0, vec![0; 1024])
                .name("t"),
        )
        .unwrap();
    assert_eq!(r.mem_stats().allocation_count, baseline + 2);
    assert_eq!(r.mem_stats().used_bytes, 1024 + 1024);

    r.delete_buffer(buf);
    r.delete_texture(tex);
    assert_eq!(r.mem_stats().allocation_count, baseline);
    assert_eq!(r.mem_stats().used_bytes, 0);
}

/// Backend stub whose present always reports an out-of-date swapchain.
/// Only the calls this test makes are implemented.
struct OutOfDatePresent;

impl RenderBackend for OutOfDatePresent {
    fn is_render_target_format_supported(&self, _format: Format) -> bool {
        true
    }
    fn drawable_size(&self) -> UVec2 {
        UVec2::ZERO
    }
    fn mem_stats(&self) -> MemoryStats {
        MemoryStats::default()
    }
    fn create_buffer(&mut self, _size: u32, _contents: &[u8]) -> Result<BufferHandle> {
        unimplemented!()
    }
    fn create_ephemeral_buffer(&mut self, _size: u32, _contents: &[u8]) -> Result<BufferHandle> {
        unimplemented!()
    }
    fn create_texture(&mut self, _desc: &TextureDesc) -> Result<TextureHandle> {
        unimplemented!()
    }
    fn create_sampler(&mut self, _desc: &SamplerDesc) -> Result<SamplerHandle> {
        unimplemented!()
    }
    fn create_render_target(&mut self, _desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        unimplemented!()
    }
    fn create_render_pass(&mut self, _desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        unimplemented!()
    }
    fn create_framebuffer(&mut self, _desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        unimplemented!()
    }
    fn create_pipeline(&mut self, _desc: &PipelineDesc) -> Result<PipelineHandle> {
        unimplemented!()
    }
    fn create_vertex_shader(
        &mut self,
        _name: &str,
        _macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle> {
        unimplemented!()
    }
    fn create_fragment_shader(
        &mut self,
        _name: &str,
        _macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle> {
        unimplemented!()
    }
    fn create_descriptor_set_layout(
        &mut self,
        _entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle> {
        unimplemented!()
    }
    fn render_target_texture(&self, _handle: RenderTargetHandle) -> TextureHandle {
        unimplemented!()
    }
    fn delete_buffer(&mut self, _handle: BufferHandle) {}
    fn delete_texture(&mut self, _handle: TextureHandle) {}
    fn delete_sampler(&mut self, _handle: SamplerHandle) {}
    fn delete_render_target(&mut self, _handle: RenderTargetHandle) {}
    fn delete_render_pass(&mut self, _handle: RenderPassHandle) {}
    fn delete_framebuffer(&mut self, _handle: FramebufferHandle) {}
    fn delete_pipeline(&mut self, _handle: PipelineHandle) {}
    fn delete_vertex_shader(&mut self, _handle: VertexShaderHandle) {}
    fn delete_fragment_shader(&mut self, _handle: FragmentShaderHandle) {}
    fn delete_descriptor_set_layout(&mut self, _handle: DSLayoutHandle) {}
    fn set_swapchain_desc(&mut self, _desc: &SwapchainDesc) -> Result<()> {
        Ok(())
    }
    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }
    fn present_frame(&mut self, _render_target: RenderTargetHandle) -> Result<()> {
        Err(Error::SwapchainOutOfDate)
    }
    fn begin_render_pass(&mut self, _rp: RenderPassHandle, _fb: FramebufferHandle) {}
    fn end_render_pass(&mut self) {}
    fn set_viewport(&mut self, _x: u32, _y: u32, _w: u32, _h: u32) {}
    fn set_scissor_rect(&mut self, _x: u32, _y: u32, _w: u32, _h: u32) {}
    fn bind_pipeline(&mut self, _pipeline: PipelineHandle) {}
    fn bind_index_buffer(&mut self, _buffer: BufferHandle, _bit16: bool) {}
    fn bind_vertex_buffer(&mut self, _binding: u32, _buffer: BufferHandle) {}
    fn bind_descriptor_set(
        &mut self,
        _index: u32,
        _layout: DSLayoutHandle,
        _data: &[u8],
    ) -> Result<()> {
        Ok(())
    }
    fn draw(&mut self, _first_vertex: u32, _vertex_count: u32) {}
    fn draw_indexed_instanced(&mut self, _index_count: u32, _instance_count: u32) {}
    fn draw_indexed_offset(&mut self, _index_count: u32, _first_index: u32) {}
    fn wait_idle(&mut self) {}
}

/// A failed present still closes the frame and advances the counter so the
/// caller can rebuild the swapchain and start the next frame cleanly.
#[test]
fn test_failed_present_still_closes_frame() {
    let mut r = Renderer::new(Box::new(OutOfDatePresent));
    r.begin_frame().unwrap();
    let err = r.present_frame(RenderTargetHandle::from_raw(1)).unwrap_err();
    assert!(matches!(err, Error::SwapchainOutOfDate));
    assert_eq!(r.state(), FrameState::Idle);
    assert_eq!(r.frame_num(), 1);

    r.set_swapchain_desc(&SwapchainDesc::default()).unwrap();
    r.begin_frame().unwrap();
}
