//! Renderer facade
//!
//! The [`Renderer`] is the single entry point applications talk to. It
//! owns a boxed [`RenderBackend`] plus the [`FrameContext`] state machine,
//! enforces call-ordering contracts before delegating, and keeps the
//! frame counter consistent even when presentation fails.

use glam::UVec2;

use crate::error::Result;
use crate::render_info;
use crate::renderer::descriptor::DescriptorLayoutEntry;
use crate::renderer::device::{MemoryStats, RenderBackend};
use crate::renderer::format::Format;
use crate::renderer::frame::{FrameContext, FrameState};
use crate::renderer::framebuffer::FramebufferDesc;
use crate::renderer::handle::{
    BufferHandle, DSLayoutHandle, FragmentShaderHandle, FramebufferHandle, PipelineHandle,
    RenderPassHandle, RenderTargetHandle, SamplerHandle, TextureHandle, VertexShaderHandle,
};
use crate::renderer::pipeline::PipelineDesc;
use crate::renderer::render_pass::RenderPassDesc;
use crate::renderer::render_target::RenderTargetDesc;
use crate::renderer::sampler::SamplerDesc;
use crate::renderer::shader::ShaderMacros;
use crate::renderer::swapchain::SwapchainDesc;
use crate::renderer::texture::TextureDesc;

/// Backend-agnostic renderer front end
pub struct Renderer {
    backend: Box<dyn RenderBackend>,
    frame: FrameContext,
}

impl Renderer {
    /// Wrap an already-initialized backend
    pub fn new(backend: Box<dyn RenderBackend>) -> Self {
        render_info!("Renderer", "Renderer initialized");
        Self {
            backend,
            frame: FrameContext::new(),
        }
    }

    pub fn state(&self) -> FrameState {
        self.frame.state()
    }

    /// Number of frames presented so far
    pub fn frame_num(&self) -> u64 {
        self.frame.frame_num()
    }

    // ===== Capabilities =====

    pub fn is_render_target_format_supported(&self, format: Format) -> bool {
        self.backend.is_render_target_format_supported(format)
    }

    pub fn drawable_size(&self) -> UVec2 {
        self.backend.drawable_size()
    }

    pub fn mem_stats(&self) -> MemoryStats {
        self.backend.mem_stats()
    }

    // ===== Resources =====

    pub fn create_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        self.backend.create_buffer(size, contents)
    }

    /// Frame-scoped buffer; only legal inside a frame, freed at present
    pub fn create_ephemeral_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        self.frame.create_ephemeral();
        self.backend.create_ephemeral_buffer(size, contents)
    }

    pub fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        self.backend.create_texture(desc)
    }

    pub fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        self.backend.create_sampler(desc)
    }

    pub fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        self.backend.create_render_target(desc)
    }

    pub fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        self.backend.create_render_pass(desc)
    }

    pub fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        self.backend.create_framebuffer(desc)
    }

    pub fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        self.backend.create_pipeline(desc)
    }

    pub fn create_vertex_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle> {
        self.backend.create_vertex_shader(name, macros)
    }

    pub fn create_fragment_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle> {
        self.backend.create_fragment_shader(name, macros)
    }

    pub fn create_descriptor_set_layout(
        &mut self,
        entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle> {
        self.backend.create_descriptor_set_layout(entries)
    }

    /// Sampled-texture view of a render target; don't cache across
    /// swapchain changes
    pub fn render_target_texture(&self, handle: RenderTargetHandle) -> TextureHandle {
        self.backend.render_target_texture(handle)
    }

    pub fn delete_buffer(&mut self, handle: BufferHandle) {
        self.backend.delete_buffer(handle);
    }

    pub fn delete_texture(&mut self, handle: TextureHandle) {
        self.backend.delete_texture(handle);
    }

    pub fn delete_sampler(&mut self, handle: SamplerHandle) {
        self.backend.delete_sampler(handle);
    }

    pub fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        self.backend.delete_render_target(handle);
    }

    pub fn delete_render_pass(&mut self, handle: RenderPassHandle) {
        self.backend.delete_render_pass(handle);
    }

    pub fn delete_framebuffer(&mut self, handle: FramebufferHandle) {
        self.backend.delete_framebuffer(handle);
    }

    pub fn delete_pipeline(&mut self, handle: PipelineHandle) {
        self.backend.delete_pipeline(handle);
    }

    pub fn delete_vertex_shader(&mut self, handle: VertexShaderHandle) {
        self.backend.delete_vertex_shader(handle);
    }

    pub fn delete_fragment_shader(&mut self, handle: FragmentShaderHandle) {
        self.backend.delete_fragment_shader(handle);
    }

    pub fn delete_descriptor_set_layout(&mut self, handle: DSLayoutHandle) {
        self.backend.delete_descriptor_set_layout(handle);
    }

    // ===== Swapchain =====

    /// Rebuild the swapchain; only legal between frames
    pub fn set_swapchain_desc(&mut self, desc: &SwapchainDesc) -> Result<()> {
        self.frame.change_swapchain();
        self.backend.set_swapchain_desc(desc)
    }

    // ===== Frame loop =====

    pub fn begin_frame(&mut self) -> Result<()> {
        self.frame.begin_frame();
        self.backend.begin_frame()
    }

    /// Present `render_target`. The frame always closes and the frame
    /// counter always advances, even when the backend reports
    /// `SwapchainOutOfDate`/`SurfaceLost`, so the caller recreates the
    /// swapchain from a clean state.
    pub fn present_frame(&mut self, render_target: RenderTargetHandle) -> Result<()> {
        self.frame.present_frame();
        self.backend.present_frame(render_target)
    }

    pub fn begin_render_pass(
        &mut self,
        render_pass: RenderPassHandle,
        framebuffer: FramebufferHandle,
    ) {
        self.frame.begin_render_pass();
        self.backend.begin_render_pass(render_pass, framebuffer);
    }

    pub fn end_render_pass(&mut self) {
        self.frame.end_render_pass();
        self.backend.end_render_pass();
    }

    pub fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.frame.set_dynamic_state();
        self.backend.set_viewport(x, y, width, height);
    }

    pub fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        self.frame.set_dynamic_state();
        self.backend.set_scissor_rect(x, y, width, height);
    }

    pub fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        assert!(pipeline.is_valid(), "bind_pipeline with empty handle");
        self.frame.bind_pipeline();
        self.backend.bind_pipeline(pipeline);
    }

    pub fn bind_index_buffer(&mut self, buffer: BufferHandle, bit16: bool) {
        self.frame.bind_buffer();
        self.backend.bind_index_buffer(buffer, bit16);
    }

    pub fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        self.frame.bind_buffer();
        self.backend.bind_vertex_buffer(binding, buffer);
    }

    /// Bind one descriptor set from the bytes of a POD binding struct
    pub fn bind_descriptor_set(
        &mut self,
        index: u32,
        layout: DSLayoutHandle,
        data: &[u8],
    ) -> Result<()> {
        self.frame.bind_descriptor_set();
        self.backend.bind_descriptor_set(index, layout, data)
    }

    pub fn draw(&mut self, first_vertex: u32, vertex_count: u32) {
        self.frame.draw();
        self.backend.draw(first_vertex, vertex_count);
    }

    pub fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        self.frame.draw();
        self.backend.draw_indexed_instanced(index_count, instance_count);
    }

    pub fn draw_indexed_offset(&mut self, index_count: u32, first_index: u32) {
        self.frame.draw();
        self.backend.draw_indexed_offset(index_count, first_index);
    }

    // ===== Teardown =====

    /// Block until the device is idle; call before deleting resources the
    /// GPU may still reference
    pub fn wait_idle(&mut self) {
        self.backend.wait_idle();
    }
}

#[cfg(test)]
#[path = "renderer_tests.rs"]
mod tests;
