//! Backend device interface
//!
//! One implementation per graphics API. The explicit backend (Vulkan)
//! records command buffers and synchronizes manually with fences; the
//! immediate-mode backend (OpenGL) issues driver-managed calls; the null
//! backend completes everything instantly on the CPU so the rest of the
//! stack is testable without a GPU.
//!
//! Backends may assume the facade has already enforced frame/render-pass
//! call ordering; they still own all resource-lifecycle checks (handle
//! liveness, ephemeral frame tagging, attachment compatibility).

use glam::UVec2;

use crate::error::Result;
use crate::renderer::descriptor::DescriptorLayoutEntry;
use crate::renderer::format::Format;
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

/// Renderer configuration
#[derive(Debug, Clone)]
pub struct RendererDesc {
    /// Enable validation/debug layers where the backend has them
    pub debug: bool,
    /// Capacity of the ephemeral ring buffer in bytes
    pub ephemeral_ring_buf_size: u32,
    /// Initial swapchain configuration
    pub swapchain: SwapchainDesc,
}

impl Default for RendererDesc {
    fn default() -> Self {
        Self {
            debug: cfg!(debug_assertions),
            ephemeral_ring_buf_size: 1048576,
            swapchain: SwapchainDesc::default(),
        }
    }
}

/// GPU memory statistics reported by the backend's allocator
#[derive(Debug, Clone, Copy, Default)]
pub struct MemoryStats {
    /// Number of live device-memory allocations
    pub allocation_count: u32,
    /// Number of live sub-allocations inside those blocks
    pub sub_allocation_count: u32,
    pub used_bytes: u64,
    pub unused_bytes: u64,
}

/// Backend device: resource lifecycle + command recording for one API.
///
/// Object-safe; the facade owns a `Box<dyn RenderBackend>` selected at
/// construction. All methods are driven from the single frame-loop thread.
pub trait RenderBackend {
    // ===== Capabilities =====

    /// Whether `format` can back a render target on this device
    fn is_render_target_format_supported(&self, format: Format) -> bool;

    /// Current drawable surface size in pixels
    fn drawable_size(&self) -> UVec2;

    /// Allocator statistics; creation counts grow by one per `create*` call
    fn mem_stats(&self) -> MemoryStats;

    // ===== Resource creation =====

    /// Create a persistent buffer and upload `contents` before returning.
    ///
    /// The explicit backend writes the bytes through a host-visible
    /// mapping; the immediate-mode backend hands them straight to the
    /// driver.
    fn create_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle>;

    /// Create a buffer valid only for the current frame, backed by the
    /// ring buffer. Implicitly freed at present.
    fn create_ephemeral_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle>;

    /// Create a texture: one image per mip level, data uploaded through the
    /// staging path, layouts transitioned undefined → transfer-dst →
    /// shader-read as one logical operation.
    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle>;

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle>;

    /// Create a render target plus its paired texture entry sharing the
    /// same image and view
    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle>;

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassHandle>;

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle>;

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle>;

    fn create_vertex_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle>;

    fn create_fragment_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle>;

    fn create_descriptor_set_layout(
        &mut self,
        entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle>;

    /// The sampled-texture view of a render target. May be ephemeral after
    /// swapchain changes; don't store across frames.
    fn render_target_texture(&self, handle: RenderTargetHandle) -> TextureHandle;

    // ===== Resource deletion =====
    //
    // Deleting a handle once is required; deleting it again is a
    // programming error. Device memory goes back to the allocator on every
    // delete.

    fn delete_buffer(&mut self, handle: BufferHandle);
    fn delete_texture(&mut self, handle: TextureHandle);
    fn delete_sampler(&mut self, handle: SamplerHandle);
    fn delete_render_target(&mut self, handle: RenderTargetHandle);
    fn delete_render_pass(&mut self, handle: RenderPassHandle);
    fn delete_framebuffer(&mut self, handle: FramebufferHandle);
    fn delete_pipeline(&mut self, handle: PipelineHandle);
    fn delete_vertex_shader(&mut self, handle: VertexShaderHandle);
    fn delete_fragment_shader(&mut self, handle: FragmentShaderHandle);
    fn delete_descriptor_set_layout(&mut self, handle: DSLayoutHandle);

    // ===== Swapchain =====

    /// Destroy and rebuild the presentable-image chain. Only called
    /// between frames; touches no other resource.
    fn set_swapchain_desc(&mut self, desc: &SwapchainDesc) -> Result<()>;

    // ===== Frame control =====

    fn begin_frame(&mut self) -> Result<()>;

    /// Transition `render_target` to a presentable layout, blit it into the
    /// next swapchain image, submit the frame, wait for the frame fence,
    /// then recycle ephemeral buffers, reset the ring cursor, and reset
    /// per-frame descriptor pools.
    ///
    /// Fails with `SwapchainOutOfDate`/`SurfaceLost` when no image is
    /// acquirable so the caller can run its recreation path.
    fn present_frame(&mut self, render_target: RenderTargetHandle) -> Result<()>;

    fn begin_render_pass(&mut self, render_pass: RenderPassHandle, framebuffer: FramebufferHandle);

    fn end_render_pass(&mut self);

    // ===== Drawing =====

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32);

    fn bind_pipeline(&mut self, pipeline: PipelineHandle);

    fn bind_index_buffer(&mut self, buffer: BufferHandle, bit16: bool);

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle);

    /// Write backend-native bindings for one descriptor set from a POD
    /// struct's bytes, per the layout's (type, offset) entries
    fn bind_descriptor_set(
        &mut self,
        index: u32,
        layout: DSLayoutHandle,
        data: &[u8],
    ) -> Result<()>;

    fn draw(&mut self, first_vertex: u32, vertex_count: u32);

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32);

    fn draw_indexed_offset(&mut self, index_count: u32, first_index: u32);

    // ===== Teardown =====

    /// Block until the device has finished all submitted work
    fn wait_idle(&mut self);
}
