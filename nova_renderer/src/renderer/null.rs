//! Null backend
//!
//! A complete CPU-only [`RenderBackend`]: every operation finishes
//! immediately, buffer contents are held in host memory, and draws only
//! count. It enforces the same lifecycle contracts as the GPU backends
//! (handle liveness, ephemeral frame tagging, attachment compatibility),
//! which makes it the reference implementation the renderer's own tests
//! run against.

use glam::UVec2;

use crate::error::{Error, Result};
use crate::renderer::container::ResourceContainer;
use crate::renderer::descriptor::{
    read_binding, validate_layout, BoundResource, DescriptorLayoutEntry,
};
use crate::renderer::device::{MemoryStats, RenderBackend, RendererDesc};
use crate::renderer::format::Format;
use crate::renderer::framebuffer::FramebufferDesc;
use crate::renderer::handle::{
    tags, BufferHandle, DSLayoutHandle, FragmentShaderHandle, FramebufferHandle, PipelineHandle,
    RenderPassHandle, RenderTargetHandle, SamplerHandle, TextureHandle, VertexShaderHandle,
};
use crate::renderer::pipeline::PipelineDesc;
use crate::renderer::render_pass::RenderPassDesc;
use crate::renderer::render_target::RenderTargetDesc;
use crate::renderer::ring_buffer::RingBufferAllocator;
use crate::renderer::sampler::SamplerDesc;
use crate::renderer::shader::ShaderMacros;
use crate::renderer::swapchain::SwapchainDesc;
use crate::renderer::texture::{TextureDesc, TextureUsage};

/// Offset alignment the null backend pretends its "device" requires
const EPHEMERAL_ALIGN: u32 = 256;

enum BufferStorage {
    /// Host-owned copy of a persistent buffer's contents
    Persistent(Vec<u8>),
    /// Range of the ring storage; valid only during `frame` tag's frame
    Ephemeral { offset: u32, size: u32, frame: u64 },
}

struct NullBuffer {
    storage: BufferStorage,
    size: u32,
}

struct NullTexture {
    width: u32,
    height: u32,
    format: Format,
    /// Bytes the texture "occupies" on the pretend device
    bytes: u64,
    /// Paired view of a render target; retired with it, not deletable alone
    render_target_view: bool,
}

struct NullRenderTarget {
    width: u32,
    height: u32,
    format: Format,
    usage: TextureUsage,
    texture: TextureHandle,
}

struct NullFramebuffer {
    render_pass: RenderPassHandle,
    width: u32,
    height: u32,
}

/// CPU-only backend for tests and headless use
pub struct NullBackend {
    buffers: ResourceContainer<tags::Buffer, NullBuffer>,
    textures: ResourceContainer<tags::Texture, NullTexture>,
    samplers: ResourceContainer<tags::Sampler, SamplerDesc>,
    render_targets: ResourceContainer<tags::RenderTarget, NullRenderTarget>,
    render_passes: ResourceContainer<tags::RenderPass, RenderPassDesc>,
    framebuffers: ResourceContainer<tags::Framebuffer, NullFramebuffer>,
    pipelines: ResourceContainer<tags::Pipeline, PipelineDesc>,
    vertex_shaders: ResourceContainer<tags::VertexShader, String>,
    fragment_shaders: ResourceContainer<tags::FragmentShader, String>,
    ds_layouts: ResourceContainer<tags::DescriptorSetLayout, Vec<DescriptorLayoutEntry>>,

    ring: RingBufferAllocator,
    ring_storage: Vec<u8>,
    /// Ephemeral handles to retire at present
    ephemerals: Vec<BufferHandle>,

    swapchain: SwapchainDesc,
    frame_num: u64,

    allocation_count: u32,
    used_bytes: u64,

    draw_count: u64,
    /// Most recent bindings per set index, for test introspection
    bound_sets: Vec<Vec<BoundResource>>,
}

impl NullBackend {
    pub fn new(desc: &RendererDesc) -> Self {
        Self {
            buffers: ResourceContainer::new(),
            textures: ResourceContainer::new(),
            samplers: ResourceContainer::new(),
            render_targets: ResourceContainer::new(),
            render_passes: ResourceContainer::new(),
            framebuffers: ResourceContainer::new(),
            pipelines: ResourceContainer::new(),
            vertex_shaders: ResourceContainer::new(),
            fragment_shaders: ResourceContainer::new(),
            ds_layouts: ResourceContainer::new(),
            ring: RingBufferAllocator::new(desc.ephemeral_ring_buf_size),
            ring_storage: vec![0; desc.ephemeral_ring_buf_size as usize],
            ephemerals: Vec::new(),
            swapchain: desc.swapchain,
            frame_num: 0,
            allocation_count: 0,
            used_bytes: 0,
            draw_count: 0,
            bound_sets: Vec::new(),
        }
    }

    /// Number of draw calls issued since creation
    pub fn draw_count(&self) -> u64 {
        self.draw_count
    }

    /// Bindings recorded by the last `bind_descriptor_set` at `index`
    pub fn bound_set(&self, index: u32) -> &[BoundResource] {
        &self.bound_sets[index as usize]
    }

    /// Current contents of a buffer, persistent or ephemeral.
    ///
    /// # Panics
    ///
    /// Panics on a dead handle or an ephemeral buffer from an earlier frame.
    pub fn buffer_bytes(&self, handle: BufferHandle) -> &[u8] {
        let buffer = self.buffers.get(handle);
        match &buffer.storage {
            BufferStorage::Persistent(data) => data,
            BufferStorage::Ephemeral { offset, size, frame } => {
                assert_eq!(
                    *frame, self.frame_num,
                    "ephemeral buffer used outside the frame that created it"
                );
                &self.ring_storage[*offset as usize..(*offset + *size) as usize]
            }
        }
    }

    fn check_buffer_usable(&self, handle: BufferHandle) {
        let buffer = self.buffers.get(handle);
        if let BufferStorage::Ephemeral { frame, .. } = buffer.storage {
            assert_eq!(
                frame, self.frame_num,
                "ephemeral buffer used outside the frame that created it"
            );
        }
    }

    fn texture_bytes(desc: &TextureDesc) -> u64 {
        let bpp = desc.get_format().bytes_per_pixel() as u64;
        let mut total = 0u64;
        for level in 0..desc.get_num_mips() {
            let w = (desc.get_width() >> level).max(1) as u64;
            let h = (desc.get_height() >> level).max(1) as u64;
            total += w * h * bpp;
        }
        total
    }

    fn check_binding_live(&self, binding: &BoundResource) -> Result<()> {
        let live = match binding {
            BoundResource::UniformBuffer(h) | BoundResource::StorageBuffer(h) => {
                if self.buffers.contains(*h) {
                    self.check_buffer_usable(*h);
                    true
                } else {
                    false
                }
            }
            BoundResource::Sampler(h) => self.samplers.contains(*h),
            BoundResource::Texture(h) => self.textures.contains(*h),
            BoundResource::CombinedSampler(cs) => {
                self.textures.contains(cs.tex) && self.samplers.contains(cs.sampler)
            }
        };
        if live {
            Ok(())
        } else {
            Err(Error::InvalidHandle("descriptor set binding"))
        }
    }
}

impl RenderBackend for NullBackend {
    fn is_render_target_format_supported(&self, format: Format) -> bool {
        format != Format::Invalid
    }

    fn drawable_size(&self) -> UVec2 {
        UVec2::new(self.swapchain.width, self.swapchain.height)
    }

    fn mem_stats(&self) -> MemoryStats {
        MemoryStats {
            allocation_count: self.allocation_count,
            sub_allocation_count: self.ephemerals.len() as u32,
            used_bytes: self.used_bytes,
            unused_bytes: self.ring.remaining() as u64,
        }
    }

    fn create_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        assert!(size > 0, "zero-sized buffer");
        assert!(contents.len() <= size as usize, "buffer contents exceed size");
        let mut data = contents.to_vec();
        data.resize(size as usize, 0);
        self.allocation_count += 1;
        self.used_bytes += u64::from(size);
        Ok(self.buffers.add(NullBuffer {
            storage: BufferStorage::Persistent(data),
            size,
        }))
    }

    fn create_ephemeral_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        assert!(size > 0, "zero-sized buffer");
        assert!(contents.len() <= size as usize, "buffer contents exceed size");
        let offset = self.ring.allocate(size, EPHEMERAL_ALIGN);
        let dst = &mut self.ring_storage[offset as usize..(offset as usize + contents.len())];
        dst.copy_from_slice(contents);
        let handle = self.buffers.add(NullBuffer {
            storage: BufferStorage::Ephemeral {
                offset,
                size,
                frame: self.frame_num,
            },
            size,
        });
        self.ephemerals.push(handle);
        Ok(handle)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        desc.validate();
        let bytes = Self::texture_bytes(desc);
        self.allocation_count += 1;
        self.used_bytes += bytes;
        Ok(self.textures.add(NullTexture {
            width: desc.get_width(),
            height: desc.get_height(),
            format: desc.get_format(),
            bytes,
            render_target_view: false,
        }))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        Ok(self.samplers.add(desc.clone()))
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        desc.validate();
        let bytes = u64::from(desc.get_width())
            * u64::from(desc.get_height())
            * u64::from(desc.get_format().bytes_per_pixel());
        self.allocation_count += 1;
        self.used_bytes += bytes;
        let texture = self.textures.add(NullTexture {
            width: desc.get_width(),
            height: desc.get_height(),
            format: desc.get_format(),
            bytes: 0,
            render_target_view: true,
        });
        Ok(self.render_targets.add(NullRenderTarget {
            width: desc.get_width(),
            height: desc.get_height(),
            format: desc.get_format(),
            usage: desc.get_usage(),
            texture,
        }))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        Ok(self.render_passes.add(desc.clone()))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        desc.validate();
        let pass = self.render_passes.get(desc.get_render_pass()).clone();

        let mut width = 0;
        let mut height = 0;
        let mut check_attachment = |rt_handle: RenderTargetHandle, expected: Format| {
            let rt = self.render_targets.get(rt_handle);
            assert_eq!(
                rt.format, expected,
                "framebuffer attachment format does not match render pass"
            );
            if width == 0 {
                width = rt.width;
                height = rt.height;
            } else {
                assert!(
                    rt.width == width && rt.height == height,
                    "framebuffer attachments must share one size"
                );
            }
        };

        for index in 0..pass.color_count() {
            let rt_handle = desc.get_color(index);
            assert!(
                rt_handle.is_valid(),
                "render pass declares color attachment {} but framebuffer leaves it unbound",
                index
            );
            check_attachment(rt_handle, pass.get_color(index).format());
        }
        if pass.has_depth_stencil() {
            let ds = desc.get_depth_stencil();
            assert!(ds.is_valid(), "render pass declares depth but framebuffer leaves it unbound");
            check_attachment(ds, pass.get_depth_stencil().format());
        }

        Ok(self.framebuffers.add(NullFramebuffer {
            render_pass: desc.get_render_pass(),
            width,
            height,
        }))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        desc.validate();
        assert!(
            self.vertex_shaders.contains(desc.get_vertex_shader()),
            "pipeline vertex shader is not live"
        );
        assert!(
            self.fragment_shaders.contains(desc.get_fragment_shader()),
            "pipeline fragment shader is not live"
        );
        assert!(
            self.render_passes.contains(desc.get_render_pass()),
            "pipeline render pass is not live"
        );
        Ok(self.pipelines.add(desc.clone()))
    }

    fn create_vertex_shader(
        &mut self,
        name: &str,
        _macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle> {
        Ok(self.vertex_shaders.add(name.to_string()))
    }

    fn create_fragment_shader(
        &mut self,
        name: &str,
        _macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle> {
        Ok(self.fragment_shaders.add(name.to_string()))
    }

    fn create_descriptor_set_layout(
        &mut self,
        entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle> {
        validate_layout(entries);
        Ok(self.ds_layouts.add(entries.to_vec()))
    }

    fn render_target_texture(&self, handle: RenderTargetHandle) -> TextureHandle {
        let rt = self.render_targets.get(handle);
        assert!(
            rt.usage.contains(TextureUsage::SAMPLED),
            "render target was not created with sampled usage"
        );
        rt.texture
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        let buffer = self.buffers.get(handle);
        assert!(
            matches!(buffer.storage, BufferStorage::Persistent(_)),
            "ephemeral buffers are freed at present, not deleted"
        );
        let buffer = self.buffers.remove(handle);
        self.allocation_count -= 1;
        self.used_bytes -= u64::from(buffer.size);
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        assert!(
            !self.textures.get(handle).render_target_view,
            "render target textures are retired by delete_render_target"
        );
        let texture = self.textures.remove(handle);
        self.allocation_count -= 1;
        self.used_bytes -= texture.bytes;
    }

    fn delete_sampler(&mut self, handle: SamplerHandle) {
        self.samplers.remove(handle);
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        let rt = self.render_targets.remove(handle);
        self.textures.remove(rt.texture);
        self.allocation_count -= 1;
        self.used_bytes -= u64::from(rt.width) * u64::from(rt.height)
            * u64::from(rt.format.bytes_per_pixel());
    }

    fn delete_render_pass(&mut self, handle: RenderPassHandle) {
        self.render_passes.remove(handle);
    }

    fn delete_framebuffer(&mut self, handle: FramebufferHandle) {
        self.framebuffers.remove(handle);
    }

    fn delete_pipeline(&mut self, handle: PipelineHandle) {
        self.pipelines.remove(handle);
    }

    fn delete_vertex_shader(&mut self, handle: VertexShaderHandle) {
        self.vertex_shaders.remove(handle);
    }

    fn delete_fragment_shader(&mut self, handle: FragmentShaderHandle) {
        self.fragment_shaders.remove(handle);
    }

    fn delete_descriptor_set_layout(&mut self, handle: DSLayoutHandle) {
        self.ds_layouts.remove(handle);
    }

    fn set_swapchain_desc(&mut self, desc: &SwapchainDesc) -> Result<()> {
        self.swapchain = *desc;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    fn present_frame(&mut self, render_target: RenderTargetHandle) -> Result<()> {
        assert!(
            self.render_targets.contains(render_target),
            "presenting a dead render target"
        );
        assert!(
            self.render_targets.get(render_target).usage.contains(TextureUsage::TRANSFER_SRC),
            "render target was not created with transfer-src usage"
        );

        // The "fence" has signaled instantly, so reclaim frame resources now.
        for handle in self.ephemerals.drain(..) {
            self.buffers.remove(handle);
        }
        self.ring.reset();
        self.buffers.recycle();
        self.textures.recycle();
        self.samplers.recycle();
        self.render_targets.recycle();
        self.render_passes.recycle();
        self.framebuffers.recycle();
        self.pipelines.recycle();
        self.vertex_shaders.recycle();
        self.fragment_shaders.recycle();
        self.ds_layouts.recycle();
        self.frame_num += 1;
        Ok(())
    }

    fn begin_render_pass(&mut self, render_pass: RenderPassHandle, framebuffer: FramebufferHandle) {
        let fb = self.framebuffers.get(framebuffer);
        assert_eq!(
            fb.render_pass, render_pass,
            "framebuffer was created against a different render pass"
        );
        assert!(self.render_passes.contains(render_pass), "dead render pass");
        let _ = (fb.width, fb.height);
    }

    fn end_render_pass(&mut self) {}

    fn set_viewport(&mut self, _x: u32, _y: u32, _width: u32, _height: u32) {}

    fn set_scissor_rect(&mut self, _x: u32, _y: u32, _width: u32, _height: u32) {}

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        assert!(self.pipelines.contains(pipeline), "binding a dead pipeline");
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, _bit16: bool) {
        self.check_buffer_usable(buffer);
    }

    fn bind_vertex_buffer(&mut self, _binding: u32, buffer: BufferHandle) {
        self.check_buffer_usable(buffer);
    }

    fn bind_descriptor_set(
        &mut self,
        index: u32,
        layout: DSLayoutHandle,
        data: &[u8],
    ) -> Result<()> {
        let entries = self.ds_layouts.get(layout).clone();
        let mut bindings = Vec::with_capacity(entries.len());
        for entry in &entries {
            let binding = read_binding(entry, data);
            self.check_binding_live(&binding)?;
            bindings.push(binding);
        }
        if self.bound_sets.len() <= index as usize {
            self.bound_sets.resize(index as usize + 1, Vec::new());
        }
        self.bound_sets[index as usize] = bindings;
        Ok(())
    }

    fn draw(&mut self, _first_vertex: u32, vertex_count: u32) {
        assert!(vertex_count > 0, "draw with zero vertices");
        self.draw_count += 1;
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        assert!(index_count > 0, "draw with zero indices");
        assert!(instance_count > 0, "draw with zero instances");
        self.draw_count += 1;
    }

    fn draw_indexed_offset(&mut self, index_count: u32, _first_index: u32) {
        assert!(index_count > 0, "draw with zero indices");
        self.draw_count += 1;
    }

    fn wait_idle(&mut self) {}
}

#[cfg(test)]
#[path = "null_tests.rs"]
mod tests;
