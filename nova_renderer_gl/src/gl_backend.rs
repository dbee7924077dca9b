//! GlBackend - OpenGL implementation of the RenderBackend trait
//!
//! The windowing layer owns the context: `GlBackend::new` receives an
//! already-current `glow::Context` and a callback that swaps the window's
//! buffers. Everything else mirrors the Vulkan backend's resource model:
//! the same containers, the same ephemeral ring discipline, the same
//! per-frame recycle step, just without explicit synchronization.
//!
//! Descriptor sets map onto flat GL binding points: set `s`, binding `b`
//! becomes uniform/storage binding point or texture unit
//! `s * DESCRIPTOR_BINDING_STRIDE + b`. Shader sources must use matching
//! explicit `binding = N` qualifiers.

use glow::HasContext;

use nova_renderer::renderer::{
    read_binding, tags, BoundResource, BufferHandle, DSLayoutHandle, DescriptorLayoutEntry,
    Format, FragmentShaderHandle, FramebufferDesc, FramebufferHandle, LoadOp, MemoryStats,
    PipelineDesc, PipelineHandle, RenderBackend, RenderPassDesc, RenderPassHandle,
    RenderTargetDesc, RenderTargetHandle, RendererDesc, ResourceContainer, RingBufferAllocator,
    SamplerDesc, SamplerHandle, ShaderLoader, ShaderMacros, ShaderStage, SwapchainDesc,
    TextureDesc, TextureHandle, TextureUsage, VertexShaderHandle, MAX_DESCRIPTOR_SETS,
    MAX_VERTEX_BUFFERS,
};
use nova_renderer::renderer::validate_layout;
use nova_renderer::{render_err, render_info, Error, Result};

use crate::gl_format::{
    filter_to_gl, format_attachment, format_to_gl, vertex_format_to_gl, wrap_to_gl,
};

/// Binding points reserved per descriptor set index
const DESCRIPTOR_BINDING_STRIDE: u32 = 8;

struct GlBuffer {
    buffer: glow::Buffer,
    /// Byte offset into `buffer` (nonzero only for ring sub-ranges)
    offset: i32,
    size: i32,
    /// Frame that created this buffer, when ephemeral
    ephemeral_frame: Option<u64>,
}

struct GlTexture {
    texture: glow::Texture,
    format: Format,
    bytes: u64,
    /// True when this entry is the sampled view of a render target
    render_target_view: bool,
}

struct GlSampler {
    sampler: glow::Sampler,
}

struct GlRenderTarget {
    texture: glow::Texture,
    width: u32,
    height: u32,
    format: Format,
    usage: TextureUsage,
    /// Paired entry in the texture container
    texture_handle: TextureHandle,
    bytes: u64,
}

/// Declared attachment shape plus the load/clear behavior replayed at
/// `begin_render_pass`; GL has no pass objects, so the desc's relevant
/// parts are kept verbatim
struct GlRenderPass {
    color_formats: Vec<Format>,
    color_load_ops: Vec<LoadOp>,
    depth_format: Option<Format>,
    depth_load_op: Option<LoadOp>,
    clear_color: [f32; 4],
    clear_depth: f32,
}

struct GlFramebuffer {
    framebuffer: glow::Framebuffer,
    render_pass: RenderPassHandle,
    width: u32,
    height: u32,
}

struct GlPipeline {
    program: glow::Program,
    vao: glow::VertexArray,
    strides: [u32; MAX_VERTEX_BUFFERS],
    depth_test: bool,
    depth_write: bool,
    cull_faces: bool,
    scissor_test: bool,
    blending: bool,
}

struct GlShader {
    shader: glow::Shader,
}

struct GlDSLayout {
    entries: Vec<DescriptorLayoutEntry>,
}

/// OpenGL implementation of the renderer backend
pub struct GlBackend {
    gl: glow::Context,
    swap_buffers: Box<dyn FnMut()>,
    shader_loader: Box<dyn ShaderLoader>,
    swapchain_desc: SwapchainDesc,

    /// Minimum offset alignment for uniform/storage buffer bindings
    min_buffer_align: u32,

    ring: RingBufferAllocator,
    ring_buffer: glow::Buffer,
    ephemerals: Vec<BufferHandle>,
    frame_num: u64,

    /// Read framebuffer reused for the present blit
    present_fbo: glow::Framebuffer,

    current_pipeline: PipelineHandle,
    current_index_type: u32,
    current_index_size: i32,
    current_index_offset: i32,

    allocation_count: u32,
    used_bytes: u64,

    buffers: ResourceContainer<tags::Buffer, GlBuffer>,
    textures: ResourceContainer<tags::Texture, GlTexture>,
    samplers: ResourceContainer<tags::Sampler, GlSampler>,
    render_targets: ResourceContainer<tags::RenderTarget, GlRenderTarget>,
    render_passes: ResourceContainer<tags::RenderPass, GlRenderPass>,
    framebuffers: ResourceContainer<tags::Framebuffer, GlFramebuffer>,
    pipelines: ResourceContainer<tags::Pipeline, GlPipeline>,
    vertex_shaders: ResourceContainer<tags::VertexShader, GlShader>,
    fragment_shaders: ResourceContainer<tags::FragmentShader, GlShader>,
    ds_layouts: ResourceContainer<tags::DescriptorSetLayout, GlDSLayout>,
}

/// Total byte size of a full mip chain
fn texture_bytes(width: u32, height: u32, num_mips: u32, format: Format) -> u64 {
    let bpp = u64::from(format.bytes_per_pixel());
    (0..num_mips)
        .map(|m| u64::from((width >> m).max(1)) * u64::from((height >> m).max(1)) * bpp)
        .sum()
}

impl GlBackend {
    /// Create a new OpenGL backend over an already-current context.
    ///
    /// `swap_buffers` is invoked once per `present_frame` after the blit to
    /// the default framebuffer.
    pub fn new(
        gl: glow::Context,
        swap_buffers: Box<dyn FnMut()>,
        desc: &RendererDesc,
        shader_loader: Box<dyn ShaderLoader>,
    ) -> Result<Self> {
        unsafe {
            let renderer = gl.get_parameter_string(glow::RENDERER);
            let version = gl.get_parameter_string(glow::VERSION);
            render_info!("nova::gl", "Using GL renderer: {} ({})", renderer, version);

            let min_buffer_align = gl
                .get_parameter_i32(glow::UNIFORM_BUFFER_OFFSET_ALIGNMENT)
                .max(gl.get_parameter_i32(glow::SHADER_STORAGE_BUFFER_OFFSET_ALIGNMENT))
                .max(1) as u32;

            let ring_buffer = gl
                .create_buffer()
                .map_err(|e| render_err!("nova::gl", "Failed to create ring buffer: {}", e))?;
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(ring_buffer));
            gl.buffer_data_size(
                glow::COPY_WRITE_BUFFER,
                desc.ephemeral_ring_buf_size as i32,
                glow::DYNAMIC_DRAW,
            );
            gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);

            let present_fbo = gl
                .create_framebuffer()
                .map_err(|e| render_err!("nova::gl", "Failed to create present framebuffer: {}", e))?;

            // Writes to sRGB render targets encode on write, matching the
            // Vulkan backend's SRGB formats.
            gl.enable(glow::FRAMEBUFFER_SRGB);

            render_info!("nova::gl", "OpenGL backend initialized");

            Ok(Self {
                gl,
                swap_buffers,
                shader_loader,
                swapchain_desc: desc.swapchain,
                min_buffer_align,
                ring: RingBufferAllocator::new(desc.ephemeral_ring_buf_size),
                ring_buffer,
                ephemerals: Vec::new(),
                frame_num: 0,
                present_fbo,
                current_pipeline: PipelineHandle::EMPTY,
                current_index_type: glow::UNSIGNED_INT,
                current_index_size: 4,
                current_index_offset: 0,
                allocation_count: 0,
                used_bytes: 0,
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
            })
        }
    }

    fn compile_shader(&self, name: &str, stage: ShaderStage, macros: &ShaderMacros) -> Result<glow::Shader> {
        let bytes = self.shader_loader.load(name, stage, macros)?;
        let source = std::str::from_utf8(&bytes).map_err(|e| Error::ShaderCompileFailed {
            name: name.to_string(),
            log: format!("source is not valid UTF-8: {}", e),
        })?;

        let shader_type = match stage {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        };
        unsafe {
            let shader = self.gl.create_shader(shader_type).map_err(|e| {
                render_err!("nova::gl", "Failed to create shader object: {}", e)
            })?;
            self.gl.shader_source(shader, source);
            self.gl.compile_shader(shader);
            if !self.gl.get_shader_compile_status(shader) {
                let log = self.gl.get_shader_info_log(shader);
                self.gl.delete_shader(shader);
                return Err(Error::ShaderCompileFailed {
                    name: name.to_string(),
                    log,
                });
            }
            Ok(shader)
        }
    }

    /// End-of-frame reclamation; the driver handles GPU-side lifetimes
    fn end_of_frame(&mut self) {
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
        self.current_pipeline = PipelineHandle::EMPTY;
        self.frame_num += 1;
    }
}

impl RenderBackend for GlBackend {
    fn is_render_target_format_supported(&self, format: Format) -> bool {
        // Every format in the enum is renderable in core GL 4.3.
        format != Format::Invalid
    }

    fn drawable_size(&self) -> glam::UVec2 {
        glam::UVec2::new(self.swapchain_desc.width, self.swapchain_desc.height)
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

        unsafe {
            let buffer = self
                .gl
                .create_buffer()
                .map_err(|e| render_err!("nova::gl", "Failed to create buffer: {}", e))?;
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, Some(buffer));
            self.gl
                .buffer_data_size(glow::COPY_WRITE_BUFFER, size as i32, glow::DYNAMIC_DRAW);
            if !contents.is_empty() {
                self.gl
                    .buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, 0, contents);
            }
            self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);

            self.allocation_count += 1;
            self.used_bytes += u64::from(size);
            Ok(self.buffers.add(GlBuffer {
                buffer,
                offset: 0,
                size: size as i32,
                ephemeral_frame: None,
            }))
        }
    }

    fn create_ephemeral_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        assert!(size > 0, "zero-sized buffer");
        assert!(contents.len() <= size as usize, "buffer contents exceed size");

        let offset = self.ring.allocate(size, self.min_buffer_align);
        if !contents.is_empty() {
            unsafe {
                self.gl
                    .bind_buffer(glow::COPY_WRITE_BUFFER, Some(self.ring_buffer));
                self.gl
                    .buffer_sub_data_u8_slice(glow::COPY_WRITE_BUFFER, offset as i32, contents);
                self.gl.bind_buffer(glow::COPY_WRITE_BUFFER, None);
            }
        }

        let handle = self.buffers.add(GlBuffer {
            buffer: self.ring_buffer,
            offset: offset as i32,
            size: size as i32,
            ephemeral_frame: Some(self.frame_num),
        });
        self.ephemerals.push(handle);
        Ok(handle)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        desc.validate();
        let format = desc.get_format();
        let (internal, pixel_format, component_type) = format_to_gl(format);
        let num_mips = desc.get_num_mips();

        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| render_err!("nova::gl", "Failed to create texture: {}", e))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_storage_2d(
                glow::TEXTURE_2D,
                num_mips as i32,
                internal,
                desc.get_width() as i32,
                desc.get_height() as i32,
            );
            for level in 0..num_mips {
                let data = desc.get_mip_data(level);
                if data.is_empty() {
                    continue;
                }
                self.gl.tex_sub_image_2d(
                    glow::TEXTURE_2D,
                    level as i32,
                    0,
                    0,
                    (desc.get_width() >> level).max(1) as i32,
                    (desc.get_height() >> level).max(1) as i32,
                    pixel_format,
                    component_type,
                    glow::PixelUnpackData::Slice(Some(data)),
                );
            }
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, num_mips as i32 - 1);
            self.gl.bind_texture(glow::TEXTURE_2D, None);

            let bytes = texture_bytes(desc.get_width(), desc.get_height(), num_mips, format);
            self.allocation_count += 1;
            self.used_bytes += bytes;
            Ok(self.textures.add(GlTexture {
                texture,
                format,
                bytes,
                render_target_view: false,
            }))
        }
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        unsafe {
            let sampler = self
                .gl
                .create_sampler()
                .map_err(|e| render_err!("nova::gl", "Failed to create sampler: {}", e))?;
            self.gl.sampler_parameter_i32(
                sampler,
                glow::TEXTURE_MIN_FILTER,
                filter_to_gl(desc.get_min_filter()) as i32,
            );
            self.gl.sampler_parameter_i32(
                sampler,
                glow::TEXTURE_MAG_FILTER,
                filter_to_gl(desc.get_mag_filter()) as i32,
            );
            let wrap = wrap_to_gl(desc.get_wrap_mode()) as i32;
            self.gl
                .sampler_parameter_i32(sampler, glow::TEXTURE_WRAP_S, wrap);
            self.gl
                .sampler_parameter_i32(sampler, glow::TEXTURE_WRAP_T, wrap);
            Ok(self.samplers.add(GlSampler { sampler }))
        }
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        desc.validate();
        let format = desc.get_format();
        let (internal, _, _) = format_to_gl(format);

        unsafe {
            let texture = self
                .gl
                .create_texture()
                .map_err(|e| render_err!("nova::gl", "Failed to create render target: {}", e))?;
            self.gl.bind_texture(glow::TEXTURE_2D, Some(texture));
            self.gl.tex_storage_2d(
                glow::TEXTURE_2D,
                1,
                internal,
                desc.get_width() as i32,
                desc.get_height() as i32,
            );
            self.gl
                .tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAX_LEVEL, 0);
            self.gl.bind_texture(glow::TEXTURE_2D, None);

            let bytes = texture_bytes(desc.get_width(), desc.get_height(), 1, format);
            let texture_handle = self.textures.add(GlTexture {
                texture,
                format,
                bytes: 0,
                render_target_view: true,
            });

            self.allocation_count += 1;
            self.used_bytes += bytes;
            Ok(self.render_targets.add(GlRenderTarget {
                texture,
                width: desc.get_width(),
                height: desc.get_height(),
                format,
                usage: desc.get_usage(),
                texture_handle,
                bytes,
            }))
        }
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        let color_formats = (0..desc.color_count())
            .map(|i| desc.get_color(i).format())
            .collect();
        let color_load_ops = (0..desc.color_count())
            .map(|i| desc.get_color(i).load_op())
            .collect();
        let (depth_format, depth_load_op) = if desc.has_depth_stencil() {
            let ds = desc.get_depth_stencil();
            (Some(ds.format()), Some(ds.load_op()))
        } else {
            (None, None)
        };
        Ok(self.render_passes.add(GlRenderPass {
            color_formats,
            color_load_ops,
            depth_format,
            depth_load_op,
            clear_color: desc.get_clear_color(),
            clear_depth: desc.get_clear_depth(),
        }))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        desc.validate();
        let pass = self.render_passes.get(desc.get_render_pass());
        let color_formats = pass.color_formats.clone();
        let depth_format = pass.depth_format;

        unsafe {
            let framebuffer = self
                .gl
                .create_framebuffer()
                .map_err(|e| render_err!("nova::gl", "Failed to create framebuffer: {}", e))?;
            self.gl
                .bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(framebuffer));

            let mut width = 0;
            let mut height = 0;
            let mut draw_buffers = Vec::new();
            for (index, expected) in color_formats.iter().enumerate() {
                let rt_handle = desc.get_color(index);
                assert!(
                    rt_handle.is_valid(),
                    "render pass declares color attachment {} but framebuffer leaves it unbound",
                    index
                );
                let rt = self.render_targets.get(rt_handle);
                assert_eq!(
                    rt.format, *expected,
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
                self.gl.framebuffer_texture_2d(
                    glow::DRAW_FRAMEBUFFER,
                    format_attachment(rt.format, index),
                    glow::TEXTURE_2D,
                    Some(rt.texture),
                    0,
                );
                draw_buffers.push(glow::COLOR_ATTACHMENT0 + index as u32);
            }
            if let Some(expected) = depth_format {
                let ds_handle = desc.get_depth_stencil();
                assert!(
                    ds_handle.is_valid(),
                    "render pass declares depth but framebuffer leaves it unbound"
                );
                let rt = self.render_targets.get(ds_handle);
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
                self.gl.framebuffer_texture_2d(
                    glow::DRAW_FRAMEBUFFER,
                    format_attachment(rt.format, 0),
                    glow::TEXTURE_2D,
                    Some(rt.texture),
                    0,
                );
            }
            self.gl.draw_buffers(&draw_buffers);

            let status = self.gl.check_framebuffer_status(glow::DRAW_FRAMEBUFFER);
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
            if status != glow::FRAMEBUFFER_COMPLETE {
                self.gl.delete_framebuffer(framebuffer);
                return Err(render_err!(
                    "nova::gl",
                    "Framebuffer '{}' incomplete: {:#x}",
                    desc.get_name(),
                    status
                ));
            }

            Ok(self.framebuffers.add(GlFramebuffer {
                framebuffer,
                render_pass: desc.get_render_pass(),
                width,
                height,
            }))
        }
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        desc.validate();
        let vertex = self.vertex_shaders.get(desc.get_vertex_shader()).shader;
        let fragment = self.fragment_shaders.get(desc.get_fragment_shader()).shader;

        unsafe {
            let program = self
                .gl
                .create_program()
                .map_err(|e| render_err!("nova::gl", "Failed to create program: {}", e))?;
            self.gl.attach_shader(program, vertex);
            self.gl.attach_shader(program, fragment);
            self.gl.link_program(program);
            self.gl.detach_shader(program, vertex);
            self.gl.detach_shader(program, fragment);
            if !self.gl.get_program_link_status(program) {
                let log = self.gl.get_program_info_log(program);
                self.gl.delete_program(program);
                return Err(Error::ShaderCompileFailed {
                    name: desc.get_name().to_string(),
                    log,
                });
            }

            let vao = self
                .gl
                .create_vertex_array()
                .map_err(|e| render_err!("nova::gl", "Failed to create vertex array: {}", e))?;
            self.gl.bind_vertex_array(Some(vao));
            let mask = desc.get_vertex_attrib_mask();
            let mut strides = [0u32; MAX_VERTEX_BUFFERS];
            for attrib in 0..32u32 {
                if mask & (1 << attrib) == 0 {
                    continue;
                }
                let attr = desc.get_vertex_attrib(attrib);
                let (component_type, normalized) = vertex_format_to_gl(attr.format);
                self.gl.enable_vertex_attrib_array(attrib);
                self.gl.vertex_attrib_format_f32(
                    attrib,
                    i32::from(attr.count),
                    component_type,
                    normalized,
                    u32::from(attr.offset),
                );
                self.gl
                    .vertex_attrib_binding(attrib, u32::from(attr.buf_binding));

                let stride = desc.get_vertex_buffer_stride(attr.buf_binding);
                assert!(
                    stride > 0,
                    "vertex buffer binding {} has no stride",
                    attr.buf_binding
                );
                strides[attr.buf_binding as usize] = stride;
            }
            self.gl.bind_vertex_array(None);

            Ok(self.pipelines.add(GlPipeline {
                program,
                vao,
                strides,
                depth_test: desc.get_depth_test(),
                depth_write: desc.get_depth_write(),
                cull_faces: desc.get_cull_faces(),
                scissor_test: desc.get_scissor_test(),
                blending: desc.get_blending(),
            }))
        }
    }

    fn create_vertex_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle> {
        let shader = self.compile_shader(name, ShaderStage::Vertex, macros)?;
        Ok(self.vertex_shaders.add(GlShader { shader }))
    }

    fn create_fragment_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle> {
        let shader = self.compile_shader(name, ShaderStage::Fragment, macros)?;
        Ok(self.fragment_shaders.add(GlShader { shader }))
    }

    fn create_descriptor_set_layout(
        &mut self,
        entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle> {
        validate_layout(entries);
        assert!(
            entries.len() <= DESCRIPTOR_BINDING_STRIDE as usize,
            "descriptor set has more than {} bindings",
            DESCRIPTOR_BINDING_STRIDE
        );
        Ok(self.ds_layouts.add(GlDSLayout {
            entries: entries.to_vec(),
        }))
    }

    fn render_target_texture(&self, handle: RenderTargetHandle) -> TextureHandle {
        let rt = self.render_targets.get(handle);
        assert!(
            rt.usage.contains(TextureUsage::SAMPLED),
            "render target was not created with sampled usage"
        );
        rt.texture_handle
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        assert!(
            self.buffers.get(handle).ephemeral_frame.is_none(),
            "ephemeral buffers are freed at present, not deleted"
        );
        let record = self.buffers.remove(handle);
        unsafe {
            self.gl.delete_buffer(record.buffer);
        }
        self.allocation_count -= 1;
        self.used_bytes -= record.size as u64;
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        assert!(
            !self.textures.get(handle).render_target_view,
            "render target textures are retired by delete_render_target"
        );
        let record = self.textures.remove(handle);
        unsafe {
            self.gl.delete_texture(record.texture);
        }
        self.allocation_count -= 1;
        self.used_bytes -= record.bytes;
    }

    fn delete_sampler(&mut self, handle: SamplerHandle) {
        let record = self.samplers.remove(handle);
        unsafe {
            self.gl.delete_sampler(record.sampler);
        }
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        let record = self.render_targets.remove(handle);
        self.textures.remove(record.texture_handle);
        unsafe {
            self.gl.delete_texture(record.texture);
        }
        self.allocation_count -= 1;
        self.used_bytes -= record.bytes;
    }

    fn delete_render_pass(&mut self, handle: RenderPassHandle) {
        self.render_passes.remove(handle);
    }

    fn delete_framebuffer(&mut self, handle: FramebufferHandle) {
        let record = self.framebuffers.remove(handle);
        unsafe {
            self.gl.delete_framebuffer(record.framebuffer);
        }
    }

    fn delete_pipeline(&mut self, handle: PipelineHandle) {
        let record = self.pipelines.remove(handle);
        unsafe {
            self.gl.delete_program(record.program);
            self.gl.delete_vertex_array(record.vao);
        }
    }

    fn delete_vertex_shader(&mut self, handle: VertexShaderHandle) {
        let record = self.vertex_shaders.remove(handle);
        unsafe {
            self.gl.delete_shader(record.shader);
        }
    }

    fn delete_fragment_shader(&mut self, handle: FragmentShaderHandle) {
        let record = self.fragment_shaders.remove(handle);
        unsafe {
            self.gl.delete_shader(record.shader);
        }
    }

    fn delete_descriptor_set_layout(&mut self, handle: DSLayoutHandle) {
        self.ds_layouts.remove(handle);
    }

    fn set_swapchain_desc(&mut self, desc: &SwapchainDesc) -> Result<()> {
        // The windowing layer owns the default framebuffer; only the
        // bookkeeping changes here.
        self.swapchain_desc = *desc;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<()> {
        Ok(())
    }

    fn present_frame(&mut self, render_target: RenderTargetHandle) -> Result<()> {
        let rt = self.render_targets.get(render_target);
        assert!(!rt.format.has_depth(), "cannot present a depth render target");
        assert!(
            rt.usage.contains(TextureUsage::TRANSFER_SRC),
            "render target was not created with transfer-src usage"
        );
        let (texture, width, height) = (rt.texture, rt.width, rt.height);

        unsafe {
            self.gl
                .bind_framebuffer(glow::READ_FRAMEBUFFER, Some(self.present_fbo));
            self.gl.framebuffer_texture_2d(
                glow::READ_FRAMEBUFFER,
                glow::COLOR_ATTACHMENT0,
                glow::TEXTURE_2D,
                Some(texture),
                0,
            );
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);

            let dst_width = self.swapchain_desc.width.max(1) as i32;
            let dst_height = self.swapchain_desc.height.max(1) as i32;
            let filter = if width as i32 == dst_width && height as i32 == dst_height {
                glow::NEAREST
            } else {
                glow::LINEAR
            };
            // Scissor clips blits too.
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.blit_framebuffer(
                0,
                0,
                width as i32,
                height as i32,
                0,
                0,
                dst_width,
                dst_height,
                glow::COLOR_BUFFER_BIT,
                filter,
            );
            self.gl.bind_framebuffer(glow::READ_FRAMEBUFFER, None);
        }

        (self.swap_buffers)();
        self.end_of_frame();
        Ok(())
    }

    fn begin_render_pass(&mut self, render_pass: RenderPassHandle, framebuffer: FramebufferHandle) {
        let fb = self.framebuffers.get(framebuffer);
        assert_eq!(
            fb.render_pass, render_pass,
            "framebuffer was created against a different render pass"
        );
        let fbo = fb.framebuffer;
        let pass = self.render_passes.get(render_pass);

        unsafe {
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, Some(fbo));

            // Clears ignore neither scissor nor write masks.
            self.gl.disable(glow::SCISSOR_TEST);
            self.gl.color_mask(true, true, true, true);
            for (index, load_op) in pass.color_load_ops.iter().enumerate() {
                if *load_op == LoadOp::Clear {
                    self.gl
                        .clear_buffer_f32_slice(glow::COLOR, index as u32, &pass.clear_color);
                }
            }
            if pass.depth_load_op == Some(LoadOp::Clear) {
                self.gl.depth_mask(true);
                self.gl
                    .clear_buffer_f32_slice(glow::DEPTH, 0, &[pass.clear_depth]);
            }
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.gl.bind_framebuffer(glow::DRAW_FRAMEBUFFER, None);
        }
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        unsafe {
            self.gl
                .viewport(x as i32, y as i32, width as i32, height as i32);
        }
    }

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        unsafe {
            self.gl
                .scissor(x as i32, y as i32, width as i32, height as i32);
        }
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        let record = self.pipelines.get(pipeline);
        unsafe {
            self.gl.use_program(Some(record.program));
            self.gl.bind_vertex_array(Some(record.vao));

            if record.depth_test {
                self.gl.enable(glow::DEPTH_TEST);
                self.gl.depth_func(glow::LEQUAL);
            } else {
                self.gl.disable(glow::DEPTH_TEST);
            }
            self.gl.depth_mask(record.depth_write);

            if record.cull_faces {
                self.gl.enable(glow::CULL_FACE);
                self.gl.cull_face(glow::BACK);
            } else {
                self.gl.disable(glow::CULL_FACE);
            }

            if record.scissor_test {
                self.gl.enable(glow::SCISSOR_TEST);
            } else {
                self.gl.disable(glow::SCISSOR_TEST);
            }

            if record.blending {
                self.gl.enable(glow::BLEND);
                self.gl.blend_func_separate(
                    glow::SRC_ALPHA,
                    glow::ONE_MINUS_SRC_ALPHA,
                    glow::ONE,
                    glow::ONE_MINUS_SRC_ALPHA,
                );
            } else {
                self.gl.disable(glow::BLEND);
            }
        }
        self.current_pipeline = pipeline;
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, bit16: bool) {
        let record = self.buffers.get(buffer);
        if let Some(frame) = record.ephemeral_frame {
            assert_eq!(
                frame, self.frame_num,
                "ephemeral buffer used outside the frame that created it"
            );
        }
        unsafe {
            self.gl
                .bind_buffer(glow::ELEMENT_ARRAY_BUFFER, Some(record.buffer));
        }
        self.current_index_type = if bit16 {
            glow::UNSIGNED_SHORT
        } else {
            glow::UNSIGNED_INT
        };
        self.current_index_size = if bit16 { 2 } else { 4 };
        self.current_index_offset = record.offset;
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        assert!(
            self.current_pipeline.is_valid(),
            "bind_vertex_buffer with no pipeline bound"
        );
        let stride = self.pipelines.get(self.current_pipeline).strides[binding as usize];
        let record = self.buffers.get(buffer);
        if let Some(frame) = record.ephemeral_frame {
            assert_eq!(
                frame, self.frame_num,
                "ephemeral buffer used outside the frame that created it"
            );
        }
        unsafe {
            self.gl.bind_vertex_buffer(
                binding,
                Some(record.buffer),
                record.offset,
                stride as i32,
            );
        }
    }

    fn bind_descriptor_set(
        &mut self,
        index: u32,
        layout: DSLayoutHandle,
        data: &[u8],
    ) -> Result<()> {
        assert!(
            (index as usize) < MAX_DESCRIPTOR_SETS,
            "descriptor set index {} out of range",
            index
        );
        let entries = self.ds_layouts.get(layout).entries.clone();
        let base = index * DESCRIPTOR_BINDING_STRIDE;

        for (binding, entry) in entries.iter().enumerate() {
            let slot = base + binding as u32;
            let bound = read_binding(entry, data);
            match bound {
                BoundResource::UniformBuffer(h) | BoundResource::StorageBuffer(h) => {
                    if !self.buffers.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set buffer"));
                    }
                    let record = self.buffers.get(h);
                    if let Some(frame) = record.ephemeral_frame {
                        assert_eq!(
                            frame, self.frame_num,
                            "ephemeral buffer used outside the frame that created it"
                        );
                    }
                    let target = if matches!(bound, BoundResource::UniformBuffer(_)) {
                        glow::UNIFORM_BUFFER
                    } else {
                        glow::SHADER_STORAGE_BUFFER
                    };
                    unsafe {
                        self.gl.bind_buffer_range(
                            target,
                            slot,
                            Some(record.buffer),
                            record.offset,
                            record.size,
                        );
                    }
                }
                BoundResource::Sampler(h) => {
                    if !self.samplers.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set sampler"));
                    }
                    unsafe {
                        self.gl.bind_sampler(slot, Some(self.samplers.get(h).sampler));
                    }
                }
                BoundResource::Texture(h) => {
                    if !self.textures.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set texture"));
                    }
                    unsafe {
                        self.gl.active_texture(glow::TEXTURE0 + slot);
                        self.gl
                            .bind_texture(glow::TEXTURE_2D, Some(self.textures.get(h).texture));
                    }
                }
                BoundResource::CombinedSampler(cs) => {
                    if !self.textures.contains(cs.tex) || !self.samplers.contains(cs.sampler) {
                        return Err(Error::InvalidHandle("descriptor set combined sampler"));
                    }
                    unsafe {
                        self.gl.active_texture(glow::TEXTURE0 + slot);
                        self.gl
                            .bind_texture(glow::TEXTURE_2D, Some(self.textures.get(cs.tex).texture));
                        self.gl
                            .bind_sampler(slot, Some(self.samplers.get(cs.sampler).sampler));
                    }
                }
            }
        }
        Ok(())
    }

    fn draw(&mut self, first_vertex: u32, vertex_count: u32) {
        assert!(vertex_count > 0, "draw with zero vertices");
        unsafe {
            self.gl
                .draw_arrays(glow::TRIANGLES, first_vertex as i32, vertex_count as i32);
        }
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        assert!(index_count > 0, "draw with zero indices");
        assert!(instance_count > 0, "draw with zero instances");
        unsafe {
            self.gl.draw_elements_instanced(
                glow::TRIANGLES,
                index_count as i32,
                self.current_index_type,
                self.current_index_offset,
                instance_count as i32,
            );
        }
    }

    fn draw_indexed_offset(&mut self, index_count: u32, first_index: u32) {
        assert!(index_count > 0, "draw with zero indices");
        unsafe {
            self.gl.draw_elements(
                glow::TRIANGLES,
                index_count as i32,
                self.current_index_type,
                self.current_index_offset + first_index as i32 * self.current_index_size,
            );
        }
    }

    fn wait_idle(&mut self) {
        unsafe {
            self.gl.finish();
        }
    }
}

impl Drop for GlBackend {
    fn drop(&mut self) {
        unsafe {
            self.gl.finish();

            let gl = &self.gl;
            self.buffers.clear_with(|b| {
                if b.ephemeral_frame.is_none() {
                    gl.delete_buffer(b.buffer);
                }
            });
            self.textures.clear_with(|t| {
                if !t.render_target_view {
                    gl.delete_texture(t.texture);
                }
            });
            self.samplers.clear_with(|s| gl.delete_sampler(s.sampler));
            self.render_targets
                .clear_with(|rt| gl.delete_texture(rt.texture));
            self.render_passes.clear_with(|_| {});
            self.framebuffers
                .clear_with(|fb| gl.delete_framebuffer(fb.framebuffer));
            self.pipelines.clear_with(|p| {
                gl.delete_program(p.program);
                gl.delete_vertex_array(p.vao);
            });
            self.vertex_shaders.clear_with(|s| gl.delete_shader(s.shader));
            self.fragment_shaders
                .clear_with(|s| gl.delete_shader(s.shader));
            self.ds_layouts.clear_with(|_| {});

            self.gl.delete_buffer(self.ring_buffer);
            self.gl.delete_framebuffer(self.present_fbo);
        }
    }
}
