//! Pipeline description
//!
//! An immutable bundle of shaders, vertex-input layout, render-pass
//! compatibility, fixed-function state, and descriptor set layouts. A
//! pipeline is only valid for draws inside a render pass compatible with
//! the one it was created against.

use crate::renderer::format::VtxFormat;
use crate::renderer::handle::{
    DSLayoutHandle, FragmentShaderHandle, RenderPassHandle, VertexShaderHandle,
};

/// Maximum number of vertex attributes
pub const MAX_VERTEX_ATTRIBS: usize = 8;

/// Maximum number of vertex buffer bindings
pub const MAX_VERTEX_BUFFERS: usize = 4;

/// Maximum number of simultaneously bound descriptor sets
pub const MAX_DESCRIPTOR_SETS: usize = 4;

/// One vertex attribute declaration
#[derive(Debug, Clone, Copy, Default)]
pub struct VertexAttr {
    pub buf_binding: u8,
    pub count: u8,
    pub format: VtxFormat,
    pub offset: u8,
}

/// Validated construction parameters for a graphics pipeline
#[derive(Debug, Clone)]
pub struct PipelineDesc {
    vertex_shader: VertexShaderHandle,
    fragment_shader: FragmentShaderHandle,
    render_pass: RenderPassHandle,
    vertex_attrib_mask: u32,
    vertex_attribs: [VertexAttr; MAX_VERTEX_ATTRIBS],
    vertex_buffer_strides: [u32; MAX_VERTEX_BUFFERS],
    descriptor_set_layouts: [DSLayoutHandle; MAX_DESCRIPTOR_SETS],
    depth_write: bool,
    depth_test: bool,
    cull_faces: bool,
    scissor_test: bool,
    blending: bool,
    name: String,
}

impl PipelineDesc {
    pub fn new() -> Self {
        Self {
            vertex_shader: VertexShaderHandle::EMPTY,
            fragment_shader: FragmentShaderHandle::EMPTY,
            render_pass: RenderPassHandle::EMPTY,
            vertex_attrib_mask: 0,
            vertex_attribs: [VertexAttr::default(); MAX_VERTEX_ATTRIBS],
            vertex_buffer_strides: [0; MAX_VERTEX_BUFFERS],
            descriptor_set_layouts: [DSLayoutHandle::EMPTY; MAX_DESCRIPTOR_SETS],
            depth_write: false,
            depth_test: false,
            cull_faces: false,
            scissor_test: false,
            blending: false,
            name: String::new(),
        }
    }

    pub fn vertex_shader(mut self, h: VertexShaderHandle) -> Self {
        assert!(h.is_valid(), "pipeline needs a valid vertex shader");
        self.vertex_shader = h;
        self
    }

    pub fn fragment_shader(mut self, h: FragmentShaderHandle) -> Self {
        assert!(h.is_valid(), "pipeline needs a valid fragment shader");
        self.fragment_shader = h;
        self
    }

    pub fn render_pass(mut self, h: RenderPassHandle) -> Self {
        assert!(h.is_valid(), "pipeline needs a valid render pass");
        self.render_pass = h;
        self
    }

    /// Declare one vertex attribute
    pub fn vertex_attrib(
        mut self,
        attrib: u32,
        buf_binding: u8,
        count: u8,
        format: VtxFormat,
        offset: u8,
    ) -> Self {
        assert!((attrib as usize) < MAX_VERTEX_ATTRIBS, "vertex attribute {} out of range", attrib);
        assert!((buf_binding as usize) < MAX_VERTEX_BUFFERS, "vertex buffer binding {} out of range", buf_binding);
        assert!(count >= 1 && count <= 4, "vertex attribute component count {} out of range", count);

        self.vertex_attribs[attrib as usize] = VertexAttr {
            buf_binding,
            count,
            format,
            offset,
        };
        self.vertex_attrib_mask |= 1 << attrib;
        self
    }

    /// Stride of one vertex buffer binding
    pub fn vertex_buffer_stride(mut self, buf: u8, stride: u32) -> Self {
        assert!((buf as usize) < MAX_VERTEX_BUFFERS, "vertex buffer binding {} out of range", buf);
        assert!(stride > 0, "vertex buffer stride must be nonzero");
        self.vertex_buffer_strides[buf as usize] = stride;
        self
    }

    pub fn descriptor_set_layout(mut self, index: usize, handle: DSLayoutHandle) -> Self {
        assert!(index < MAX_DESCRIPTOR_SETS, "descriptor set index {} out of range", index);
        assert!(handle.is_valid(), "descriptor set layout handle must be valid");
        self.descriptor_set_layouts[index] = handle;
        self
    }

    pub fn depth_write(mut self, enable: bool) -> Self {
        self.depth_write = enable;
        self
    }

    pub fn depth_test(mut self, enable: bool) -> Self {
        self.depth_test = enable;
        self
    }

    pub fn cull_faces(mut self, enable: bool) -> Self {
        self.cull_faces = enable;
        self
    }

    pub fn scissor_test(mut self, enable: bool) -> Self {
        self.scissor_test = enable;
        self
    }

    pub fn blending(mut self, enable: bool) -> Self {
        self.blending = enable;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // Read accessors for backends

    pub fn get_vertex_shader(&self) -> VertexShaderHandle {
        self.vertex_shader
    }

    pub fn get_fragment_shader(&self) -> FragmentShaderHandle {
        self.fragment_shader
    }

    pub fn get_render_pass(&self) -> RenderPassHandle {
        self.render_pass
    }

    /// Bitmask of declared vertex attributes
    pub fn get_vertex_attrib_mask(&self) -> u32 {
        self.vertex_attrib_mask
    }

    pub fn get_vertex_attrib(&self, attrib: u32) -> &VertexAttr {
        assert!(
            self.vertex_attrib_mask & (1 << attrib) != 0,
            "vertex attribute {} not declared",
            attrib
        );
        &self.vertex_attribs[attrib as usize]
    }

    pub fn get_vertex_buffer_stride(&self, buf: u8) -> u32 {
        self.vertex_buffer_strides[buf as usize]
    }

    pub fn get_descriptor_set_layout(&self, index: usize) -> DSLayoutHandle {
        self.descriptor_set_layouts[index]
    }

    pub fn get_depth_write(&self) -> bool {
        self.depth_write
    }

    pub fn get_depth_test(&self) -> bool {
        self.depth_test
    }

    pub fn get_cull_faces(&self) -> bool {
        self.cull_faces
    }

    pub fn get_scissor_test(&self) -> bool {
        self.scissor_test
    }

    pub fn get_blending(&self) -> bool {
        self.blending
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Validate completeness before creation; backends call this first
    pub fn validate(&self) {
        assert!(self.vertex_shader.is_valid(), "pipeline vertex shader not set");
        assert!(self.fragment_shader.is_valid(), "pipeline fragment shader not set");
        assert!(self.render_pass.is_valid(), "pipeline render pass not set");
    }
}

impl Default for PipelineDesc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
