//! Framebuffer description
//!
//! Binds concrete render targets to a render pass's attachment slots. The
//! backend validates at creation that the bound targets match the pass's
//! declared formats and share one width/height.

use crate::renderer::handle::{RenderPassHandle, RenderTargetHandle};
use crate::renderer::render_pass::MAX_COLOR_RENDERTARGETS;

/// Validated construction parameters for a framebuffer
#[derive(Debug, Clone, Default)]
pub struct FramebufferDesc {
    render_pass: RenderPassHandle,
    depth_stencil: RenderTargetHandle,
    colors: [RenderTargetHandle; MAX_COLOR_RENDERTARGETS],
    name: String,
}

impl FramebufferDesc {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render_pass(mut self, rp: RenderPassHandle) -> Self {
        assert!(rp.is_valid(), "framebuffer needs a valid render pass");
        self.render_pass = rp;
        self
    }

    pub fn depth_stencil(mut self, ds: RenderTargetHandle) -> Self {
        self.depth_stencil = ds;
        self
    }

    pub fn color(mut self, index: usize, rt: RenderTargetHandle) -> Self {
        assert!(index < MAX_COLOR_RENDERTARGETS, "color attachment index {} out of range", index);
        self.colors[index] = rt;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn get_render_pass(&self) -> RenderPassHandle {
        self.render_pass
    }

    pub fn get_depth_stencil(&self) -> RenderTargetHandle {
        self.depth_stencil
    }

    pub fn get_color(&self, index: usize) -> RenderTargetHandle {
        self.colors[index]
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Validate completeness before creation; backends call this first
    pub fn validate(&self) {
        assert!(self.render_pass.is_valid(), "framebuffer render pass not set");
        assert!(
            self.colors.iter().any(|c| c.is_valid()) || self.depth_stencil.is_valid(),
            "framebuffer needs at least one attachment"
        );
    }
}
