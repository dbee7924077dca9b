//! Render pass description
//!
//! A render pass declares attachment formats and their load/store and
//! layout-transition behavior for one rendering scope. Framebuffers bind
//! concrete render targets to its attachment slots and must match formats
//! and dimensions exactly.

use crate::renderer::format::{Format, Layout};

/// Maximum number of color attachments per render pass
pub const MAX_COLOR_RENDERTARGETS: usize = 2;

/// What to do with an attachment's existing contents at pass begin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoadOp {
    /// Don't care about existing content
    #[default]
    DontCare,
    /// Preserve existing content
    Load,
    /// Clear to the pass's clear value
    Clear,
}

/// One attachment slot declaration
#[derive(Debug, Clone, Copy, Default)]
pub struct AttachmentDesc {
    pub(crate) format: Format,
    pub(crate) load_op: LoadOp,
}

impl AttachmentDesc {
    pub fn format(&self) -> Format {
        self.format
    }

    pub fn load_op(&self) -> LoadOp {
        self.load_op
    }
}

/// Validated construction parameters for a render pass
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    depth_stencil: AttachmentDesc,
    colors: [AttachmentDesc; MAX_COLOR_RENDERTARGETS],
    color_final_layout: Layout,
    clear_color: [f32; 4],
    clear_depth: f32,
    name: String,
}

impl RenderPassDesc {
    pub fn new() -> Self {
        Self {
            depth_stencil: AttachmentDesc::default(),
            colors: [AttachmentDesc::default(); MAX_COLOR_RENDERTARGETS],
            color_final_layout: Layout::ShaderRead,
            clear_color: [0.0; 4],
            clear_depth: 1.0,
            name: String::new(),
        }
    }

    /// Declare a color attachment slot
    pub fn color(mut self, index: usize, format: Format, load_op: LoadOp) -> Self {
        assert!(index < MAX_COLOR_RENDERTARGETS, "color attachment index {} out of range", index);
        assert!(format != Format::Invalid, "color attachment format must be set");
        assert!(!format.has_depth(), "depth format in color attachment slot");
        self.colors[index] = AttachmentDesc { format, load_op };
        self
    }

    /// Declare the depth/stencil attachment
    pub fn depth_stencil(mut self, format: Format, load_op: LoadOp) -> Self {
        assert!(format.has_depth(), "depth attachment needs a depth format");
        self.depth_stencil = AttachmentDesc { format, load_op };
        self
    }

    /// Layout color attachments are transitioned to when the pass ends
    pub fn color_final_layout(mut self, layout: Layout) -> Self {
        assert!(layout != Layout::Undefined, "final layout cannot be Undefined");
        self.color_final_layout = layout;
        self
    }

    /// Clear color used by `LoadOp::Clear` color attachments
    pub fn clear_color(mut self, rgba: [f32; 4]) -> Self {
        self.clear_color = rgba;
        self
    }

    /// Clear depth used by a `LoadOp::Clear` depth attachment
    pub fn clear_depth(mut self, depth: f32) -> Self {
        self.clear_depth = depth;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn get_color(&self, index: usize) -> &AttachmentDesc {
        &self.colors[index]
    }

    pub fn get_depth_stencil(&self) -> &AttachmentDesc {
        &self.depth_stencil
    }

    pub fn has_depth_stencil(&self) -> bool {
        self.depth_stencil.format != Format::Invalid
    }

    pub fn get_color_final_layout(&self) -> Layout {
        self.color_final_layout
    }

    pub fn get_clear_color(&self) -> [f32; 4] {
        self.clear_color
    }

    pub fn get_clear_depth(&self) -> f32 {
        self.clear_depth
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Number of declared color attachments (contiguous from slot 0)
    pub fn color_count(&self) -> usize {
        self.colors
            .iter()
            .take_while(|a| a.format != Format::Invalid)
            .count()
    }
}

impl Default for RenderPassDesc {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
