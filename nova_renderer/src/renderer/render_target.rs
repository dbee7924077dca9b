//! Render target description
//!
//! A render target is a GPU image usable as a draw destination and,
//! optionally, as a sampled texture. Creating one also creates a paired
//! texture entry sharing the same image and view; the two share one
//! lifetime and are retired together by `delete_render_target`.

use crate::renderer::format::Format;
use crate::renderer::texture::{TextureUsage, MAX_TEXTURE_SIZE};

/// Validated construction parameters for a render target
#[derive(Debug, Clone)]
pub struct RenderTargetDesc {
    width: u32,
    height: u32,
    format: Format,
    additional_view_format: Format,
    usage: TextureUsage,
    name: String,
}

impl Default for RenderTargetDesc {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderTargetDesc {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            format: Format::Invalid,
            additional_view_format: Format::Invalid,
            usage: TextureUsage::SAMPLED | TextureUsage::TRANSFER_SRC,
            name: String::new(),
        }
    }

    pub fn width(mut self, w: u32) -> Self {
        assert!(w > 0 && w <= MAX_TEXTURE_SIZE, "render target width {} out of range", w);
        self.width = w;
        self
    }

    pub fn height(mut self, h: u32) -> Self {
        assert!(h > 0 && h <= MAX_TEXTURE_SIZE, "render target height {} out of range", h);
        self.height = h;
        self
    }

    pub fn format(mut self, f: Format) -> Self {
        assert!(f != Format::Invalid, "render target format must be set");
        self.format = f;
        self
    }

    /// Secondary view format (e.g. a UNORM view of an sRGB image);
    /// `Format::Invalid` means no additional view
    pub fn additional_view_format(mut self, f: Format) -> Self {
        self.additional_view_format = f;
        self
    }

    /// Uses beyond the attachment use implied by the format. Defaults to
    /// sampled + transfer-src; a target must keep transfer-src to be
    /// presentable and sampled for `render_target_texture` to be legal.
    pub fn usage(mut self, usage: TextureUsage) -> Self {
        assert!(!usage.is_empty(), "render target usage must not be empty");
        self.usage = usage;
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    pub fn get_width(&self) -> u32 {
        self.width
    }

    pub fn get_height(&self) -> u32 {
        self.height
    }

    pub fn get_format(&self) -> Format {
        self.format
    }

    pub fn get_additional_view_format(&self) -> Format {
        self.additional_view_format
    }

    pub fn get_usage(&self) -> TextureUsage {
        self.usage
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Validate completeness before creation; backends call this first
    pub fn validate(&self) {
        assert!(self.width > 0, "render target width not set");
        assert!(self.height > 0, "render target height not set");
        assert!(self.format != Format::Invalid, "render target format not set");
    }
}
