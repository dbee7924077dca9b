//! Texture description

use bitflags::bitflags;

use crate::renderer::format::Format;

/// Largest supported texture dimension, enforced in the desc builders
pub const MAX_TEXTURE_SIZE: u32 = 8192;

/// Largest supported mip chain (covers `MAX_TEXTURE_SIZE`)
pub const MAX_TEXTURE_MIPLEVELS: u32 = 14;

bitflags! {
    /// How a texture or render target image may be used
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TextureUsage: u32 {
        /// Sampled in shaders
        const SAMPLED = 0b0001;
        /// Used as a color attachment
        const RENDER_TARGET = 0b0010;
        /// Used as a depth/stencil attachment
        const DEPTH_STENCIL = 0b0100;
        /// Source of a blit/copy (present path)
        const TRANSFER_SRC = 0b1000;
    }
}

/// Validated construction parameters for a texture.
///
/// Accumulates parameters through chained setters; each setter fails fast on
/// values outside static limits. Passing an incompletely-configured desc to
/// `create_texture` is caller error.
#[derive(Debug, Clone, Default)]
pub struct TextureDesc {
    width: u32,
    height: u32,
    num_mips: u32,
    format: Format,
    mip_data: Vec<Vec<u8>>,
    name: String,
}

impl TextureDesc {
    pub fn new() -> Self {
        Self {
            width: 0,
            height: 0,
            num_mips: 1,
            format: Format::Invalid,
            mip_data: vec![Vec::new()],
            name: String::new(),
        }
    }

    pub fn width(mut self, w: u32) -> Self {
        assert!(w > 0 && w <= MAX_TEXTURE_SIZE, "texture width {} out of range", w);
        self.width = w;
        self
    }

    pub fn height(mut self, h: u32) -> Self {
        assert!(h > 0 && h <= MAX_TEXTURE_SIZE, "texture height {} out of range", h);
        self.height = h;
        self
    }

    pub fn format(mut self, f: Format) -> Self {
        assert!(f != Format::Invalid, "texture format must be set");
        self.format = f;
        self
    }

    /// Number of mip levels; resizes the per-mip data table
    pub fn num_mips(mut self, n: u32) -> Self {
        assert!(n > 0 && n <= MAX_TEXTURE_MIPLEVELS, "mip count {} out of range", n);
        self.num_mips = n;
        self.mip_data.resize(n as usize, Vec::new());
        self
    }

    /// Pixel bytes for one mip level, tightly packed
    pub fn mip_level_data(mut self, level: u32, data: Vec<u8>) -> Self {
        assert!(level < self.num_mips, "mip level {} beyond mip count {}", level, self.num_mips);
        assert!(!data.is_empty(), "mip level data must be nonempty");
        self.mip_data[level as usize] = data;
        self
    }

    /// Debug name, passed to backend debug labels where available
    pub fn name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // Read accessors for backends

    pub fn get_width(&self) -> u32 {
        self.width
    }

    pub fn get_height(&self) -> u32 {
        self.height
    }

    pub fn get_num_mips(&self) -> u32 {
        self.num_mips
    }

    pub fn get_format(&self) -> Format {
        self.format
    }

    /// Per-mip upload data; an empty slice means "no data for this level"
    pub fn get_mip_data(&self, level: u32) -> &[u8] {
        &self.mip_data[level as usize]
    }

    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Validate completeness before creation; backends call this first
    pub fn validate(&self) {
        assert!(self.width > 0, "texture width not set");
        assert!(self.height > 0, "texture height not set");
        assert!(self.num_mips > 0, "texture mip count not set");
        assert!(self.format != Format::Invalid, "texture format not set");
    }
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
