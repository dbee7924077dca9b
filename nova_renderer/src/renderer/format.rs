//! Pixel and vertex attribute formats

/// Pixel format for textures, render targets, and attachments
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Format {
    #[default]
    Invalid,
    R8,
    RG8,
    RGB8,
    RGBA8,
    SRGBA8,
    Depth16,
    Depth16S8,
    Depth24S8,
    Depth24X8,
    Depth32Float,
}

impl Format {
    /// Human-readable name for logs and debug labels
    pub fn name(self) -> &'static str {
        match self {
            Format::Invalid => "Invalid",
            Format::R8 => "R8",
            Format::RG8 => "RG8",
            Format::RGB8 => "RGB8",
            Format::RGBA8 => "RGBA8",
            Format::SRGBA8 => "sRGBA8",
            Format::Depth16 => "Depth16",
            Format::Depth16S8 => "Depth16S8",
            Format::Depth24S8 => "Depth24S8",
            Format::Depth24X8 => "Depth24X8",
            Format::Depth32Float => "Depth32Float",
        }
    }

    /// Bytes per pixel for tightly-packed uploads
    ///
    /// # Panics
    ///
    /// Panics on `Invalid`.
    pub fn bytes_per_pixel(self) -> u32 {
        match self {
            Format::Invalid => panic!("bytes_per_pixel on Format::Invalid"),
            Format::R8 => 1,
            Format::RG8 => 2,
            Format::RGB8 => 3,
            Format::RGBA8 | Format::SRGBA8 => 4,
            Format::Depth16 => 2,
            Format::Depth16S8 => 3,
            Format::Depth24S8 | Format::Depth24X8 | Format::Depth32Float => 4,
        }
    }

    /// Whether this format has a depth component
    pub fn has_depth(self) -> bool {
        matches!(
            self,
            Format::Depth16
                | Format::Depth16S8
                | Format::Depth24S8
                | Format::Depth24X8
                | Format::Depth32Float
        )
    }

    /// Whether this format has a stencil component
    pub fn has_stencil(self) -> bool {
        matches!(self, Format::Depth16S8 | Format::Depth24S8)
    }
}

/// Vertex attribute component format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VtxFormat {
    #[default]
    Float,
    UNorm8,
}

impl VtxFormat {
    /// Size in bytes of one component
    pub fn component_bytes(self) -> u32 {
        match self {
            VtxFormat::Float => 4,
            VtxFormat::UNorm8 => 1,
        }
    }
}

/// Image layout a render pass leaves its color attachments in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Layout {
    /// Contents undefined; only legal as an initial state
    #[default]
    Undefined,
    /// Sampled by later passes
    ShaderRead,
    /// Source of a transfer (e.g. the final blit to the swapchain)
    TransferSrc,
}

#[cfg(test)]
#[path = "format_tests.rs"]
mod tests;
