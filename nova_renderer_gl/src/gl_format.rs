//! Conversions between renderer enums and their OpenGL equivalents

use nova_renderer::renderer::{FilterMode, Format, VtxFormat, WrapMode};

/// (internal format, pixel format, component type) triple for a format
pub fn format_to_gl(format: Format) -> (u32, u32, u32) {
    match format {
        Format::Invalid => panic!("format_to_gl on Format::Invalid"),
        Format::R8 => (glow::R8, glow::RED, glow::UNSIGNED_BYTE),
        Format::RG8 => (glow::RG8, glow::RG, glow::UNSIGNED_BYTE),
        Format::RGB8 => (glow::RGB8, glow::RGB, glow::UNSIGNED_BYTE),
        Format::RGBA8 => (glow::RGBA8, glow::RGBA, glow::UNSIGNED_BYTE),
        Format::SRGBA8 => (glow::SRGB8_ALPHA8, glow::RGBA, glow::UNSIGNED_BYTE),
        Format::Depth16 => (
            glow::DEPTH_COMPONENT16,
            glow::DEPTH_COMPONENT,
            glow::UNSIGNED_SHORT,
        ),
        Format::Depth16S8 | Format::Depth24S8 => (
            glow::DEPTH24_STENCIL8,
            glow::DEPTH_STENCIL,
            glow::UNSIGNED_INT_24_8,
        ),
        Format::Depth24X8 => (
            glow::DEPTH_COMPONENT24,
            glow::DEPTH_COMPONENT,
            glow::UNSIGNED_INT,
        ),
        Format::Depth32Float => (glow::DEPTH_COMPONENT32F, glow::DEPTH_COMPONENT, glow::FLOAT),
    }
}

/// Framebuffer attachment point matching a format's components
pub fn format_attachment(format: Format, color_index: usize) -> u32 {
    if format.has_depth() {
        if format.has_stencil() {
            glow::DEPTH_STENCIL_ATTACHMENT
        } else {
            glow::DEPTH_ATTACHMENT
        }
    } else {
        glow::COLOR_ATTACHMENT0 + color_index as u32
    }
}

/// (component type, normalized) pair for a vertex attribute declaration
pub fn vertex_format_to_gl(format: VtxFormat) -> (u32, bool) {
    match format {
        VtxFormat::Float => (glow::FLOAT, false),
        VtxFormat::UNorm8 => (glow::UNSIGNED_BYTE, true),
    }
}

/// Convert a sampler filter mode
pub fn filter_to_gl(filter: FilterMode) -> u32 {
    match filter {
        FilterMode::Nearest => glow::NEAREST,
        FilterMode::Linear => glow::LINEAR,
    }
}

/// Convert a sampler wrap mode
pub fn wrap_to_gl(wrap: WrapMode) -> u32 {
    match wrap {
        WrapMode::Clamp => glow::CLAMP_TO_EDGE,
        WrapMode::Wrap => glow::REPEAT,
    }
}

#[cfg(test)]
#[path = "gl_format_tests.rs"]
mod tests;
