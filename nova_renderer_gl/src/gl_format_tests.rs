use nova_renderer::renderer::{FilterMode, Format, VtxFormat, WrapMode};

use crate::gl_format::{
    filter_to_gl, format_attachment, format_to_gl, vertex_format_to_gl, wrap_to_gl,
};

#[test]
fn test_color_formats() {
    assert_eq!(format_to_gl(Format::R8).0, glow::R8);
    assert_eq!(format_to_gl(Format::RGBA8).0, glow::RGBA8);
    assert_eq!(format_to_gl(Format::SRGBA8).0, glow::SRGB8_ALPHA8);
}

#[test]
fn test_depth_formats() {
    assert_eq!(format_to_gl(Format::Depth16).0, glow::DEPTH_COMPONENT16);
    assert_eq!(format_to_gl(Format::Depth24S8).0, glow::DEPTH24_STENCIL8);
    assert_eq!(format_to_gl(Format::Depth32Float).0, glow::DEPTH_COMPONENT32F);
}

#[test]
#[should_panic(expected = "Format::Invalid")]
fn test_invalid_format_panics() {
    format_to_gl(Format::Invalid);
}

#[test]
fn test_attachment_points() {
    assert_eq!(format_attachment(Format::RGBA8, 0), glow::COLOR_ATTACHMENT0);
    assert_eq!(format_attachment(Format::RGBA8, 1), glow::COLOR_ATTACHMENT0 + 1);
    assert_eq!(format_attachment(Format::Depth32Float, 0), glow::DEPTH_ATTACHMENT);
    assert_eq!(format_attachment(Format::Depth24S8, 0), glow::DEPTH_STENCIL_ATTACHMENT);
}

#[test]
fn test_vertex_formats() {
    assert_eq!(vertex_format_to_gl(VtxFormat::Float), (glow::FLOAT, false));
    assert_eq!(vertex_format_to_gl(VtxFormat::UNorm8), (glow::UNSIGNED_BYTE, true));
}

#[test]
fn test_sampler_conversions() {
    assert_eq!(filter_to_gl(FilterMode::Nearest), glow::NEAREST);
    assert_eq!(filter_to_gl(FilterMode::Linear), glow::LINEAR);
    assert_eq!(wrap_to_gl(WrapMode::Clamp), glow::CLAMP_TO_EDGE);
    assert_eq!(wrap_to_gl(WrapMode::Wrap), glow::REPEAT);
}
