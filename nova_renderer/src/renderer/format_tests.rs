use crate::renderer::format::{Format, VtxFormat};

#[test]
fn test_bytes_per_pixel() {
    assert_eq!(Format::R8.bytes_per_pixel(), 1);
    assert_eq!(Format::RG8.bytes_per_pixel(), 2);
    assert_eq!(Format::RGB8.bytes_per_pixel(), 3);
    assert_eq!(Format::RGBA8.bytes_per_pixel(), 4);
    assert_eq!(Format::SRGBA8.bytes_per_pixel(), 4);
    assert_eq!(Format::Depth32Float.bytes_per_pixel(), 4);
}

#[test]
#[should_panic(expected = "Format::Invalid")]
fn test_bytes_per_pixel_invalid_panics() {
    Format::Invalid.bytes_per_pixel();
}

#[test]
fn test_depth_stencil_classification() {
    assert!(Format::Depth16.has_depth());
    assert!(Format::Depth24S8.has_depth());
    assert!(Format::Depth24S8.has_stencil());
    assert!(!Format::Depth24X8.has_stencil());
    assert!(!Format::RGBA8.has_depth());
    assert!(!Format::RGBA8.has_stencil());
}

#[test]
fn test_names() {
    assert_eq!(Format::SRGBA8.name(), "sRGBA8");
    assert_eq!(Format::Depth32Float.name(), "Depth32Float");
}

#[test]
fn test_vtx_format_component_bytes() {
    assert_eq!(VtxFormat::Float.component_bytes(), 4);
    assert_eq!(VtxFormat::UNorm8.component_bytes(), 1);
}
