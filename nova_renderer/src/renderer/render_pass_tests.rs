use crate::renderer::format::{Format, Layout};
use crate::renderer::render_pass::{LoadOp, RenderPassDesc};

#[test]
fn test_color_and_depth_declaration() {
    let desc = RenderPassDesc::new()
        .color(0, Format::RGBA8, LoadOp::Clear)
        .depth_stencil(Format::Depth24S8, LoadOp::Clear)
        .color_final_layout(Layout::ShaderRead)
        .name("main");

    assert_eq!(desc.color_count(), 1);
    assert_eq!(desc.get_color(0).format(), Format::RGBA8);
    assert_eq!(desc.get_color(0).load_op(), LoadOp::Clear);
    assert!(desc.has_depth_stencil());
    assert_eq!(desc.get_depth_stencil().format(), Format::Depth24S8);
    assert_eq!(desc.get_color_final_layout(), Layout::ShaderRead);
}

#[test]
fn test_no_depth_by_default() {
    let desc = RenderPassDesc::new().color(0, Format::SRGBA8, LoadOp::DontCare);
    assert!(!desc.has_depth_stencil());
}

#[test]
#[should_panic(expected = "out of range")]
fn test_color_index_limit() {
    RenderPassDesc::new().color(99, Format::RGBA8, LoadOp::Clear);
}

#[test]
#[should_panic(expected = "depth format in color attachment slot")]
fn test_depth_format_in_color_slot_rejected() {
    RenderPassDesc::new().color(0, Format::Depth16, LoadOp::Clear);
}

#[test]
#[should_panic(expected = "depth format")]
fn test_color_format_in_depth_slot_rejected() {
    RenderPassDesc::new().depth_stencil(Format::RGBA8, LoadOp::Clear);
}

#[test]
#[should_panic(expected = "Undefined")]
fn test_undefined_final_layout_rejected() {
    RenderPassDesc::new().color_final_layout(Layout::Undefined);
}
