use crate::renderer::format::VtxFormat;
use crate::renderer::handle::{
    DSLayoutHandle, FragmentShaderHandle, Handle, RenderPassHandle, VertexShaderHandle,
};
use crate::renderer::pipeline::PipelineDesc;

fn vs() -> VertexShaderHandle {
    Handle::from_raw(1)
}

fn fs() -> FragmentShaderHandle {
    Handle::from_raw(1)
}

fn rp() -> RenderPassHandle {
    Handle::from_raw(1)
}

#[test]
fn test_complete_pipeline_desc() {
    let desc = PipelineDesc::new()
        .vertex_shader(vs())
        .fragment_shader(fs())
        .render_pass(rp())
        .vertex_attrib(0, 0, 3, VtxFormat::Float, 0)
        .vertex_attrib(1, 0, 2, VtxFormat::Float, 12)
        .vertex_buffer_stride(0, 20)
        .descriptor_set_layout(0, DSLayoutHandle::from_raw(1))
        .depth_test(true)
        .depth_write(true)
        .cull_faces(true)
        .name("opaque");

    desc.validate();
    assert_eq!(desc.get_vertex_attrib_mask(), 0b11);
    assert_eq!(desc.get_vertex_attrib(0).count, 3);
    assert_eq!(desc.get_vertex_attrib(1).offset, 12);
    assert_eq!(desc.get_vertex_buffer_stride(0), 20);
    assert!(desc.get_depth_test());
    assert!(desc.get_depth_write());
    assert!(desc.get_cull_faces());
    assert!(!desc.get_blending());
    assert!(!desc.get_scissor_test());
}

#[test]
#[should_panic(expected = "vertex attribute 8 out of range")]
fn test_attribute_index_limit() {
    PipelineDesc::new().vertex_attrib(8, 0, 4, VtxFormat::Float, 0);
}

#[test]
#[should_panic(expected = "component count")]
fn test_attribute_component_count_limit() {
    PipelineDesc::new().vertex_attrib(0, 0, 5, VtxFormat::Float, 0);
}

#[test]
#[should_panic(expected = "vertex buffer binding")]
fn test_buffer_binding_limit() {
    PipelineDesc::new().vertex_buffer_stride(4, 16);
}

#[test]
#[should_panic(expected = "descriptor set index")]
fn test_descriptor_set_index_limit() {
    PipelineDesc::new().descriptor_set_layout(4, DSLayoutHandle::from_raw(1));
}

#[test]
#[should_panic(expected = "vertex shader not set")]
fn test_validate_requires_shaders() {
    PipelineDesc::new().render_pass(rp()).validate();
}

#[test]
#[should_panic(expected = "not declared")]
fn test_reading_undeclared_attribute_panics() {
    let desc = PipelineDesc::new().vertex_attrib(0, 0, 3, VtxFormat::Float, 0);
    desc.get_vertex_attrib(1);
}
