use ash::vk;

use nova_renderer::renderer::{
    DescriptorType, FilterMode, Format, Layout, LoadOp, TextureUsage, VSync, VtxFormat, WrapMode,
};

use crate::vulkan_format::{
    descriptor_type_to_vk, filter_to_vk, format_aspect, format_to_vk, layout_to_vk, load_op_to_vk,
    texture_usage_to_vk, vertex_format_to_vk, vsync_to_vk, wrap_to_vk,
};

#[test]
fn test_color_formats() {
    assert_eq!(format_to_vk(Format::R8), vk::Format::R8_UNORM);
    assert_eq!(format_to_vk(Format::RG8), vk::Format::R8G8_UNORM);
    assert_eq!(format_to_vk(Format::RGB8), vk::Format::R8G8B8_UNORM);
    assert_eq!(format_to_vk(Format::RGBA8), vk::Format::R8G8B8A8_UNORM);
    assert_eq!(format_to_vk(Format::SRGBA8), vk::Format::R8G8B8A8_SRGB);
}

#[test]
fn test_depth_formats() {
    assert_eq!(format_to_vk(Format::Depth16), vk::Format::D16_UNORM);
    assert_eq!(format_to_vk(Format::Depth16S8), vk::Format::D16_UNORM_S8_UINT);
    assert_eq!(format_to_vk(Format::Depth24S8), vk::Format::D24_UNORM_S8_UINT);
    assert_eq!(format_to_vk(Format::Depth24X8), vk::Format::X8_D24_UNORM_PACK32);
    assert_eq!(format_to_vk(Format::Depth32Float), vk::Format::D32_SFLOAT);
}

#[test]
#[should_panic(expected = "Format::Invalid")]
fn test_invalid_format_panics() {
    format_to_vk(Format::Invalid);
}

#[test]
fn test_format_aspects() {
    assert_eq!(format_aspect(Format::RGBA8), vk::ImageAspectFlags::COLOR);
    assert_eq!(format_aspect(Format::Depth32Float), vk::ImageAspectFlags::DEPTH);
    assert_eq!(
        format_aspect(Format::Depth24S8),
        vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
    );
}

#[test]
fn test_vertex_formats() {
    assert_eq!(vertex_format_to_vk(VtxFormat::Float, 2), vk::Format::R32G32_SFLOAT);
    assert_eq!(vertex_format_to_vk(VtxFormat::Float, 3), vk::Format::R32G32B32_SFLOAT);
    assert_eq!(vertex_format_to_vk(VtxFormat::UNorm8, 4), vk::Format::R8G8B8A8_UNORM);
}

#[test]
#[should_panic(expected = "out of range")]
fn test_vertex_format_bad_count_panics() {
    vertex_format_to_vk(VtxFormat::Float, 5);
}

#[test]
fn test_layouts() {
    assert_eq!(layout_to_vk(Layout::Undefined), vk::ImageLayout::UNDEFINED);
    assert_eq!(layout_to_vk(Layout::ShaderRead), vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL);
    assert_eq!(layout_to_vk(Layout::TransferSrc), vk::ImageLayout::TRANSFER_SRC_OPTIMAL);
}

#[test]
fn test_load_ops() {
    assert_eq!(load_op_to_vk(LoadOp::DontCare), vk::AttachmentLoadOp::DONT_CARE);
    assert_eq!(load_op_to_vk(LoadOp::Load), vk::AttachmentLoadOp::LOAD);
    assert_eq!(load_op_to_vk(LoadOp::Clear), vk::AttachmentLoadOp::CLEAR);
}

#[test]
fn test_texture_usage_flags() {
    assert_eq!(
        texture_usage_to_vk(TextureUsage::SAMPLED | TextureUsage::TRANSFER_SRC),
        vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_SRC
    );
    assert_eq!(
        texture_usage_to_vk(TextureUsage::RENDER_TARGET),
        vk::ImageUsageFlags::COLOR_ATTACHMENT
    );
    assert_eq!(
        texture_usage_to_vk(TextureUsage::DEPTH_STENCIL),
        vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
    );
}

#[test]
fn test_sampler_conversions() {
    assert_eq!(filter_to_vk(FilterMode::Nearest), vk::Filter::NEAREST);
    assert_eq!(filter_to_vk(FilterMode::Linear), vk::Filter::LINEAR);
    assert_eq!(wrap_to_vk(WrapMode::Clamp), vk::SamplerAddressMode::CLAMP_TO_EDGE);
    assert_eq!(wrap_to_vk(WrapMode::Wrap), vk::SamplerAddressMode::REPEAT);
}

#[test]
fn test_present_modes() {
    assert_eq!(vsync_to_vk(VSync::Off), vk::PresentModeKHR::IMMEDIATE);
    assert_eq!(vsync_to_vk(VSync::On), vk::PresentModeKHR::FIFO);
    assert_eq!(vsync_to_vk(VSync::LateSwapTear), vk::PresentModeKHR::FIFO_RELAXED);
}

#[test]
fn test_descriptor_types() {
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::UniformBuffer),
        vk::DescriptorType::UNIFORM_BUFFER
    );
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::StorageBuffer),
        vk::DescriptorType::STORAGE_BUFFER
    );
    assert_eq!(descriptor_type_to_vk(DescriptorType::Sampler), vk::DescriptorType::SAMPLER);
    assert_eq!(descriptor_type_to_vk(DescriptorType::Texture), vk::DescriptorType::SAMPLED_IMAGE);
    assert_eq!(
        descriptor_type_to_vk(DescriptorType::CombinedSampler),
        vk::DescriptorType::COMBINED_IMAGE_SAMPLER
    );
}
