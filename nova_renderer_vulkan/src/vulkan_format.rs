//! Conversions between renderer enums and their Vulkan equivalents

use ash::vk;

use nova_renderer::renderer::{
    DescriptorType, FilterMode, Format, Layout, LoadOp, TextureUsage, VSync, VtxFormat, WrapMode,
};

/// Convert a pixel format to the Vulkan format used for images and
/// attachments
pub fn format_to_vk(format: Format) -> vk::Format {
    match format {
        Format::Invalid => panic!("format_to_vk on Format::Invalid"),
        Format::R8 => vk::Format::R8_UNORM,
        Format::RG8 => vk::Format::R8G8_UNORM,
        Format::RGB8 => vk::Format::R8G8B8_UNORM,
        Format::RGBA8 => vk::Format::R8G8B8A8_UNORM,
        Format::SRGBA8 => vk::Format::R8G8B8A8_SRGB,
        Format::Depth16 => vk::Format::D16_UNORM,
        Format::Depth16S8 => vk::Format::D16_UNORM_S8_UINT,
        Format::Depth24S8 => vk::Format::D24_UNORM_S8_UINT,
        Format::Depth24X8 => vk::Format::X8_D24_UNORM_PACK32,
        Format::Depth32Float => vk::Format::D32_SFLOAT,
    }
}

/// Aspect flags matching a format's components
pub fn format_aspect(format: Format) -> vk::ImageAspectFlags {
    if format.has_depth() {
        if format.has_stencil() {
            vk::ImageAspectFlags::DEPTH | vk::ImageAspectFlags::STENCIL
        } else {
            vk::ImageAspectFlags::DEPTH
        }
    } else {
        vk::ImageAspectFlags::COLOR
    }
}

/// Convert declared texture usage to Vulkan image usage flags
pub fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    let mut flags = vk::ImageUsageFlags::empty();
    if usage.contains(TextureUsage::SAMPLED) {
        flags |= vk::ImageUsageFlags::SAMPLED;
    }
    if usage.contains(TextureUsage::RENDER_TARGET) {
        flags |= vk::ImageUsageFlags::COLOR_ATTACHMENT;
    }
    if usage.contains(TextureUsage::DEPTH_STENCIL) {
        flags |= vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT;
    }
    if usage.contains(TextureUsage::TRANSFER_SRC) {
        flags |= vk::ImageUsageFlags::TRANSFER_SRC;
    }
    flags
}

/// Convert a vertex attribute declaration to the Vulkan vertex format
pub fn vertex_format_to_vk(format: VtxFormat, count: u8) -> vk::Format {
    match (format, count) {
        (VtxFormat::Float, 1) => vk::Format::R32_SFLOAT,
        (VtxFormat::Float, 2) => vk::Format::R32G32_SFLOAT,
        (VtxFormat::Float, 3) => vk::Format::R32G32B32_SFLOAT,
        (VtxFormat::Float, 4) => vk::Format::R32G32B32A32_SFLOAT,
        (VtxFormat::UNorm8, 1) => vk::Format::R8_UNORM,
        (VtxFormat::UNorm8, 2) => vk::Format::R8G8_UNORM,
        (VtxFormat::UNorm8, 3) => vk::Format::R8G8B8_UNORM,
        (VtxFormat::UNorm8, 4) => vk::Format::R8G8B8A8_UNORM,
        (_, n) => panic!("vertex attribute component count {} out of range", n),
    }
}

/// Convert a final-layout declaration to the Vulkan image layout
pub fn layout_to_vk(layout: Layout) -> vk::ImageLayout {
    match layout {
        Layout::Undefined => vk::ImageLayout::UNDEFINED,
        Layout::ShaderRead => vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        Layout::TransferSrc => vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
    }
}

/// Convert an attachment load op
pub fn load_op_to_vk(op: LoadOp) -> vk::AttachmentLoadOp {
    match op {
        LoadOp::DontCare => vk::AttachmentLoadOp::DONT_CARE,
        LoadOp::Load => vk::AttachmentLoadOp::LOAD,
        LoadOp::Clear => vk::AttachmentLoadOp::CLEAR,
    }
}

/// Convert a sampler filter mode
pub fn filter_to_vk(filter: FilterMode) -> vk::Filter {
    match filter {
        FilterMode::Nearest => vk::Filter::NEAREST,
        FilterMode::Linear => vk::Filter::LINEAR,
    }
}

/// Convert a sampler wrap mode
pub fn wrap_to_vk(wrap: WrapMode) -> vk::SamplerAddressMode {
    match wrap {
        WrapMode::Clamp => vk::SamplerAddressMode::CLAMP_TO_EDGE,
        WrapMode::Wrap => vk::SamplerAddressMode::REPEAT,
    }
}

/// Convert a vsync policy to the preferred present mode.
///
/// The swapchain falls back to FIFO when the preferred mode is not
/// supported by the surface; FIFO support is mandatory.
pub fn vsync_to_vk(vsync: VSync) -> vk::PresentModeKHR {
    match vsync {
        VSync::Off => vk::PresentModeKHR::IMMEDIATE,
        VSync::On => vk::PresentModeKHR::FIFO,
        VSync::LateSwapTear => vk::PresentModeKHR::FIFO_RELAXED,
    }
}

/// Convert a descriptor slot type
pub fn descriptor_type_to_vk(ty: DescriptorType) -> vk::DescriptorType {
    match ty {
        DescriptorType::UniformBuffer => vk::DescriptorType::UNIFORM_BUFFER,
        DescriptorType::StorageBuffer => vk::DescriptorType::STORAGE_BUFFER,
        DescriptorType::Sampler => vk::DescriptorType::SAMPLER,
        DescriptorType::Texture => vk::DescriptorType::SAMPLED_IMAGE,
        DescriptorType::CombinedSampler => vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
    }
}

#[cfg(test)]
#[path = "vulkan_format_tests.rs"]
mod tests;
