//! Vulkan resource records stored in the backend's containers
//!
//! These are plain records, not RAII objects: the backend owns every
//! lifetime through its `ResourceContainer`s and destroys records
//! explicitly via `destroy`, which keeps teardown ordering under the
//! backend's control (allocator before device, resources before both).

use ash::vk;
use gpu_allocator::vulkan::Allocation;

use nova_renderer::renderer::{
    DescriptorLayoutEntry, Format, RenderPassHandle, RenderTargetHandle, TextureHandle,
    TextureUsage,
};

use crate::vulkan_context::GpuContext;

/// Buffer record: either a dedicated allocation or a sub-range of the
/// ephemeral ring buffer
pub struct VulkanBuffer {
    pub buffer: vk::Buffer,
    /// `None` for ring sub-ranges; the ring owns the allocation
    pub allocation: Option<Allocation>,
    /// Byte offset into `buffer` (nonzero only for ring sub-ranges)
    pub offset: u64,
    pub size: u32,
    /// Frame that created this buffer, when ephemeral
    pub ephemeral_frame: Option<u64>,
}

impl VulkanBuffer {
    pub fn destroy(mut self, ctx: &GpuContext) {
        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = ctx.allocator.lock() {
                allocator.free(allocation).ok();
            }
            unsafe {
                ctx.device.destroy_buffer(self.buffer, None);
            }
        }
        // Ring sub-ranges share the ring's vk::Buffer; nothing to destroy.
    }
}

/// Texture record. Render-target views share the render target's image and
/// are retired with it.
pub struct VulkanTexture {
    pub image: vk::Image,
    pub view: vk::ImageView,
    pub allocation: Option<Allocation>,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// True when this entry is the sampled view of a render target
    pub render_target_view: bool,
}

impl VulkanTexture {
    pub fn destroy(mut self, ctx: &GpuContext) {
        if self.render_target_view {
            // Image and view belong to the render target.
            return;
        }
        unsafe {
            ctx.device.destroy_image_view(self.view, None);
            ctx.device.destroy_image(self.image, None);
        }
        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = ctx.allocator.lock() {
                allocator.free(allocation).ok();
            }
        }
    }
}

pub struct VulkanSampler {
    pub sampler: vk::Sampler,
}

impl VulkanSampler {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_sampler(self.sampler, None);
        }
    }
}

/// Render target record; owns the image both it and its paired texture
/// entry view
pub struct VulkanRenderTarget {
    pub image: vk::Image,
    pub view: vk::ImageView,
    /// Secondary-format view, when the desc asked for one
    pub additional_view: Option<vk::ImageView>,
    pub allocation: Option<Allocation>,
    pub width: u32,
    pub height: u32,
    pub format: Format,
    /// Declared uses beyond the attachment use implied by the format
    pub usage: TextureUsage,
    /// Paired entry in the texture container
    pub texture: TextureHandle,
    /// Layout the image is currently in, updated at pass end and present
    pub layout: vk::ImageLayout,
}

impl VulkanRenderTarget {
    pub fn destroy(mut self, ctx: &GpuContext) {
        unsafe {
            if let Some(view) = self.additional_view {
                ctx.device.destroy_image_view(view, None);
            }
            ctx.device.destroy_image_view(self.view, None);
            ctx.device.destroy_image(self.image, None);
        }
        if let Some(allocation) = self.allocation.take() {
            if let Ok(mut allocator) = ctx.allocator.lock() {
                allocator.free(allocation).ok();
            }
        }
    }
}

/// Render pass record with the state `begin_render_pass` and
/// `create_framebuffer` need
pub struct VulkanRenderPass {
    pub render_pass: vk::RenderPass,
    pub clear_values: Vec<vk::ClearValue>,
    /// Declared color attachment formats, in slot order
    pub color_formats: Vec<Format>,
    pub depth_format: Option<Format>,
    pub final_color_layout: vk::ImageLayout,
}

impl VulkanRenderPass {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

pub struct VulkanFramebuffer {
    pub framebuffer: vk::Framebuffer,
    pub render_pass: RenderPassHandle,
    pub width: u32,
    pub height: u32,
    /// Attachments, for layout tracking at pass end
    pub attachments: Vec<RenderTargetHandle>,
}

impl VulkanFramebuffer {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

/// Pipeline record; the pipeline layout is created per pipeline from its
/// descriptor set layouts
pub struct VulkanPipeline {
    pub pipeline: vk::Pipeline,
    pub layout: vk::PipelineLayout,
}

impl VulkanPipeline {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_pipeline(self.pipeline, None);
            ctx.device.destroy_pipeline_layout(self.layout, None);
        }
    }
}

pub struct VulkanShader {
    pub module: vk::ShaderModule,
}

impl VulkanShader {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_shader_module(self.module, None);
        }
    }
}

pub struct VulkanDSLayout {
    pub layout: vk::DescriptorSetLayout,
    pub entries: Vec<DescriptorLayoutEntry>,
}

impl VulkanDSLayout {
    pub fn destroy(self, ctx: &GpuContext) {
        unsafe {
            ctx.device.destroy_descriptor_set_layout(self.layout, None);
        }
    }
}
