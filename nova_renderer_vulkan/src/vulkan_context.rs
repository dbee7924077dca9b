//! GpuContext - shared GPU resources for all Vulkan objects
//!
//! Contains everything resource code needs for GPU operations: the device
//! for Vulkan API calls, the allocator for memory management, the graphics
//! queue, and a command pool for one-shot upload submissions.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::Mutex;

use nova_renderer::{render_err, Error, Result};

/// Shared GPU context for all Vulkan resources.
///
/// Device and instance destruction is handled by `VulkanBackend::drop()`
/// to keep drop ordering explicit; the allocator is wrapped in
/// `ManuallyDrop` so it can be torn down before the device.
pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator; dropped explicitly before the device
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    /// Graphics queue for command submission
    pub graphics_queue: vk::Queue,

    /// Graphics queue family index
    pub graphics_queue_family: u32,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: vk::CommandPool,
}

impl GpuContext {
    pub fn new(
        device: ash::Device,
        allocator: Allocator,
        graphics_queue: vk::Queue,
        graphics_queue_family: u32,
        upload_command_pool: vk::CommandPool,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            graphics_queue,
            graphics_queue_family,
            upload_command_pool,
        }
    }

    /// Record commands into a transient command buffer, submit them on the
    /// graphics queue, and block until the submission's fence signals.
    ///
    /// Used for resource uploads and layout transitions at creation time;
    /// per-frame work goes through the frame command buffer instead.
    pub fn one_shot_submit<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        unsafe {
            let alloc_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(self.upload_command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self
                .device
                .allocate_command_buffers(&alloc_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to allocate upload command buffer: {:?}", e)
                })?[0];

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.device
                .begin_command_buffer(command_buffer, &begin_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to begin upload command buffer: {:?}", e)
                })?;

            record(command_buffer);

            self.device.end_command_buffer(command_buffer).map_err(|e| {
                render_err!("nova::vulkan", "Failed to end upload command buffer: {:?}", e)
            })?;

            let fence = self
                .device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| render_err!("nova::vulkan", "Failed to create upload fence: {:?}", e))?;

            let command_buffers = [command_buffer];
            let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);

            let submit_result = self
                .device
                .queue_submit(self.graphics_queue, &[submit_info], fence)
                .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX));

            self.device.destroy_fence(fence, None);
            self.device
                .free_command_buffers(self.upload_command_pool, &command_buffers);

            submit_result.map_err(|e| match e {
                vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
                other => render_err!("nova::vulkan", "Upload submission failed: {:?}", other),
            })
        }
    }
}
