//! VulkanBackend - Vulkan implementation of the RenderBackend trait
//!
//! Central object owning the instance, device, allocator, swapchain, and
//! every resource container. One frame is in flight at a time: the frame
//! command buffer is recorded between `begin_frame` and `present_frame`,
//! submitted with the acquire/present semaphores, and fenced before the
//! ring buffer and per-frame descriptor pool are reset.

use ash::vk;
use gpu_allocator::vulkan::{
    Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc,
};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::io::Cursor;

use nova_renderer::renderer::{
    read_binding, tags, BoundResource, BufferHandle, DSLayoutHandle, DescriptorLayoutEntry,
    Format, FragmentShaderHandle, FramebufferDesc, FramebufferHandle,
    MemoryStats, PipelineDesc, PipelineHandle, RenderBackend, RenderPassDesc, RenderPassHandle,
    RenderTargetDesc, RenderTargetHandle, RendererDesc, ResourceContainer, RingBufferAllocator,
    SamplerDesc, SamplerHandle, ShaderLoader, ShaderMacros, ShaderStage, SwapchainDesc,
    TextureDesc, TextureHandle, TextureUsage, VertexShaderHandle, MAX_DESCRIPTOR_SETS,
    MAX_VERTEX_BUFFERS,
};
use nova_renderer::renderer::validate_layout;
use nova_renderer::{render_debug, render_err, render_error, render_info, render_warn};
use nova_renderer::{Error, Result};

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    descriptor_type_to_vk, filter_to_vk, format_aspect, format_to_vk, layout_to_vk, load_op_to_vk,
    texture_usage_to_vk, vertex_format_to_vk, wrap_to_vk,
};
use crate::vulkan_resources::{
    VulkanBuffer, VulkanDSLayout, VulkanFramebuffer, VulkanPipeline, VulkanRenderPass,
    VulkanRenderTarget, VulkanSampler, VulkanShader, VulkanTexture,
};
use crate::vulkan_swapchain::Swapchain;

/// Vulkan implementation of the renderer backend
pub struct VulkanBackend {
    _entry: ash::Entry,
    instance: ash::Instance,
    physical_device: vk::PhysicalDevice,
    /// Minimum offset alignment for uniform/storage buffer bindings
    min_buffer_align: u32,

    ctx: GpuContext,

    debug_utils: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,

    swapchain: Swapchain,
    swapchain_desc: SwapchainDesc,

    shader_loader: Box<dyn ShaderLoader>,

    /// Per-frame command recording
    frame_command_pool: vk::CommandPool,
    frame_command_buffer: vk::CommandBuffer,
    frame_fence: vk::Fence,
    /// Descriptor sets live one frame; the whole pool resets at present
    frame_descriptor_pool: vk::DescriptorPool,

    /// Persistently-mapped ring backing ephemeral buffers
    ring: RingBufferAllocator,
    ring_buffer: vk::Buffer,
    ring_allocation: Option<Allocation>,
    ephemerals: Vec<BufferHandle>,
    frame_num: u64,

    current_pipeline: PipelineHandle,

    buffers: ResourceContainer<tags::Buffer, VulkanBuffer>,
    textures: ResourceContainer<tags::Texture, VulkanTexture>,
    samplers: ResourceContainer<tags::Sampler, VulkanSampler>,
    render_targets: ResourceContainer<tags::RenderTarget, VulkanRenderTarget>,
    render_passes: ResourceContainer<tags::RenderPass, VulkanRenderPass>,
    framebuffers: ResourceContainer<tags::Framebuffer, VulkanFramebuffer>,
    pipelines: ResourceContainer<tags::Pipeline, VulkanPipeline>,
    vertex_shaders: ResourceContainer<tags::VertexShader, VulkanShader>,
    fragment_shaders: ResourceContainer<tags::FragmentShader, VulkanShader>,
    ds_layouts: ResourceContainer<tags::DescriptorSetLayout, VulkanDSLayout>,
}

impl VulkanBackend {
    /// Create a descriptor pool sized for one frame's worth of sets
    fn create_descriptor_pool(device: &ash::Device) -> Result<vk::DescriptorPool> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: 2048,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLED_IMAGE,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::SAMPLER,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: 1024,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::STORAGE_BUFFER,
                descriptor_count: 1024,
            },
        ];
        let info = vk::DescriptorPoolCreateInfo::default()
            .pool_sizes(&pool_sizes)
            .max_sets(1024);

        unsafe {
            device.create_descriptor_pool(&info, None).map_err(|e| {
                render_error!("nova::vulkan", "Failed to create descriptor pool: {:?}", e);
                Error::InitializationFailed(format!("Failed to create descriptor pool: {:?}", e))
            })
        }
    }

    /// Create a new Vulkan backend over `window`'s surface
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(
        window: &W,
        desc: &RendererDesc,
        shader_loader: Box<dyn ShaderLoader>,
    ) -> Result<Self> {
        unsafe {
            let entry = ash::Entry::load().map_err(|e| {
                render_error!("nova::vulkan", "Failed to load Vulkan library: {:?}", e);
                Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
            })?;

            let enable_validation = desc.debug && cfg!(feature = "vulkan-validation");

            let app_info = vk::ApplicationInfo::default()
                .application_name(c"Nova Application")
                .application_version(vk::make_api_version(0, 1, 0, 0))
                .engine_name(c"Nova")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_3);

            let display_handle = window.display_handle().map_err(|e| {
                render_error!("nova::vulkan", "Failed to get display handle: {}", e);
                Error::InitializationFailed(format!("Failed to get display handle: {}", e))
            })?;
            let mut extension_names =
                ash_window::enumerate_required_extensions(display_handle.as_raw())
                    .map_err(|e| {
                        render_error!("nova::vulkan", "Failed to get required extensions: {}", e);
                        Error::InitializationFailed(format!(
                            "Failed to get required extensions: {}",
                            e
                        ))
                    })?
                    .to_vec();

            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }

            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let create_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);

            let instance = entry.create_instance(&create_info, None).map_err(|e| {
                render_error!("nova::vulkan", "Failed to create Vulkan instance: {:?}", e);
                Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
            })?;

            let debug_utils = if enable_validation {
                let loader = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(
                        vk::DebugUtilsMessageSeverityFlagsEXT::ERROR
                            | vk::DebugUtilsMessageSeverityFlagsEXT::WARNING,
                    )
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(crate::vulkan_debug::vulkan_debug_callback));
                let messenger = loader
                    .create_debug_utils_messenger(&debug_info, None)
                    .map_err(|e| {
                        render_error!("nova::vulkan", "Failed to create debug messenger: {:?}", e);
                        Error::InitializationFailed(format!(
                            "Failed to create debug messenger: {:?}",
                            e
                        ))
                    })?;
                Some((loader, messenger))
            } else {
                None
            };

            let window_handle = window.window_handle().map_err(|e| {
                render_error!("nova::vulkan", "Failed to get window handle: {}", e);
                Error::InitializationFailed(format!("Failed to get window handle: {}", e))
            })?;
            let surface = ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| {
                render_error!("nova::vulkan", "Failed to create surface: {:?}", e);
                Error::InitializationFailed(format!("Failed to create surface: {:?}", e))
            })?;
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
                render_error!("nova::vulkan", "Failed to enumerate physical devices: {:?}", e);
                Error::InitializationFailed(format!(
                    "Failed to enumerate physical devices: {:?}",
                    e
                ))
            })?;

            // First device with a queue family doing both graphics and present
            let mut selected = None;
            'devices: for physical_device in physical_devices {
                let queue_families =
                    instance.get_physical_device_queue_family_properties(physical_device);
                for (index, family) in queue_families.iter().enumerate() {
                    let graphics = family.queue_flags.contains(vk::QueueFlags::GRAPHICS);
                    let present = surface_loader
                        .get_physical_device_surface_support(
                            physical_device,
                            index as u32,
                            surface,
                        )
                        .unwrap_or(false);
                    if graphics && present {
                        selected = Some((physical_device, index as u32));
                        break 'devices;
                    }
                }
            }
            let (physical_device, graphics_family) = selected.ok_or_else(|| {
                render_error!("nova::vulkan", "No suitable GPU with graphics+present queue found");
                Error::InitializationFailed("No suitable GPU found".to_string())
            })?;

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = std::ffi::CStr::from_ptr(properties.device_name.as_ptr())
                .to_str()
                .unwrap_or("Unknown");
            render_info!("nova::vulkan", "Using GPU: {}", device_name);

            let min_buffer_align = (properties.limits.min_uniform_buffer_offset_alignment)
                .max(properties.limits.min_storage_buffer_offset_alignment)
                .max(1) as u32;

            let queue_priorities = [1.0];
            let queue_create_infos = [vk::DeviceQueueCreateInfo::default()
                .queue_family_index(graphics_family)
                .queue_priorities(&queue_priorities)];

            let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();

            let device_create_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_create_infos)
                .enabled_extension_names(&device_extension_names)
                .enabled_features(&device_features);

            let device = instance
                .create_device(physical_device, &device_create_info, None)
                .map_err(|e| {
                    render_error!("nova::vulkan", "Failed to create logical device: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create device: {:?}", e))
                })?;

            let graphics_queue = device.get_device_queue(graphics_family, 0);

            let allocator = Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            })
            .map_err(|e| {
                render_error!("nova::vulkan", "Failed to create GPU allocator: {:?}", e);
                Error::InitializationFailed(format!("Failed to create allocator: {:?}", e))
            })?;

            let upload_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(
                    vk::CommandPoolCreateFlags::TRANSIENT
                        | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER,
                );
            let upload_command_pool = device
                .create_command_pool(&upload_pool_info, None)
                .map_err(|e| {
                    render_error!("nova::vulkan", "Failed to create upload command pool: {:?}", e);
                    Error::InitializationFailed(format!(
                        "Failed to create upload command pool: {:?}",
                        e
                    ))
                })?;

            let frame_pool_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(graphics_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
            let frame_command_pool = device
                .create_command_pool(&frame_pool_info, None)
                .map_err(|e| {
                    render_error!("nova::vulkan", "Failed to create frame command pool: {:?}", e);
                    Error::InitializationFailed(format!(
                        "Failed to create frame command pool: {:?}",
                        e
                    ))
                })?;

            let cb_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(frame_command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);
            let frame_command_buffer =
                device.allocate_command_buffers(&cb_info).map_err(|e| {
                    render_error!("nova::vulkan", "Failed to allocate frame command buffer: {:?}", e);
                    Error::InitializationFailed(format!(
                        "Failed to allocate frame command buffer: {:?}",
                        e
                    ))
                })?[0];

            let frame_fence = device
                .create_fence(&vk::FenceCreateInfo::default(), None)
                .map_err(|e| {
                    render_error!("nova::vulkan", "Failed to create frame fence: {:?}", e);
                    Error::InitializationFailed(format!("Failed to create frame fence: {:?}", e))
                })?;

            let frame_descriptor_pool = Self::create_descriptor_pool(&device)?;

            let ctx = GpuContext::new(
                device,
                allocator,
                graphics_queue,
                graphics_family,
                upload_command_pool,
            );

            // Persistently-mapped ring buffer for ephemeral data
            let ring_size = desc.ephemeral_ring_buf_size;
            let (ring_buffer, ring_allocation) = Self::allocate_buffer_raw(
                &ctx,
                u64::from(ring_size),
                vk::BufferUsageFlags::VERTEX_BUFFER
                    | vk::BufferUsageFlags::INDEX_BUFFER
                    | vk::BufferUsageFlags::UNIFORM_BUFFER
                    | vk::BufferUsageFlags::STORAGE_BUFFER
                    | vk::BufferUsageFlags::TRANSFER_SRC,
                MemoryLocation::CpuToGpu,
                "ephemeral ring buffer",
            )?;

            let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &ctx.device);
            let swapchain = Swapchain::new(
                physical_device,
                &ctx.device,
                surface,
                surface_loader,
                swapchain_loader,
                &desc.swapchain,
            )?;

            render_info!("nova::vulkan", "Vulkan backend initialized");

            Ok(Self {
                _entry: entry,
                instance,
                physical_device,
                min_buffer_align,
                ctx,
                debug_utils,
                swapchain,
                swapchain_desc: desc.swapchain,
                shader_loader,
                frame_command_pool,
                frame_command_buffer,
                frame_fence,
                frame_descriptor_pool,
                ring: RingBufferAllocator::new(ring_size),
                ring_buffer,
                ring_allocation: Some(ring_allocation),
                ephemerals: Vec::new(),
                frame_num: 0,
                current_pipeline: PipelineHandle::EMPTY,
                buffers: ResourceContainer::new(),
                textures: ResourceContainer::new(),
                samplers: ResourceContainer::new(),
                render_targets: ResourceContainer::new(),
                render_passes: ResourceContainer::new(),
                framebuffers: ResourceContainer::new(),
                pipelines: ResourceContainer::new(),
                vertex_shaders: ResourceContainer::new(),
                fragment_shaders: ResourceContainer::new(),
                ds_layouts: ResourceContainer::new(),
            })
        }
    }

    /// Create a vk::Buffer with bound memory
    fn allocate_buffer_raw(
        ctx: &GpuContext,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<(vk::Buffer, Allocation)> {
        unsafe {
            let buffer_info = vk::BufferCreateInfo::default()
                .size(size)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE);
            let buffer = ctx.device.create_buffer(&buffer_info, None).map_err(|e| {
                render_err!("nova::vulkan", "Failed to create buffer '{}': {:?}", name, e)
            })?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location,
                    linear: true,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    ctx.device.destroy_buffer(buffer, None);
                    map_alloc_error(e, name)
                })?;

            ctx.device
                .bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to bind buffer memory '{}': {:?}", name, e)
                })?;

            Ok((buffer, allocation))
        }
    }

    /// Create a 2D vk::Image with bound memory
    fn allocate_image_raw(
        &self,
        width: u32,
        height: u32,
        mip_levels: u32,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        flags: vk::ImageCreateFlags,
        name: &str,
    ) -> Result<(vk::Image, Allocation)> {
        unsafe {
            let image_info = vk::ImageCreateInfo::default()
                .flags(flags)
                .image_type(vk::ImageType::TYPE_2D)
                .format(format)
                .extent(vk::Extent3D {
                    width,
                    height,
                    depth: 1,
                })
                .mip_levels(mip_levels)
                .array_layers(1)
                .samples(vk::SampleCountFlags::TYPE_1)
                .tiling(vk::ImageTiling::OPTIMAL)
                .usage(usage)
                .sharing_mode(vk::SharingMode::EXCLUSIVE)
                .initial_layout(vk::ImageLayout::UNDEFINED);
            let image = self.ctx.device.create_image(&image_info, None).map_err(|e| {
                render_err!("nova::vulkan", "Failed to create image '{}': {:?}", name, e)
            })?;

            let requirements = self.ctx.device.get_image_memory_requirements(image);
            let allocation = self
                .ctx
                .allocator
                .lock()
                .unwrap()
                .allocate(&AllocationCreateDesc {
                    name,
                    requirements,
                    location: MemoryLocation::GpuOnly,
                    linear: false,
                    allocation_scheme: AllocationScheme::GpuAllocatorManaged,
                })
                .map_err(|e| {
                    self.ctx.device.destroy_image(image, None);
                    map_alloc_error(e, name)
                })?;

            self.ctx
                .device
                .bind_image_memory(image, allocation.memory(), allocation.offset())
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to bind image memory '{}': {:?}", name, e)
                })?;

            Ok((image, allocation))
        }
    }

    fn create_view(
        &self,
        image: vk::Image,
        format: vk::Format,
        aspect: vk::ImageAspectFlags,
        mip_levels: u32,
    ) -> Result<vk::ImageView> {
        let info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe {
            self.ctx
                .device
                .create_image_view(&info, None)
                .map_err(|e| render_err!("nova::vulkan", "Failed to create image view: {:?}", e))
        }
    }

    /// Record a full-image layout transition barrier
    fn transition_image(
        device: &ash::Device,
        cmd: vk::CommandBuffer,
        image: vk::Image,
        aspect: vk::ImageAspectFlags,
        mip_levels: u32,
        old_layout: vk::ImageLayout,
        new_layout: vk::ImageLayout,
    ) {
        let barrier = vk::ImageMemoryBarrier::default()
            .src_access_mask(vk::AccessFlags::MEMORY_WRITE)
            .dst_access_mask(vk::AccessFlags::MEMORY_READ | vk::AccessFlags::MEMORY_WRITE)
            .old_layout(old_layout)
            .new_layout(new_layout)
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: aspect,
                base_mip_level: 0,
                level_count: mip_levels,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe {
            device.cmd_pipeline_barrier(
                cmd,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::PipelineStageFlags::ALL_COMMANDS,
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[barrier],
            );
        }
    }

    fn load_shader_module(
        &self,
        name: &str,
        stage: ShaderStage,
        macros: &ShaderMacros,
    ) -> Result<vk::ShaderModule> {
        let bytes = self.shader_loader.load(name, stage, macros)?;
        let words = ash::util::read_spv(&mut Cursor::new(&bytes)).map_err(|e| {
            Error::ShaderCompileFailed {
                name: name.to_string(),
                log: format!("invalid SPIR-V: {}", e),
            }
        })?;

        let info = vk::ShaderModuleCreateInfo::default().code(&words);
        unsafe {
            self.ctx
                .device
                .create_shader_module(&info, None)
                .map_err(|e| Error::ShaderCompileFailed {
                    name: name.to_string(),
                    log: format!("shader module creation failed: {:?}", e),
                })
        }
    }

    /// Bytes of the mapped ring buffer
    fn ring_mapped_ptr(&mut self) -> *mut u8 {
        self.ring_allocation
            .as_ref()
            .and_then(|a| a.mapped_ptr())
            .expect("ring buffer is not mapped")
            .as_ptr() as *mut u8
    }

    /// End-of-frame reclamation, after the frame fence has signaled (or
    /// when nothing was submitted)
    fn end_of_frame(&mut self) {
        for handle in self.ephemerals.drain(..) {
            self.buffers.remove(handle);
        }
        self.ring.reset();
        self.buffers.recycle();
        self.textures.recycle();
        self.samplers.recycle();
        self.render_targets.recycle();
        self.render_passes.recycle();
        self.framebuffers.recycle();
        self.pipelines.recycle();
        self.vertex_shaders.recycle();
        self.fragment_shaders.recycle();
        self.ds_layouts.recycle();
        unsafe {
            if let Err(e) = self
                .ctx
                .device
                .reset_descriptor_pool(self.frame_descriptor_pool, vk::DescriptorPoolResetFlags::empty())
            {
                render_warn!("nova::vulkan", "Failed to reset descriptor pool: {:?}", e);
            }
        }
        self.current_pipeline = PipelineHandle::EMPTY;
        self.frame_num += 1;
    }
}

fn map_alloc_error(e: gpu_allocator::AllocationError, name: &str) -> Error {
    match e {
        gpu_allocator::AllocationError::OutOfMemory => Error::OutOfMemory,
        other => {
            render_error!("nova::vulkan", "Allocation '{}' failed: {:?}", name, other);
            Error::BackendError(format!("allocation failed: {:?}", other))
        }
    }
}

impl RenderBackend for VulkanBackend {
    fn is_render_target_format_supported(&self, format: Format) -> bool {
        if format == Format::Invalid {
            return false;
        }
        let properties = unsafe {
            self.instance
                .get_physical_device_format_properties(self.physical_device, format_to_vk(format))
        };
        let needed = if format.has_depth() {
            vk::FormatFeatureFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::FormatFeatureFlags::COLOR_ATTACHMENT | vk::FormatFeatureFlags::BLIT_SRC
        };
        properties.optimal_tiling_features.contains(needed)
    }

    fn drawable_size(&self) -> glam::UVec2 {
        let extent = self.swapchain.extent();
        glam::UVec2::new(extent.width, extent.height)
    }

    fn mem_stats(&self) -> MemoryStats {
        match self.ctx.allocator.lock() {
            Ok(allocator) => {
                let report = allocator.generate_report();
                MemoryStats {
                    allocation_count: report.blocks.len() as u32,
                    sub_allocation_count: report.allocations.len() as u32,
                    used_bytes: report.total_allocated_bytes,
                    unused_bytes: report.total_reserved_bytes - report.total_allocated_bytes,
                }
            }
            Err(_) => MemoryStats::default(),
        }
    }

    fn create_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        assert!(size > 0, "zero-sized buffer");
        assert!(contents.len() <= size as usize, "buffer contents exceed size");

        let (buffer, allocation) = Self::allocate_buffer_raw(
            &self.ctx,
            u64::from(size),
            vk::BufferUsageFlags::VERTEX_BUFFER
                | vk::BufferUsageFlags::INDEX_BUFFER
                | vk::BufferUsageFlags::UNIFORM_BUFFER
                | vk::BufferUsageFlags::STORAGE_BUFFER,
            MemoryLocation::CpuToGpu,
            "buffer",
        )?;

        if !contents.is_empty() {
            let mapped = allocation
                .mapped_ptr()
                .expect("CpuToGpu buffer is not mapped")
                .as_ptr() as *mut u8;
            unsafe {
                std::ptr::copy_nonoverlapping(contents.as_ptr(), mapped, contents.len());
            }
        }

        Ok(self.buffers.add(VulkanBuffer {
            buffer,
            allocation: Some(allocation),
            offset: 0,
            size,
            ephemeral_frame: None,
        }))
    }

    fn create_ephemeral_buffer(&mut self, size: u32, contents: &[u8]) -> Result<BufferHandle> {
        assert!(size > 0, "zero-sized buffer");
        assert!(contents.len() <= size as usize, "buffer contents exceed size");

        let offset = self.ring.allocate(size, self.min_buffer_align);
        if !contents.is_empty() {
            let mapped = self.ring_mapped_ptr();
            unsafe {
                std::ptr::copy_nonoverlapping(
                    contents.as_ptr(),
                    mapped.add(offset as usize),
                    contents.len(),
                );
            }
        }

        let handle = self.buffers.add(VulkanBuffer {
            buffer: self.ring_buffer,
            allocation: None,
            offset: u64::from(offset),
            size,
            ephemeral_frame: Some(self.frame_num),
        });
        self.ephemerals.push(handle);
        Ok(handle)
    }

    fn create_texture(&mut self, desc: &TextureDesc) -> Result<TextureHandle> {
        desc.validate();
        let format = desc.get_format();
        let vk_format = format_to_vk(format);
        let aspect = format_aspect(format);
        let num_mips = desc.get_num_mips();

        let (image, allocation) = self.allocate_image_raw(
            desc.get_width(),
            desc.get_height(),
            num_mips,
            vk_format,
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
            vk::ImageCreateFlags::empty(),
            desc.get_name(),
        )?;
        let view = self.create_view(image, vk_format, aspect, num_mips)?;

        // Pack all mip data into one staging buffer.
        let mut staging_size = 0u64;
        for level in 0..num_mips {
            staging_size += desc.get_mip_data(level).len() as u64;
        }

        if staging_size > 0 {
            let (staging, staging_allocation) = Self::allocate_buffer_raw(
                &self.ctx,
                staging_size,
                vk::BufferUsageFlags::TRANSFER_SRC,
                MemoryLocation::CpuToGpu,
                "texture staging",
            )?;
            let mapped = staging_allocation
                .mapped_ptr()
                .expect("staging buffer is not mapped")
                .as_ptr() as *mut u8;

            let mut regions = Vec::new();
            let mut staging_offset = 0u64;
            for level in 0..num_mips {
                let data = desc.get_mip_data(level);
                if data.is_empty() {
                    continue;
                }
                unsafe {
                    std::ptr::copy_nonoverlapping(
                        data.as_ptr(),
                        mapped.add(staging_offset as usize),
                        data.len(),
                    );
                }
                regions.push(
                    vk::BufferImageCopy::default()
                        .buffer_offset(staging_offset)
                        .image_subresource(vk::ImageSubresourceLayers {
                            aspect_mask: aspect,
                            mip_level: level,
                            base_array_layer: 0,
                            layer_count: 1,
                        })
                        .image_extent(vk::Extent3D {
                            width: (desc.get_width() >> level).max(1),
                            height: (desc.get_height() >> level).max(1),
                            depth: 1,
                        }),
                );
                staging_offset += data.len() as u64;
            }

            let device = self.ctx.device.clone();
            self.ctx.one_shot_submit(|cmd| {
                Self::transition_image(
                    &device,
                    cmd,
                    image,
                    aspect,
                    num_mips,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                );
                unsafe {
                    device.cmd_copy_buffer_to_image(
                        cmd,
                        staging,
                        image,
                        vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                        &regions,
                    );
                }
                Self::transition_image(
                    &device,
                    cmd,
                    image,
                    aspect,
                    num_mips,
                    vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            })?;

            unsafe {
                self.ctx.device.destroy_buffer(staging, None);
            }
            if let Ok(mut allocator) = self.ctx.allocator.lock() {
                allocator.free(staging_allocation).ok();
            }
        } else {
            // No data: still leave the image shader-readable.
            let device = self.ctx.device.clone();
            self.ctx.one_shot_submit(|cmd| {
                Self::transition_image(
                    &device,
                    cmd,
                    image,
                    aspect,
                    num_mips,
                    vk::ImageLayout::UNDEFINED,
                    vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
                );
            })?;
        }

        Ok(self.textures.add(VulkanTexture {
            image,
            view,
            allocation: Some(allocation),
            width: desc.get_width(),
            height: desc.get_height(),
            format,
            render_target_view: false,
        }))
    }

    fn create_sampler(&mut self, desc: &SamplerDesc) -> Result<SamplerHandle> {
        let wrap = wrap_to_vk(desc.get_wrap_mode());
        let info = vk::SamplerCreateInfo::default()
            .min_filter(filter_to_vk(desc.get_min_filter()))
            .mag_filter(filter_to_vk(desc.get_mag_filter()))
            .mipmap_mode(vk::SamplerMipmapMode::NEAREST)
            .address_mode_u(wrap)
            .address_mode_v(wrap)
            .address_mode_w(wrap)
            .max_lod(vk::LOD_CLAMP_NONE);
        let sampler = unsafe {
            self.ctx
                .device
                .create_sampler(&info, None)
                .map_err(|e| render_err!("nova::vulkan", "Failed to create sampler: {:?}", e))?
        };
        Ok(self.samplers.add(VulkanSampler { sampler }))
    }

    fn create_render_target(&mut self, desc: &RenderTargetDesc) -> Result<RenderTargetHandle> {
        desc.validate();
        let format = desc.get_format();
        let vk_format = format_to_vk(format);
        let aspect = format_aspect(format);

        // The attachment use comes from the format; the desc declares the rest.
        let attachment_usage = if format.has_depth() {
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT
        } else {
            vk::ImageUsageFlags::COLOR_ATTACHMENT
        };
        let usage = attachment_usage | texture_usage_to_vk(desc.get_usage());

        let additional_format = desc.get_additional_view_format();
        let flags = if additional_format != Format::Invalid {
            vk::ImageCreateFlags::MUTABLE_FORMAT
        } else {
            vk::ImageCreateFlags::empty()
        };

        let (image, allocation) = self.allocate_image_raw(
            desc.get_width(),
            desc.get_height(),
            1,
            vk_format,
            usage,
            flags,
            desc.get_name(),
        )?;
        let view = self.create_view(image, vk_format, aspect, 1)?;
        let additional_view = if additional_format != Format::Invalid {
            Some(self.create_view(image, format_to_vk(additional_format), aspect, 1)?)
        } else {
            None
        };

        let texture = self.textures.add(VulkanTexture {
            image,
            view,
            allocation: None,
            width: desc.get_width(),
            height: desc.get_height(),
            format,
            render_target_view: true,
        });

        Ok(self.render_targets.add(VulkanRenderTarget {
            image,
            view,
            additional_view,
            allocation: Some(allocation),
            width: desc.get_width(),
            height: desc.get_height(),
            format,
            usage: desc.get_usage(),
            texture,
            layout: vk::ImageLayout::UNDEFINED,
        }))
    }

    fn create_render_pass(&mut self, desc: &RenderPassDesc) -> Result<RenderPassHandle> {
        let color_count = desc.color_count();
        let final_color_layout = layout_to_vk(desc.get_color_final_layout());

        let mut attachments = Vec::new();
        let mut color_refs = Vec::new();
        let mut clear_values = Vec::new();
        let mut color_formats = Vec::with_capacity(color_count);

        for index in 0..color_count {
            let attachment = desc.get_color(index);
            color_formats.push(attachment.format());
            let load_op = load_op_to_vk(attachment.load_op());
            // A loaded attachment must arrive in the layout the previous
            // pass left it in; cleared/discarded content starts undefined.
            let initial_layout = if load_op == vk::AttachmentLoadOp::LOAD {
                final_color_layout
            } else {
                vk::ImageLayout::UNDEFINED
            };
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(format_to_vk(attachment.format()))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(load_op)
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(initial_layout)
                    .final_layout(final_color_layout),
            );
            color_refs.push(vk::AttachmentReference {
                attachment: index as u32,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            });
            clear_values.push(vk::ClearValue {
                color: vk::ClearColorValue {
                    float32: desc.get_clear_color(),
                },
            });
        }

        let mut depth_format = None;
        let depth_ref;
        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if desc.has_depth_stencil() {
            let attachment = desc.get_depth_stencil();
            depth_format = Some(attachment.format());
            attachments.push(
                vk::AttachmentDescription::default()
                    .format(format_to_vk(attachment.format()))
                    .samples(vk::SampleCountFlags::TYPE_1)
                    .load_op(load_op_to_vk(attachment.load_op()))
                    .store_op(vk::AttachmentStoreOp::STORE)
                    .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
                    .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
                    .initial_layout(vk::ImageLayout::UNDEFINED)
                    .final_layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL),
            );
            depth_ref = vk::AttachmentReference {
                attachment: color_count as u32,
                layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
            };
            subpass = subpass.depth_stencil_attachment(&depth_ref);
            clear_values.push(vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue {
                    depth: desc.get_clear_depth(),
                    stencil: 0,
                },
            });
        }

        let dependency = vk::SubpassDependency::default()
            .src_subpass(vk::SUBPASS_EXTERNAL)
            .dst_subpass(0)
            .src_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::FRAGMENT_SHADER,
            )
            .src_access_mask(vk::AccessFlags::empty())
            .dst_stage_mask(
                vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                    | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            )
            .dst_access_mask(
                vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                    | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            );

        let subpasses = [subpass];
        let dependencies = [dependency];
        let info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe {
            self.ctx.device.create_render_pass(&info, None).map_err(|e| {
                render_err!(
                    "nova::vulkan",
                    "Failed to create render pass '{}': {:?}",
                    desc.get_name(),
                    e
                )
            })?
        };

        Ok(self.render_passes.add(VulkanRenderPass {
            render_pass,
            clear_values,
            color_formats,
            depth_format,
            final_color_layout,
        }))
    }

    fn create_framebuffer(&mut self, desc: &FramebufferDesc) -> Result<FramebufferHandle> {
        desc.validate();
        let pass = self.render_passes.get(desc.get_render_pass());
        let pass_vk = pass.render_pass;
        let color_formats = pass.color_formats.clone();
        let depth_format = pass.depth_format;

        let mut views = Vec::new();
        let mut attachment_handles = Vec::new();
        let mut width = 0;
        let mut height = 0;

        for (index, expected) in color_formats.iter().enumerate() {
            let rt_handle = desc.get_color(index);
            assert!(
                rt_handle.is_valid(),
                "render pass declares color attachment {} but framebuffer leaves it unbound",
                index
            );
            let rt = self.render_targets.get(rt_handle);
            assert_eq!(
                rt.format, *expected,
                "framebuffer attachment format does not match render pass"
            );
            if width == 0 {
                width = rt.width;
                height = rt.height;
            } else {
                assert!(
                    rt.width == width && rt.height == height,
                    "framebuffer attachments must share one size"
                );
            }
            views.push(rt.view);
            attachment_handles.push(rt_handle);
        }
        if let Some(expected) = depth_format {
            let ds_handle = desc.get_depth_stencil();
            assert!(
                ds_handle.is_valid(),
                "render pass declares depth but framebuffer leaves it unbound"
            );
            let rt = self.render_targets.get(ds_handle);
            assert_eq!(
                rt.format, expected,
                "framebuffer attachment format does not match render pass"
            );
            if width == 0 {
                width = rt.width;
                height = rt.height;
            } else {
                assert!(
                    rt.width == width && rt.height == height,
                    "framebuffer attachments must share one size"
                );
            }
            views.push(rt.view);
            attachment_handles.push(ds_handle);
        }

        let info = vk::FramebufferCreateInfo::default()
            .render_pass(pass_vk)
            .attachments(&views)
            .width(width)
            .height(height)
            .layers(1);
        let framebuffer = unsafe {
            self.ctx.device.create_framebuffer(&info, None).map_err(|e| {
                render_err!(
                    "nova::vulkan",
                    "Failed to create framebuffer '{}': {:?}",
                    desc.get_name(),
                    e
                )
            })?
        };

        Ok(self.framebuffers.add(VulkanFramebuffer {
            framebuffer,
            render_pass: desc.get_render_pass(),
            width,
            height,
            attachments: attachment_handles,
        }))
    }

    fn create_pipeline(&mut self, desc: &PipelineDesc) -> Result<PipelineHandle> {
        desc.validate();
        let vertex_module = self.vertex_shaders.get(desc.get_vertex_shader()).module;
        let fragment_module = self.fragment_shaders.get(desc.get_fragment_shader()).module;
        let pass = self.render_passes.get(desc.get_render_pass());
        let pass_vk = pass.render_pass;
        let color_count = pass.color_formats.len();

        let stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::VERTEX)
                .module(vertex_module)
                .name(c"main"),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(vk::ShaderStageFlags::FRAGMENT)
                .module(fragment_module)
                .name(c"main"),
        ];

        // Vertex input from the declared attribute mask
        let mut attribute_descs = Vec::new();
        let mut used_bindings = [false; MAX_VERTEX_BUFFERS];
        let mask = desc.get_vertex_attrib_mask();
        for attrib in 0..32u32 {
            if mask & (1 << attrib) == 0 {
                continue;
            }
            let attr = desc.get_vertex_attrib(attrib);
            attribute_descs.push(
                vk::VertexInputAttributeDescription::default()
                    .location(attrib)
                    .binding(u32::from(attr.buf_binding))
                    .format(vertex_format_to_vk(attr.format, attr.count))
                    .offset(u32::from(attr.offset)),
            );
            used_bindings[attr.buf_binding as usize] = true;
        }
        let mut binding_descs = Vec::new();
        for (binding, used) in used_bindings.iter().enumerate() {
            if !used {
                continue;
            }
            let stride = desc.get_vertex_buffer_stride(binding as u8);
            assert!(stride > 0, "vertex buffer binding {} has no stride", binding);
            binding_descs.push(
                vk::VertexInputBindingDescription::default()
                    .binding(binding as u32)
                    .stride(stride)
                    .input_rate(vk::VertexInputRate::VERTEX),
            );
        }
        let vertex_input = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&binding_descs)
            .vertex_attribute_descriptions(&attribute_descs);

        let input_assembly = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(vk::PrimitiveTopology::TRIANGLE_LIST);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization = vk::PipelineRasterizationStateCreateInfo::default()
            .polygon_mode(vk::PolygonMode::FILL)
            .cull_mode(if desc.get_cull_faces() {
                vk::CullModeFlags::BACK
            } else {
                vk::CullModeFlags::NONE
            })
            .front_face(vk::FrontFace::COUNTER_CLOCKWISE)
            .line_width(1.0);

        let multisample = vk::PipelineMultisampleStateCreateInfo::default()
            .rasterization_samples(vk::SampleCountFlags::TYPE_1);

        let depth_stencil = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.get_depth_test())
            .depth_write_enable(desc.get_depth_write())
            .depth_compare_op(vk::CompareOp::LESS_OR_EQUAL);

        let blend_attachment = if desc.get_blending() {
            vk::PipelineColorBlendAttachmentState::default()
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .alpha_blend_op(vk::BlendOp::ADD)
                .color_write_mask(vk::ColorComponentFlags::RGBA)
        } else {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
        };
        let blend_attachments = vec![blend_attachment; color_count];
        let color_blend =
            vk::PipelineColorBlendStateCreateInfo::default().attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state =
            vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        // Pipeline layout from the desc's contiguous descriptor set layouts
        let mut set_layouts = Vec::new();
        for index in 0..MAX_DESCRIPTOR_SETS {
            let handle = desc.get_descriptor_set_layout(index);
            if !handle.is_valid() {
                break;
            }
            set_layouts.push(self.ds_layouts.get(handle).layout);
        }
        let layout_info = vk::PipelineLayoutCreateInfo::default().set_layouts(&set_layouts);
        let layout = unsafe {
            self.ctx
                .device
                .create_pipeline_layout(&layout_info, None)
                .map_err(|e| {
                    render_err!(
                        "nova::vulkan",
                        "Failed to create pipeline layout '{}': {:?}",
                        desc.get_name(),
                        e
                    )
                })?
        };

        let info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&stages)
            .vertex_input_state(&vertex_input)
            .input_assembly_state(&input_assembly)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization)
            .multisample_state(&multisample)
            .depth_stencil_state(&depth_stencil)
            .color_blend_state(&color_blend)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(pass_vk)
            .subpass(0);

        let pipeline = unsafe {
            self.ctx
                .device
                .create_graphics_pipelines(vk::PipelineCache::null(), &[info], None)
                .map_err(|(_, e)| {
                    self.ctx.device.destroy_pipeline_layout(layout, None);
                    render_err!(
                        "nova::vulkan",
                        "Failed to create pipeline '{}': {:?}",
                        desc.get_name(),
                        e
                    )
                })?[0]
        };

        render_debug!("nova::vulkan", "Created pipeline '{}'", desc.get_name());
        Ok(self.pipelines.add(VulkanPipeline { pipeline, layout }))
    }

    fn create_vertex_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<VertexShaderHandle> {
        let module = self.load_shader_module(name, ShaderStage::Vertex, macros)?;
        Ok(self.vertex_shaders.add(VulkanShader { module }))
    }

    fn create_fragment_shader(
        &mut self,
        name: &str,
        macros: &ShaderMacros,
    ) -> Result<FragmentShaderHandle> {
        let module = self.load_shader_module(name, ShaderStage::Fragment, macros)?;
        Ok(self.fragment_shaders.add(VulkanShader { module }))
    }

    fn create_descriptor_set_layout(
        &mut self,
        entries: &[DescriptorLayoutEntry],
    ) -> Result<DSLayoutHandle> {
        validate_layout(entries);
        let bindings: Vec<vk::DescriptorSetLayoutBinding> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                vk::DescriptorSetLayoutBinding::default()
                    .binding(index as u32)
                    .descriptor_type(descriptor_type_to_vk(entry.descriptor_type))
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::ALL_GRAPHICS)
            })
            .collect();

        let info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
        let layout = unsafe {
            self.ctx
                .device
                .create_descriptor_set_layout(&info, None)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to create descriptor set layout: {:?}", e)
                })?
        };

        Ok(self.ds_layouts.add(VulkanDSLayout {
            layout,
            entries: entries.to_vec(),
        }))
    }

    fn render_target_texture(&self, handle: RenderTargetHandle) -> TextureHandle {
        let rt = self.render_targets.get(handle);
        assert!(
            rt.usage.contains(TextureUsage::SAMPLED),
            "render target was not created with sampled usage"
        );
        rt.texture
    }

    fn delete_buffer(&mut self, handle: BufferHandle) {
        assert!(
            self.buffers.get(handle).ephemeral_frame.is_none(),
            "ephemeral buffers are freed at present, not deleted"
        );
        self.buffers.remove(handle).destroy(&self.ctx);
    }

    fn delete_texture(&mut self, handle: TextureHandle) {
        assert!(
            !self.textures.get(handle).render_target_view,
            "render target textures are retired by delete_render_target"
        );
        self.textures.remove(handle).destroy(&self.ctx);
    }

    fn delete_sampler(&mut self, handle: SamplerHandle) {
        self.samplers.remove(handle).destroy(&self.ctx);
    }

    fn delete_render_target(&mut self, handle: RenderTargetHandle) {
        let rt = self.render_targets.remove(handle);
        self.textures.remove(rt.texture).destroy(&self.ctx);
        rt.destroy(&self.ctx);
    }

    fn delete_render_pass(&mut self, handle: RenderPassHandle) {
        self.render_passes.remove(handle).destroy(&self.ctx);
    }

    fn delete_framebuffer(&mut self, handle: FramebufferHandle) {
        self.framebuffers.remove(handle).destroy(&self.ctx);
    }

    fn delete_pipeline(&mut self, handle: PipelineHandle) {
        self.pipelines.remove(handle).destroy(&self.ctx);
    }

    fn delete_vertex_shader(&mut self, handle: VertexShaderHandle) {
        self.vertex_shaders.remove(handle).destroy(&self.ctx);
    }

    fn delete_fragment_shader(&mut self, handle: FragmentShaderHandle) {
        self.fragment_shaders.remove(handle).destroy(&self.ctx);
    }

    fn delete_descriptor_set_layout(&mut self, handle: DSLayoutHandle) {
        self.ds_layouts.remove(handle).destroy(&self.ctx);
    }

    fn set_swapchain_desc(&mut self, desc: &SwapchainDesc) -> Result<()> {
        self.wait_idle();
        self.swapchain
            .recreate(self.physical_device, &self.ctx.device, desc)?;
        self.swapchain_desc = *desc;
        Ok(())
    }

    fn begin_frame(&mut self) -> Result<()> {
        unsafe {
            self.ctx
                .device
                .reset_command_buffer(
                    self.frame_command_buffer,
                    vk::CommandBufferResetFlags::empty(),
                )
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to reset frame command buffer: {:?}", e)
                })?;
            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx
                .device
                .begin_command_buffer(self.frame_command_buffer, &begin_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to begin frame command buffer: {:?}", e)
                })?;
        }
        Ok(())
    }

    fn present_frame(&mut self, render_target: RenderTargetHandle) -> Result<()> {
        let cmd = self.frame_command_buffer;
        let device = self.ctx.device.clone();

        let acquire_result = self.swapchain.acquire();
        let image_index = match acquire_result {
            Ok(index) => index,
            Err(e) => {
                // No image this frame; drop the recorded work but still run
                // end-of-frame reclamation so the facade's frame advance
                // stays consistent.
                unsafe {
                    device.end_command_buffer(cmd).ok();
                }
                self.end_of_frame();
                return Err(e);
            }
        };

        let (rt_image, rt_layout, rt_width, rt_height, rt_aspect) = {
            let rt = self.render_targets.get(render_target);
            assert!(
                !rt.format.has_depth(),
                "cannot present a depth render target"
            );
            assert!(
                rt.usage.contains(TextureUsage::TRANSFER_SRC),
                "render target was not created with transfer-src usage"
            );
            (rt.image, rt.layout, rt.width, rt.height, format_aspect(rt.format))
        };

        let swapchain_image = self.swapchain.image(image_index);
        let extent = self.swapchain.extent();

        unsafe {
            if rt_layout != vk::ImageLayout::TRANSFER_SRC_OPTIMAL {
                Self::transition_image(
                    &device,
                    cmd,
                    rt_image,
                    rt_aspect,
                    1,
                    rt_layout,
                    vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                );
            }
            Self::transition_image(
                &device,
                cmd,
                swapchain_image,
                vk::ImageAspectFlags::COLOR,
                1,
                vk::ImageLayout::UNDEFINED,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
            );

            let blit = vk::ImageBlit::default()
                .src_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .src_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: rt_width as i32,
                        y: rt_height as i32,
                        z: 1,
                    },
                ])
                .dst_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .dst_offsets([
                    vk::Offset3D { x: 0, y: 0, z: 0 },
                    vk::Offset3D {
                        x: extent.width as i32,
                        y: extent.height as i32,
                        z: 1,
                    },
                ]);
            let filter = if rt_width == extent.width && rt_height == extent.height {
                vk::Filter::NEAREST
            } else {
                vk::Filter::LINEAR
            };
            device.cmd_blit_image(
                cmd,
                rt_image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                swapchain_image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[blit],
                filter,
            );

            Self::transition_image(
                &device,
                cmd,
                swapchain_image,
                vk::ImageAspectFlags::COLOR,
                1,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                vk::ImageLayout::PRESENT_SRC_KHR,
            );

            device.end_command_buffer(cmd).map_err(|e| {
                render_err!("nova::vulkan", "Failed to end frame command buffer: {:?}", e)
            })?;
        }
        self.render_targets.get_mut(render_target).layout =
            vk::ImageLayout::TRANSFER_SRC_OPTIMAL;

        // Submit, waiting on acquire and signaling present
        let wait_semaphores = [self.swapchain.acquire_semaphore()];
        let wait_stages = [vk::PipelineStageFlags::TRANSFER];
        let signal_semaphores = [self.swapchain.render_finished_semaphore(image_index)];
        let command_buffers = [cmd];
        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let submit_result = unsafe {
            device.queue_submit(self.ctx.graphics_queue, &[submit_info], self.frame_fence)
        };
        if let Err(e) = submit_result {
            self.end_of_frame();
            return Err(match e {
                vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
                other => render_err!("nova::vulkan", "Frame submission failed: {:?}", other),
            });
        }

        let present_result = self.swapchain.present(self.ctx.graphics_queue, image_index);

        // The fence wait is what makes resetting the ring and descriptor
        // pool safe.
        unsafe {
            if let Err(e) = device.wait_for_fences(&[self.frame_fence], true, u64::MAX) {
                render_error!("nova::vulkan", "Failed to wait for frame fence: {:?}", e);
            }
            device.reset_fences(&[self.frame_fence]).ok();
        }

        self.end_of_frame();
        present_result
    }

    fn begin_render_pass(&mut self, render_pass: RenderPassHandle, framebuffer: FramebufferHandle) {
        let fb = self.framebuffers.get(framebuffer);
        assert_eq!(
            fb.render_pass, render_pass,
            "framebuffer was created against a different render pass"
        );
        let pass = self.render_passes.get(render_pass);

        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(pass.render_pass)
            .framebuffer(fb.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: fb.width,
                    height: fb.height,
                },
            })
            .clear_values(&pass.clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.frame_command_buffer,
                &begin_info,
                vk::SubpassContents::INLINE,
            );
        }

        // Track the layouts the pass will leave the attachments in.
        let final_color_layout = pass.final_color_layout;
        let attachments = fb.attachments.clone();
        for handle in attachments {
            let rt = self.render_targets.get_mut(handle);
            rt.layout = if rt.format.has_depth() {
                vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL
            } else {
                final_color_layout
            };
        }
    }

    fn end_render_pass(&mut self) {
        unsafe {
            self.ctx.device.cmd_end_render_pass(self.frame_command_buffer);
        }
    }

    fn set_viewport(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let viewport = vk::Viewport {
            x: x as f32,
            y: y as f32,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        };
        unsafe {
            self.ctx
                .device
                .cmd_set_viewport(self.frame_command_buffer, 0, &[viewport]);
        }
    }

    fn set_scissor_rect(&mut self, x: u32, y: u32, width: u32, height: u32) {
        let scissor = vk::Rect2D {
            offset: vk::Offset2D {
                x: x as i32,
                y: y as i32,
            },
            extent: vk::Extent2D { width, height },
        };
        unsafe {
            self.ctx
                .device
                .cmd_set_scissor(self.frame_command_buffer, 0, &[scissor]);
        }
    }

    fn bind_pipeline(&mut self, pipeline: PipelineHandle) {
        let record = self.pipelines.get(pipeline);
        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.frame_command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                record.pipeline,
            );
        }
        self.current_pipeline = pipeline;
    }

    fn bind_index_buffer(&mut self, buffer: BufferHandle, bit16: bool) {
        let record = self.buffers.get(buffer);
        if let Some(frame) = record.ephemeral_frame {
            assert_eq!(
                frame, self.frame_num,
                "ephemeral buffer used outside the frame that created it"
            );
        }
        let index_type = if bit16 {
            vk::IndexType::UINT16
        } else {
            vk::IndexType::UINT32
        };
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.frame_command_buffer,
                record.buffer,
                record.offset,
                index_type,
            );
        }
    }

    fn bind_vertex_buffer(&mut self, binding: u32, buffer: BufferHandle) {
        let record = self.buffers.get(buffer);
        if let Some(frame) = record.ephemeral_frame {
            assert_eq!(
                frame, self.frame_num,
                "ephemeral buffer used outside the frame that created it"
            );
        }
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(
                self.frame_command_buffer,
                binding,
                &[record.buffer],
                &[record.offset],
            );
        }
    }

    fn bind_descriptor_set(
        &mut self,
        index: u32,
        layout: DSLayoutHandle,
        data: &[u8],
    ) -> Result<()> {
        assert!(
            self.current_pipeline.is_valid(),
            "bind_descriptor_set with no pipeline bound"
        );
        let layout_record = self.ds_layouts.get(layout);
        let vk_layout = layout_record.layout;
        let entries = layout_record.entries.clone();
        let pipeline_layout = self.pipelines.get(self.current_pipeline).layout;

        let set_layouts = [vk_layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(self.frame_descriptor_pool)
            .set_layouts(&set_layouts);
        let set = unsafe {
            self.ctx
                .device
                .allocate_descriptor_sets(&alloc_info)
                .map_err(|e| {
                    render_err!("nova::vulkan", "Failed to allocate descriptor set: {:?}", e)
                })?[0]
        };

        // Infos must stay stable while the writes borrow them.
        let mut buffer_infos = Vec::with_capacity(entries.len());
        let mut image_infos = Vec::with_capacity(entries.len());
        // (binding index, descriptor type, info index, is_buffer)
        let mut slots = Vec::with_capacity(entries.len());

        for (binding, entry) in entries.iter().enumerate() {
            match read_binding(entry, data) {
                BoundResource::UniformBuffer(h) | BoundResource::StorageBuffer(h) => {
                    if !self.buffers.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set buffer"));
                    }
                    let record = self.buffers.get(h);
                    if let Some(frame) = record.ephemeral_frame {
                        assert_eq!(
                            frame, self.frame_num,
                            "ephemeral buffer used outside the frame that created it"
                        );
                    }
                    buffer_infos.push(
                        vk::DescriptorBufferInfo::default()
                            .buffer(record.buffer)
                            .offset(record.offset)
                            .range(u64::from(record.size)),
                    );
                    slots.push((binding as u32, entry.descriptor_type, buffer_infos.len() - 1, true));
                }
                BoundResource::Sampler(h) => {
                    if !self.samplers.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set sampler"));
                    }
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .sampler(self.samplers.get(h).sampler),
                    );
                    slots.push((binding as u32, entry.descriptor_type, image_infos.len() - 1, false));
                }
                BoundResource::Texture(h) => {
                    if !self.textures.contains(h) {
                        return Err(Error::InvalidHandle("descriptor set texture"));
                    }
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .image_view(self.textures.get(h).view)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    );
                    slots.push((binding as u32, entry.descriptor_type, image_infos.len() - 1, false));
                }
                BoundResource::CombinedSampler(cs) => {
                    if !self.textures.contains(cs.tex) || !self.samplers.contains(cs.sampler) {
                        return Err(Error::InvalidHandle("descriptor set combined sampler"));
                    }
                    image_infos.push(
                        vk::DescriptorImageInfo::default()
                            .sampler(self.samplers.get(cs.sampler).sampler)
                            .image_view(self.textures.get(cs.tex).view)
                            .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL),
                    );
                    slots.push((binding as u32, entry.descriptor_type, image_infos.len() - 1, false));
                }
            }
        }

        let writes: Vec<vk::WriteDescriptorSet> = slots
            .iter()
            .map(|&(binding, descriptor_type, info_index, is_buffer)| {
                let write = vk::WriteDescriptorSet::default()
                    .dst_set(set)
                    .dst_binding(binding)
                    .descriptor_type(descriptor_type_to_vk(descriptor_type));
                if is_buffer {
                    write.buffer_info(&buffer_infos[info_index..info_index + 1])
                } else {
                    write.image_info(&image_infos[info_index..info_index + 1])
                }
            })
            .collect();

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
            self.ctx.device.cmd_bind_descriptor_sets(
                self.frame_command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                pipeline_layout,
                index,
                &[set],
                &[],
            );
        }
        Ok(())
    }

    fn draw(&mut self, first_vertex: u32, vertex_count: u32) {
        assert!(vertex_count > 0, "draw with zero vertices");
        unsafe {
            self.ctx
                .device
                .cmd_draw(self.frame_command_buffer, vertex_count, 1, first_vertex, 0);
        }
    }

    fn draw_indexed_instanced(&mut self, index_count: u32, instance_count: u32) {
        assert!(index_count > 0, "draw with zero indices");
        assert!(instance_count > 0, "draw with zero instances");
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.frame_command_buffer,
                index_count,
                instance_count,
                0,
                0,
                0,
            );
        }
    }

    fn draw_indexed_offset(&mut self, index_count: u32, first_index: u32) {
        assert!(index_count > 0, "draw with zero indices");
        unsafe {
            self.ctx.device.cmd_draw_indexed(
                self.frame_command_buffer,
                index_count,
                1,
                first_index,
                0,
                0,
            );
        }
    }

    fn wait_idle(&mut self) {
        unsafe {
            if let Err(e) = self.ctx.device.device_wait_idle() {
                render_error!("nova::vulkan", "device_wait_idle failed: {:?}", e);
            }
        }
    }
}

impl Drop for VulkanBackend {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.device_wait_idle().ok();

            // Resources before allocator, allocator before device.
            let ctx = &self.ctx;
            self.buffers.clear_with(|b| b.destroy(ctx));
            self.textures.clear_with(|t| t.destroy(ctx));
            self.samplers.clear_with(|s| s.destroy(ctx));
            self.render_targets.clear_with(|rt| rt.destroy(ctx));
            self.render_passes.clear_with(|rp| rp.destroy(ctx));
            self.framebuffers.clear_with(|fb| fb.destroy(ctx));
            self.pipelines.clear_with(|p| p.destroy(ctx));
            self.vertex_shaders.clear_with(|s| s.destroy(ctx));
            self.fragment_shaders.clear_with(|s| s.destroy(ctx));
            self.ds_layouts.clear_with(|l| l.destroy(ctx));

            self.ctx.device.destroy_buffer(self.ring_buffer, None);
            if let Some(allocation) = self.ring_allocation.take() {
                if let Ok(mut allocator) = self.ctx.allocator.lock() {
                    allocator.free(allocation).ok();
                }
            }

            self.ctx
                .device
                .destroy_descriptor_pool(self.frame_descriptor_pool, None);
            self.ctx.device.destroy_fence(self.frame_fence, None);
            self.ctx
                .device
                .destroy_command_pool(self.frame_command_pool, None);
            self.ctx
                .device
                .destroy_command_pool(self.ctx.upload_command_pool, None);

            self.swapchain.destroy(&self.ctx.device);

            std::mem::ManuallyDrop::drop(&mut self.ctx.allocator);
            self.ctx.device.destroy_device(None);

            if let Some((loader, messenger)) = self.debug_utils.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}
