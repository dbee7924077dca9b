//! Vulkan swapchain management
//!
//! Owns the surface, the presentable-image chain, and the per-frame
//! acquire/present synchronization. The backend blits the application's
//! render target into the acquired image, so no image views or
//! framebuffers are created for swapchain images.

use ash::vk;

use nova_renderer::renderer::SwapchainDesc;
use nova_renderer::{render_debug, render_err, Error, Result};

use crate::vulkan_format::vsync_to_vk;

pub struct Swapchain {
    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,
    swapchain_loader: ash::khr::swapchain::Device,
    swapchain: vk::SwapchainKHR,
    images: Vec<vk::Image>,
    format: vk::Format,
    extent: vk::Extent2D,

    /// Signaled by acquire, waited on by the frame submit. One is enough:
    /// the frame fence serializes frames before the next acquire.
    image_available_semaphore: vk::Semaphore,
    /// One per swapchain image, signaled by submit, waited on by present
    render_finished_semaphores: Vec<vk::Semaphore>,
}

impl Swapchain {
    pub fn new(
        physical_device: vk::PhysicalDevice,
        device: &ash::Device,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        swapchain_loader: ash::khr::swapchain::Device,
        desc: &SwapchainDesc,
    ) -> Result<Self> {
        let mut swapchain = Self {
            surface,
            surface_loader,
            swapchain_loader,
            swapchain: vk::SwapchainKHR::null(),
            images: Vec::new(),
            format: vk::Format::UNDEFINED,
            extent: vk::Extent2D::default(),
            image_available_semaphore: vk::Semaphore::null(),
            render_finished_semaphores: Vec::new(),
        };
        swapchain.recreate(physical_device, device, desc)?;

        let semaphore_info = vk::SemaphoreCreateInfo::default();
        swapchain.image_available_semaphore = unsafe {
            device.create_semaphore(&semaphore_info, None).map_err(|e| {
                render_err!("nova::vulkan", "Failed to create acquire semaphore: {:?}", e)
            })?
        };
        Ok(swapchain)
    }

    /// Destroy and rebuild the chain per `desc`. Per-image semaphores are
    /// rebuilt too since the image count may change.
    pub fn recreate(
        &mut self,
        physical_device: vk::PhysicalDevice,
        device: &ash::Device,
        desc: &SwapchainDesc,
    ) -> Result<()> {
        unsafe {
            let capabilities = self
                .surface_loader
                .get_physical_device_surface_capabilities(physical_device, self.surface)
                .map_err(|e| map_surface_error(e, "query surface capabilities"))?;

            let formats = self
                .surface_loader
                .get_physical_device_surface_formats(physical_device, self.surface)
                .map_err(|e| map_surface_error(e, "query surface formats"))?;
            let surface_format = formats
                .iter()
                .find(|f| {
                    f.format == vk::Format::B8G8R8A8_SRGB || f.format == vk::Format::R8G8B8A8_SRGB
                })
                .unwrap_or(&formats[0]);

            let present_modes = self
                .surface_loader
                .get_physical_device_surface_present_modes(physical_device, self.surface)
                .map_err(|e| map_surface_error(e, "query present modes"))?;
            let preferred = vsync_to_vk(desc.vsync);
            // FIFO is the only mode Vulkan guarantees.
            let present_mode = if present_modes.contains(&preferred) {
                preferred
            } else {
                vk::PresentModeKHR::FIFO
            };

            let extent = if capabilities.current_extent.width != u32::MAX {
                capabilities.current_extent
            } else {
                vk::Extent2D {
                    width: desc.width.clamp(
                        capabilities.min_image_extent.width,
                        capabilities.max_image_extent.width,
                    ),
                    height: desc.height.clamp(
                        capabilities.min_image_extent.height,
                        capabilities.max_image_extent.height,
                    ),
                }
            };

            let mut image_count = desc.num_frames.max(capabilities.min_image_count);
            if capabilities.max_image_count > 0 {
                image_count = image_count.min(capabilities.max_image_count);
            }

            let old_swapchain = self.swapchain;
            let create_info = vk::SwapchainCreateInfoKHR::default()
                .surface(self.surface)
                .min_image_count(image_count)
                .image_format(surface_format.format)
                .image_color_space(surface_format.color_space)
                .image_extent(extent)
                .image_array_layers(1)
                .image_usage(vk::ImageUsageFlags::TRANSFER_DST)
                .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
                .pre_transform(capabilities.current_transform)
                .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
                .present_mode(present_mode)
                .old_swapchain(old_swapchain);

            let swapchain = self
                .swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| map_surface_error(e, "create swapchain"))?;

            if old_swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(old_swapchain, None);
            }
            for semaphore in self.render_finished_semaphores.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }

            self.images = self
                .swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| map_surface_error(e, "get swapchain images"))?;

            let semaphore_info = vk::SemaphoreCreateInfo::default();
            for _ in 0..self.images.len() {
                self.render_finished_semaphores.push(
                    device.create_semaphore(&semaphore_info, None).map_err(|e| {
                        render_err!("nova::vulkan", "Failed to create present semaphore: {:?}", e)
                    })?,
                );
            }

            self.swapchain = swapchain;
            self.format = surface_format.format;
            self.extent = extent;

            render_debug!(
                "nova::vulkan",
                "Swapchain: {}x{}, {} images, {:?}, {:?}",
                extent.width,
                extent.height,
                self.images.len(),
                surface_format.format,
                present_mode
            );
            Ok(())
        }
    }

    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }

    pub fn image(&self, index: u32) -> vk::Image {
        self.images[index as usize]
    }

    pub fn acquire_semaphore(&self) -> vk::Semaphore {
        self.image_available_semaphore
    }

    pub fn render_finished_semaphore(&self, image_index: u32) -> vk::Semaphore {
        self.render_finished_semaphores[image_index as usize]
    }

    /// Acquire the next presentable image, signaling the acquire semaphore
    pub fn acquire(&mut self) -> Result<u32> {
        unsafe {
            let (image_index, _suboptimal) = self
                .swapchain_loader
                .acquire_next_image(
                    self.swapchain,
                    u64::MAX,
                    self.image_available_semaphore,
                    vk::Fence::null(),
                )
                .map_err(|e| map_surface_error(e, "acquire swapchain image"))?;
            Ok(image_index)
        }
    }

    /// Queue the presentation of `image_index`, waiting on its
    /// render-finished semaphore
    pub fn present(&self, queue: vk::Queue, image_index: u32) -> Result<()> {
        let wait_semaphores = [self.render_finished_semaphores[image_index as usize]];
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        unsafe {
            match self.swapchain_loader.queue_present(queue, &present_info) {
                Ok(_) | Err(vk::Result::SUBOPTIMAL_KHR) => Ok(()),
                Err(e) => Err(map_surface_error(e, "present swapchain image")),
            }
        }
    }

    /// Destroy the chain, semaphores, and surface. The caller has already
    /// waited for device idle.
    pub fn destroy(&mut self, device: &ash::Device) {
        unsafe {
            for semaphore in self.render_finished_semaphores.drain(..) {
                device.destroy_semaphore(semaphore, None);
            }
            if self.image_available_semaphore != vk::Semaphore::null() {
                device.destroy_semaphore(self.image_available_semaphore, None);
            }
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}

/// Map a Vulkan surface/swapchain error onto the renderer's error taxonomy
fn map_surface_error(e: vk::Result, what: &str) -> Error {
    match e {
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SwapchainOutOfDate,
        vk::Result::ERROR_SURFACE_LOST_KHR => Error::SurfaceLost,
        vk::Result::ERROR_DEVICE_LOST => Error::DeviceLost,
        vk::Result::ERROR_OUT_OF_DEVICE_MEMORY | vk::Result::ERROR_OUT_OF_HOST_MEMORY => {
            Error::OutOfMemory
        }
        other => render_err!("nova::vulkan", "Failed to {}: {:?}", what, other),
    }
}
