/*!
# Nova Renderer - Vulkan Backend

Vulkan implementation of the Nova rendering core.

This crate provides an explicit-API backend implementing the
[`RenderBackend`](nova_renderer::renderer::RenderBackend) trait using the
Ash library for Vulkan bindings and gpu-allocator for memory management.
Command buffers are recorded per frame; uploads are staged through a
persistently-mapped ring buffer and one-shot submissions; presentation
blits the application's render target into the swapchain image.
*/

mod vulkan_backend;
mod vulkan_context;
mod vulkan_debug;
mod vulkan_format;
mod vulkan_resources;
mod vulkan_swapchain;

pub use vulkan_backend::VulkanBackend;
