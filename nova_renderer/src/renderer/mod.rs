//! Renderer module - all rendering-related types and traits

pub mod handle;
pub mod container;
pub mod ring_buffer;
pub mod format;
pub mod texture;
pub mod sampler;
pub mod render_target;
pub mod render_pass;
pub mod framebuffer;
pub mod pipeline;
pub mod descriptor;
pub mod shader;
pub mod swapchain;
pub mod device;
pub mod frame;
pub mod renderer;
pub mod null;

pub use handle::*;
pub use container::ResourceContainer;
pub use ring_buffer::RingBufferAllocator;
pub use format::*;
pub use texture::*;
pub use sampler::*;
pub use render_target::*;
pub use render_pass::*;
pub use framebuffer::*;
pub use pipeline::*;
pub use descriptor::*;
pub use shader::*;
pub use swapchain::*;
pub use device::*;
pub use frame::{FrameContext, FrameState};
pub use renderer::Renderer;
pub use null::NullBackend;
