/*!
# Nova Renderer

Backend-agnostic GPU rendering core.

This crate provides the platform-agnostic API for describing render state,
resources, and draw commands once and executing them against different
underlying graphics devices through one interface. Backend implementations
(Vulkan, OpenGL) live in their own crates and plug in through the
[`RenderBackend`](renderer::RenderBackend) trait.

## Architecture

- **Handle / ResourceContainer**: arena-plus-index resource lifetime; a
  handle is a typed 32-bit id, never a pointer.
- **Desc builders**: validated, chained-setter construction parameters for
  every resource type.
- **RingBufferAllocator**: cursor-based transient pool backing ephemeral
  per-frame buffers.
- **FrameContext**: explicit frame/render-pass state machine enforcing
  legal call ordering.
- **Renderer**: the single public facade composing all of the above over a
  boxed backend.
- **NullBackend**: a CPU-only backend so the whole call surface is testable
  without a GPU.
*/

mod error;
pub mod log;
pub mod renderer;

pub use error::{Error, Result};
