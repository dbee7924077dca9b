//! OpenGL backend for nova_renderer
//!
//! Immediate-mode implementation of the `RenderBackend` trait over a glow
//! context. The windowing layer creates the GL context and hands it in
//! along with a buffer-swap callback; this crate never touches the window
//! itself. The driver manages all synchronization, so unlike the Vulkan
//! backend there are no fences, semaphores, or layout transitions here.

mod gl_backend;
mod gl_format;

pub use gl_backend::GlBackend;
