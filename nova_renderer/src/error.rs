//! Error types for the Nova renderer core.
//!
//! Only recoverable conditions are expressed as errors. Caller contract
//! violations (invalid handles, out-of-order frame calls, zero-sized
//! resources) fail fast with a panic instead — continuing past one of those
//! risks corrupting GPU state that no backend will validate for us.

use std::fmt;

/// Result type for renderer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Renderer errors
#[derive(Debug, Clone)]
pub enum Error {
    /// Backend-specific error (Vulkan, OpenGL, etc.)
    BackendError(String),

    /// Out of GPU memory
    OutOfMemory,

    /// Shader compilation or module creation failed
    ShaderCompileFailed {
        /// Logical shader name passed to the loader
        name: String,
        /// Compiler/driver log, if any
        log: String,
    },

    /// A handle referenced by a binding does not name a live resource
    InvalidHandle(&'static str),

    /// Initialization failed (instance, device, subsystems)
    InitializationFailed(String),

    /// No swapchain image is acquirable; the caller should recreate the
    /// swapchain and retry the frame
    SwapchainOutOfDate,

    /// The presentation surface is gone (window destroyed, display change)
    SurfaceLost,

    /// The device itself was lost; full device recreation is required
    DeviceLost,
}

impl Error {
    /// Environment errors require device/surface recreation rather than a
    /// plain swapchain rebuild or an allocation retry.
    pub fn is_environment(&self) -> bool {
        matches!(self, Error::SurfaceLost | Error::DeviceLost)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::ShaderCompileFailed { name, log } => {
                write!(f, "Shader '{}' failed to compile: {}", name, log)
            }
            Error::InvalidHandle(what) => write!(f, "Invalid handle: {}", what),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::SwapchainOutOfDate => write!(f, "Swapchain out of date"),
            Error::SurfaceLost => write!(f, "Presentation surface lost"),
            Error::DeviceLost => write!(f, "Device lost"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
