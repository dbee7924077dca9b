//! Shader loading seam
//!
//! Shader source loading and preprocessing is an external collaborator:
//! the renderer asks the loader for a logical shader name plus macro
//! definitions and receives backend-consumable bytes (SPIR-V words for the
//! Vulkan backend, GLSL source text for the GL backend). The loader's file
//! format and macro substitution syntax are its own business.

use rustc_hash::FxHashMap;

use crate::error::Result;

/// Macro definitions passed to the shader loader
pub type ShaderMacros = FxHashMap<String, String>;

/// Shader pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Collaborator that resolves a logical shader name into compiled or
/// preprocessed shader bytes
pub trait ShaderLoader {
    /// Load shader bytes for `name` with the given macros.
    ///
    /// Errors are reported as [`Error::ShaderCompileFailed`](crate::Error)
    /// so callers can decide to abort or degrade.
    fn load(&self, name: &str, stage: ShaderStage, macros: &ShaderMacros) -> Result<Vec<u8>>;
}
