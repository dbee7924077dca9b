//! Typed resource handles
//!
//! A handle is an opaque 32-bit id referencing a slot in a
//! [`ResourceContainer`](crate::renderer::ResourceContainer). Value 0 is the
//! "empty" sentinel. Handles are plain values and carry no ownership; the
//! container that issued a handle is the sole owner of the resource. The
//! marker type parameter makes it a compile error to pass, say, a
//! `BufferHandle` where a `TextureHandle` is expected.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Opaque typed handle to a renderer resource
#[repr(transparent)]
pub struct Handle<T> {
    id: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Handle<T> {
    /// The invalid ("empty") handle
    pub const EMPTY: Self = Self {
        id: 0,
        _marker: PhantomData,
    };

    /// Reconstruct a handle from its raw id.
    ///
    /// Intended for backends and for reading handles out of POD binding
    /// structs; client code should only hold handles returned by `create*`.
    pub fn from_raw(id: u32) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Raw 32-bit id (0 = empty)
    pub fn raw(self) -> u32 {
        self.id
    }

    /// Whether this handle references a slot at all
    pub fn is_valid(self) -> bool {
        self.id != 0
    }
}

// Manual impls: derives would bound on `T`, but the marker carries no data.

impl<T> Clone for Handle<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Handle<T> {}

impl<T> Default for Handle<T> {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl<T> PartialEq for Handle<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Handle<T> {}

impl<T> Hash for Handle<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for Handle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({})", self.id)
    }
}

// repr(transparent) over u32 with a dataless marker, so handles can live
// inside POD binding structs.
unsafe impl<T: 'static> bytemuck::Zeroable for Handle<T> {}
unsafe impl<T: 'static> bytemuck::Pod for Handle<T> {}

/// Marker types for each resource class
pub mod tags {
    pub enum Buffer {}
    pub enum Texture {}
    pub enum Sampler {}
    pub enum RenderTarget {}
    pub enum RenderPass {}
    pub enum Framebuffer {}
    pub enum Pipeline {}
    pub enum VertexShader {}
    pub enum FragmentShader {}
    pub enum DescriptorSetLayout {}
}

pub type BufferHandle = Handle<tags::Buffer>;
pub type TextureHandle = Handle<tags::Texture>;
pub type SamplerHandle = Handle<tags::Sampler>;
pub type RenderTargetHandle = Handle<tags::RenderTarget>;
pub type RenderPassHandle = Handle<tags::RenderPass>;
pub type FramebufferHandle = Handle<tags::Framebuffer>;
pub type PipelineHandle = Handle<tags::Pipeline>;
pub type VertexShaderHandle = Handle<tags::VertexShader>;
pub type FragmentShaderHandle = Handle<tags::FragmentShader>;
pub type DSLayoutHandle = Handle<tags::DescriptorSetLayout>;
