//! Frame state machine
//!
//! The facade routes every frame-scoped call through [`FrameContext`]
//! before it reaches the backend, so call-ordering contracts are enforced
//! once, identically, for every backend. Violations are programming errors
//! and panic.

/// Where the renderer is within the frame loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FrameState {
    /// Between frames; resource creation/deletion and swapchain changes
    /// are legal
    #[default]
    Idle,
    /// Inside begin_frame..present_frame, outside any render pass
    InFrame,
    /// Inside begin_render_pass..end_render_pass
    InRenderPass,
}

/// Tracks frame/render-pass nesting and pipeline usage across one frame
#[derive(Debug, Default)]
pub struct FrameContext {
    state: FrameState,
    /// A pipeline has been bound in the current render pass
    pipeline_bound: bool,
    /// The bound pipeline has issued at least one draw
    pipeline_drawn: bool,
    /// Monotonic frame counter, advanced at present
    frame_num: u64,
}

impl FrameContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameState {
        self.state
    }

    /// Number of frames presented so far
    pub fn frame_num(&self) -> u64 {
        self.frame_num
    }

    pub fn begin_frame(&mut self) {
        assert_eq!(
            self.state,
            FrameState::Idle,
            "begin_frame called while a frame is already in flight"
        );
        self.state = FrameState::InFrame;
        self.pipeline_bound = false;
        self.pipeline_drawn = false;
    }

    /// Close the frame. Runs even when the backend's present fails, so the
    /// caller can recreate the swapchain from a clean Idle state.
    pub fn present_frame(&mut self) {
        assert_eq!(
            self.state,
            FrameState::InFrame,
            "present_frame requires an open frame with no active render pass"
        );
        self.state = FrameState::Idle;
        self.frame_num += 1;
    }

    pub fn begin_render_pass(&mut self) {
        assert_eq!(
            self.state,
            FrameState::InFrame,
            "begin_render_pass requires an open frame with no active render pass"
        );
        self.state = FrameState::InRenderPass;
        self.pipeline_bound = false;
        self.pipeline_drawn = false;
    }

    pub fn end_render_pass(&mut self) {
        assert_eq!(
            self.state,
            FrameState::InRenderPass,
            "end_render_pass called outside a render pass"
        );
        self.state = FrameState::InFrame;
        self.pipeline_bound = false;
        self.pipeline_drawn = false;
    }

    pub fn bind_pipeline(&mut self) {
        assert_eq!(
            self.state,
            FrameState::InRenderPass,
            "bind_pipeline called outside a render pass"
        );
        assert!(
            !self.pipeline_bound || self.pipeline_drawn,
            "previous pipeline was bound but never drawn with"
        );
        self.pipeline_bound = true;
        self.pipeline_drawn = false;
    }

    pub fn draw(&mut self) {
        assert_eq!(
            self.state,
            FrameState::InRenderPass,
            "draw called outside a render pass"
        );
        assert!(self.pipeline_bound, "draw called with no pipeline bound");
        self.pipeline_drawn = true;
    }

    /// Index/vertex buffer binds are legal anywhere inside the frame
    pub fn bind_buffer(&self) {
        assert_ne!(
            self.state,
            FrameState::Idle,
            "buffer binds are only legal inside a frame"
        );
    }

    pub fn bind_descriptor_set(&self) {
        assert_eq!(
            self.state,
            FrameState::InRenderPass,
            "bind_descriptor_set called outside a render pass"
        );
        assert!(
            self.pipeline_bound,
            "bind_descriptor_set called with no pipeline bound"
        );
    }

    /// Viewport/scissor state only needs an active render pass, not a
    /// bound pipeline
    pub fn set_dynamic_state(&self) {
        assert_eq!(
            self.state,
            FrameState::InRenderPass,
            "viewport/scissor state requires an active render pass"
        );
    }

    pub fn create_ephemeral(&self) {
        assert_ne!(
            self.state,
            FrameState::Idle,
            "ephemeral buffers can only be created inside a frame"
        );
    }

    pub fn change_swapchain(&self) {
        assert_eq!(
            self.state,
            FrameState::Idle,
            "swapchain changes are only legal between frames"
        );
    }
}

#[cfg(test)]
#[path = "frame_tests.rs"]
mod tests;
