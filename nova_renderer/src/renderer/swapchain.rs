//! Swapchain configuration

/// Frame pacing policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VSync {
    Off,
    #[default]
    On,
    /// Tear only when a frame is late
    LateSwapTear,
}

/// Presentable-image chain configuration.
///
/// Rebuilt on resize/vsync/fullscreen change via `set_swapchain_desc`,
/// which is only legal between frames. Render targets sized to the old
/// dimensions are independent, caller-owned handles — the caller rebuilds
/// them.
#[derive(Debug, Clone, Copy)]
pub struct SwapchainDesc {
    pub width: u32,
    pub height: u32,
    /// Number of swapchain images requested
    pub num_frames: u32,
    pub vsync: VSync,
    pub fullscreen: bool,
}

impl Default for SwapchainDesc {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            num_frames: 3,
            vsync: VSync::On,
            fullscreen: false,
        }
    }
}
