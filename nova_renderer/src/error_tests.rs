use crate::error::Error;

#[test]
fn test_display_messages() {
    assert_eq!(
        Error::BackendError("boom".to_string()).to_string(),
        "Backend error: boom"
    );
    assert_eq!(Error::OutOfMemory.to_string(), "Out of GPU memory");
    assert_eq!(Error::SwapchainOutOfDate.to_string(), "Swapchain out of date");
    assert_eq!(
        Error::InvalidHandle("combined sampler texture").to_string(),
        "Invalid handle: combined sampler texture"
    );
}

#[test]
fn test_shader_compile_failed_carries_log() {
    let err = Error::ShaderCompileFailed {
        name: "fullscreen.vert".to_string(),
        log: "unknown identifier".to_string(),
    };
    let msg = err.to_string();
    assert!(msg.contains("fullscreen.vert"));
    assert!(msg.contains("unknown identifier"));
}

#[test]
fn test_environment_errors_are_distinguishable() {
    assert!(Error::SurfaceLost.is_environment());
    assert!(Error::DeviceLost.is_environment());
    assert!(!Error::SwapchainOutOfDate.is_environment());
    assert!(!Error::OutOfMemory.is_environment());
}
