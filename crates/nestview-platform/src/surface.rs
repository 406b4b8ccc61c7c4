//! The two adapter interfaces consumed by the lifecycle coordinator.
//!
//! [`PlatformSurface`] exposes handle-level primitives over the native window
//! system; [`RenderingHost`] exposes the web-content surface. Both sides own
//! their window objects exclusively. The coordinator only ever holds the
//! non-owning [`NativeHandle`]/[`SurfaceId`] references these traits hand out.

use std::rc::Rc;

use thiserror::Error;

use crate::geometry::{Bounds, NativeHandle, SurfaceId};
use crate::styles::{CornerPreference, PositionFlags, StyleMask};

/// Errors reported by a platform surface adapter.
#[derive(Error, Debug)]
pub enum PlatformError {
    #[error("failed to create window: {0}")]
    WindowCreation(String),

    #[error("unknown or destroyed window handle: {0:?}")]
    InvalidHandle(NativeHandle),

    #[error("message pump unavailable")]
    PumpUnavailable,

    #[error("platform call failed: {0}")]
    Call(#[from] anyhow::Error),
}

/// Errors reported by a rendering host adapter.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("failed to create surface: {0}")]
    SurfaceCreation(String),

    #[error("surface not found: {0:?}")]
    SurfaceNotFound(SurfaceId),

    #[error("content load failed: {0}")]
    Load(String),

    #[error("rendering host call failed: {0}")]
    Call(#[from] anyhow::Error),
}

/// Notifications emitted by a rendering-host surface.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    /// The surface painted a frame.
    Painted,
    /// The surface was resized.
    Resized { width: u32, height: u32 },
    /// The surface moved.
    Moved { x: i32, y: i32 },
    /// The surface gained focus.
    Focused,
    /// The surface lost focus.
    Blurred,
    /// The pending content load completed.
    LoadFinished,
}

/// Callback for surface notifications.
///
/// Invoked on the scheduler thread; must not assume the surface is still
/// live (the subscription may outlast the surface by one delivery).
pub type SurfaceEventCallback = Rc<dyn Fn(&SurfaceEvent)>;

/// Construction parameters for a rendering-host surface.
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    /// Initial bounds of the surface.
    pub bounds: Bounds,
    /// Whether the surface is shown immediately. The coordinator always
    /// creates surfaces hidden and shows them after content load.
    pub visible: bool,
    /// Whether the surface is created without its own window chrome.
    pub frameless: bool,
    /// Isolate content scripting from the embedding host.
    pub content_isolation: bool,
    /// Allow content to reach host-side scripting facilities.
    pub host_scripting: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            bounds: Bounds::at_origin(800, 600),
            visible: false,
            frameless: true,
            content_isolation: true,
            host_scripting: false,
        }
    }
}

/// Handle-level primitives over the native window system.
///
/// Implementations own every window they create; callers must treat returned
/// handles as invalid after [`destroy_window`](PlatformSurface::destroy_window).
/// All methods are synchronous and are expected to return quickly.
pub trait PlatformSurface {
    /// Create a top-level host window of the given client size.
    fn create_window(&self, width: u32, height: u32) -> Result<NativeHandle, PlatformError>;

    /// Destroy a window created by this adapter.
    fn destroy_window(&self, handle: NativeHandle) -> Result<(), PlatformError>;

    fn show_window(&self, handle: NativeHandle) -> Result<(), PlatformError>;
    fn hide_window(&self, handle: NativeHandle) -> Result<(), PlatformError>;
    fn focus_window(&self, handle: NativeHandle) -> Result<(), PlatformError>;

    fn minimize(&self, handle: NativeHandle) -> Result<(), PlatformError>;
    fn maximize(&self, handle: NativeHandle) -> Result<(), PlatformError>;
    fn restore(&self, handle: NativeHandle) -> Result<(), PlatformError>;

    /// Reassign `child`'s parent in the window hierarchy. `child` may be a
    /// foreign handle owned by another adapter.
    fn set_parent(&self, child: NativeHandle, parent: NativeHandle) -> Result<(), PlatformError>;

    /// Record `child` as the embedded surface of `host`, for introspection.
    fn attach_child(&self, host: NativeHandle, child: NativeHandle) -> Result<(), PlatformError>;

    /// Patch the window's style bitmask: set `add`, clear `remove`.
    fn set_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError>;

    /// Patch the window's extended style bitmask.
    fn set_ex_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError>;

    /// Change position/size/z-order in one call, as moderated by `flags`.
    fn set_position(
        &self,
        handle: NativeHandle,
        bounds: Bounds,
        flags: PositionFlags,
    ) -> Result<(), PlatformError>;

    fn set_title(&self, handle: NativeHandle, title: &str) -> Result<(), PlatformError>;
    fn set_icon_visible(&self, handle: NativeHandle, visible: bool) -> Result<(), PlatformError>;
    fn set_dark_mode(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError>;

    /// Set the titlebar background color (0x00BBGGRR).
    fn set_titlebar_color(&self, handle: NativeHandle, color: u32) -> Result<(), PlatformError>;

    /// Set titlebar background and text colors.
    fn set_titlebar_colors(
        &self,
        handle: NativeHandle,
        background: u32,
        text: u32,
    ) -> Result<(), PlatformError>;

    fn set_corner_preference(
        &self,
        handle: NativeHandle,
        preference: CornerPreference,
    ) -> Result<(), PlatformError>;

    /// Set window opacity in `[0.0, 1.0]`.
    fn set_opacity(&self, handle: NativeHandle, opacity: f64) -> Result<(), PlatformError>;
    fn set_always_on_top(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError>;

    /// Flash the taskbar entry; `continuous` keeps flashing until focused.
    fn flash(&self, handle: NativeHandle, continuous: bool) -> Result<(), PlatformError>;

    fn dpi(&self, handle: NativeHandle) -> Result<u32, PlatformError>;
    fn scale_factor(&self, handle: NativeHandle) -> Result<f64, PlatformError>;
    fn is_visible(&self, handle: NativeHandle) -> Result<bool, PlatformError>;
    fn is_focused(&self, handle: NativeHandle) -> Result<bool, PlatformError>;

    /// Drain the native message queue without blocking. Queued close requests
    /// are delivered to the registered callback during the drain.
    fn poll_events(&self) -> Result<(), PlatformError>;

    /// Register the close-request callback for a host window. The callback is
    /// invoked when the window manager asks the window to close.
    fn on_close_requested(
        &self,
        handle: NativeHandle,
        callback: Box<dyn Fn()>,
    ) -> Result<(), PlatformError>;
}

/// The web-content rendering side of the embedding.
///
/// Surfaces are owned by the implementation; the coordinator extracts the
/// surface's native handle once at creation time and treats it as immutable
/// for the surface's lifetime.
pub trait RenderingHost {
    fn create_surface(&self, config: &SurfaceConfig) -> Result<SurfaceId, RenderError>;
    fn destroy_surface(&self, id: SurfaceId) -> Result<(), RenderError>;

    /// The surface's native window handle, for reparenting under a host.
    fn native_handle(&self, id: SurfaceId) -> Result<NativeHandle, RenderError>;

    /// Begin loading `url` into the surface. Completion is signalled through
    /// [`SurfaceEvent::LoadFinished`] on subscribed callbacks.
    fn load_url(&self, id: SurfaceId, url: &str) -> Result<(), RenderError>;

    fn show(&self, id: SurfaceId) -> Result<(), RenderError>;
    fn hide(&self, id: SurfaceId) -> Result<(), RenderError>;
    fn focus(&self, id: SurfaceId) -> Result<(), RenderError>;
    fn blur(&self, id: SurfaceId) -> Result<(), RenderError>;

    fn set_bounds(&self, id: SurfaceId, width: u32, height: u32) -> Result<(), RenderError>;
    fn set_outer_position(&self, id: SurfaceId, x: i32, y: i32) -> Result<(), RenderError>;

    /// Center the composite window on the screen.
    fn center(&self, id: SurfaceId) -> Result<(), RenderError>;

    /// Inject a style override into the loaded content.
    fn inject_css(&self, id: SurfaceId, css: &str) -> Result<(), RenderError>;

    /// Subscribe to surface notifications; delivery order is subscription
    /// order, with no deduplication.
    fn subscribe(&self, id: SurfaceId, callback: SurfaceEventCallback) -> Result<(), RenderError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_config_defaults_isolate_content() {
        let config = SurfaceConfig::default();
        assert!(config.content_isolation);
        assert!(!config.host_scripting);
        assert!(!config.visible);
        assert!(config.frameless);
    }
}
