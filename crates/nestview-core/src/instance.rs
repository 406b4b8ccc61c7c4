//! Cloneable control facade for one embedded window pair.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use nestview_platform::{Bounds, NativeHandle, PlatformSurface, PositionFlags, RenderingHost, SurfaceId};

use crate::coordinator::{teardown, CloseReason, EmbeddingRelation, LifecycleState, Shared};
use crate::error::ControlError;
use crate::events::{EventKind, ObserverCallback};

/// Handle to a live (or already-closed) embedded window.
///
/// Clones share the same underlying state; closing through any clone closes
/// the window for all of them. After close, movement and visual operations
/// become silent no-ops, queries return inert defaults, and property setters
/// return [`ControlError::WindowClosed`].
#[derive(Clone)]
pub struct WindowInstance {
    shared: Rc<RefCell<Shared>>,
}

impl fmt::Debug for WindowInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.shared.borrow();
        f.debug_struct("WindowInstance")
            .field("host", &s.host)
            .field("surface", &s.surface)
            .field("state", &s.state)
            .finish_non_exhaustive()
    }
}

struct Parts {
    platform: Rc<dyn PlatformSurface>,
    renderer: Rc<dyn RenderingHost>,
    host: NativeHandle,
    surface: SurfaceId,
}

impl WindowInstance {
    pub(crate) fn new(shared: Rc<RefCell<Shared>>) -> Self {
        Self { shared }
    }

    /// Snapshot the adapters and handles if the window is still live.
    fn live_parts(&self) -> Option<Parts> {
        let s = self.shared.borrow();
        if s.state >= LifecycleState::TearingDown {
            return None;
        }
        Some(Parts {
            platform: s.platform.clone(),
            renderer: s.renderer.clone(),
            host: s.host,
            surface: s.surface,
        })
    }

    /// Tear down the window pair. Idempotent; closing an already-closed
    /// instance does nothing.
    pub fn close(&self) {
        teardown(&self.shared, CloseReason::Explicit);
    }

    /// Whether teardown has run (or is running) for this window.
    pub fn is_destroyed(&self) -> bool {
        self.shared.borrow().state >= LifecycleState::TearingDown
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        self.shared.borrow().state
    }

    /// The host window's native handle, while it is live.
    pub fn handle(&self) -> Option<NativeHandle> {
        let s = self.shared.borrow();
        (s.state < LifecycleState::TearingDown).then_some(s.host)
    }

    /// The embedded surface's native handle, while it is live.
    pub fn surface_handle(&self) -> Option<NativeHandle> {
        let s = self.shared.borrow();
        (s.state < LifecycleState::TearingDown).then_some(s.surface_handle)
    }

    /// The rendering-host identifier of the embedded surface, while it is
    /// live.
    pub fn surface_id(&self) -> Option<SurfaceId> {
        let s = self.shared.borrow();
        (s.state < LifecycleState::TearingDown).then_some(s.surface)
    }

    /// The current embedding relation, while both handles are live.
    pub fn embedding(&self) -> Option<EmbeddingRelation> {
        self.shared.borrow().relation
    }

    /// Register an observer for one class of window events.
    pub fn on(&self, kind: EventKind, callback: ObserverCallback) {
        self.shared.borrow_mut().observers.subscribe(kind, callback);
    }

    // Movement and visual operations: silent no-ops once closed.

    /// Resize both surfaces in lockstep.
    pub fn resize(&self, width: u32, height: u32) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            trace!("resize on closed window ignored");
            return Ok(());
        };
        parts.renderer.set_bounds(parts.surface, width, height)?;
        parts.platform.set_position(
            parts.host,
            Bounds::at_origin(width, height),
            PositionFlags::NO_ZORDER | PositionFlags::NO_MOVE | PositionFlags::FRAME_CHANGED,
        )?;
        Ok(())
    }

    /// Move the host window, preserving z-order and size.
    pub fn move_to(&self, x: i32, y: i32) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            trace!("move on closed window ignored");
            return Ok(());
        };
        parts.platform.set_position(
            parts.host,
            Bounds::new(x, y, 0, 0),
            PositionFlags::NO_ZORDER | PositionFlags::NO_SIZE,
        )?;
        Ok(())
    }

    /// Center the window on its current display.
    pub fn center(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.renderer.center(parts.surface)?;
        Ok(())
    }

    pub fn show(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.show_window(parts.host)?;
        Ok(())
    }

    pub fn hide(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.hide_window(parts.host)?;
        Ok(())
    }

    /// Give the host window keyboard focus.
    pub fn focus(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.focus_window(parts.host)?;
        Ok(())
    }

    /// Remove keyboard focus from the embedded surface.
    pub fn blur(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.renderer.blur(parts.surface)?;
        Ok(())
    }

    pub fn minimize(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.minimize(parts.host)?;
        Ok(())
    }

    pub fn maximize(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.maximize(parts.host)?;
        Ok(())
    }

    pub fn restore(&self) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.restore(parts.host)?;
        Ok(())
    }

    /// Flash the taskbar entry to request attention.
    pub fn flash(&self, continuous: bool) -> Result<(), ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(());
        };
        parts.platform.flash(parts.host, continuous)?;
        Ok(())
    }

    // Property setters: an error once closed.

    pub fn set_title(&self, title: &str) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_title(parts.host, title)?;
        Ok(())
    }

    pub fn set_dark_mode(&self, dark: bool) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_dark_mode(parts.host, dark)?;
        Ok(())
    }

    /// Set the whole-window opacity, 0.0 transparent to 1.0 opaque.
    pub fn set_opacity(&self, opacity: f64) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_opacity(parts.host, opacity.clamp(0.0, 1.0))?;
        Ok(())
    }

    pub fn set_always_on_top(&self, on_top: bool) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_always_on_top(parts.host, on_top)?;
        Ok(())
    }

    /// Set the titlebar background color (0x00BBGGRR).
    pub fn set_titlebar_color(&self, color: u32) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_titlebar_color(parts.host, color)?;
        Ok(())
    }

    /// Set titlebar background and caption text colors together.
    pub fn set_titlebar_colors(&self, background: u32, text: u32) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_titlebar_colors(parts.host, background, text)?;
        Ok(())
    }

    pub fn set_corner_preference(
        &self,
        preference: nestview_platform::CornerPreference,
    ) -> Result<(), ControlError> {
        let parts = self.live_parts().ok_or(ControlError::WindowClosed)?;
        parts.platform.set_corner_preference(parts.host, preference)?;
        Ok(())
    }

    // Queries: inert defaults once closed.

    pub fn is_visible(&self) -> Result<bool, ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(false);
        };
        Ok(parts.platform.is_visible(parts.host)?)
    }

    pub fn is_focused(&self) -> Result<bool, ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(false);
        };
        Ok(parts.platform.is_focused(parts.host)?)
    }

    /// The host window's DPI; 96 once closed.
    pub fn dpi(&self) -> Result<u32, ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(96);
        };
        Ok(parts.platform.dpi(parts.host)?)
    }

    /// The host window's scale factor; 1.0 once closed.
    pub fn scale_factor(&self) -> Result<f64, ControlError> {
        let Some(parts) = self.live_parts() else {
            return Ok(1.0);
        };
        Ok(parts.platform.scale_factor(parts.host)?)
    }
}
