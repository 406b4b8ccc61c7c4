//! In-process implementations of both adapter traits.
//!
//! No real windows are created: window and surface state live in maps, and
//! every adapter call is appended to a shared [`CallLog`]. The coordinator's
//! test suite asserts its ordering contracts against that log; embedders can
//! use the same pair as a dry-run backend.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::geometry::{Bounds, NativeHandle, SurfaceId};
use crate::styles::{CornerPreference, PositionFlags, StyleMask};
use crate::surface::{
    PlatformError, PlatformSurface, RenderError, RenderingHost, SurfaceConfig, SurfaceEvent,
    SurfaceEventCallback,
};

/// Shared, append-only record of adapter calls.
#[derive(Clone, Default)]
pub struct CallLog {
    entries: Rc<RefCell<Vec<String>>>,
}

impl CallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        let entry = entry.into();
        trace!(call = %entry, "adapter call");
        self.entries.borrow_mut().push(entry);
    }

    /// Snapshot of all recorded entries.
    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    /// Index of the first entry starting with `prefix`.
    pub fn index_of(&self, prefix: &str) -> Option<usize> {
        self.entries
            .borrow()
            .iter()
            .position(|e| e.starts_with(prefix))
    }

    /// Number of entries starting with `prefix`.
    pub fn count_of(&self, prefix: &str) -> usize {
        self.entries
            .borrow()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}

#[derive(Debug, Clone)]
struct WindowState {
    bounds: Bounds,
    visible: bool,
    focused: bool,
    title: String,
    icon_visible: bool,
    dark_mode: Option<bool>,
    child: Option<NativeHandle>,
    opacity: f64,
    always_on_top: bool,
}

impl WindowState {
    fn new(width: u32, height: u32) -> Self {
        Self {
            bounds: Bounds::at_origin(width, height),
            visible: false,
            focused: false,
            title: String::new(),
            icon_visible: true,
            dark_mode: None,
            child: None,
            opacity: 1.0,
            always_on_top: false,
        }
    }
}

/// Headless [`PlatformSurface`] backed by in-memory window records.
pub struct HeadlessPlatform {
    windows: RefCell<HashMap<u64, WindowState>>,
    // Style and parent state is tracked for any handle, including foreign
    // surface handles that this adapter never created.
    styles: RefCell<HashMap<u64, StyleMask>>,
    ex_styles: RefCell<HashMap<u64, StyleMask>>,
    parents: RefCell<HashMap<u64, NativeHandle>>,
    close_callbacks: RefCell<HashMap<u64, Rc<dyn Fn()>>>,
    pending_closes: RefCell<Vec<u64>>,
    next_handle: Cell<u64>,
    fail_next_pump: Cell<bool>,
    log: CallLog,
}

impl HeadlessPlatform {
    pub fn new(log: CallLog) -> Self {
        Self {
            windows: RefCell::new(HashMap::new()),
            styles: RefCell::new(HashMap::new()),
            ex_styles: RefCell::new(HashMap::new()),
            parents: RefCell::new(HashMap::new()),
            close_callbacks: RefCell::new(HashMap::new()),
            pending_closes: RefCell::new(Vec::new()),
            next_handle: Cell::new(1),
            fail_next_pump: Cell::new(false),
            log,
        }
    }

    /// Make the next `poll_events` call fail, as if the pump had gone away.
    pub fn fail_next_pump(&self) {
        self.fail_next_pump.set(true);
    }

    /// Queue a window-manager close request; it is delivered to the
    /// registered callback on the next `poll_events` drain.
    pub fn request_close(&self, handle: NativeHandle) {
        self.pending_closes.borrow_mut().push(handle.raw());
    }

    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    pub fn is_window_live(&self, handle: NativeHandle) -> bool {
        self.windows.borrow().contains_key(&handle.raw())
    }

    pub fn bounds_of(&self, handle: NativeHandle) -> Option<Bounds> {
        self.windows.borrow().get(&handle.raw()).map(|w| w.bounds)
    }

    pub fn title_of(&self, handle: NativeHandle) -> Option<String> {
        self.windows
            .borrow()
            .get(&handle.raw())
            .map(|w| w.title.clone())
    }

    pub fn dark_mode_of(&self, handle: NativeHandle) -> Option<bool> {
        self.windows
            .borrow()
            .get(&handle.raw())
            .and_then(|w| w.dark_mode)
    }

    pub fn parent_of(&self, child: NativeHandle) -> Option<NativeHandle> {
        self.parents.borrow().get(&child.raw()).copied()
    }

    pub fn child_of(&self, host: NativeHandle) -> Option<NativeHandle> {
        self.windows.borrow().get(&host.raw()).and_then(|w| w.child)
    }

    pub fn styles_of(&self, handle: NativeHandle) -> StyleMask {
        self.styles
            .borrow()
            .get(&handle.raw())
            .copied()
            .unwrap_or_default()
    }

    /// Simulate the user focusing the window.
    pub fn set_focused(&self, handle: NativeHandle, focused: bool) {
        if let Some(w) = self.windows.borrow_mut().get_mut(&handle.raw()) {
            w.focused = focused;
        }
    }

    fn with_window<T>(
        &self,
        handle: NativeHandle,
        f: impl FnOnce(&mut WindowState) -> T,
    ) -> Result<T, PlatformError> {
        let mut windows = self.windows.borrow_mut();
        let state = windows
            .get_mut(&handle.raw())
            .ok_or(PlatformError::InvalidHandle(handle))?;
        Ok(f(state))
    }
}

impl PlatformSurface for HeadlessPlatform {
    fn create_window(&self, width: u32, height: u32) -> Result<NativeHandle, PlatformError> {
        if width == 0 || height == 0 {
            return Err(PlatformError::WindowCreation(format!(
                "degenerate size {}x{}",
                width, height
            )));
        }

        let raw = self.next_handle.get();
        self.next_handle.set(raw + 1);
        let handle = NativeHandle::new(raw);

        self.windows
            .borrow_mut()
            .insert(raw, WindowState::new(width, height));
        self.styles
            .borrow_mut()
            .insert(raw, StyleMask::OVERLAPPED_WINDOW);

        self.log
            .push(format!("platform.create_window {}x{} -> {}", width, height, raw));
        debug!(handle = raw, width, height, "headless window created");
        Ok(handle)
    }

    fn destroy_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log
            .push(format!("platform.destroy_window {}", handle.raw()));
        let removed = self.windows.borrow_mut().remove(&handle.raw());
        self.close_callbacks.borrow_mut().remove(&handle.raw());
        if removed.is_none() {
            return Err(PlatformError::InvalidHandle(handle));
        }
        debug!(handle = handle.raw(), "headless window destroyed");
        Ok(())
    }

    fn show_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.show_window {}", handle.raw()));
        self.with_window(handle, |w| w.visible = true)
    }

    fn hide_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.hide_window {}", handle.raw()));
        self.with_window(handle, |w| w.visible = false)
    }

    fn focus_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.focus_window {}", handle.raw()));
        self.with_window(handle, |w| w.focused = true)
    }

    fn minimize(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.minimize {}", handle.raw()));
        self.with_window(handle, |_| ())
    }

    fn maximize(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.maximize {}", handle.raw()));
        self.with_window(handle, |_| ())
    }

    fn restore(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!("platform.restore {}", handle.raw()));
        self.with_window(handle, |_| ())
    }

    fn set_parent(&self, child: NativeHandle, parent: NativeHandle) -> Result<(), PlatformError> {
        if !self.windows.borrow().contains_key(&parent.raw()) {
            return Err(PlatformError::InvalidHandle(parent));
        }
        self.parents.borrow_mut().insert(child.raw(), parent);
        self.log.push(format!(
            "platform.set_parent {} -> {}",
            child.raw(),
            parent.raw()
        ));
        Ok(())
    }

    fn attach_child(&self, host: NativeHandle, child: NativeHandle) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.attach_child {} <- {}",
            host.raw(),
            child.raw()
        ));
        self.with_window(host, |w| w.child = Some(child))
    }

    fn set_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError> {
        let mut styles = self.styles.borrow_mut();
        let current = styles.entry(handle.raw()).or_default();
        *current = current.with(add).without(remove);
        self.log.push(format!(
            "platform.set_styles {} add={:?} remove={:?}",
            handle.raw(),
            add,
            remove
        ));
        Ok(())
    }

    fn set_ex_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError> {
        let mut styles = self.ex_styles.borrow_mut();
        let current = styles.entry(handle.raw()).or_default();
        *current = current.with(add).without(remove);
        self.log.push(format!(
            "platform.set_ex_styles {} add={:?} remove={:?}",
            handle.raw(),
            add,
            remove
        ));
        Ok(())
    }

    fn set_position(
        &self,
        handle: NativeHandle,
        bounds: Bounds,
        flags: PositionFlags,
    ) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_position {} {},{} {}x{} {:?}",
            handle.raw(),
            bounds.x,
            bounds.y,
            bounds.width,
            bounds.height,
            flags
        ));

        if let Some(w) = self.windows.borrow_mut().get_mut(&handle.raw()) {
            let mut next = w.bounds;
            if !flags.contains(PositionFlags::NO_MOVE) {
                next = next.moved_to(bounds.x, bounds.y);
            }
            if !flags.contains(PositionFlags::NO_SIZE) {
                next = next.sized(bounds.width, bounds.height);
            }
            w.bounds = next;
        }
        Ok(())
    }

    fn set_title(&self, handle: NativeHandle, title: &str) -> Result<(), PlatformError> {
        self.log
            .push(format!("platform.set_title {} {:?}", handle.raw(), title));
        self.with_window(handle, |w| w.title = title.to_string())
    }

    fn set_icon_visible(&self, handle: NativeHandle, visible: bool) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_icon_visible {} {}",
            handle.raw(),
            visible
        ));
        self.with_window(handle, |w| w.icon_visible = visible)
    }

    fn set_dark_mode(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError> {
        self.log
            .push(format!("platform.set_dark_mode {} {}", handle.raw(), enabled));
        self.with_window(handle, |w| w.dark_mode = Some(enabled))
    }

    fn set_titlebar_color(&self, handle: NativeHandle, color: u32) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_titlebar_color {} {:#08x}",
            handle.raw(),
            color
        ));
        self.with_window(handle, |_| ())
    }

    fn set_titlebar_colors(
        &self,
        handle: NativeHandle,
        background: u32,
        text: u32,
    ) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_titlebar_colors {} {:#08x} {:#08x}",
            handle.raw(),
            background,
            text
        ));
        self.with_window(handle, |_| ())
    }

    fn set_corner_preference(
        &self,
        handle: NativeHandle,
        preference: CornerPreference,
    ) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_corner_preference {} {:?}",
            handle.raw(),
            preference
        ));
        self.with_window(handle, |_| ())
    }

    fn set_opacity(&self, handle: NativeHandle, opacity: f64) -> Result<(), PlatformError> {
        self.log
            .push(format!("platform.set_opacity {} {}", handle.raw(), opacity));
        self.with_window(handle, |w| w.opacity = opacity.clamp(0.0, 1.0))
    }

    fn set_always_on_top(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError> {
        self.log.push(format!(
            "platform.set_always_on_top {} {}",
            handle.raw(),
            enabled
        ));
        self.with_window(handle, |w| w.always_on_top = enabled)
    }

    fn flash(&self, handle: NativeHandle, continuous: bool) -> Result<(), PlatformError> {
        self.log
            .push(format!("platform.flash {} {}", handle.raw(), continuous));
        self.with_window(handle, |_| ())
    }

    fn dpi(&self, handle: NativeHandle) -> Result<u32, PlatformError> {
        self.with_window(handle, |_| 96)
    }

    fn scale_factor(&self, handle: NativeHandle) -> Result<f64, PlatformError> {
        self.with_window(handle, |_| 1.0)
    }

    fn is_visible(&self, handle: NativeHandle) -> Result<bool, PlatformError> {
        self.with_window(handle, |w| w.visible)
    }

    fn is_focused(&self, handle: NativeHandle) -> Result<bool, PlatformError> {
        self.with_window(handle, |w| w.focused)
    }

    fn poll_events(&self) -> Result<(), PlatformError> {
        if self.fail_next_pump.replace(false) {
            return Err(PlatformError::PumpUnavailable);
        }

        // Deliver queued close requests outside any map borrow; the callback
        // is free to call back into this adapter.
        let pending: Vec<u64> = self.pending_closes.borrow_mut().drain(..).collect();
        for raw in pending {
            let callback = self.close_callbacks.borrow().get(&raw).cloned();
            if let Some(callback) = callback {
                debug!(handle = raw, "delivering close request");
                callback();
            }
        }
        Ok(())
    }

    fn on_close_requested(
        &self,
        handle: NativeHandle,
        callback: Box<dyn Fn()>,
    ) -> Result<(), PlatformError> {
        if !self.windows.borrow().contains_key(&handle.raw()) {
            return Err(PlatformError::InvalidHandle(handle));
        }
        self.close_callbacks
            .borrow_mut()
            .insert(handle.raw(), Rc::from(callback));
        self.log
            .push(format!("platform.on_close_requested {}", handle.raw()));
        Ok(())
    }
}

#[derive(Debug)]
struct SurfaceState {
    handle: NativeHandle,
    bounds: Bounds,
    visible: bool,
    url: Option<String>,
    injected_css: Vec<String>,
}

/// Headless [`RenderingHost`] backed by in-memory surface records.
///
/// `load_url` completes synchronously: the `LoadFinished` notification is
/// delivered to subscribers before the call returns.
pub struct HeadlessRenderer {
    surfaces: RefCell<HashMap<SurfaceId, SurfaceState>>,
    subscribers: RefCell<HashMap<SurfaceId, Vec<SurfaceEventCallback>>>,
    fail_next_create: Cell<bool>,
    log: CallLog,
}

impl HeadlessRenderer {
    pub fn new(log: CallLog) -> Self {
        Self {
            surfaces: RefCell::new(HashMap::new()),
            subscribers: RefCell::new(HashMap::new()),
            fail_next_create: Cell::new(false),
            log,
        }
    }

    /// Make the next `create_surface` call fail.
    pub fn fail_next_create(&self) {
        self.fail_next_create.set(true);
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.borrow().len()
    }

    pub fn is_surface_live(&self, id: SurfaceId) -> bool {
        self.surfaces.borrow().contains_key(&id)
    }

    pub fn surface_bounds(&self, id: SurfaceId) -> Option<Bounds> {
        self.surfaces.borrow().get(&id).map(|s| s.bounds)
    }

    pub fn surface_visible(&self, id: SurfaceId) -> Option<bool> {
        self.surfaces.borrow().get(&id).map(|s| s.visible)
    }

    pub fn loaded_url(&self, id: SurfaceId) -> Option<String> {
        self.surfaces.borrow().get(&id).and_then(|s| s.url.clone())
    }

    pub fn injected_css(&self, id: SurfaceId) -> Vec<String> {
        self.surfaces
            .borrow()
            .get(&id)
            .map(|s| s.injected_css.clone())
            .unwrap_or_default()
    }

    /// Deliver an event to the surface's subscribers, in subscription order.
    pub fn emit(&self, id: SurfaceId, event: &SurfaceEvent) {
        let callbacks: Vec<SurfaceEventCallback> = self
            .subscribers
            .borrow()
            .get(&id)
            .map(|v| v.to_vec())
            .unwrap_or_default();
        for callback in callbacks {
            callback(event);
        }
    }

    fn with_surface<T>(
        &self,
        id: SurfaceId,
        f: impl FnOnce(&mut SurfaceState) -> T,
    ) -> Result<T, RenderError> {
        let mut surfaces = self.surfaces.borrow_mut();
        let state = surfaces.get_mut(&id).ok_or(RenderError::SurfaceNotFound(id))?;
        Ok(f(state))
    }
}

impl RenderingHost for HeadlessRenderer {
    fn create_surface(&self, config: &SurfaceConfig) -> Result<SurfaceId, RenderError> {
        if self.fail_next_create.replace(false) {
            self.log.push("renderer.create_surface FAILED".to_string());
            return Err(RenderError::SurfaceCreation(
                "headless create failure injected".to_string(),
            ));
        }
        if config.bounds.width == 0 || config.bounds.height == 0 {
            return Err(RenderError::SurfaceCreation(format!(
                "degenerate size {}x{}",
                config.bounds.width, config.bounds.height
            )));
        }

        let id = SurfaceId::next();
        // Fabricated handle in a range disjoint from HeadlessPlatform's.
        let handle = NativeHandle::new(0xEE00_0000 + id.raw());

        self.surfaces.borrow_mut().insert(
            id,
            SurfaceState {
                handle,
                bounds: config.bounds,
                visible: config.visible,
                url: None,
                injected_css: Vec::new(),
            },
        );

        self.log.push(format!(
            "renderer.create_surface {}x{} -> {}",
            config.bounds.width,
            config.bounds.height,
            id.raw()
        ));
        debug!(surface = id.raw(), "headless surface created");
        Ok(id)
    }

    fn destroy_surface(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.destroy_surface {}", id.raw()));
        self.subscribers.borrow_mut().remove(&id);
        if self.surfaces.borrow_mut().remove(&id).is_none() {
            return Err(RenderError::SurfaceNotFound(id));
        }
        debug!(surface = id.raw(), "headless surface destroyed");
        Ok(())
    }

    fn native_handle(&self, id: SurfaceId) -> Result<NativeHandle, RenderError> {
        self.with_surface(id, |s| s.handle)
    }

    fn load_url(&self, id: SurfaceId, url: &str) -> Result<(), RenderError> {
        self.log
            .push(format!("renderer.load_url {} {:?}", id.raw(), url));
        self.with_surface(id, |s| s.url = Some(url.to_string()))?;
        self.emit(id, &SurfaceEvent::LoadFinished);
        Ok(())
    }

    fn show(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.show {}", id.raw()));
        self.with_surface(id, |s| s.visible = true)
    }

    fn hide(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.hide {}", id.raw()));
        self.with_surface(id, |s| s.visible = false)
    }

    fn focus(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.focus {}", id.raw()));
        self.with_surface(id, |_| ())
    }

    fn blur(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.blur {}", id.raw()));
        self.with_surface(id, |_| ())
    }

    fn set_bounds(&self, id: SurfaceId, width: u32, height: u32) -> Result<(), RenderError> {
        self.log.push(format!(
            "renderer.set_bounds {} {}x{}",
            id.raw(),
            width,
            height
        ));
        self.with_surface(id, |s| s.bounds = s.bounds.sized(width, height))
    }

    fn set_outer_position(&self, id: SurfaceId, x: i32, y: i32) -> Result<(), RenderError> {
        self.log.push(format!(
            "renderer.set_outer_position {} {},{}",
            id.raw(),
            x,
            y
        ));
        self.with_surface(id, |s| s.bounds = s.bounds.moved_to(x, y))
    }

    fn center(&self, id: SurfaceId) -> Result<(), RenderError> {
        self.log.push(format!("renderer.center {}", id.raw()));
        self.with_surface(id, |_| ())
    }

    fn inject_css(&self, id: SurfaceId, css: &str) -> Result<(), RenderError> {
        self.log
            .push(format!("renderer.inject_css {} {:?}", id.raw(), css));
        self.with_surface(id, |s| s.injected_css.push(css.to_string()))
    }

    fn subscribe(&self, id: SurfaceId, callback: SurfaceEventCallback) -> Result<(), RenderError> {
        if !self.surfaces.borrow().contains_key(&id) {
            return Err(RenderError::SurfaceNotFound(id));
        }
        self.subscribers
            .borrow_mut()
            .entry(id)
            .or_default()
            .push(callback);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_window_lifecycle() {
        let log = CallLog::new();
        let platform = HeadlessPlatform::new(log.clone());

        let handle = platform.create_window(800, 600).unwrap();
        assert_eq!(platform.window_count(), 1);
        assert!(!platform.is_visible(handle).unwrap());

        platform.show_window(handle).unwrap();
        assert!(platform.is_visible(handle).unwrap());

        platform.destroy_window(handle).unwrap();
        assert_eq!(platform.window_count(), 0);
        assert!(matches!(
            platform.is_visible(handle),
            Err(PlatformError::InvalidHandle(_))
        ));
    }

    #[test]
    fn test_create_window_rejects_degenerate_size() {
        let platform = HeadlessPlatform::new(CallLog::new());
        assert!(matches!(
            platform.create_window(0, 600),
            Err(PlatformError::WindowCreation(_))
        ));
    }

    #[test]
    fn test_set_position_honors_flags() {
        let platform = HeadlessPlatform::new(CallLog::new());
        let handle = platform.create_window(800, 600).unwrap();

        platform
            .set_position(
                handle,
                Bounds::new(50, 60, 1024, 768),
                PositionFlags::NO_MOVE | PositionFlags::NO_ZORDER,
            )
            .unwrap();

        let bounds = platform.bounds_of(handle).unwrap();
        assert_eq!((bounds.x, bounds.y), (0, 0));
        assert_eq!((bounds.width, bounds.height), (1024, 768));
    }

    #[test]
    fn test_close_request_delivered_on_poll() {
        let platform = HeadlessPlatform::new(CallLog::new());
        let handle = platform.create_window(800, 600).unwrap();

        let delivered = Rc::new(Cell::new(0u32));
        let counter = delivered.clone();
        platform
            .on_close_requested(handle, Box::new(move || counter.set(counter.get() + 1)))
            .unwrap();

        platform.request_close(handle);
        assert_eq!(delivered.get(), 0);

        platform.poll_events().unwrap();
        assert_eq!(delivered.get(), 1);

        // Drained; nothing further to deliver.
        platform.poll_events().unwrap();
        assert_eq!(delivered.get(), 1);
    }

    #[test]
    fn test_pump_failure_is_one_shot() {
        let platform = HeadlessPlatform::new(CallLog::new());
        platform.fail_next_pump();
        assert!(matches!(
            platform.poll_events(),
            Err(PlatformError::PumpUnavailable)
        ));
        assert!(platform.poll_events().is_ok());
    }

    #[test]
    fn test_surface_load_emits_finish() {
        let log = CallLog::new();
        let renderer = HeadlessRenderer::new(log);
        let id = renderer.create_surface(&SurfaceConfig::default()).unwrap();

        let finished = Rc::new(Cell::new(false));
        let flag = finished.clone();
        renderer
            .subscribe(
                id,
                Rc::new(move |event| {
                    if matches!(event, SurfaceEvent::LoadFinished) {
                        flag.set(true);
                    }
                }),
            )
            .unwrap();

        renderer.load_url(id, "about:blank").unwrap();
        assert!(finished.get());
        assert_eq!(renderer.loaded_url(id).as_deref(), Some("about:blank"));
    }

    #[test]
    fn test_call_log_ordering() {
        let log = CallLog::new();
        let platform = HeadlessPlatform::new(log.clone());
        let renderer = HeadlessRenderer::new(log.clone());

        let host = platform.create_window(640, 480).unwrap();
        let surface = renderer.create_surface(&SurfaceConfig::default()).unwrap();
        renderer.destroy_surface(surface).unwrap();
        platform.destroy_window(host).unwrap();

        let destroy_surface = log.index_of("renderer.destroy_surface").unwrap();
        let destroy_window = log.index_of("platform.destroy_window").unwrap();
        assert!(destroy_surface < destroy_window);
    }
}
