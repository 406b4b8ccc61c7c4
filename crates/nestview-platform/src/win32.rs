//! Win32 implementation of [`PlatformSurface`].
//!
//! Hosts are plain top-level HWNDs with a window class registered once per
//! process. The message pump is a non-blocking `PeekMessageW` drain; WM_CLOSE
//! is intercepted in the window procedure and routed to the registered
//! close-request callback instead of destroying the window, so the lifecycle
//! coordinator stays in charge of teardown order.

#![allow(clippy::missing_safety_doc)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace, warn};
use windows::{
    core::{w, PCWSTR},
    Win32::{
        Foundation::{COLORREF, HWND, LPARAM, LRESULT, WPARAM},
        Graphics::{
            Dwm::{
                DwmSetWindowAttribute, DWMWA_CAPTION_COLOR, DWMWA_TEXT_COLOR,
                DWMWA_USE_IMMERSIVE_DARK_MODE, DWMWA_WINDOW_CORNER_PREFERENCE,
            },
            Gdi::HBRUSH,
        },
        System::LibraryLoader::GetModuleHandleW,
        UI::{
            HiDpi::{
                GetDpiForWindow, SetProcessDpiAwarenessContext,
                DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2,
            },
            Input::KeyboardAndMouse::SetFocus,
            WindowsAndMessaging::*,
        },
    },
};

use crate::geometry::{Bounds, NativeHandle};
use crate::styles::{CornerPreference, PositionFlags, StyleMask};
use crate::surface::{PlatformError, PlatformSurface};

thread_local! {
    // Close-request callbacks, keyed by HWND. Looked up from the window
    // procedure, which runs on the same thread as the pump.
    static CLOSE_CALLBACKS: RefCell<HashMap<isize, Rc<dyn Fn()>>> =
        RefCell::new(HashMap::new());
}

fn to_hwnd(handle: NativeHandle) -> HWND {
    HWND(handle.raw() as usize as *mut core::ffi::c_void)
}

fn from_hwnd(hwnd: HWND) -> NativeHandle {
    NativeHandle::new(hwnd.0 as usize as u64)
}

fn api_err(e: windows::core::Error) -> PlatformError {
    PlatformError::Call(e.into())
}

/// Platform surface adapter over real Win32 windows.
pub struct Win32Platform {
    // host HWND -> embedded child HWND, for introspection only
    attached_children: RefCell<HashMap<isize, isize>>,
}

impl Win32Platform {
    pub fn new() -> Self {
        unsafe {
            // Per-monitor DPI awareness; failure means it was already set.
            let _ = SetProcessDpiAwarenessContext(DPI_AWARENESS_CONTEXT_PER_MONITOR_AWARE_V2);
        }
        Self {
            attached_children: RefCell::new(HashMap::new()),
        }
    }

    /// The embedded child recorded for a host window, if any.
    pub fn attached_child(&self, host: NativeHandle) -> Option<NativeHandle> {
        self.attached_children
            .borrow()
            .get(&(host.raw() as isize))
            .map(|raw| NativeHandle::new(*raw as u64))
    }

    fn register_class() -> PCWSTR {
        use std::sync::Once;
        static REGISTER: Once = Once::new();

        let class_name = w!("NestViewHost");
        REGISTER.call_once(|| unsafe {
            let wc = WNDCLASSEXW {
                cbSize: std::mem::size_of::<WNDCLASSEXW>() as u32,
                style: CS_HREDRAW | CS_VREDRAW,
                lpfnWndProc: Some(Self::wnd_proc),
                cbClsExtra: 0,
                cbWndExtra: 0,
                hInstance: GetModuleHandleW(None).unwrap_or_default().into(),
                hIcon: HICON::default(),
                hCursor: LoadCursorW(None, IDC_ARROW).unwrap_or_default(),
                hbrBackground: HBRUSH::default(),
                lpszMenuName: PCWSTR::null(),
                lpszClassName: class_name,
                hIconSm: HICON::default(),
            };
            let _ = RegisterClassExW(&wc);
        });
        class_name
    }

    unsafe extern "system" fn wnd_proc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        match msg {
            WM_CLOSE => {
                let callback = CLOSE_CALLBACKS
                    .with(|map| map.borrow().get(&(hwnd.0 as isize)).cloned());
                if let Some(callback) = callback {
                    trace!(?hwnd, "WM_CLOSE routed to close-request callback");
                    callback();
                    // The coordinator decides when the window actually dies.
                    return LRESULT(0);
                }
            }
            WM_DESTROY => {
                trace!(?hwnd, "WM_DESTROY");
            }
            WM_ERASEBKGND => {
                // The embedded surface covers the client area.
                return LRESULT(1);
            }
            _ => {}
        }
        DefWindowProcW(hwnd, msg, wparam, lparam)
    }

    fn patch_long(&self, handle: NativeHandle, index: WINDOW_LONG_PTR_INDEX, add: StyleMask, remove: StyleMask) {
        unsafe {
            let hwnd = to_hwnd(handle);
            let current = GetWindowLongPtrW(hwnd, index) as u32;
            let next = StyleMask::from_bits(current).with(add).without(remove);
            SetWindowLongPtrW(hwnd, index, next.bits() as isize);
        }
    }
}

impl Default for Win32Platform {
    fn default() -> Self {
        Self::new()
    }
}

impl PlatformSurface for Win32Platform {
    fn create_window(&self, width: u32, height: u32) -> Result<NativeHandle, PlatformError> {
        if width == 0 || height == 0 {
            return Err(PlatformError::WindowCreation(format!(
                "degenerate size {}x{}",
                width, height
            )));
        }

        let class_name = Self::register_class();
        let hwnd = unsafe {
            CreateWindowExW(
                WINDOW_EX_STYLE(0),
                class_name,
                PCWSTR::null(),
                WS_OVERLAPPEDWINDOW | WS_CLIPCHILDREN | WS_CLIPSIBLINGS,
                CW_USEDEFAULT,
                CW_USEDEFAULT,
                width as i32,
                height as i32,
                None,
                None,
                GetModuleHandleW(None).unwrap_or_default(),
                None,
            )
        }
        .map_err(|e| PlatformError::WindowCreation(e.to_string()))?;

        if hwnd.0.is_null() {
            let err = std::io::Error::last_os_error();
            return Err(PlatformError::WindowCreation(err.to_string()));
        }

        debug!(?hwnd, width, height, "host window created");
        Ok(from_hwnd(hwnd))
    }

    fn destroy_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        CLOSE_CALLBACKS.with(|map| {
            map.borrow_mut().remove(&(handle.raw() as isize));
        });
        self.attached_children
            .borrow_mut()
            .remove(&(handle.raw() as isize));
        unsafe { DestroyWindow(to_hwnd(handle)) }.map_err(api_err)?;
        debug!(handle = handle.raw(), "host window destroyed");
        Ok(())
    }

    fn show_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_SHOW);
        }
        Ok(())
    }

    fn hide_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_HIDE);
        }
        Ok(())
    }

    fn focus_window(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = SetForegroundWindow(to_hwnd(handle));
            let _ = SetFocus(to_hwnd(handle));
        }
        Ok(())
    }

    fn minimize(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_MINIMIZE);
        }
        Ok(())
    }

    fn maximize(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_MAXIMIZE);
        }
        Ok(())
    }

    fn restore(&self, handle: NativeHandle) -> Result<(), PlatformError> {
        unsafe {
            let _ = ShowWindow(to_hwnd(handle), SW_RESTORE);
        }
        Ok(())
    }

    fn set_parent(&self, child: NativeHandle, parent: NativeHandle) -> Result<(), PlatformError> {
        unsafe { SetParent(to_hwnd(child), to_hwnd(parent)) }.map_err(api_err)?;
        debug!(child = child.raw(), parent = parent.raw(), "reparented");
        Ok(())
    }

    fn attach_child(&self, host: NativeHandle, child: NativeHandle) -> Result<(), PlatformError> {
        self.attached_children
            .borrow_mut()
            .insert(host.raw() as isize, child.raw() as isize);
        Ok(())
    }

    fn set_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError> {
        self.patch_long(handle, GWL_STYLE, add, remove);
        Ok(())
    }

    fn set_ex_styles(
        &self,
        handle: NativeHandle,
        add: StyleMask,
        remove: StyleMask,
    ) -> Result<(), PlatformError> {
        self.patch_long(handle, GWL_EXSTYLE, add, remove);
        Ok(())
    }

    fn set_position(
        &self,
        handle: NativeHandle,
        bounds: Bounds,
        flags: PositionFlags,
    ) -> Result<(), PlatformError> {
        unsafe {
            SetWindowPos(
                to_hwnd(handle),
                None,
                bounds.x,
                bounds.y,
                bounds.width as i32,
                bounds.height as i32,
                SET_WINDOW_POS_FLAGS(flags.bits()),
            )
        }
        .map_err(api_err)
    }

    fn set_title(&self, handle: NativeHandle, title: &str) -> Result<(), PlatformError> {
        let wide: Vec<u16> = title.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe { SetWindowTextW(to_hwnd(handle), PCWSTR::from_raw(wide.as_ptr())) }
            .map_err(api_err)
    }

    fn set_icon_visible(&self, handle: NativeHandle, visible: bool) -> Result<(), PlatformError> {
        if visible {
            self.patch_long(handle, GWL_STYLE, StyleMask::SYSMENU, StyleMask::NONE);
        } else {
            self.patch_long(handle, GWL_STYLE, StyleMask::NONE, StyleMask::SYSMENU);
        }
        // Frame nudge so the non-client area is recomputed.
        self.set_position(
            handle,
            Bounds::zero(),
            PositionFlags::NO_MOVE
                | PositionFlags::NO_SIZE
                | PositionFlags::NO_ZORDER
                | PositionFlags::FRAME_CHANGED,
        )
    }

    fn set_dark_mode(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError> {
        let value: i32 = if enabled { 1 } else { 0 };
        unsafe {
            DwmSetWindowAttribute(
                to_hwnd(handle),
                DWMWA_USE_IMMERSIVE_DARK_MODE,
                &value as *const _ as *const core::ffi::c_void,
                std::mem::size_of::<i32>() as u32,
            )
        }
        .map_err(api_err)
    }

    fn set_titlebar_color(&self, handle: NativeHandle, color: u32) -> Result<(), PlatformError> {
        let value = COLORREF(color);
        unsafe {
            DwmSetWindowAttribute(
                to_hwnd(handle),
                DWMWA_CAPTION_COLOR,
                &value as *const _ as *const core::ffi::c_void,
                std::mem::size_of::<COLORREF>() as u32,
            )
        }
        .map_err(api_err)
    }

    fn set_titlebar_colors(
        &self,
        handle: NativeHandle,
        background: u32,
        text: u32,
    ) -> Result<(), PlatformError> {
        self.set_titlebar_color(handle, background)?;
        let value = COLORREF(text);
        unsafe {
            DwmSetWindowAttribute(
                to_hwnd(handle),
                DWMWA_TEXT_COLOR,
                &value as *const _ as *const core::ffi::c_void,
                std::mem::size_of::<COLORREF>() as u32,
            )
        }
        .map_err(api_err)
    }

    fn set_corner_preference(
        &self,
        handle: NativeHandle,
        preference: CornerPreference,
    ) -> Result<(), PlatformError> {
        let value: i32 = preference.raw() as i32;
        unsafe {
            DwmSetWindowAttribute(
                to_hwnd(handle),
                DWMWA_WINDOW_CORNER_PREFERENCE,
                &value as *const _ as *const core::ffi::c_void,
                std::mem::size_of::<i32>() as u32,
            )
        }
        .map_err(api_err)
    }

    fn set_opacity(&self, handle: NativeHandle, opacity: f64) -> Result<(), PlatformError> {
        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;
        self.patch_long(
            handle,
            GWL_EXSTYLE,
            StyleMask::from_bits(WS_EX_LAYERED.0),
            StyleMask::NONE,
        );
        unsafe {
            SetLayeredWindowAttributes(to_hwnd(handle), COLORREF(0), alpha, LWA_ALPHA)
        }
        .map_err(api_err)
    }

    fn set_always_on_top(&self, handle: NativeHandle, enabled: bool) -> Result<(), PlatformError> {
        let insert_after = if enabled { HWND_TOPMOST } else { HWND_NOTOPMOST };
        unsafe {
            SetWindowPos(
                to_hwnd(handle),
                insert_after,
                0,
                0,
                0,
                0,
                SWP_NOMOVE | SWP_NOSIZE | SWP_NOACTIVATE,
            )
        }
        .map_err(api_err)
    }

    fn flash(&self, handle: NativeHandle, continuous: bool) -> Result<(), PlatformError> {
        let info = FLASHWINFO {
            cbSize: std::mem::size_of::<FLASHWINFO>() as u32,
            hwnd: to_hwnd(handle),
            dwFlags: if continuous {
                FLASHW_ALL | FLASHW_TIMERNOFG
            } else {
                FLASHW_ALL
            },
            uCount: if continuous { 0 } else { 3 },
            dwTimeout: 0,
        };
        unsafe {
            let _ = FlashWindowEx(&info);
        }
        Ok(())
    }

    fn dpi(&self, handle: NativeHandle) -> Result<u32, PlatformError> {
        let dpi = unsafe { GetDpiForWindow(to_hwnd(handle)) };
        if dpi == 0 {
            return Err(PlatformError::InvalidHandle(handle));
        }
        Ok(dpi)
    }

    fn scale_factor(&self, handle: NativeHandle) -> Result<f64, PlatformError> {
        Ok(self.dpi(handle)? as f64 / 96.0)
    }

    fn is_visible(&self, handle: NativeHandle) -> Result<bool, PlatformError> {
        Ok(unsafe { IsWindowVisible(to_hwnd(handle)) }.as_bool())
    }

    fn is_focused(&self, handle: NativeHandle) -> Result<bool, PlatformError> {
        Ok(unsafe { GetForegroundWindow() } == to_hwnd(handle))
    }

    fn poll_events(&self) -> Result<(), PlatformError> {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    warn!("WM_QUIT during drain, pump is shutting down");
                    return Err(PlatformError::PumpUnavailable);
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        Ok(())
    }

    fn on_close_requested(
        &self,
        handle: NativeHandle,
        callback: Box<dyn Fn()>,
    ) -> Result<(), PlatformError> {
        CLOSE_CALLBACKS.with(|map| {
            map.borrow_mut()
                .insert(handle.raw() as isize, Rc::from(callback));
        });
        Ok(())
    }
}
