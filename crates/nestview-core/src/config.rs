//! Construction options for an embedded window.

use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use nestview_platform::{NativeHandle, StyleMask};
use url::Url;

use crate::error::{CreationError, RuntimeError};
use crate::instance::WindowInstance;

/// A light/dark color scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorScheme {
    Dark,
    Light,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Dark => "dark",
            ColorScheme::Light => "light",
        }
    }
}

/// Theme selection for the composite window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Theme {
    /// Dark host titlebar.
    Dark,
    /// Light host titlebar.
    Light,
    /// Independent host-chrome and in-content schemes.
    Split {
        titlebar: Option<ColorScheme>,
        content: Option<ColorScheme>,
    },
}

impl Theme {
    /// The scheme to apply to the host titlebar, if any.
    pub fn titlebar(&self) -> Option<ColorScheme> {
        match self {
            Theme::Dark => Some(ColorScheme::Dark),
            Theme::Light => Some(ColorScheme::Light),
            Theme::Split { titlebar, .. } => *titlebar,
        }
    }

    /// The scheme to inject into loaded content, if any.
    pub fn content(&self) -> Option<ColorScheme> {
        match self {
            Theme::Dark | Theme::Light => None,
            Theme::Split { content, .. } => *content,
        }
    }
}

/// Rendering-host configuration passthrough.
///
/// The coordinator forces `content_isolation = true` and
/// `host_scripting = false` when embedding, regardless of these values;
/// weakened settings are logged and ignored.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceOptions {
    pub content_isolation: bool,
    pub host_scripting: bool,
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            content_isolation: true,
            host_scripting: false,
        }
    }
}

/// Callback invoked once both native handles exist, for adapter-specific
/// tuning. Receives `(host, surface)` handles.
pub type TuneNativeCallback = Box<dyn FnOnce(NativeHandle, NativeHandle)>;

/// Construction options for [`create`](crate::coordinator::create).
pub struct WindowConfig {
    /// Initial size of both surfaces.
    pub width: u32,
    pub height: u32,
    /// Initial position; `center` overrides x/y once content is shown.
    pub x: Option<i32>,
    pub y: Option<i32>,
    pub center: bool,
    /// Content loaded into the rendering surface.
    pub url: String,
    /// Host window title text.
    pub title: Option<String>,
    /// Host window system-menu/icon visibility.
    pub show_icon: bool,
    /// Host titlebar and/or content theme.
    pub theme: Option<Theme>,
    /// Poll-loop cadence in ticks per second.
    pub frame_rate: u32,
    /// Host window style deltas applied post-creation.
    pub native_styles_add: StyleMask,
    pub native_styles_remove: StyleMask,
    pub native_ex_styles_add: StyleMask,
    pub native_ex_styles_remove: StyleMask,
    /// Rendering-host configuration passthrough.
    pub surface: SurfaceOptions,
    /// Invoked exactly once after teardown completes.
    pub on_close: Option<Rc<dyn Fn()>>,
    /// Invoked once the instance reaches Ready.
    pub on_ready: Option<Rc<dyn Fn(WindowInstance)>>,
    /// Receives runtime failures (poll loop, callback panics).
    pub on_error: Option<Rc<dyn Fn(&RuntimeError)>>,
    /// Adapter-specific tuning with both raw handles.
    pub tune_native: Option<TuneNativeCallback>,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            x: None,
            y: None,
            center: false,
            url: "about:blank".to_string(),
            title: None,
            show_icon: true,
            theme: None,
            frame_rate: 60,
            native_styles_add: StyleMask::NONE,
            native_styles_remove: StyleMask::NONE,
            native_ex_styles_add: StyleMask::NONE,
            native_ex_styles_remove: StyleMask::NONE,
            surface: SurfaceOptions::default(),
            on_close: None,
            on_ready: None,
            on_error: None,
            tune_native: None,
        }
    }
}

impl WindowConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn with_position(mut self, x: i32, y: i32) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    pub fn centered(mut self) -> Self {
        self.center = true;
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_icon_visible(mut self, visible: bool) -> Self {
        self.show_icon = visible;
        self
    }

    pub fn with_theme(mut self, theme: Theme) -> Self {
        self.theme = Some(theme);
        self
    }

    pub fn with_frame_rate(mut self, frame_rate: u32) -> Self {
        self.frame_rate = frame_rate;
        self
    }

    pub fn with_native_styles(mut self, add: StyleMask, remove: StyleMask) -> Self {
        self.native_styles_add = add;
        self.native_styles_remove = remove;
        self
    }

    pub fn with_native_ex_styles(mut self, add: StyleMask, remove: StyleMask) -> Self {
        self.native_ex_styles_add = add;
        self.native_ex_styles_remove = remove;
        self
    }

    pub fn with_surface_options(mut self, options: SurfaceOptions) -> Self {
        self.surface = options;
        self
    }

    pub fn on_close(mut self, callback: impl Fn() + 'static) -> Self {
        self.on_close = Some(Rc::new(callback));
        self
    }

    pub fn on_ready(mut self, callback: impl Fn(WindowInstance) + 'static) -> Self {
        self.on_ready = Some(Rc::new(callback));
        self
    }

    pub fn on_error(mut self, callback: impl Fn(&RuntimeError) + 'static) -> Self {
        self.on_error = Some(Rc::new(callback));
        self
    }

    pub fn tune_native(
        mut self,
        callback: impl FnOnce(NativeHandle, NativeHandle) + 'static,
    ) -> Self {
        self.tune_native = Some(Box::new(callback));
        self
    }

    /// The poll-loop tick period.
    pub fn poll_period(&self) -> Duration {
        Duration::from_millis(((1000 / self.frame_rate.max(1)) as u64).max(1))
    }

    pub(crate) fn validate(&self) -> Result<(), CreationError> {
        if self.width == 0 || self.height == 0 {
            return Err(CreationError::validation(format!(
                "window size must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if self.frame_rate == 0 {
            return Err(CreationError::validation("frame_rate must be at least 1"));
        }
        Url::parse(&self.url)
            .map_err(|e| CreationError::validation(format!("invalid url {:?}: {}", self.url, e)))?;
        Ok(())
    }
}

impl fmt::Debug for WindowConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WindowConfig")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("x", &self.x)
            .field("y", &self.y)
            .field("center", &self.center)
            .field("url", &self.url)
            .field("title", &self.title)
            .field("show_icon", &self.show_icon)
            .field("theme", &self.theme)
            .field("frame_rate", &self.frame_rate)
            .field("native_styles_add", &self.native_styles_add)
            .field("native_styles_remove", &self.native_styles_remove)
            .field("native_ex_styles_add", &self.native_ex_styles_add)
            .field("native_ex_styles_remove", &self.native_ex_styles_remove)
            .field("surface", &self.surface)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CreationStep;

    #[test]
    fn test_defaults() {
        let config = WindowConfig::default();
        assert_eq!((config.width, config.height), (800, 600));
        assert_eq!(config.url, "about:blank");
        assert_eq!(config.frame_rate, 60);
        assert!(config.show_icon);
        assert!(!config.center);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_poll_period() {
        let config = WindowConfig::default().with_frame_rate(60);
        assert_eq!(config.poll_period(), Duration::from_millis(16));

        let slow = WindowConfig::default().with_frame_rate(4);
        assert_eq!(slow.poll_period(), Duration::from_millis(250));
    }

    #[test]
    fn test_validate_rejects_zero_size() {
        let config = WindowConfig::default().with_size(0, 600);
        let err = config.validate().unwrap_err();
        assert_eq!(err.step, CreationStep::Validation);
    }

    #[test]
    fn test_validate_rejects_zero_frame_rate() {
        let config = WindowConfig::default().with_frame_rate(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = WindowConfig::default().with_url("not a url at all");
        let err = config.validate().unwrap_err();
        assert_eq!(err.step, CreationStep::Validation);
    }

    #[test]
    fn test_theme_scheme_extraction() {
        assert_eq!(Theme::Dark.titlebar(), Some(ColorScheme::Dark));
        assert_eq!(Theme::Dark.content(), None);

        let split = Theme::Split {
            titlebar: Some(ColorScheme::Dark),
            content: Some(ColorScheme::Light),
        };
        assert_eq!(split.titlebar(), Some(ColorScheme::Dark));
        assert_eq!(split.content(), Some(ColorScheme::Light));
    }
}
