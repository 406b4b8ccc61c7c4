//! Error types for the lifecycle coordinator and instance facade.

use std::fmt;

use nestview_platform::{PlatformError, RenderError};
use thiserror::Error;

/// The creation step that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreationStep {
    /// Configuration validation, before any handle exists.
    Validation,
    /// Creating the native host window.
    HostCreation,
    /// Creating the rendering surface.
    SurfaceCreation,
    /// Extracting the surface handle and reparenting it under the host.
    Embedding,
    /// Patching the surface's style bitmask to child/borderless.
    InitialStyle,
    /// Positioning the surface over the host's client area.
    InitialPosition,
    /// Starting or completing the initial content load.
    ContentLoad,
}

impl CreationStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreationStep::Validation => "validation",
            CreationStep::HostCreation => "host creation",
            CreationStep::SurfaceCreation => "surface creation",
            CreationStep::Embedding => "embedding",
            CreationStep::InitialStyle => "initial style patch",
            CreationStep::InitialPosition => "initial positioning",
            CreationStep::ContentLoad => "content load",
        }
    }
}

impl fmt::Display for CreationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structurally required creation step failed.
///
/// By the time this is returned, any handles created by earlier steps have
/// already been destroyed (surface before host).
#[derive(Error, Debug)]
#[error("window creation failed during {step}: {source}")]
pub struct CreationError {
    pub step: CreationStep,
    #[source]
    pub source: anyhow::Error,
}

impl CreationError {
    pub fn new(step: CreationStep, source: impl Into<anyhow::Error>) -> Self {
        Self {
            step,
            source: source.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            step: CreationStep::Validation,
            source: anyhow::anyhow!(message.into()),
        }
    }
}

/// A control operation on the instance facade failed.
#[derive(Error, Debug)]
pub enum ControlError {
    /// A mutating call was issued on a closed instance.
    #[error("window is closed")]
    WindowClosed,

    #[error(transparent)]
    Platform(#[from] PlatformError),

    #[error(transparent)]
    Render(#[from] RenderError),
}

/// Failures reported through the `on_error` callback channel.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The message pump drain failed; the window is torn down as if closed.
    #[error("message pump drain failed: {0}")]
    Poll(#[source] PlatformError),

    /// A caller-supplied callback panicked.
    #[error("callback panicked: {0}")]
    Callback(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creation_error_names_step() {
        let err = CreationError::new(
            CreationStep::SurfaceCreation,
            anyhow::anyhow!("backend exploded"),
        );
        let text = err.to_string();
        assert!(text.contains("surface creation"));
        assert_eq!(err.step, CreationStep::SurfaceCreation);
    }

    #[test]
    fn test_control_error_from_platform() {
        let err: ControlError = PlatformError::PumpUnavailable.into();
        assert!(matches!(err, ControlError::Platform(_)));
    }

    #[test]
    fn test_use_after_close_message() {
        assert_eq!(ControlError::WindowClosed.to_string(), "window is closed");
    }
}
