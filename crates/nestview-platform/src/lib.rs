//! # NestView Platform
//!
//! Adapter interfaces between the NestView lifecycle coordinator and the two
//! external window owners: the native platform surface and the rendering host.
//!
//! ## Design Goals
//!
//! 1. **Two handles, two owners**: the coordinator never owns a window object;
//!    it holds non-owning [`NativeHandle`] references into both adapters
//! 2. **Object safety**: both adapters are plain trait objects so the
//!    coordinator stays independent of any concrete windowing backend
//! 3. **Single-threaded**: adapters are driven from one cooperative scheduler
//!    and are not required to be `Send`
//!
//! The [`headless`] module provides an in-process implementation of both
//! traits with a recorded call log, used by the test suite and by embedders
//! that want a dry-run mode. On Windows, the [`win32`] module implements
//! [`PlatformSurface`] over real HWNDs.

pub mod geometry;
pub mod headless;
pub mod styles;
pub mod surface;

#[cfg(windows)]
pub mod win32;

pub use geometry::{Bounds, NativeHandle, SurfaceId};
pub use styles::{CornerPreference, PositionFlags, StyleMask};
pub use surface::{
    PlatformError, PlatformSurface, RenderError, RenderingHost, SurfaceConfig, SurfaceEvent,
    SurfaceEventCallback,
};
