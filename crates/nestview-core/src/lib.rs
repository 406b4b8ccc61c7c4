//! # NestView Core
//!
//! Lifecycle coordinator that embeds a web-content rendering surface inside
//! a host-owned native window. Two window objects with different owners live
//! underneath every instance; this crate sequences their creation, reparents
//! the surface as a borderless child, keeps their geometry in sync, drains
//! the native message queue on a timer, and tears both down in the one order
//! the platform tolerates.
//!
//! ## Design Goals
//!
//! 1. **No flash of an unparented window**: the surface is created hidden
//!    and shown only after parenting, style patching, and the initial load
//! 2. **Single teardown path**: explicit close, window-manager close
//!    requests, poll failures, and app quit all funnel through one
//!    idempotent routine that destroys the surface before the host
//! 3. **Adapter seams**: all native calls go through the
//!    [`PlatformSurface`](nestview_platform::PlatformSurface) and
//!    [`RenderingHost`](nestview_platform::RenderingHost) traits, so the
//!    whole lifecycle runs under test against in-memory adapters
//!
//! Everything is single-threaded and cooperative: [`create`] must run
//! inside a [`tokio::task::LocalSet`] on a current-thread runtime.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod events;
pub mod instance;

pub use config::{ColorScheme, SurfaceOptions, Theme, TuneNativeCallback, WindowConfig};
pub use coordinator::{create, shutdown_all, CloseReason, EmbeddingRelation, LifecycleState};
pub use error::{ControlError, CreationError, CreationStep, RuntimeError};
pub use events::{EventKind, ObserverCallback, ObserverRegistry, WindowEvent};
pub use instance::WindowInstance;

pub use nestview_common::{init_logging, LogConfig, LogFormat};
pub use nestview_platform::{
    Bounds, CornerPreference, NativeHandle, PlatformSurface, PositionFlags, RenderingHost,
    StyleMask, SurfaceId,
};
