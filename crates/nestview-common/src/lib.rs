//! # NestView Common
//!
//! Shared logging configuration for the NestView embedding stack.

pub mod logging;

pub use logging::{init_logging, LogConfig, LogFormat};
