//! Handle and geometry types shared by both adapters.

/// Non-owning reference to a platform-owned window object.
///
/// The owning adapter controls the underlying object's lifetime; holders must
/// not use a handle after issuing a destroy call for it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeHandle(u64);

impl NativeHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw handle value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Unique identifier for a rendering-host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceId(u64);

impl SurfaceId {
    /// Allocate a new unique SurfaceId.
    pub fn next() -> Self {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw ID value.
    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// Rectangle representing window or surface bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Bounds at the origin with the given size.
    pub fn at_origin(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Same rectangle moved to a new position.
    pub fn moved_to(self, x: i32, y: i32) -> Self {
        Self { x, y, ..self }
    }

    /// Same rectangle with a new size.
    pub fn sized(self, width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surface_id_uniqueness() {
        let a = SurfaceId::next();
        let b = SurfaceId::next();
        assert_ne!(a, b);
    }

    #[test]
    fn test_bounds_helpers() {
        let bounds = Bounds::at_origin(800, 600);
        assert_eq!(bounds.x, 0);
        assert_eq!(bounds.width, 800);

        let moved = bounds.moved_to(10, 20);
        assert_eq!(moved.x, 10);
        assert_eq!(moved.y, 20);
        assert_eq!(moved.width, 800);

        let sized = moved.sized(1024, 768);
        assert_eq!(sized.x, 10);
        assert_eq!(sized.height, 768);
    }
}
