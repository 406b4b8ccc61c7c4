//! Window style bitmasks and position-update flags.
//!
//! The values mirror the Win32 WS_* / SWP_* constants because that is the
//! platform where embedding by style patching matters; non-Windows adapters
//! are free to interpret them loosely or ignore them.

use std::fmt;
use std::ops::{BitOr, BitOrAssign};

/// A set of window style bits (child vs. top-level, borders, system menu).
#[derive(Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct StyleMask(u32);

impl StyleMask {
    pub const NONE: StyleMask = StyleMask(0);
    /// Renders as a child of its parent window.
    pub const CHILD: StyleMask = StyleMask(0x4000_0000);
    /// Borderless pop-up window.
    pub const POPUP: StyleMask = StyleMask(0x8000_0000);
    /// Standard decorated top-level window (caption, borders, system menu).
    pub const OVERLAPPED_WINDOW: StyleMask = StyleMask(0x00CF_0000);
    /// System menu and icon.
    pub const SYSMENU: StyleMask = StyleMask(0x0008_0000);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(&self, other: StyleMask) -> bool {
        self.0 & other.0 == other.0
    }

    #[must_use]
    pub const fn with(self, other: StyleMask) -> Self {
        Self(self.0 | other.0)
    }

    #[must_use]
    pub const fn without(self, other: StyleMask) -> Self {
        Self(self.0 & !other.0)
    }
}

impl BitOr for StyleMask {
    type Output = StyleMask;

    fn bitor(self, rhs: StyleMask) -> StyleMask {
        StyleMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for StyleMask {
    fn bitor_assign(&mut self, rhs: StyleMask) {
        self.0 |= rhs.0;
    }
}

impl fmt::Debug for StyleMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StyleMask({:#010x})", self.0)
    }
}

/// Flags for a position/size/z-order update.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct PositionFlags(u32);

impl PositionFlags {
    pub const NONE: PositionFlags = PositionFlags(0);
    /// Keep the current size.
    pub const NO_SIZE: PositionFlags = PositionFlags(0x0001);
    /// Keep the current position.
    pub const NO_MOVE: PositionFlags = PositionFlags(0x0002);
    /// Keep the current z-order.
    pub const NO_ZORDER: PositionFlags = PositionFlags(0x0004);
    /// Do not activate the window.
    pub const NO_ACTIVATE: PositionFlags = PositionFlags(0x0010);
    /// Force the platform to recompute decoration metrics.
    pub const FRAME_CHANGED: PositionFlags = PositionFlags(0x0020);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(&self) -> u32 {
        self.0
    }

    pub const fn contains(&self, other: PositionFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for PositionFlags {
    type Output = PositionFlags;

    fn bitor(self, rhs: PositionFlags) -> PositionFlags {
        PositionFlags(self.0 | rhs.0)
    }
}

impl fmt::Debug for PositionFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PositionFlags({:#06x})", self.0)
    }
}

/// Corner rounding preference for the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CornerPreference {
    /// Let the platform decide.
    #[default]
    Default,
    /// Never round corners.
    DoNotRound,
    /// Round corners if appropriate.
    Round,
    /// Round corners with a small radius.
    RoundSmall,
}

impl CornerPreference {
    /// Raw DWM attribute value.
    pub fn raw(&self) -> u32 {
        match self {
            CornerPreference::Default => 0,
            CornerPreference::DoNotRound => 1,
            CornerPreference::Round => 2,
            CornerPreference::RoundSmall => 3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_mask_ops() {
        let styles = StyleMask::CHILD | StyleMask::SYSMENU;
        assert!(styles.contains(StyleMask::CHILD));
        assert!(styles.contains(StyleMask::SYSMENU));
        assert!(!styles.contains(StyleMask::POPUP));

        let trimmed = styles.without(StyleMask::SYSMENU);
        assert!(trimmed.contains(StyleMask::CHILD));
        assert!(!trimmed.contains(StyleMask::SYSMENU));
    }

    #[test]
    fn test_style_mask_empty() {
        assert!(StyleMask::NONE.is_empty());
        assert!(!StyleMask::CHILD.is_empty());
        assert!(StyleMask::default().is_empty());
    }

    #[test]
    fn test_position_flags() {
        let flags = PositionFlags::NO_ZORDER | PositionFlags::FRAME_CHANGED;
        assert!(flags.contains(PositionFlags::NO_ZORDER));
        assert!(flags.contains(PositionFlags::FRAME_CHANGED));
        assert!(!flags.contains(PositionFlags::NO_MOVE));
    }

    #[test]
    fn test_corner_preference_raw() {
        assert_eq!(CornerPreference::Default.raw(), 0);
        assert_eq!(CornerPreference::DoNotRound.raw(), 1);
        assert_eq!(CornerPreference::Round.raw(), 2);
        assert_eq!(CornerPreference::RoundSmall.raw(), 3);
    }
}
