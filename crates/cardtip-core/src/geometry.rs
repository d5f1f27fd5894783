#![forbid(unsafe_code)]

//! Geometric primitives in document pixel coordinates.
//!
//! Coordinates are signed: a panel flipped to the left of a pointer near the
//! left edge can legitimately end up at a negative `x`.

/// A point in document coordinates (origin at the top-left of the page, not
/// of the viewport).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    /// Horizontal offset in pixels.
    pub x: i32,
    /// Vertical offset in pixels.
    pub y: i32,
}

impl Point {
    /// The origin.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a new point.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate by `(dx, dy)`, saturating at the `i32` bounds.
    #[inline]
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self::new(self.x.saturating_add(dx), self.y.saturating_add(dy))
    }

    /// Build a point from host-reported floating point coordinates.
    ///
    /// Non-finite values collapse to `0`; everything else is rounded to the
    /// nearest pixel and clamped into `i32`.
    #[must_use]
    pub fn from_f64(x: f64, y: f64) -> Self {
        Self::new(px_from_f64(x), px_from_f64(y))
    }
}

/// Width and height in pixels.
///
/// Sizes come from layout measurements and are never negative in practice;
/// they are signed so they compose with [`Point`] arithmetic without casts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    /// Width in pixels.
    pub width: i32,
    /// Height in pixels.
    pub height: i32,
}

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0, 0);

    /// Create a new size.
    #[inline]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Convert a host-reported coordinate to whole pixels.
#[inline]
pub(crate) fn px_from_f64(value: f64) -> i32 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}
