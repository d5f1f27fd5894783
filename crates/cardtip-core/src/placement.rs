#![forbid(unsafe_code)]

//! Placement fitter: keep a floating panel inside the visible viewport.
//!
//! # Policy
//!
//! Applied once, in this order (no iteration):
//!
//! 1. **Horizontal flip**: if `x + width >= viewport_width - 15`, the panel
//!    moves to the left of the anchor: `x - width - 20`.
//! 2. **Top clamp**: if the panel starts above the scroll origin, it is pushed
//!    down to `scroll_y + 5`.
//! 3. **Bottom clamp**: evaluated on the result of rule 2; if the panel bottom
//!    passes the viewport bottom, it is pulled up by the overflow plus `5`.
//!
//! A panel larger than the viewport may stay partially off-screen at the
//! bottom or right. Horizontal scroll is not considered by rule 1.

use crate::geometry::{Point, Size};
use crate::viewport::ViewportCapabilities;

/// Distance from the right viewport edge at which the panel flips sides.
pub const FLIP_THRESHOLD: i32 = 15;

/// Gap between the anchor and the right edge of a flipped panel.
pub const FLIP_GAP: i32 = 20;

/// Padding kept between a clamped panel and the top/bottom viewport edge.
pub const EDGE_PADDING: i32 = 5;

/// Corrected top-left position for a panel of size `panel` anchored at
/// `anchor`.
#[must_use]
pub fn fit(anchor: Point, panel: Size, viewport: Size, scroll: Point) -> Point {
    let mut left = anchor.x;
    let mut top = anchor.y;

    if left.saturating_add(panel.width) >= viewport.width.saturating_sub(FLIP_THRESHOLD) {
        left = left.saturating_sub(panel.width).saturating_sub(FLIP_GAP);
    }

    if top.saturating_sub(scroll.y) < 0 {
        top = scroll.y.saturating_add(EDGE_PADDING);
    }

    let overflow = top
        .saturating_add(panel.height)
        .saturating_sub(scroll.y)
        .saturating_sub(viewport.height);
    if overflow > 0 {
        top = top.saturating_sub(overflow.saturating_add(EDGE_PADDING));
    }

    Point::new(left, top)
}

/// [`fit`] against live viewport measurements.
#[must_use]
pub fn fit_in(anchor: Point, panel: Size, caps: &dyn ViewportCapabilities) -> Point {
    fit(anchor, panel, caps.viewport_size(), caps.scroll_offsets())
}

/// Offset applied to the raw pointer before fitting, so the panel does not
/// sit directly under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorOffset {
    /// Pixels to the right of the pointer.
    pub dx: i32,
    /// The panel is lifted by `height / lift_divisor`. Zero disables lifting.
    pub lift_divisor: i32,
}

impl Default for CursorOffset {
    fn default() -> Self {
        Self {
            dx: 15,
            lift_divisor: 3,
        }
    }
}

impl CursorOffset {
    /// Desired (unfitted) anchor for a panel of `panel` size at `pointer`.
    #[must_use]
    pub fn anchor(&self, pointer: Point, panel: Size) -> Point {
        let lift = if self.lift_divisor > 0 {
            panel.height / self.lift_divisor
        } else {
            0
        };
        pointer.offset(self.dx, -lift)
    }
}
