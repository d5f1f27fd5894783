#![forbid(unsafe_code)]

//! Pointer event field extraction, independent of the JS binding.
//!
//! The wasm layer reads event fields through `Reflect`; the functions here
//! take a field lookup closure so the same rules apply to any source of
//! event data. Missing or non-numeric fields read as `None`, which the
//! core's pointer resolution treats as zero.

use cardtip_core::viewport::{PointerCoords, PointerSample};

/// Event field names, in the order they are read.
pub const PAGE_X: &str = "pageX";
pub const PAGE_Y: &str = "pageY";
pub const CLIENT_X: &str = "clientX";
pub const CLIENT_Y: &str = "clientY";

/// Document events the frontend listens to, in attach order.
pub const LISTENED_EVENTS: [&str; 4] = ["pointerover", "pointermove", "pointerout", "click"];

/// Coordinates of one event or touch point.
pub fn coords_from<F>(field: F) -> PointerCoords
where
    F: Fn(&str) -> Option<f64>,
{
    PointerCoords {
        page_x: field(PAGE_X),
        page_y: field(PAGE_Y),
        client_x: field(CLIENT_X),
        client_y: field(CLIENT_Y),
    }
}

/// Full sample: the event's own coordinates plus any touch points.
pub fn sample_from<F>(field: F, touches: Vec<PointerCoords>) -> PointerSample
where
    F: Fn(&str) -> Option<f64>,
{
    PointerSample {
        primary: coords_from(field),
        touches,
    }
}
