#![forbid(unsafe_code)]

//! Inline styles the frontend sets on the elements it creates.
//!
//! Everything visual beyond these lives in the injected stylesheet.

/// CSS `display` value that hides an element.
pub const HIDDEN: &str = "none";

/// Inline style of a cache-warming image: hidden and 1x1.
pub const PRELOAD_IMAGE_STYLE: [(&str, &str); 3] =
    [("display", HIDDEN), ("width", "1px"), ("height", "1px")];

/// Pixel length for an inline style.
#[must_use]
pub fn px(value: i32) -> String {
    format!("{value}px")
}
