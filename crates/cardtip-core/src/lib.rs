#![forbid(unsafe_code)]

//! Core: viewport geometry, placement fitting, tooltip lifecycle, and the
//! debounced hover controller.
//!
//! Everything in this crate is host-driven and deterministic. The embedding
//! environment (a browser frontend, or the in-memory [`harness`] in tests)
//! pushes pointer events, supplies a monotonic clock, and implements the
//! [`panel::Panel`] surface that actually draws.

pub mod assets;
pub mod config;
pub mod content;
pub mod controller;
pub mod error;
pub mod geometry;
pub mod harness;
pub mod instance;
pub mod logging;
pub mod panel;
pub mod pending;
pub mod placement;
pub mod viewport;

pub use config::HoverConfig;
pub use controller::{HoverController, HoverElement, HoverHost, Lifecycle};
pub use error::CardtipError;
pub use geometry::{Point, Size};
pub use instance::{ShowOutcome, TooltipInstance, TooltipKind, TooltipState};

// Re-export tracing macros at crate root for ergonomic use.
#[cfg(feature = "tracing")]
pub use logging::{debug, error, info, trace, warn};
