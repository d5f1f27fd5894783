#![forbid(unsafe_code)]

//! In-memory host for driving the controller without a browser.
//!
//! Mirrors what the web frontend does, but records instead of drawing:
//! panels keep their body/visibility/position, the host logs wake-up requests
//! and load requests, and time comes from a [`SimClock`] the test advances.
//!
//! ```
//! use cardtip_core::harness::{MemoryElement, MemoryHost, SimClock};
//! use cardtip_core::{HoverConfig, HoverController, Point, TooltipKind};
//!
//! let mut host = MemoryHost::new(1024, 768);
//! let mut clock = SimClock::new();
//! let mut controller = HoverController::new(HoverConfig::default());
//! controller.enable().unwrap();
//!
//! let card = MemoryElement::card(1, "Lightning Bolt");
//! controller.pointer_enter(&mut host, &card, Point::new(40, 300), clock.now());
//! clock.advance_ms(200);
//! controller.advance(&mut host, clock.now());
//! assert_eq!(host.fetch_count("Lightning Bolt"), 1);
//! assert!(controller.instance(TooltipKind::Image).unwrap().is_displayed());
//! ```

use core::time::Duration;
use std::cell::Cell;
use std::rc::Rc;

use crate::content::{LoadRequest, SourceKey};
use crate::controller::{HoverElement, HoverHost};
use crate::geometry::{Point, Size};
use crate::instance::TooltipKind;
use crate::panel::{Panel, PanelBody};
use crate::viewport::FixedViewport;

/// Deterministic monotonic clock controlled by the test.
#[derive(Debug, Default, Clone, Copy)]
pub struct SimClock {
    now: Duration,
}

impl SimClock {
    /// Clock starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
        }
    }

    #[must_use]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Advance by `dt`, saturating.
    pub fn advance(&mut self, dt: Duration) {
        self.now = self.now.saturating_add(dt);
    }

    /// Advance by `ms` milliseconds.
    pub fn advance_ms(&mut self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

/// Stand-in for a loaded image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryImage {
    pub name: String,
    pub size: Size,
}

impl MemoryImage {
    #[must_use]
    pub fn new(name: impl Into<String>, size: Size) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// What a [`MemoryPanel`] currently shows.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum MemoryBody {
    #[default]
    Empty,
    Placeholder(&'static str),
    Image(MemoryImage),
    Markup(String),
}

/// Recording panel.
///
/// Measured size follows the body: images report their own size,
/// placeholders a fixed small box, markup the natural table width (or the
/// explicit width, once set) by a fixed height.
#[derive(Debug, Clone)]
pub struct MemoryPanel {
    kind: TooltipKind,
    body: MemoryBody,
    visible: bool,
    position: Option<Point>,
    width: Option<i32>,
    placeholder_size: Size,
    natural_body_width: i32,
    markup_height: i32,
    renders: usize,
    detached: Rc<Cell<bool>>,
}

impl MemoryPanel {
    #[must_use]
    pub fn new(kind: TooltipKind) -> Self {
        Self {
            kind,
            body: MemoryBody::Empty,
            visible: false,
            position: None,
            width: None,
            placeholder_size: Size::new(80, 20),
            natural_body_width: 200,
            markup_height: 60,
            renders: 0,
            detached: Rc::new(Cell::new(false)),
        }
    }

    #[must_use]
    pub fn kind(&self) -> TooltipKind {
        self.kind
    }

    #[must_use]
    pub fn body(&self) -> &MemoryBody {
        &self.body
    }

    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Last position set, `None` if never placed.
    #[must_use]
    pub fn position(&self) -> Option<Point> {
        self.position
    }

    /// Explicit width, if any.
    #[must_use]
    pub fn width(&self) -> Option<i32> {
        self.width
    }

    /// How many times the body was replaced.
    #[must_use]
    pub fn render_count(&self) -> usize {
        self.renders
    }

    /// Flag flipped when the panel is detached.
    #[must_use]
    pub fn detached_flag(&self) -> Rc<Cell<bool>> {
        Rc::clone(&self.detached)
    }

    /// Width the text table reports when measured.
    pub fn set_natural_body_width(&mut self, width: i32) {
        self.natural_body_width = width;
    }
}

impl Panel for MemoryPanel {
    type Image = MemoryImage;

    fn render(&mut self, body: PanelBody<'_, MemoryImage>) {
        self.body = match body {
            PanelBody::Placeholder(text) => MemoryBody::Placeholder(text),
            PanelBody::Image(image) => MemoryBody::Image(image.clone()),
            PanelBody::Markup(markup) => MemoryBody::Markup(markup),
        };
        self.renders += 1;
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn measured_size(&self) -> Size {
        match &self.body {
            MemoryBody::Empty => Size::ZERO,
            MemoryBody::Placeholder(_) => self.placeholder_size,
            MemoryBody::Image(image) => image.size,
            MemoryBody::Markup(_) => Size::new(
                self.width.unwrap_or(self.natural_body_width),
                self.markup_height,
            ),
        }
    }

    fn set_position(&mut self, at: Point) {
        self.position = Some(at);
    }

    fn set_width(&mut self, width: Option<i32>) {
        self.width = width;
    }

    fn body_width(&self) -> i32 {
        match self.body {
            MemoryBody::Markup(_) => self.natural_body_width,
            _ => 0,
        }
    }

    fn detach(self) {
        self.detached.set(true);
    }
}

/// Element description for the in-memory host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryElement {
    pub id: u32,
    pub classes: Vec<String>,
    pub attributes: Vec<String>,
    pub text: String,
    pub kind: TooltipKind,
}

impl MemoryElement {
    /// Element carrying the default `card` marker.
    #[must_use]
    pub fn card(id: u32, text: impl Into<String>) -> Self {
        Self {
            classes: vec!["card".to_string()],
            ..Self::plain(id, text)
        }
    }

    /// Element without any marker.
    #[must_use]
    pub fn plain(id: u32, text: impl Into<String>) -> Self {
        Self {
            id,
            classes: Vec::new(),
            attributes: Vec::new(),
            text: text.into(),
            kind: TooltipKind::Image,
        }
    }

    /// Add the default opt-out attribute.
    #[must_use]
    pub fn opted_out(mut self) -> Self {
        self.attributes.push("data-nott".to_string());
        self
    }

    /// Use the text tooltip.
    #[must_use]
    pub fn text_kind(mut self) -> Self {
        self.kind = TooltipKind::Text;
        self
    }
}

impl HoverElement for MemoryElement {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|a| a == name)
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn tooltip_kind(&self) -> TooltipKind {
        self.kind
    }
}

/// Recording host.
#[derive(Debug, Clone)]
pub struct MemoryHost {
    pub viewport: FixedViewport,
    /// Every wake-up delay requested, in order.
    pub wakeups: Vec<Duration>,
    /// Every load started, in order.
    pub loads: Vec<(TooltipKind, LoadRequest)>,
    /// Kinds of panels created, in order.
    pub created: Vec<TooltipKind>,
    /// Size of images produced by [`image_for`](Self::image_for).
    pub image_size: Size,
}

impl MemoryHost {
    /// Host with an unscrolled viewport of the given size.
    #[must_use]
    pub fn new(width: i32, height: i32) -> Self {
        Self {
            viewport: FixedViewport::new(width, height),
            wakeups: Vec::new(),
            loads: Vec::new(),
            created: Vec::new(),
            image_size: Size::new(223, 310),
        }
    }

    /// How many loads were started for `source`.
    #[must_use]
    pub fn fetch_count(&self, source: &str) -> usize {
        self.loads
            .iter()
            .filter(|(_, req)| req.source.as_str() == source)
            .count()
    }

    /// Image a finished load of `source` would produce.
    #[must_use]
    pub fn image_for(&self, source: &str) -> MemoryImage {
        MemoryImage::new(source, self.image_size)
    }

    /// Source of the most recent load.
    #[must_use]
    pub fn last_load(&self) -> Option<&SourceKey> {
        self.loads.last().map(|(_, req)| &req.source)
    }
}

impl HoverHost for MemoryHost {
    type Element = MemoryElement;
    type Panel = MemoryPanel;
    type Viewport = FixedViewport;

    fn viewport(&self) -> FixedViewport {
        self.viewport
    }

    fn create_panel(&mut self, kind: TooltipKind) -> MemoryPanel {
        self.created.push(kind);
        MemoryPanel::new(kind)
    }

    fn request_wakeup(&mut self, after: Duration) {
        self.wakeups.push(after);
    }

    fn begin_load(&mut self, kind: TooltipKind, request: LoadRequest) {
        self.loads.push((kind, request));
    }
}
