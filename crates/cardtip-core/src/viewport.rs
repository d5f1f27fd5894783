#![forbid(unsafe_code)]

//! Viewport geometry: pointer position, scroll offsets, and usable viewport
//! size, tolerant of legacy browser reporting quirks.
//!
//! # Capability model
//!
//! Placement only ever talks to [`ViewportCapabilities`]. Hosts either hand
//! out a [`FixedViewport`] (tests, headless simulation) or sample raw readings
//! into a [`SampledViewport`], which applies the fallback rules below under an
//! [`EnvironmentProfile`] detected once at startup.
//!
//! # Fallback rules
//!
//! | Reading | Sources, in preference order |
//! |---------|------------------------------|
//! | scroll offset (per axis) | window page offset → document element → body, first non-zero |
//! | viewport size | root picked by profile; body if the root reports zero height |
//! | pointer | first touch point, else the event; `page*` if non-zero, else `client* + scroll - clientOrigin` |
//!
//! Absent readings count as zero. Nothing in this module can fail.

use crate::geometry::{Point, Size};

/// Source of viewport measurements for placement.
pub trait ViewportCapabilities {
    /// Usable viewport size (excluding scrollbars where the host can tell).
    fn viewport_size(&self) -> Size;

    /// Current scroll offsets of the document.
    fn scroll_offsets(&self) -> Point;

    /// Offset of the client area inside the root element (`clientLeft`,
    /// `clientTop`). Non-zero only on a few legacy engines.
    fn client_origin(&self) -> Point {
        Point::ZERO
    }
}

impl<T: ViewportCapabilities + ?Sized> ViewportCapabilities for &T {
    fn viewport_size(&self) -> Size {
        (**self).viewport_size()
    }

    fn scroll_offsets(&self) -> Point {
        (**self).scroll_offsets()
    }

    fn client_origin(&self) -> Point {
        (**self).client_origin()
    }
}

// ---------------------------------------------------------------------------
// Environment profiles
// ---------------------------------------------------------------------------

/// Element whose `clientWidth`/`clientHeight` reports the viewport size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeRoot {
    /// `document` itself (old WebKit without XPath support).
    Document,
    /// `document.body` (Opera before 9.5).
    Body,
    /// `document.documentElement` (everything standards-compliant).
    #[default]
    DocumentElement,
}

/// Raw feature-detection inputs gathered by the host once at startup.
#[derive(Debug, Clone, Default)]
pub struct EnvironmentProbe {
    /// `navigator.userAgent`.
    pub user_agent: String,
    /// Whether `document.evaluate` exists.
    pub has_document_evaluate: bool,
    /// `window.opera.version()` when running inside legacy Opera.
    pub opera_version: Option<f64>,
    /// Whether `window.attachEvent` exists (legacy IE event model).
    pub has_attach_event: bool,
}

/// Detected hosting environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EnvironmentProfile {
    /// Where viewport size is read from.
    pub size_root: SizeRoot,
    /// Legacy IE: needs the extra stylesheet.
    pub legacy_ie: bool,
}

impl EnvironmentProfile {
    /// Profile of a standards-compliant browser.
    #[must_use]
    pub const fn standard() -> Self {
        Self {
            size_root: SizeRoot::DocumentElement,
            legacy_ie: false,
        }
    }

    /// Classify the environment from probe readings.
    ///
    /// Detection is deterministic: the same probe always yields the same
    /// profile.
    #[must_use]
    pub fn detect(probe: &EnvironmentProbe) -> Self {
        let size_root = if probe.user_agent.contains("AppleWebKit/") && !probe.has_document_evaluate
        {
            SizeRoot::Document
        } else if probe.opera_version.is_some_and(|v| v < 9.5) {
            SizeRoot::Body
        } else {
            SizeRoot::DocumentElement
        };

        Self {
            size_root,
            legacy_ie: probe.has_attach_event && probe.opera_version.is_none(),
        }
    }
}

// ---------------------------------------------------------------------------
// Readings and fallback rules
// ---------------------------------------------------------------------------

/// Scroll positions reported by each candidate source.
#[derive(Debug, Clone, Copy, Default)]
pub struct ScrollSources {
    /// `window.pageXOffset` / `pageYOffset`.
    pub window: Option<Point>,
    /// `documentElement.scrollLeft` / `scrollTop`.
    pub document_element: Option<Point>,
    /// `body.scrollLeft` / `scrollTop`.
    pub body: Option<Point>,
}

/// Best-available scroll offsets, chosen per axis.
#[must_use]
pub fn scroll_offsets(sources: &ScrollSources) -> Point {
    let candidates = [sources.window, sources.document_element, sources.body];
    let pick = |axis: fn(Point) -> i32| {
        candidates
            .iter()
            .flatten()
            .map(|p| axis(*p))
            .find(|v| *v != 0)
            .unwrap_or(0)
    };
    Point::new(pick(|p| p.x), pick(|p| p.y))
}

/// Client sizes reported by each candidate root.
#[derive(Debug, Clone, Copy, Default)]
pub struct SizeSources {
    /// `document.clientWidth` / `clientHeight` (only meaningful on old WebKit).
    pub document: Option<Size>,
    /// `documentElement.clientWidth` / `clientHeight`.
    pub document_element: Option<Size>,
    /// `body.clientWidth` / `clientHeight`.
    pub body: Option<Size>,
}

/// Usable viewport size under the given root choice.
///
/// IE8 in quirks mode reports a zero height for the root; the body size is
/// used instead.
#[must_use]
pub fn viewport_size(root: SizeRoot, sources: &SizeSources) -> Size {
    let primary = match root {
        SizeRoot::Document => sources.document,
        SizeRoot::Body => sources.body,
        SizeRoot::DocumentElement => sources.document_element,
    }
    .unwrap_or_default();

    if primary.height != 0 {
        return primary;
    }
    sources.body.unwrap_or(primary)
}

/// Coordinates carried by one pointer (the event itself, or one touch).
///
/// Every field is optional: hosts copy over whatever the event exposes.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerCoords {
    pub page_x: Option<f64>,
    pub page_y: Option<f64>,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
}

impl PointerCoords {
    /// Coordinates that only carry document-relative values.
    #[must_use]
    pub const fn page(x: f64, y: f64) -> Self {
        Self {
            page_x: Some(x),
            page_y: Some(y),
            client_x: None,
            client_y: None,
        }
    }

    /// Coordinates that only carry viewport-relative values.
    #[must_use]
    pub const fn client(x: f64, y: f64) -> Self {
        Self {
            page_x: None,
            page_y: None,
            client_x: Some(x),
            client_y: Some(y),
        }
    }
}

/// A pointer-ish input event as seen by the geometry layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointerSample {
    /// Coordinates on the event itself.
    pub primary: PointerCoords,
    /// Active touch points, if the event is a touch event.
    pub touches: Vec<PointerCoords>,
}

impl PointerSample {
    /// Sample for a plain mouse/pointer event.
    #[must_use]
    pub fn mouse(coords: PointerCoords) -> Self {
        Self {
            primary: coords,
            touches: Vec::new(),
        }
    }
}

/// Document coordinates of the primary pointer of `sample`.
///
/// When the host reports only viewport-relative coordinates, the current
/// scroll offset is added and the client origin subtracted.
#[must_use]
pub fn pointer_position(sample: &PointerSample, caps: &dyn ViewportCapabilities) -> Point {
    let input = sample.touches.first().unwrap_or(&sample.primary);

    let needs_scroll = !has_page_coord(input.page_x) || !has_page_coord(input.page_y);
    let (scroll, origin) = if needs_scroll {
        (caps.scroll_offsets(), caps.client_origin())
    } else {
        (Point::ZERO, Point::ZERO)
    };

    let x = resolve_axis(input.page_x, input.client_x, scroll.x, origin.x);
    let y = resolve_axis(input.page_y, input.client_y, scroll.y, origin.y);
    Point::from_f64(x, y)
}

#[inline]
fn has_page_coord(value: Option<f64>) -> bool {
    value.is_some_and(|v| v != 0.0 && v.is_finite())
}

fn resolve_axis(page: Option<f64>, client: Option<f64>, scroll: i32, origin: i32) -> f64 {
    match page {
        Some(v) if v != 0.0 && v.is_finite() => v,
        _ => {
            let client = client.filter(|v| v.is_finite()).unwrap_or(0.0);
            client + f64::from(scroll) - f64::from(origin)
        }
    }
}

// ---------------------------------------------------------------------------
// Implementations
// ---------------------------------------------------------------------------

/// Fixed measurements, for tests and headless simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FixedViewport {
    pub size: Size,
    pub scroll: Point,
    pub client_origin: Point,
}

impl FixedViewport {
    /// Viewport of the given size, unscrolled.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self {
            size: Size::new(width, height),
            scroll: Point::ZERO,
            client_origin: Point::ZERO,
        }
    }

    /// Set the scroll offsets.
    #[must_use]
    pub const fn scrolled(mut self, x: i32, y: i32) -> Self {
        self.scroll = Point::new(x, y);
        self
    }
}

impl ViewportCapabilities for FixedViewport {
    fn viewport_size(&self) -> Size {
        self.size
    }

    fn scroll_offsets(&self) -> Point {
        self.scroll
    }

    fn client_origin(&self) -> Point {
        self.client_origin
    }
}

/// One snapshot of raw host readings, resolved through the fallback rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SampledViewport {
    pub profile: EnvironmentProfile,
    pub sizes: SizeSources,
    pub scroll: ScrollSources,
    pub client_origin: Point,
}

impl ViewportCapabilities for SampledViewport {
    fn viewport_size(&self) -> Size {
        viewport_size(self.profile.size_root, &self.sizes)
    }

    fn scroll_offsets(&self) -> Point {
        scroll_offsets(&self.scroll)
    }

    fn client_origin(&self) -> Point {
        self.client_origin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn probe(ua: &str) -> EnvironmentProbe {
        EnvironmentProbe {
            user_agent: ua.to_string(),
            has_document_evaluate: true,
            opera_version: None,
            has_attach_event: false,
        }
    }

    #[test]
    fn modern_browser_uses_document_element() {
        let profile = EnvironmentProfile::detect(&probe(
            "Mozilla/5.0 (Macintosh) AppleWebKit/605.1.15 (KHTML, like Gecko) Safari/605.1.15",
        ));
        assert_eq!(profile, EnvironmentProfile::standard());
    }

    #[test]
    fn old_webkit_without_xpath_uses_document() {
        let mut p = probe("Mozilla/5.0 AppleWebKit/419 Safari/419.3");
        p.has_document_evaluate = false;
        assert_eq!(EnvironmentProfile::detect(&p).size_root, SizeRoot::Document);
    }

    #[test]
    fn old_opera_uses_body_and_is_not_ie() {
        let mut p = probe("Opera/9.27 (Windows NT 5.1; U; en)");
        p.opera_version = Some(9.27);
        p.has_attach_event = true;
        let profile = EnvironmentProfile::detect(&p);
        assert_eq!(profile.size_root, SizeRoot::Body);
        assert!(!profile.legacy_ie);
    }

    #[test]
    fn modern_opera_uses_document_element() {
        let mut p = probe("Opera/9.80");
        p.opera_version = Some(10.6);
        assert_eq!(
            EnvironmentProfile::detect(&p).size_root,
            SizeRoot::DocumentElement
        );
    }

    #[test]
    fn attach_event_flags_legacy_ie() {
        let mut p = probe("Mozilla/4.0 (compatible; MSIE 8.0; Windows NT 6.1)");
        p.has_attach_event = true;
        assert!(EnvironmentProfile::detect(&p).legacy_ie);
    }

    #[test]
    fn scroll_prefers_first_non_zero_source_per_axis() {
        let sources = ScrollSources {
            window: Some(Point::new(0, 40)),
            document_element: Some(Point::new(12, 99)),
            body: Some(Point::new(7, 0)),
        };
        assert_eq!(scroll_offsets(&sources), Point::new(12, 40));
        assert_eq!(scroll_offsets(&ScrollSources::default()), Point::ZERO);
    }

    #[test]
    fn zero_height_root_falls_back_to_body() {
        let sources = SizeSources {
            document: None,
            document_element: Some(Size::new(1024, 0)),
            body: Some(Size::new(1000, 700)),
        };
        assert_eq!(
            viewport_size(SizeRoot::DocumentElement, &sources),
            Size::new(1000, 700)
        );
    }

    #[test]
    fn missing_root_reading_falls_back_to_body() {
        let sources = SizeSources {
            document: None,
            document_element: Some(Size::new(1024, 768)),
            body: Some(Size::new(1000, 700)),
        };
        assert_eq!(viewport_size(SizeRoot::Document, &sources), Size::new(1000, 700));
        assert_eq!(
            viewport_size(SizeRoot::DocumentElement, &sources),
            Size::new(1024, 768)
        );
    }

    #[test]
    fn pointer_prefers_page_coordinates() {
        let caps = FixedViewport::new(800, 600).scrolled(0, 500);
        let sample = PointerSample::mouse(PointerCoords {
            page_x: Some(120.0),
            page_y: Some(640.0),
            client_x: Some(120.0),
            client_y: Some(140.0),
        });
        assert_eq!(pointer_position(&sample, &caps), Point::new(120, 640));
    }

    #[test]
    fn pointer_adds_scroll_to_client_coordinates() {
        let mut caps = FixedViewport::new(800, 600).scrolled(30, 500);
        caps.client_origin = Point::new(2, 2);
        let sample = PointerSample::mouse(PointerCoords::client(100.0, 50.0));
        assert_eq!(pointer_position(&sample, &caps), Point::new(128, 548));
    }

    #[test]
    fn pointer_uses_first_touch() {
        let caps = FixedViewport::new(800, 600);
        let sample = PointerSample {
            primary: PointerCoords::page(1.0, 1.0),
            touches: vec![PointerCoords::page(300.0, 200.0), PointerCoords::page(5.0, 5.0)],
        };
        assert_eq!(pointer_position(&sample, &caps), Point::new(300, 200));
    }

    #[test]
    fn malformed_event_is_zero_safe() {
        let caps = FixedViewport::new(800, 600);
        assert_eq!(pointer_position(&PointerSample::default(), &caps), Point::ZERO);

        let sample = PointerSample::mouse(PointerCoords {
            page_x: Some(f64::NAN),
            page_y: None,
            client_x: Some(f64::INFINITY),
            client_y: None,
        });
        assert_eq!(pointer_position(&sample, &caps), Point::ZERO);
    }

    #[test]
    fn sampled_viewport_applies_rules() {
        let sampled = SampledViewport {
            profile: EnvironmentProfile::standard(),
            sizes: SizeSources {
                document: None,
                document_element: Some(Size::new(900, 0)),
                body: Some(Size::new(880, 640)),
            },
            scroll: ScrollSources {
                window: None,
                document_element: Some(Point::new(0, 0)),
                body: Some(Point::new(0, 250)),
            },
            client_origin: Point::ZERO,
        };
        assert_eq!(sampled.viewport_size(), Size::new(880, 640));
        assert_eq!(sampled.scroll_offsets(), Point::new(0, 250));
    }
}
