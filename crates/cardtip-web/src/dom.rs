#![forbid(unsafe_code)]

//! DOM implementations of the core's panel, element and viewport seams.
//!
//! Reads go through typed `web-sys` getters where they exist and through
//! `Reflect` for fields `web-sys` does not expose (`document.clientWidth`,
//! `window.opera`, touch lists). A missing field reads as absent, never as
//! an error.

use cardtip_core::geometry::{Point, Size};
use cardtip_core::panel::{Panel, PanelBody};
use cardtip_core::viewport::{
    EnvironmentProbe, EnvironmentProfile, PointerSample, SampledViewport, ScrollSources,
    SizeSources,
};
use cardtip_core::{HoverElement, TooltipKind};
use js_sys::{Function, Object, Reflect, WeakMap};
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Document, Element, Event, HtmlElement, HtmlImageElement, Node};

use crate::{pointer, styles, target};

pub(crate) fn window_document() -> Option<Document> {
    web_sys::window().and_then(|window| window.document())
}

fn field(obj: &JsValue, name: &str) -> Option<JsValue> {
    Reflect::get(obj, &JsValue::from_str(name))
        .ok()
        .filter(|v| !v.is_undefined() && !v.is_null())
}

fn number(obj: &JsValue, name: &str) -> Option<f64> {
    field(obj, name).and_then(|v| v.as_f64())
}

// ---------------------------------------------------------------------------
// Panel
// ---------------------------------------------------------------------------

/// Absolutely positioned `<div>` appended to `<body>`.
///
/// Holds `None` when the element could not be created; every operation is
/// then a no-op and the tooltip simply never appears.
#[derive(Debug)]
pub(crate) struct DomPanel {
    element: Option<HtmlElement>,
}

impl DomPanel {
    pub(crate) fn create(document: &Document, kind: TooltipKind) -> Self {
        let element = document
            .create_element("div")
            .ok()
            .and_then(|el| el.dyn_into::<HtmlElement>().ok());
        let Some(element) = element else {
            cardtip_core::warn!(kind = ?kind, "tooltip panel could not be created");
            return Self { element: None };
        };
        element.set_class_name(kind.panel_class());
        let _ = element.style().set_property("display", styles::HIDDEN);
        let attached = document
            .body()
            .is_some_and(|body| body.append_child(&element).is_ok());
        if !attached {
            cardtip_core::warn!(kind = ?kind, "tooltip panel not attached: document has no body");
        }
        Self {
            element: Some(element),
        }
    }

    fn style(&self, name: &str, value: Option<&str>) {
        let Some(element) = &self.element else {
            return;
        };
        let style = element.style();
        let _ = match value {
            Some(value) => style.set_property(name, value),
            None => style.remove_property(name).map(drop),
        };
    }
}

impl Panel for DomPanel {
    type Image = HtmlImageElement;

    fn render(&mut self, body: PanelBody<'_, HtmlImageElement>) {
        let Some(element) = &self.element else {
            return;
        };
        match body {
            PanelBody::Placeholder(text) => element.set_text_content(Some(text)),
            PanelBody::Image(image) => {
                element.set_inner_html("");
                let _ = element.append_child(image);
            }
            PanelBody::Markup(markup) => element.set_inner_html(&markup),
        }
    }

    fn set_visible(&mut self, visible: bool) {
        self.style("display", (!visible).then_some(styles::HIDDEN));
    }

    fn measured_size(&self) -> Size {
        self.element
            .as_ref()
            .map_or(Size::ZERO, |el| Size::new(el.offset_width(), el.offset_height()))
    }

    fn set_position(&mut self, at: Point) {
        self.style("left", Some(styles::px(at.x).as_str()));
        self.style("top", Some(styles::px(at.y).as_str()));
    }

    fn set_width(&mut self, width: Option<i32>) {
        self.style("width", width.map(styles::px).as_deref());
    }

    // The markup starts with whitespace, so the table is the first element
    // child, not the first child node. A hidden panel has no layout, so it
    // is laid out invisibly for the measurement.
    fn body_width(&self) -> i32 {
        let Some(element) = &self.element else {
            return 0;
        };
        let style = element.style();
        let hidden = style
            .get_property_value("display")
            .is_ok_and(|display| display == styles::HIDDEN);
        if hidden {
            let _ = style.set_property("visibility", "hidden");
            let _ = style.remove_property("display");
        }
        let width = element
            .first_element_child()
            .and_then(|child| child.dyn_into::<HtmlElement>().ok())
            .map_or(0, |table| table.offset_width());
        if hidden {
            let _ = style.set_property("display", styles::HIDDEN);
            let _ = style.remove_property("visibility");
        }
        width
    }

    fn detach(self) {
        if let Some(element) = self.element {
            element.remove();
        }
    }
}

// ---------------------------------------------------------------------------
// Elements
// ---------------------------------------------------------------------------

/// A hovered DOM element with its page-lifetime id.
#[derive(Debug, Clone)]
pub(crate) struct DomElement {
    id: u32,
    element: Element,
}

impl HoverElement for DomElement {
    type Id = u32;

    fn id(&self) -> u32 {
        self.id
    }

    fn has_class(&self, class: &str) -> bool {
        self.element.class_list().contains(class)
    }

    fn has_attribute(&self, name: &str) -> bool {
        target::attribute_set(self.element.get_attribute(name).as_deref())
    }

    fn text(&self) -> String {
        self.element.text_content().unwrap_or_default()
    }

    fn tooltip_kind(&self) -> TooltipKind {
        target::kind_from_attribute(self.element.get_attribute(target::KIND_ATTRIBUTE).as_deref())
    }
}

/// Assigns ids to elements without touching the elements themselves.
///
/// The `WeakMap` lets the browser collect elements removed from the page;
/// ids are never reused.
#[derive(Debug)]
pub(crate) struct ElementIds {
    map: WeakMap,
    next: u32,
}

impl ElementIds {
    pub(crate) fn new() -> Self {
        Self {
            map: WeakMap::new(),
            next: 0,
        }
    }

    pub(crate) fn wrap(&mut self, element: Element) -> DomElement {
        let key: &Object = element.as_ref();
        let id = match self.map.get(key).as_f64() {
            Some(id) => id as u32,
            None => {
                self.next = self.next.wrapping_add(1);
                self.map.set(key, &JsValue::from(self.next));
                self.next
            }
        };
        DomElement { id, element }
    }
}

/// Element an event is about, with text-node targets swapped for their
/// parent.
pub(crate) fn event_target_element(event: &Event) -> Option<Element> {
    let node: Node = event.target()?.dyn_into().ok()?;
    if target::resolves_to_parent(node.node_type()) {
        return node.parent_element();
    }
    node.dyn_into::<Element>().ok()
}

/// Pointer readings of a mouse, pen or touch event.
pub(crate) fn pointer_sample(event: &Event) -> PointerSample {
    let value: &JsValue = event.as_ref();
    let touches = field(value, "touches")
        .and_then(|list| Reflect::get_u32(&list, 0).ok())
        .filter(|first| !first.is_undefined() && !first.is_null())
        .map(|first| vec![pointer::coords_from(|name| number(&first, name))])
        .unwrap_or_default();
    pointer::sample_from(|name| number(value, name), touches)
}

// ---------------------------------------------------------------------------
// Viewport and environment
// ---------------------------------------------------------------------------

/// Read every viewport source the core's fallback rules consult.
pub(crate) fn sample_viewport(profile: EnvironmentProfile) -> SampledViewport {
    let window = web_sys::window();
    let document = window.as_ref().and_then(web_sys::Window::document);
    let root = document.as_ref().and_then(Document::document_element);
    let body = document.as_ref().and_then(Document::body);

    let document_size = document.as_ref().and_then(|doc| {
        let value: &JsValue = doc.as_ref();
        let p = Point::from_f64(number(value, "clientWidth")?, number(value, "clientHeight")?);
        Some(Size::new(p.x, p.y))
    });

    let sizes = SizeSources {
        document: document_size,
        document_element: root
            .as_ref()
            .map(|el| Size::new(el.client_width(), el.client_height())),
        body: body
            .as_ref()
            .map(|el| Size::new(el.client_width(), el.client_height())),
    };
    let scroll = ScrollSources {
        window: window.as_ref().map(|w| {
            Point::from_f64(
                w.page_x_offset().unwrap_or(0.0),
                w.page_y_offset().unwrap_or(0.0),
            )
        }),
        document_element: root
            .as_ref()
            .map(|el| Point::new(el.scroll_left(), el.scroll_top())),
        body: body
            .as_ref()
            .map(|el| Point::new(el.scroll_left(), el.scroll_top())),
    };
    let client_origin = root
        .as_ref()
        .map_or(Point::ZERO, |el| Point::new(el.client_left(), el.client_top()));

    SampledViewport {
        profile,
        sizes,
        scroll,
        client_origin,
    }
}

/// Gather the feature-detection readings once at startup.
pub(crate) fn probe_environment() -> EnvironmentProbe {
    let Some(window) = web_sys::window() else {
        return EnvironmentProbe::default();
    };
    let win: &JsValue = window.as_ref();
    let has = |obj: &JsValue, name: &str| {
        Reflect::has(obj, &JsValue::from_str(name)).unwrap_or(false)
    };
    let has_document_evaluate = window.document().is_some_and(|doc| {
        let doc: &JsValue = doc.as_ref();
        has(doc, "evaluate")
    });

    EnvironmentProbe {
        user_agent: window.navigator().user_agent().unwrap_or_default(),
        has_document_evaluate,
        opera_version: opera_version(win),
        has_attach_event: has(win, "attachEvent"),
    }
}

/// `parseFloat(window.opera.version())`. An unreadable version still marks
/// the browser as Opera, so it reads as NaN rather than `None`.
fn opera_version(window: &JsValue) -> Option<f64> {
    let opera = field(window, "opera")?;
    let version = field(&opera, "version")
        .and_then(|f| f.dyn_into::<Function>().ok())
        .and_then(|f| f.call0(&opera).ok());
    let parsed = version.and_then(|v| {
        v.as_f64()
            .or_else(|| v.as_string().and_then(|s| leading_float(&s)))
    });
    Some(parsed.unwrap_or(f64::NAN))
}

fn leading_float(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let mut seen_dot = false;
    let end = text
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                return false;
            }
            !c.is_ascii_digit()
        })
        .map_or(text.len(), |(i, _)| i);
    text[..end].parse().ok()
}

/// `location.protocol` of the page, e.g. `https:`.
pub(crate) fn page_protocol(document: &Document) -> String {
    document
        .location()
        .and_then(|location| location.protocol().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Injected elements
// ---------------------------------------------------------------------------

/// Append a `<link rel="stylesheet">` to `<head>`.
pub(crate) fn append_stylesheet(document: &Document, href: &str) -> Result<(), JsValue> {
    let link = document.create_element("link")?;
    link.set_attribute("type", "text/css")?;
    link.set_attribute("rel", "stylesheet")?;
    link.set_attribute("href", href)?;
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("document has no head"))?;
    head.append_child(&link)?;
    Ok(())
}

/// Append a hidden 1x1 image so the browser caches `address`.
pub(crate) fn append_preload_image(document: &Document, address: &str) -> Result<(), JsValue> {
    let image = HtmlImageElement::new()?;
    let style = image.style();
    for (name, value) in styles::PRELOAD_IMAGE_STYLE {
        style.set_property(name, value)?;
    }
    image.set_src(address);
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("document has no body"))?;
    body.append_child(&image)?;
    Ok(())
}
