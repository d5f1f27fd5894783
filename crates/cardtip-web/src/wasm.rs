#![forbid(unsafe_code)]

use core::time::Duration;
use std::cell::{RefCell, RefMut};
use std::rc::{Rc, Weak};

use cardtip_core::content::{Content, LoadRequest, SourceKey};
use cardtip_core::viewport::{EnvironmentProfile, SampledViewport, pointer_position};
use cardtip_core::{
    CardtipError, HoverConfig, HoverController, HoverHost, Lifecycle, Point, TooltipKind, assets,
};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Event, HtmlImageElement, Response};
use web_time::Instant;

use crate::dom::{self, DomElement, DomPanel, ElementIds};
use crate::pointer::LISTENED_EVENTS;

/// Card hover tooltips for the current document.
///
/// Constructing the handle injects the tooltip stylesheets and arranges for
/// [`load`](Self::load) to run on window `load`. Pointer listeners are
/// attached by [`enable`](Self::enable) and removed by
/// [`dispose`](Self::dispose).
///
/// ```js
/// const tips = new CardTips('{"debounce_ms": 150}');
/// tips.enable();
/// ```
#[wasm_bindgen]
pub struct CardTips {
    page: Rc<RefCell<Page>>,
    listeners: Option<Listeners>,
}

#[wasm_bindgen]
impl CardTips {
    /// Create the handle. `options` is a JSON object with any subset of the
    /// configuration fields; omitted fields keep their defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(options: Option<String>) -> Result<CardTips, JsValue> {
        let config = match options.as_deref() {
            Some(json) => HoverConfig::from_json(json).map_err(to_js)?,
            None => HoverConfig::default(),
        };
        let document =
            dom::window_document().ok_or_else(|| JsValue::from_str("no document available"))?;
        let profile = EnvironmentProfile::detect(&dom::probe_environment());

        let protocol = dom::page_protocol(&document);
        for url in assets::stylesheet_urls(&config, &protocol, &profile) {
            if dom::append_stylesheet(&document, &url).is_err() {
                cardtip_core::warn!(url = %url, "tooltip stylesheet not injected");
            }
        }

        let image_height = config.image_height;
        let page = Rc::new_cyclic(|weak| {
            RefCell::new(Page {
                controller: HoverController::new(config),
                host: DomHost {
                    page: weak.clone(),
                    document,
                    profile,
                    image_height,
                    ids: ElementIds::new(),
                    origin: Instant::now(),
                },
            })
        });
        run_on_document_load(&page);

        Ok(Self {
            page,
            listeners: None,
        })
    }

    /// Attach the document listeners. Fails if already enabled or disposed.
    ///
    /// The controller only becomes enabled once every listener is attached;
    /// on failure the listeners attached so far are removed on drop.
    pub fn enable(&mut self) -> Result<(), JsValue> {
        let document = self.page()?.host.document.clone();
        let listeners = Listeners::attach(&document, &self.page)?;
        self.page()?.controller.enable().map_err(to_js)?;
        self.listeners = Some(listeners);
        Ok(())
    }

    /// Whether listeners are attached and events are processed.
    #[wasm_bindgen(getter)]
    pub fn enabled(&self) -> bool {
        self.page()
            .is_ok_and(|page| page.controller.lifecycle() == Lifecycle::Enabled)
    }

    /// Remove the listeners and both tooltip panels. The handle cannot be
    /// enabled again afterwards.
    pub fn dispose(&mut self) {
        self.listeners = None;
        if let Ok(mut page) = self.page() {
            page.controller.dispose();
        }
    }

    /// Warm the browser cache with the image of every marked link.
    ///
    /// Runs automatically on window `load`; call it again after inserting
    /// new links.
    pub fn load(&self) {
        if let Ok(mut page) = self.page() {
            page.preload();
        }
    }

    /// Hide both tooltips.
    pub fn hide(&self) {
        if let Ok(mut page) = self.page() {
            page.controller.hide_all();
        }
    }

    /// Provide the HTML fragment shown by text tooltips for `source`.
    #[wasm_bindgen(js_name = registerText)]
    pub fn register_text(&self, source: &str, html: &str) {
        if let Ok(mut page) = self.page() {
            let Page { controller, host } = &mut *page;
            controller.register_text(host, SourceKey::new(source), html);
        }
    }
}

impl CardTips {
    fn page(&self) -> Result<RefMut<'_, Page>, JsValue> {
        self.page
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("cardtip is busy"))
    }
}

fn to_js(err: CardtipError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

// ---------------------------------------------------------------------------
// Page state
// ---------------------------------------------------------------------------

/// Everything listeners and timers act on.
struct Page {
    controller: HoverController<DomHost>,
    host: DomHost,
}

impl Page {
    fn now(&self) -> Duration {
        self.host.origin.elapsed()
    }

    fn advance(&mut self) {
        let now = self.now();
        self.controller.advance(&mut self.host, now);
    }

    fn content_loaded(&mut self, source: SourceKey, content: Content<HtmlImageElement>) {
        self.controller.content_loaded(&mut self.host, source, content);
    }

    fn content_failed(&mut self, kind: TooltipKind, source: &SourceKey) {
        self.controller.content_failed(kind, source);
    }

    fn handle(&mut self, name: &str, event: &Event) {
        if name == "click" {
            self.controller.click();
            return;
        }
        let Some(element) = dom::event_target_element(event).map(|el| self.host.ids.wrap(el))
        else {
            return;
        };
        match name {
            "pointerover" => {
                let pointer = self.pointer(event);
                let now = self.now();
                self.controller
                    .pointer_enter(&mut self.host, &element, pointer, now);
            }
            "pointermove" => {
                let pointer = self.pointer(event);
                self.controller
                    .pointer_move(&mut self.host, &element, pointer);
            }
            "pointerout" => self.controller.pointer_exit(&element),
            _ => {}
        }
    }

    fn pointer(&self, event: &Event) -> Point {
        pointer_position(&dom::pointer_sample(event), &self.host.viewport())
    }

    fn preload(&mut self) {
        let links = self.host.document.get_elements_by_tag_name("a");
        let elements: Vec<DomElement> = (0..links.length())
            .filter_map(|i| links.item(i))
            .map(|el| self.host.ids.wrap(el))
            .collect();
        let addresses = self.controller.preload_addresses(elements.iter());
        for address in &addresses {
            if dom::append_preload_image(&self.host.document, address.as_str()).is_err() {
                cardtip_core::warn!(address = %address, "preload image not appended");
            }
        }
        cardtip_core::debug!(count = addresses.len(), "tooltip images preloaded");
    }
}

/// Run `f` against the page if it is still alive and not already borrowed.
/// Callbacks that lose either race are dropped.
fn with_page(page: &Weak<RefCell<Page>>, f: impl FnOnce(&mut Page)) {
    let Some(page) = page.upgrade() else {
        return;
    };
    let Ok(mut page) = page.try_borrow_mut() else {
        cardtip_core::warn!("re-entrant tooltip callback dropped");
        return;
    };
    f(&mut page);
}

fn run_on_document_load(page: &Rc<RefCell<Page>>) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let loaded = page
        .try_borrow()
        .is_ok_and(|p| p.host.document.ready_state() == "complete");
    if loaded {
        with_page(&Rc::downgrade(page), Page::preload);
        return;
    }
    let weak = Rc::downgrade(page);
    let callback = Closure::once_into_js(move || with_page(&weak, Page::preload));
    if window
        .add_event_listener_with_callback("load", callback.unchecked_ref())
        .is_err()
    {
        cardtip_core::warn!("window load hook not installed");
    }
}

// ---------------------------------------------------------------------------
// Host
// ---------------------------------------------------------------------------

struct DomHost {
    page: Weak<RefCell<Page>>,
    document: Document,
    profile: EnvironmentProfile,
    image_height: u32,
    ids: ElementIds,
    origin: Instant,
}

impl DomHost {
    /// Run `f` on the page after `delay`, outside the current borrow.
    fn defer(&self, delay: Duration, f: impl FnOnce(&mut Page) + 'static) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let page = self.page.clone();
        let callback = Closure::once_into_js(move || with_page(&page, f));
        let millis = i32::try_from(delay.as_millis()).unwrap_or(i32::MAX);
        if window
            .set_timeout_with_callback_and_timeout_and_arguments_0(callback.unchecked_ref(), millis)
            .is_err()
        {
            cardtip_core::warn!(delay_ms = millis, "setTimeout failed; callback dropped");
        }
    }

    fn load_image(&self, request: LoadRequest) {
        let LoadRequest { source, address } = request;
        let Ok(image) = HtmlImageElement::new() else {
            self.defer(Duration::ZERO, move |page| {
                page.content_failed(TooltipKind::Image, &source);
            });
            return;
        };
        image.set_height(self.image_height);

        // Exactly one of the two fires; the other closure is released with
        // the handler slot.
        let onload = {
            let page = self.page.clone();
            let image = image.clone();
            let source = source.clone();
            Closure::once_into_js(move || {
                image.set_onload(None);
                image.set_onerror(None);
                with_page(&page, |page| page.content_loaded(source, Content::Image(image)));
            })
        };
        let onerror = {
            let page = self.page.clone();
            let image = image.clone();
            Closure::once_into_js(move || {
                image.set_onload(None);
                image.set_onerror(None);
                with_page(&page, |page| page.content_failed(TooltipKind::Image, &source));
            })
        };
        image.set_onload(Some(onload.unchecked_ref()));
        image.set_onerror(Some(onerror.unchecked_ref()));
        image.set_src(address.as_str());
    }

    fn load_text(&self, request: LoadRequest) {
        let LoadRequest { source, address } = request;
        let page = self.page.clone();
        spawn_local(async move {
            match fetch_text(address.as_str()).await {
                Ok(html) => with_page(&page, |page| page.content_loaded(source, Content::Text(html))),
                Err(_) => with_page(&page, |page| page.content_failed(TooltipKind::Text, &source)),
            }
        });
    }
}

async fn fetch_text(address: &str) -> Result<String, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
    let response: Response = JsFuture::from(window.fetch_with_str(address))
        .await?
        .dyn_into()?;
    if !response.ok() {
        return Err(JsValue::from_str("tooltip fragment request failed"));
    }
    JsFuture::from(response.text()?)
        .await?
        .as_string()
        .ok_or_else(|| JsValue::from_str("tooltip fragment is not text"))
}

impl HoverHost for DomHost {
    type Element = DomElement;
    type Panel = DomPanel;
    type Viewport = SampledViewport;

    fn viewport(&self) -> SampledViewport {
        dom::sample_viewport(self.profile)
    }

    fn create_panel(&mut self, kind: TooltipKind) -> DomPanel {
        DomPanel::create(&self.document, kind)
    }

    fn request_wakeup(&mut self, after: Duration) {
        self.defer(after, Page::advance);
    }

    fn begin_load(&mut self, kind: TooltipKind, request: LoadRequest) {
        match kind {
            TooltipKind::Image => self.load_image(request),
            TooltipKind::Text => self.load_text(request),
        }
    }
}

// ---------------------------------------------------------------------------
// Listeners
// ---------------------------------------------------------------------------

/// Document listeners; removed from the document when dropped.
struct Listeners {
    document: Document,
    callbacks: Vec<(&'static str, Closure<dyn FnMut(Event)>)>,
}

impl Listeners {
    fn attach(document: &Document, page: &Rc<RefCell<Page>>) -> Result<Self, JsValue> {
        let mut listeners = Self {
            document: document.clone(),
            callbacks: Vec::with_capacity(LISTENED_EVENTS.len()),
        };
        for name in LISTENED_EVENTS {
            let weak = Rc::downgrade(page);
            let callback = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
                with_page(&weak, |page| page.handle(name, &event));
            });
            // On error the listeners attached so far are removed by drop.
            document.add_event_listener_with_callback(name, callback.as_ref().unchecked_ref())?;
            listeners.callbacks.push((name, callback));
        }
        Ok(listeners)
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        for (name, callback) in &self.callbacks {
            let _ = self
                .document
                .remove_event_listener_with_callback(name, callback.as_ref().unchecked_ref());
        }
    }
}
