#![forbid(unsafe_code)]

//! Hover controller: pointer events in, tooltip instances out.
//!
//! The controller is an explicit context object. It owns both tooltip
//! instances (created lazily through the host), one [`HoverRecord`] per
//! element under the pointer, the debounce queue, and the set of loads in
//! flight. Nothing here is global; the embedding frontend holds exactly one
//! controller for the page lifetime.
//!
//! # Event handling
//!
//! | Event | Effect |
//! |-------|--------|
//! | enter (eligible, not opted out) | record becomes active, load scheduled after the debounce |
//! | debounce expiry | shows the tooltip if the record is still active with the same token |
//! | move (eligible) | repositions that kind's instance; never re-shows or re-loads |
//! | exit (eligible) | record dropped, pending load cancelled, instance hidden |
//! | click (anywhere) | image instance hidden |
//!
//! # Invariants
//!
//! 1. A deferred load whose element is no longer active never makes a
//!    tooltip visible.
//! 2. At most one live pending load per element: a new enter supersedes the
//!    previous token.
//! 3. One fetch per source and kind at a time; cached sources are never
//!    fetched again.
//! 4. Events are ignored unless the controller is [`Lifecycle::Enabled`].

use core::fmt;
use core::hash::Hash;
use core::time::Duration;
use std::collections::HashMap;

use crate::config::HoverConfig;
use crate::content::{ContentAddress, Content, LoadRequest, SourceKey};
use crate::error::CardtipError;
use crate::geometry::Point;
use crate::instance::{InstanceLayout, ShowOutcome, TooltipInstance, TooltipKind};
use crate::panel::Panel;
use crate::pending::{LoadToken, PendingLoads};
use crate::viewport::ViewportCapabilities;

/// What the controller needs to know about a hovered element.
pub trait HoverElement {
    /// Stable identity of the element for the page lifetime.
    type Id: Copy + Eq + Hash + fmt::Debug;

    fn id(&self) -> Self::Id;

    /// Whether the element carries `class`.
    fn has_class(&self, class: &str) -> bool;

    /// Whether the element carries a (non-empty) attribute `name`.
    fn has_attribute(&self, name: &str) -> bool;

    /// Text content of the element.
    fn text(&self) -> String;

    /// Which tooltip flavor this element uses.
    fn tooltip_kind(&self) -> TooltipKind {
        TooltipKind::Image
    }
}

/// Services the embedding environment provides to the controller.
pub trait HoverHost {
    type Element: HoverElement;
    type Panel: Panel;
    type Viewport: ViewportCapabilities;

    /// Current viewport measurements.
    fn viewport(&self) -> Self::Viewport;

    /// Create and attach a hidden panel for `kind`.
    fn create_panel(&mut self, kind: TooltipKind) -> Self::Panel;

    /// Ask to be called back through [`HoverController::advance`] after
    /// `after` has elapsed. Extra or coalesced wake-ups are harmless.
    fn request_wakeup(&mut self, after: Duration);

    /// Start fetching content. Completion is reported through
    /// [`HoverController::content_loaded`] or
    /// [`HoverController::content_failed`].
    fn begin_load(&mut self, kind: TooltipKind, request: LoadRequest);
}

type ElementId<H> = <<H as HoverHost>::Element as HoverElement>::Id;
type PanelImage<H> = <<H as HoverHost>::Panel as Panel>::Image;

/// Listener lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifecycle {
    /// Constructed, listeners not attached.
    #[default]
    Idle,
    /// Listeners attached; events are processed.
    Enabled,
    /// Torn down. Terminal.
    Disposed,
}

/// State of one element under the pointer. A record exists exactly while
/// the element is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverRecord {
    pub kind: TooltipKind,
    pub source: SourceKey,
    /// Latest pointer position over the element.
    pub pointer: Point,
    /// Load the record is waiting for; `None` once it fired.
    pub pending: Option<LoadToken>,
}

/// Loads in flight, per tooltip kind: the same source can be loading as an
/// image and as a text fragment at once.
type FlightKey = (TooltipKind, SourceKey);

/// The hover controller.
pub struct HoverController<H: HoverHost> {
    config: HoverConfig,
    lifecycle: Lifecycle,
    image: Option<TooltipInstance<H::Panel>>,
    text: Option<TooltipInstance<H::Panel>>,
    records: HashMap<ElementId<H>, HoverRecord>,
    pending: PendingLoads<ElementId<H>>,
    /// Deadline of each load in flight, `None` without a timeout.
    in_flight: HashMap<FlightKey, Option<Duration>>,
}

impl<H: HoverHost> fmt::Debug for HoverController<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HoverController")
            .field("lifecycle", &self.lifecycle)
            .field("image", &self.image.as_ref().map(TooltipInstance::state))
            .field("text", &self.text.as_ref().map(TooltipInstance::state))
            .field("active", &self.records.len())
            .field("pending", &self.pending.len())
            .field("in_flight", &self.in_flight.len())
            .finish()
    }
}

impl<H: HoverHost> HoverController<H> {
    /// Create an idle controller.
    #[must_use]
    pub fn new(config: HoverConfig) -> Self {
        Self {
            config,
            lifecycle: Lifecycle::Idle,
            image: None,
            text: None,
            records: HashMap::new(),
            pending: PendingLoads::new(),
            in_flight: HashMap::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &HoverConfig {
        &self.config
    }

    #[must_use]
    pub fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
    }

    /// Start processing events. The caller attaches its listeners only when
    /// this succeeds, so they are attached exactly once.
    pub fn enable(&mut self) -> Result<(), CardtipError> {
        match self.lifecycle {
            Lifecycle::Idle => {
                crate::debug!("hover controller enabled");
                self.lifecycle = Lifecycle::Enabled;
                Ok(())
            }
            Lifecycle::Enabled => {
                crate::warn!("hover controller enabled twice");
                Err(CardtipError::AlreadyEnabled)
            }
            Lifecycle::Disposed => {
                crate::warn!("enable after dispose rejected");
                Err(CardtipError::Disposed)
            }
        }
    }

    /// Tear down both instances and forget all hover state. Idempotent.
    pub fn dispose(&mut self) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        if let Some(text) = self.text.take() {
            text.dispose();
        }
        if let Some(image) = self.image.take() {
            image.dispose();
        }
        self.records.clear();
        self.pending.clear();
        self.in_flight.clear();
        self.lifecycle = Lifecycle::Disposed;
        crate::debug!("hover controller disposed");
    }

    /// Instance of `kind`, if it has been created.
    #[must_use]
    pub fn instance(&self, kind: TooltipKind) -> Option<&TooltipInstance<H::Panel>> {
        match kind {
            TooltipKind::Image => self.image.as_ref(),
            TooltipKind::Text => self.text.as_ref(),
        }
    }

    /// Hover record of an active element.
    #[must_use]
    pub fn record(&self, id: ElementId<H>) -> Option<&HoverRecord> {
        self.records.get(&id)
    }

    /// Number of loads waiting for their debounce delay.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Whether `element` carries the eligibility marker.
    #[must_use]
    pub fn is_marked(&self, element: &H::Element) -> bool {
        element.has_class(&self.config.eligible_class)
    }

    /// Tooltip kind and source key for an element that should get a tooltip.
    #[must_use]
    pub fn classify(&self, element: &H::Element) -> Option<(TooltipKind, SourceKey)> {
        if !self.is_marked(element) || element.has_attribute(&self.config.opt_out_attribute) {
            return None;
        }
        let source = SourceKey::from_element_text(&element.text())?;
        Some((element.tooltip_kind(), source))
    }

    /// Content addresses of every eligible element, for cache warming.
    pub fn preload_addresses<'a, I>(&self, elements: I) -> Vec<ContentAddress>
    where
        I: IntoIterator<Item = &'a H::Element>,
        H::Element: 'a,
    {
        elements
            .into_iter()
            .filter(|el| self.is_marked(el))
            .filter_map(|el| SourceKey::from_element_text(&el.text()))
            .map(|key| self.config.address_for(&key))
            .collect()
    }

    // -- events -------------------------------------------------------------

    /// Pointer entered `element` at `pointer`.
    pub fn pointer_enter(&mut self, host: &mut H, element: &H::Element, pointer: Point, now: Duration) {
        if self.lifecycle != Lifecycle::Enabled {
            return;
        }
        let Some((kind, source)) = self.classify(element) else {
            return;
        };

        let id = element.id();
        let delay = self.config.debounce();
        let token = self.pending.schedule(id, source.clone(), now, delay);
        if let Some(previous) = self.records.get(&id).and_then(|r| r.pending) {
            self.pending.cancel(previous);
        }
        crate::trace!(element = ?id, source = %source, token = token.get(), "hover load scheduled");
        self.records.insert(
            id,
            HoverRecord {
                kind,
                source,
                pointer,
                pending: Some(token),
            },
        );
        host.request_wakeup(delay);
    }

    /// Pointer moved over `element`.
    pub fn pointer_move(&mut self, host: &mut H, element: &H::Element, pointer: Point) {
        if self.lifecycle != Lifecycle::Enabled || !self.is_marked(element) {
            return;
        }
        let kind = match self.records.get_mut(&element.id()) {
            Some(record) => {
                record.pointer = pointer;
                record.kind
            }
            None => element.tooltip_kind(),
        };
        let caps = host.viewport();
        if let Some(instance) = self.instance_mut(kind) {
            instance.move_to(pointer, &caps);
        }
    }

    /// Pointer left `element`.
    pub fn pointer_exit(&mut self, element: &H::Element) {
        if self.lifecycle != Lifecycle::Enabled || !self.is_marked(element) {
            return;
        }
        let kind = match self.records.remove(&element.id()) {
            Some(record) => {
                if let Some(token) = record.pending {
                    self.pending.cancel(token);
                    crate::trace!(element = ?element.id(), token = token.get(), "hover load cancelled");
                }
                record.kind
            }
            None => element.tooltip_kind(),
        };
        if let Some(instance) = self.instance_mut(kind) {
            instance.hide();
        }
    }

    /// Click anywhere in the document. Touch taps produce no exit event, so
    /// this is what dismisses the image tooltip there.
    pub fn click(&mut self) {
        if self.lifecycle != Lifecycle::Enabled {
            return;
        }
        if let Some(image) = self.image.as_mut() {
            image.hide();
        }
    }

    /// Hide both instances.
    pub fn hide_all(&mut self) {
        for instance in [self.image.as_mut(), self.text.as_mut()].into_iter().flatten() {
            instance.hide();
        }
    }

    /// Fire due debounces and expire timed-out loads.
    pub fn advance(&mut self, host: &mut H, now: Duration) {
        if self.lifecycle != Lifecycle::Enabled {
            return;
        }

        for due in self.pending.take_due(now) {
            let Some(record) = self.records.get_mut(&due.element) else {
                crate::trace!(element = ?due.element, "debounced load discarded: element inactive");
                continue;
            };
            if record.pending != Some(due.token) {
                crate::trace!(element = ?due.element, token = due.token.get(), "debounced load discarded: superseded");
                continue;
            }
            record.pending = None;
            let (kind, source, pointer) = (record.kind, record.source.clone(), record.pointer);
            self.show(host, kind, source, pointer, now);
        }

        let expired: Vec<FlightKey> = self
            .in_flight
            .iter()
            .filter(|(_, deadline)| deadline.is_some_and(|d| d <= now))
            .map(|(key, _)| key.clone())
            .collect();
        for (kind, source) in expired {
            crate::debug!(kind = ?kind, source = %source, "content load timed out");
            self.content_failed(kind, &source);
        }

        if let Some(next) = self.next_wakeup() {
            host.request_wakeup(next.saturating_sub(now));
        }
    }

    /// Content for `source` arrived (a finished load, or content the page
    /// registers up front).
    ///
    /// Image content goes to the image instance, text to the text instance.
    /// Ignored after dispose.
    pub fn content_loaded(&mut self, host: &mut H, source: SourceKey, content: Content<PanelImage<H>>) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        let kind = match content {
            Content::Image(_) => TooltipKind::Image,
            Content::Text(_) => TooltipKind::Text,
        };
        self.in_flight.remove(&(kind, source.clone()));
        let caps = host.viewport();
        let instance = self.ensure_instance(host, kind);
        instance.register_content(source, content, &caps);
    }

    /// Register an HTML fragment for `source` with the text instance.
    pub fn register_text(&mut self, host: &mut H, source: SourceKey, html: impl Into<String>) {
        self.content_loaded(host, source, Content::Text(html.into()));
    }

    /// Loading `source` for `kind` failed. The failure is not cached: the
    /// next hover loads again.
    pub fn content_failed(&mut self, kind: TooltipKind, source: &SourceKey) {
        if self.lifecycle == Lifecycle::Disposed {
            return;
        }
        if self.in_flight.remove(&(kind, source.clone())).is_none() {
            return;
        }
        if let Some(instance) = self.instance_mut(kind) {
            instance.fail_load(source);
        }
    }

    // -- internals ----------------------------------------------------------

    fn show(&mut self, host: &mut H, kind: TooltipKind, source: SourceKey, pointer: Point, now: Duration) {
        let caps = host.viewport();
        let instance = self.ensure_instance(host, kind);
        if instance.show(pointer, source.clone(), &caps) == ShowOutcome::Rendered {
            return;
        }
        let key = (kind, source.clone());
        if self.in_flight.contains_key(&key) {
            return;
        }

        let timeout = self.config.load_timeout();
        self.in_flight.insert(key, timeout.map(|t| now.saturating_add(t)));
        let address = self.config.address_for(&source);
        crate::debug!(source = %source, address = %address, "content load started");
        host.begin_load(kind, LoadRequest { source, address });
        if let Some(timeout) = timeout {
            host.request_wakeup(timeout);
        }
    }

    fn next_wakeup(&self) -> Option<Duration> {
        let flights = self.in_flight.values().filter_map(|deadline| *deadline);
        self.pending.next_due().into_iter().chain(flights).min()
    }

    fn instance_mut(&mut self, kind: TooltipKind) -> Option<&mut TooltipInstance<H::Panel>> {
        match kind {
            TooltipKind::Image => self.image.as_mut(),
            TooltipKind::Text => self.text.as_mut(),
        }
    }

    fn ensure_instance(&mut self, host: &mut H, kind: TooltipKind) -> &mut TooltipInstance<H::Panel> {
        let layout = InstanceLayout {
            cursor: self.config.cursor(),
            text_max_width: self.config.text_max_width,
            text_margin: self.config.text_margin,
        };
        let slot = match kind {
            TooltipKind::Image => &mut self.image,
            TooltipKind::Text => &mut self.text,
        };
        slot.get_or_insert_with(|| {
            crate::debug!(kind = ?kind, "tooltip panel created");
            TooltipInstance::new(kind, host.create_panel(kind), layout)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{MemoryElement, MemoryHost};
    use crate::instance::TooltipState;
    use pretty_assertions::assert_eq;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    fn enabled() -> HoverController<MemoryHost> {
        let mut c = HoverController::new(HoverConfig::default());
        c.enable().unwrap();
        c
    }

    #[test]
    fn lifecycle_transitions() {
        let mut c: HoverController<MemoryHost> = HoverController::new(HoverConfig::default());
        assert_eq!(c.lifecycle(), Lifecycle::Idle);
        assert_eq!(c.enable(), Ok(()));
        assert_eq!(c.enable(), Err(CardtipError::AlreadyEnabled));
        c.dispose();
        assert_eq!(c.lifecycle(), Lifecycle::Disposed);
        assert_eq!(c.enable(), Err(CardtipError::Disposed));
    }

    #[test]
    fn events_ignored_while_idle() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = HoverController::new(HoverConfig::default());
        let card = MemoryElement::card(1, "Lightning Bolt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        assert_eq!(c.pending_len(), 0);
        assert!(host.wakeups.is_empty());
    }

    #[test]
    fn classify_requires_marker_text_and_no_opt_out() {
        let c = enabled();
        assert_eq!(
            c.classify(&MemoryElement::card(1, "2 Counterspell")),
            Some((TooltipKind::Image, SourceKey::new("Counterspell")))
        );
        assert_eq!(c.classify(&MemoryElement::plain(2, "Counterspell")), None);
        assert_eq!(c.classify(&MemoryElement::card(3, "Counterspell").opted_out()), None);
        assert_eq!(c.classify(&MemoryElement::card(4, "3 ")), None);
    }

    #[test]
    fn enter_schedules_and_requests_wakeup() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let card = MemoryElement::card(1, "Lightning Bolt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        assert_eq!(c.pending_len(), 1);
        assert_eq!(host.wakeups, vec![ms(200)]);
        assert!(c.record(1).is_some());
    }

    #[test]
    fn reenter_supersedes_previous_token() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let card = MemoryElement::card(1, "Lightning Bolt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        c.pointer_enter(&mut host, &card, Point::new(12, 10), ms(150));
        assert_eq!(c.pending_len(), 1);

        c.advance(&mut host, ms(200));
        assert!(host.loads.is_empty());
        c.advance(&mut host, ms(350));
        assert_eq!(host.loads.len(), 1);
    }

    #[test]
    fn move_over_unmarked_element_is_ignored() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let card = MemoryElement::card(1, "Lightning Bolt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        let before = c.instance(TooltipKind::Image).unwrap().last_pointer();

        c.pointer_move(&mut host, &MemoryElement::plain(9, "text"), Point::new(500, 500));
        assert_eq!(c.instance(TooltipKind::Image).unwrap().last_pointer(), before);
    }

    #[test]
    fn exit_of_unrelated_card_still_hides_shared_instance() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let a = MemoryElement::card(1, "Opt");
        let b = MemoryElement::card(2, "Shock");
        c.pointer_enter(&mut host, &a, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        assert!(c.instance(TooltipKind::Image).unwrap().is_displayed());

        c.pointer_exit(&b);
        assert_eq!(c.instance(TooltipKind::Image).unwrap().state(), &TooltipState::Hidden);
        assert!(c.record(1).is_some());
    }

    #[test]
    fn one_fetch_per_source_in_flight() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let a = MemoryElement::card(1, "Opt");
        let b = MemoryElement::card(2, "1 Opt");
        c.pointer_enter(&mut host, &a, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        c.pointer_exit(&a);
        c.pointer_enter(&mut host, &b, Point::new(10, 40), ms(250));
        c.advance(&mut host, ms(450));
        assert_eq!(host.fetch_count("Opt"), 1);
        assert_eq!(
            c.instance(TooltipKind::Image).unwrap().state(),
            &TooltipState::Loading(SourceKey::new("Opt"))
        );
    }

    #[test]
    fn timeout_shows_failure_and_next_hover_retries() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = HoverController::new(HoverConfig::default().load_timeout_ms(Some(1000)));
        c.enable().unwrap();
        let card = MemoryElement::card(1, "Opt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        c.advance(&mut host, ms(1200));
        assert_eq!(
            c.instance(TooltipKind::Image).unwrap().state(),
            &TooltipState::Failed(SourceKey::new("Opt"))
        );

        c.pointer_exit(&card);
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(1300));
        c.advance(&mut host, ms(1500));
        assert_eq!(host.fetch_count("Opt"), 2);
    }

    #[test]
    fn no_timeout_keeps_loading() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = HoverController::new(HoverConfig::default().load_timeout_ms(None));
        c.enable().unwrap();
        let card = MemoryElement::card(1, "Opt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        c.advance(&mut host, ms(600_000));
        assert_eq!(
            c.instance(TooltipKind::Image).unwrap().state(),
            &TooltipState::Loading(SourceKey::new("Opt"))
        );
    }

    #[test]
    fn late_content_after_dispose_is_ignored() {
        let mut host = MemoryHost::new(1000, 800);
        let mut c = enabled();
        let card = MemoryElement::card(1, "Opt");
        c.pointer_enter(&mut host, &card, Point::new(10, 10), ms(0));
        c.advance(&mut host, ms(200));
        c.dispose();

        let image = host.image_for("Opt");
        c.content_loaded(&mut host, SourceKey::new("Opt"), Content::Image(image));
        assert!(c.instance(TooltipKind::Image).is_none());
        assert_eq!(host.created.len(), 1);
    }

    #[test]
    fn preload_lists_marked_elements() {
        let c = enabled();
        let elements = [
            MemoryElement::card(1, "4 Lightning Bolt"),
            MemoryElement::plain(2, "Island"),
            MemoryElement::card(3, "Who?"),
        ];
        let addresses: Vec<String> = c
            .preload_addresses(elements.iter())
            .into_iter()
            .map(|a| a.to_string())
            .collect();
        assert_eq!(
            addresses,
            vec![
                "https://deckbox.org/mtg/Lightning Bolt/tooltip".to_string(),
                "https://deckbox.org/mtg/Who/tooltip".to_string(),
            ]
        );
    }
}
