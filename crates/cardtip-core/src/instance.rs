#![forbid(unsafe_code)]

//! One floating tooltip panel and its lifecycle.
//!
//! # States
//!
//! ```text
//! image kind:  Hidden ──show──▶ Loading ──content──▶ Visible ──hide──▶ Hidden
//!                                  │                    ▲
//!                                  └──fail──▶ Failed ───┘ (late content)
//! text kind:   Hidden ◀──────────────▶ Visible
//! ```
//!
//! A text-kind show whose content is not registered yet waits in `Loading`
//! without displaying anything; registration then makes it visible.
//!
//! # Invariants
//!
//! 1. Content only replaces the body while the instance is still showing (or
//!    waiting for) that source. A `hide` in between turns a late completion
//!    into a cache fill with no visible effect.
//! 2. Every placement uses the most recent pointer, including the one that
//!    follows a late load completion.
//! 3. `move_to` never re-renders; it only repositions.
//! 4. The body is rendered before the panel is made visible.
//! 5. `hide` keeps the body and the cache, so re-entry is instant.

use std::collections::HashMap;

use crate::content::{Content, SourceKey};
use crate::geometry::Point;
use crate::panel::{LOADING_TEXT, Panel, PanelBody, UNAVAILABLE_TEXT, text_table_markup};
use crate::placement::{CursorOffset, fit_in};
use crate::viewport::ViewportCapabilities;

/// The two tooltip flavors. Exactly one instance of each exists per
/// controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TooltipKind {
    /// Lazily loaded image.
    Image,
    /// Pre-registered HTML fragment.
    Text,
}

impl TooltipKind {
    /// CSS classes of the panel element; the external stylesheet keys on
    /// these.
    #[must_use]
    pub const fn panel_class(self) -> &'static str {
        match self {
            Self::Image => "deckbox_i_tooltip image",
            Self::Text => "deckbox_t_tooltip text",
        }
    }
}

/// Lifecycle state of an instance.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TooltipState {
    #[default]
    Hidden,
    /// Shown for `source`, content not available yet.
    Loading(SourceKey),
    /// Loading `source` failed or timed out; the failure body is shown.
    Failed(SourceKey),
    /// Showing the content of `source`.
    Visible(SourceKey),
}

impl TooltipState {
    /// Source the instance is showing or waiting for.
    #[must_use]
    pub fn source(&self) -> Option<&SourceKey> {
        match self {
            Self::Hidden => None,
            Self::Loading(s) | Self::Failed(s) | Self::Visible(s) => Some(s),
        }
    }
}

/// Result of [`TooltipInstance::show`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShowOutcome {
    /// Content came from the cache and is on screen.
    Rendered,
    /// Content must be loaded and handed to
    /// [`register_content`](TooltipInstance::register_content).
    NeedsContent,
}

/// Layout parameters shared by both kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstanceLayout {
    pub cursor: CursorOffset,
    /// Upper bound for the measured text table width.
    pub text_max_width: i32,
    /// Added to the clamped text width.
    pub text_margin: i32,
}

impl Default for InstanceLayout {
    fn default() -> Self {
        Self {
            cursor: CursorOffset::default(),
            text_max_width: 330,
            text_margin: 20,
        }
    }
}

/// A tooltip panel plus its state and content cache.
#[derive(Debug)]
pub struct TooltipInstance<P: Panel> {
    kind: TooltipKind,
    panel: P,
    layout: InstanceLayout,
    state: TooltipState,
    last_pointer: Point,
    cache: HashMap<SourceKey, Content<P::Image>>,
}

impl<P: Panel> TooltipInstance<P> {
    /// Wrap a freshly created, hidden panel.
    pub fn new(kind: TooltipKind, mut panel: P, layout: InstanceLayout) -> Self {
        panel.set_visible(false);
        Self {
            kind,
            panel,
            layout,
            state: TooltipState::Hidden,
            last_pointer: Point::ZERO,
            cache: HashMap::new(),
        }
    }

    #[must_use]
    pub fn kind(&self) -> TooltipKind {
        self.kind
    }

    #[must_use]
    pub fn state(&self) -> &TooltipState {
        &self.state
    }

    /// The owned panel.
    #[must_use]
    pub fn panel(&self) -> &P {
        &self.panel
    }

    /// Most recent pointer position handed to `show` or `move_to`.
    #[must_use]
    pub fn last_pointer(&self) -> Point {
        self.last_pointer
    }

    /// Whether content for `source` is cached.
    #[must_use]
    pub fn has_content(&self, source: &SourceKey) -> bool {
        self.cache.contains_key(source)
    }

    /// Whether the panel is currently on screen.
    #[must_use]
    pub fn is_displayed(&self) -> bool {
        match self.state {
            TooltipState::Hidden => false,
            TooltipState::Visible(_) => true,
            TooltipState::Loading(_) | TooltipState::Failed(_) => self.kind == TooltipKind::Image,
        }
    }

    /// Show the tooltip for `source` near `pointer`.
    pub fn show(
        &mut self,
        pointer: Point,
        source: SourceKey,
        caps: &dyn ViewportCapabilities,
    ) -> ShowOutcome {
        self.last_pointer = pointer;

        if let Some(content) = self.cache.get(&source) {
            render_content(&mut self.panel, &self.layout, content);
            self.panel.set_visible(true);
            self.place(caps);
            crate::debug!(kind = ?self.kind, source = %source, "tooltip shown from cache");
            self.state = TooltipState::Visible(source);
            return ShowOutcome::Rendered;
        }

        match self.kind {
            TooltipKind::Image => {
                self.panel.set_width(None);
                self.panel.render(PanelBody::Placeholder(LOADING_TEXT));
                self.panel.set_visible(true);
                self.place(caps);
            }
            TooltipKind::Text => self.panel.set_visible(false),
        }
        crate::debug!(kind = ?self.kind, source = %source, "tooltip waiting for content");
        self.state = TooltipState::Loading(source);
        ShowOutcome::NeedsContent
    }

    /// Store content for `source`; if the instance is showing or waiting for
    /// that source, render it and reposition at the latest pointer.
    ///
    /// Returns whether the panel was re-rendered.
    pub fn register_content(
        &mut self,
        source: SourceKey,
        content: Content<P::Image>,
        caps: &dyn ViewportCapabilities,
    ) -> bool {
        let wanted = self.state.source() == Some(&source);
        self.cache.insert(source.clone(), content);

        if !wanted {
            crate::trace!(kind = ?self.kind, source = %source, "content cached");
            return false;
        }
        let Some(content) = self.cache.get(&source) else {
            return false;
        };

        render_content(&mut self.panel, &self.layout, content);
        self.panel.set_visible(true);
        self.place(caps);
        crate::debug!(kind = ?self.kind, source = %source, "tooltip content rendered");
        self.state = TooltipState::Visible(source);
        true
    }

    /// Mark the load of `source` as failed.
    ///
    /// Only has an effect while still waiting for that source. The image kind
    /// swaps the placeholder for the failure text; the text kind stays
    /// hidden. Returns whether the state changed.
    pub fn fail_load(&mut self, source: &SourceKey) -> bool {
        if self.state != TooltipState::Loading(source.clone()) {
            return false;
        }
        crate::debug!(kind = ?self.kind, source = %source, "tooltip load failed");
        match self.kind {
            TooltipKind::Image => {
                self.panel.render(PanelBody::Placeholder(UNAVAILABLE_TEXT));
                self.state = TooltipState::Failed(source.clone());
            }
            TooltipKind::Text => {
                self.panel.set_visible(false);
                self.state = TooltipState::Hidden;
            }
        }
        true
    }

    /// Follow the pointer. Remembers `pointer` even while hidden.
    pub fn move_to(&mut self, pointer: Point, caps: &dyn ViewportCapabilities) {
        self.last_pointer = pointer;
        if self.is_displayed() {
            self.place(caps);
        }
    }

    /// Hide the panel, keeping its body and the cache.
    pub fn hide(&mut self) {
        if self.state == TooltipState::Hidden {
            return;
        }
        crate::debug!(kind = ?self.kind, "tooltip hidden");
        self.panel.set_visible(false);
        self.state = TooltipState::Hidden;
    }

    /// Remove the panel from the document. The instance is consumed.
    pub fn dispose(self) {
        crate::debug!(kind = ?self.kind, "tooltip disposed");
        self.panel.detach();
    }

    fn place(&mut self, caps: &dyn ViewportCapabilities) {
        let size = self.panel.measured_size();
        let anchor = self.layout.cursor.anchor(self.last_pointer, size);
        self.panel.set_position(fit_in(anchor, size, caps));
    }
}

fn render_content<P: Panel>(panel: &mut P, layout: &InstanceLayout, content: &Content<P::Image>) {
    match content {
        Content::Image(image) => {
            panel.set_width(None);
            panel.render(PanelBody::Image(image));
        }
        Content::Text(html) => {
            panel.set_width(None);
            panel.render(PanelBody::Markup(text_table_markup(html)));
            let measured = panel.body_width().clamp(0, layout.text_max_width);
            panel.set_width(Some(layout.text_margin + measured));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Size;
    use crate::harness::{MemoryBody, MemoryImage, MemoryPanel};
    use crate::viewport::FixedViewport;
    use pretty_assertions::assert_eq;

    const VIEWPORT: FixedViewport = FixedViewport::new(1000, 800);

    fn image_instance() -> TooltipInstance<MemoryPanel> {
        TooltipInstance::new(
            TooltipKind::Image,
            MemoryPanel::new(TooltipKind::Image),
            InstanceLayout::default(),
        )
    }

    fn text_instance() -> TooltipInstance<MemoryPanel> {
        TooltipInstance::new(
            TooltipKind::Text,
            MemoryPanel::new(TooltipKind::Text),
            InstanceLayout::default(),
        )
    }

    fn bolt() -> SourceKey {
        SourceKey::new("Lightning Bolt")
    }

    fn card_image() -> Content<MemoryImage> {
        Content::Image(MemoryImage::new("Lightning Bolt", Size::new(223, 310)))
    }

    #[test]
    fn show_without_content_renders_loading() {
        let mut tip = image_instance();
        let outcome = tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        assert_eq!(outcome, ShowOutcome::NeedsContent);
        assert_eq!(tip.state(), &TooltipState::Loading(bolt()));
        assert!(tip.panel().is_visible());
        assert_eq!(tip.panel().body(), &MemoryBody::Placeholder(LOADING_TEXT));
    }

    #[test]
    fn content_after_show_renders_at_latest_pointer() {
        let mut tip = image_instance();
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        tip.move_to(Point::new(150, 420), &VIEWPORT);

        assert!(tip.register_content(bolt(), card_image(), &VIEWPORT));
        assert_eq!(tip.state(), &TooltipState::Visible(bolt()));
        // cursor offset: +15 right, lifted by 310 / 3
        assert_eq!(tip.panel().position(), Some(Point::new(165, 420 - 103)));
    }

    #[test]
    fn content_after_hide_is_cached_but_not_shown() {
        let mut tip = image_instance();
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        tip.hide();

        assert!(!tip.register_content(bolt(), card_image(), &VIEWPORT));
        assert_eq!(tip.state(), &TooltipState::Hidden);
        assert!(!tip.panel().is_visible());
        assert!(tip.has_content(&bolt()));
    }

    #[test]
    fn content_for_other_source_does_not_replace_body() {
        let mut tip = image_instance();
        tip.show(Point::new(100, 400), SourceKey::new("Shock"), &VIEWPORT);
        assert!(!tip.register_content(bolt(), card_image(), &VIEWPORT));
        assert_eq!(tip.panel().body(), &MemoryBody::Placeholder(LOADING_TEXT));
    }

    #[test]
    fn cached_show_is_immediate() {
        let mut tip = image_instance();
        tip.register_content(bolt(), card_image(), &VIEWPORT);
        let outcome = tip.show(Point::new(10, 10), bolt(), &VIEWPORT);
        assert_eq!(outcome, ShowOutcome::Rendered);
        assert!(matches!(tip.panel().body(), MemoryBody::Image(_)));
    }

    #[test]
    fn move_while_hidden_only_remembers() {
        let mut tip = image_instance();
        tip.move_to(Point::new(300, 300), &VIEWPORT);
        assert_eq!(tip.last_pointer(), Point::new(300, 300));
        assert_eq!(tip.panel().position(), None);
        assert_eq!(tip.panel().render_count(), 0);
    }

    #[test]
    fn move_while_visible_repositions_without_render() {
        let mut tip = image_instance();
        tip.register_content(bolt(), card_image(), &VIEWPORT);
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        let renders = tip.panel().render_count();

        tip.move_to(Point::new(150, 400), &VIEWPORT);
        assert_eq!(tip.panel().position(), Some(Point::new(165, 297)));
        assert_eq!(tip.panel().render_count(), renders);
    }

    #[test]
    fn hide_keeps_body() {
        let mut tip = image_instance();
        tip.register_content(bolt(), card_image(), &VIEWPORT);
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        tip.hide();
        assert!(!tip.panel().is_visible());
        assert!(matches!(tip.panel().body(), MemoryBody::Image(_)));
    }

    #[test]
    fn failure_replaces_placeholder_and_late_content_recovers() {
        let mut tip = image_instance();
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        assert!(tip.fail_load(&bolt()));
        assert_eq!(tip.panel().body(), &MemoryBody::Placeholder(UNAVAILABLE_TEXT));
        assert!(tip.is_displayed());
        assert!(!tip.fail_load(&bolt()));

        assert!(tip.register_content(bolt(), card_image(), &VIEWPORT));
        assert_eq!(tip.state(), &TooltipState::Visible(bolt()));
    }

    #[test]
    fn failure_after_hide_is_ignored() {
        let mut tip = image_instance();
        tip.show(Point::new(100, 400), bolt(), &VIEWPORT);
        tip.hide();
        assert!(!tip.fail_load(&bolt()));
        assert_eq!(tip.state(), &TooltipState::Hidden);
    }

    #[test]
    fn text_show_waits_hidden_until_registered() {
        let mut tip = text_instance();
        let outcome = tip.show(Point::new(100, 100), bolt(), &VIEWPORT);
        assert_eq!(outcome, ShowOutcome::NeedsContent);
        assert!(!tip.panel().is_visible());
        assert!(!tip.is_displayed());

        assert!(tip.register_content(bolt(), Content::Text("Deal 3 damage".into()), &VIEWPORT));
        assert!(tip.panel().is_visible());
        match tip.panel().body() {
            MemoryBody::Markup(markup) => assert!(markup.contains("<td>Deal 3 damage</td>")),
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn text_width_is_clamped() {
        let mut tip = text_instance();
        tip.show(Point::new(100, 100), bolt(), &VIEWPORT);

        fn panel_text_width(w: i32, tip: &mut TooltipInstance<MemoryPanel>) -> Option<i32> {
            tip.panel.set_natural_body_width(w);
            tip.register_content(bolt(), Content::Text("x".into()), &VIEWPORT);
            tip.panel().width()
        }
        assert_eq!(panel_text_width(120, &mut tip), Some(140));
        assert_eq!(panel_text_width(900, &mut tip), Some(350));
    }

    #[test]
    fn dispose_detaches_panel() {
        let tip = image_instance();
        let detached = tip.panel().detached_flag();
        tip.dispose();
        assert!(detached.get());
    }
}
