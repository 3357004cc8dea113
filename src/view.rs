//! The viewer session: one owned state object threaded through every
//! input handler.
//!
//! `ViewState` ties navigation, zoom, scroll axes, geometry and overlays
//! together. It never touches the terminal; operations update state, mark
//! the view dirty, and the event loop redraws. Page dimensions come from a
//! [`PageGeometry`] so the whole state machine runs without a real PDF.

use std::time::{Duration, Instant};

use log::debug;

use crate::advance::{self, Advance};
use crate::geometry::{self, Fit, PageSize, PixelSize, Placement};
use crate::navigation::Navigator;
use crate::overlay::{OverlayChannel, Overlays};
use crate::scroll::ScrollAxis;
use crate::zoom::Zoom;

/// Source of page dimensions (in points).
pub trait PageGeometry {
    fn page_count(&self) -> usize;
    fn page_size(&self, index: usize) -> Option<PageSize>;
}

impl PageGeometry for [PageSize] {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        self.get(index).copied()
    }
}

impl PageGeometry for Vec<PageSize> {
    fn page_count(&self) -> usize {
        self.len()
    }

    fn page_size(&self, index: usize) -> Option<PageSize> {
        self.get(index).copied()
    }
}

/// Startup options for a session.
#[derive(Debug, Clone)]
pub struct ViewOptions {
    pub spread: bool,
    pub fullscreen: bool,
    pub overlay_dwell: Duration,
    /// Arrow-key scroll distance in pixels.
    pub scroll_step: f64,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            spread: true,
            fullscreen: true,
            overlay_dwell: crate::overlay::DEFAULT_DWELL,
            scroll_step: 90.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

pub struct ViewState {
    nav: Navigator,
    zoom: Zoom,
    hscroll: ScrollAxis,
    vscroll: ScrollAxis,
    viewport: PixelSize,
    fit: Option<Fit>,
    placement: Option<Placement>,
    overlays: Overlays,
    fullscreen: bool,
    pending_recenter: bool,
    scroll_step: f64,
    dirty: bool,
}

impl ViewState {
    pub fn new(page_count: usize, options: &ViewOptions) -> Self {
        Self {
            nav: Navigator::new(page_count, options.spread),
            zoom: Zoom::default(),
            hscroll: ScrollAxis::default(),
            vscroll: ScrollAxis::default(),
            viewport: PixelSize::default(),
            fit: None,
            placement: None,
            overlays: Overlays::new(options.overlay_dwell),
            fullscreen: options.fullscreen,
            pending_recenter: false,
            scroll_step: options.scroll_step,
            dirty: true,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn zoom(&self) -> &Zoom {
        &self.zoom
    }

    pub fn horizontal(&self) -> &ScrollAxis {
        &self.hscroll
    }

    pub fn vertical(&self) -> &ScrollAxis {
        &self.vscroll
    }

    pub fn viewport(&self) -> PixelSize {
        self.viewport
    }

    pub fn fit(&self) -> Option<&Fit> {
        self.fit.as_ref()
    }

    pub fn placement(&self) -> Option<&Placement> {
        self.placement.as_ref()
    }

    pub fn overlays(&self) -> &Overlays {
        &self.overlays
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Scroll offset of the viewport inside the content area.
    pub fn scroll_offset(&self) -> (f64, f64) {
        (self.hscroll.value, self.vscroll.value)
    }

    pub fn needs_redraw(&self) -> bool {
        self.dirty
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn clear_dirty(&mut self) {
        self.dirty = false;
    }

    // -----------------------------------------------------------------------
    // Layout
    // -----------------------------------------------------------------------

    /// Recompute scale, content size and page placement, then resize the
    /// scroll axes to the new content.
    pub fn relayout<P: PageGeometry + ?Sized>(&mut self, pages: &P) {
        let left_idx = self.nav.current_left();
        let right_idx = self.nav.right_page();
        let left = pages.page_size(left_idx);
        let right = right_idx.and_then(|i| pages.page_size(i).map(|s| (i, s)));

        match left {
            Some(left) => {
                let fit = geometry::compute_scale(
                    left,
                    right.map(|(_, s)| s),
                    self.viewport,
                    self.zoom.factor(),
                );
                self.placement = Some(geometry::place_pages(&fit, (left_idx, left), right));
                self.fit = Some(fit);
                debug!(
                    "layout: pages {left_idx}{} scale={:.4} content={}x{} viewport={}x{}",
                    right.map(|(i, _)| format!("+{i}")).unwrap_or_default(),
                    fit.scale,
                    fit.content.width,
                    fit.content.height,
                    self.viewport.width,
                    self.viewport.height,
                );
            }
            None => {
                self.fit = None;
                self.placement = None;
            }
        }

        let content = self.fit.map(|f| f.content).unwrap_or(self.viewport);
        self.hscroll
            .configure(content.width as f64, self.viewport.width as f64);
        self.vscroll
            .configure(content.height as f64, self.viewport.height as f64);
        self.dirty = true;
    }

    /// Adopt a new viewport size (startup, terminal resize, fullscreen toggle).
    pub fn set_viewport<P: PageGeometry + ?Sized>(&mut self, pages: &P, viewport: PixelSize) {
        self.viewport = PixelSize::new(viewport.width.max(1), viewport.height.max(1));
        self.relayout(pages);
        if self.pending_recenter {
            self.hscroll.center();
            self.vscroll.center();
            self.pending_recenter = false;
            debug!(
                "layout: recentered to ({:.0}, {:.0})",
                self.hscroll.value, self.vscroll.value
            );
        }
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    fn after_page_change<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.relayout(pages);
        self.trigger_page_overlay(now);
    }

    fn trigger_page_overlay(&mut self, now: Instant) {
        self.overlays
            .trigger(OverlayChannel::Page, self.nav.page_label(), now);
        self.dirty = true;
    }

    pub fn goto_left_page<P: PageGeometry + ?Sized>(&mut self, pages: &P, index: usize, now: Instant) {
        self.nav.goto_left_page(index);
        self.after_page_change(pages, now);
    }

    /// Jump to a 1-based page number. Out-of-range numbers are ignored
    /// (no change, no overlay); returns whether the jump happened.
    pub fn goto_page_number<P: PageGeometry + ?Sized>(
        &mut self,
        pages: &P,
        number: u32,
        now: Instant,
    ) -> bool {
        match self.nav.resolve_page_number(number) {
            Some(index) => {
                self.goto_left_page(pages, index, now);
                true
            }
            None => {
                debug!("nav: page {number} out of range (count={}), ignored", self.nav.page_count());
                false
            }
        }
    }

    pub fn next_page<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.nav.next_page();
        self.after_page_change(pages, now);
    }

    pub fn prev_page<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.nav.prev_page();
        self.after_page_change(pages, now);
    }

    pub fn set_spread_mode<P: PageGeometry + ?Sized>(&mut self, pages: &P, spread: bool, now: Instant) {
        self.nav.set_spread(spread);
        self.after_page_change(pages, now);
    }

    /// Forward key: scroll through a magnified page, else turn the page.
    pub fn smart_advance<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        match advance::decide(&self.zoom, &self.vscroll) {
            Advance::ScrollTo(v) => {
                debug!("advance: scroll {:.0} → {v:.0}", self.vscroll.value);
                self.vscroll.set_value(v);
                self.dirty = true;
            }
            Advance::TurnPage => {
                self.next_page(pages, now);
                self.vscroll.to_start();
            }
        }
    }

    /// Re-normalize after the document was reloaded with `pages`.
    pub fn reload<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.nav.set_page_count(pages.page_count());
        self.after_page_change(pages, now);
    }

    // -----------------------------------------------------------------------
    // Zoom
    // -----------------------------------------------------------------------

    fn after_zoom<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.overlays
            .trigger(OverlayChannel::Zoom, self.zoom.label(), now);
        self.relayout(pages);
        self.trigger_page_overlay(now);
    }

    pub fn zoom_in<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.zoom.zoom_in();
        self.after_zoom(pages, now);
    }

    pub fn zoom_out<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.zoom.zoom_out();
        self.after_zoom(pages, now);
    }

    pub fn zoom_reset<P: PageGeometry + ?Sized>(&mut self, pages: &P, now: Instant) {
        self.zoom.reset();
        self.after_zoom(pages, now);
    }

    // -----------------------------------------------------------------------
    // Scrolling / window
    // -----------------------------------------------------------------------

    pub fn scroll(&mut self, direction: ScrollDirection) {
        let step = self.scroll_step;
        match direction {
            ScrollDirection::Up => self.vscroll.scroll_by(-step),
            ScrollDirection::Down => self.vscroll.scroll_by(step),
            ScrollDirection::Left => self.hscroll.scroll_by(-step),
            ScrollDirection::Right => self.hscroll.scroll_by(step),
        }
        debug!(
            "scroll {direction:?}: ({:.0}, {:.0})",
            self.hscroll.value, self.vscroll.value
        );
        self.dirty = true;
    }

    /// Flip fullscreen. Leaving fullscreen requests a recenter on the next
    /// viewport change, since the visible area grows or shrinks.
    pub fn toggle_fullscreen(&mut self) {
        self.fullscreen = !self.fullscreen;
        if !self.fullscreen {
            self.pending_recenter = true;
        }
        debug!("fullscreen={}", self.fullscreen);
        self.dirty = true;
    }

    // -----------------------------------------------------------------------
    // Overlay timers
    // -----------------------------------------------------------------------

    /// Deliver expired overlay timers; marks dirty if anything disappeared.
    pub fn fire_overlays(&mut self, now: Instant) -> bool {
        let hidden = self.overlays.fire_due(now);
        if hidden {
            self.dirty = true;
        }
        hidden
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.overlays.next_deadline()
    }

    /// Cancel pending timers before the view goes away.
    pub fn shutdown(&mut self) {
        self.overlays.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };

    fn pages(n: usize) -> Vec<PageSize> {
        vec![A4; n]
    }

    fn session(n: usize, spread: bool) -> (ViewState, Vec<PageSize>) {
        let doc = pages(n);
        let opts = ViewOptions {
            spread,
            ..ViewOptions::default()
        };
        let mut view = ViewState::new(n, &opts);
        view.set_viewport(&doc, PixelSize::new(1200, 800));
        (view, doc)
    }

    #[test]
    fn next_page_shows_page_overlay() {
        let (mut view, doc) = session(10, true);
        let now = Instant::now();
        view.next_page(&doc, now);
        assert_eq!(view.navigator().current_left(), 2);
        let page = view.overlays().get(OverlayChannel::Page);
        assert!(page.is_visible());
        assert_eq!(page.text(), "Pages 3-4 / 10");
        assert!(view.placement().and_then(|p| p.right).is_some());
    }

    #[test]
    fn out_of_range_goto_is_silent() {
        let (mut view, doc) = session(10, false);
        view.clear_dirty();
        let now = Instant::now();
        assert!(!view.goto_page_number(&doc, 0, now));
        assert!(!view.goto_page_number(&doc, 11, now));
        assert_eq!(view.navigator().current_left(), 0);
        assert!(!view.overlays().get(OverlayChannel::Page).is_visible());
        assert!(!view.needs_redraw());

        assert!(view.goto_page_number(&doc, 7, now));
        assert_eq!(view.navigator().current_left(), 6);
    }

    #[test]
    fn zoom_triggers_both_overlays() {
        let (mut view, doc) = session(4, false);
        let now = Instant::now();
        view.zoom_in(&doc, now);
        assert_eq!(view.overlays().get(OverlayChannel::Zoom).text(), "110 %");
        assert!(view.overlays().get(OverlayChannel::Page).is_visible());
        view.zoom_reset(&doc, now);
        assert_eq!(view.zoom().factor(), 1.0);
        assert_eq!(view.overlays().get(OverlayChannel::Zoom).text(), "100 %");
    }

    #[test]
    fn zoom_grows_scrollable_content() {
        let (mut view, doc) = session(4, false);
        assert!(!view.vertical().is_scrollable());
        let now = Instant::now();
        for _ in 0..8 {
            view.zoom_in(&doc, now);
        }
        assert!(view.vertical().is_scrollable());
        let fit = view.fit().expect("laid out");
        assert!(fit.content.height > 800);
    }

    #[test]
    fn smart_advance_unzoomed_is_next_page() {
        let (mut view, doc) = session(10, true);
        let (mut reference, _) = session(10, true);
        let now = Instant::now();
        view.smart_advance(&doc, now);
        reference.next_page(&doc, now);
        assert_eq!(view.navigator(), reference.navigator());
    }

    #[test]
    fn smart_advance_scrolls_then_turns() {
        let (mut view, doc) = session(3, false);
        let now = Instant::now();
        for _ in 0..8 {
            view.zoom_in(&doc, now);
        }
        let page = view.vertical().page_size;
        let bottom = view.vertical().max_value();

        view.smart_advance(&doc, now);
        assert_eq!(view.navigator().current_left(), 0);
        assert!((view.vertical().value - page * 0.9).abs() < 1e-9);

        let mut guard = 0;
        while view.navigator().current_left() == 0 {
            assert!(view.vertical().value <= bottom);
            view.smart_advance(&doc, now);
            guard += 1;
            assert!(guard < 20, "never turned the page");
        }
        assert_eq!(view.navigator().current_left(), 1);
        assert_eq!(view.vertical().value, view.vertical().lower);
    }

    #[test]
    fn prev_page_never_scrolls() {
        let (mut view, doc) = session(5, false);
        let now = Instant::now();
        view.goto_left_page(&doc, 2, now);
        for _ in 0..8 {
            view.zoom_in(&doc, now);
        }
        view.scroll(ScrollDirection::Down);
        view.prev_page(&doc, now);
        assert_eq!(view.navigator().current_left(), 1);
    }

    #[test]
    fn leaving_fullscreen_recenters() {
        let (mut view, doc) = session(2, false);
        let now = Instant::now();
        for _ in 0..10 {
            view.zoom_in(&doc, now);
        }
        view.toggle_fullscreen();
        assert!(!view.is_fullscreen());
        view.set_viewport(&doc, PixelSize::new(1200, 780));
        let v = view.vertical();
        assert!((v.value - (v.upper - v.page_size) / 2.0).abs() < 1e-9);

        // Entering fullscreen again does not move the view.
        view.scroll(ScrollDirection::Down);
        let before = view.vertical().value;
        view.toggle_fullscreen();
        view.set_viewport(&doc, PixelSize::new(1200, 800));
        assert!(view.vertical().value <= before);
    }

    #[test]
    fn arrow_scroll_is_clamped() {
        let (mut view, doc) = session(2, false);
        let now = Instant::now();
        for _ in 0..10 {
            view.zoom_in(&doc, now);
        }
        assert!(view.horizontal().is_scrollable());
        for _ in 0..100 {
            view.scroll(ScrollDirection::Right);
        }
        assert_eq!(view.horizontal().value, view.horizontal().max_value());
        for _ in 0..100 {
            view.scroll(ScrollDirection::Left);
        }
        assert_eq!(view.horizontal().value, 0.0);
    }

    #[test]
    fn overlays_expire_and_request_redraw() {
        let (mut view, doc) = session(3, false);
        let now = Instant::now();
        view.next_page(&doc, now);
        view.clear_dirty();
        assert!(!view.fire_overlays(now + Duration::from_millis(100)));
        assert!(view.fire_overlays(now + Duration::from_millis(900)));
        assert!(view.needs_redraw());
        assert_eq!(view.next_deadline(), None);
    }

    #[test]
    fn reload_with_fewer_pages_clamps() {
        let (mut view, doc) = session(10, true);
        let now = Instant::now();
        view.goto_left_page(&doc, 8, now);
        let smaller = pages(5);
        view.reload(&smaller, now);
        assert_eq!(view.navigator().current_left(), 4);
        assert_eq!(view.navigator().page_count(), 5);
    }

    #[test]
    fn shutdown_disarms_timers() {
        let (mut view, doc) = session(3, false);
        let now = Instant::now();
        view.zoom_in(&doc, now);
        view.shutdown();
        assert_eq!(view.overlays().pending(), 0);
    }
}
