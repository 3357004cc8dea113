//! Terminal score viewer with Kitty Graphics Protocol
//!
//! Layout:
//!   rows 0..image_rows : page area (one or two rendered pages)
//!   row rows-1         : status bar (hidden in fullscreen)
//!
//! Pages are rendered by mupdf at the layout scale in fixed-size tiles.
//! Only tiles intersecting the viewport are rendered and uploaded, once
//! per (page, scale, tile), and each is placed with a source crop matching
//! the scroll position. Scrolling re-renders only newly exposed tiles.
//! Overlays, the status bar and dialogs live on the text layer above the
//! images (placements use z=-1).
//!
//! Kitty response suppression:
//!   All Kitty Graphics Protocol commands use `q=2`. Without it, replies are
//!   delivered as APC sequences that crossterm misparses as key events.

mod dialog;
mod help;
mod images;
mod input;
mod state;
mod terminal;

use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::{
    event::{self, Event},
    terminal as crossterm_terminal,
};
use log::{debug, info, warn};

use crate::config::Config;
use crate::dialog::{Dialogs, ask_page_number};
use crate::document::ScoreDocument;
use crate::extract::{self, ExtractOutcome, QpdfExtractor};
use crate::overlay::OverlayChannel;
use crate::view::{ViewOptions, ViewState};
use crate::watch::FileWatcher;

use dialog::TerminalDialogs;
use images::{LoadError, LoadedTiles, TileKey};
use input::{Action, map_key_event};
use state::{Layout, compute_layout, plan_tiles};
use terminal::BoxRow;

const IDLE_TIMEOUT: Duration = Duration::from_secs(86400);

enum Flow {
    Continue,
    Quit,
}

/// Everything the event loop owns, handed by `&mut` to each handler.
struct Session {
    doc: ScoreDocument,
    view: ViewState,
    layout: Layout,
    images: LoadedTiles,
    extractor: QpdfExtractor,
    /// One-shot status message, cleared on the next keypress.
    flash: Option<String>,
}

/// Run the terminal viewer on an opened score until the user quits.
pub fn run(doc: ScoreDocument, config: &Config, watch: bool) -> anyhow::Result<()> {
    terminal::check_tty()?;

    let options = ViewOptions {
        spread: config.spread,
        fullscreen: config.fullscreen,
        overlay_dwell: config.viewer.overlay_dwell,
        scroll_step: f64::from(config.viewer.scroll_step),
    };
    let view = ViewState::new(doc.page_count(), &options);
    let layout = query_layout(!view.is_fullscreen())?;

    let mut watcher = if watch {
        match FileWatcher::new(doc.path(), config.viewer.watch_interval) {
            Ok(w) => Some(w),
            Err(e) => {
                warn!("watch: disabled: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let mut guard = terminal::RawGuard::enter()?;

    let mut session = Session {
        doc,
        view,
        layout,
        images: LoadedTiles::new(),
        extractor: QpdfExtractor::new(config.extract_command.clone()),
        flash: None,
    };
    session
        .view
        .set_viewport(&session.doc, session.layout.viewport_px());
    info!(
        "viewer: {} ({} pages), viewport {}x{} px",
        session.doc.file_name(),
        session.doc.page_count(),
        session.layout.viewport_px().width,
        session.layout.viewport_px().height
    );

    let frame_budget = config.viewer.frame_budget;
    let mut last_render: Option<Instant> = None;

    loop {
        let now = Instant::now();
        session.view.fire_overlays(now);

        if let Some(w) = watcher.as_mut()
            && w.poll(now)
        {
            session.reload(now);
        }

        let budget_left = last_render
            .map(|t| frame_budget.saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);
        if session.view.needs_redraw() && budget_left.is_zero() {
            session.redraw()?;
            last_render = Some(Instant::now());
            continue;
        }

        let timeout = poll_timeout(&session.view, watcher.as_ref(), budget_left, now);
        if !event::poll(timeout)? {
            continue;
        }
        let ev = event::read()?;
        debug!("event: {ev:?}");
        match ev {
            Event::Key(key) => {
                let Some(action) = map_key_event(key, session.view.zoom().is_magnified()) else {
                    continue;
                };
                if session.flash.take().is_some() {
                    session.view.mark_dirty();
                }
                match session.dispatch(action)? {
                    Flow::Continue => {}
                    Flow::Quit => break,
                }
            }
            Event::Resize(cols, rows) => {
                debug!("resize: {cols}x{rows}");
                session.refresh_layout()?;
            }
            _ => {}
        }
    }

    session.view.shutdown();
    guard.cleanup();
    Ok(())
}

/// Sleep until the earliest of: frame budget (when a redraw is pending),
/// next overlay expiry, watcher settle deadline.
fn poll_timeout(
    view: &ViewState,
    watcher: Option<&FileWatcher>,
    budget_left: Duration,
    now: Instant,
) -> Duration {
    let mut timeout = if view.needs_redraw() {
        budget_left
    } else {
        IDLE_TIMEOUT
    };
    let deadlines = [view.next_deadline(), watcher.and_then(FileWatcher::deadline)];
    for deadline in deadlines.into_iter().flatten() {
        timeout = timeout.min(deadline.saturating_duration_since(now));
    }
    if let Some(w) = watcher {
        // The watcher channel is polled, not woken on.
        timeout = timeout.min(w.interval());
    }
    timeout
}

fn query_layout(status_bar: bool) -> anyhow::Result<Layout> {
    let winsize = crossterm_terminal::window_size().context("failed to get terminal size")?;
    if winsize.width == 0 || winsize.height == 0 {
        anyhow::bail!(
            "terminal pixel size {}x{} is zero; Kitty graphics requires non-zero pixel dimensions",
            winsize.width,
            winsize.height
        );
    }
    Ok(compute_layout(
        winsize.columns,
        winsize.rows,
        winsize.width,
        winsize.height,
        status_bar,
    ))
}

impl Session {
    fn dispatch(&mut self, action: Action) -> anyhow::Result<Flow> {
        let now = Instant::now();
        let doc = &self.doc;
        match action {
            Action::Quit => return Ok(Flow::Quit),
            Action::Advance => self.view.smart_advance(doc, now),
            Action::Back => self.view.prev_page(doc, now),
            Action::Scroll(direction) => self.view.scroll(direction),
            Action::ZoomIn => self.view.zoom_in(doc, now),
            Action::ZoomOut => self.view.zoom_out(doc, now),
            Action::ZoomReset => self.view.zoom_reset(doc, now),
            Action::SinglePage => self.view.set_spread_mode(doc, false, now),
            Action::Spread => self.view.set_spread_mode(doc, true, now),
            Action::ToggleFullscreen => {
                self.view.toggle_fullscreen();
                self.refresh_layout()?;
            }
            Action::GotoPage => self.goto_dialog()?,
            Action::Extract => self.extract_dialog()?,
            Action::Help => {
                let text = help::help_text(self.view.navigator(), self.view.zoom());
                TerminalDialogs::new(&self.layout).message(&text)?;
                self.after_dialog()?;
            }
        }
        Ok(Flow::Continue)
    }

    fn goto_dialog(&mut self) -> anyhow::Result<()> {
        let answer = {
            let mut dialogs = TerminalDialogs::new(&self.layout);
            ask_page_number(&mut dialogs, "Go to page", "Page number (1-based):")?
        };
        if let Some(n) = answer {
            self.view.goto_page_number(&self.doc, n, Instant::now());
        }
        self.after_dialog()
    }

    fn extract_dialog(&mut self) -> anyhow::Result<()> {
        let outcome = {
            let mut dialogs = TerminalDialogs::new(&self.layout);
            extract::run_extraction(
                &mut dialogs,
                &self.extractor,
                self.doc.path(),
                self.doc.page_count(),
            )?
        };
        match &outcome {
            ExtractOutcome::Written(path) => info!("extract: done → {}", path.display()),
            ExtractOutcome::Failed(e) => warn!("extract: failed: {e}"),
            ExtractOutcome::Rejected(e) => debug!("extract: rejected: {e}"),
            ExtractOutcome::Cancelled => debug!("extract: cancelled"),
        }
        self.after_dialog()
    }

    /// Dialogs swallow resize events and leave text behind.
    fn after_dialog(&mut self) -> anyhow::Result<()> {
        self.refresh_layout()?;
        self.view.mark_dirty();
        Ok(())
    }

    /// Re-read the terminal size and adopt it (resize, fullscreen toggle).
    fn refresh_layout(&mut self) -> anyhow::Result<()> {
        let layout = query_layout(!self.view.is_fullscreen())?;
        if layout != self.layout {
            debug!(
                "layout: {}x{} cells, cell {}x{} px, status bar {}",
                layout.cols,
                layout.rows,
                layout.cell_w,
                layout.cell_h,
                layout.status_row.is_some()
            );
        }
        self.layout = layout;
        self.view.set_viewport(&self.doc, layout.viewport_px());
        Ok(())
    }

    fn reload(&mut self, now: Instant) {
        match ScoreDocument::open(self.doc.path()) {
            Ok(doc) => {
                info!("reload: {} ({} pages)", doc.path().display(), doc.page_count());
                self.doc = doc;
                if let Err(e) = self.images.clear() {
                    warn!("reload: failed to drop old images: {e}");
                }
                self.view.reload(&self.doc, now);
                self.flash = Some("Reloaded".into());
            }
            Err(e) => {
                warn!("reload: {e}");
                self.flash = Some(format!("Reload failed: {e}"));
                self.view.mark_dirty();
            }
        }
    }

    /// Full redraw.
    ///
    /// Ordering: upload missing tiles (slow) → clear text and placements →
    /// place tiles → text layer on top.
    fn redraw(&mut self) -> anyhow::Result<()> {
        let view = &self.view;
        let viewport = self.layout.viewport_px();
        let mut shown = Vec::new();
        if let (Some(fit), Some(placement)) = (view.fit(), view.placement()) {
            for (tile, crop) in plan_tiles(placement, view.scroll_offset(), viewport) {
                match self.images.ensure_loaded(&self.doc, &tile, fit.scale) {
                    Ok(id) => shown.push((TileKey::new(&tile, fit.scale), id, crop)),
                    Err(LoadError::Render { page, source }) => {
                        warn!("redraw: page index {page}: {source}");
                        self.flash = Some(format!("Render failed: {source}"));
                    }
                    Err(LoadError::Io(e)) => return Err(e.into()),
                }
            }
        }

        terminal::clear_screen()?;
        terminal::delete_placements(self.images.ids())?;
        for (_, id, crop) in &shown {
            terminal::place_crop(*id, crop, &self.layout)?;
        }

        let zoom = view.overlays().get(OverlayChannel::Zoom);
        if zoom.is_visible() {
            terminal::draw_box(&self.layout, BoxRow::Center, &[zoom.text()], true)?;
        }
        let page = view.overlays().get(OverlayChannel::Page);
        if page.is_visible() {
            terminal::draw_box(&self.layout, BoxRow::Fraction(0.08), &[page.text()], true)?;
        }
        terminal::draw_status_bar(&self.layout, &self.status_text())?;
        if view.is_fullscreen()
            && let Some(msg) = &self.flash
        {
            terminal::draw_box(&self.layout, BoxRow::Fraction(0.9), &[msg.as_str()], false)?;
        }

        let keep: Vec<TileKey> = shown.iter().map(|(k, _, _)| *k).collect();
        self.images.retain(&keep)?;
        self.view.clear_dirty();
        Ok(())
    }

    fn status_text(&self) -> String {
        let nav = self.view.navigator();
        let mode = if nav.is_spread() { "2 pages" } else { "1 page" };
        let middle = match &self.flash {
            Some(msg) => msg.clone(),
            None => "?:help  g:goto  e:extract  f:fullscreen  Esc:quit".to_string(),
        };
        format!(
            " {} | {} | {} | {} | {}",
            self.doc.file_name(),
            nav.page_label(),
            self.view.zoom().label(),
            mode,
            middle
        )
    }
}
