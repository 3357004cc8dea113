//! Transient on-screen indicators with auto-dismiss.
//!
//! Two independent channels (zoom percentage, page range). Triggering a
//! channel shows it and (re)arms a one-shot expiry task; the task hides it
//! after the dwell time unless the channel was retriggered first.
//!
//! Expiry tasks live in a [`Scheduler`] owned by the view and are delivered
//! from the event loop (`fire_due`) on the same thread that handles input.
//! Every task handle carries a generation number, so a task that fires after
//! being superseded cannot hide the overlay that replaced it.

use std::time::{Duration, Instant};

use log::debug;

/// Default time an overlay stays visible after its last trigger.
pub const DEFAULT_DWELL: Duration = Duration::from_millis(900);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayChannel {
    Zoom,
    Page,
}

/// Identifies one scheduled task. Never reused within a scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskHandle {
    pub channel: OverlayChannel,
    generation: u64,
}

/// One-shot deferred tasks keyed by handle.
#[derive(Debug, Default)]
pub struct Scheduler {
    next_generation: u64,
    tasks: Vec<(TaskHandle, Instant)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, channel: OverlayChannel, deadline: Instant) -> TaskHandle {
        let handle = TaskHandle {
            channel,
            generation: self.next_generation,
        };
        self.next_generation += 1;
        self.tasks.push((handle, deadline));
        handle
    }

    /// Remove a task before it fires. Returns false if it was not pending
    /// (already fired or cancelled); cancelling twice is harmless.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(h, _)| *h != handle);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.tasks.iter().map(|(_, d)| *d).min()
    }

    /// Remove and return every task whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: Instant) -> Vec<TaskHandle> {
        let mut due: Vec<(TaskHandle, Instant)> = Vec::new();
        self.tasks.retain(|&(h, d)| {
            if d <= now {
                due.push((h, d));
                false
            } else {
                true
            }
        });
        due.sort_by_key(|&(_, d)| d);
        due.into_iter().map(|(h, _)| h).collect()
    }
}

/// State of one overlay channel.
#[derive(Debug, Default)]
pub struct Overlay {
    visible: bool,
    text: String,
    timer: Option<TaskHandle>,
}

impl Overlay {
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_armed(&self) -> bool {
        self.timer.is_some()
    }
}

/// Both overlay channels plus the scheduler driving their expiry.
#[derive(Debug)]
pub struct Overlays {
    zoom: Overlay,
    page: Overlay,
    scheduler: Scheduler,
    dwell: Duration,
}

impl Overlays {
    pub fn new(dwell: Duration) -> Self {
        Self {
            zoom: Overlay::default(),
            page: Overlay::default(),
            scheduler: Scheduler::new(),
            dwell,
        }
    }

    pub fn get(&self, channel: OverlayChannel) -> &Overlay {
        match channel {
            OverlayChannel::Zoom => &self.zoom,
            OverlayChannel::Page => &self.page,
        }
    }

    fn get_mut(&mut self, channel: OverlayChannel) -> &mut Overlay {
        match channel {
            OverlayChannel::Zoom => &mut self.zoom,
            OverlayChannel::Page => &mut self.page,
        }
    }

    /// Show `text` on `channel` and restart its dwell window from `now`.
    pub fn trigger(&mut self, channel: OverlayChannel, text: String, now: Instant) {
        let deadline = now + self.dwell;
        let previous = self.get_mut(channel).timer.take();
        if let Some(handle) = previous {
            self.scheduler.cancel(handle);
        }
        let handle = self.scheduler.schedule(channel, deadline);
        debug!("overlay: {channel:?} \"{text}\" until +{}ms", self.dwell.as_millis());

        let overlay = self.get_mut(channel);
        overlay.visible = true;
        overlay.text = text;
        overlay.timer = Some(handle);
    }

    /// Deliver expired tasks. Returns true if any overlay was hidden.
    pub fn fire_due(&mut self, now: Instant) -> bool {
        let mut hidden = false;
        for handle in self.scheduler.take_due(now) {
            let overlay = self.get_mut(handle.channel);
            if overlay.timer != Some(handle) {
                debug!("overlay: stale expiry for {:?} ignored", handle.channel);
                continue;
            }
            overlay.visible = false;
            overlay.timer = None;
            hidden = true;
            debug!("overlay: {:?} expired", handle.channel);
        }
        hidden
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    /// Cancel every pending expiry (shutdown).
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        self.zoom.timer = None;
        self.page.timer = None;
    }

    pub fn pending(&self) -> usize {
        self.scheduler.pending()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn overlay_hides_after_dwell() {
        let t0 = Instant::now();
        let mut o = Overlays::new(DEFAULT_DWELL);
        o.trigger(OverlayChannel::Zoom, "110 %".into(), t0);
        assert!(o.get(OverlayChannel::Zoom).is_visible());
        assert_eq!(o.get(OverlayChannel::Zoom).text(), "110 %");

        assert!(!o.fire_due(t0 + ms(899)));
        assert!(o.get(OverlayChannel::Zoom).is_visible());

        assert!(o.fire_due(t0 + ms(900)));
        assert!(!o.get(OverlayChannel::Zoom).is_visible());
        assert_eq!(o.pending(), 0);
    }

    #[test]
    fn retrigger_measures_from_second_trigger() {
        let t0 = Instant::now();
        let mut o = Overlays::new(DEFAULT_DWELL);
        o.trigger(OverlayChannel::Zoom, "110 %".into(), t0);
        o.trigger(OverlayChannel::Zoom, "121 %".into(), t0 + ms(500));
        assert_eq!(o.pending(), 1);

        // First trigger's deadline passes: still visible.
        assert!(!o.fire_due(t0 + ms(1000)));
        assert!(o.get(OverlayChannel::Zoom).is_visible());
        assert_eq!(o.get(OverlayChannel::Zoom).text(), "121 %");

        assert!(o.fire_due(t0 + ms(1400)));
        assert!(!o.get(OverlayChannel::Zoom).is_visible());
    }

    #[test]
    fn channels_expire_independently() {
        let t0 = Instant::now();
        let mut o = Overlays::new(DEFAULT_DWELL);
        o.trigger(OverlayChannel::Zoom, "90 %".into(), t0);
        o.trigger(OverlayChannel::Page, "Page 2 / 5".into(), t0 + ms(300));
        assert_eq!(o.next_deadline(), Some(t0 + ms(900)));

        assert!(o.fire_due(t0 + ms(950)));
        assert!(!o.get(OverlayChannel::Zoom).is_visible());
        assert!(o.get(OverlayChannel::Page).is_visible());
        assert_eq!(o.next_deadline(), Some(t0 + ms(1200)));
    }

    #[test]
    fn cancel_is_idempotent() {
        let mut s = Scheduler::new();
        let h = s.schedule(OverlayChannel::Page, Instant::now());
        assert!(s.cancel(h));
        assert!(!s.cancel(h));
        assert_eq!(s.pending(), 0);
    }

    #[test]
    fn handles_are_unique_per_schedule() {
        let mut s = Scheduler::new();
        let now = Instant::now();
        let a = s.schedule(OverlayChannel::Zoom, now);
        let b = s.schedule(OverlayChannel::Zoom, now);
        assert_ne!(a, b);
        assert_eq!(s.take_due(now), vec![a, b]);
    }

    #[test]
    fn stale_task_does_not_hide_retriggered_overlay() {
        let t0 = Instant::now();
        let mut o = Overlays::new(DEFAULT_DWELL);
        o.trigger(OverlayChannel::Page, "Page 1 / 3".into(), t0);
        let stale = o.get(OverlayChannel::Page).timer.expect("armed");
        o.trigger(OverlayChannel::Page, "Page 2 / 3".into(), t0 + ms(100));

        // Re-inject the superseded task as if it had escaped cancellation.
        o.scheduler.tasks.push((stale, t0 + ms(900)));
        assert!(!o.fire_due(t0 + ms(950)));
        assert!(o.get(OverlayChannel::Page).is_visible());
    }

    #[test]
    fn shutdown_cancels_pending_timers() {
        let t0 = Instant::now();
        let mut o = Overlays::new(DEFAULT_DWELL);
        o.trigger(OverlayChannel::Zoom, "100 %".into(), t0);
        o.trigger(OverlayChannel::Page, "Page 1 / 1".into(), t0);
        o.shutdown();
        assert_eq!(o.pending(), 0);
        assert!(!o.get(OverlayChannel::Zoom).is_armed());
        assert_eq!(o.next_deadline(), None);
    }
}
