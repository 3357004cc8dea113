//! Smart advance: one "forward" key that reads a magnified page top to
//! bottom before turning it.
//!
//! At fit-to-viewport zoom the key simply turns the page. When zoomed in,
//! each press scrolls down by 90 % of the visible height (leaving ~10 %
//! overlap for reading continuity) until the bottom is reached; the next
//! press turns the page and returns to the top.

use crate::scroll::ScrollAxis;
use crate::zoom::Zoom;

/// Fraction of the visible height moved per scroll step.
pub const STEP_FRACTION: f64 = 0.90;
/// Distance from the bottom (px) that already counts as "at the bottom".
pub const BOTTOM_TOLERANCE: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Advance {
    /// Stay on the page, move the vertical scroll to this value.
    ScrollTo(f64),
    /// Turn to the next page/pair and reset the vertical scroll to the top.
    TurnPage,
}

pub fn decide(zoom: &Zoom, vertical: &ScrollAxis) -> Advance {
    if !zoom.is_magnified() {
        return Advance::TurnPage;
    }

    let max_scroll = vertical.upper - vertical.page_size;
    let has_room = max_scroll > vertical.lower + BOTTOM_TOLERANCE;
    let at_bottom = vertical.value >= max_scroll - BOTTOM_TOLERANCE;

    if has_room && !at_bottom {
        let target = (vertical.value + vertical.page_size * STEP_FRACTION)
            .clamp(vertical.lower, max_scroll);
        Advance::ScrollTo(target)
    } else {
        Advance::TurnPage
    }
}
