//! Fit-to-viewport layout for single pages and two-page spreads.
//!
//! Page sizes are in PDF points, viewport and content sizes in pixels.
//! The render scale converts points to pixels directly, so a page drawn at
//! `scale` occupies `width_pt * scale` pixels.
//!
//! Layout of the content area (spread mode):
//!
//! ```text
//!   margin | left page | gap | right page | margin
//! ```
//!
//! with `margin` above and below the taller page. The content area never
//! shrinks below the viewport; a smaller content block is centered in it.

/// Space around the page block, in pixels.
pub const MARGIN: f64 = 12.0;
/// Space between the two pages of a spread, in pixels.
pub const GAP: f64 = 12.0;

/// Page dimensions in PDF points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Integer pixel dimensions (viewport, content area, rendered images).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Rectangle inside a rendered page bitmap, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn area(&self) -> u64 {
        u64::from(self.width) * u64::from(self.height)
    }
}

/// Result of a layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fit {
    /// Scale at zoom 1.0 (the page block exactly fits the viewport).
    pub fit_scale: f64,
    /// `fit_scale * zoom`: pixels per point used for rendering.
    pub scale: f64,
    /// Size of the scrollable content area, floored at the viewport.
    pub content: PixelSize,
}

/// Scale at which the page block fits the viewport, before zoom.
///
/// `right` is the right-hand page of a spread; pass `None` in single-page
/// mode or when the spread has no right page (odd page count).
pub fn fit_scale(left: PageSize, right: Option<PageSize>, viewport: PixelSize) -> f64 {
    let vw = viewport.width as f64;
    let vh = viewport.height as f64;
    let avail_h = (vh - 2.0 * MARGIN).max(1.0);

    match right {
        None => {
            let avail_w = (vw - 2.0 * MARGIN).max(1.0);
            (avail_w / left.width).min(avail_h / left.height)
        }
        Some(right) => {
            let avail_w = (vw - 2.0 * MARGIN - GAP).max(1.0);
            let scale_h_left = avail_h / left.height;
            let scale_h_right = avail_h / right.height;
            let height_fit = scale_h_left.min(scale_h_right);

            let total_w = left.width * height_fit + GAP + right.width * height_fit;
            if total_w > avail_w {
                (avail_w / (left.width + right.width)).min(height_fit)
            } else {
                height_fit
            }
        }
    }
}

/// Compute render scale and content size for the displayed page(s).
pub fn compute_scale(
    left: PageSize,
    right: Option<PageSize>,
    viewport: PixelSize,
    zoom: f64,
) -> Fit {
    let fit_scale = fit_scale(left, right, viewport);
    let scale = fit_scale * zoom;
    let (block_w, block_h) = block_size(left, right, scale);

    let content = PixelSize {
        width: viewport.width.max(ceil_px(block_w)),
        height: viewport.height.max(ceil_px(block_h)),
    };

    Fit {
        fit_scale,
        scale,
        content,
    }
}

/// Round up to whole pixels, ignoring float noise from `fit * size`.
fn ceil_px(v: f64) -> u32 {
    (v - 1e-6).ceil().max(0.0) as u32
}

/// Margins plus scaled pages (plus gap in spread mode).
fn block_size(left: PageSize, right: Option<PageSize>, scale: f64) -> (f64, f64) {
    match right {
        None => (
            2.0 * MARGIN + left.width * scale,
            2.0 * MARGIN + left.height * scale,
        ),
        Some(right) => (
            2.0 * MARGIN + left.width * scale + GAP + right.width * scale,
            2.0 * MARGIN + (left.height * scale).max(right.height * scale),
        ),
    }
}

/// A page rectangle inside the content area, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageRect {
    pub index: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where the displayed page(s) sit inside the content area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub left: PageRect,
    pub right: Option<PageRect>,
}

impl Placement {
    pub fn pages(&self) -> impl Iterator<Item = &PageRect> {
        std::iter::once(&self.left).chain(self.right.as_ref())
    }
}

/// Place the page(s) of a layout pass.
///
/// The page block is centered in the content area when the area is larger;
/// in a spread the shorter page is centered vertically against the taller one.
pub fn place_pages(
    fit: &Fit,
    left: (usize, PageSize),
    right: Option<(usize, PageSize)>,
) -> Placement {
    let scale = fit.scale;
    let (block_w, block_h) = block_size(left.1, right.map(|(_, s)| s), scale);
    let area_w = fit.content.width as f64;
    let area_h = fit.content.height as f64;

    let x0 = if area_w > block_w { (area_w - block_w) / 2.0 } else { 0.0 };
    let y0 = if area_h > block_h { (area_h - block_h) / 2.0 } else { 0.0 };

    let left_w = left.1.width * scale;
    let left_h = left.1.height * scale;

    match right {
        None => Placement {
            left: PageRect {
                index: left.0,
                x: x0 + MARGIN,
                y: y0 + MARGIN,
                width: left_w,
                height: left_h,
            },
            right: None,
        },
        Some((right_idx, right_size)) => {
            let right_w = right_size.width * scale;
            let right_h = right_size.height * scale;
            let max_h = left_h.max(right_h);
            let start_x = x0 + MARGIN;
            Placement {
                left: PageRect {
                    index: left.0,
                    x: start_x,
                    y: y0 + MARGIN + (max_h - left_h) / 2.0,
                    width: left_w,
                    height: left_h,
                },
                right: Some(PageRect {
                    index: right_idx,
                    x: start_x + left_w + GAP,
                    y: y0 + MARGIN + (max_h - right_h) / 2.0,
                    width: right_w,
                    height: right_h,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A4: PageSize = PageSize {
        width: 595.0,
        height: 842.0,
    };

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn single_page_is_height_limited_on_landscape_viewport() {
        let vp = PixelSize::new(1200, 800);
        let fit = compute_scale(A4, None, vp, 1.0);
        let expected = (800.0 - 24.0) / 842.0;
        assert!(approx(fit.scale, expected));
        // Content never smaller than the viewport.
        assert_eq!(fit.content, vp);
    }

    #[test]
    fn single_page_is_width_limited_on_portrait_viewport() {
        let vp = PixelSize::new(400, 2000);
        let fit = compute_scale(A4, None, vp, 1.0);
        assert!(approx(fit.scale, (400.0 - 24.0) / 595.0));
    }

    #[test]
    fn spread_uses_height_fit_when_width_allows() {
        let vp = PixelSize::new(2400, 800);
        let fit = compute_scale(A4, Some(A4), vp, 1.0);
        assert!(approx(fit.scale, (800.0 - 24.0) / 842.0));
    }

    #[test]
    fn spread_width_overflow_respects_both_bounds() {
        let left = PageSize::new(600.0, 800.0);
        let right = PageSize::new(900.0, 700.0);
        let vp = PixelSize::new(1000, 900);
        let avail_w = 1000.0 - 2.0 * MARGIN - GAP;
        let avail_h = 900.0 - 2.0 * MARGIN;
        let scale_h_left = avail_h / left.height;
        let scale_h_right = avail_h / right.height;
        // Precondition: the height fit overflows horizontally.
        assert!((left.width + right.width) * scale_h_left.min(scale_h_right) > avail_w);

        let fit = compute_scale(left, Some(right), vp, 1.0);
        assert!(fit.scale <= avail_w / (left.width + right.width) + 1e-12);
        assert!(fit.scale <= scale_h_left.min(scale_h_right) + 1e-12);
        assert!(approx(fit.scale, avail_w / (left.width + right.width)));
    }

    #[test]
    fn doubling_zoom_doubles_scale() {
        let vp = PixelSize::new(1280, 720);
        for right in [None, Some(A4)] {
            let a = compute_scale(A4, right, vp, 1.3);
            let b = compute_scale(A4, right, vp, 2.6);
            assert!(approx(b.scale, 2.0 * a.scale));
            assert!(approx(a.fit_scale, b.fit_scale));
        }
    }

    #[test]
    fn zoomed_content_grows_past_viewport() {
        let vp = PixelSize::new(1200, 800);
        let fit = compute_scale(A4, None, vp, 2.0);
        let expected_h = ceil_px(2.0 * MARGIN + 842.0 * fit.scale);
        assert_eq!(fit.content.height, expected_h);
        assert!(fit.content.height > vp.height);
    }

    #[test]
    fn degenerate_viewport_stays_finite() {
        let fit = compute_scale(A4, Some(A4), PixelSize::new(0, 0), 1.0);
        assert!(fit.scale.is_finite());
        assert!(fit.scale > 0.0);
    }

    #[test]
    fn single_page_is_centered() {
        let vp = PixelSize::new(1200, 800);
        let fit = compute_scale(A4, None, vp, 1.0);
        let placement = place_pages(&fit, (3, A4), None);
        let rect = placement.left;
        assert_eq!(rect.index, 3);
        let right_space = 1200.0 - (rect.x + rect.width);
        assert!(approx(rect.x, right_space));
        assert!(approx(rect.y, MARGIN));
        assert!(placement.right.is_none());
    }

    #[test]
    fn spread_centers_shorter_page_vertically() {
        let tall = PageSize::new(500.0, 800.0);
        let short = PageSize::new(500.0, 600.0);
        let vp = PixelSize::new(2000, 824);
        let fit = compute_scale(tall, Some(short), vp, 1.0);
        assert!(approx(fit.scale, 1.0));
        let placement = place_pages(&fit, (0, tall), Some((1, short)));
        let right = placement.right.expect("right page");
        assert!(approx(placement.left.y, MARGIN));
        assert!(approx(right.y, MARGIN + 100.0));
        assert!(approx(right.x, placement.left.x + 500.0 + GAP));
        assert_eq!(placement.pages().count(), 2);
    }

    #[test]
    fn zoomed_block_starts_at_margin() {
        let vp = PixelSize::new(800, 600);
        let fit = compute_scale(A4, None, vp, 3.0);
        let placement = place_pages(&fit, (0, A4), None);
        // Only the sub-pixel rounding of the content area can offset the block.
        assert!((placement.left.x - MARGIN).abs() < 0.5);
        assert!((placement.left.y - MARGIN).abs() < 0.5);
    }
}
