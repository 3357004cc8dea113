//! Screen layout and the mapping from the scrolled content area to Kitty
//! placements.

use crate::geometry::{PageRect, Placement, PixelRect, PixelSize};

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Layout {
    pub cols: u16,
    pub rows: u16,
    pub image_rows: u16,          // rows available to the pages
    pub status_row: Option<u16>,  // None in fullscreen
    pub cell_w: u16,              // pixels per cell (width)
    pub cell_h: u16,              // pixels per cell (height)
}

pub(super) fn compute_layout(
    term_cols: u16,
    term_rows: u16,
    pixel_w: u16,
    pixel_h: u16,
    status_bar: bool,
) -> Layout {
    let cols = term_cols.max(1);
    let rows = term_rows.max(1);
    let status_row = (status_bar && rows > 1).then_some(rows - 1);
    let image_rows = if status_row.is_some() { rows - 1 } else { rows };
    Layout {
        cols,
        rows,
        image_rows,
        status_row,
        cell_w: (pixel_w / cols).max(1),
        cell_h: (pixel_h / rows).max(1),
    }
}

impl Layout {
    /// Pixel size of the page area.
    pub(super) fn viewport_px(&self) -> PixelSize {
        PixelSize::new(
            u32::from(self.cols) * u32::from(self.cell_w),
            u32::from(self.image_rows) * u32::from(self.cell_h),
        )
    }
}

// ---------------------------------------------------------------------------
// Cropping
// ---------------------------------------------------------------------------

/// Visible part of one rendered page: a source rectangle inside the image
/// and its destination in viewport pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Crop {
    pub src_x: u32,
    pub src_y: u32,
    pub width: u32,
    pub height: u32,
    pub dst_x: u32,
    pub dst_y: u32,
}

impl Crop {
    /// Cell and in-cell pixel offset of the destination corner.
    pub(super) fn cell_origin(&self, layout: &Layout) -> (u16, u16, u32, u32) {
        let cw = u32::from(layout.cell_w);
        let ch = u32::from(layout.cell_h);
        (
            (self.dst_x / cw) as u16,
            (self.dst_y / ch) as u16,
            self.dst_x % cw,
            self.dst_y % ch,
        )
    }
}

/// Intersect a page drawn at `rect` (content coordinates, rendered as an
/// `image`-sized bitmap) with the viewport scrolled to `scroll`.
fn crop_to_viewport(
    rect: &PageRect,
    image: PixelSize,
    scroll: (f64, f64),
    viewport: PixelSize,
) -> Option<Crop> {
    let (src_x, dst_x, width) = crop_axis(rect.x, scroll.0, image.width, viewport.width)?;
    let (src_y, dst_y, height) = crop_axis(rect.y, scroll.1, image.height, viewport.height)?;
    Some(Crop {
        src_x,
        src_y,
        width,
        height,
        dst_x,
        dst_y,
    })
}

fn crop_axis(pos: f64, scroll: f64, len: u32, visible: u32) -> Option<(u32, u32, u32)> {
    let start = pos.round() as i64 - scroll.round() as i64;
    let end = start + i64::from(len);
    let dst = start.max(0);
    let dst_end = end.min(i64::from(visible));
    if dst_end <= dst {
        return None;
    }
    Some(((dst - start) as u32, dst as u32, (dst_end - dst) as u32))
}

// ---------------------------------------------------------------------------
// Tiling
// ---------------------------------------------------------------------------

/// Edge length of a page tile, in pixels.
///
/// Pages are rendered and uploaded tile by tile, so a zoomed page costs
/// about what is visible rather than its full bitmap.
pub(super) const TILE_SIZE: u32 = 512;

/// One square of a page bitmap drawn at the current scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Tile {
    pub page: usize,
    pub col: u32,
    pub row: u32,
    /// Region of the full page bitmap this tile covers.
    pub rect: PixelRect,
}

/// Pixel size of a page bitmap drawn at `rect`.
pub(super) fn page_pixels(rect: &PageRect) -> PixelSize {
    PixelSize::new(
        (rect.width.ceil() as u32).max(1),
        (rect.height.ceil() as u32).max(1),
    )
}

/// The tiles of every shown page that intersect the scrolled viewport,
/// each paired with the crop that places its visible part.
pub(super) fn plan_tiles(
    placement: &Placement,
    scroll: (f64, f64),
    viewport: PixelSize,
) -> Vec<(Tile, Crop)> {
    let mut plan = Vec::new();
    for rect in placement.pages() {
        let page = page_pixels(rect);
        if let Some(crop) = crop_to_viewport(rect, page, scroll, viewport) {
            plan.extend(split_crop(rect.index, page, &crop, TILE_SIZE));
        }
    }
    plan
}

/// Split a page crop into per-tile crops.
fn split_crop(index: usize, page: PixelSize, crop: &Crop, tile: u32) -> Vec<(Tile, Crop)> {
    let cols = crop.src_x / tile..=(crop.src_x + crop.width - 1) / tile;
    let rows = crop.src_y / tile..=(crop.src_y + crop.height - 1) / tile;

    let mut out = Vec::new();
    for row in rows {
        for col in cols.clone() {
            let rect = PixelRect::new(
                col * tile,
                row * tile,
                tile.min(page.width - col * tile),
                tile.min(page.height - row * tile),
            );
            let x0 = rect.x.max(crop.src_x);
            let x1 = (rect.x + rect.width).min(crop.src_x + crop.width);
            let y0 = rect.y.max(crop.src_y);
            let y1 = (rect.y + rect.height).min(crop.src_y + crop.height);
            if x1 <= x0 || y1 <= y0 {
                continue;
            }
            let part = Crop {
                src_x: x0 - rect.x,
                src_y: y0 - rect.y,
                width: x1 - x0,
                height: y1 - y0,
                dst_x: crop.dst_x + (x0 - crop.src_x),
                dst_y: crop.dst_y + (y0 - crop.src_y),
            };
            out.push((
                Tile {
                    page: index,
                    col,
                    row,
                    rect,
                },
                part,
            ));
        }
    }
    out
}
