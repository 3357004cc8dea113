//! Terminal I/O layer: raw mode, Kitty Graphics Protocol, text boxes.

use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use crossterm::{
    ExecutableCommand, QueueableCommand, cursor,
    style::{self, Stylize},
    terminal,
};
use std::io::{self, Write, stdout};

use super::state::{Crop, Layout};
use crate::document::RgbImage;

const CHUNK_SIZE: usize = 4096;

// ---------------------------------------------------------------------------
// RawGuard: restores raw mode and the alternate screen on Drop
// ---------------------------------------------------------------------------

pub(super) struct RawGuard {
    cleaned: bool,
}

impl RawGuard {
    pub(super) fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        stdout().execute(terminal::EnterAlternateScreen)?;
        stdout().execute(cursor::Hide)?;
        Ok(Self { cleaned: false })
    }

    pub(super) fn cleanup(&mut self) {
        if self.cleaned {
            return;
        }
        self.cleaned = true;
        let mut out = stdout();
        let _ = write!(out, "\x1b_Ga=d,d=A,q=2\x1b\\");
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}

impl Drop for RawGuard {
    fn drop(&mut self) {
        self.cleanup();
    }
}

// ---------------------------------------------------------------------------
// Kitty protocol helpers
// ---------------------------------------------------------------------------

/// Transmit raw RGB pixels in chunks (a=t: upload only, no placement).
pub(super) fn send_image(image: &RgbImage, image_id: u32) -> io::Result<()> {
    let encoded = BASE64.encode(&image.data);
    let chunks: Vec<&[u8]> = encoded.as_bytes().chunks(CHUNK_SIZE).collect();
    let (w, h) = (image.width, image.height);

    let mut out = stdout().lock();
    for (i, chunk) in chunks.iter().enumerate() {
        let m = if i + 1 == chunks.len() { 0 } else { 1 };
        if i == 0 {
            write!(out, "\x1b_Ga=t,f=24,s={w},v={h},i={image_id},t=d,q=2,m={m};")?;
        } else {
            write!(out, "\x1b_Gm={m},q=2;")?;
        }
        out.write_all(chunk)?;
        out.write_all(b"\x1b\\")?;
    }
    out.flush()
}

/// Delete image data and its placements.
pub(super) fn delete_image(image_id: u32) -> io::Result<()> {
    let mut out = stdout();
    write!(out, "\x1b_Ga=d,d=I,i={image_id},q=2\x1b\\")?;
    out.flush()
}

/// Delete placements of the given images, keeping their data.
pub(super) fn delete_placements(ids: impl IntoIterator<Item = u32>) -> io::Result<()> {
    let mut out = stdout().lock();
    for id in ids {
        write!(out, "\x1b_Ga=d,d=i,i={id},q=2\x1b\\")?;
    }
    out.flush()
}

/// Place the visible part of an uploaded tile at its pixel position.
///
/// Placed below the text layer (z=-1) so overlays and the status bar draw
/// on top.
pub(super) fn place_crop(image_id: u32, crop: &Crop, layout: &Layout) -> io::Result<()> {
    let (col, row, px, py) = crop.cell_origin(layout);
    let Crop {
        src_x,
        src_y,
        width,
        height,
        ..
    } = *crop;
    let mut out = stdout();
    out.queue(cursor::MoveTo(col, row))?;
    write!(
        out,
        "\x1b_Ga=p,i={image_id},x={src_x},y={src_y},w={width},h={height},X={px},Y={py},z=-1,C=1,q=2\x1b\\"
    )?;
    out.flush()
}

/// Clear the text layer.
pub(super) fn clear_screen() -> io::Result<()> {
    let mut out = stdout();
    out.queue(terminal::Clear(terminal::ClearType::All))?;
    out.flush()
}

// ---------------------------------------------------------------------------
// Text layer
// ---------------------------------------------------------------------------

/// Status bar on the last terminal row (not shown in fullscreen).
pub(super) fn draw_status_bar(layout: &Layout, text: &str) -> io::Result<()> {
    let Some(row) = layout.status_row else {
        return Ok(());
    };
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, row))?;
    let line = fit_width(text, layout.cols as usize);
    write!(out, "{}", line.on_dark_grey().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Input line for a prompt dialog, always on the last row.
pub(super) fn draw_prompt_bar(layout: &Layout, prompt: &str, input: &str) -> io::Result<()> {
    let mut out = stdout();
    out.queue(cursor::MoveTo(0, layout.rows.saturating_sub(1)))?;
    let line = fit_width(&format!(" {prompt} {input}_"), layout.cols as usize);
    write!(out, "{}", line.on_dark_blue().white())?;
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Where a text box sits vertically.
#[derive(Debug, Clone, Copy)]
pub(super) enum BoxRow {
    Center,
    /// Top edge at this fraction of the screen height (at least row 1).
    Fraction(f64),
}

/// Draw a horizontally centered box with one padded line per entry.
pub(super) fn draw_box(layout: &Layout, row: BoxRow, lines: &[&str], bold: bool) -> io::Result<()> {
    let inner = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
    let width = (inner + 4).min(layout.cols as usize);
    let height = (lines.len() + 2).min(layout.rows as usize) as u16;
    let left = ((layout.cols as usize).saturating_sub(width) / 2) as u16;
    let top = match row {
        BoxRow::Center => layout.rows.saturating_sub(height) / 2,
        BoxRow::Fraction(f) => ((f64::from(layout.rows) * f) as u16).max(1),
    };

    let blank = " ".repeat(width);
    let mut out = stdout();
    for r in 0..height {
        out.queue(cursor::MoveTo(left, top + r))?;
        let text = match (r as usize).checked_sub(1).and_then(|i| lines.get(i)) {
            Some(line) => fit_width(&format!("  {line}"), width),
            None => blank.clone(),
        };
        if bold {
            write!(out, "{}", text.on_black().white().bold())?;
        } else {
            write!(out, "{}", text.on_black().white())?;
        }
    }
    out.queue(style::ResetColor)?;
    out.flush()
}

/// Pad or truncate `text` to exactly `width` characters.
fn fit_width(text: &str, width: usize) -> String {
    let mut s: String = text.chars().take(width).collect();
    let len = s.chars().count();
    s.extend(std::iter::repeat_n(' ', width - len));
    s
}

pub(super) fn check_tty() -> anyhow::Result<()> {
    use std::io::IsTerminal;
    // Only stdout matters. crossterm's `use-dev-tty` reads keyboard from /dev/tty,
    // so stdin being a pipe is fine.
    if !io::stdout().is_terminal() {
        anyhow::bail!(
            "encore requires an interactive terminal.\n\
             \n\
             Supported terminals: Kitty, Ghostty, WezTerm"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fit_width_pads_and_truncates() {
        assert_eq!(fit_width("abc", 5), "abc  ");
        assert_eq!(fit_width("abcdef", 4), "abcd");
        assert_eq!(fit_width("Page 3 / 9", 10), "Page 3 / 9");
        assert_eq!(fit_width("é", 2).chars().count(), 2);
    }
}
