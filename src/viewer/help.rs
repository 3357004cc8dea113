//! Help panel shown by `?` / F1.

use crate::navigation::Navigator;
use crate::zoom::Zoom;

const KEYS: &str = "\
Pages:
  Left/Right        page (at 100 %)
  PageUp/PageDown   page (always)
  Space/Backspace   page (always)

Zoom (with or without Ctrl):
  + / =  -          zoom in/out
  0                 zoom 100 %

Scroll (zoom > 100 %):
  Left/Right        horizontal
  Up/Down           vertical

Mode:
  1 / 2             single page / two pages
  f                 fullscreen
  g                 go to page
  e                 extract pages to a new PDF
  ? / F1            this help
  Esc / q / Ctrl-C  quit";

/// Help panel text: version, where we are, the key list.
pub(super) fn help_text(nav: &Navigator, zoom: &Zoom) -> String {
    let left = nav.current_left() + 1;
    let page_line = match nav.right_page() {
        Some(right) => format!("Pages: {left}-{} / {}", right + 1, nav.page_count()),
        None => format!("Page: {left} / {}", nav.page_count()),
    };
    format!(
        "encore {}\n\n{page_line}\nZoom: {} %\n\n{KEYS}",
        crate::VERSION,
        zoom.percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_names_position_and_zoom() {
        let mut nav = Navigator::new(12, true);
        nav.goto_left_page(4);
        let mut zoom = Zoom::default();
        zoom.zoom_in();
        let text = help_text(&nav, &zoom);
        assert!(text.starts_with(&format!("encore {}", crate::VERSION)));
        assert!(text.contains("Pages: 5-6 / 12"));
        assert!(text.contains("Zoom: 110 %"));
        assert!(text.contains("extract pages"));
    }

    #[test]
    fn help_lists_every_bound_key() {
        let text = help_text(&Navigator::new(1, false), &Zoom::default());
        for key in ["? / F1", "Esc / q / Ctrl-C", "+ / =  -", "0   ", "1 / 2", "PageUp/PageDown"] {
            assert!(text.contains(key), "missing {key:?}");
        }
    }

    #[test]
    fn help_single_page_line() {
        let nav = Navigator::new(3, false);
        let text = help_text(&nav, &Zoom::default());
        assert!(text.contains("Page: 1 / 3"));
    }
}
