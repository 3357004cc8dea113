//! Input processing layer: key mapping.
//!
//! Pure logic, no I/O. The mapping depends on one piece of view state:
//! whether the page is magnified, in which case the arrow keys scroll
//! instead of turning pages.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::view::ScrollDirection;

/// Actions produced by key input processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Action {
    Quit,
    /// Forward: smart advance.
    Advance,
    /// Backward: previous page or pair.
    Back,
    Scroll(ScrollDirection),
    ZoomIn,
    ZoomOut,
    ZoomReset,
    SinglePage,
    Spread,
    ToggleFullscreen,
    GotoPage,
    Extract,
    Help,
}

/// Map a key event to an `Action`. Returns `None` for unbound keys and
/// key releases.
pub(super) fn map_key_event(key: KeyEvent, magnified: bool) -> Option<Action> {
    let KeyEvent {
        code,
        modifiers,
        kind,
        ..
    } = key;
    if kind == KeyEventKind::Release {
        return None;
    }
    let ctrl = modifiers.contains(KeyModifiers::CONTROL);

    // Zoom. Bare + - = 0 are accepted too: many terminals cannot report
    // Ctrl with punctuation.
    match code {
        KeyCode::Char('+' | '=') => return Some(Action::ZoomIn),
        KeyCode::Char('-') => return Some(Action::ZoomOut),
        KeyCode::Char('0') => return Some(Action::ZoomReset),
        _ => {}
    }

    if ctrl {
        return match code {
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    if magnified {
        let direction = match code {
            KeyCode::Left => Some(ScrollDirection::Left),
            KeyCode::Right => Some(ScrollDirection::Right),
            KeyCode::Up => Some(ScrollDirection::Up),
            KeyCode::Down => Some(ScrollDirection::Down),
            _ => None,
        };
        if let Some(d) = direction {
            return Some(Action::Scroll(d));
        }
    }

    match code {
        KeyCode::Esc | KeyCode::Char('q') => Some(Action::Quit),

        KeyCode::PageDown | KeyCode::Char(' ') | KeyCode::Right => Some(Action::Advance),
        KeyCode::PageUp | KeyCode::Backspace | KeyCode::Left => Some(Action::Back),

        KeyCode::Char('1') => Some(Action::SinglePage),
        KeyCode::Char('2') => Some(Action::Spread),

        KeyCode::Char('f' | 'F') => Some(Action::ToggleFullscreen),
        KeyCode::Char('g' | 'G') => Some(Action::GotoPage),
        KeyCode::Char('e' | 'E') => Some(Action::Extract),
        KeyCode::Char('?') | KeyCode::F(1) => Some(Action::Help),

        _ => None,
    }
}
