//! Modal dialogs drawn on the terminal text layer.
//!
//! Each dialog blocks in its own read loop until Enter or Escape; the page
//! images stay in place underneath. The caller redraws afterwards.

use std::io;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use log::debug;

use super::state::Layout;
use super::terminal::{self, BoxRow};
use crate::dialog::{Dialogs, Response};

pub(super) struct TerminalDialogs<'a> {
    layout: &'a Layout,
}

impl<'a> TerminalDialogs<'a> {
    pub(super) fn new(layout: &'a Layout) -> Self {
        Self { layout }
    }
}

fn read_key() -> io::Result<KeyEvent> {
    loop {
        if let Event::Key(key) = event::read()?
            && key.kind != KeyEventKind::Release
        {
            return Ok(key);
        }
    }
}

fn is_cancel(key: &KeyEvent) -> bool {
    key.code == KeyCode::Esc
        || (key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL))
}

impl Dialogs for TerminalDialogs<'_> {
    fn prompt(&mut self, title: &str, label: &str, initial: &str) -> io::Result<Response<String>> {
        let prompt = format!("{title}: {label}");
        let mut input = initial.to_string();
        loop {
            terminal::draw_prompt_bar(self.layout, &prompt, &input)?;
            let key = read_key()?;
            if is_cancel(&key) {
                debug!("dialog: \"{title}\" cancelled");
                return Ok(Response::Cancel);
            }
            match key.code {
                KeyCode::Enter => {
                    debug!("dialog: \"{title}\" submitted {input:?}");
                    return Ok(Response::Submit(input));
                }
                KeyCode::Backspace => {
                    input.pop();
                }
                KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    input.clear();
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    input.push(c);
                }
                _ => {}
            }
        }
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        terminal::draw_box(self.layout, BoxRow::Center, &[question, "", "[y/N]"], false)?;
        let key = read_key()?;
        Ok(matches!(key.code, KeyCode::Char('y' | 'Y')))
    }

    fn message(&mut self, text: &str) -> io::Result<()> {
        let mut lines: Vec<&str> = text.lines().collect();
        lines.push("");
        lines.push("(press any key)");
        terminal::draw_box(self.layout, BoxRow::Center, &lines, false)?;
        read_key()?;
        Ok(())
    }
}
