//! Modal dialogs as a synchronous request/response interface.
//!
//! Each call blocks until the user submits or cancels. The viewer provides
//! a terminal implementation; tests script responses.

use std::io;

/// Outcome of a prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response<T> {
    Submit(T),
    Cancel,
}

impl<T> Response<T> {
    pub fn submitted(self) -> Option<T> {
        match self {
            Response::Submit(v) => Some(v),
            Response::Cancel => None,
        }
    }
}

pub trait Dialogs {
    /// Ask for a line of text. `initial` prefills the input.
    fn prompt(&mut self, title: &str, label: &str, initial: &str) -> io::Result<Response<String>>;

    /// Yes/no question. Cancel counts as "no".
    fn confirm(&mut self, question: &str) -> io::Result<bool>;

    /// Show a message until dismissed.
    fn message(&mut self, text: &str) -> io::Result<()>;
}

/// Parse a 1-based page number typed by the user.
///
/// Only strictly positive integers are accepted; anything else is treated as
/// no answer.
pub fn parse_page_number(text: &str) -> Option<u32> {
    text.trim().parse::<u32>().ok().filter(|&n| n > 0)
}

/// Prompt for a page number; `None` on cancel or unusable input.
pub fn ask_page_number<D: Dialogs + ?Sized>(
    dialogs: &mut D,
    title: &str,
    label: &str,
) -> io::Result<Option<u32>> {
    let answer = dialogs.prompt(title, label, "")?;
    Ok(answer.submitted().as_deref().and_then(parse_page_number))
}
