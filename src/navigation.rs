//! Page navigation: current left page, spread mode, bounds.
//!
//! Invariant after every mutation: `current_left` lies in
//! `[0, max(0, page_count - 1)]` and is even in spread mode.

use log::debug;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigator {
    page_count: usize,
    current_left: usize,
    spread: bool,
}

impl Navigator {
    pub fn new(page_count: usize, spread: bool) -> Self {
        let mut nav = Self {
            page_count,
            current_left: 0,
            spread,
        };
        nav.normalize();
        nav
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn current_left(&self) -> usize {
        self.current_left
    }

    pub fn is_spread(&self) -> bool {
        self.spread
    }

    fn last_index(&self) -> usize {
        self.page_count.saturating_sub(1)
    }

    /// Clamp into range, then align to an even index in spread mode.
    pub fn normalize(&mut self) {
        self.current_left = self.current_left.min(self.last_index());
        if self.spread && self.current_left % 2 == 1 {
            self.current_left -= 1;
        }
        self.current_left = self.current_left.min(self.last_index());
    }

    pub fn goto_left_page(&mut self, index: usize) {
        let old = self.current_left;
        self.current_left = index.min(self.last_index());
        self.normalize();
        debug!(
            "nav: goto {index} → left {} → {} (count={}, spread={})",
            old, self.current_left, self.page_count, self.spread
        );
    }

    fn step(&self) -> usize {
        if self.spread { 2 } else { 1 }
    }

    pub fn next_page(&mut self) {
        let target = (self.current_left + self.step()).min(self.last_index());
        self.goto_left_page(target);
    }

    pub fn prev_page(&mut self) {
        let target = self.current_left.saturating_sub(self.step());
        self.goto_left_page(target);
    }

    pub fn set_spread(&mut self, spread: bool) {
        self.spread = spread;
        self.normalize();
        debug!("nav: spread={spread}, left={}", self.current_left);
    }

    /// Adopt a new page count after the document was reloaded.
    pub fn set_page_count(&mut self, page_count: usize) {
        self.page_count = page_count;
        self.normalize();
    }

    /// Map a 1-based page number typed by the user to a page index.
    ///
    /// Returns `None` outside `[1, page_count]`.
    pub fn resolve_page_number(&self, number: u32) -> Option<usize> {
        let n = number as usize;
        (1..=self.page_count).contains(&n).then(|| n - 1)
    }

    /// Index of the right-hand page, if the current spread has one.
    pub fn right_page(&self) -> Option<usize> {
        let right = self.current_left + 1;
        (self.spread && right < self.page_count).then_some(right)
    }

    /// Human-facing page range, e.g. `Pages 3-4 / 12` or `Page 5 / 12`.
    pub fn page_label(&self) -> String {
        let left = self.current_left + 1;
        match self.right_page() {
            Some(right) => format!("Pages {left}-{} / {}", right + 1, self.page_count),
            None => format!("Page {left} / {}", self.page_count),
        }
    }
}
