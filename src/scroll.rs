//! Scrollable range of one axis of the viewport.

/// One scroll axis: `value` moves within `[lower, upper - page_size]`.
///
/// `upper` is the content extent and `page_size` the visible extent, both in
/// pixels. When the content fits, the only valid value is `lower`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollAxis {
    pub value: f64,
    pub lower: f64,
    pub upper: f64,
    pub page_size: f64,
}

impl ScrollAxis {
    /// Largest valid `value`.
    pub fn max_value(&self) -> f64 {
        (self.upper - self.page_size).max(self.lower)
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value.clamp(self.lower, self.max_value());
    }

    pub fn scroll_by(&mut self, delta: f64) {
        self.set_value(self.value + delta);
    }

    /// Adopt new content/viewport extents, keeping `value` in range.
    pub fn configure(&mut self, upper: f64, page_size: f64) {
        self.upper = upper;
        self.page_size = page_size;
        self.set_value(self.value);
    }

    /// Move to the middle of the scrollable range.
    pub fn center(&mut self) {
        let target = if self.upper > self.page_size {
            (self.upper - self.page_size) * 0.5
        } else {
            self.lower
        };
        self.set_value(target);
    }

    pub fn to_start(&mut self) {
        self.value = self.lower;
    }

    pub fn is_scrollable(&self) -> bool {
        self.max_value() > self.lower
    }
}
