//! Zoom factor on top of the fit-to-viewport scale.

use log::debug;

/// Zoom factor with its cached rounded percentage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zoom {
    factor: f64,
    percent: u32,
}

impl Default for Zoom {
    fn default() -> Self {
        Self {
            factor: 1.0,
            percent: 100,
        }
    }
}

impl Zoom {
    pub const MIN: f64 = 0.30;
    pub const MAX: f64 = 5.00;
    /// Multiplier per zoom-in step (divisor per zoom-out step).
    pub const STEP: f64 = 1.10;
    /// Factors within this distance of 1.0 count as unmagnified.
    pub const EPSILON: f64 = 1e-6;

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn percent(&self) -> u32 {
        self.percent
    }

    /// True when content is magnified beyond fit-to-viewport.
    pub fn is_magnified(&self) -> bool {
        self.factor > 1.0 + Self::EPSILON
    }

    pub fn zoom_in(&mut self) {
        self.set(self.factor * Self::STEP);
    }

    pub fn zoom_out(&mut self) {
        self.set(self.factor / Self::STEP);
    }

    pub fn reset(&mut self) {
        self.set(1.0);
    }

    /// Zoom at an exact factor (clamped).
    #[cfg(test)]
    pub(crate) fn at(factor: f64) -> Self {
        let mut z = Self::default();
        z.set(factor);
        z
    }

    fn set(&mut self, factor: f64) {
        let old = self.factor;
        self.factor = factor.clamp(Self::MIN, Self::MAX);
        self.percent = (self.factor * 100.0).round() as u32;
        debug!("zoom: {old:.3} → {:.3} ({}%)", self.factor, self.percent);
    }

    /// Text shown by the zoom overlay.
    pub fn label(&self) -> String {
        format!("{} %", self.percent)
    }
}
