//! Minimal scale primitives for the beeswarm axes.

/// Ordinal point scale: evenly spaced positions for a fixed category order,
/// with outer padding expressed in step units (d3 `scalePoint` semantics).
#[derive(Debug, Clone)]
pub struct PointScale {
    range_start: f64,
    step: f64,
    padding: f64,
    len: usize,
}

impl PointScale {
    pub fn new(len: usize, range: (f64, f64), padding: f64) -> Self {
        let (r0, r1) = range;
        let denom = ((len as f64) - 1.0 + 2.0 * padding).max(1.0);
        Self {
            range_start: r0,
            step: (r1 - r0) / denom,
            padding,
            len,
        }
    }

    pub fn position(&self, index: usize) -> f64 {
        debug_assert!(index < self.len.max(1));
        self.range_start + self.step * (self.padding + index as f64)
    }

    pub fn step(&self) -> f64 {
        self.step
    }
}

/// Linear mapping from a numeric domain onto a pixel range. Used for the
/// direct (non-density-aware) time axis.
#[derive(Debug, Clone, Copy)]
pub struct LinearScale {
    d0: f64,
    d1: f64,
    r0: f64,
    r1: f64,
}

impl LinearScale {
    pub fn new(domain: (f64, f64), range: (f64, f64)) -> Self {
        Self {
            d0: domain.0,
            d1: domain.1,
            r0: range.0,
            r1: range.1,
        }
    }

    pub fn position(&self, v: f64) -> f64 {
        let span = self.d1 - self.d0;
        if span.abs() < f64::EPSILON {
            // Degenerate domain collapses onto the range midpoint.
            return (self.r0 + self.r1) / 2.0;
        }
        let t = (v - self.d0) / span;
        self.r0 + t * (self.r1 - self.r0)
    }
}
