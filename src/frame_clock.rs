use std::collections::VecDeque;

/// Rolling window size: two seconds at 60 fps.
pub const WINDOW: usize = 120;
/// Samples required before an estimate is reported.
pub const MIN_SAMPLES: usize = 10;

/// Tick timestamps (milliseconds) in a bounded FIFO window.
///
/// The estimate is a plain mean of consecutive intervals. The controller's
/// acceptance bands are tuned against exactly this formula.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    stamps: VecDeque<f64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            stamps: VecDeque::with_capacity(WINDOW + 1),
        }
    }

    pub fn record(&mut self, now_ms: f64) {
        self.stamps.push_back(now_ms);
        if self.stamps.len() > WINDOW {
            self.stamps.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.stamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stamps.is_empty()
    }

    pub fn estimate_fps(&self) -> Option<u32> {
        let n = self.stamps.len();
        if n < MIN_SAMPLES {
            return None;
        }
        let (first, last) = (self.stamps.front()?, self.stamps.back()?);
        // Mean of consecutive deltas telescopes to span / (n - 1).
        let avg = (last - first) / (n - 1) as f64;
        if avg <= 0.0 {
            return None;
        }
        Some((1000.0 / avg).round() as u32)
    }

    pub fn clear(&mut self) {
        self.stamps.clear();
    }
}
