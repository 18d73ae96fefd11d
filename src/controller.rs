//! Adaptive star-count controller.
//!
//! Two phases. `InitialCalibration` converges quickly from an unknown start
//! with a wide acceptance band and a hard attempt cap. `ContinuousOptimization`
//! then corrects drift with small, rate-limited steps and a dead-band so the
//! field never visibly jumps. The only actuator is `ParticleField::resize`;
//! the only sensor is `FrameClock::estimate_fps`.

use crate::cache::{CountCache, STAR_COUNT_KEY};
use crate::frame_clock::FrameClock;
use crate::particle::ParticleField;
use log::debug;

pub const TARGET_FPS: f64 = 60.0;
pub const MIN_STAR_COUNT: usize = 100;

pub const CALIBRATION_WINDOW_MS: f64 = 1_000.0;
pub const MAX_CALIBRATION_ATTEMPTS: u32 = 8;
const CALIBRATION_BAND: (f64, f64) = (0.9, 1.5);

pub const OPTIMIZATION_WINDOW_MS: f64 = 3_000.0;
pub const ADJUSTMENT_COOLDOWN_MS: f64 = 10_000.0;
const OPTIMIZATION_BAND: (f64, f64) = (0.85, 1.3);
const OPTIMIZATION_DAMPING: f64 = 0.9;
const MAX_STEP: f64 = 0.2;
const DEAD_BAND: f64 = 0.05;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerMode {
    InitialCalibration,
    ContinuousOptimization,
}

impl ControllerMode {
    pub fn label(self) -> &'static str {
        match self {
            Self::InitialCalibration => "calibrating",
            Self::ContinuousOptimization => "optimizing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationEnd {
    WithinBand,
    AttemptsExhausted,
    CapReached,
}

/// Outcome of one `evaluate` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Decision {
    /// Measurement window still open, or not enough frames recorded.
    Waiting,
    CalibrationStep {
        fps: u32,
        attempt: u32,
        from: usize,
        to: usize,
    },
    CalibrationDone {
        fps: u32,
        count: usize,
        reason: CalibrationEnd,
    },
    /// Window elapsed but the previous adjustment is too recent.
    RateLimited,
    Accepted {
        fps: u32,
    },
    /// Proposed change fell inside the dead-band.
    Discarded {
        fps: u32,
        proposed: usize,
    },
    Adjusted {
        fps: u32,
        from: usize,
        to: usize,
    },
}

#[derive(Debug, Clone)]
pub struct PerformanceController {
    mode: ControllerMode,
    window_start: Option<f64>,
    attempts: u32,
    last_adjustment: Option<f64>,
    max_count: usize,
    debug: bool,
}

impl PerformanceController {
    pub fn new(max_count: usize, debug: bool) -> Self {
        Self {
            mode: ControllerMode::InitialCalibration,
            window_start: None,
            attempts: 0,
            last_adjustment: None,
            max_count,
            debug,
        }
    }

    pub fn mode(&self) -> ControllerMode {
        self.mode
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_count(&self) -> usize {
        self.max_count
    }

    pub fn set_max_count(&mut self, max_count: usize) {
        self.max_count = max_count;
    }

    /// Re-open the measurement window after a pause so the gap is not read
    /// as one slow frame.
    pub fn resume(&mut self, now: f64) {
        self.window_start = Some(now);
    }

    pub fn set_debug(&mut self, debug: bool) {
        self.debug = debug;
    }

    pub fn clamp_count(&self, count: f64) -> usize {
        let count = if count.is_finite() { count.max(0.0) } else { 0.0 };
        (count as usize).max(MIN_STAR_COUNT).min(self.max_count)
    }

    pub fn evaluate(
        &mut self,
        now: f64,
        clock: &FrameClock,
        field: &mut ParticleField,
        cache: Option<&mut (dyn CountCache + '_)>,
    ) -> Decision {
        let Some(start) = self.window_start else {
            self.window_start = Some(now);
            return Decision::Waiting;
        };
        let elapsed = now - start;

        let decision = match self.mode {
            ControllerMode::InitialCalibration => self.calibrate(now, elapsed, clock, field, cache),
            ControllerMode::ContinuousOptimization => self.optimize(now, elapsed, clock, field, cache),
        };
        if self.debug && !matches!(decision, Decision::Waiting) {
            debug!("controller[{}] {:?} (stars={})", self.mode.label(), decision, field.len());
        }
        decision
    }

    fn calibrate(
        &mut self,
        now: f64,
        elapsed: f64,
        clock: &FrameClock,
        field: &mut ParticleField,
        cache: Option<&mut (dyn CountCache + '_)>,
    ) -> Decision {
        if elapsed < CALIBRATION_WINDOW_MS {
            return Decision::Waiting;
        }
        let Some(fps) = clock.estimate_fps() else {
            return Decision::Waiting;
        };
        let ratio = fps as f64 / TARGET_FPS;

        if (CALIBRATION_BAND.0..=CALIBRATION_BAND.1).contains(&ratio) {
            return self.finish_calibration(now, fps, field.len(), CalibrationEnd::WithinBand, cache);
        }
        if self.attempts >= MAX_CALIBRATION_ATTEMPTS {
            return self.finish_calibration(
                now,
                fps,
                field.len(),
                CalibrationEnd::AttemptsExhausted,
                cache,
            );
        }

        self.attempts += 1;
        let current = field.len();
        let aggressiveness = 0.75 + ratio.min(4.0) / 20.0;
        let next = self.clamp_count((current as f64 * ratio * aggressiveness).round());

        if next == self.max_count && next == current && ratio > CALIBRATION_BAND.1 {
            return self.finish_calibration(now, fps, current, CalibrationEnd::CapReached, cache);
        }

        field.resize(next);
        self.window_start = Some(now);
        Decision::CalibrationStep {
            fps,
            attempt: self.attempts,
            from: current,
            to: next,
        }
    }

    fn finish_calibration(
        &mut self,
        now: f64,
        fps: u32,
        count: usize,
        reason: CalibrationEnd,
        cache: Option<&mut (dyn CountCache + '_)>,
    ) -> Decision {
        self.mode = ControllerMode::ContinuousOptimization;
        persist(cache, count, self.debug);
        self.window_start = Some(now);
        Decision::CalibrationDone { fps, count, reason }
    }

    fn optimize(
        &mut self,
        now: f64,
        elapsed: f64,
        clock: &FrameClock,
        field: &mut ParticleField,
        cache: Option<&mut (dyn CountCache + '_)>,
    ) -> Decision {
        if elapsed < OPTIMIZATION_WINDOW_MS {
            return Decision::Waiting;
        }
        if let Some(last) = self.last_adjustment {
            if now - last < ADJUSTMENT_COOLDOWN_MS {
                self.window_start = Some(now);
                return Decision::RateLimited;
            }
        }
        self.window_start = Some(now);
        let Some(fps) = clock.estimate_fps() else {
            return Decision::Waiting;
        };
        let ratio = fps as f64 / TARGET_FPS;
        if (OPTIMIZATION_BAND.0..=OPTIMIZATION_BAND.1).contains(&ratio) {
            return Decision::Accepted { fps };
        }

        let current = field.len();
        let cur = current as f64;
        // ceil/floor keep the rounded result inside [0.8n, 1.2n]; plain
        // bounds could round one star past the 20% limit.
        let lo = (cur * (1.0 - MAX_STEP)).ceil();
        let hi = (cur * (1.0 + MAX_STEP)).floor().max(lo);
        let stepped = (cur * ratio * OPTIMIZATION_DAMPING).round().clamp(lo, hi);
        let next = self.clamp_count(stepped);

        let change = if current == 0 {
            1.0
        } else {
            (next as f64 - cur).abs() / cur
        };
        if change < DEAD_BAND {
            return Decision::Discarded { fps, proposed: next };
        }

        field.resize(next);
        persist(cache, next, self.debug);
        self.last_adjustment = Some(now);
        Decision::Adjusted {
            fps,
            from: current,
            to: next,
        }
    }
}

fn persist(cache: Option<&mut (dyn CountCache + '_)>, count: usize, verbose: bool) {
    let Some(cache) = cache else {
        return;
    };
    let value = u32::try_from(count).unwrap_or(u32::MAX);
    if let Err(err) = cache.save(STAR_COUNT_KEY, value) {
        if verbose {
            debug!("star count not persisted: {err}");
        }
    }
}
