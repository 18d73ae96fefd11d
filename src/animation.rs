/// Frame duration the motion step is normalized to (60 fps).
pub const BASELINE_FRAME_MS: f64 = 1000.0 / 60.0;
/// Gaps longer than this (stalled host, paused terminal) count as this long.
pub const MAX_FRAME_GAP_MS: f64 = 100.0;

/// Host hook that runs the next tick once the display is ready to repaint.
pub trait FrameScheduler {
    fn request_frame(&mut self);
    fn cancel_frame(&mut self);
}

/// Scheduler that only records requests; the caller decides when to tick.
#[derive(Debug, Clone, Default)]
pub struct ManualScheduler {
    pending: bool,
    requested: u64,
    cancelled: u64,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Consume the pending request, if any.
    pub fn take_pending(&mut self) -> bool {
        std::mem::take(&mut self.pending)
    }

    pub fn requested(&self) -> u64 {
        self.requested
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualScheduler {
    fn request_frame(&mut self) {
        self.pending = true;
        self.requested += 1;
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
        self.cancelled += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
}

/// Idle/Running gate around a host scheduler. Ticks reschedule themselves
/// only while running; a tick already in flight when `stop` is called still
/// completes.
pub struct AnimationLoop<S> {
    state: LoopState,
    scheduler: S,
    last_tick: Option<f64>,
}

impl<S: FrameScheduler> AnimationLoop<S> {
    pub fn new(scheduler: S) -> Self {
        Self {
            state: LoopState::Idle,
            scheduler,
            last_tick: None,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Returns `true` if the loop was idle; the caller then runs the first tick.
    pub fn start(&mut self) -> bool {
        if self.is_running() {
            return false;
        }
        self.state = LoopState::Running;
        self.last_tick = None;
        true
    }

    pub fn stop(&mut self) {
        if !self.is_running() {
            return;
        }
        self.state = LoopState::Idle;
        self.scheduler.cancel_frame();
    }

    /// Motion multiplier for this tick: elapsed time over the 60 fps baseline.
    pub fn motion_factor(&mut self, now: f64) -> f32 {
        let factor = match self.last_tick {
            Some(prev) => (now - prev).clamp(0.0, MAX_FRAME_GAP_MS) / BASELINE_FRAME_MS,
            None => 1.0,
        };
        self.last_tick = Some(now);
        factor as f32
    }

    pub fn finish_tick(&mut self) {
        if self.is_running() {
            self.scheduler.request_frame();
        }
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    pub fn into_scheduler(self) -> S {
        self.scheduler
    }
}
