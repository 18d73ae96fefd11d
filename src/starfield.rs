//! The assembled starfield: particle arena, frame clock, controller and
//! compositor driven through one `tick` entry point.

use crate::animation::{AnimationLoop, FrameScheduler};
use crate::cache::CountCache;
use crate::capability::{DeviceClass, InitialCount, resolve_initial_count};
use crate::compositor::{Compositor, RenderStyle};
use crate::config::{ConfigError, ConfigPatch, StarCount, StarfieldConfig};
use crate::controller::{ControllerMode, Decision, PerformanceController};
use crate::frame_clock::FrameClock;
use crate::particle::ParticleField;
use crate::surface::Surface;
use log::info;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum StarfieldError {
    /// The drawing surface is missing or has no pixels.
    ResourceUnavailable(String),
}

impl fmt::Display for StarfieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResourceUnavailable(msg) => write!(f, "drawing surface unavailable: {msg}"),
        }
    }
}

impl std::error::Error for StarfieldError {}

pub struct Starfield<S: FrameScheduler> {
    config: StarfieldConfig,
    field: ParticleField,
    clock: FrameClock,
    controller: PerformanceController,
    compositor: Compositor,
    surface: Surface,
    animation: AnimationLoop<S>,
    cache: Option<Box<dyn CountCache>>,
    initial: InitialCount,
    last_decision: Decision,
}

impl<S: FrameScheduler> Starfield<S> {
    pub fn new(
        config: StarfieldConfig,
        surface: Surface,
        scheduler: S,
        cache: Option<Box<dyn CountCache>>,
        device: DeviceClass,
    ) -> Result<Self, StarfieldError> {
        if surface.width() == 0 || surface.height() == 0 {
            return Err(StarfieldError::ResourceUnavailable(format!(
                "surface is {}x{}",
                surface.width(),
                surface.height()
            )));
        }

        let initial = resolve_initial_count(&config, cache.as_deref(), device);
        info!("starting with {} stars", initial.status_label());
        let field = ParticleField::create(initial.count, config.star_size, config.hue_range());
        let controller =
            PerformanceController::new(config.max_star_count as usize, config.debug);

        Ok(Self {
            config,
            field,
            clock: FrameClock::new(),
            controller,
            compositor: Compositor::new(),
            surface,
            animation: AnimationLoop::new(scheduler),
            cache,
            initial,
            last_decision: Decision::Waiting,
        })
    }

    /// Rebuild the field from a fixed seed, keeping its current size.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.field = ParticleField::with_seed(
            self.field.len(),
            self.config.star_size,
            self.config.hue_range(),
            seed,
        );
        self
    }

    /// No-op while running; otherwise marks the loop running and ticks once.
    /// Timing gathered before a pause is discarded.
    pub fn start(&mut self, now: f64) {
        if self.animation.start() {
            self.clock.clear();
            self.controller.resume(now);
            self.tick(now);
        }
    }

    pub fn stop(&mut self) {
        self.animation.stop();
    }

    pub fn is_running(&self) -> bool {
        self.animation.is_running()
    }

    /// One frame: record timing, let the controller resize the field, advance
    /// the stars, draw, and reschedule if still running.
    pub fn tick(&mut self, now: f64) {
        self.clock.record(now);

        let cache = self
            .cache
            .as_mut()
            .map(|c| &mut **c as &mut dyn CountCache);
        let decision = self
            .controller
            .evaluate(now, &self.clock, &mut self.field, cache);
        if let Decision::CalibrationDone { fps, count, reason } = decision {
            info!("calibration finished at {count} stars ({fps} fps, {reason:?})");
        }
        if decision != Decision::Waiting {
            self.last_decision = decision;
        }

        let factor = self.animation.motion_factor(now);
        self.field.advance(self.config.speed * factor);

        let style = RenderStyle::from_config(&self.config);
        self.compositor
            .draw(&mut self.surface, &self.field, &style, &self.config.background);

        self.animation.finish_tick();
    }

    /// New surface dimensions; the cached background is rebuilt on next draw.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.surface.resize(width, height);
        self.compositor.invalidate_background();
    }

    /// Validate and apply a partial configuration. On error nothing changes.
    /// A running loop is stopped around the update and resumed by requesting
    /// the next frame from the scheduler.
    pub fn update_config(&mut self, patch: &ConfigPatch) -> Result<(), ConfigError> {
        let next = self.config.apply(patch)?;
        let was_running = self.is_running();
        self.stop();

        let prev = std::mem::replace(&mut self.config, next);
        self.apply_config_delta(&prev);

        if was_running && self.animation.start() {
            self.animation.scheduler_mut().request_frame();
        }
        Ok(())
    }

    fn apply_config_delta(&mut self, prev: &StarfieldConfig) {
        let cfg = &self.config;

        if cfg.max_star_count != prev.max_star_count {
            let max = cfg.max_star_count as usize;
            self.controller.set_max_count(max);
            if self.field.len() > max {
                self.field.resize(max);
            }
        }
        if cfg.star_count != prev.star_count {
            if let StarCount::Fixed(n) = cfg.star_count {
                self.field.resize((n as usize).min(cfg.max_star_count as usize));
            }
        }

        let size = (cfg.star_size != prev.star_size).then_some(cfg.star_size);
        let hue = (cfg.star_colors.hue != prev.star_colors.hue).then(|| cfg.hue_range());
        self.field.restyle(size, hue);

        if cfg.background != prev.background {
            self.compositor.invalidate_background();
        }
        if cfg.debug != prev.debug {
            self.controller.set_debug(cfg.debug);
        }
    }

    pub fn current_fps(&self) -> u32 {
        self.clock.estimate_fps().unwrap_or(0)
    }

    /// Stop and release the surface and the scheduler.
    pub fn destroy(mut self) {
        self.stop();
        info!(
            "starfield destroyed ({} stars, {})",
            self.field.len(),
            self.controller.mode().label()
        );
    }

    pub fn config(&self) -> &StarfieldConfig {
        &self.config
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn star_count(&self) -> usize {
        self.field.len()
    }

    pub fn controller_mode(&self) -> ControllerMode {
        self.controller.mode()
    }

    pub fn calibration_attempts(&self) -> u32 {
        self.controller.attempts()
    }

    pub fn last_decision(&self) -> Decision {
        self.last_decision
    }

    pub fn initial_count(&self) -> InitialCount {
        self.initial
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn stars_drawn(&self) -> usize {
        self.compositor.stars_drawn()
    }

    pub fn scheduler(&self) -> &S {
        self.animation.scheduler()
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        self.animation.scheduler_mut()
    }
}
