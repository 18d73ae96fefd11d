use crate::animation::FrameScheduler;
use crate::cache::{CountCache, FileCountCache, MemoryCountCache};
use crate::capability::probe_device;
use crate::config::{Background, Cli, ColorPatch, ConfigPatch, HueSpec, StarfieldConfig};
use crate::controller::{ControllerMode, MAX_CALIBRATION_ATTEMPTS};
use crate::render::{Frame, Renderer, make_renderer};
use crate::starfield::Starfield;
use crate::surface::Surface;
use crate::terminal::{Layout, TerminalGuard};
use anyhow::Context;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use log::{info, warn};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

const TRAIL_STEPS: [f32; 4] = [0.0, 0.3, 0.6, 0.85];
const HUE_PALETTES: [HueSpec; 5] = [
    HueSpec::Range(200.0, 260.0),
    HueSpec::Range(0.0, 60.0),
    HueSpec::Range(90.0, 150.0),
    HueSpec::Range(0.0, 360.0),
    HueSpec::Single(0.0),
];
const IDLE_POLL: Duration = Duration::from_millis(30);

/// Frame scheduler for the terminal host: a requested frame becomes due one
/// frame interval after the previous one.
pub struct FramePacer {
    pending: bool,
    interval: Duration,
    last_frame: Instant,
}

impl FramePacer {
    pub fn new(fps_cap: u32) -> Self {
        Self {
            pending: false,
            interval: Duration::from_secs_f64(1.0 / fps_cap.max(1) as f64),
            last_frame: Instant::now(),
        }
    }

    /// Sleep until the pending frame is due and consume it. Returns `false`
    /// if no frame was requested.
    pub fn wait_for_frame(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        let due = self.last_frame + self.interval;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        self.pending = false;
        self.last_frame = Instant::now();
        true
    }
}

impl FrameScheduler for FramePacer {
    fn request_frame(&mut self) {
        self.pending = true;
    }

    fn cancel_frame(&mut self) {
        self.pending = false;
    }
}

enum KeyAction {
    None,
    Quit,
    Relayout,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.resolve().context("invalid configuration")?;
    let cache: Option<Box<dyn CountCache>> = if cli.no_cache {
        Some(Box::new(MemoryCountCache::new()))
    } else {
        FileCountCache::open_default().map(|c| Box::new(c) as Box<dyn CountCache>)
    };
    let device = probe_device();
    info!("device class: {}", device.label());

    let _term = TerminalGuard::new()?;
    let mut out = BufWriter::new(TerminalGuard::stdout());
    let mut renderer = make_renderer(cli.renderer);

    let (cols, rows) = crossterm::terminal::size().context("get terminal size")?;
    if cols < 4 || rows < 2 {
        return Err(anyhow::anyhow!(
            "terminal too small (need at least 4x2, got {cols}x{rows})"
        ));
    }
    let mut show_hud = true;
    let mut layout = Layout::new(cols, rows, show_hud);
    let (w, h) = layout.surface_size(cli.renderer);

    let mut starfield = Starfield::new(config, Surface::new(w, h), FramePacer::new(cli.fps), cache, device)
        .context("create starfield")?;

    let clock_start = Instant::now();
    let now_ms = || clock_start.elapsed().as_secs_f64() * 1000.0;

    starfield.start(now_ms());
    present(&mut *renderer, &mut out, &starfield, layout, show_hud, cli.sync_updates)?;

    loop {
        let mut dirty = false;
        while event::poll(Duration::from_millis(0))? {
            match event::read()? {
                Event::Key(k) if k.kind != KeyEventKind::Release => {
                    match handle_key(k.code, k.modifiers, &mut starfield, &mut show_hud, now_ms()) {
                        KeyAction::Quit => {
                            starfield.destroy();
                            return Ok(());
                        }
                        KeyAction::Relayout => {
                            layout = Layout::new(layout.cols, layout.rows, show_hud);
                            let (w, h) = layout.surface_size(cli.renderer);
                            starfield.resize(w, h);
                        }
                        KeyAction::None => {}
                    }
                    dirty = true;
                }
                Event::Resize(c, r) => {
                    layout = Layout::new(c, r, show_hud);
                    let (w, h) = layout.surface_size(cli.renderer);
                    starfield.resize(w, h);
                    dirty = true;
                }
                _ => {}
            }
        }

        // Resize events can be missed in some terminals.
        let size = crossterm::terminal::size()?;
        if size != (layout.cols, layout.rows) {
            layout = Layout::new(size.0, size.1, show_hud);
            let (w, h) = layout.surface_size(cli.renderer);
            starfield.resize(w, h);
            dirty = true;
        }

        if starfield.scheduler_mut().wait_for_frame() {
            starfield.tick(now_ms());
            dirty = true;
        } else if !dirty {
            std::thread::sleep(IDLE_POLL);
        }

        if dirty {
            present(&mut *renderer, &mut out, &starfield, layout, show_hud, cli.sync_updates)?;
        }
    }
}

fn present(
    renderer: &mut dyn Renderer,
    out: &mut dyn Write,
    starfield: &Starfield<FramePacer>,
    layout: Layout,
    show_hud: bool,
    sync_updates: bool,
) -> anyhow::Result<()> {
    let hud = if show_hud {
        build_hud(starfield, renderer.name())
    } else {
        String::new()
    };
    let surface = starfield.surface();
    let frame = Frame {
        term_cols: layout.cols,
        visual_rows: layout.visual_rows,
        pixel_width: surface.width(),
        pixel_height: surface.height(),
        pixels_rgba: surface.pixels(),
        hud: &hud,
        hud_rows: layout.hud_rows,
        sync_updates,
    };
    renderer.render(&frame, out)
}

fn build_hud(starfield: &Starfield<FramePacer>, renderer_name: &str) -> String {
    let cfg = starfield.config();
    let controller = match starfield.controller_mode() {
        ControllerMode::InitialCalibration => format!(
            "calibrating {}/{}",
            starfield.calibration_attempts(),
            MAX_CALIBRATION_ATTEMPTS
        ),
        ControllerMode::ContinuousOptimization => "optimizing".to_string(),
    };
    format!(
        "FPS: {:>3} | Stars: {:>5}/{} | Auto: {} | Speed: {:.2} | Trail: {:.2} | Renderer: {}{}\n\
Keys: space pause | up/down speed | t trail | c colors | b background | i HUD | q quit",
        starfield.current_fps(),
        starfield.star_count(),
        cfg.max_star_count,
        controller,
        cfg.speed,
        cfg.trail_effect,
        renderer_name,
        if starfield.is_running() { "" } else { " | PAUSED" },
    )
}

fn handle_key(
    code: KeyCode,
    mods: KeyModifiers,
    starfield: &mut Starfield<FramePacer>,
    show_hud: &mut bool,
    now: f64,
) -> KeyAction {
    if mods.contains(KeyModifiers::CONTROL) && matches!(code, KeyCode::Char('c')) {
        return KeyAction::Quit;
    }

    let cfg = starfield.config();
    let patch = match code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => return KeyAction::Quit,
        KeyCode::Char(' ') => {
            if starfield.is_running() {
                starfield.stop();
            } else {
                starfield.start(now);
            }
            return KeyAction::None;
        }
        KeyCode::Char('i') | KeyCode::Char('I') => {
            *show_hud = !*show_hud;
            return KeyAction::Relayout;
        }
        KeyCode::Up => ConfigPatch {
            speed: Some((cfg.speed * 1.25).clamp(0.01, 10.0)),
            ..ConfigPatch::default()
        },
        KeyCode::Down => ConfigPatch {
            speed: Some((cfg.speed / 1.25).clamp(0.01, 10.0)),
            ..ConfigPatch::default()
        },
        KeyCode::Char('t') | KeyCode::Char('T') => ConfigPatch {
            trail_effect: Some(next_in_cycle(&TRAIL_STEPS, &cfg.trail_effect)),
            ..ConfigPatch::default()
        },
        KeyCode::Char('c') | KeyCode::Char('C') => ConfigPatch {
            star_colors: ColorPatch {
                hue: Some(next_in_cycle(&HUE_PALETTES, &cfg.star_colors.hue)),
                ..ColorPatch::default()
            },
            ..ConfigPatch::default()
        },
        KeyCode::Char('b') | KeyCode::Char('B') => ConfigPatch {
            background: Some(match &cfg.background {
                Background::Disabled => StarfieldConfig::default().background,
                Background::Gradient(_) => Background::Disabled,
            }),
            ..ConfigPatch::default()
        },
        _ => return KeyAction::None,
    };

    if let Err(err) = starfield.update_config(&patch) {
        warn!("config update rejected: {err}");
    }
    KeyAction::None
}

/// The entry after `current`, or the first one if `current` is not listed.
fn next_in_cycle<T: Copy + PartialEq>(items: &[T], current: &T) -> T {
    let idx = items
        .iter()
        .position(|x| x == current)
        .map(|i| (i + 1) % items.len())
        .unwrap_or(0);
    items[idx]
}
