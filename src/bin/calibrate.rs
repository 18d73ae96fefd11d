//! Headless run of the self-tuning loop against a synthetic frame-cost model:
//! `frame_ms = base + per_star * count`, never faster than a 60 Hz vsync.

use anyhow::Result;
use tui_starfield::animation::ManualScheduler;
use tui_starfield::cache::{CountCache, MemoryCountCache};
use tui_starfield::capability::DeviceClass;
use tui_starfield::config::{StarCount, StarfieldConfig};
use tui_starfield::controller::ControllerMode;
use tui_starfield::starfield::Starfield;
use tui_starfield::surface::Surface;

const VSYNC_MS: f64 = 1000.0 / 60.0;

struct Args {
    frames: usize,
    base_ms: f64,
    per_star_us: f64,
    start: u32,
    max: u32,
    w: usize,
    h: usize,
    ci_smoke: bool,
}

fn parse_args() -> Args {
    let mut args = Args {
        frames: 1200,
        base_ms: 4.0,
        per_star_us: 20.0,
        start: 1000,
        max: 5000,
        w: 160,
        h: 90,
        ci_smoke: false,
    };

    let argv = std::env::args().skip(1).collect::<Vec<_>>();
    let mut i = 0usize;
    while i < argv.len() {
        let k = argv[i].as_str();
        let v = argv.get(i + 1).map(|s| s.as_str());
        match (k, v) {
            ("--frames", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.frames = n.max(1);
                }
                i += 2;
            }
            ("--base-ms", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.base_ms = v.max(0.0);
                }
                i += 2;
            }
            ("--per-star-us", Some(x)) => {
                if let Ok(v) = x.parse::<f64>() {
                    args.per_star_us = v.max(0.0);
                }
                i += 2;
            }
            ("--start", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.start = n;
                }
                i += 2;
            }
            ("--max", Some(x)) => {
                if let Ok(n) = x.parse::<u32>() {
                    args.max = n.max(1);
                }
                i += 2;
            }
            ("--w", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.w = n.max(1);
                }
                i += 2;
            }
            ("--h", Some(x)) => {
                if let Ok(n) = x.parse::<usize>() {
                    args.h = n.max(1);
                }
                i += 2;
            }
            ("--ci-smoke", _) => {
                args.ci_smoke = true;
                i += 1;
            }
            _ => {
                i += 1;
            }
        }
    }
    args
}

fn frame_cost_ms(args: &Args, count: usize) -> f64 {
    (args.base_ms + args.per_star_us * count as f64 / 1000.0).max(VSYNC_MS)
}

fn main() -> Result<()> {
    let args = parse_args();
    let config = StarfieldConfig {
        star_count: StarCount::Fixed(args.start),
        max_star_count: args.max,
        ..StarfieldConfig::default()
    };
    let cache: Box<dyn CountCache> = Box::new(MemoryCountCache::new());
    let mut starfield = Starfield::new(
        config,
        Surface::new(args.w, args.h),
        ManualScheduler::new(),
        Some(cache),
        DeviceClass::Desktop,
    )?
    .with_seed(7);

    println!(
        "calibrate: frames={} base={:.2}ms per_star={:.2}us start={} max={} size={}x{}",
        args.frames, args.base_ms, args.per_star_us, args.start, args.max, args.w, args.h
    );

    let mut now = 0.0f64;
    starfield.start(now);
    let mut calibrated_at = None;
    let mut last_count = starfield.star_count();

    for frame in 0..args.frames {
        if !starfield.scheduler_mut().take_pending() {
            break;
        }
        now += frame_cost_ms(&args, starfield.star_count());
        starfield.tick(now);

        let count = starfield.star_count();
        if count != last_count {
            println!(
                "  t={:>8.1}ms  frame={:>5}  {:>5} -> {:>5}  fps={:>3}  [{}]",
                now,
                frame,
                last_count,
                count,
                starfield.current_fps(),
                starfield.controller_mode().label()
            );
            last_count = count;
        }
        if calibrated_at.is_none()
            && starfield.controller_mode() == ControllerMode::ContinuousOptimization
        {
            calibrated_at = Some((now, starfield.calibration_attempts()));
        }
    }

    match calibrated_at {
        Some((t, attempts)) => println!(
            "calibrated after {:.1}ms in {} attempt(s); final {} stars at {} fps ({:.3} ms/frame)",
            t,
            attempts,
            starfield.star_count(),
            starfield.current_fps(),
            frame_cost_ms(&args, starfield.star_count())
        ),
        None => println!(
            "still calibrating after {} frames ({} stars, {} fps)",
            args.frames,
            starfield.star_count(),
            starfield.current_fps()
        ),
    }

    if args.ci_smoke && calibrated_at.is_none() {
        anyhow::bail!("calibration did not finish within {} frames", args.frames);
    }
    starfield.destroy();
    Ok(())
}
