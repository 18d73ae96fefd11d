use crate::particle::{HueRange, SizeRange};
use crate::surface::{Gradient, Rgb};
use clap::{Parser, ValueEnum};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

#[derive(Parser, Debug, Clone)]
#[command(name = "tui-starfield", version, about = "Self-tuning starfield for the terminal")]
pub struct Cli {
    #[arg(long, value_enum, default_value_t = RendererMode::HalfBlock)]
    pub renderer: RendererMode,

    /// Frame-rate cap for the host loop.
    #[arg(long, default_value_t = 60)]
    pub fps: u32,

    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub sync_updates: bool,

    /// `key=value` file layered under the command-line options.
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Skip reading and writing the calibrated star count.
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,

    /// `auto` or a fixed count.
    #[arg(long)]
    pub star_count: Option<StarCount>,

    #[arg(long)]
    pub max_star_count: Option<u32>,

    #[arg(long)]
    pub speed: Option<f32>,

    #[arg(long)]
    pub focal_length: Option<f32>,

    #[arg(long)]
    pub trail_effect: Option<f32>,

    #[arg(long)]
    pub star_size_min: Option<f32>,

    #[arg(long)]
    pub star_size_max: Option<f32>,

    /// A single hue or `min,max` in degrees.
    #[arg(long)]
    pub hue: Option<HueSpec>,

    #[arg(long)]
    pub saturation: Option<f32>,

    #[arg(long)]
    pub lightness: Option<f32>,

    #[arg(long)]
    pub mobile_count: Option<u32>,

    #[arg(long)]
    pub desktop_count: Option<u32>,

    /// Comma-separated hex stops, or `none`.
    #[arg(long)]
    pub background: Option<Background>,

    /// Log controller decisions.
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RendererMode {
    #[value(name = "half-block", alias = "halfblock", alias = "half_block", alias = "hb")]
    HalfBlock,
    #[value(alias = "hires", alias = "dots")]
    Braille,
}

impl RendererMode {
    /// Surface pixels per terminal cell (columns, rows).
    pub fn cell_pixels(self) -> (usize, usize) {
        match self {
            Self::HalfBlock => (1, 2),
            Self::Braille => (2, 4),
        }
    }
}

impl Cli {
    pub fn patch(&self) -> ConfigPatch {
        ConfigPatch {
            star_count: self.star_count,
            max_star_count: self.max_star_count,
            speed: self.speed,
            focal_length: self.focal_length,
            trail_effect: self.trail_effect,
            star_size: SizePatch {
                min: self.star_size_min,
                max: self.star_size_max,
            },
            star_colors: ColorPatch {
                hue: self.hue,
                saturation: self.saturation,
                lightness: self.lightness,
            },
            device_detection: DevicePatch {
                mobile: self.mobile_count,
                desktop: self.desktop_count,
            },
            debug: self.debug.then_some(true),
            background: self.background.clone(),
        }
    }

    /// Defaults, then the config file, then command-line options.
    pub fn resolve(&self) -> Result<StarfieldConfig, ConfigError> {
        let mut patch = match &self.config {
            Some(path) => ConfigPatch::load(path)?,
            None => ConfigPatch::default(),
        };
        patch = patch.overlay(self.patch());
        StarfieldConfig::default().apply(&patch)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    InvertedRange {
        field: &'static str,
        min: f64,
        max: f64,
    },
    InvalidHueRange(String),
    InvalidValue {
        field: &'static str,
        message: String,
    },
    Parse {
        line: usize,
        message: String,
    },
    Io(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                field,
                value,
                min,
                max,
            } => write!(f, "{field}={value} is outside [{min}, {max}]"),
            Self::InvertedRange { field, min, max } => {
                write!(f, "{field}: min {min} is greater than max {max}")
            }
            Self::InvalidHueRange(msg) => write!(f, "invalid hue range: {msg}"),
            Self::InvalidValue { field, message } => {
                write!(f, "invalid value for {field}: {message}")
            }
            Self::Parse { line, message } => write!(f, "parse error at line {line}: {message}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StarCount {
    /// Cached calibration result, else the device heuristic.
    Auto,
    Fixed(u32),
}

impl FromStr for StarCount {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(Self::Auto);
        }
        s.parse::<u32>()
            .map(Self::Fixed)
            .map_err(|_| ConfigError::InvalidValue {
                field: "star_count",
                message: format!("expected 'auto' or an integer, got '{s}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HueSpec {
    Single(f32),
    Range(f32, f32),
}

impl HueSpec {
    pub fn range(self) -> HueRange {
        match self {
            Self::Single(h) => HueRange::single(h),
            Self::Range(a, b) => HueRange::new(a, b),
        }
    }

    fn validate(self) -> Result<(), ConfigError> {
        match self {
            Self::Single(h) => check_range("star_colors.hue", h as f64, 0.0, 360.0),
            Self::Range(a, b) => {
                for v in [a, b] {
                    if !(0.0..=360.0).contains(&v) {
                        return Err(ConfigError::InvalidHueRange(format!(
                            "{v} is outside [0, 360]"
                        )));
                    }
                }
                if a > b {
                    return Err(ConfigError::InvalidHueRange(format!(
                        "start {a} is greater than end {b}"
                    )));
                }
                Ok(())
            }
        }
    }
}

impl FromStr for HueSpec {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = s.split(',').map(str::trim).collect::<Vec<_>>();
        let num = |p: &str| {
            p.parse::<f32>()
                .map_err(|_| ConfigError::InvalidHueRange(format!("'{p}' is not a number")))
        };
        match parts.as_slice() {
            [h] => Ok(Self::Single(num(h)?)),
            [a, b] => Ok(Self::Range(num(a)?, num(b)?)),
            _ => Err(ConfigError::InvalidHueRange(format!(
                "expected 'h' or 'min,max', got '{s}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Background {
    Disabled,
    Gradient(Gradient),
}

impl FromStr for Background {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "false" | "off" => return Ok(Self::Disabled),
            _ => {}
        }
        Gradient::parse(s)
            .map(Self::Gradient)
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "background",
                message: format!("expected 'none' or comma-separated hex colors, got '{s}'"),
            })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarColors {
    pub hue: HueSpec,
    pub saturation: f32,
    pub lightness: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceCounts {
    pub mobile: u32,
    pub desktop: u32,
}

/// Fully resolved, validated configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct StarfieldConfig {
    pub star_count: StarCount,
    pub max_star_count: u32,
    pub speed: f32,
    pub focal_length: f32,
    pub trail_effect: f32,
    pub star_size: SizeRange,
    pub star_colors: StarColors,
    pub device_detection: DeviceCounts,
    pub debug: bool,
    pub background: Background,
}

impl Default for StarfieldConfig {
    fn default() -> Self {
        Self {
            star_count: StarCount::Auto,
            max_star_count: 5000,
            speed: 0.5,
            focal_length: 300.0,
            trail_effect: 0.3,
            star_size: SizeRange::new(0.5, 2.0),
            star_colors: StarColors {
                hue: HueSpec::Range(200.0, 260.0),
                saturation: 80.0,
                lightness: 85.0,
            },
            device_detection: DeviceCounts {
                mobile: 300,
                desktop: 1000,
            },
            debug: false,
            background: Background::Gradient(default_gradient()),
        }
    }
}

fn default_gradient() -> Gradient {
    Gradient::vertical(Rgb::new(0x00, 0x00, 0x11), Rgb::BLACK)
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizePatch {
    pub min: Option<f32>,
    pub max: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ColorPatch {
    pub hue: Option<HueSpec>,
    pub saturation: Option<f32>,
    pub lightness: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DevicePatch {
    pub mobile: Option<u32>,
    pub desktop: Option<u32>,
}

/// Partial update. `None` leaves the current value untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigPatch {
    pub star_count: Option<StarCount>,
    pub max_star_count: Option<u32>,
    pub speed: Option<f32>,
    pub focal_length: Option<f32>,
    pub trail_effect: Option<f32>,
    pub star_size: SizePatch,
    pub star_colors: ColorPatch,
    pub device_detection: DevicePatch,
    pub debug: Option<bool>,
    pub background: Option<Background>,
}

impl ConfigPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fields set in `top` win over fields set in `self`.
    pub fn overlay(self, top: ConfigPatch) -> ConfigPatch {
        ConfigPatch {
            star_count: top.star_count.or(self.star_count),
            max_star_count: top.max_star_count.or(self.max_star_count),
            speed: top.speed.or(self.speed),
            focal_length: top.focal_length.or(self.focal_length),
            trail_effect: top.trail_effect.or(self.trail_effect),
            star_size: SizePatch {
                min: top.star_size.min.or(self.star_size.min),
                max: top.star_size.max.or(self.star_size.max),
            },
            star_colors: ColorPatch {
                hue: top.star_colors.hue.or(self.star_colors.hue),
                saturation: top.star_colors.saturation.or(self.star_colors.saturation),
                lightness: top.star_colors.lightness.or(self.star_colors.lightness),
            },
            device_detection: DevicePatch {
                mobile: top.device_detection.mobile.or(self.device_detection.mobile),
                desktop: top.device_detection.desktop.or(self.device_detection.desktop),
            },
            debug: top.debug.or(self.debug),
            background: top.background.or(self.background),
        }
    }

    /// Range-check every field present in the patch.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(StarCount::Fixed(n)) = self.star_count {
            check_range("star_count", n as f64, 1.0, 10_000.0)?;
        }
        if let Some(v) = self.max_star_count {
            check_range("max_star_count", v as f64, 100.0, 50_000.0)?;
        }
        if let Some(v) = self.speed {
            check_range("speed", v as f64, 0.01, 10.0)?;
        }
        if let Some(v) = self.focal_length {
            check_range("focal_length", v as f64, 50.0, 1000.0)?;
        }
        if let Some(v) = self.trail_effect {
            check_range("trail_effect", v as f64, 0.0, 1.0)?;
        }
        if let Some(v) = self.star_size.min {
            check_range("star_size.min", v as f64, 0.1, 10.0)?;
        }
        if let Some(v) = self.star_size.max {
            check_range("star_size.max", v as f64, 0.1, 10.0)?;
        }
        if let Some(hue) = self.star_colors.hue {
            hue.validate()?;
        }
        if let Some(v) = self.star_colors.saturation {
            check_range("star_colors.saturation", v as f64, 0.0, 100.0)?;
        }
        if let Some(v) = self.star_colors.lightness {
            check_range("star_colors.lightness", v as f64, 0.0, 100.0)?;
        }
        if let Some(v) = self.device_detection.mobile {
            check_range("device_detection.mobile", v as f64, 1.0, 10_000.0)?;
        }
        if let Some(v) = self.device_detection.desktop {
            check_range("device_detection.desktop", v as f64, 1.0, 10_000.0)?;
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {e}", path.display())))?;
        Self::parse(&text)
    }

    /// `key=value` lines; `#` starts a comment. Keys mirror the field paths.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut patch = Self::default();
        for (line_idx, raw) in text.lines().enumerate() {
            let line_no = line_idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let (key, value) = line.split_once('=').ok_or(ConfigError::Parse {
                line: line_no,
                message: "expected <key>=<value>".to_string(),
            })?;
            let key = key.trim();
            let value = value.trim();
            let at_line = |err: ConfigError| ConfigError::Parse {
                line: line_no,
                message: err.to_string(),
            };

            match key {
                "star_count" => patch.star_count = Some(value.parse().map_err(at_line)?),
                "max_star_count" => {
                    patch.max_star_count = Some(parse_num(value, line_no, key)?);
                }
                "speed" => patch.speed = Some(parse_num(value, line_no, key)?),
                "focal_length" => patch.focal_length = Some(parse_num(value, line_no, key)?),
                "trail_effect" => patch.trail_effect = Some(parse_num(value, line_no, key)?),
                "star_size.min" => patch.star_size.min = Some(parse_num(value, line_no, key)?),
                "star_size.max" => patch.star_size.max = Some(parse_num(value, line_no, key)?),
                "star_colors.hue" => {
                    patch.star_colors.hue = Some(value.parse().map_err(at_line)?);
                }
                "star_colors.saturation" => {
                    patch.star_colors.saturation = Some(parse_num(value, line_no, key)?);
                }
                "star_colors.lightness" => {
                    patch.star_colors.lightness = Some(parse_num(value, line_no, key)?);
                }
                "device_detection.mobile" => {
                    patch.device_detection.mobile = Some(parse_num(value, line_no, key)?);
                }
                "device_detection.desktop" => {
                    patch.device_detection.desktop = Some(parse_num(value, line_no, key)?);
                }
                "debug" => {
                    patch.debug = Some(parse_bool(value).ok_or_else(|| ConfigError::Parse {
                        line: line_no,
                        message: "debug must be true/false".to_string(),
                    })?);
                }
                "background" => patch.background = Some(value.parse().map_err(at_line)?),
                _ => {
                    return Err(ConfigError::Parse {
                        line: line_no,
                        message: format!("unknown key '{key}'"),
                    });
                }
            }
        }
        Ok(patch)
    }
}

impl StarfieldConfig {
    /// Validate `patch` and return the merged configuration. `self` is never
    /// modified, so a rejected patch leaves the caller's config intact.
    pub fn apply(&self, patch: &ConfigPatch) -> Result<StarfieldConfig, ConfigError> {
        patch.validate()?;

        let star_size = SizeRange::new(
            patch.star_size.min.unwrap_or(self.star_size.min),
            patch.star_size.max.unwrap_or(self.star_size.max),
        );
        if star_size.min > star_size.max {
            return Err(ConfigError::InvertedRange {
                field: "star_size",
                min: star_size.min as f64,
                max: star_size.max as f64,
            });
        }

        Ok(StarfieldConfig {
            star_count: patch.star_count.unwrap_or(self.star_count),
            max_star_count: patch.max_star_count.unwrap_or(self.max_star_count),
            speed: patch.speed.unwrap_or(self.speed),
            focal_length: patch.focal_length.unwrap_or(self.focal_length),
            trail_effect: patch.trail_effect.unwrap_or(self.trail_effect),
            star_size,
            star_colors: StarColors {
                hue: patch.star_colors.hue.unwrap_or(self.star_colors.hue),
                saturation: patch
                    .star_colors
                    .saturation
                    .unwrap_or(self.star_colors.saturation),
                lightness: patch
                    .star_colors
                    .lightness
                    .unwrap_or(self.star_colors.lightness),
            },
            device_detection: DeviceCounts {
                mobile: patch
                    .device_detection
                    .mobile
                    .unwrap_or(self.device_detection.mobile),
                desktop: patch
                    .device_detection
                    .desktop
                    .unwrap_or(self.device_detection.desktop),
            },
            debug: patch.debug.unwrap_or(self.debug),
            background: patch
                .background
                .clone()
                .unwrap_or_else(|| self.background.clone()),
        })
    }

    pub fn hue_range(&self) -> HueRange {
        self.star_colors.hue.range()
    }
}

/// Bounds are compared at `f32` precision so `0.01` given as `f32` passes.
fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if (min as f32..=max as f32).contains(&(value as f32)) {
        return Ok(());
    }
    Err(ConfigError::OutOfRange {
        field,
        value,
        min,
        max,
    })
}

fn parse_num<T: FromStr>(value: &str, line: usize, key: &str) -> Result<T, ConfigError> {
    value.parse::<T>().map_err(|_| ConfigError::Parse {
        line,
        message: format!("{key}: '{value}' is not a valid number"),
    })
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
