use crate::config::{Background, StarfieldConfig};
use crate::particle::ParticleField;
use crate::projector::project;
use crate::surface::{Gradient, Rgb, Surface, hsl_to_rgb};

/// Logical canvas the projection works in. The surface maps onto it with a
/// uniform scale so the field looks the same at any terminal size.
pub const REFERENCE_WIDTH: f32 = 1600.0;
pub const REFERENCE_HEIGHT: f32 = 900.0;

/// Per-draw parameters pulled from the active configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderStyle {
    pub focal_length: f32,
    pub trail_effect: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl RenderStyle {
    pub fn from_config(cfg: &StarfieldConfig) -> Self {
        Self {
            focal_length: cfg.focal_length,
            trail_effect: cfg.trail_effect,
            saturation: cfg.star_colors.saturation,
            lightness: cfg.star_colors.lightness,
        }
    }
}

pub fn view_scale(width: usize, height: usize) -> f32 {
    (width as f32 / REFERENCE_WIDTH).max(height as f32 / REFERENCE_HEIGHT)
}

/// Star opacity for a projection scale: dimmer with depth, capped at 1.
pub fn depth_alpha(scale: f32) -> f32 {
    (scale * 0.7).min(1.0)
}

pub struct Compositor {
    scratch: Vec<u8>,
    background_rows: Option<Vec<Rgb>>,
    stars_drawn: usize,
}

impl Default for Compositor {
    fn default() -> Self {
        Self::new()
    }
}

impl Compositor {
    pub fn new() -> Self {
        Self {
            scratch: Vec::new(),
            background_rows: None,
            stars_drawn: 0,
        }
    }

    /// Drop the cached gradient; call on resize or background change.
    pub fn invalidate_background(&mut self) {
        self.background_rows = None;
    }

    pub fn has_cached_background(&self) -> bool {
        self.background_rows.is_some()
    }

    pub fn stars_drawn(&self) -> usize {
        self.stars_drawn
    }

    pub fn draw(
        &mut self,
        surface: &mut Surface,
        field: &ParticleField,
        style: &RenderStyle,
        background: &Background,
    ) {
        let (w, h) = (surface.width(), surface.height());
        let trail = style.trail_effect.clamp(0.0, 1.0);

        if trail > 0.0 {
            let len = surface.pixels().len();
            if self.scratch.len() != len {
                self.scratch.resize(len, 0);
            }
            self.scratch.copy_from_slice(surface.pixels());
        }

        surface.clear();

        if let Background::Gradient(gradient) = background {
            let rows = self.background_rows(gradient, h);
            for (y, color) in rows.iter().enumerate() {
                surface.fill_row(y, *color);
            }
        }

        if trail > 0.0 {
            surface.draw_image(&self.scratch, trail);
        }

        self.stars_drawn = 0;
        if w == 0 || h == 0 {
            return;
        }
        let view = view_scale(w, h);
        let (cx, cy) = (w as f32 / view / 2.0, h as f32 / view / 2.0);
        for p in field.particles() {
            let proj = project(p.x, p.y, p.z, style.focal_length, cx, cy);
            if !proj.is_visible() {
                continue;
            }
            let color = hsl_to_rgb(p.hue, style.saturation, style.lightness);
            draw_disc(
                surface,
                proj.screen_x * view,
                proj.screen_y * view,
                p.base_size * proj.scale * view,
                color,
                depth_alpha(proj.scale),
            );
            self.stars_drawn += 1;
        }
    }

    fn background_rows(&mut self, gradient: &Gradient, height: usize) -> &[Rgb] {
        let stale = self
            .background_rows
            .as_ref()
            .is_none_or(|rows| rows.len() != height);
        if stale {
            let denom = height.saturating_sub(1).max(1) as f32;
            let rows = (0..height)
                .map(|y| gradient.sample(y as f32 / denom))
                .collect();
            self.background_rows = Some(rows);
        }
        self.background_rows.as_deref().unwrap_or(&[])
    }
}

/// Anti-aliased filled circle. Sub-pixel stars collapse to one pixel.
fn draw_disc(surface: &mut Surface, x: f32, y: f32, radius: f32, color: Rgb, alpha: f32) {
    if radius < 0.5 {
        surface.blend_pixel(x.floor() as i64, y.floor() as i64, color, alpha);
        return;
    }
    let x0 = (x - radius).floor() as i64;
    let x1 = (x + radius).ceil() as i64;
    let y0 = (y - radius).floor() as i64;
    let y1 = (y + radius).ceil() as i64;
    let max_w = surface.width() as i64;
    let max_h = surface.height() as i64;
    if x1 < 0 || y1 < 0 || x0 >= max_w || y0 >= max_h {
        return;
    }
    for py in y0.max(0)..=y1.min(max_h - 1) {
        for px in x0.max(0)..=x1.min(max_w - 1) {
            let dx = px as f32 + 0.5 - x;
            let dy = py as f32 + 0.5 - y;
            let d = (dx * dx + dy * dy).sqrt();
            let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
            if coverage > 0.0 {
                surface.blend_pixel(px, py, color, alpha * coverage);
            }
        }
    }
}
