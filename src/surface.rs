//! Off-screen RGBA drawing surface and the small color toolkit the
//! compositor paints with.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#rrggbb` or `#rgb` (leading `#` optional).
    pub fn parse_hex(raw: &str) -> Option<Self> {
        let s = raw.trim().trim_start_matches('#');
        let digits = match s.len() {
            6 => s.to_string(),
            3 => s.chars().flat_map(|c| [c, c]).collect(),
            _ => return None,
        };
        let v = u32::from_str_radix(&digits, 16).ok()?;
        Some(Self::new((v >> 16) as u8, (v >> 8) as u8, v as u8))
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Self::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// HSL to RGB. `hue` in degrees (wrapped), `saturation`/`lightness` in percent.
pub fn hsl_to_rgb(hue: f32, saturation: f32, lightness: f32) -> Rgb {
    let h = hue.rem_euclid(360.0) / 60.0;
    let s = (saturation / 100.0).clamp(0.0, 1.0);
    let l = (lightness / 100.0).clamp(0.0, 1.0);

    let c = (1.0 - (2.0 * l - 1.0).abs()) * s;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let m = l - c / 2.0;
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let to_u8 = |v: f32| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    Rgb::new(to_u8(r), to_u8(g), to_u8(b))
}

/// Vertical linear gradient with evenly spaced color stops, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gradient {
    stops: Vec<Rgb>,
}

impl Gradient {
    pub fn new(stops: Vec<Rgb>) -> Option<Self> {
        if stops.is_empty() {
            return None;
        }
        Some(Self { stops })
    }

    pub fn vertical(top: Rgb, bottom: Rgb) -> Self {
        Self {
            stops: vec![top, bottom],
        }
    }

    /// Comma-separated hex colors, e.g. `#000011,#000000`.
    pub fn parse(raw: &str) -> Option<Self> {
        let stops = raw
            .split(',')
            .map(Rgb::parse_hex)
            .collect::<Option<Vec<_>>>()?;
        Self::new(stops)
    }

    pub fn stops(&self) -> &[Rgb] {
        &self.stops
    }

    /// Color at `t` in `[0, 1]`.
    pub fn sample(&self, t: f32) -> Rgb {
        if self.stops.len() == 1 {
            return self.stops[0];
        }
        let span = (self.stops.len() - 1) as f32;
        let pos = t.clamp(0.0, 1.0) * span;
        let i = (pos.floor() as usize).min(self.stops.len() - 2);
        self.stops[i].lerp(self.stops[i + 1], pos - i as f32)
    }
}

impl fmt::Display for Gradient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, stop) in self.stops.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{stop}")?;
        }
        Ok(())
    }
}

/// Straight-alpha RGBA pixel buffer, row-major.
#[derive(Debug, Clone)]
pub struct Surface {
    width: usize,
    height: usize,
    rgba: Vec<u8>,
}

impl Surface {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            rgba: vec![0; width * height * 4],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.rgba
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.rgba
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.rgba.clear();
        self.rgba.resize(width * height * 4, 0);
    }

    pub fn clear(&mut self) {
        self.rgba.fill(0);
    }

    pub fn pixel(&self, x: usize, y: usize) -> [u8; 4] {
        let i = (y * self.width + x) * 4;
        [self.rgba[i], self.rgba[i + 1], self.rgba[i + 2], self.rgba[i + 3]]
    }

    pub fn fill_row(&mut self, y: usize, color: Rgb) {
        if y >= self.height {
            return;
        }
        let start = y * self.width * 4;
        for px in self.rgba[start..start + self.width * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    /// Source-over blend of a single pixel; out-of-bounds writes are dropped.
    pub fn blend_pixel(&mut self, x: i64, y: i64, color: Rgb, alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let i = (y as usize * self.width + x as usize) * 4;
        blend_into(&mut self.rgba[i..i + 4], [color.r, color.g, color.b], alpha);
    }

    /// Composite `src` (same dimensions) over this surface at global `opacity`.
    pub fn draw_image(&mut self, src: &[u8], opacity: f32) {
        if src.len() != self.rgba.len() {
            return;
        }
        for (dst, s) in self.rgba.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
            let a = opacity * s[3] as f32 / 255.0;
            if a > 0.0 {
                blend_into(dst, [s[0], s[1], s[2]], a);
            }
        }
    }
}

fn blend_into(dst: &mut [u8], src: [u8; 3], alpha: f32) {
    let a = alpha.clamp(0.0, 1.0);
    if a <= 0.0 {
        return;
    }
    let da = dst[3] as f32 / 255.0;
    let out_a = a + da * (1.0 - a);
    if out_a <= 0.0 {
        return;
    }
    for c in 0..3 {
        let v = (src[c] as f32 * a + dst[c] as f32 * da * (1.0 - a)) / out_a;
        dst[c] = v.round().clamp(0.0, 255.0) as u8;
    }
    dst[3] = (out_a * 255.0).round() as u8;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_forms() {
        assert_eq!(Rgb::parse_hex("#000011"), Some(Rgb::new(0, 0, 0x11)));
        assert_eq!(Rgb::parse_hex("fff"), Some(Rgb::new(255, 255, 255)));
        assert_eq!(Rgb::parse_hex("#12345"), None);
        assert_eq!(Rgb::parse_hex("#zzzzzz"), None);
    }

    #[test]
    fn hsl_primaries() {
        assert_eq!(hsl_to_rgb(0.0, 100.0, 50.0), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(120.0, 100.0, 50.0), Rgb::new(0, 255, 0));
        assert_eq!(hsl_to_rgb(240.0, 100.0, 50.0), Rgb::new(0, 0, 255));
        assert_eq!(hsl_to_rgb(360.0, 100.0, 50.0), Rgb::new(255, 0, 0));
        assert_eq!(hsl_to_rgb(200.0, 0.0, 100.0), Rgb::new(255, 255, 255));
    }

    #[test]
    fn gradient_samples_endpoints() {
        let g = Gradient::parse("#000000,#ffffff").expect("gradient");
        assert_eq!(g.sample(0.0), Rgb::BLACK);
        assert_eq!(g.sample(1.0), Rgb::new(255, 255, 255));
        assert_eq!(g.sample(0.5), Rgb::new(128, 128, 128));
        assert!(Gradient::parse("").is_none());
        assert_eq!(g.to_string(), "#000000,#ffffff");
    }

    #[test]
    fn opaque_blend_replaces_pixel() {
        let mut s = Surface::new(2, 2);
        s.fill_row(0, Rgb::new(10, 20, 30));
        s.blend_pixel(1, 0, Rgb::new(200, 100, 0), 1.0);
        assert_eq!(s.pixel(1, 0), [200, 100, 0, 255]);
        s.blend_pixel(-1, 5, Rgb::new(1, 1, 1), 1.0);
        assert_eq!(s.pixel(0, 0), [10, 20, 30, 255]);
    }

    #[test]
    fn draw_image_respects_opacity() {
        let mut s = Surface::new(1, 1);
        s.fill_row(0, Rgb::BLACK);
        s.draw_image(&[200, 200, 200, 255], 0.5);
        assert_eq!(s.pixel(0, 0), [100, 100, 100, 255]);
    }
}
