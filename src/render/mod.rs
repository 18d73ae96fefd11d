//! Terminal presenters for the RGBA surface.

mod braille;
mod halfblock;

pub use braille::BrailleRenderer;
pub use halfblock::HalfBlockRenderer;

use crate::config::RendererMode;
use std::io::Write;

pub struct Frame<'a> {
    pub term_cols: u16,
    pub visual_rows: u16,
    pub pixel_width: usize,
    pub pixel_height: usize,
    pub pixels_rgba: &'a [u8],
    pub hud: &'a str,
    pub hud_rows: u16,
    pub sync_updates: bool,
}

impl Frame<'_> {
    fn expected_len(&self) -> usize {
        self.pixel_width
            .saturating_mul(self.pixel_height)
            .saturating_mul(4)
    }
}

pub trait Renderer {
    fn name(&self) -> &'static str;
    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()>;
}

pub fn make_renderer(mode: RendererMode) -> Box<dyn Renderer> {
    match mode {
        RendererMode::HalfBlock => Box::new(HalfBlockRenderer::new()),
        RendererMode::Braille => Box::new(BrailleRenderer::new()),
    }
}

/// Tracks the last emitted truecolor escapes so runs of equal cells are cheap.
#[derive(Default)]
pub(crate) struct ColorState {
    fg: Option<(u8, u8, u8)>,
    bg: Option<(u8, u8, u8)>,
}

impl ColorState {
    pub(crate) fn reset(&mut self) {
        self.fg = None;
        self.bg = None;
    }

    pub(crate) fn set(
        &mut self,
        out: &mut dyn Write,
        fg: (u8, u8, u8),
        bg: (u8, u8, u8),
    ) -> std::io::Result<()> {
        if self.fg != Some(fg) {
            write!(out, "\x1b[38;2;{};{};{}m", fg.0, fg.1, fg.2)?;
            self.fg = Some(fg);
        }
        if self.bg != Some(bg) {
            write!(out, "\x1b[48;2;{};{};{}m", bg.0, bg.1, bg.2)?;
            self.bg = Some(bg);
        }
        Ok(())
    }
}

/// Home the cursor, open a synchronized update and disable autowrap.
pub(crate) fn begin_frame(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026h")?;
    }
    // Autowrap off: writing the last column would otherwise wrap and the
    // following CRLF would leave blank rows.
    out.write_all(b"\x1b[H\x1b[0m\x1b[?7l")
}

/// Paint the HUD below the visual rows and close the frame.
pub(crate) fn end_frame(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    let cols = frame.term_cols as usize;
    let mut lines = frame.hud.lines();
    for i in 0..frame.hud_rows as usize {
        write!(out, "\x1b[{};1H\x1b[0m\x1b[2K", frame.visual_rows as usize + i + 1)?;
        if let Some(line) = lines.next() {
            let clipped = line.chars().take(cols).collect::<String>();
            out.write_all(clipped.as_bytes())?;
        }
    }
    out.write_all(b"\x1b[0m\x1b[?7h")?;
    if frame.sync_updates {
        out.write_all(b"\x1b[?2026l")?;
    }
    out.flush()
}

/// Pixel buffer shorter than the declared dimensions: say so instead of panicking.
pub(crate) fn report_short_buffer(frame: &Frame<'_>, out: &mut dyn Write) -> std::io::Result<()> {
    write!(
        out,
        "\x1b[H\x1b[0m\x1b[2Jpixel buffer too small (need {}, got {})",
        frame.expected_len(),
        frame.pixels_rgba.len()
    )?;
    out.flush()
}
