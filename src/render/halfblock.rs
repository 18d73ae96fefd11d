use crate::render::{begin_frame, end_frame, report_short_buffer, ColorState, Frame, Renderer};
use std::io::Write;

const UPPER_HALF: char = '\u{2580}';

/// One cell per column, two pixels per cell: the upper pixel is the glyph
/// foreground, the lower one the cell background.
pub struct HalfBlockRenderer {
    colors: ColorState,
}

impl HalfBlockRenderer {
    pub fn new() -> Self {
        Self {
            colors: ColorState::default(),
        }
    }
}

impl Default for HalfBlockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer for HalfBlockRenderer {
    fn name(&self) -> &'static str {
        "halfblock"
    }

    fn render(&mut self, frame: &Frame<'_>, out: &mut dyn Write) -> anyhow::Result<()> {
        let cols = frame.term_cols as usize;
        let rows = frame.visual_rows as usize;
        let w = frame.pixel_width;
        if cols == 0 || rows == 0 || w == 0 || frame.pixel_height == 0 {
            return Ok(());
        }
        if w != cols || frame.pixel_height != rows * 2 {
            return Ok(());
        }
        if frame.pixels_rgba.len() < frame.expected_len() {
            report_short_buffer(frame, out)?;
            return Ok(());
        }

        begin_frame(frame, out)?;
        self.colors.reset();
        let px = frame.pixels_rgba;
        let rgb = |i: usize| (px[i], px[i + 1], px[i + 2]);

        for row in 0..rows {
            let top = row * 2 * w;
            let bottom = top + w;
            for x in 0..cols {
                self.colors
                    .set(out, rgb((top + x) * 4), rgb((bottom + x) * 4))?;
                write!(out, "{UPPER_HALF}")?;
            }
            out.write_all(b"\r\n")?;
        }

        end_frame(frame, out)?;
        Ok(())
    }
}
