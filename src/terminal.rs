use crate::config::RendererMode;
use anyhow::Context;
use crossterm::{
    ExecutableCommand, cursor,
    terminal::{self, ClearType},
};
use std::io::{Stdout, Write, stdout};

/// Raw mode + alternate screen for the lifetime of the guard.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn new() -> anyhow::Result<Self> {
        terminal::enable_raw_mode().context("enable raw mode")?;
        // Drop must undo raw mode even if the remaining setup fails.
        let guard = Self { _private: () };

        let mut out = stdout();
        out.execute(terminal::EnterAlternateScreen)
            .context("enter alternate screen")?;
        out.execute(terminal::Clear(ClearType::All))
            .context("clear screen")?;
        out.execute(cursor::Hide).context("hide cursor")?;
        Ok(guard)
    }

    pub fn stdout() -> Stdout {
        stdout()
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
        let mut out = stdout();
        let _ = out.write_all(b"\x1b[?2026l\x1b[?7h\x1b[0m");
        let _ = out.flush();
        let _ = out.execute(cursor::Show);
        let _ = out.execute(terminal::LeaveAlternateScreen);
    }
}

/// Terminal cells split into the star area and the HUD strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layout {
    pub cols: u16,
    pub rows: u16,
    pub visual_rows: u16,
    pub hud_rows: u16,
}

impl Layout {
    pub fn new(cols: u16, rows: u16, show_hud: bool) -> Self {
        let hud_rows = if show_hud && rows > 1 {
            (rows - 1).min(2)
        } else {
            0
        };
        Self {
            cols,
            rows,
            visual_rows: rows.saturating_sub(hud_rows),
            hud_rows,
        }
    }

    /// Surface dimensions in pixels for `mode`.
    pub fn surface_size(&self, mode: RendererMode) -> (usize, usize) {
        let (px_w, px_h) = mode.cell_pixels();
        (
            self.cols as usize * px_w,
            self.visual_rows as usize * px_h,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hud_takes_at_most_two_rows() {
        let l = Layout::new(80, 24, true);
        assert_eq!((l.visual_rows, l.hud_rows), (22, 2));
        assert_eq!(l.surface_size(RendererMode::HalfBlock), (80, 44));
        assert_eq!(l.surface_size(RendererMode::Braille), (160, 88));
    }

    #[test]
    fn tiny_or_hidden_hud() {
        assert_eq!(Layout::new(10, 1, true).hud_rows, 0);
        assert_eq!(Layout::new(10, 2, true).hud_rows, 1);
        assert_eq!(Layout::new(10, 24, false).visual_rows, 24);
    }
}
