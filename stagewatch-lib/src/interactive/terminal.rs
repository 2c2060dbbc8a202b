//! Ownership of the terminal surface: raw mode, cursor visibility, and frame painting.

use crossterm::cursor::{Hide, MoveToPreviousLine, Show};
use crossterm::terminal::{Clear, ClearType, disable_raw_mode, enable_raw_mode};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write, stdout};
use std::sync::Once;

/// Put the terminal back the way we found it. Safe to call more than once.
pub fn restore_terminal() {
    let _ = execute!(stdout(), Show);
    let _ = disable_raw_mode();
}

/// Restore the terminal before the default panic output is printed.
pub fn install_panic_hook() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            restore_terminal();
            previous(info);
        }));
    });
}

/// Holds the terminal in display mode; restores it when dropped.
#[derive(Debug)]
pub struct TerminalGuard {
    raw: bool,
}

impl TerminalGuard {
    /// Hide the cursor and, when `raw` is set, switch off line buffering and echo.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal refuses the mode change.
    pub fn enter(raw: bool) -> io::Result<Self> {
        if raw {
            enable_raw_mode()?;
        }

        // construct before hiding the cursor so a failure below still restores raw mode
        let guard = Self { raw };
        execute!(stdout(), Hide)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(stdout(), Show);
        if self.raw {
            let _ = disable_raw_mode();
        }
    }
}

/// Redraws a block of lines in place, erasing the previous frame first.
#[derive(Debug)]
pub struct FramePainter<W: Write> {
    out: W,
    previous_lines: u16,
}

impl<W: Write> FramePainter<W> {
    pub const fn new(out: W) -> Self {
        Self { out, previous_lines: 0 }
    }

    fn erase_previous(&mut self) -> io::Result<()> {
        if self.previous_lines > 0 {
            queue!(self.out, MoveToPreviousLine(self.previous_lines), Clear(ClearType::FromCursorDown))?;
            self.previous_lines = 0;
        }
        Ok(())
    }

    /// Replace the previous frame with `frame`.
    ///
    /// Lines end in `\r\n` so the frame lays out the same with or without raw mode.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn draw(&mut self, frame: &str) -> io::Result<()> {
        self.erase_previous()?;

        let mut count: u16 = 0;
        for line in frame.lines() {
            write!(self.out, "{line}\r\n")?;
            count = count.saturating_add(1);
        }

        self.previous_lines = count;
        self.out.flush()
    }

    /// Erase the last frame.
    ///
    /// # Errors
    ///
    /// Returns an error if writing to the terminal fails.
    pub fn clear(&mut self) -> io::Result<()> {
        self.erase_previous()?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Where the controller draws: a frame painter plus, for a real terminal, the guard
/// that restores it.
#[derive(Debug)]
pub struct Surface<W: Write> {
    painter: FramePainter<W>,
    _guard: Option<TerminalGuard>,
}

impl Surface<Stdout> {
    /// Take over standard output. Raw mode is only needed when reading keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the terminal mode can't be changed.
    pub fn terminal(raw: bool) -> io::Result<Self> {
        let guard = TerminalGuard::enter(raw)?;
        Ok(Self {
            painter: FramePainter::new(stdout()),
            _guard: Some(guard),
        })
    }
}

impl<W: Write> Surface<W> {
    /// Draw into an arbitrary writer without touching any terminal modes.
    pub const fn writer(out: W) -> Self {
        Self {
            painter: FramePainter::new(out),
            _guard: None,
        }
    }

    pub fn painter(&mut self) -> &mut FramePainter<W> {
        &mut self.painter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(bytes: &[u8]) -> String {
        String::from_utf8_lossy(bytes).into_owned()
    }

    #[test]
    fn test_first_draw_writes_lines() {
        let mut painter = FramePainter::new(Vec::new());
        painter.draw("one\ntwo").unwrap();
        assert_eq!(text(&painter.into_inner()), "one\r\ntwo\r\n");
    }

    #[test]
    fn test_second_draw_erases_previous_frame() {
        let mut painter = FramePainter::new(Vec::new());
        painter.draw("one\ntwo").unwrap();
        painter.draw("three").unwrap();

        let out = text(&painter.into_inner());
        // cursor up two lines to column 0, then clear to the end of the screen
        assert!(out.contains("\x1b[2F"), "{out:?}");
        assert!(out.contains("\x1b[J"), "{out:?}");
        assert!(out.ends_with("three\r\n"));
    }

    #[test]
    fn test_clear_erases_and_forgets() {
        let mut painter = FramePainter::new(Vec::new());
        painter.draw("one").unwrap();
        painter.clear().unwrap();
        painter.clear().unwrap();

        let out = text(&painter.into_inner());
        assert_eq!(out.matches("\x1b[1F").count(), 1);
    }

    #[test]
    fn test_writer_surface_has_no_guard() {
        let mut surface = Surface::writer(Vec::new());
        surface.painter().draw("x").unwrap();
        assert!(surface._guard.is_none());
    }
}
