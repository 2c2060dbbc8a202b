use core::fmt::{Display, Formatter};
use std::io::{IsTerminal, stdin, stdout};
use terminal_size::{Height, Width, terminal_size};

/// Smallest terminal the display will draw into.
pub const MIN_COLUMNS: u16 = 80;
pub const MIN_ROWS: u16 = 24;

/// Reasons the live display cannot start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentError {
    /// Standard output is redirected or otherwise not a terminal.
    NotATerminal,

    /// The terminal did not report its size.
    SizeUnknown,

    TerminalTooSmall { columns: u16, rows: u16 },

    /// Interactive control was requested but standard input is not a terminal.
    InputUnavailable,
}

impl Display for EnvironmentError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotATerminal => write!(f, "render target unavailable: standard output is not an interactive terminal"),
            Self::SizeUnknown => write!(f, "render target unavailable: could not determine the terminal size"),
            Self::TerminalTooSmall { columns, rows } => write!(
                f,
                "render target unavailable: terminal is {columns}x{rows}, at least {MIN_COLUMNS}x{MIN_ROWS} is required"
            ),
            Self::InputUnavailable => write!(f, "input unavailable: interactive mode needs standard input to be a terminal"),
        }
    }
}

impl core::error::Error for EnvironmentError {}

/// What the process knows about its terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TerminalProbe {
    pub stdout_is_terminal: bool,
    pub stdin_is_terminal: bool,

    /// Columns and rows, if known.
    pub size: Option<(u16, u16)>,
}

impl TerminalProbe {
    /// Inspect the current process's terminal.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            stdout_is_terminal: stdout().is_terminal(),
            stdin_is_terminal: stdin().is_terminal(),
            size: terminal_size().map(|(Width(w), Height(h))| (w, h)),
        }
    }

    /// Decide whether a display can start, returning the usable terminal size.
    ///
    /// # Errors
    ///
    /// Returns the first reason the display can't start.
    pub fn check(&self, interactive: bool) -> Result<(u16, u16), EnvironmentError> {
        if !self.stdout_is_terminal {
            return Err(EnvironmentError::NotATerminal);
        }

        let (columns, rows) = self.size.ok_or(EnvironmentError::SizeUnknown)?;
        if columns < MIN_COLUMNS || rows < MIN_ROWS {
            return Err(EnvironmentError::TerminalTooSmall { columns, rows });
        }

        if interactive && !self.stdin_is_terminal {
            return Err(EnvironmentError::InputUnavailable);
        }

        Ok((columns, rows))
    }
}
