use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// A key press, normalised away from the terminal library's event types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyInput {
    Char(char),
    Enter,
    Esc,
    CtrlC,
    Other(String),
}

impl KeyInput {
    /// Convert a terminal key event, ignoring key releases.
    #[must_use]
    pub fn from_event(event: &KeyEvent) -> Option<Self> {
        if event.kind == KeyEventKind::Release {
            return None;
        }

        let key = match event.code {
            KeyCode::Char('c' | 'C') if event.modifiers.contains(KeyModifiers::CONTROL) => Self::CtrlC,
            KeyCode::Char(c) => Self::Char(c),
            KeyCode::Enter => Self::Enter,
            KeyCode::Esc => Self::Esc,
            other => Self::Other(format!("{other:?}")),
        };

        Some(key)
    }

    /// Short label for the status line.
    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Char(' ') => "space".to_string(),
            Self::Char(c) => c.to_string(),
            Self::Enter => "enter".to_string(),
            Self::Esc => "esc".to_string(),
            Self::CtrlC => "ctrl+c".to_string(),
            Self::Other(name) => name.to_lowercase(),
        }
    }
}

/// Operator commands understood by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause,
    Resume,

    /// Pause a running job or resume a paused one.
    TogglePause,
    Cancel,
    ToggleDetail,
    ToggleHelp,

    /// Detach the display; the job keeps running.
    Quit,
}

impl Command {
    /// The key bindings.
    #[must_use]
    pub fn from_key(key: &KeyInput) -> Option<Self> {
        match key {
            KeyInput::Char(c) => match c.to_ascii_lowercase() {
                'p' => Some(Self::Pause),
                'r' => Some(Self::Resume),
                ' ' => Some(Self::TogglePause),
                'c' => Some(Self::Cancel),
                'd' => Some(Self::ToggleDetail),
                'h' | '?' => Some(Self::ToggleHelp),
                'q' => Some(Self::Quit),
                _ => None,
            },
            KeyInput::CtrlC => Some(Self::Cancel),
            KeyInput::Esc => Some(Self::Quit),
            KeyInput::Enter | KeyInput::Other(_) => None,
        }
    }
}

/// Lines of the help panel.
pub const HELP_LINES: [&str; 4] = [
    "Keys:",
    "  p pause   r resume   space pause/resume",
    "  c cancel  d detail   h/? help",
    "  q/esc quit (job keeps running)",
];
