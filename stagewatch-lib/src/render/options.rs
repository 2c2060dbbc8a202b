use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

/// Smallest width a frame can be squeezed into.
pub const MIN_WIDTH: usize = 20;

/// Available display styles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RenderStyle {
    /// One line: bar, percentage, times and state
    Minimal,

    /// Header, bar, stage, times, steps, and recent messages
    #[default]
    Detailed,

    /// Spinner, per-stage mini bars and a color gradient
    Animated,

    /// One line of fine-grained block glyphs plus the stage name
    Compact,
}

/// Presentation settings shared by every style.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Maximum number of columns of any rendered line.
    pub width: usize,

    /// Number of cells in the main progress bar.
    pub bar_width: usize,
    pub show_spinner: bool,
    pub show_time: bool,
    pub show_percentage: bool,
    pub use_colors: bool,

    /// How many recent messages and errors the detailed style lists.
    pub recent_messages: usize,
}

impl RenderOptions {
    /// Width to lay out against, never below [`MIN_WIDTH`].
    #[must_use]
    pub fn effective_width(&self) -> usize {
        self.width.max(MIN_WIDTH)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 80,
            bar_width: 30,
            show_spinner: true,
            show_time: true,
            show_percentage: true,
            use_colors: false,
            recent_messages: 5,
        }
    }
}
