//! Rendering strategies for progress snapshots
//!
//! Every style is a pure function of a [`ProgressSnapshot`], a frame counter, and the
//! [`RenderOptions`]. The frame counter only drives animation (the spinner glyph), so
//! rendering the same snapshot with the same counter always yields the same text.
//!
//! - **Minimal**: one line with bar, percentage, elapsed/remaining time, and state
//! - **Detailed**: header, bar, stage, times, step counts, recent messages and errors
//! - **Animated**: spinner, one mini bar per stage, and a color gradient
//! - **Compact**: one line using eighth-cell block glyphs plus the stage name

mod animated;
mod common;
mod compact;
mod detailed;
mod minimal;
mod options;

pub use options::{MIN_WIDTH, RenderOptions, RenderStyle};

pub(crate) use common::{Line, Paint, percent};

use crate::progress::ProgressSnapshot;

/// Turns snapshots into text in one of the available styles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Renderer {
    style: RenderStyle,
    options: RenderOptions,
}

impl Renderer {
    #[must_use]
    pub const fn new(style: RenderStyle, options: RenderOptions) -> Self {
        Self { style, options }
    }

    #[must_use]
    pub const fn style(&self) -> RenderStyle {
        self.style
    }

    #[must_use]
    pub const fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// Render a snapshot as a block of lines separated by `\n`, without a trailing newline.
    #[must_use]
    pub fn render(&self, snapshot: &ProgressSnapshot, frame: u64) -> String {
        match self.style {
            RenderStyle::Minimal => minimal::render(snapshot, &self.options),
            RenderStyle::Detailed => detailed::render(snapshot, &self.options),
            RenderStyle::Animated => animated::render(snapshot, frame, &self.options),
            RenderStyle::Compact => compact::render(snapshot, &self.options),
        }
    }
}
