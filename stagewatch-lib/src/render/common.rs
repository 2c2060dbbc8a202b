//! Building blocks shared by the rendering styles.

use crate::progress::JobState;
use core::time::Duration;
use indicatif::FormattedDuration;
use owo_colors::OwoColorize;

/// Braille spinner frames.
pub const SPINNER_GLYPHS: [char; 10] = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Shown in place of a duration that can't be estimated.
pub const UNKNOWN_DURATION: &str = "--:--:--";

/// Style applied to a segment when colors are enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paint {
    Plain,
    Bold,
    Dim,
    Red,
    Yellow,
    Green,
    Cyan,
}

impl Paint {
    fn apply(self, text: &str) -> String {
        match self {
            Self::Plain => text.to_string(),
            Self::Bold => text.bold().to_string(),
            Self::Dim => text.dimmed().to_string(),
            Self::Red => text.red().to_string(),
            Self::Yellow => text.yellow().to_string(),
            Self::Green => text.green().to_string(),
            Self::Cyan => text.cyan().to_string(),
        }
    }
}

/// A line of text assembled from segments, truncated to a width before painting so
/// escape sequences never count against the width.
#[derive(Debug, Default)]
pub struct Line {
    segments: Vec<(String, Paint)>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, text: impl Into<String>) -> &mut Self {
        self.paint(text, Paint::Plain)
    }

    pub fn paint(&mut self, text: impl Into<String>, paint: Paint) -> &mut Self {
        self.segments.push((text.into(), paint));
        self
    }

    /// Produce the final text, at most `width` columns wide.
    pub fn finish(&self, width: usize, use_colors: bool) -> String {
        let mut out = String::new();
        let mut remaining = width;

        for (text, paint) in &self.segments {
            if remaining == 0 {
                break;
            }

            let visible: String = text.chars().take(remaining).collect();
            remaining -= visible.chars().count();

            if use_colors {
                out.push_str(&paint.apply(&visible));
            } else {
                out.push_str(&visible);
            }
        }

        out.trim_end().to_string()
    }
}

/// Number of whole cells filled for `fraction` of a bar `cells` wide.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss, reason = "bar widths are small")]
pub fn filled_cells(fraction: f64, cells: usize) -> usize {
    let filled = (fraction.clamp(0.0, 1.0) * cells as f64).floor() as usize;
    filled.min(cells)
}

/// A bar of `cells` characters, filled proportionally to `fraction`.
pub fn bar(fraction: f64, cells: usize, fill: char, empty: char) -> String {
    let filled = filled_cells(fraction, cells);
    let mut out = String::with_capacity(cells * fill.len_utf8());
    out.extend(core::iter::repeat_n(fill, filled));
    out.extend(core::iter::repeat_n(empty, cells - filled));
    out
}

/// Whole percentage for a fraction, rounded down.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is clamped to 0..=100")]
pub fn percent(fraction: f64) -> u8 {
    (fraction.clamp(0.0, 1.0) * 100.0).floor() as u8
}

pub fn format_duration(duration: Duration) -> String {
    FormattedDuration(duration).to_string()
}

pub fn format_remaining(remaining: Option<Duration>) -> String {
    remaining.map_or_else(|| UNKNOWN_DURATION.to_string(), format_duration)
}

pub const fn spinner_glyph(frame: u64) -> char {
    SPINNER_GLYPHS[(frame % SPINNER_GLYPHS.len() as u64) as usize]
}

/// Color for a job state label.
pub const fn state_paint(state: JobState) -> Paint {
    match state {
        JobState::NotStarted => Paint::Dim,
        JobState::Running => Paint::Cyan,
        JobState::Paused => Paint::Yellow,
        JobState::Cancelled | JobState::Failed => Paint::Red,
        JobState::Completed => Paint::Green,
    }
}

/// Gradient color keyed to how far along the job is.
pub fn gradient_paint(fraction: f64) -> Paint {
    if fraction < 0.34 {
        Paint::Red
    } else if fraction < 0.67 {
        Paint::Yellow
    } else {
        Paint::Green
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bar_fill() {
        assert_eq!(bar(0.0, 4, '#', '-'), "----");
        assert_eq!(bar(0.5, 4, '#', '-'), "##--");
        assert_eq!(bar(0.99, 4, '#', '-'), "###-");
        assert_eq!(bar(1.0, 4, '#', '-'), "####");
        assert_eq!(bar(3.0, 4, '#', '-'), "####");
        assert_eq!(bar(-1.0, 4, '#', '-'), "----");
    }

    #[test]
    fn test_percent_rounds_down() {
        assert_eq!(percent(0.0), 0);
        assert_eq!(percent(0.429), 42);
        assert_eq!(percent(0.999), 99);
        assert_eq!(percent(1.0), 100);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(None), UNKNOWN_DURATION);
        assert_eq!(format_remaining(Some(Duration::from_secs(3725))), "01:02:05");
    }

    #[test]
    fn test_spinner_cycles() {
        assert_eq!(spinner_glyph(0), SPINNER_GLYPHS[0]);
        assert_eq!(spinner_glyph(SPINNER_GLYPHS.len() as u64), SPINNER_GLYPHS[0]);
        assert_eq!(spinner_glyph(3), SPINNER_GLYPHS[3]);
    }

    #[test]
    fn test_line_truncates_to_width() {
        let mut line = Line::new();
        let _ = line.push("hello ").paint("world", Paint::Green);
        assert_eq!(line.finish(8, false), "hello wo");
        assert_eq!(line.finish(80, false), "hello world");
    }

    #[test]
    fn test_line_colors_do_not_change_text() {
        let mut line = Line::new();
        let _ = line.paint("abc", Paint::Red);
        let colored = line.finish(80, true);
        assert!(colored.contains("abc"));
        assert!(colored.contains('\x1b'));
    }

    #[test]
    fn test_gradient_paint() {
        assert_eq!(gradient_paint(0.1), Paint::Red);
        assert_eq!(gradient_paint(0.5), Paint::Yellow);
        assert_eq!(gradient_paint(0.9), Paint::Green);
    }
}
