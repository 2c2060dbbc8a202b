use super::RenderOptions;
use super::common::{Line, Paint, percent, state_paint};
use crate::progress::{JobState, ProgressSnapshot};

/// Partial-cell glyphs, indexed by eighths filled (index 0 is an empty cell).
const EIGHTHS: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];
const FULL: char = '█';

/// A bar with eight fill levels per cell.
#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss, reason = "bar widths are small")]
fn fine_bar(fraction: f64, cells: usize) -> String {
    let eighths = (fraction.clamp(0.0, 1.0) * (cells * 8) as f64).floor() as usize;
    let full = (eighths / 8).min(cells);
    let partial = eighths % 8;

    let mut out = String::with_capacity(cells * 3);
    out.extend(core::iter::repeat_n(FULL, full));
    if full < cells {
        out.push(EIGHTHS[partial]);
        out.extend(core::iter::repeat_n(' ', cells - full - 1));
    }
    out
}

pub fn render(snapshot: &ProgressSnapshot, options: &RenderOptions) -> String {
    let cells = options.bar_width.min(options.effective_width().saturating_sub(24)).max(4);

    let mut line = Line::new();
    let _ = line
        .push("▕")
        .paint(fine_bar(snapshot.overall_fraction, cells), Paint::Cyan)
        .push("▏");

    if options.show_percentage {
        let _ = line.push(format!(" {:>3}%", percent(snapshot.overall_fraction)));
    }

    let _ = line.push(" ").paint(snapshot.stage.to_string(), Paint::Bold);
    if snapshot.state != JobState::Running {
        let _ = line.push(" ").paint(snapshot.state.to_string(), state_paint(snapshot.state));
    }

    line.finish(options.width, options.use_colors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::test_support::sample_snapshot;

    #[test]
    fn test_fine_bar_levels() {
        assert_eq!(fine_bar(0.0, 2), "  ");
        assert_eq!(fine_bar(1.0 / 16.0, 2), "▏ ");
        assert_eq!(fine_bar(0.5, 2), "█ ");
        assert_eq!(fine_bar(0.75, 2), "█▌");
        assert_eq!(fine_bar(1.0, 2), "██");
    }

    #[test]
    fn test_fine_bar_keeps_width() {
        for step in 0..=64 {
            let fraction = f64::from(step) / 64.0;
            assert_eq!(fine_bar(fraction, 8).chars().count(), 8, "fraction {fraction}");
        }
    }

    #[test]
    fn test_compact_line() {
        let options = RenderOptions { bar_width: 4, ..RenderOptions::default() };
        assert_eq!(render(&sample_snapshot(), &options), "▕█▋  ▏  42% Collection");
    }

    #[test]
    fn test_compact_shows_state_when_not_running() {
        let snapshot = ProgressSnapshot { state: JobState::Paused, ..sample_snapshot() };
        let options = RenderOptions { bar_width: 4, show_percentage: false, ..RenderOptions::default() };
        assert_eq!(render(&snapshot, &options), "▕█▋  ▏ Collection Paused");
    }

    #[test]
    fn test_compact_is_one_line_within_width() {
        let options = RenderOptions { width: 25, ..RenderOptions::default() };
        let out = render(&sample_snapshot(), &options);
        assert!(!out.contains('\n'));
        assert!(out.chars().count() <= 25);
    }
}
