use super::RenderOptions;
use super::common::{Line, Paint, bar, format_duration, format_remaining, gradient_paint, percent, spinner_glyph, state_paint};
use crate::progress::{JobState, ProgressSnapshot, Stage};
use strum::IntoEnumIterator;

/// Cells in each per-stage mini bar.
const MINI_BAR_CELLS: usize = 10;

const fn status_glyph(state: JobState, frame: u64, show_spinner: bool) -> char {
    match state {
        JobState::Running if show_spinner => spinner_glyph(frame),
        JobState::NotStarted | JobState::Running => '•',
        JobState::Paused => '‖',
        JobState::Completed => '✔',
        JobState::Cancelled | JobState::Failed => '✖',
    }
}

pub fn render(snapshot: &ProgressSnapshot, frame: u64, options: &RenderOptions) -> String {
    let width = options.width;
    let use_colors = options.use_colors;
    let fraction = snapshot.overall_fraction;
    let mut lines = Vec::new();

    let mut header = Line::new();
    let _ = header
        .paint(status_glyph(snapshot.state, frame, options.show_spinner).to_string(), state_paint(snapshot.state))
        .push(" ")
        .paint(snapshot.job_name.as_str(), Paint::Bold)
        .push(" ")
        .paint(snapshot.state.to_string(), state_paint(snapshot.state));
    lines.push(header.finish(width, use_colors));

    let cells = options.bar_width.min(options.effective_width().saturating_sub(8)).max(1);
    let mut overall = Line::new();
    let _ = overall.push("[").paint(bar(fraction, cells, '█', '░'), gradient_paint(fraction)).push("]");
    if options.show_percentage {
        let _ = overall.paint(format!(" {:>3}%", percent(fraction)), gradient_paint(fraction));
    }
    lines.push(overall.finish(width, use_colors));

    let name_width = Stage::iter().map(|stage| stage.to_string().len()).max().unwrap_or(0);
    for (stage, stage_fraction) in &snapshot.stage_fractions {
        let paint = match stage.cmp(&snapshot.stage) {
            core::cmp::Ordering::Less => Paint::Green,
            core::cmp::Ordering::Equal => Paint::Cyan,
            core::cmp::Ordering::Greater => Paint::Dim,
        };

        let name = stage.to_string();
        let mut mini = Line::new();
        let _ = mini
            .push(format!("  {name:<name_width$} "))
            .paint(bar(*stage_fraction, MINI_BAR_CELLS, '■', '·'), paint)
            .push(format!(" {:>3}%", percent(*stage_fraction)));
        lines.push(mini.finish(width, use_colors));
    }

    if options.show_time {
        let mut time = Line::new();
        let _ = time.paint(
            format!(
                "elapsed {}  remaining {}",
                format_duration(snapshot.elapsed),
                format_remaining(snapshot.remaining)
            ),
            Paint::Dim,
        );
        lines.push(time.finish(width, use_colors));
    }

    if snapshot.state == JobState::Failed
        && let Some(error) = snapshot.last_error()
    {
        lines.push(Line::new().paint(format!("error: {error}"), Paint::Red).finish(width, use_colors));
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::common::SPINNER_GLYPHS;
    use crate::render::test_support::sample_snapshot;

    #[test]
    fn test_animated_spinner_follows_frame() {
        let snapshot = sample_snapshot();
        let options = RenderOptions::default();

        let first = render(&snapshot, 0, &options);
        let second = render(&snapshot, 1, &options);
        assert!(first.starts_with(SPINNER_GLYPHS[0]));
        assert!(second.starts_with(SPINNER_GLYPHS[1]));
        assert_eq!(render(&snapshot, 1, &options), second);
    }

    #[test]
    fn test_animated_without_spinner_is_frame_independent() {
        let snapshot = sample_snapshot();
        let options = RenderOptions { show_spinner: false, ..RenderOptions::default() };
        assert_eq!(render(&snapshot, 0, &options), render(&snapshot, 7, &options));
    }

    #[test]
    fn test_animated_mini_bars() {
        let out = render(&sample_snapshot(), 0, &RenderOptions::default());
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines[2], "  Initialization ■■■■■■■■■■ 100%");
        assert_eq!(lines[3], "  Collection     ■■■■■·····  50%");
        assert_eq!(lines[4], "  Processing     ··········   0%");
    }

    #[test]
    fn test_animated_failed_shows_error() {
        let snapshot = ProgressSnapshot {
            state: JobState::Failed,
            errors: vec!["connection timeout".to_string()],
            ..sample_snapshot()
        };
        let out = render(&snapshot, 3, &RenderOptions::default());
        assert!(out.starts_with('✖'));
        assert!(out.ends_with("error: connection timeout"));
    }

    #[test]
    fn test_animated_colors_follow_gradient() {
        let options = RenderOptions { use_colors: true, ..RenderOptions::default() };
        let early = ProgressSnapshot { overall_fraction: 0.1, ..sample_snapshot() };
        let late = ProgressSnapshot { overall_fraction: 0.9, ..sample_snapshot() };

        let red = format!("{}", owo_colors::OwoColorize::red(&"x"));
        let red_prefix = &red[..red.find('x').unwrap()];
        let green = format!("{}", owo_colors::OwoColorize::green(&"x"));
        let green_prefix = &green[..green.find('x').unwrap()];

        let early_bar = render(&early, 0, &options).lines().nth(1).unwrap().to_string();
        let late_bar = render(&late, 0, &options).lines().nth(1).unwrap().to_string();
        assert!(early_bar.contains(red_prefix));
        assert!(late_bar.contains(green_prefix));
    }
}
