use super::RenderOptions;
use super::common::{Line, Paint, bar, format_duration, format_remaining, percent, state_paint};
use crate::progress::ProgressSnapshot;

/// Space taken by everything on the line except the bar, with all parts shown.
const FIXED_PARTS_WIDTH: usize = 40;

pub fn render(snapshot: &ProgressSnapshot, options: &RenderOptions) -> String {
    let cells = options
        .bar_width
        .min(options.effective_width().saturating_sub(FIXED_PARTS_WIDTH))
        .max(10);

    let mut line = Line::new();
    let _ = line
        .push("[")
        .paint(bar(snapshot.overall_fraction, cells, '#', '-'), Paint::Cyan)
        .push("]");

    if options.show_percentage {
        let _ = line.push(format!(" {:>3}%", percent(snapshot.overall_fraction)));
    }

    if options.show_time {
        let _ = line.push(format!(
            " {} / {}",
            format_duration(snapshot.elapsed),
            format_remaining(snapshot.remaining)
        ));
    }

    let _ = line.push(" ").paint(snapshot.state.to_string(), state_paint(snapshot.state));
    line.finish(options.width, options.use_colors)
}
