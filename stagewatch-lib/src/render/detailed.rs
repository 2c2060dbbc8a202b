use super::RenderOptions;
use super::common::{Line, Paint, bar, format_duration, format_remaining, percent, state_paint};
use crate::progress::{ProgressSnapshot, Severity, Stage};
use strum::EnumCount;

pub fn render(snapshot: &ProgressSnapshot, options: &RenderOptions) -> String {
    let width = options.width;
    let use_colors = options.use_colors;
    let mut lines = Vec::new();

    let mut header = Line::new();
    let _ = header
        .paint(snapshot.job_name.as_str(), Paint::Bold)
        .push(" [")
        .paint(snapshot.state.to_string(), state_paint(snapshot.state))
        .push("]");
    lines.push(header.finish(width, use_colors));

    // "[" + bar + "] " + "100.0%"
    let cells = options.bar_width.min(options.effective_width().saturating_sub(9)).max(1);
    let mut progress = Line::new();
    let _ = progress
        .push("[")
        .paint(bar(snapshot.overall_fraction, cells, '=', ' '), Paint::Cyan)
        .push("]");
    if options.show_percentage {
        let _ = progress.push(format!(" {:>5.1}%", snapshot.overall_fraction * 100.0));
    }
    lines.push(progress.finish(width, use_colors));

    let current = snapshot.stage_progress();
    let mut stage = Line::new();
    let _ = stage
        .push("Stage: ")
        .paint(current.stage.to_string(), Paint::Bold)
        .push(format!(
            " ({}/{}) {}%",
            current.stage.index() + 1,
            Stage::COUNT,
            percent(current.fraction)
        ));
    lines.push(stage.finish(width, use_colors));

    if options.show_time {
        let mut time = Line::new();
        let _ = time.push(format!(
            "Elapsed: {}  Remaining: {}",
            format_duration(snapshot.elapsed),
            format_remaining(snapshot.remaining)
        ));
        lines.push(time.finish(width, use_colors));
    }

    let steps = match snapshot.total_steps {
        Some(total) => format!("Steps: {}/{total}", snapshot.completed_steps),
        None => format!("Steps: {}", snapshot.completed_steps),
    };
    lines.push(Line::new().push(steps).finish(width, use_colors));

    let recent_info: Vec<_> = snapshot
        .recent_messages
        .iter()
        .filter(|m| m.severity == Severity::Info)
        .collect();
    let recent_info = &recent_info[recent_info.len().saturating_sub(options.recent_messages)..];
    if !recent_info.is_empty() {
        lines.push(Line::new().paint("Messages:", Paint::Bold).finish(width, use_colors));
        for message in recent_info {
            // time since the job started
            let offset = snapshot
                .started_at
                .and_then(|started| (message.timestamp - started).to_std().ok())
                .unwrap_or_default();
            let mut entry = Line::new();
            let _ = entry
                .paint(format!("  +{} ", format_duration(offset)), Paint::Dim)
                .push(message.text.as_str());
            lines.push(entry.finish(width, use_colors));
        }
    }

    let recent_errors = &snapshot.errors[snapshot.errors.len().saturating_sub(options.recent_messages)..];
    if !recent_errors.is_empty() {
        lines.push(Line::new().paint("Errors:", Paint::Bold).finish(width, use_colors));
        for error in recent_errors {
            let mut entry = Line::new();
            let _ = entry.paint(format!("  ! {error}"), Paint::Red);
            lines.push(entry.finish(width, use_colors));
        }
    }

    lines.join("\n")
}
