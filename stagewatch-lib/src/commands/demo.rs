use super::Host;
use super::common::{ColorMode, LogLevel, init_logging};
use super::config::Config;
use crate::Result;
use crate::interactive::{DisplayOptions, SessionOutcome, run_session};
use crate::progress::{JobState, ProgressSnapshot, ProgressTracker, Severity, Stage, TrackerOptions};
use crate::render::RenderStyle;
use camino::Utf8PathBuf;
use clap::Parser;
use core::time::Duration;
use indicatif::FormattedDuration;
use log::info;
use ohno::bail;
use std::io::Write;
use strum::{EnumCount, IntoEnumIterator};
use tick::Clock;

/// Progress updates the simulated worker makes within each stage.
const INCREMENTS_PER_STAGE: u32 = 20;

#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Path to configuration file (default is `stagewatch.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Rendering style
    #[arg(long, value_name = "STYLE")]
    pub style: Option<RenderStyle>,

    /// Time between redraws (e.g. `200ms`)
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    pub refresh: Option<Duration>,

    /// Number of cells in the main progress bar
    #[arg(long, value_name = "N")]
    pub bar_width: Option<usize>,

    /// Don't animate a spinner
    #[arg(long)]
    pub no_spinner: bool,

    /// Don't show elapsed and remaining time
    #[arg(long)]
    pub no_time: bool,

    /// Don't show the percentage
    #[arg(long)]
    pub no_percentage: bool,

    /// Erase the display once the job completes
    #[arg(long)]
    pub clear_on_complete: bool,

    /// Display progress without reading operator keys
    #[arg(long)]
    pub no_interactive: bool,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,

    /// Name of the simulated job
    #[arg(long, value_name = "NAME", default_value = "demo job")]
    pub job_name: String,

    /// Total running time of the simulated job (e.g. `30s`)
    #[arg(long, value_name = "DURATION", default_value = "30s", value_parser = humantime::parse_duration)]
    pub duration: Duration,

    /// Make the simulated job fail halfway through this stage
    #[arg(long, value_name = "STAGE")]
    pub fail_at: Option<Stage>,
}

impl DemoArgs {
    /// Apply the command-line overrides on top of the configuration file's values.
    fn apply_to(&self, config: &mut Config) {
        if let Some(style) = self.style {
            config.style = style;
        }
        if let Some(refresh) = self.refresh {
            config.refresh = refresh;
        }
        if let Some(bar_width) = self.bar_width {
            config.bar_width = bar_width;
        }

        config.show_spinner &= !self.no_spinner;
        config.show_time &= !self.no_time;
        config.show_percentage &= !self.no_percentage;
        config.clear_on_complete |= self.clear_on_complete;
        config.interactive &= !self.no_interactive;
    }

    fn display_options(&self, mut config: Config) -> Result<DisplayOptions> {
        self.apply_to(&mut config);
        config.validate()?;

        let mut options = config.display_options();
        options.use_colors = self.color.use_colors();
        Ok(options)
    }
}

/// Run the simulated job under the live display, then print a one-line summary.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the terminal can't host the display.
pub async fn run_demo<H: Host>(host: &mut H, args: &DemoArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(&Utf8PathBuf::from("."), args.config.as_ref())?;
    let message_capacity = config.message_capacity;
    let options = args.display_options(config)?;
    let clock = Clock::new_tokio();
    let tracker = ProgressTracker::with_options(
        TrackerOptions {
            job_name: args.job_name.clone(),
            message_capacity,
            ..TrackerOptions::default()
        },
        &clock,
    );

    let worker = simulate(tracker.clone(), args.duration, args.fail_at);
    let report = match run_session(&tracker, &options, worker).await {
        Ok(report) => report,
        Err(e) => {
            let _ = writeln!(host.error(), "❌ {e}");
            host.exit(1);
            return Err(e);
        }
    };

    if report.outcome == SessionOutcome::Detached {
        info!("display was detached before the job ended");
    }

    let _ = writeln!(host.output(), "{}", summary(&report.snapshot));
    if matches!(report.snapshot.state, JobState::Failed | JobState::Cancelled) {
        host.exit(1);
    }

    Ok(())
}

/// One line describing how the job ended.
#[must_use]
pub fn summary(snapshot: &ProgressSnapshot) -> String {
    let mut line = format!(
        "{}: {} after {} at {}%",
        snapshot.job_name,
        snapshot.state,
        FormattedDuration(snapshot.elapsed),
        snapshot.percent()
    );

    if snapshot.state == JobState::Failed
        && let Some(error) = snapshot.last_error()
    {
        line.push_str(&format!(" ({error})"));
    }

    line
}

/// A stand-in worker: walks every stage in order, spreading `duration` over small
/// progress increments and honouring pause and cancel between them.
///
/// # Errors
///
/// Fails halfway through `fail_at` when that stage is reached.
pub async fn simulate(tracker: ProgressTracker, duration: Duration, fail_at: Option<Stage>) -> Result<()> {
    let total_increments = INCREMENTS_PER_STAGE * u32::try_from(Stage::COUNT).unwrap_or(u32::MAX);
    let interval = duration / total_increments;
    tracker.set_steps(0, Some(u64::from(total_increments)));

    for stage in Stage::iter() {
        tracker.set_stage(stage, 0.0)?;
        tracker.add_message(format!("entering {stage}"), Severity::Info);

        for i in 1..=INCREMENTS_PER_STAGE {
            tracker.wait_while_paused().await;
            if tracker.is_cancelled() {
                info!("simulated job noticed cancellation in {stage}");
                return Ok(());
            }

            tokio::time::sleep(interval).await;

            if fail_at == Some(stage) && i == INCREMENTS_PER_STAGE / 2 {
                bail!("simulated failure in {stage}");
            }

            tracker.update_stage_progress(f64::from(i) / f64::from(INCREMENTS_PER_STAGE));
            tracker.advance_step();

            match stage {
                Stage::Collection => tracker.update_subtask("pages", u64::from(i), u64::from(INCREMENTS_PER_STAGE)),
                Stage::Analysis => tracker.update_subtask("checks", u64::from(i), u64::from(INCREMENTS_PER_STAGE)),
                _ => {}
            }

            if i % 5 == 0 {
                tracker.add_message(format!("{stage}: {i}/{INCREMENTS_PER_STAGE} units done"), Severity::Info);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tick::ClockControl;

    fn args(extra: &[&str]) -> DemoArgs {
        let argv = ["demo"].iter().chain(extra);
        DemoArgs::parse_from(argv)
    }

    #[test]
    fn test_flags_override_config() {
        let args = args(&["--style", "compact", "--refresh", "50ms", "--no-spinner", "--no-interactive", "--color", "never"]);
        let options = args.display_options(Config::default()).unwrap();

        assert_eq!(options.style, RenderStyle::Compact);
        assert_eq!(options.refresh, Duration::from_millis(50));
        assert!(!options.show_spinner);
        assert!(options.show_time);
        assert!(!options.interactive);
        assert!(!options.use_colors);
    }

    #[test]
    fn test_config_values_survive_without_flags() {
        let config = Config {
            style: RenderStyle::Animated,
            clear_on_complete: true,
            ..Config::default()
        };
        let options = args(&["--color", "never"]).display_options(config).unwrap();
        assert_eq!(options.style, RenderStyle::Animated);
        assert!(options.clear_on_complete);
    }

    #[test]
    fn test_flags_are_validated() {
        assert!(args(&["--bar-width", "5"]).display_options(Config::default()).is_err());
        assert!(args(&["--refresh", "1ms"]).display_options(Config::default()).is_err());
    }

    #[test]
    fn test_fail_at_parses_stage_names() {
        assert_eq!(args(&["--fail-at", "analysis"]).fail_at, Some(Stage::Analysis));
        assert_eq!(args(&["--duration", "2m"]).duration, Duration::from_secs(120));
    }

    #[tokio::test]
    async fn test_simulation_walks_every_stage() {
        let tracker = ProgressTracker::new("sim", &Clock::new_tokio());
        let _ = tracker.start();

        simulate(tracker.clone(), Duration::from_millis(60), None).await.unwrap();

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.stage, Stage::Cleanup);
        assert!((snapshot.overall_fraction - 1.0).abs() < 1e-9);
        assert_eq!(snapshot.completed_steps, snapshot.total_steps.unwrap());
    }

    #[tokio::test]
    async fn test_simulation_fails_where_asked() {
        let tracker = ProgressTracker::new("sim", &Clock::new_tokio());
        let _ = tracker.start();

        let err = simulate(tracker.clone(), Duration::from_millis(60), Some(Stage::Processing))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("simulated failure in Processing"));
        assert_eq!(tracker.snapshot().stage, Stage::Processing);
    }

    #[tokio::test]
    async fn test_simulation_stops_when_cancelled() {
        let tracker = ProgressTracker::new("sim", &Clock::new_tokio());
        let _ = tracker.start();
        let _ = tracker.cancel();

        simulate(tracker.clone(), Duration::from_secs(60), None).await.unwrap();
        assert_eq!(tracker.snapshot().completed_steps, 0);
    }

    #[test]
    fn test_summary_line() {
        let tracker = ProgressTracker::new("nightly crawl", &ClockControl::new().to_clock());
        let _ = tracker.start();
        let _ = tracker.fail("connection timeout");

        let line = summary(&tracker.snapshot());
        assert!(line.starts_with("nightly crawl: Failed after 00:00:0"), "{line}");
        assert!(line.ends_with("(connection timeout)"), "{line}");
    }
}
