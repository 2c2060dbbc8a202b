use super::controller::{ControllerHandle, ControllerOptions, DEFAULT_REFRESH, InteractiveController, SessionOutcome};
use super::environment::TerminalProbe;
use super::input::{InputSource, TerminalInput};
use super::terminal::{Surface, install_panic_hook};
use crate::Result;
use crate::progress::{ProgressSnapshot, ProgressTracker};
use crate::render::{RenderOptions, RenderStyle, Renderer};
use core::time::Duration;
use log::{debug, info};
use ohno::IntoAppError;
use tokio::task::JoinError;

/// Everything that shapes a live display, independent of the terminal it lands on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub style: RenderStyle,
    pub refresh: Duration,
    pub bar_width: usize,

    /// Fixed line width. `None` uses the terminal's width.
    pub width: Option<usize>,
    pub show_spinner: bool,
    pub show_time: bool,
    pub show_percentage: bool,
    pub clear_on_complete: bool,

    /// Read operator keys while the job runs.
    pub interactive: bool,
    pub use_colors: bool,
    pub recent_messages: usize,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        let render = RenderOptions::default();
        Self {
            style: RenderStyle::default(),
            refresh: DEFAULT_REFRESH,
            bar_width: render.bar_width,
            width: None,
            show_spinner: render.show_spinner,
            show_time: render.show_time,
            show_percentage: render.show_percentage,
            clear_on_complete: false,
            interactive: true,
            use_colors: render.use_colors,
            recent_messages: render.recent_messages,
        }
    }
}

impl DisplayOptions {
    /// The renderer for a terminal `columns` wide.
    #[must_use]
    pub fn renderer(&self, columns: usize) -> Renderer {
        let options = RenderOptions {
            width: self.width.map_or(columns, |width| width.min(columns)),
            bar_width: self.bar_width,
            show_spinner: self.show_spinner,
            show_time: self.show_time,
            show_percentage: self.show_percentage,
            use_colors: self.use_colors,
            recent_messages: self.recent_messages,
        };
        Renderer::new(self.style, options)
    }

    #[must_use]
    pub const fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            refresh: self.refresh,
            clear_on_complete: self.clear_on_complete,
        }
    }
}

/// How a session ended and what the job looked like afterwards.
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub outcome: SessionOutcome,
    pub snapshot: ProgressSnapshot,
}

/// Run `worker` as the job behind `tracker` while displaying it on this process's terminal.
///
/// The terminal is checked before anything starts, so a job never runs without its display.
/// The terminal is restored on every exit path, including panics.
///
/// # Errors
///
/// Returns an error if the terminal can't host the display or drawing fails.
/// A failing worker is not an error here: it shows up as a failed job in the report.
pub async fn run_session<F>(tracker: &ProgressTracker, options: &DisplayOptions, worker: F) -> Result<SessionReport>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let (columns, rows) = TerminalProbe::detect().check(options.interactive)?;
    debug!("terminal is {columns}x{rows}");

    install_panic_hook();
    let surface = Surface::terminal(options.interactive).into_app_err("preparing the terminal")?;
    let input: Option<Box<dyn InputSource>> = if options.interactive {
        Some(Box::new(TerminalInput))
    } else {
        None
    };

    let controller = InteractiveController::new(tracker.clone(), options.renderer(usize::from(columns)), options.controller_options());
    let display = controller.start(surface, input)?;
    supervise(tracker, display, worker).await
}

/// Start the job, run `worker` to completion, and settle the job's final state.
///
/// If the operator detaches the display the worker still runs to the end; a job left
/// paused at that point is resumed since nobody remains to resume it.
///
/// # Errors
///
/// Returns an error if the display loop failed.
pub async fn supervise<F>(tracker: &ProgressTracker, mut display: ControllerHandle, worker: F) -> Result<SessionReport>
where
    F: Future<Output = Result<()>> + Send + 'static,
{
    let _ = tracker.start();
    let mut worker = tokio::spawn(worker);

    let mut display_result = None;
    let joined = tokio::select! {
        joined = &mut worker => joined,
        result = display.wait() => {
            display_result = Some(result);
            if tracker.is_paused() {
                info!("display detached while the job was paused, resuming it");
                let _ = tracker.resume();
            }
            (&mut worker).await
        }
    };

    settle(tracker, joined);

    let outcome = match display_result {
        Some(result) => result?,
        None => display.wait().await?,
    };

    Ok(SessionReport {
        outcome,
        snapshot: tracker.snapshot(),
    })
}

fn settle(tracker: &ProgressTracker, joined: Result<Result<()>, JoinError>) {
    match joined {
        Ok(Ok(())) => {
            if tracker.is_paused() {
                let _ = tracker.resume();
            }
            let _ = tracker.complete();
        }
        Ok(Err(e)) => {
            // only the headline; the context chain and backtrace don't fit a status line
            let text = e.to_string();
            let _ = tracker.fail(text.lines().next().unwrap_or_default());
        }
        Err(e) => {
            let _ = tracker.fail(format!("worker stopped unexpectedly: {e}"));
        }
    }
}
