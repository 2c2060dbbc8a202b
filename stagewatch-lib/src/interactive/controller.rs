use super::terminal::Surface;
use super::{Command, HELP_LINES, InputSource, KeyInput};
use crate::Result;
use crate::progress::{JobState, ProgressSnapshot, ProgressTracker};
use crate::render::{Line, Paint, RenderStyle, Renderer, percent};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use log::{debug, warn};
use ohno::{IntoAppError, bail};
use std::io::Write;
use std::sync::Arc;
use strum::Display;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// How often the display redraws unless configured otherwise.
pub const DEFAULT_REFRESH: Duration = Duration::from_millis(200);

const INPUT_POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// How much the controller adds below the rendered frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display)]
#[strum(serialize_all = "lowercase")]
pub enum DetailLevel {
    /// The rendered frame only.
    Minimal,

    /// The frame plus a status line.
    #[default]
    Normal,

    /// The frame, the status line, and per sub-task progress.
    Detailed,
}

impl DetailLevel {
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::Minimal => Self::Normal,
            Self::Normal => Self::Detailed,
            Self::Detailed => Self::Minimal,
        }
    }
}

/// Display-only state owned by the controller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UiState {
    pub detail: DetailLevel,
    pub show_help: bool,
    pub last_key: Option<String>,
}

/// Whether the display loop keeps going after handling a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Why a display loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The operator quit the display. The job may still be running.
    Detached,

    /// The job reached a terminal state and the final frame was drawn.
    Finished(JobState),

    /// The display was told to stop by its owner.
    Stopped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControllerOptions {
    pub refresh: Duration,

    /// Erase the display once the job completes successfully.
    pub clear_on_complete: bool,
}

impl Default for ControllerOptions {
    fn default() -> Self {
        Self {
            refresh: DEFAULT_REFRESH,
            clear_on_complete: false,
        }
    }
}

/// Drives a live display of one job: periodic redraws plus operator commands.
#[derive(Debug)]
pub struct InteractiveController {
    tracker: ProgressTracker,
    renderer: Renderer,
    options: ControllerOptions,
    ui: UiState,
    frame: u64,
}

impl InteractiveController {
    #[must_use]
    pub fn new(tracker: ProgressTracker, renderer: Renderer, options: ControllerOptions) -> Self {
        Self {
            tracker,
            renderer,
            options,
            ui: UiState::default(),
            frame: 0,
        }
    }

    #[must_use]
    pub const fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Apply an operator command. Commands the job's state doesn't allow are ignored.
    pub fn dispatch(&mut self, command: Command) -> Flow {
        debug!("operator command: {command:?}");

        let transition = match command {
            Command::Pause => self.tracker.pause(),
            Command::Resume => self.tracker.resume(),
            Command::TogglePause => {
                if self.tracker.is_paused() {
                    self.tracker.resume()
                } else {
                    self.tracker.pause()
                }
            }
            Command::Cancel => self.tracker.cancel(),
            Command::ToggleDetail => {
                self.ui.detail = self.ui.detail.next();
                return Flow::Continue;
            }
            Command::ToggleHelp => {
                self.ui.show_help = !self.ui.show_help;
                return Flow::Continue;
            }
            Command::Quit => return Flow::Quit,
        };

        if !transition.is_applied() {
            debug!("ignored {command:?} in state {}", self.tracker.state());
        }

        Flow::Continue
    }

    /// Record and act on a key press. Unbound keys only update the status line.
    pub fn handle_key(&mut self, key: &KeyInput) -> Flow {
        self.ui.last_key = Some(key.label());
        Command::from_key(key).map_or(Flow::Continue, |command| self.dispatch(command))
    }

    /// The full frame for a snapshot: the rendered block plus the controller's own lines.
    #[must_use]
    pub fn compose_frame(&self, snapshot: &ProgressSnapshot) -> String {
        let options = self.renderer.options();
        let width = options.width;
        let use_colors = options.use_colors;

        let mut lines = vec![self.renderer.render(snapshot, self.frame)];

        // the single-line styles have no room for the failure reason
        if snapshot.state == JobState::Failed
            && matches!(self.renderer.style(), RenderStyle::Minimal | RenderStyle::Compact)
            && let Some(error) = snapshot.last_error()
        {
            lines.push(Line::new().paint(format!("error: {error}"), Paint::Red).finish(width, use_colors));
        }

        if self.ui.detail != DetailLevel::Minimal {
            let mut status = Line::new();
            let _ = status.push(format!("{}  detail: {}", snapshot.state, self.ui.detail));
            if let Some(key) = &self.ui.last_key {
                let _ = status.push(format!("  last key: {key}"));
            }
            let _ = status.paint("  ? for help", Paint::Dim);
            lines.push(status.finish(width, use_colors));
        }

        if self.ui.detail == DetailLevel::Detailed {
            for task in &snapshot.subtasks {
                lines.push(
                    Line::new()
                        .push(format!(
                            "  {} {}/{} {}%",
                            task.name,
                            task.completed,
                            task.total,
                            percent(task.fraction())
                        ))
                        .finish(width, use_colors),
                );
            }
        }

        if self.ui.show_help {
            for help in HELP_LINES {
                lines.push(Line::new().paint(help, Paint::Cyan).finish(width, use_colors));
            }
        }

        lines.join("\n")
    }

    /// Attach to the tracker and run the display loop on the current tokio runtime.
    ///
    /// Keys are read from `input` on a blocking thread. Without an input source the
    /// display is passive and only ends when the job does or when stopped.
    ///
    /// # Errors
    ///
    /// Returns an error if another display is already attached to the tracker.
    pub fn start<W>(self, surface: Surface<W>, input: Option<Box<dyn InputSource>>) -> Result<ControllerHandle>
    where
        W: Write + Send + 'static,
    {
        if !self.tracker.attach_display() {
            bail!("a display is already attached to job '{}'", self.tracker.job_name());
        }

        let claim = DisplayClaim {
            tracker: self.tracker.clone(),
            input_stop: Arc::new(AtomicBool::new(false)),
        };
        let input_stop = Arc::clone(&claim.input_stop);

        let (keys, input_task) = match input {
            Some(source) => {
                let (tx, rx) = mpsc::unbounded_channel();
                let task = spawn_input_reader(source, tx, Arc::clone(&input_stop));
                (Some(rx), Some(task))
            }
            None => (None, None),
        };

        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(surface, keys, stop_rx, claim));

        Ok(ControllerHandle {
            stop_tx,
            task: Some(task),
            input_task,
            input_stop,
            ended: None,
        })
    }

    async fn run<W: Write>(
        mut self,
        mut surface: Surface<W>,
        mut keys: Option<mpsc::UnboundedReceiver<KeyInput>>,
        mut stop_rx: watch::Receiver<bool>,
        _claim: DisplayClaim,
    ) -> Result<SessionOutcome> {
        let mut ticker = tokio::time::interval(self.options.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let snapshot = self.tracker.snapshot();
                    if snapshot.state.is_terminal() {
                        return self.finish(&mut surface, &snapshot);
                    }

                    self.draw(&mut surface, &snapshot)?;
                    self.frame = self.frame.wrapping_add(1);
                }

                key = next_key(&mut keys) => match key {
                    Some(key) => {
                        if self.handle_key(&key) == Flow::Quit {
                            debug!("display detached by operator");
                            return Ok(SessionOutcome::Detached);
                        }

                        let snapshot = self.tracker.snapshot();
                        self.draw(&mut surface, &snapshot)?;
                    }
                    None => keys = None,
                },

                _ = stop_rx.changed() => {
                    let snapshot = self.tracker.snapshot();
                    self.draw(&mut surface, &snapshot)?;
                    return Ok(SessionOutcome::Stopped);
                }
            }
        }
    }

    fn finish<W: Write>(&self, surface: &mut Surface<W>, snapshot: &ProgressSnapshot) -> Result<SessionOutcome> {
        if snapshot.state == JobState::Completed && self.options.clear_on_complete {
            surface.painter().clear().into_app_err("clearing the progress display")?;
        } else {
            self.draw(surface, snapshot)?;
        }

        Ok(SessionOutcome::Finished(snapshot.state))
    }

    fn draw<W: Write>(&self, surface: &mut Surface<W>, snapshot: &ProgressSnapshot) -> Result<()> {
        surface
            .painter()
            .draw(&self.compose_frame(snapshot))
            .into_app_err("drawing the progress display")
    }
}

/// Releases the tracker's display slot and stops the input reader when the loop ends,
/// however it ends.
#[derive(Debug)]
struct DisplayClaim {
    tracker: ProgressTracker,
    input_stop: Arc<AtomicBool>,
}

impl Drop for DisplayClaim {
    fn drop(&mut self) {
        self.input_stop.store(true, Ordering::Release);
        self.tracker.detach_display();
    }
}

fn spawn_input_reader(
    mut source: Box<dyn InputSource>,
    keys: mpsc::UnboundedSender<KeyInput>,
    stop: Arc<AtomicBool>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        while !stop.load(Ordering::Acquire) {
            match source.poll_key(INPUT_POLL_TIMEOUT) {
                Ok(Some(key)) => {
                    if keys.send(key).is_err() {
                        break;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("stopped reading keyboard input: {e}");
                    break;
                }
            }
        }
    })
}

async fn next_key(keys: &mut Option<mpsc::UnboundedReceiver<KeyInput>>) -> Option<KeyInput> {
    match keys {
        Some(rx) => rx.recv().await,
        None => core::future::pending().await,
    }
}

/// Owner's side of a running display loop. Dropping it asks the loop to stop.
#[derive(Debug)]
pub struct ControllerHandle {
    stop_tx: watch::Sender<bool>,
    task: Option<JoinHandle<Result<SessionOutcome>>>,
    input_task: Option<JoinHandle<()>>,
    input_stop: Arc<AtomicBool>,
    ended: Option<Result<SessionOutcome>>,
}

impl ControllerHandle {
    /// Wait for the display loop to end on its own. Safe to call again after it has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing failed or the loop panicked.
    pub async fn wait(&mut self) -> Result<SessionOutcome> {
        if let Some(task) = self.task.as_mut() {
            let joined = task.await;

            // recorded before the next await so a dropped `wait` can't lose it
            self.task = None;
            self.ended = Some(joined.into_app_err("the display loop panicked").and_then(|result| result));
        }

        self.input_stop.store(true, Ordering::Release);
        if let Some(input) = self.input_task.as_mut() {
            let _ = input.await;
            self.input_task = None;
        }

        match self.ended.take() {
            Some(Ok(outcome)) => {
                self.ended = Some(Ok(outcome));
                Ok(outcome)
            }
            Some(Err(e)) => Err(e),
            None => bail!("the display loop already failed"),
        }
    }

    /// Ask the display loop to draw a last frame and end, then wait for it.
    ///
    /// # Errors
    ///
    /// Returns an error if drawing failed or the loop panicked.
    pub async fn stop(mut self) -> Result<SessionOutcome> {
        let _ = self.stop_tx.send(true);
        self.wait().await
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for ControllerHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
        self.input_stop.store(true, Ordering::Release);
    }
}
