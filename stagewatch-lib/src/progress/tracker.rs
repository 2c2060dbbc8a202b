use super::{InvalidTransition, JobState, Message, MessageLog, ProgressSnapshot, Severity, Stage, StageWeights, SubTaskProgress, Transition};
use crate::Result;
use chrono::{DateTime, Utc};
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use log::{debug, warn};
use ohno::bail;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use strum::IntoEnumIterator;
use tick::Clock;
use tokio::sync::Notify;

/// Below this overall fraction the remaining time is reported as unknown.
const ETA_EPSILON: f64 = 1e-9;

const DEFAULT_MESSAGE_CAPACITY: usize = 50;
const DEFAULT_ERROR_CAPACITY: usize = 50;

/// Construction-time settings for a [`ProgressTracker`].
#[derive(Debug, Clone)]
pub struct TrackerOptions {
    /// Name shown in renderer headers.
    pub job_name: String,
    pub weights: StageWeights,
    pub message_capacity: usize,
    pub error_capacity: usize,
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self {
            job_name: "job".to_string(),
            weights: StageWeights::default(),
            message_capacity: DEFAULT_MESSAGE_CAPACITY,
            error_capacity: DEFAULT_ERROR_CAPACITY,
        }
    }
}

/// Estimate time remaining assuming the job keeps progressing at its average rate so far.
///
/// Returns `None` when too little progress has been made to extrapolate.
#[must_use]
pub fn estimate_remaining(elapsed: Duration, overall_fraction: f64) -> Option<Duration> {
    if overall_fraction.is_nan() || overall_fraction <= ETA_EPSILON {
        return None;
    }

    if overall_fraction >= 1.0 {
        return Some(Duration::ZERO);
    }

    let secs = elapsed.as_secs_f64() * (1.0 - overall_fraction) / overall_fraction;
    Duration::try_from_secs_f64(secs.max(0.0)).ok()
}

fn clamp_fraction(fraction: f64) -> f64 {
    if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) }
}

#[derive(Debug)]
struct ProgressModel {
    state: JobState,
    stage: Stage,
    stage_fraction: f64,
    overall_fraction: f64,
    started_at: Option<DateTime<Utc>>,
    running_since: Option<Instant>,
    accumulated: Duration,
    completed_steps: u64,
    total_steps: Option<u64>,
    messages: MessageLog,
    errors: MessageLog,
    subtasks: Vec<SubTaskProgress>,
}

impl ProgressModel {
    fn new(options: &TrackerOptions) -> Self {
        Self {
            state: JobState::NotStarted,
            stage: Stage::Initialization,
            stage_fraction: 0.0,
            overall_fraction: 0.0,
            started_at: None,
            running_since: None,
            accumulated: Duration::ZERO,
            completed_steps: 0,
            total_steps: None,
            messages: MessageLog::new(options.message_capacity),
            errors: MessageLog::new(options.error_capacity),
            subtasks: Vec::new(),
        }
    }

    fn elapsed(&self, now: Instant) -> Duration {
        self.accumulated + self.running_since.map_or(Duration::ZERO, |since| now.saturating_duration_since(since))
    }

    /// Switch states, keeping the running-time accounting straight.
    fn enter(&mut self, next: JobState, now: Instant) {
        if let Some(since) = self.running_since.take() {
            self.accumulated += now.saturating_duration_since(since);
        }

        if next == JobState::Running {
            self.running_since = Some(now);
            if self.started_at.is_none() {
                self.started_at = Some(Utc::now());
            }
        }

        self.state = next;
    }

    fn recompute(&mut self, weights: &StageWeights) {
        // never goes backwards
        self.overall_fraction = weights.overall(self.stage, self.stage_fraction).max(self.overall_fraction);
    }

    fn push_message(&mut self, text: String, severity: Severity) {
        let message = Message {
            timestamp: Utc::now(),
            text,
            severity,
        };

        if severity == Severity::Error {
            self.errors.push(message.clone());
        }
        self.messages.push(message);
    }

    fn snapshot(&self, job_name: &str, now: Instant) -> ProgressSnapshot {
        let elapsed = self.elapsed(now);
        let remaining = match self.state {
            JobState::Completed => Some(Duration::ZERO),
            JobState::Cancelled | JobState::Failed => None,
            JobState::NotStarted | JobState::Running | JobState::Paused => estimate_remaining(elapsed, self.overall_fraction),
        };

        let stage_fractions = Stage::iter()
            .map(|stage| {
                let fraction = match stage.cmp(&self.stage) {
                    core::cmp::Ordering::Less => 1.0,
                    core::cmp::Ordering::Equal => self.stage_fraction,
                    core::cmp::Ordering::Greater => 0.0,
                };
                (stage, fraction)
            })
            .collect();

        ProgressSnapshot {
            job_name: job_name.to_string(),
            state: self.state,
            stage: self.stage,
            stage_fraction: self.stage_fraction,
            overall_fraction: self.overall_fraction,
            stage_fractions,
            started_at: self.started_at,
            elapsed,
            remaining,
            completed_steps: self.completed_steps,
            total_steps: self.total_steps,
            recent_messages: self.messages.to_vec(),
            errors: self.errors.iter().map(|m| m.text.clone()).collect(),
            subtasks: self.subtasks.clone(),
        }
    }
}

#[derive(Debug)]
struct Shared {
    model: Mutex<ProgressModel>,
    clock: Clock,
    weights: StageWeights,
    job_name: String,
    state_changed: Notify,
    display_attached: AtomicBool,
}

/// Handle to the progress of one job.
///
/// This is the only writer of the job's progress model. Clones share the same model,
/// so the worker, the renderer, and the input handler can each hold one. Every call
/// takes one short critical section, which keeps snapshots internally consistent.
#[derive(Debug, Clone)]
pub struct ProgressTracker {
    shared: Arc<Shared>,
}

impl ProgressTracker {
    /// Create a tracker with default options and the given job name.
    #[must_use]
    pub fn new(job_name: impl Into<String>, clock: &Clock) -> Self {
        Self::with_options(
            TrackerOptions {
                job_name: job_name.into(),
                ..TrackerOptions::default()
            },
            clock,
        )
    }

    /// Create a tracker that reads elapsed time from `clock`.
    #[must_use]
    pub fn with_options(options: TrackerOptions, clock: &Clock) -> Self {
        Self {
            shared: Arc::new(Shared {
                model: Mutex::new(ProgressModel::new(&options)),
                clock: clock.clone(),
                weights: options.weights,
                job_name: options.job_name,
                state_changed: Notify::new(),
                display_attached: AtomicBool::new(false),
            }),
        }
    }

    fn with_model<R>(&self, f: impl FnOnce(&mut ProgressModel, Instant) -> R) -> R {
        let now = self.shared.clock.instant();
        let mut model = self.shared.model.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut model, now)
    }

    /// Apply a state change if the transition table allows it.
    fn transition(&self, to: JobState, on_applied: impl FnOnce(&mut ProgressModel)) -> Transition {
        self.transition_from(None, to, on_applied)
    }

    /// Like [`Self::transition`], but only when the job is currently in `expected`.
    fn transition_from(&self, expected: Option<JobState>, to: JobState, on_applied: impl FnOnce(&mut ProgressModel)) -> Transition {
        let outcome = self.with_model(|model, now| {
            let checked = match expected {
                Some(expected) if expected != model.state => Err(InvalidTransition { from: model.state, to }),
                _ => model.state.validate(to),
            };

            match checked {
                Ok(()) => {
                    model.enter(to, now);
                    on_applied(model);
                    Transition::Applied
                }
                Err(rejected) => Transition::Rejected(rejected),
            }
        });

        match outcome {
            Transition::Applied => {
                debug!("job '{}' is now {to}", self.shared.job_name);
                self.shared.state_changed.notify_waiters();
            }
            Transition::Rejected(InvalidTransition { from, to }) => {
                debug!("ignoring request to go from {from} to {to}");
            }
        }

        outcome
    }

    #[must_use]
    pub fn job_name(&self) -> &str {
        &self.shared.job_name
    }

    /// Begin running. Has no effect once the job has started, paused or not.
    pub fn start(&self) -> Transition {
        self.transition_from(Some(JobState::NotStarted), JobState::Running, |_| {})
    }

    pub fn pause(&self) -> Transition {
        self.transition_from(Some(JobState::Running), JobState::Paused, |_| {})
    }

    /// Continue a paused job. A job that was never started stays that way.
    pub fn resume(&self) -> Transition {
        self.transition_from(Some(JobState::Paused), JobState::Running, |_| {})
    }

    /// Request the job to stop. The worker has to notice and stop on its own.
    pub fn cancel(&self) -> Transition {
        self.transition(JobState::Cancelled, |_| {})
    }

    /// Mark the job as finished; every stage counts as complete afterwards.
    pub fn complete(&self) -> Transition {
        let weights = self.shared.weights;
        self.transition(JobState::Completed, |model| {
            model.stage = Stage::Cleanup;
            model.stage_fraction = 1.0;
            model.recompute(&weights);
            model.overall_fraction = 1.0;
        })
    }

    /// Record a worker error and mark the job as failed.
    ///
    /// Succeeds from every non-terminal state.
    pub fn fail(&self, error: impl Into<String>) -> Transition {
        let error = error.into();
        let outcome = self.transition(JobState::Failed, |model| model.push_message(error.clone(), Severity::Error));
        if let Transition::Rejected(rejected) = outcome {
            warn!("dropping error reported after the job ended ({rejected}): {error}");
        }
        outcome
    }

    /// Move to `stage`, which must not come before the current stage.
    ///
    /// Stages left behind count as complete. Calling this for the current stage only
    /// raises its fraction. Ignored once the job has ended.
    ///
    /// # Errors
    ///
    /// Returns an error if `stage` comes before the current stage.
    pub fn set_stage(&self, stage: Stage, fraction: f64) -> Result<()> {
        let fraction = clamp_fraction(fraction);
        let weights = self.shared.weights;

        self.with_model(|model, _| {
            if model.state.is_terminal() {
                return Ok(());
            }

            if stage < model.stage {
                bail!("cannot move back from stage {} to stage {stage}", model.stage);
            }

            if stage == model.stage {
                model.stage_fraction = model.stage_fraction.max(fraction);
            } else {
                debug!("entering stage {stage}");
                model.stage = stage;
                model.stage_fraction = fraction;
                model.subtasks.clear();
            }

            model.recompute(&weights);
            Ok(())
        })
    }

    /// Update the current stage's fraction, clamped to `[0, 1]`.
    ///
    /// A value lower than the current fraction is ignored.
    pub fn update_stage_progress(&self, fraction: f64) {
        let fraction = clamp_fraction(fraction);
        let weights = self.shared.weights;

        self.with_model(|model, _| {
            if !model.state.is_terminal() {
                model.stage_fraction = model.stage_fraction.max(fraction);
                model.recompute(&weights);
            }
        });
    }

    pub fn add_message(&self, text: impl Into<String>, severity: Severity) {
        let text = text.into();
        self.with_model(|model, _| {
            if !model.state.is_terminal() {
                model.push_message(text, severity);
            }
        });
    }

    pub fn set_steps(&self, completed: u64, total: Option<u64>) {
        self.with_model(|model, _| {
            if !model.state.is_terminal() {
                model.completed_steps = completed;
                model.total_steps = total;
            }
        });
    }

    pub fn advance_step(&self) {
        self.with_model(|model, _| {
            if !model.state.is_terminal() {
                model.completed_steps += 1;
            }
        });
    }

    /// Add or replace the named sub-task of the current stage.
    ///
    /// Sub-tasks are cleared whenever the job moves to a new stage.
    pub fn update_subtask(&self, name: &str, completed: u64, total: u64) {
        self.with_model(|model, _| {
            if model.state.is_terminal() {
                return;
            }

            if let Some(existing) = model.subtasks.iter_mut().find(|task| task.name == name) {
                existing.completed = completed;
                existing.total = total;
            } else {
                model.subtasks.push(SubTaskProgress {
                    name: name.to_string(),
                    completed,
                    total,
                });
            }
        });
    }

    /// Take a consistent copy of the current progress.
    #[must_use]
    pub fn snapshot(&self) -> ProgressSnapshot {
        self.with_model(|model, now| model.snapshot(&self.shared.job_name, now))
    }

    #[must_use]
    pub fn state(&self) -> JobState {
        self.with_model(|model, _| model.state)
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.state() == JobState::Cancelled
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.state() == JobState::Paused
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.state().is_terminal()
    }

    /// Wait until the job is not paused.
    ///
    /// Workers call this at safe points so that a pause actually holds them back.
    pub async fn wait_while_paused(&self) {
        loop {
            let notified = self.shared.state_changed.notified();
            if !self.is_paused() {
                return;
            }
            notified.await;
        }
    }

    /// Wait for the next state change.
    pub async fn state_changed(&self) {
        self.shared.state_changed.notified().await;
    }

    /// Claim the display for this tracker. Only one display may be attached at a time.
    pub(crate) fn attach_display(&self) -> bool {
        self.shared
            .display_attached
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub(crate) fn detach_display(&self) {
        self.shared.display_attached.store(false, Ordering::Release);
    }
}
