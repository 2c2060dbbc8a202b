use super::{JobState, Message, Stage, StageProgress};
use chrono::{DateTime, Utc};
use core::time::Duration;

/// Progress of one named sub-task within the current stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubTaskProgress {
    pub name: String,
    pub completed: u64,
    pub total: u64,
}

impl SubTaskProgress {
    /// Completed fraction in `[0, 1]`; zero when the total is zero.
    #[must_use]
    #[expect(clippy::cast_precision_loss, reason = "progress fractions don't need full u64 precision")]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.completed as f64 / self.total as f64).clamp(0.0, 1.0)
        }
    }
}

/// An immutable, internally consistent copy of a job's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub job_name: String,
    pub state: JobState,
    pub stage: Stage,

    /// Fraction of the current stage completed, in `[0, 1]`.
    pub stage_fraction: f64,

    /// Weighted fraction of the whole job completed, in `[0, 1]`.
    pub overall_fraction: f64,

    /// Per-stage fractions in declared order: earlier stages are 1.0, later ones 0.0.
    pub stage_fractions: Vec<(Stage, f64)>,

    /// Wall-clock time at which the job started, if it has.
    pub started_at: Option<DateTime<Utc>>,

    /// Time spent running, excluding paused intervals.
    pub elapsed: Duration,

    /// Estimated time remaining; `None` while it cannot be estimated.
    pub remaining: Option<Duration>,

    pub completed_steps: u64,
    pub total_steps: Option<u64>,

    /// Recent messages of every severity, oldest first.
    pub recent_messages: Vec<Message>,

    /// Recent errors, oldest first.
    pub errors: Vec<String>,

    pub subtasks: Vec<SubTaskProgress>,
}

impl ProgressSnapshot {
    /// The current stage and how far along it is.
    #[must_use]
    pub const fn stage_progress(&self) -> StageProgress {
        StageProgress {
            stage: self.stage,
            fraction: self.stage_fraction,
        }
    }

    /// The most recently recorded error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.errors.last().map(String::as_str)
    }

    /// Overall progress as a whole percentage, rounded down.
    #[must_use]
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss, reason = "value is clamped to 0..=100")]
    pub fn percent(&self) -> u8 {
        (self.overall_fraction * 100.0).floor().clamp(0.0, 100.0) as u8
    }
}
