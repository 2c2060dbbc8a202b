use core::fmt::{Display, Formatter};
use strum::EnumIter;

/// Lifecycle state of a tracked job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, strum::Display)]
pub enum JobState {
    #[strum(to_string = "Not started")]
    NotStarted,
    Running,
    Paused,
    Cancelled,
    Completed,
    Failed,
}

impl JobState {
    /// Whether no further transitions are possible from this state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::Failed)
    }

    /// The transition table.
    ///
    /// ```text
    /// NotStarted -> Running | Failed
    /// Running    -> Paused | Cancelled | Completed | Failed
    /// Paused     -> Running | Cancelled | Failed
    /// ```
    ///
    /// Terminal states have no outgoing transitions.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::NotStarted, Self::Running | Self::Failed)
                | (Self::Running, Self::Paused | Self::Cancelled | Self::Completed | Self::Failed)
                | (Self::Paused, Self::Running | Self::Cancelled | Self::Failed)
        )
    }

    /// Check a transition, producing the rejection value when it is not allowed.
    pub const fn validate(self, next: Self) -> Result<(), InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(InvalidTransition { from: self, to: next })
        }
    }
}

/// A state change that the transition table does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidTransition {
    pub from: JobState,
    pub to: JobState,
}

impl Display for InvalidTransition {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "cannot go from {} to {}", self.from, self.to)
    }
}

/// Outcome of a state-changing call on the tracker.
///
/// Rejected transitions are not errors: operator commands that make no sense in the
/// current state are simply ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Rejected(InvalidTransition),
}

impl Transition {
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}
