//! Progress tracking for a multi-stage job
//!
//! The job's state lives in a single model guarded by [`ProgressTracker`], which is
//! the only writer. Workers and the interactive controller call its mutation API;
//! renderers only ever see immutable [`ProgressSnapshot`] copies.
//!
//! # Implementation Model
//!
//! - [`JobState`] is an explicit state machine. [`JobState::can_transition_to`] is the
//!   transition table, shared between the tracker and its tests.
//! - [`Stage`] is an ordered enum. Each stage carries a weight from [`StageWeights`]
//!   and the overall fraction is the weighted sum of per-stage fractions.
//! - Messages and errors are kept in bounded ring buffers ([`MessageLog`]).
//! - Time is read through a [`tick::Clock`] handed to the tracker, so tests can
//!   drive elapsed time with a `tick::ClockControl`.

mod job_state;
mod message_log;
mod snapshot;
mod stage;
mod tracker;

pub use job_state::{InvalidTransition, JobState, Transition};
pub use message_log::{Message, MessageLog, Severity};
pub use snapshot::{ProgressSnapshot, SubTaskProgress};
pub use stage::{Stage, StageProgress, StageWeights};
pub use tracker::{ProgressTracker, TrackerOptions, estimate_remaining};
