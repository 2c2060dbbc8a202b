//! Live terminal display with operator control
//!
//! [`run_session`] ties everything together: it checks the terminal, puts it into
//! display mode, starts an [`InteractiveController`] on a refresh interval, reads keys on
//! a blocking thread, runs the job's worker, and restores the terminal however the
//! session ends.
//!
//! The controller never owns job state. It reads snapshots from the shared
//! [`ProgressTracker`](crate::progress::ProgressTracker) and applies operator commands
//! through the tracker's transition API, so a command the job's state doesn't allow is
//! simply ignored.

mod command;
mod controller;
mod environment;
mod input;
mod session;
mod terminal;

pub use command::{Command, HELP_LINES, KeyInput};
pub use controller::{
    ControllerHandle, ControllerOptions, DEFAULT_REFRESH, DetailLevel, Flow, InteractiveController, SessionOutcome, UiState,
};
pub use environment::{EnvironmentError, MIN_COLUMNS, MIN_ROWS, TerminalProbe};
pub use input::{InputSource, ScriptedInput, TerminalInput};
pub use session::{DisplayOptions, SessionReport, run_session, supervise};
pub use terminal::{FramePainter, Surface, TerminalGuard, install_panic_hook, restore_terminal};
