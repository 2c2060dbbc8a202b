#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for stagewatch
//!
//! This library supervises a long-running, multi-stage job: it tracks the job's
//! progress, renders a live status display in the terminal, and accepts operator
//! commands (pause, resume, cancel) while the job runs.
//!
//! # Module Organization
//!
//! - [`progress`]: Shared job state, the mutation API, and ETA estimation
//! - [`render`]: Rendering strategies that turn a snapshot into text
//! - [`interactive`]: Keyboard control, the redraw/input loop, and terminal lifecycle
//! - `commands`: Command-line interface, configuration, and a simulated worker

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

mod commands;
pub mod interactive;
pub mod progress;
pub mod render;

pub use crate::commands::{Host, run, simulate};
