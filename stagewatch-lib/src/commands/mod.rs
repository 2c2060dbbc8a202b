//! Command-line interface for stagewatch
//!
//! This module turns the library into a runnable tool: it parses arguments, manages
//! the display configuration file, and drives a simulated job so the progress
//! tracker, the renderers, and the interactive controller can be exercised end to end.
//!
//! ## Commands
//!
//! - **demo**: Run a simulated multi-stage job under the live display. The job walks
//!   every stage, pauses when asked, stops when cancelled, and can be told to fail in a
//!   given stage. A one-line summary is printed once the display is torn down.
//! - **init**: Generate a default configuration file
//! - **validate**: Check a configuration file's syntax and value ranges
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. All output goes through the [`Host`] so tests can
//! capture it and observe the exit code.
//!
//! Configuration is read from `stagewatch.toml` (or `--config`), falling back to the
//! defaults embedded from `default_config.toml`. Command-line flags win over file values.

mod common;
mod config;
mod demo;
mod host;
mod init;
mod run;
mod validate;

pub use demo::{DemoArgs, run_demo, simulate};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
