//! Watch and steer a long-running, multi-stage job from the terminal.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use stagewatch_lib::{Host, run};
use std::io::{Write, stderr, stdout};

/// Carries the end-of-run summary, failure reports, and the exit status. The live
/// display draws on the terminal on its own.
#[derive(Debug, Clone, Copy, Default)]
struct ProcessHost;

#[cfg_attr(coverage_nightly, coverage(off))]
impl Host for ProcessHost {
    fn output(&mut self) -> impl Write {
        stdout()
    }

    fn error(&mut self) -> impl Write {
        stderr()
    }

    fn exit(&mut self, code: i32) {
        std::process::exit(code);
    }
}

#[tokio::main]
#[cfg_attr(coverage_nightly, coverage(off))]
async fn main() -> Result<(), ohno::AppError> {
    run(&mut ProcessHost, std::env::args()).await
}
