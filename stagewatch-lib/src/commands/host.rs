use std::io::Write;

/// The process around a command: its two output streams and its exit status.
///
/// Commands never touch stdout, stderr, or `process::exit` directly, so the command
/// layer can be driven from tests and the captured text inspected afterwards.
pub trait Host: Send + Sync {
    /// Summaries and confirmation messages.
    fn output(&mut self) -> impl Write;

    /// Failure reports, prefixed with ❌ by the commands.
    fn error(&mut self) -> impl Write;

    /// End the run with `code`. A non-zero code means the job failed, was cancelled,
    /// or the configuration was rejected.
    fn exit(&mut self, code: i32);
}

/// Captures everything a command writes, plus the exit code it asked for.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn output_text(&self) -> String {
        String::from_utf8_lossy(&self.output_buf).into_owned()
    }

    pub fn error_text(&self) -> String {
        String::from_utf8_lossy(&self.error_buf).into_owned()
    }
}

#[cfg(test)]
impl Host for TestHost {
    fn output(&mut self) -> impl Write {
        &mut self.output_buf
    }

    fn error(&mut self) -> impl Write {
        &mut self.error_buf
    }

    fn exit(&mut self, code: i32) {
        self.exit_code = Some(code);
    }
}
