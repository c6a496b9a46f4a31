use std::io::Write;

/// The process surface a command talks to: the rating stream, the diagnostic stream, and
/// the exit status.
///
/// The binary wires this to stdout, stderr and `process::exit`; tests capture all three.
pub trait Host: Send + Sync {
    /// Machine-readable results, one NDJSON rating per line for `rate`.
    fn output(&mut self) -> impl Write;

    /// Human-readable messages, including one line per entry that could not be rated.
    fn error(&mut self) -> impl Write;

    /// Finish with a non-zero status once the command has written everything it has.
    fn exit(&mut self, code: i32);
}

/// Records everything a command writes, and the status it asked to exit with.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct TestHost {
    pub output_buf: Vec<u8>,
    pub error_buf: Vec<u8>,
    pub exit_code: Option<i32>,
}

#[cfg(test)]
impl TestHost {
    pub fn new() -> Self {
        Self::default()
    }

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
