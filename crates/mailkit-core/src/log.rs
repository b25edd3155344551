//! Caller-supplied diagnostic sink.

use std::fmt;

/// Receives one diagnostic line at a time.
///
/// The session calls it synchronously on the calling thread, and only when
/// [`Settings::log`](crate::Settings::log) is set. Every diagnostic is also
/// emitted as a `tracing` event regardless of this sink.
pub struct Logger(Box<dyn Fn(&str) + Send>);

impl Logger {
    /// Wraps a closure.
    pub fn new(sink: impl Fn(&str) + Send + 'static) -> Self {
        Self(Box::new(sink))
    }

    /// Forwards lines to `tracing::info!`.
    #[must_use]
    pub fn tracing() -> Self {
        Self::new(|line| tracing::info!(target: "mailkit", "{line}"))
    }

    /// Drops every line.
    #[must_use]
    pub fn silent() -> Self {
        Self::new(|_| {})
    }

    /// Sends `line` to the sink.
    pub fn log(&self, line: &str) {
        (self.0)(line);
    }
}

impl Default for Logger {
    fn default() -> Self {
        Self::tracing()
    }
}

impl<F> From<F> for Logger
where
    F: Fn(&str) + Send + 'static,
{
    fn from(sink: F) -> Self {
        Self::new(sink)
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Logger")
    }
}
