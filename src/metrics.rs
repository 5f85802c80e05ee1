use std::borrow::Cow;
use std::time::Instant;

use crate::helpers::tracing::format_elapsed;
use crate::prelude::*;

/// Stopwatch to log a code block execution time.
pub struct Stopwatch {
    /// Logged message.
    message: Cow<'static, str>,

    start: Instant,

    /// Optional execution time threshold.
    /// If exceeded, raises the logging level to warning.
    threshold: Option<StdDuration>,
}

impl Stopwatch {
    pub fn new<M: Into<Cow<'static, str>>>(message: M) -> Self {
        Self {
            message: message.into(),
            start: Instant::now(),
            threshold: None,
        }
    }

    #[must_use]
    pub fn threshold(mut self, threshold: StdDuration) -> Self {
        self.threshold = Some(threshold);
        self
    }

    fn is_slow(&self) -> bool {
        matches!(self.threshold, Some(threshold) if self.start.elapsed() >= threshold)
    }
}

impl Drop for Stopwatch {
    fn drop(&mut self) {
        let elapsed = format_elapsed(self.start);
        if self.is_slow() {
            warn!(elapsed = elapsed.as_str(), "{} (slow)", self.message);
        } else {
            debug!(elapsed = elapsed.as_str(), "{}", self.message);
        }
    }
}
