//! Telemetry utilities for command timing and tracing spans.

use std::time::Instant;

/// Guard for timing command execution and recording metrics.
///
/// Records command latency when dropped.
pub struct CommandTimer {
    token: String,
    start: Instant,
}

impl CommandTimer {
    /// Start timing a command.
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            start: Instant::now(),
        }
    }
}

impl Drop for CommandTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        crate::metrics::record_command(&self.token, duration);
    }
}

/// Standardized span constructors.
pub mod spans {
    use tracing::{Span, info_span};

    /// Create a span for a server link.
    pub fn peer(name: &str) -> Span {
        info_span!("peer", name = %name)
    }

    /// Create a span for a command execution.
    pub fn command(token: &str, origin: Option<&str>, line: u64) -> Span {
        if let Some(origin) = origin {
            info_span!("command", token = %token, origin = %origin, line)
        } else {
            info_span!("command", token = %token, line)
        }
    }
}
