//! Error types for sos-harness.
//!
//! Every error raised by the wait protocol carries the complete text
//! accumulated during the failed wait, so a failing test can be diagnosed
//! from its error message alone.

use std::time::Duration;

use sos_proc::ProcError;
use thiserror::Error;

use crate::session::SessionState;

/// Format accumulated output for display, framed and never truncated.
///
/// Lines are split on `\n` only, so carriage returns and a trailing newline
/// are kept as the target wrote them.
fn format_buffer(buffer: &str) -> String {
    if buffer.is_empty() {
        return "(no output)".to_string();
    }

    format!(
        "┌─ output ({} bytes, {} lines) ─────────────\n│ {}\n└────────────────────────────────────────",
        buffer.len(),
        buffer.lines().count(),
        buffer.split('\n').collect::<Vec<_>>().join("\n│ ")
    )
}

fn format_timeout_error(duration: Duration, pattern: &str, buffer: &str) -> String {
    format!(
        "timed out after {duration:?} waiting for '{pattern}'\n\n{}",
        format_buffer(buffer)
    )
}

fn format_fault_error(pattern: &str, buffer: &str) -> String {
    format!(
        "fault encountered while waiting (matched '{pattern}')\n\n{}",
        format_buffer(buffer)
    )
}

/// The main error type for harness operations.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// The process under test could not be launched.
    #[error("failed to launch process: {0}")]
    Launch(#[from] ProcError),

    /// No match within the allotted time.
    #[error("{}", format_timeout_error(*duration, pattern, buffer))]
    Timeout {
        /// The timeout that elapsed.
        duration: Duration,
        /// The pattern that was being waited for.
        pattern: String,
        /// Output accumulated during the wait.
        buffer: String,
    },

    /// The abort pattern appeared in the output.
    #[error("{}", format_fault_error(pattern, buffer))]
    Fault {
        /// The abort pattern that matched.
        pattern: String,
        /// Output accumulated during the wait.
        buffer: String,
    },

    /// The operation needs a running session.
    #[error("session is not running (state: {state})")]
    NotRunning {
        /// The session state at the time of the call.
        state: SessionState,
    },

    /// `start` was called on a session that already left `NotStarted`.
    #[error("session cannot be started again (state: {state})")]
    AlreadyStarted {
        /// The session state at the time of the call.
        state: SessionState,
    },

    /// Invalid regex pattern.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// An I/O error occurred with additional context.
    #[error("{context}: {source}")]
    Io {
        /// What operation was being performed.
        context: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

/// Result type alias for harness operations.
pub type Result<T> = std::result::Result<T, HarnessError>;

impl HarnessError {
    /// Create a timeout error.
    pub fn timeout(
        duration: Duration,
        pattern: impl Into<String>,
        buffer: impl Into<String>,
    ) -> Self {
        Self::Timeout {
            duration,
            pattern: pattern.into(),
            buffer: buffer.into(),
        }
    }

    /// Create a fault error.
    pub fn fault(pattern: impl Into<String>, buffer: impl Into<String>) -> Self {
        Self::Fault {
            pattern: pattern.into(),
            buffer: buffer.into(),
        }
    }

    /// Create an I/O error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Check if this is a timeout error.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if this is a fault error.
    #[must_use]
    pub const fn is_fault(&self) -> bool {
        matches!(self, Self::Fault { .. })
    }

    /// Get the accumulated output if this error carries it.
    #[must_use]
    pub fn buffer(&self) -> Option<&str> {
        match self {
            Self::Timeout { buffer, .. } | Self::Fault { buffer, .. } => Some(buffer),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_display_has_pattern_and_output() {
        let err = HarnessError::timeout(Duration::from_secs(1), "ush>", "booting\nSOS\n");
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("ush>"));
        assert!(msg.contains("booting"));
        assert!(msg.contains("SOS"));
    }

    #[test]
    fn long_output_is_not_truncated() {
        let buffer: String = (0..200).fold(String::new(), |mut acc, i| {
            use std::fmt::Write;
            let _ = writeln!(acc, "line {i}");
            acc
        });
        let msg = HarnessError::fault("END OF FAULT REPORT", &buffer).to_string();
        assert!(msg.contains("line 0\n"));
        assert!(msg.contains("line 199"));
        assert!(msg.contains("200 lines"));
    }

    #[test]
    fn carriage_returns_survive_display() {
        let msg = HarnessError::timeout(Duration::from_secs(1), "ush>", "a\r\nb\r\n").to_string();
        assert!(msg.contains("│ a\r\n│ b\r\n│ \n"));
    }

    #[test]
    fn empty_output() {
        let msg = HarnessError::timeout(Duration::from_secs(1), "ush>", "").to_string();
        assert!(msg.contains("(no output)"));
    }

    #[test]
    fn predicates_and_buffer() {
        let fault = HarnessError::fault("END", "trace");
        assert!(fault.is_fault());
        assert!(!fault.is_timeout());
        assert_eq!(fault.buffer(), Some("trace"));

        let cfg = HarnessError::config("QEMU_CMD is not set");
        assert!(cfg.buffer().is_none());
        assert!(cfg.to_string().contains("QEMU_CMD"));
    }

    #[test]
    fn launch_error_wraps_proc_error() {
        let err: HarnessError = ProcError::NotFound {
            program: "qemu-system-i386".into(),
        }
        .into();
        assert!(err.to_string().contains("qemu-system-i386"));
    }
}
