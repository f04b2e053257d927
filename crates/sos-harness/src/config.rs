//! Configuration types for sos-harness.
//!
//! [`HarnessConfig`] holds every parameter the engine needs as an explicit
//! value. Loading from the environment ([`env`]) or a TOML file ([`file`])
//! happens outside the core and produces one of these.

pub mod env;
pub mod file;

use std::path::PathBuf;
use std::time::Duration;

use crate::pattern::{DEFAULT_PROMPT, FAULT_REPORT_MARKER, READY_PROMPT};

/// Default wait timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(1);

/// Wait timeout used in debug mode, where an operator may be stepping
/// through the kernel in a debugger.
pub const DEFAULT_DEBUG_TIMEOUT: Duration = Duration::from_secs(120);

/// Default size of a single read from the output pipe.
pub const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

/// How long the drain keeps reading after the process has exited.
pub const DEFAULT_FINAL_READ_WINDOW: Duration = Duration::from_millis(50);

/// Upper bound on joining the drain task during `stop`.
pub const DEFAULT_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Line ending appended to every command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LineEnding {
    /// Unix-style line ending (LF).
    Lf,
    /// Serial console line ending (CRLF).
    #[default]
    CrLf,
    /// Carriage return only (CR).
    Cr,
}

impl LineEnding {
    /// Get the line ending as a string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lf => "\n",
            Self::CrLf => "\r\n",
            Self::Cr => "\r",
        }
    }
}

/// Configuration for a harness session.
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Launch command template (see [`sos_proc::LaunchCommand`]).
    pub launch: String,

    /// Kernel image handed to the launch command.
    pub kernel: PathBuf,

    /// Debug mode: long timeouts, output echo and the fault pause.
    pub debug: bool,

    /// Default wait timeout.
    pub timeout: Duration,

    /// Default wait timeout in debug mode.
    pub debug_timeout: Duration,

    /// Line ending appended to commands.
    pub line_ending: LineEnding,

    /// Pattern `cmd_prompt` waits for after each command.
    pub prompt: String,

    /// Pattern `wait_ready` waits for after boot.
    pub ready_prompt: String,

    /// Pattern signalling a fatal condition in the target.
    pub abort_pattern: String,

    /// Maximum bytes per pipe read.
    pub read_chunk_size: usize,

    /// Read window after process exit.
    pub final_read_window: Duration,

    /// Upper bound on joining the drain task.
    pub join_timeout: Duration,

    /// Echo raw output to the diagnostic stream.
    pub echo_output: bool,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            launch: String::new(),
            kernel: PathBuf::from("kernel.bin"),
            debug: false,
            timeout: DEFAULT_TIMEOUT,
            debug_timeout: DEFAULT_DEBUG_TIMEOUT,
            line_ending: LineEnding::default(),
            prompt: DEFAULT_PROMPT.to_string(),
            ready_prompt: READY_PROMPT.to_string(),
            abort_pattern: FAULT_REPORT_MARKER.to_string(),
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
            final_read_window: DEFAULT_FINAL_READ_WINDOW,
            join_timeout: DEFAULT_JOIN_TIMEOUT,
            echo_output: false,
        }
    }
}

impl HarnessConfig {
    /// Create a configuration for the given launch command and kernel image.
    #[must_use]
    pub fn new(launch: impl Into<String>, kernel: impl Into<PathBuf>) -> Self {
        Self {
            launch: launch.into(),
            kernel: kernel.into(),
            ..Default::default()
        }
    }

    /// Enable or disable debug mode. Output echo follows the debug flag.
    #[must_use]
    pub const fn debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self.echo_output = debug;
        self
    }

    /// Set the default wait timeout.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the wait timeout used in debug mode.
    #[must_use]
    pub const fn debug_timeout(mut self, timeout: Duration) -> Self {
        self.debug_timeout = timeout;
        self
    }

    /// Set the line ending style.
    #[must_use]
    pub const fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.line_ending = line_ending;
        self
    }

    /// Set the command prompt pattern.
    #[must_use]
    pub fn prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Set the ready prompt pattern.
    #[must_use]
    pub fn ready_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.ready_prompt = prompt.into();
        self
    }

    /// Set the abort pattern.
    #[must_use]
    pub fn abort_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.abort_pattern = pattern.into();
        self
    }

    /// Set the pipe read size.
    #[must_use]
    pub const fn read_chunk_size(mut self, size: usize) -> Self {
        self.read_chunk_size = size;
        self
    }

    /// Set the post-exit read window.
    #[must_use]
    pub const fn final_read_window(mut self, window: Duration) -> Self {
        self.final_read_window = window;
        self
    }

    /// Set the drain join bound.
    #[must_use]
    pub const fn join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    /// Enable or disable output echo independently of debug mode.
    #[must_use]
    pub const fn echo_output(mut self, echo: bool) -> Self {
        self.echo_output = echo;
        self
    }

    /// The timeout applied when a call does not give one.
    #[must_use]
    pub const fn effective_timeout(&self) -> Duration {
        if self.debug {
            self.debug_timeout
        } else {
            self.timeout
        }
    }
}
