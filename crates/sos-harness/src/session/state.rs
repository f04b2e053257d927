//! Session lifecycle state.

use std::fmt;

/// Lifecycle state of a [`VmSession`](super::VmSession).
///
/// `NotStarted → Running → Stopped`. There is no way back to `Running`;
/// a new session must be created instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionState {
    /// Created but not started.
    #[default]
    NotStarted,

    /// The process is running and its output is being drained.
    Running,

    /// The process has been killed and the drain joined, or launch failed.
    Stopped,
}

impl SessionState {
    /// Check if the session accepts commands and waits.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Stopped => "stopped",
        };
        f.write_str(s)
    }
}
