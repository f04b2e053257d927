//! Error types for the sos-proc crate.
//!
//! This module provides a unified error type [`ProcError`] covering launch
//! command resolution, spawning and managing the child process.

use std::io;

/// The error type for process operations.
#[derive(Debug, thiserror::Error)]
pub enum ProcError {
    /// The launch command template contained no program.
    #[error("launch command is empty")]
    EmptyCommand,

    /// The launch command template could not be tokenized.
    #[error("invalid launch command '{template}': unbalanced quotes or trailing escape")]
    InvalidTemplate {
        /// The offending template.
        template: String,
    },

    /// The program to execute was not found.
    #[error("program not found: {program}")]
    NotFound {
        /// The program that was not found.
        program: String,
    },

    /// The program exists but could not be executed.
    #[error("permission denied executing {program}")]
    PermissionDenied {
        /// The program that could not be executed.
        program: String,
    },

    /// Failed to spawn the child process for another reason.
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        /// The program that failed to spawn.
        program: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Failed to create the output pipe.
    #[error("failed to create output pipe: {0}")]
    Pipe(#[source] io::Error),

    /// A standard stream was already taken from the process.
    #[error("{0} has already been taken")]
    StreamTaken(&'static str),

    /// Failed to deliver the kill signal.
    #[error("failed to kill child process: {0}")]
    Kill(#[source] io::Error),

    /// Failed to wait for the child process.
    #[error("failed to wait for child: {0}")]
    Wait(#[source] io::Error),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProcError {
    /// Classify an I/O error returned while spawning `program`.
    #[must_use]
    pub fn from_spawn(program: impl Into<String>, source: io::Error) -> Self {
        let program = program.into();
        match source.kind() {
            io::ErrorKind::NotFound => Self::NotFound { program },
            io::ErrorKind::PermissionDenied => Self::PermissionDenied { program },
            _ => Self::Spawn { program, source },
        }
    }
}

/// A specialized Result type for process operations.
pub type Result<T> = std::result::Result<T, ProcError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawn_errors_are_classified() {
        let err = ProcError::from_spawn("qemu", io::Error::from(io::ErrorKind::NotFound));
        assert!(matches!(err, ProcError::NotFound { ref program } if program == "qemu"));

        let err = ProcError::from_spawn("qemu", io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(matches!(err, ProcError::PermissionDenied { .. }));

        let err = ProcError::from_spawn("qemu", io::Error::other("boom"));
        assert!(err.to_string().contains("boom"));
        assert!(err.to_string().contains("qemu"));
    }
}
