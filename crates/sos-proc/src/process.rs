//! Child process spawning and management.
//!
//! The child gets a piped stdin and the write end of a [merged output
//! pipe](crate::pipe::merged_output) as both stdout and stderr.

use std::process::{ExitStatus as StdExitStatus, Stdio};

use tokio::process::{Child, ChildStdin, Command};

use crate::error::{ProcError, Result};
use crate::pipe::{OutputReader, merged_output};

/// Exit status of a child process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    /// The process exited normally with the given exit code.
    Exited(i32),

    /// The process was terminated by a signal.
    Signaled(i32),
}

impl ExitStatus {
    /// Check if the process exited successfully (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        matches!(self, Self::Exited(0))
    }

    /// Get the exit code, if available.
    #[must_use]
    pub const fn code(&self) -> Option<i32> {
        match self {
            Self::Exited(code) => Some(*code),
            Self::Signaled(_) => None,
        }
    }

    /// Get the signal number that terminated the process.
    #[must_use]
    pub const fn signal(&self) -> Option<i32> {
        match self {
            Self::Signaled(sig) => Some(*sig),
            Self::Exited(_) => None,
        }
    }
}

impl std::fmt::Display for ExitStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exited(code) => write!(f, "exited with code {code}"),
            Self::Signaled(sig) => write!(f, "terminated by signal {sig}"),
        }
    }
}

impl From<StdExitStatus> for ExitStatus {
    fn from(status: StdExitStatus) -> Self {
        use std::os::unix::process::ExitStatusExt;
        if let Some(code) = status.code() {
            Self::Exited(code)
        } else if let Some(signal) = status.signal() {
            Self::Signaled(signal)
        } else {
            Self::Exited(-1)
        }
    }
}

/// A spawned child process with its standard streams.
#[derive(Debug)]
pub struct SpawnedProcess {
    child: Child,
    pid: u32,
    program: String,
    stdin: Option<ChildStdin>,
    output: Option<OutputReader>,
    exit_status: Option<ExitStatus>,
}

/// Spawn `argv[0]` with the remaining elements as arguments.
///
/// The child is killed if the returned handle is dropped while it is still
/// running.
///
/// Must be called from within a Tokio runtime.
pub fn spawn(argv: &[String]) -> Result<SpawnedProcess> {
    let (program, args) = argv.split_first().ok_or(ProcError::EmptyCommand)?;
    let (output, child_output) = merged_output().map_err(ProcError::Pipe)?;

    // The command owns the pipe's write ends; it is dropped at the end of this
    // function so only the child keeps them open.
    let mut command = Command::new(program);
    command
        .args(args)
        .stdin(Stdio::piped())
        .stdout(child_output.stdout)
        .stderr(child_output.stderr)
        .kill_on_drop(true);

    let mut child = command
        .spawn()
        .map_err(|e| ProcError::from_spawn(program.as_str(), e))?;
    drop(command);

    let pid = child.id().unwrap_or_default();
    let stdin = child.stdin.take();
    tracing::debug!(pid, program = %program, "spawned child process");

    Ok(SpawnedProcess {
        child,
        pid,
        program: program.clone(),
        stdin,
        output: Some(output),
        exit_status: None,
    })
}

impl SpawnedProcess {
    /// Get the process ID.
    #[must_use]
    pub const fn pid(&self) -> u32 {
        self.pid
    }

    /// Get the program that was executed.
    #[must_use]
    pub fn program(&self) -> &str {
        &self.program
    }

    /// Take the child's stdin.
    pub fn take_stdin(&mut self) -> Result<ChildStdin> {
        self.stdin.take().ok_or(ProcError::StreamTaken("stdin"))
    }

    /// Take the read end of the merged stdout/stderr pipe.
    pub fn take_output(&mut self) -> Result<OutputReader> {
        self.output.take().ok_or(ProcError::StreamTaken("output"))
    }

    /// Get the exit status if the child has been reaped.
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Check for exit without blocking.
    pub fn try_wait(&mut self) -> Result<Option<ExitStatus>> {
        if self.exit_status.is_some() {
            return Ok(self.exit_status);
        }
        let status = self.child.try_wait().map_err(ProcError::Wait)?;
        self.exit_status = status.map(ExitStatus::from);
        Ok(self.exit_status)
    }

    /// Check if the child is still running.
    pub fn is_running(&mut self) -> bool {
        matches!(self.try_wait(), Ok(None))
    }

    /// Wait for the child to exit.
    pub async fn wait(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.exit_status {
            return Ok(status);
        }
        let status = ExitStatus::from(self.child.wait().await.map_err(ProcError::Wait)?);
        self.exit_status = Some(status);
        Ok(status)
    }

    /// Send SIGKILL and reap the child.
    ///
    /// Killing a child that has already exited is not an error.
    pub async fn kill(&mut self) -> Result<ExitStatus> {
        if let Some(status) = self.try_wait()? {
            return Ok(status);
        }
        if let Err(e) = self.child.start_kill() {
            // Lost the race with a natural exit.
            if e.kind() != std::io::ErrorKind::InvalidInput {
                return Err(ProcError::Kill(e));
            }
        }
        self.wait().await
    }
}
