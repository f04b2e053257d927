//! Blocking wrapper for the async session.
//!
//! [`SyncVmSession`] owns a small Tokio runtime. The runtime has a worker
//! thread so the output drain keeps reading between calls.

use std::time::Duration;

use sos_proc::ExitStatus;
use tokio::runtime::{Builder, Runtime};

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};
use crate::pattern::IntoPattern;
use crate::session::{SessionState, VmSession};

/// A blocking session wrapper.
pub struct SyncVmSession {
    /// The inner async session. Dropped before the runtime.
    inner: VmSession,
    /// The tokio runtime.
    runtime: Runtime,
}

impl SyncVmSession {
    /// Create a session from a configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created or the abort
    /// pattern is invalid.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        Self::from_session(VmSession::new(config)?)
    }

    /// Wrap an existing, not yet started session.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot be created.
    pub fn from_session(inner: VmSession) -> Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("sos-harness")
            .enable_all()
            .build()
            .map_err(|e| HarnessError::io("creating tokio runtime", e))?;
        Ok(Self { inner, runtime })
    }

    /// Create a session, start it, wait for the ready prompt and run `f`.
    ///
    /// The session is stopped on every exit path of `f`.
    ///
    /// # Errors
    ///
    /// Returns launch errors, errors from waiting for the ready prompt,
    /// errors from `f`, or errors from stopping.
    pub fn scoped<T, F>(config: HarnessConfig, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        Self::run_scoped(config, true, f)
    }

    /// Like [`scoped`](Self::scoped), without waiting for the ready prompt.
    ///
    /// # Errors
    ///
    /// Returns launch errors, errors from `f`, or errors from stopping.
    pub fn scoped_raw<T, F>(config: HarnessConfig, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        Self::run_scoped(config, false, f)
    }

    fn run_scoped<T, F>(config: HarnessConfig, wait_ready: bool, f: F) -> Result<T>
    where
        F: FnOnce(&mut Self) -> Result<T>,
    {
        let mut vm = Self::new(config)?;
        vm.start()?;

        let result = if wait_ready {
            vm.wait_ready().and_then(|_| f(&mut vm))
        } else {
            f(&mut vm)
        };
        let stopped = vm.stop();

        match result {
            Ok(value) => stopped.map(|()| value),
            Err(e) => {
                if let Err(stop_err) = stopped {
                    tracing::warn!(error = %stop_err, "failed to stop session after error");
                }
                Err(e)
            }
        }
    }

    /// Get the session configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        self.inner.config()
    }

    /// Get the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.inner.state()
    }

    /// Get the timeout applied when a call does not give one.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.inner.timeout()
    }

    /// Get the child process ID while running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.inner.pid()
    }

    /// Get the exit status recorded by [`stop`](Self::stop).
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.inner.exit_status()
    }

    /// Check whether the child process is still alive.
    pub fn is_running(&mut self) -> bool {
        let _guard = self.runtime.enter();
        self.inner.is_running()
    }

    /// Launch the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the session was already started or the launch
    /// fails.
    pub fn start(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.start())
    }

    /// Kill the process and join the drain.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be killed or reaped.
    pub fn stop(&mut self) -> Result<()> {
        self.runtime.block_on(self.inner.stop())
    }

    /// Send a line to the process.
    ///
    /// # Errors
    ///
    /// Returns an error if the session is not running or the write fails.
    pub fn send_line(&mut self, line: &str) -> Result<()> {
        self.runtime.block_on(self.inner.send_line(line))
    }

    /// Wait until `pattern` appears in the output.
    ///
    /// # Errors
    ///
    /// Returns timeout and fault errors as [`VmSession::read_until`] does.
    pub fn read_until(
        &mut self,
        pattern: impl IntoPattern,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.runtime.block_on(self.inner.read_until(pattern, timeout))
    }

    /// Send a command and wait for `pattern`.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the wait fails.
    pub fn cmd(
        &mut self,
        command: &str,
        pattern: impl IntoPattern,
        timeout: Option<Duration>,
    ) -> Result<String> {
        self.runtime
            .block_on(self.inner.cmd(command, pattern, timeout))
    }

    /// Send a command and wait for the shell prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if sending fails or the wait fails.
    pub fn cmd_prompt(&mut self, command: &str) -> Result<String> {
        self.runtime.block_on(self.inner.cmd_prompt(command))
    }

    /// Wait for the ready prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the wait fails.
    pub fn wait_ready(&mut self) -> Result<String> {
        self.runtime.block_on(self.inner.wait_ready())
    }
}

impl std::fmt::Debug for SyncVmSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncVmSession")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}
