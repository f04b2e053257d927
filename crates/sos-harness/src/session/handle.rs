//! Session handle for driving the process under test.
//!
//! A [`VmSession`] owns the child process, its stdin, the output queue and
//! the drain task feeding it. Callers interact through [`VmSession::cmd`]
//! and [`VmSession::read_until`].

use std::time::Duration;

use sos_proc::{ExitStatus, LaunchCommand, SpawnedProcess};
use tokio::io::AsyncWriteExt;
use tokio::process::ChildStdin;

use super::builder::SessionBuilder;
use super::hooks::FaultHook;
use super::state::SessionState;
use crate::buffer::TextAccumulator;
use crate::config::HarnessConfig;
use crate::drain::{ChunkReceiver, Drain, DrainOptions, EchoSink, output_queue};
use crate::error::{HarnessError, Result};
use crate::pattern::{IntoPattern, Pattern};
use crate::util::Deadline;

/// Pause before running the fault hook so echoed output reaches the
/// terminal first.
const FAULT_ECHO_SETTLE: Duration = Duration::from_millis(100);

/// Resources that exist only while the session is running.
struct Running {
    process: SpawnedProcess,
    stdin: ChildStdin,
    output: ChunkReceiver,
    drain: Drain,
}

/// A session driving one process under test.
pub struct VmSession {
    config: HarnessConfig,
    state: SessionState,
    abort: Pattern,
    fault_hook: Option<FaultHook>,
    echo: Option<EchoSink>,
    running: Option<Running>,
    exit_status: Option<ExitStatus>,
}

impl VmSession {
    /// Create a session from a configuration.
    ///
    /// Fails if the configured abort pattern is not a valid regex.
    pub fn new(config: HarnessConfig) -> Result<Self> {
        SessionBuilder::new().config(config).build()
    }

    /// Start building a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    pub(super) fn from_parts(
        config: HarnessConfig,
        abort: Pattern,
        fault_hook: Option<FaultHook>,
        echo: Option<EchoSink>,
    ) -> Self {
        Self {
            config,
            state: SessionState::NotStarted,
            abort,
            fault_hook,
            echo,
            running: None,
            exit_status: None,
        }
    }

    /// Get the session configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Get the current session state.
    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Get the timeout applied when a call does not give one.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.config.effective_timeout()
    }

    /// Get the child process ID while running.
    #[must_use]
    pub fn pid(&self) -> Option<u32> {
        self.running.as_ref().map(|r| r.process.pid())
    }

    /// Check whether the child process is still alive.
    pub fn is_running(&mut self) -> bool {
        self.running
            .as_mut()
            .is_some_and(|r| r.process.is_running())
    }

    /// Get the exit status recorded by [`stop`](Self::stop).
    #[must_use]
    pub const fn exit_status(&self) -> Option<ExitStatus> {
        self.exit_status
    }

    /// Launch the process and start draining its output.
    ///
    /// A failed launch leaves the session `Stopped`.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(HarnessError::AlreadyStarted { state: self.state });
        }

        let running = self.launch();
        let running = match running {
            Ok(running) => running,
            Err(e) => {
                self.state = SessionState::Stopped;
                tracing::error!(error = %e, launch = %self.config.launch, "failed to launch process");
                return Err(e);
            }
        };

        if self.config.debug {
            eprintln!(
                "\n[sos-harness] debugging mode active: waits time out after {:?}",
                self.config.debug_timeout
            );
            eprintln!("[sos-harness] attach a debugger to the target from a separate terminal");
        }

        self.running = Some(running);
        self.state = SessionState::Running;
        Ok(())
    }

    fn launch(&mut self) -> Result<Running> {
        let argv = LaunchCommand::new(self.config.launch.as_str()).argv(&self.config.kernel)?;
        let mut process = sos_proc::spawn(&argv)?;
        let stdin = process.take_stdin()?;
        let reader = process.take_output()?;

        let echo = if self.config.echo_output {
            Some(
                self.echo
                    .take()
                    .unwrap_or_else(|| Box::new(std::io::stderr()) as EchoSink),
            )
        } else {
            None
        };

        let (sender, output) = output_queue();
        let drain = Drain::spawn(
            reader,
            sender,
            DrainOptions {
                chunk_size: self.config.read_chunk_size,
                final_read_window: self.config.final_read_window,
                echo,
            },
        );

        tracing::info!(
            pid = process.pid(),
            ?argv,
            timeout = ?self.config.effective_timeout(),
            debug = self.config.debug,
            "started process under test"
        );

        Ok(Running {
            process,
            stdin,
            output,
            drain,
        })
    }

    /// Kill the process and join the drain task.
    ///
    /// No graceful shutdown is attempted. Calling `stop` on a session that is
    /// not running does nothing.
    pub async fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };
        let Running {
            mut process,
            stdin,
            output,
            drain,
        } = running;

        drop(stdin);
        let status = process.kill().await;
        let stats = drain.finish(self.config.join_timeout).await;
        drop(output);
        self.state = SessionState::Stopped;

        let status =
            status.map_err(|e| HarnessError::io("stopping process", std::io::Error::other(e)))?;
        self.exit_status = Some(status);
        tracing::info!(
            pid = process.pid(),
            %status,
            chunks = stats.chunks,
            bytes = stats.bytes,
            "stopped process under test"
        );
        Ok(())
    }

    /// Write `line` followed by the configured line ending and flush it.
    pub async fn send_line(&mut self, line: &str) -> Result<()> {
        let state = self.state;
        let running = self
            .running
            .as_mut()
            .ok_or(HarnessError::NotRunning { state })?;

        let data = format!("{line}{}", self.config.line_ending.as_str());
        running
            .stdin
            .write_all(data.as_bytes())
            .await
            .map_err(|e| HarnessError::io("writing to process", e))?;
        running
            .stdin
            .flush()
            .await
            .map_err(|e| HarnessError::io("flushing process input", e))?;
        tracing::debug!(command = line, "sent command");
        Ok(())
    }

    /// Send a command and wait for `pattern`.
    ///
    /// Returns all output accumulated up to and including the match.
    /// `None` uses the session timeout.
    pub async fn cmd(
        &mut self,
        command: &str,
        pattern: impl IntoPattern,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let pattern = pattern.into_pattern()?;
        self.send_line(command).await?;
        self.read_until(pattern, timeout).await
    }

    /// Send a command and wait for the shell prompt.
    pub async fn cmd_prompt(&mut self, command: &str) -> Result<String> {
        let prompt = Pattern::new(&self.config.prompt)?;
        self.cmd(command, prompt, None).await
    }

    /// Wait until the target reaches its interactive shell.
    pub async fn wait_ready(&mut self) -> Result<String> {
        let ready = Pattern::new(&self.config.ready_prompt)?;
        self.read_until(ready, None).await
    }

    /// Wait until `pattern` appears in the output.
    ///
    /// Output is accumulated from the start of this call; the pattern is
    /// tested against all of it, so matches may span chunks. On a match the
    /// whole accumulated text is returned at once.
    ///
    /// Each cycle checks the pattern before the abort pattern, so output
    /// holding both counts as a match. If only the abort pattern matched,
    /// the wait fails with [`HarnessError::Fault`] without waiting for the
    /// timeout. Otherwise it fails with [`HarnessError::Timeout`] once the
    /// timeout has elapsed, even if the output stream closed earlier. `None`
    /// uses the session timeout.
    pub async fn read_until(
        &mut self,
        pattern: impl IntoPattern,
        timeout: Option<Duration>,
    ) -> Result<String> {
        let pattern = pattern.into_pattern()?;
        let timeout = timeout.unwrap_or_else(|| self.config.effective_timeout());
        let state = self.state;
        let running = self
            .running
            .as_mut()
            .ok_or(HarnessError::NotRunning { state })?;

        let deadline = Deadline::from_now(timeout);
        let mut accumulated = TextAccumulator::new();
        let mut closed = false;

        loop {
            let remaining = deadline.remaining();
            if remaining.is_zero() {
                tracing::warn!(?timeout, pattern = pattern.as_str(), "timed out waiting for output");
                return Err(HarnessError::timeout(
                    timeout,
                    pattern.as_str(),
                    accumulated.into_text(),
                ));
            }

            if closed {
                tokio::time::sleep(remaining).await;
            } else {
                match tokio::time::timeout(remaining, running.output.recv()).await {
                    Ok(Some(chunk)) => accumulated.push(&chunk),
                    Ok(None) => {
                        // Nothing more can arrive; wait out the deadline.
                        tracing::debug!(pattern = pattern.as_str(), "output ended before match");
                        closed = true;
                    }
                    Err(_) => {}
                }
            }

            if pattern.is_match(accumulated.text()) {
                return Ok(accumulated.into_text());
            }

            if self.abort.is_match(accumulated.text()) {
                tracing::warn!(abort = self.abort.as_str(), "fault reported by process under test");
                if self.config.debug {
                    if let Some(hook) = self.fault_hook.clone() {
                        tokio::time::sleep(FAULT_ECHO_SETTLE).await;
                        let output = accumulated.text().to_string();
                        if let Err(e) = tokio::task::spawn_blocking(move || hook(&output)).await {
                            tracing::warn!(error = %e, "fault hook failed");
                        }
                    }
                }
                return Err(HarnessError::fault(
                    self.abort.as_str(),
                    accumulated.into_text(),
                ));
            }
        }
    }
}

impl Drop for VmSession {
    fn drop(&mut self) {
        if let Some(running) = self.running.take() {
            // The child is killed when `SpawnedProcess` drops.
            tracing::warn!(
                pid = running.process.pid(),
                "session dropped while running; killing process"
            );
            running.drain.abort();
        }
    }
}

impl std::fmt::Debug for VmSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmSession")
            .field("state", &self.state)
            .field("pid", &self.pid())
            .field("launch", &self.config.launch)
            .field("kernel", &self.config.kernel)
            .field("debug", &self.config.debug)
            .finish_non_exhaustive()
    }
}
