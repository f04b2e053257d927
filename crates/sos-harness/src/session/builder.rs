//! Session builder for constructing sessions with custom configuration.

use std::path::PathBuf;
use std::time::Duration;

use super::handle::VmSession;
use super::hooks::{FaultHook, fault_hook, operator_pause};
use crate::config::{HarnessConfig, LineEnding};
use crate::drain::EchoSink;
use crate::error::Result;
use crate::pattern::Pattern;

/// Builder for creating [`VmSession`]s.
pub struct SessionBuilder {
    config: HarnessConfig,
    fault_hook: Option<FaultHook>,
    echo: Option<EchoSink>,
}

impl SessionBuilder {
    /// Create a new builder with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: HarnessConfig::default(),
            fault_hook: None,
            echo: None,
        }
    }

    /// Replace the whole configuration.
    #[must_use]
    pub fn config(mut self, config: HarnessConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the launch command template.
    #[must_use]
    pub fn launch(mut self, launch: impl Into<String>) -> Self {
        self.config.launch = launch.into();
        self
    }

    /// Set the kernel image path.
    #[must_use]
    pub fn kernel(mut self, kernel: impl Into<PathBuf>) -> Self {
        self.config.kernel = kernel.into();
        self
    }

    /// Enable or disable debug mode.
    #[must_use]
    pub fn debug(mut self, debug: bool) -> Self {
        self.config = self.config.debug(debug);
        self
    }

    /// Set the default wait timeout.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the line ending appended to commands.
    #[must_use]
    pub fn line_ending(mut self, line_ending: LineEnding) -> Self {
        self.config.line_ending = line_ending;
        self
    }

    /// Set the abort pattern.
    #[must_use]
    pub fn abort_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.config.abort_pattern = pattern.into();
        self
    }

    /// Run `hook` when a fault is detected in debug mode.
    #[must_use]
    pub fn on_fault<F>(mut self, hook: F) -> Self
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.fault_hook = Some(fault_hook(hook));
        self
    }

    /// Echo raw output to `sink` instead of stderr.
    ///
    /// Only takes effect when output echo is enabled.
    #[must_use]
    pub fn echo_to(mut self, sink: impl std::io::Write + Send + 'static) -> Self {
        self.echo = Some(Box::new(sink));
        self
    }

    /// Build the session.
    ///
    /// In debug mode without an explicit hook, faults pause for the operator.
    pub fn build(self) -> Result<VmSession> {
        let abort = Pattern::new(&self.config.abort_pattern)?;
        let fault_hook = match self.fault_hook {
            Some(hook) => Some(hook),
            None if self.config.debug => Some(operator_pause()),
            None => None,
        };
        Ok(VmSession::from_parts(self.config, abort, fault_hook, self.echo))
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("fault_hook", &self.fault_hook.is_some())
            .field("echo", &self.echo.is_some())
            .finish()
    }
}
