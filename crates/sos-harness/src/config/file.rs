//! File-based configuration loading.
//!
//! ```toml
//! launch = "qemu-system-i386 -nographic -serial mon:stdio"
//! kernel = "build/kernel.bin"
//! debug = false
//! timeout_ms = 1000
//! line_ending = "crlf"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use super::{HarnessConfig, LineEnding};
use crate::error::{HarnessError, Result};

/// Raw contents of a configuration file. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Launch command template.
    pub launch: Option<String>,
    /// Kernel image path.
    pub kernel: Option<PathBuf>,
    /// Debug mode.
    pub debug: Option<bool>,
    /// Default timeout in milliseconds.
    pub timeout_ms: Option<u64>,
    /// Debug-mode timeout in milliseconds.
    pub debug_timeout_ms: Option<u64>,
    /// `lf`, `crlf` or `cr`.
    pub line_ending: Option<String>,
    /// Command prompt pattern.
    pub prompt: Option<String>,
    /// Ready prompt pattern.
    pub ready_prompt: Option<String>,
    /// Abort pattern.
    pub abort_pattern: Option<String>,
    /// Pipe read size.
    pub read_chunk_size: Option<usize>,
    /// Post-exit read window in milliseconds.
    pub final_read_window_ms: Option<u64>,
    /// Drain join bound in milliseconds.
    pub join_timeout_ms: Option<u64>,
    /// Output echo, independent of debug mode.
    pub echo_output: Option<bool>,
}

fn parse_line_ending(value: &str) -> Result<LineEnding> {
    match value.to_lowercase().as_str() {
        "lf" | "unix" => Ok(LineEnding::Lf),
        "crlf" | "windows" | "serial" => Ok(LineEnding::CrLf),
        "cr" => Ok(LineEnding::Cr),
        other => Err(HarnessError::config(format!("unknown line ending '{other}'"))),
    }
}

impl FileConfig {
    /// Apply the keys present in the file on top of `base`.
    pub fn apply(self, mut base: HarnessConfig) -> Result<HarnessConfig> {
        if let Some(launch) = self.launch {
            base.launch = launch;
        }
        if let Some(kernel) = self.kernel {
            base.kernel = kernel;
        }
        if let Some(debug) = self.debug {
            base = base.debug(debug);
        }
        if let Some(ms) = self.timeout_ms {
            base.timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = self.debug_timeout_ms {
            base.debug_timeout = Duration::from_millis(ms);
        }
        if let Some(ending) = self.line_ending {
            base.line_ending = parse_line_ending(&ending)?;
        }
        if let Some(prompt) = self.prompt {
            base.prompt = prompt;
        }
        if let Some(prompt) = self.ready_prompt {
            base.ready_prompt = prompt;
        }
        if let Some(pattern) = self.abort_pattern {
            base.abort_pattern = pattern;
        }
        if let Some(size) = self.read_chunk_size {
            if size == 0 {
                return Err(HarnessError::config("read_chunk_size must be positive"));
            }
            base.read_chunk_size = size;
        }
        if let Some(ms) = self.final_read_window_ms {
            base.final_read_window = Duration::from_millis(ms);
        }
        if let Some(ms) = self.join_timeout_ms {
            base.join_timeout = Duration::from_millis(ms);
        }
        if let Some(echo) = self.echo_output {
            base.echo_output = echo;
        }
        Ok(base)
    }
}

impl HarnessConfig {
    /// Parse a TOML document into a configuration.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: FileConfig = toml::from_str(content)
            .map_err(|e| HarnessError::config(format!("invalid config file: {e}")))?;
        file.apply(Self::default())
    }

    /// Load a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::io(format!("reading {}", path.display()), e))?;
        Self::from_toml_str(&content)
    }
}
