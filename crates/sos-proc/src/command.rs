//! Launch command resolution.
//!
//! A launch command is a caller-supplied template such as
//! `qemu-system-i386 -nographic -serial mon:stdio`. It is tokenized with
//! POSIX shell-word rules and completed with the kernel image path.

use std::path::Path;

use crate::error::{ProcError, Result};

/// Placeholder replaced by the kernel image path.
pub const KERNEL_PLACEHOLDER: &str = "{kernel}";

/// Flag appended before the kernel path when the template has no placeholder.
pub const KERNEL_FLAG: &str = "-kernel";

/// A launch command template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchCommand {
    template: String,
}

impl LaunchCommand {
    /// Create a launch command from a template string.
    #[must_use]
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Get the raw template.
    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Resolve the template into an argument vector for `kernel`.
    ///
    /// Every token containing [`KERNEL_PLACEHOLDER`] has it replaced by the
    /// kernel path. If no token does, `-kernel <path>` is appended.
    pub fn argv(&self, kernel: &Path) -> Result<Vec<String>> {
        let mut tokens = shlex::split(&self.template).ok_or_else(|| ProcError::InvalidTemplate {
            template: self.template.clone(),
        })?;
        if tokens.is_empty() {
            return Err(ProcError::EmptyCommand);
        }

        let kernel = kernel.to_string_lossy();
        let mut substituted = false;
        for token in &mut tokens {
            if token.contains(KERNEL_PLACEHOLDER) {
                *token = token.replace(KERNEL_PLACEHOLDER, &kernel);
                substituted = true;
            }
        }
        if !substituted {
            tokens.push(KERNEL_FLAG.to_string());
            tokens.push(kernel.into_owned());
        }
        Ok(tokens)
    }
}

impl From<&str> for LaunchCommand {
    fn from(template: &str) -> Self {
        Self::new(template)
    }
}

impl From<String> for LaunchCommand {
    fn from(template: String) -> Self {
        Self::new(template)
    }
}
