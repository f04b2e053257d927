//! Environment-based configuration.
//!
//! The launch command and debug flag come from `QEMU_CMD` and `SOS_DEBUG`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use super::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Common environment variables.
pub mod vars {
    /// Launch command template.
    pub const QEMU_CMD: &str = "QEMU_CMD";
    /// Debug mode flag.
    pub const SOS_DEBUG: &str = "SOS_DEBUG";
    /// Default wait timeout override, in milliseconds.
    pub const SOS_TIMEOUT_MS: &str = "SOS_TIMEOUT_MS";
}

/// Environment variable reader.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Prefix for environment variables.
    prefix: String,
    /// Fixed values consulted instead of the process environment.
    snapshot: Option<HashMap<String, String>>,
}

impl EnvConfig {
    /// Create a reader that prepends `prefix_` to every name.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            snapshot: None,
        }
    }

    /// Create a reader over fixed values instead of the process environment.
    #[must_use]
    pub fn from_vars<I, K, V>(vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            prefix: String::new(),
            snapshot: Some(
                vars.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Create without a prefix.
    #[must_use]
    pub fn no_prefix() -> Self {
        Self::default()
    }

    /// Build the full environment variable name.
    fn var_name(&self, name: &str) -> String {
        if self.prefix.is_empty() {
            name.to_uppercase()
        } else {
            format!("{}_{}", self.prefix, name.to_uppercase())
        }
    }

    /// Get a string value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let var_name = self.var_name(name);
        match &self.snapshot {
            Some(vars) => vars.get(&var_name).cloned(),
            None => std::env::var(&var_name).ok(),
        }
    }

    /// Get a parsed value.
    #[must_use]
    pub fn parse<T: std::str::FromStr>(&self, name: &str) -> Option<T> {
        self.get(name).and_then(|v| v.parse().ok())
    }

    /// Get a boolean value.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).map(|v| parse_flag(&v))
    }

    /// Get a boolean with default.
    #[must_use]
    pub fn bool_or(&self, name: &str, default: bool) -> bool {
        self.bool(name).unwrap_or(default)
    }

    /// Get a duration in milliseconds.
    #[must_use]
    pub fn duration_millis(&self, name: &str) -> Option<Duration> {
        self.parse::<u64>(name).map(Duration::from_millis)
    }
}

/// Interpret a flag value.
#[must_use]
pub fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "on" | "enabled"
    )
}

impl HarnessConfig {
    /// Build a configuration from the process environment.
    ///
    /// `QEMU_CMD` is required. `SOS_DEBUG` turns on debug mode and
    /// `SOS_TIMEOUT_MS` overrides the default timeout.
    pub fn from_env(kernel: impl Into<PathBuf>) -> Result<Self> {
        Self::from_env_config(&EnvConfig::no_prefix(), kernel)
    }

    /// Build a configuration from an explicit environment reader.
    pub fn from_env_config(env: &EnvConfig, kernel: impl Into<PathBuf>) -> Result<Self> {
        let launch = env
            .get(vars::QEMU_CMD)
            .filter(|cmd| !cmd.trim().is_empty())
            .ok_or_else(|| {
                HarnessError::config(format!("{} is not set", env.var_name(vars::QEMU_CMD)))
            })?;

        let mut config = Self::new(launch, kernel).debug(env.bool_or(vars::SOS_DEBUG, false));
        if let Some(timeout) = env.duration_millis(vars::SOS_TIMEOUT_MS) {
            config.timeout = timeout;
        }
        Ok(config)
    }
}
