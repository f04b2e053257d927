//! sos-harness: drive a VM-booted kernel through its console
//!
//! This crate launches the kernel under test (normally through QEMU), drains
//! its console output in the background and synchronizes test steps on
//! patterns that appear in that output.
//!
//! # Features
//!
//! - **Async-first design** with the Tokio runtime
//! - **Merged output stream**: stdout and stderr share one pipe via `sos-proc`
//! - **Pattern waits** with a per-call timeout and matches spanning chunks
//! - **Fault detection**: waits fail fast on `END OF FAULT REPORT`
//! - **Debug mode** with long timeouts, output echo and an operator pause
//!
//! Unix only, like `sos-proc`.
//!
//! # Example
//!
//! ```ignore
//! use sos_harness::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = HarnessConfig::from_env("build/kernel.bin")?;
//!     let mut vm = VmSession::new(config)?;
//!     vm.start().await?;
//!     vm.wait_ready().await?;
//!     let listing = vm.cmd_prompt("ls").await?;
//!     assert!(listing.contains("bin"));
//!     vm.stop().await
//! }
//! ```

pub mod buffer;
pub mod config;
pub mod drain;
pub mod error;
pub mod pattern;
pub mod prelude;
pub mod scope;
pub mod session;
pub mod sync;
pub mod util;

pub use buffer::TextAccumulator;
pub use config::env::EnvConfig;
pub use config::file::FileConfig;
pub use config::{HarnessConfig, LineEnding};
pub use drain::{Drain, DrainEnd, DrainOptions, DrainStats};
pub use error::{HarnessError, Result};
pub use pattern::{DEFAULT_PROMPT, FAULT_REPORT_MARKER, IntoPattern, Pattern, READY_PROMPT};
pub use session::{
    FaultHook, SessionBuilder, SessionState, VmSession, fault_hook, operator_pause,
};
pub use util::Deadline;

pub use scope::{with_raw_vm, with_vm};
pub use sync::SyncVmSession;

pub use sos_proc::{ExitStatus, LaunchCommand, ProcError};
