//! sos-proc: child process plumbing for the SOS test harness
//!
//! This crate launches the process under test (normally QEMU booting a
//! kernel image) with its stdout and stderr merged into a single async byte
//! stream and its stdin available for writing.
//!
//! # Platform Support
//!
//! Unix only. The merged stream is a plain OS pipe created through `rustix`.
//!
//! # Quick Start
//!
//! ```ignore
//! use sos_proc::{LaunchCommand, spawn};
//! use std::path::Path;
//! use tokio::io::AsyncReadExt;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let argv = LaunchCommand::new("qemu-system-i386 -nographic")
//!         .argv(Path::new("kernel.bin"))?;
//!     let mut process = spawn(&argv)?;
//!     let mut output = process.take_output()?;
//!
//!     let mut buf = [0u8; 1024];
//!     let n = output.read(&mut buf).await?;
//!     println!("{}", String::from_utf8_lossy(&buf[..n]));
//!
//!     process.kill().await?;
//!     Ok(())
//! }
//! ```

pub mod command;
pub mod error;

#[cfg(unix)]
pub mod pipe;
#[cfg(unix)]
pub mod process;

pub use command::{KERNEL_FLAG, KERNEL_PLACEHOLDER, LaunchCommand};
pub use error::{ProcError, Result};

#[cfg(unix)]
pub use pipe::{ChildOutput, OutputReader, merged_output};
#[cfg(unix)]
pub use process::{ExitStatus, SpawnedProcess, spawn};
