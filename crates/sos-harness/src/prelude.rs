//! Convenient re-exports for common sos-harness usage.
//!
//! ```ignore
//! use sos_harness::prelude::*;
//! ```

pub use crate::config::{HarnessConfig, LineEnding};
pub use crate::error::{HarnessError, Result};
pub use crate::pattern::{IntoPattern, Pattern};
pub use crate::scope::{with_raw_vm, with_vm};
pub use crate::session::{SessionBuilder, SessionState, VmSession};
pub use crate::sync::SyncVmSession;
