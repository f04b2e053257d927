//! Session management.
//!
//! A session launches the process under test, drains its output in the
//! background and implements the command/response protocol on top.

mod builder;
mod handle;
mod hooks;
mod state;

pub use builder::SessionBuilder;
pub use handle::VmSession;
pub use hooks::{FaultHook, fault_hook, operator_pause};
pub use state::SessionState;
