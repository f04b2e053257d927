//! Fault hooks.
//!
//! A fault hook runs when the abort pattern shows up during a wait in debug
//! mode, before the wait fails. It receives the accumulated output and runs
//! on a blocking thread, so it may wait for an operator.

use std::io::{BufRead, Write};
use std::sync::Arc;

/// Hook invoked with the accumulated output when a fault is detected.
pub type FaultHook = Arc<dyn Fn(&str) + Send + Sync>;

/// Wrap a closure as a [`FaultHook`].
pub fn fault_hook<F>(hook: F) -> FaultHook
where
    F: Fn(&str) + Send + Sync + 'static,
{
    Arc::new(hook)
}

/// Hook that keeps the target alive until the operator presses Enter.
///
/// Gives whoever is attached with a debugger a chance to inspect the faulted
/// kernel before the harness kills it.
#[must_use]
pub fn operator_pause() -> FaultHook {
    fault_hook(|_output| {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "\n[sos-harness] fault detected; press Enter when you are");
        let _ = writeln!(stderr, "[sos-harness] done debugging to end the test.");
        let _ = stderr.flush();
        drop(stderr);

        let mut line = String::new();
        let _ = std::io::stdin().lock().read_line(&mut line);
    })
}
