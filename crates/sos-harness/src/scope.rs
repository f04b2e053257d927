//! Scoped session lifecycle.
//!
//! [`with_raw_vm`] and [`with_vm`] start a session, hand it to a closure and
//! stop it afterwards whatever the closure returned. The closure returns a
//! boxed future borrowing the session:
//!
//! ```ignore
//! use futures::FutureExt;
//!
//! let listing = with_vm(config, |vm| {
//!     async move { vm.cmd_prompt("ls").await }.boxed()
//! })
//! .await?;
//! ```

use futures::future::BoxFuture;

use crate::config::HarnessConfig;
use crate::error::Result;
use crate::session::VmSession;

/// Run `f` against a freshly started session, then stop it.
///
/// The session is stopped on every exit path of `f`. If `f` fails its error
/// is returned; otherwise a failure to stop is.
///
/// # Errors
///
/// Returns launch errors, errors from `f`, or errors from stopping.
pub async fn with_raw_vm<T, F>(config: HarnessConfig, f: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut VmSession) -> BoxFuture<'a, Result<T>>,
{
    run_scoped(config, false, f).await
}

/// Like [`with_raw_vm`], but waits for the ready prompt before running `f`.
///
/// # Errors
///
/// As [`with_raw_vm`], plus any error from waiting for the ready prompt.
pub async fn with_vm<T, F>(config: HarnessConfig, f: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut VmSession) -> BoxFuture<'a, Result<T>>,
{
    run_scoped(config, true, f).await
}

async fn run_scoped<T, F>(config: HarnessConfig, wait_ready: bool, f: F) -> Result<T>
where
    F: for<'a> FnOnce(&'a mut VmSession) -> BoxFuture<'a, Result<T>>,
{
    let mut vm = VmSession::new(config)?;
    vm.start().await?;

    let result = if wait_ready {
        match vm.wait_ready().await {
            Ok(_) => f(&mut vm).await,
            Err(e) => Err(e),
        }
    } else {
        f(&mut vm).await
    };
    let stopped = vm.stop().await;

    match (result, stopped) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), stopped) => {
            if let Err(stop_err) = stopped {
                tracing::warn!(error = %stop_err, "failed to stop session after error");
            }
            Err(e)
        }
    }
}
