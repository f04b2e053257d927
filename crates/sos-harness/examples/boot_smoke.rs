//! Boot the kernel and list the root directory.
//!
//! ```text
//! QEMU_CMD="qemu-system-i386 -nographic" cargo run --example boot_smoke -- build/kernel.bin
//! ```
//!
//! Set `SOS_DEBUG=1` to echo console output and pause on faults.

use sos_harness::prelude::*;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let kernel = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "kernel.bin".to_string());
    let config = HarnessConfig::from_env(kernel)?;

    let listing = with_vm(config, |vm| {
        Box::pin(async move {
            let listing = vm.cmd_prompt("ls").await?;
            vm.cmd_prompt("cd bin").await?;
            Ok(listing)
        })
    })
    .await?;

    println!("{listing}");
    Ok(())
}
