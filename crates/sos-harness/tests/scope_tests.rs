//! Scoped lifecycle tests.

#![cfg(unix)]

use std::time::Duration;

use futures::FutureExt;
use sos_harness::{HarnessConfig, HarnessError, with_raw_vm, with_vm};

const SHELL_SCRIPT: &str = r#"sleep 0.1; printf "SOS\nush> "; while IFS= read -r line; do printf "%s\nfile1 file2\nush> " "$line"; done"#;

fn script(body: &str) -> HarnessConfig {
    HarnessConfig::new(format!("/bin/sh -c '{body}'"), "kernel.bin")
        .timeout(Duration::from_secs(5))
}

#[tokio::test]
async fn with_vm_waits_for_ready_prompt() {
    let listing = with_vm(script(SHELL_SCRIPT), |vm| {
        async move { vm.cmd_prompt("ls").await }.boxed()
    })
    .await
    .unwrap();

    assert!(listing.starts_with("ls"));
    assert!(listing.contains("file1 file2"));
}

#[tokio::test]
async fn with_raw_vm_sees_boot_output() {
    let boot = with_raw_vm(script(SHELL_SCRIPT), |vm| {
        async move { vm.read_until("ush>", None).await }.boxed()
    })
    .await
    .unwrap();

    assert!(boot.contains("SOS"));
}

#[tokio::test]
async fn closure_error_is_returned() {
    let err = with_raw_vm(script("sleep 1000"), |vm| {
        async move {
            vm.read_until("ush>", Some(Duration::from_millis(100)))
                .await
        }
        .boxed()
    })
    .await
    .unwrap_err();

    assert!(err.is_timeout());
}

#[tokio::test]
async fn ready_failure_skips_closure() {
    let mut ran = false;
    let config = script("printf gone").timeout(Duration::from_millis(300));
    let err = with_vm(config, |_vm| {
        ran = true;
        async { Ok::<_, HarnessError>(()) }.boxed()
    })
    .await
    .unwrap_err();

    assert!(err.is_timeout());
    assert!(!ran);
}

#[tokio::test]
async fn launch_failure() {
    let config = HarnessConfig::new("/nonexistent/qemu", "kernel.bin");
    let err = with_vm(config, |_vm| async { Ok::<_, HarnessError>(()) }.boxed())
        .await
        .unwrap_err();
    assert!(matches!(err, HarnessError::Launch(_)));
}
