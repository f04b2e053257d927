//! Blocking API tests.

#![cfg(unix)]

use std::time::Duration;

use sos_harness::{HarnessConfig, SessionState, SyncVmSession};

const SHELL_SCRIPT: &str = r#"printf "ush> "; while IFS= read -r line; do printf "%s\nfile1 file2\nush> " "$line"; done"#;

fn script(body: &str) -> HarnessConfig {
    HarnessConfig::new(format!("/bin/sh -c '{body}'"), "kernel.bin")
        .timeout(Duration::from_secs(5))
}

#[test]
fn blocking_session_round_trip() {
    let mut vm = SyncVmSession::new(script(SHELL_SCRIPT)).unwrap();
    vm.start().unwrap();
    assert_eq!(vm.state(), SessionState::Running);
    assert!(vm.is_running());

    vm.wait_ready().unwrap();
    let text = vm.cmd_prompt("ls").unwrap();
    assert!(text.contains("file2"));

    vm.stop().unwrap();
    assert_eq!(vm.state(), SessionState::Stopped);
    assert!(vm.exit_status().is_some());
}

#[test]
fn drain_runs_between_calls() {
    let mut vm = SyncVmSession::new(script("printf early; sleep 1000")).unwrap();
    vm.start().unwrap();

    // Output produced while no call is in progress is queued, not lost.
    std::thread::sleep(Duration::from_millis(200));
    let text = vm.read_until("early", Some(Duration::from_millis(500))).unwrap();
    assert_eq!(text, "early");
    vm.stop().unwrap();
}

#[test]
fn scoped_session() {
    let listing = SyncVmSession::scoped(script(SHELL_SCRIPT), |vm| vm.cmd("ls", "file1", None))
        .unwrap();
    assert!(listing.starts_with("ls"));
}

#[test]
fn scoped_error_still_stops() {
    let err = SyncVmSession::scoped_raw(script("sleep 1000"), |vm| {
        vm.read_until("ush>", Some(Duration::from_millis(100)))
    })
    .unwrap_err();
    assert!(err.is_timeout());
}

#[test]
fn dropping_running_session_does_not_hang() {
    let mut vm = SyncVmSession::new(script("sleep 1000")).unwrap();
    vm.start().unwrap();
    assert!(vm.pid().is_some());
    drop(vm);
}
