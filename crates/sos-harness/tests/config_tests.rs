//! Configuration loading tests.

use std::path::PathBuf;
use std::time::Duration;

use sos_harness::config::env::vars;
use sos_harness::{EnvConfig, HarnessConfig, HarnessError, LineEnding};

// =============================================================================
// Environment
// =============================================================================

#[test]
fn env_requires_launch_command() {
    let env = EnvConfig::from_vars([(vars::SOS_DEBUG, "1")]);
    let err = HarnessConfig::from_env_config(&env, "kernel.bin").unwrap_err();
    assert!(matches!(err, HarnessError::Config { .. }));
    assert!(err.to_string().contains("QEMU_CMD"));
}

#[test]
fn env_blank_launch_command_is_missing() {
    let env = EnvConfig::from_vars([(vars::QEMU_CMD, "   ")]);
    assert!(HarnessConfig::from_env_config(&env, "kernel.bin").is_err());
}

#[test]
fn env_release_mode() {
    let env = EnvConfig::from_vars([(vars::QEMU_CMD, "qemu-system-i386 -nographic")]);
    let config = HarnessConfig::from_env_config(&env, "build/kernel.bin").unwrap();

    assert_eq!(config.launch, "qemu-system-i386 -nographic");
    assert_eq!(config.kernel, PathBuf::from("build/kernel.bin"));
    assert!(!config.debug);
    assert_eq!(config.effective_timeout(), Duration::from_secs(1));
}

#[test]
fn env_debug_mode() {
    let env = EnvConfig::from_vars([
        (vars::QEMU_CMD, "qemu-system-i386 -s -S"),
        (vars::SOS_DEBUG, "yes"),
    ]);
    let config = HarnessConfig::from_env_config(&env, "kernel.bin").unwrap();

    assert!(config.debug);
    assert!(config.echo_output);
    assert_eq!(config.effective_timeout(), Duration::from_secs(120));
}

#[test]
fn env_debug_flag_values() {
    for (value, expected) in [("1", true), ("true", true), ("ON", true), ("0", false), ("", false)] {
        let env = EnvConfig::from_vars([(vars::QEMU_CMD, "qemu"), (vars::SOS_DEBUG, value)]);
        let config = HarnessConfig::from_env_config(&env, "k").unwrap();
        assert_eq!(config.debug, expected, "SOS_DEBUG={value}");
    }
}

#[test]
fn env_timeout_override() {
    let env = EnvConfig::from_vars([(vars::QEMU_CMD, "qemu"), (vars::SOS_TIMEOUT_MS, "2500")]);
    let config = HarnessConfig::from_env_config(&env, "k").unwrap();
    assert_eq!(config.timeout, Duration::from_millis(2500));
}

#[test]
fn env_prefixed_names() {
    let env = EnvConfig::new("CI");
    assert!(env.get("SOS_HARNESS_SURELY_UNSET").is_none());
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn load_file_from_disk() {
    let path = std::env::temp_dir().join(format!("sos-harness-config-{}.toml", std::process::id()));
    std::fs::write(
        &path,
        r#"
launch = "qemu-system-i386 -nographic -serial mon:stdio"
kernel = "build/kernel.bin"
line_ending = "crlf"
abort_pattern = "END OF FAULT REPORT|kernel panic"
read_chunk_size = 512
join_timeout_ms = 250
"#,
    )
    .unwrap();

    let config = HarnessConfig::load(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.launch, "qemu-system-i386 -nographic -serial mon:stdio");
    assert_eq!(config.line_ending, LineEnding::CrLf);
    assert_eq!(config.abort_pattern, "END OF FAULT REPORT|kernel panic");
    assert_eq!(config.read_chunk_size, 512);
    assert_eq!(config.join_timeout, Duration::from_millis(250));
}

#[test]
fn zero_chunk_size_is_rejected() {
    let err = HarnessConfig::from_toml_str("read_chunk_size = 0").unwrap_err();
    assert!(err.to_string().contains("read_chunk_size"));
}

#[test]
fn echo_can_be_disabled_in_debug_mode() {
    let config = HarnessConfig::from_toml_str("debug = true\necho_output = false").unwrap();
    assert!(config.debug);
    assert!(!config.echo_output);
}
