//! End-to-end tests driving the selflock binary in a child process, so
//! the applied sandbox never touches the test runner.
//!
//! Kernel-dependent tests return early when Landlock is absent.

use std::path::Path;
use std::process::{Command, Output};

fn selflock_bin() -> &'static str {
    env!("CARGO_BIN_EXE_selflock")
}

fn landlock_available() -> bool {
    selflock::kernel_abi().is_ok()
}

/// System paths a dynamically linked binary needs; filtered to what
/// exists on this host so staging never fails on layout differences.
fn system_paths() -> Vec<&'static str> {
    ["/usr", "/bin", "/lib", "/lib64", "/etc"]
        .into_iter()
        .filter(|p| Path::new(p).exists())
        .collect()
}

fn run_sandboxed(extra: &[&str], command: &[&str]) -> Output {
    let mut cmd = Command::new(selflock_bin());
    cmd.arg("--allow-read");
    cmd.args(system_paths());
    cmd.arg("--allow-execute");
    cmd.args(system_paths());
    cmd.args(["--allow-all-network", "--allow-all-scope", "--best-effort"]);
    cmd.args(extra);
    cmd.arg("--");
    cmd.args(command);
    cmd.output().expect("spawn selflock")
}

#[test]
fn read_allowed_inside_sandbox() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let file = dir.path().join("readable.txt");
    std::fs::write(&file, "sandbox readable").expect("write fixture");

    let dir_arg = dir.path().to_str().expect("utf8 tempdir");
    let output = run_sandboxed(
        &["--allow-read", dir_arg],
        &["/bin/cat", file.to_str().expect("utf8 path")],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    assert_eq!(String::from_utf8_lossy(&output.stdout), "sandbox readable");
}

#[test]
fn write_blocked_outside_granted_paths() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    // Write rights become handled via the scratch grant, so writing into
    // the read-only dir must be denied.
    let readonly = tempfile::tempdir().expect("tempdir");
    let scratch = tempfile::tempdir().expect("tempdir");
    let target = readonly.path().join("blocked.txt");

    let script = format!("echo intruded > {}", target.display());
    let output = run_sandboxed(
        &[
            "--allow-read",
            readonly.path().to_str().expect("utf8 tempdir"),
            "--allow-read-write",
            scratch.path().to_str().expect("utf8 tempdir"),
        ],
        &["/bin/sh", "-c", &script],
    );

    assert!(
        !output.status.success(),
        "write should be denied, stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
    assert!(!target.exists(), "denied write must not create the file");
}

#[test]
fn read_blocked_outside_granted_paths() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    let granted = tempfile::tempdir().expect("tempdir");
    let hidden = tempfile::tempdir().expect("tempdir");
    let secret = hidden.path().join("secret.txt");
    std::fs::write(&secret, "do not read").expect("write fixture");

    let output = run_sandboxed(
        &["--allow-read", granted.path().to_str().expect("utf8 tempdir")],
        &["/bin/cat", secret.to_str().expect("utf8 path")],
    );

    assert!(
        !output.status.success(),
        "read outside allowed paths should be denied, stdout: {}",
        String::from_utf8_lossy(&output.stdout)
    );
}

#[test]
fn write_allowed_with_read_write_grant() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    let dir = tempfile::tempdir().expect("tempdir");
    let target = dir.path().join("granted.txt");
    let dir_arg = dir.path().to_str().expect("utf8 tempdir");

    let script = format!("echo granted > {}", target.display());
    let output = run_sandboxed(
        &["--allow-read-write", dir_arg],
        &["/bin/sh", "-c", &script],
    );

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let written = std::fs::read_to_string(&target).expect("read back");
    assert_eq!(written.trim(), "granted");
}

#[test]
fn best_effort_applies_on_any_supported_kernel() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    let output = run_sandboxed(&[], &["/bin/true"]);
    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn nonexistent_rule_path_is_reported() {
    if !landlock_available() {
        eprintln!("skipping: landlock unavailable");
        return;
    }
    let output = Command::new(selflock_bin())
        .args(["--allow-read", "/no/such/selflock/path", "--", "/bin/true"])
        .output()
        .expect("spawn selflock");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("does not exist") && stderr.contains("/no/such/selflock/path"),
        "stderr: {stderr}"
    );
}

#[test]
fn missing_command_is_a_usage_error() {
    let output = Command::new(selflock_bin())
        .args(["--allow-read", "/tmp"])
        .output()
        .expect("spawn selflock");

    assert_eq!(output.status.code(), Some(2));
}
