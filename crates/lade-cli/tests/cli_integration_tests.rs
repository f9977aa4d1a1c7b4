//! # CLI Integration Tests
//!
//! End-to-end tests that invoke the compiled `lade` binary and verify its
//! behavior from the user's perspective: help/version output, config
//! inspection, and a full `trigger` run against the in-memory fake cloud
//! port (`--fake-cloud`) and a temporary data directory.
//!
//! Each test spawns a new process via `std::process::Command` to ensure the
//! binary behaves correctly as a standalone executable.

// Layer 1: Standard library
use std::path::Path;
use std::process::Command;

/// Creates a `Command` pointing to the compiled `lade` binary, via the
/// `CARGO_BIN_EXE_lade` environment variable Cargo sets during test
/// compilation.
fn lade_cmd() -> Command {
    Command::new(env!("CARGO_BIN_EXE_lade"))
}

/// Writes a minimal agency config and a seeded lease record directly under
/// `data_dir`, in the on-disk layout `lade-persistence` reads/writes.
fn seed_agency(data_dir: &Path, agency: &str) {
    let agencies_dir = data_dir.join("config").join("agencies");
    std::fs::create_dir_all(&agencies_dir).unwrap();
    std::fs::write(
        agencies_dir.join(format!("{agency}.toml")),
        format!(
            "agency = \"{agency}\"\n\
             runsheet_archive_base_path = \"/State Workspace/Archive\"\n\
             subfolders = [\"Documents\", \"Runsheets\"]\n\
             auto_create_runsheet_archives = true\n\
             enabled = true\n"
        ),
    )
    .unwrap();
}

#[test]
fn test_help_output() {
    let output = lade_cmd().arg("--help").output().expect("failed to execute lade --help");

    assert!(output.status.success(), "lade --help should exit with code 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("run-worker"), "help output should list 'run-worker'");
    assert!(stdout.contains("trigger"), "help output should list 'trigger'");
    assert!(stdout.contains("config"), "help output should list 'config'");
}

#[test]
fn test_version_output() {
    let output = lade_cmd().arg("--version").output().expect("failed to execute lade --version");

    assert!(output.status.success(), "lade --version should exit with code 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("0.1.0"), "version output should contain the version number, got: {stdout}");
}

#[test]
fn test_no_command_fails() {
    let output = lade_cmd().output().expect("failed to execute lade with no args");

    assert!(!output.status.success(), "lade with no subcommand should exit with non-zero code");
}

#[test]
fn test_unknown_command_fails() {
    let output = lade_cmd().arg("unknown").output().expect("failed to execute lade unknown");

    assert!(!output.status.success(), "lade unknown should exit with non-zero code");
}

#[test]
fn test_trigger_without_required_args_fails() {
    let output = lade_cmd().arg("trigger").output().expect("failed to execute lade trigger");

    assert!(!output.status.success(), "lade trigger without --agency/--lease should exit with non-zero code");
}

#[test]
fn test_config_show_missing_agency_fails() {
    let temp = tempfile::tempdir().unwrap();

    let output = lade_cmd()
        .args(["config", "show", "--data-dir"])
        .arg(temp.path())
        .arg("GHOST")
        .output()
        .expect("failed to execute lade config show");

    assert!(!output.status.success(), "config show for an unconfigured agency should exit with non-zero code");
}

#[test]
fn test_config_show_prints_resolved_configuration() {
    let temp = tempfile::tempdir().unwrap();
    seed_agency(temp.path(), "NMSLO");

    let output = lade_cmd()
        .args(["config", "show", "--data-dir"])
        .arg(temp.path())
        .arg("NMSLO")
        .output()
        .expect("failed to execute lade config show");

    assert!(
        output.status.success(),
        "config show should exit with code 0, stderr: {}",
        String::from_utf8_lossy(&output.stderr),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("NMSLO"), "output should echo the agency name, got: {stdout}");
    assert!(stdout.contains("auto_create_runsheet_archives"), "output should print the resolved config, got: {stdout}");
}

#[test]
fn test_trigger_without_user_does_not_enqueue() {
    let temp = tempfile::tempdir().unwrap();
    seed_agency(temp.path(), "NMSLO");

    let output = lade_cmd()
        .args(["trigger", "--data-dir"])
        .arg(temp.path())
        .args(["--agency", "NMSLO", "--lease", "12345", "--fake-cloud"])
        .output()
        .expect("failed to execute lade trigger");

    assert!(output.status.success(), "trigger with no user should still exit 0");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("not enqueued"), "output should explain the event was dropped, got: {stdout}");
}

#[test]
fn test_trigger_against_fake_cloud_runs_discovery_to_completion() {
    let temp = tempfile::tempdir().unwrap();
    seed_agency(temp.path(), "NMSLO");

    let output = lade_cmd()
        .args(["trigger", "--data-dir"])
        .arg(temp.path())
        .args(["--agency", "NMSLO", "--lease", "12345", "--user", "operator-1", "--fake-cloud"])
        .output()
        .expect("failed to execute lade trigger");

    assert!(
        output.status.success(),
        "trigger against the fake cloud port should exit with code 0, stderr: {}",
        String::from_utf8_lossy(&output.stderr),
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(
        stdout.contains("done") || stdout.contains("requeued") || stdout.contains("failed"),
        "output should report a terminal or requeue outcome, got: {stdout}",
    );
}
