#![cfg(unix)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Fast timeline so each run takes well under a second
const FAST: [&str; 6] = [
    "--snapshot-delay-ms",
    "200",
    "--termination-delay-ms",
    "200",
    "--report-interval-ms",
    "50",
];

fn command() -> Command {
    let mut cmd = Command::cargo_bin("forkgroup").expect("binary built");
    cmd.env("RUST_LOG", "off");
    cmd.env_remove("FORKGROUP_SNAPSHOT_DELAY_MS");
    cmd.env_remove("FORKGROUP_TERMINATION_DELAY_MS");
    cmd.env_remove("FORKGROUP_REPORT_INTERVAL_MS");
    cmd.env_remove("FORKGROUP_SNAPSHOT_TOOL");
    cmd
}

fn fast_command() -> Command {
    let mut cmd = command();
    cmd.args(FAST);
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().expect("run forkgroup");
    assert!(output.status.success(), "forkgroup failed: {output:?}");
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn help_command_displays_usage_information() {
    command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage"))
        .stdout(predicate::str::contains("--snapshot-delay-ms"));
}

#[test]
fn three_children_with_pwd_in_the_exec_slot() {
    let dir = TempDir::new().expect("temp dir");
    let cwd = fs::canonicalize(dir.path()).expect("canonical temp dir");

    let stdout = stdout_of(
        fast_command()
            .arg("--no-snapshot")
            .args(["3", "1", "pwd"])
            .current_dir(&cwd),
    );

    assert!(stdout.contains("Child #0 (PID "), "{stdout}");
    assert!(stdout.contains("Child #2 (PID "), "{stdout}");
    assert!(!stdout.contains("Child #1 "), "exec slot ran the loop: {stdout}");
    assert!(stdout.contains(&cwd.display().to_string()), "{stdout}");
    assert_eq!(stdout.matches("Terminated child with PID").count(), 3);
    assert!(stdout.trim_end().ends_with("Parent process finished."), "{stdout}");
}

#[test]
fn termination_follows_spawn_order() {
    let stdout = stdout_of(fast_command().arg("--no-snapshot").args(["2", "0", "true"]));

    let terminated: Vec<&str> = stdout
        .lines()
        .filter_map(|line| line.strip_prefix("Terminated child with PID "))
        .collect();
    let child_one_pid = stdout
        .lines()
        .find_map(|line| line.strip_prefix("Child #1 (PID "))
        .and_then(|rest| rest.split(')').next())
        .expect("child #1 reported");

    assert_eq!(terminated.len(), 2);
    assert_eq!(terminated[1], child_one_pid);
}

#[test]
fn invalid_exec_index_fails_before_spawning() {
    fast_command()
        .args(["3", "5", "pwd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid exec_index: 5 (should be from 0 to 2)",
        ))
        .stdout(predicate::str::contains("Child #").not())
        .stdout(predicate::str::contains("Terminated").not());
}

#[test]
fn non_numeric_count_is_rejected() {
    fast_command()
        .args(["many", "0", "pwd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid process count: 'many'"));
}

#[test]
fn exec_failure_is_isolated_to_its_child() {
    fast_command()
        .arg("--no-snapshot")
        .args(["2", "0", "forkgroup-test-no-such-program"])
        .assert()
        .success()
        .stderr(predicate::str::contains("exec failed"))
        .stdout(predicate::str::contains("Child #1 (PID "))
        .stdout(predicate::str::contains("Parent process finished."));
}

#[test]
fn interactive_prompts_read_from_stdin() {
    fast_command()
        .arg("--no-snapshot")
        .write_stdin("2\n0\ntime\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("Enter the number of child processes: "))
        .stdout(predicate::str::contains(
            "Enter the index of the process that will run exec (from 0 to 1): ",
        ))
        .stdout(predicate::str::contains("> "))
        .stdout(predicate::str::contains("Child #1 (PID "))
        .stdout(predicate::str::contains("Child #0 ").not())
        .stderr(predicate::str::contains("exec failed").not());
}

#[test]
fn interactive_time_runs_cleanly_in_the_shell_variant() {
    fast_command()
        .args(["--no-snapshot", "--shell"])
        .write_stdin("1\n0\ntime\n")
        .assert()
        .success()
        .stderr(predicate::str::contains("exec failed").not())
        .stderr(predicate::str::contains("not found").not());
}

#[test]
fn huge_process_count_is_reported_not_panicked() {
    fast_command()
        .arg("--no-snapshot")
        .args(["18446744073709551615", "0", "true"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Resource error: cannot allocate a registry"))
        .stderr(predicate::str::contains("panicked").not())
        .stdout(predicate::str::contains("Child #").not());
}

#[test]
fn zero_process_count_names_the_empty_exec_range() {
    fast_command()
        .args(["0", "0", "pwd"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Invalid exec_index: 0 (should be from 0 to -1)",
        ));
}

#[test]
fn interactive_shell_variant_runs_the_whole_line() {
    fast_command()
        .args(["--no-snapshot", "--shell"])
        .write_stdin("1\n0\necho one; echo two\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("one\ntwo\n"));
}

#[test]
fn interactive_token_limit_is_an_error() {
    fast_command()
        .arg("--no-snapshot")
        .write_stdin("1\n0\na b c d e f g h i j k\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("at most 10 are supported"));
}

#[test]
fn interactive_exec_index_is_validated() {
    fast_command()
        .arg("--no-snapshot")
        .write_stdin("2\n2\npwd\n")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid exec_index: 2"));
}

#[test]
fn snapshots_are_taken_at_start_and_end() {
    let dir = TempDir::new().expect("temp dir");

    let stdout = stdout_of(
        fast_command()
            .args(["--snapshot-tool", "touch", "--snapshot-dir"])
            .arg(dir.path())
            .args(["2", "1", "whoami"]),
    );

    let start = dir.path().join("start_whoami.png");
    let end = dir.path().join("end_whoami.png");
    assert!(start.exists() && end.exists());
    assert!(stdout.contains(&format!("Screenshot saved as: {}", start.display())));

    let terminated = stdout.find("Terminated child").expect("termination");
    let end_saved = stdout.find("end_whoami.png").expect("end snapshot");
    assert!(terminated < end_saved, "end snapshot before termination: {stdout}");
}

#[test]
fn missing_snapshot_tool_does_not_stop_the_run() {
    fast_command()
        .args(["--snapshot-tool", "forkgroup-no-such-capture-tool"])
        .args(["1", "0", "true"])
        .assert()
        .success()
        .stderr(predicate::str::contains(
            "Failed to take screenshot (is forkgroup-no-such-capture-tool installed?)",
        ))
        .stdout(predicate::str::contains("Parent process finished."));
}

#[test]
fn settings_file_supplies_the_timeline() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("forkgroup.toml");
    fs::write(
        &config,
        r#"
snapshot_delay_ms = 100
termination_delay_ms = 100
report_interval_ms = 20

[snapshot]
enabled = false
"#,
    )
    .expect("write config");

    command()
        .arg("--config")
        .arg(&config)
        .args(["2", "0", "true"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Screenshot").not())
        .stdout(predicate::str::contains("Parent process finished."));
}

#[test]
fn broken_settings_file_is_fatal() {
    let dir = TempDir::new().expect("temp dir");
    let config = dir.path().join("forkgroup.toml");
    fs::write(&config, "snapshot_delay_ms = \"soon\"").expect("write config");

    command()
        .arg("--config")
        .arg(&config)
        .args(["1", "0", "true"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Settings error"));
}
