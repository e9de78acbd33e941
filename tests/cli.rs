use std::{fs, process::Command};

mod utils;

fn httpbench() -> Command {
    Command::new(env!("CARGO_BIN_EXE_httpbench"))
}

#[test]
fn successful_run_exits_zero_and_cleans_up() {
    utils::logging();

    let dir = tempfile::tempdir().unwrap();
    let base = dir.path().join("a/b");

    let output = httpbench()
        .args(["--serve", "1024", "--only", "curl-keepalive"])
        .args(["--min-cycles", "1", "--max-cycles", "2", "--base-path"])
        .arg(&base)
        .output()
        .unwrap();

    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.lines().count(), 3);
    assert_eq!(stdout.lines().last(), Some("Fastest is curl - keepalive"));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn fatal_error_exits_non_zero_naming_trial_and_phase() {
    utils::logging();

    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let output = httpbench()
        .args(["--serve", "16", "--only", "reqwest - defaults", "--base-path"])
        .arg(blocker.join("downloads"))
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));

    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("error: trial 'reqwest - defaults' failed during setup"));
}

#[test]
fn unknown_trial_filter_exits_non_zero() {
    let output = httpbench()
        .args(["--serve", "16", "--only", "wget"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8(output.stderr).unwrap().contains("no trial matches wget"));
}
