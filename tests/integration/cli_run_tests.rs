use clap::Parser;
use linedupe::cli::Cli;
use linedupe::error::ExitCode;
use linedupe::run_with_output;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::{tempdir, TempDir};

/// Temp dir with an empty config file, so a user config never leaks in.
fn workspace() -> (TempDir, PathBuf) {
    let dir = tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "").unwrap();
    (dir, config)
}

fn write(dir: &Path, name: &str, content: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path.to_string_lossy().into_owned()
}

fn run(config: &Path, args: &[&str]) -> anyhow::Result<(ExitCode, String)> {
    let config = config.to_string_lossy().into_owned();
    let mut argv = vec!["linedupe", "-q", "--no-progress", "--config", config.as_str()];
    argv.extend_from_slice(args);
    let cli = Cli::try_parse_from(argv).unwrap();

    let mut out = Vec::new();
    let code = run_with_output(cli, &mut out, false)?;
    Ok((code, String::from_utf8(out).unwrap()))
}

#[test]
fn test_scan_text_report() {
    let (dir, config) = workspace();
    let a = write(dir.path(), "a.txt", "x\ny\nx\n");
    let b = write(dir.path(), "b.txt", "x\n");

    let (code, out) = run(&config, &["scan", &a, &b]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(out, format!("3\tx\n\t{a}: [1, 3]\n\t{b}: [1]\n"));
}

#[test]
fn test_scan_no_duplicates_exit_code() {
    let (dir, config) = workspace();
    let a = write(dir.path(), "a.txt", "p\nq\n");

    let (code, out) = run(&config, &["scan", &a]).unwrap();

    assert_eq!(code, ExitCode::NoDuplicates);
    assert!(out.is_empty());
}

#[test]
fn test_scan_partial_success_exit_code() {
    let (dir, config) = workspace();
    let a = write(dir.path(), "a.txt", "r\nr\n");
    let missing = dir.path().join("missing.txt");

    let (code, out) = run(&config, &["scan", &a, &missing.to_string_lossy()]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert!(out.starts_with("2\tr\n"));
    let failure = out.lines().last().unwrap();
    assert!(failure.starts_with("# Failed to open"));
    assert!(failure.contains("missing.txt"));
}

#[test]
fn test_scan_quiet_still_lists_failed_source_without_duplicates() {
    let (dir, config) = workspace();
    let a = write(dir.path(), "a.txt", "u
v
");
    let missing = dir.path().join("gone.txt");

    let (code, out) = run(&config, &["scan", &a, &missing.to_string_lossy()]).unwrap();

    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(out.lines().count(), 1);
    assert!(out.starts_with("# Failed to open"));
    assert!(out.contains("gone.txt"));
}

#[test]
fn test_scan_sort_by_count() {
    let (dir, config) = workspace();
    let a = write(dir.path(), "a.txt", "b\nb\na\na\na\nc\nc\n");

    let (_, out) = run(&config, &["scan", &a, "-o", "csv", "--sort", "count"]).unwrap();
    let texts: Vec<&str> = out
        .lines()
        .skip(1)
        .map(|row| row.split(',').nth(3).unwrap())
        .collect();

    assert_eq!(texts, vec!["a", "a", "a", "b", "b", "c", "c"]);
}

#[test]
fn test_scan_threshold_flag_overrides_config_file() {
    let (dir, config) = workspace();
    fs::write(&config, "threshold = 5\n").unwrap();
    let a = write(dir.path(), "a.txt", "t\nt\nt\n");

    let (code, _) = run(&config, &["scan", &a]).unwrap();
    assert_eq!(code, ExitCode::NoDuplicates);

    let (code, out) = run(&config, &["scan", &a, "-t", "2"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(out.starts_with("3\tt\n"));
}

#[test]
fn test_sorted_text_report() {
    let (dir, config) = workspace();
    let s = write(dir.path(), "sorted.txt", "a\na\na\nb\nb\nc\n");

    let (code, out) = run(&config, &["sorted", &s, "--sort", "text"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(out, "3\ta\tstart: 1, end: 3\n2\tb\tstart: 4, end: 5\n");
}

#[test]
fn test_sorted_missing_file_is_fatal() {
    let (dir, config) = workspace();
    let missing = dir.path().join("missing.txt");

    let err = run(&config, &["sorted", &missing.to_string_lossy()]).unwrap_err();
    assert!(err.to_string().contains("missing.txt"));
}

#[test]
fn test_missing_config_file_is_fatal() {
    let dir = tempdir().unwrap();
    let a = write(dir.path(), "a.txt", "a\n");

    let err = run(&dir.path().join("nope.toml"), &["scan", &a]).unwrap_err();
    assert!(err.to_string().contains("Failed to load configuration"));
}

#[test]
fn test_config_show_and_save() {
    let (dir, config) = workspace();

    let (code, out) = run(&config, &["config"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(out.contains("threshold = 1"));
    assert!(out.contains("hash_algorithm = \"sha256\""));

    let target = dir.path().join("saved").join("config.toml");
    let target_arg = target.to_string_lossy().into_owned();
    let cli = Cli::try_parse_from([
        "linedupe",
        "-q",
        "--config",
        target_arg.as_str(),
        "config",
        "--save",
    ])
    .unwrap();
    let mut out = Vec::new();
    let code = run_with_output(cli, &mut out, false).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert!(target.exists());
    assert!(fs::read_to_string(&target).unwrap().contains("long_line_threshold = 32"));
}
