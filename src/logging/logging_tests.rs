//! Tests for log file preparation and subscriber setup.

use super::*;
use serial_test::serial;
use std::fs;

#[test]
fn prepare_creates_missing_directory() {
    // GIVEN a log path under a directory that does not exist
    let test_dir = std::env::temp_dir().join("transcript_layout_logs_create");
    let _ = fs::remove_dir_all(&test_dir);
    let log_file = test_dir.join("nested").join("run.log");

    // WHEN preparing it
    let (directory, file_name) = prepare_log_file(&log_file).expect("directory is creatable");

    // THEN the directory exists and the name is split off
    assert!(directory.exists(), "log directory should exist: {directory:?}");
    assert_eq!(file_name, "run.log");

    let _ = fs::remove_dir_all(&test_dir);
}

#[test]
fn prepare_accepts_existing_directory() {
    let test_dir = std::env::temp_dir().join("transcript_layout_logs_exists");
    fs::create_dir_all(&test_dir).expect("create test dir");

    let result = prepare_log_file(&test_dir.join("run.log"));

    assert!(result.is_ok());
    let _ = fs::remove_dir_all(&test_dir);
}

#[test]
fn bare_file_name_uses_current_directory() {
    let (directory, file_name) =
        prepare_log_file(Path::new("transcript-layout.log")).expect("cwd exists");

    assert_eq!(directory, PathBuf::from("."));
    assert_eq!(file_name, "transcript-layout.log");
}

#[test]
fn path_without_file_name_is_invalid() {
    let err = prepare_log_file(Path::new("/")).expect_err("root has no file name");

    assert!(matches!(err, LoggingError::InvalidPath(_)));
}

#[test]
#[serial(rust_log)]
fn filter_falls_back_without_rust_log() {
    std::env::remove_var("RUST_LOG");

    let filter = env_filter("debug");

    assert_eq!(filter.to_string(), "debug");
}

#[test]
#[serial(rust_log)]
fn filter_prefers_rust_log() {
    std::env::set_var("RUST_LOG", "warn");

    let filter = env_filter("debug");

    std::env::remove_var("RUST_LOG");
    assert_eq!(filter.to_string(), "warn");
}

#[test]
#[serial(tracing_init)]
fn init_prepares_file_target() {
    let test_dir = std::env::temp_dir().join("transcript_layout_logs_init");
    let _ = fs::remove_dir_all(&test_dir);

    // The subscriber may already be set by another test; the directory is
    // created either way.
    let _ = init(&LogTarget::File(test_dir.join("init.log")));

    assert!(test_dir.exists());
    let _ = fs::remove_dir_all(&test_dir);
}
