//! Concurrency tests for taper_cli.
//!
//! These tests verify that multiple processes can safely:
//! - Write to the event WAL simultaneously (file locking)
//! - Update the program book without corrupting it
//! - Perform rollup operations while events are being logged

use assert_cmd::Command;
use std::path::Path;
use std::thread;
use std::time::Duration;
use tempfile::TempDir;

fn cli() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("taper"))
}

fn setup_test_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temp dir")
}

fn start_program(data_dir: &Path) {
    cli()
        .arg("start")
        .arg("--product")
        .arg("cigarette")
        .arg("--baseline")
        .arg("20")
        .arg("--data-dir")
        .arg(data_dir)
        .assert()
        .success();
}

#[test]
fn test_staggered_event_logging() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    start_program(&data_dir);

    // Log events with slight delays (more realistic than thundering herd)
    for i in 0..5 {
        thread::sleep(Duration::from_millis(i * 5));
        cli()
            .arg("log")
            .arg("use")
            .arg("--amount")
            .arg("1")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    // Verify all events were logged
    let wal_path = data_dir.join("wal/events.wal");
    let wal_content = std::fs::read_to_string(&wal_path).expect("Failed to read WAL");

    let event_count = wal_content.lines().count();
    assert_eq!(event_count, 5, "Expected 5 events, got {}", event_count);
}

#[test]
fn test_no_wal_corruption_under_load() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    start_program(&data_dir);

    // Hammer the CLI with many concurrent writes
    let handles: Vec<_> = (0..10)
        .map(|i| {
            let data_dir = data_dir.clone();
            thread::spawn(move || {
                // Small stagger to reduce thundering herd
                thread::sleep(Duration::from_millis(i * 5));
                cli()
                    .arg("log")
                    .arg("craving")
                    .arg("--intensity")
                    .arg("6")
                    .arg("--data-dir")
                    .arg(&data_dir)
                    .timeout(Duration::from_secs(10))
                    .assert()
                    .success();
            })
        })
        .collect();

    for handle in handles {
        handle.join().expect("Thread panicked");
    }

    // Give filesystem a moment to settle
    thread::sleep(Duration::from_millis(100));

    // Verify WAL is valid JSON-lines
    let wal_path = data_dir.join("wal/events.wal");
    let wal_content = std::fs::read_to_string(&wal_path).expect("Failed to read WAL");

    let mut valid_count = 0;
    for line in wal_content.lines() {
        if line.is_empty() {
            continue;
        }
        let parsed: Result<serde_json::Value, _> = serde_json::from_str(line);
        assert!(parsed.is_ok(), "WAL contains invalid JSON line: {}", line);
        valid_count += 1;
    }

    assert_eq!(valid_count, 10, "Expected 10 valid events in WAL");
}

#[test]
fn test_rollup_while_writing() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    start_program(&data_dir);

    // Create some initial events
    for _ in 0..3 {
        cli()
            .arg("log")
            .arg("use")
            .arg("--amount")
            .arg("1")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    // Start rollup in background
    let data_dir_rollup = data_dir.clone();
    let rollup_handle = thread::spawn(move || {
        thread::sleep(Duration::from_millis(10));
        cli()
            .arg("rollup")
            .arg("--data-dir")
            .arg(&data_dir_rollup)
            .assert()
            .success();
    });

    // Write more events while rollup might be running
    for _ in 0..2 {
        cli()
            .arg("log")
            .arg("use")
            .arg("--amount")
            .arg("1")
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
        thread::sleep(Duration::from_millis(5));
    }

    rollup_handle.join().expect("Rollup thread panicked");

    // Verify CSV exists and has data
    let csv_path = data_dir.join("events.csv");
    assert!(csv_path.exists());

    // No event was lost: everything is either in the WAL or the CSV
    cli()
        .arg("events")
        .arg("--data-dir")
        .arg(&data_dir)
        .assert()
        .success()
        .stdout(predicates::str::contains("5 events"));
}

#[test]
fn test_program_book_updates_remain_valid() {
    let temp_dir = setup_test_dir();
    let data_dir = temp_dir.path().to_path_buf();
    start_program(&data_dir);

    // Repeated book rewrites keep the file parseable
    for cost in ["0.25", "0.50", "0.75"] {
        cli()
            .arg("cost")
            .arg(cost)
            .arg("--data-dir")
            .arg(&data_dir)
            .assert()
            .success();
    }

    let book_path = data_dir.join("wal/programs.json");
    let book_content = std::fs::read_to_string(&book_path).expect("Failed to read book");
    let parsed: serde_json::Value =
        serde_json::from_str(&book_content).expect("Book should be valid JSON");

    let cost = parsed["active"]["product_profile"]["cost_per_unit"]
        .as_f64()
        .expect("cost_per_unit should be set");
    assert!((cost - 0.75).abs() < f64::EPSILON);
}
