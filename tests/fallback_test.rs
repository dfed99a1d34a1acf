use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/payments.jsonl";

#[cfg(not(feature = "storage-rocksdb"))]
#[test]
fn test_rocksdb_fallback_warning() {
    let mut cmd = Command::new(cargo_bin!("grant-payments"));
    cmd.args(["ingest", FIXTURE]).arg("--db-path").arg("some_db");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains(
            "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage.",
        ));
}

#[cfg(feature = "storage-rocksdb")]
#[test]
fn test_rocksdb_records_survive_between_runs() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    let mut ingest = Command::new(cargo_bin!("grant-payments"));
    ingest.args(["ingest", FIXTURE]).arg("--db-path").arg(&db_path);
    ingest
        .assert()
        .success()
        .stderr(predicate::str::contains("Falling back").not());

    let mut query = Command::new(cargo_bin!("grant-payments"));
    query
        .args(["by-sbi", "106651234", "--fund-code", "DRD10"])
        .arg("--db-path")
        .arg(&db_path);
    query
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "rec-1""#));

    let mut due = Command::new(cargo_bin!("grant-payments"));
    due.args(["due", "--date", "2026-06-05"])
        .arg("--db-path")
        .arg(&db_path);
    due.assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "p1""#))
        .stdout(predicate::str::contains(r#""id": "p2""#).not());
}
