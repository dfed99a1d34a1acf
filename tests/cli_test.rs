use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

const FIXTURE: &str = "tests/fixtures/payments.jsonl";

fn cli() -> Command {
    let mut cmd = Command::new(cargo_bin!("grant-payments"));
    cmd.env_remove("PAYMENT_HUB_SA_KEY_NAME")
        .env_remove("PAYMENT_HUB_SA_KEY")
        .env_remove("PAYMENT_CONCURRENCY")
        .env("ENABLE_PAYMENT_HUB", "false");
    cmd
}

#[test]
fn test_cli_process_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = cli();
    cmd.args(["process", "--date", "2026-06-05", "--input", FIXTURE]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "date,record_id,payment_id,outcome,invoice_number,response_status",
        ))
        // Hub disabled: sent as a warning
        .stdout(predicate::str::contains("2026-06-05,rec-1,p1,warning,INV-1,"))
        // No transformer for SFI
        .stdout(predicate::str::contains("2026-06-05,rec-2,p1,none,,"))
        .stdout(predicate::str::contains("rec-1,p2").not());

    Ok(())
}

#[test]
fn test_cli_ingest_reports_each_message() {
    let mut cmd = cli();
    cmd.args(["ingest", FIXTURE]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            r#"{"messageId":"line-1","passed":true,"retryable":false,"outcome":{"recordId":"rec-1","action":"created","payments":2}}"#,
        ))
        .stdout(predicate::str::contains(r#""messageId":"line-3","passed":true"#))
        .stdout(predicate::str::contains(r#""messageId":"line-4","passed":false,"retryable":false"#));
}

#[test]
fn test_cli_rejects_invalid_date() {
    let mut cmd = cli();
    cmd.args(["process", "--date", "2026-13-01"]);

    cmd.assert().failure();
}

#[test]
fn test_cli_enabled_hub_without_credentials_fails() {
    let mut cmd = cli();
    cmd.env("ENABLE_PAYMENT_HUB", "true")
        .args(["process", "--date", "2026-06-05", "--input", FIXTURE]);

    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("key name or key is not set"));
}

#[test]
fn test_cli_due_on_empty_store() {
    let mut cmd = cli();
    cmd.args(["due", "--date", "2026-06-05"]);

    cmd.assert().success().stdout(predicate::str::contains("[]"));
}
