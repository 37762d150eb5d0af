//! End-to-end CLI tests against a temporary data directory.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn lostfound(dir: &TempDir, identity: Option<&str>) -> Command {
    let mut cmd = Command::cargo_bin("lostfound").unwrap();
    cmd.env_remove("RUST_LOG")
        .env("NO_COLOR", "1")
        .env("LOSTFOUND_DATA_DIR", dir.path())
        .env("LOSTFOUND_CONFIG", dir.path().join("config.toml"));
    match identity {
        Some(id) => {
            cmd.env("LOSTFOUND_IDENTITY", id);
        }
        None => {
            cmd.env_remove("LOSTFOUND_IDENTITY");
        }
    }
    cmd
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("lostfound")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("report-lost"))
        .stdout(predicate::str::contains("claim"));
}

#[test]
fn state_persists_across_invocations() {
    let dir = tempfile::tempdir().unwrap();

    lostfound(&dir, Some("0xA11CE"))
        .args([
            "register",
            "--username",
            "alice",
            "--email",
            "alice@example.com",
            "--phone",
            "1234567890",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Registered 0xa11ce as alice"));

    lostfound(&dir, Some("0xA11CE"))
        .args([
            "report-lost",
            "--name",
            "Wallet",
            "--description",
            "black leather",
            "--location",
            "Main St",
            "--reward",
            "0.01",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reported lost item #1"))
        .stdout(predicate::str::contains("0.01 ETH held in escrow"));

    lostfound(&dir, None)
        .args(["--output", "json", "get", "lost", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"Wallet\""))
        .stdout(predicate::str::contains("\"resolved\": false"));

    lostfound(&dir, Some("0xa11ce"))
        .args(["resolve", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("released 0.01 ETH to 0xa11ce"));

    lostfound(&dir, Some("0xa11ce"))
        .args(["resolve", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[already_resolved]"));

    lostfound(&dir, None)
        .args(["--output", "json", "receipts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("lost_item_resolved"));
}

#[test]
fn finder_cannot_claim_own_report() {
    let dir = tempfile::tempdir().unwrap();

    lostfound(&dir, Some("bob"))
        .args([
            "report-found",
            "--name",
            "Keys",
            "--description",
            "silver keys",
            "--location",
            "Park Ave",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Reported found item #1"));

    lostfound(&dir, Some("bob"))
        .args(["claim", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[unauthorized]"));

    lostfound(&dir, Some("carol"))
        .args(["claim", "1"])
        .assert()
        .success();

    lostfound(&dir, None)
        .args(["list", "--filter", "found"])
        .assert()
        .success()
        .stdout(predicate::str::contains("claimed by carol"));
}

#[test]
fn validation_errors_are_reported() {
    let dir = tempfile::tempdir().unwrap();

    lostfound(&dir, Some("alice"))
        .args([
            "register",
            "--username",
            "alice",
            "--email",
            "alice@example.com",
            "--phone",
            "12345",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[validation_error]"))
        .stderr(predicate::str::contains("phone number must be exactly 10 digits"));

    lostfound(&dir, Some("alice"))
        .args(["user"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[not_found]"));
}

#[test]
fn count_and_search() {
    let dir = tempfile::tempdir().unwrap();

    for (name, location) in [("Umbrella", "Bus 42"), ("Blue wallet", "Library")] {
        lostfound(&dir, Some("alice"))
            .args([
                "report-lost",
                "--name",
                name,
                "--description",
                "misplaced",
                "--location",
                location,
            ])
            .assert()
            .success();
    }

    lostfound(&dir, None)
        .args(["--output", "json", "count"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"lost\": 2"))
        .stdout(predicate::str::contains("\"found\": 0"));

    lostfound(&dir, None)
        .args(["list", "--search", "LIBRARY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Blue wallet"))
        .stdout(predicate::str::contains("Umbrella").not());
}

#[test]
fn mutating_command_requires_identity() {
    let dir = tempfile::tempdir().unwrap();

    lostfound(&dir, None)
        .args(["claim", "1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error[invalid_input]"));
}
