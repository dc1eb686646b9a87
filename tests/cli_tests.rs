mod support;

use alloy_primitives::U256;
use assert_cmd::Command;
use optivault::domain::VaultCall;
use optivault::testkit::domain::{OWNER, RECEIVER};
use predicates::prelude::*;
use support::config::{config_with_quote, temp_config, temp_json, MINIMAL_TOML};

const DEPOSIT_SELECTOR: &str = "0x6e553f65";
const WITHDRAW_SELECTOR: &str = "0xb460af94";

fn optivault() -> Command {
    let mut cmd = Command::cargo_bin("optivault").expect("binary built");
    cmd.env_remove("RUST_LOG");
    cmd
}

#[test]
fn check_accepts_a_valid_config() {
    let config = temp_config(&config_with_quote());
    optivault()
        .arg("check")
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("ETH"));
}

#[test]
fn check_rejects_a_config_without_vault() {
    let config = temp_config("[workers]\ncount = 2\n");
    optivault()
        .arg("check")
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("vault.address"));
}

#[test]
fn deposit_prints_calldata() {
    let config = temp_config(MINIMAL_TOML);
    optivault()
        .args(["deposit", "--assets", "1500000", "--receiver"])
        .arg(RECEIVER.to_string())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(DEPOSIT_SELECTOR))
        .stdout(predicate::str::contains("1.5"))
        .stdout(predicate::str::contains("Calldata ready for signing"));
}

#[test]
fn withdraw_in_json_mode_emits_only_json_lines() {
    let config = temp_config(MINIMAL_TOML);
    let assert = optivault()
        .args(["--json", "withdraw", "--assets", "42", "--receiver"])
        .arg(RECEIVER.to_string())
        .arg("--owner")
        .arg(OWNER.to_string())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let calldata = lines
        .iter()
        .find(|line| line["type"] == "calldata")
        .expect("calldata line");
    assert_eq!(calldata["payload"]["selector"], WITHDRAW_SELECTOR);
    assert!(lines
        .iter()
        .any(|line| line["type"] == "status" && line["payload"]["status"] == "completed"));
}

#[test]
fn invalid_amount_fails_the_job() {
    let config = temp_config(MINIMAL_TOML);
    optivault()
        .args(["deposit", "--assets", "0", "--receiver"])
        .arg(RECEIVER.to_string())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("permanent failure"));
}

#[test]
fn risk_aggregates_a_positions_file() {
    let config = temp_config(&config_with_quote());
    let positions = temp_json(
        r#"{
            "legs": [
                {
                    "seriesId": "ETH-20991231-2000-C",
                    "underlying": "ETH",
                    "side": "sell",
                    "optionType": "call",
                    "size": 2,
                    "strike": "2000",
                    "expiry": "2099-12-31T08:00:00Z",
                    "premium": "150"
                }
            ]
        }"#,
    );
    optivault()
        .args(["risk", "--trader"])
        .arg(OWNER.to_string())
        .arg("--positions")
        .arg(positions.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Net delta"))
        .stdout(predicate::str::contains("Margin by underlying"))
        .stdout(predicate::str::contains("Positions"))
        .stdout(predicate::str::contains("ETH-20991231-2000-C"));
}

#[test]
fn risk_rejects_an_unbounded_leg_size() {
    let config = temp_config(&config_with_quote());
    let positions = temp_json(
        r#"{"legs": [{"seriesId": "ETH-1", "underlying": "ETH", "side": "sell",
            "optionType": "call", "size": -9223372036854775808, "strike": 2000,
            "expiry": "2099-12-31T08:00:00Z"}]}"#,
    );
    optivault()
        .args(["risk", "--trader"])
        .arg(OWNER.to_string())
        .arg("--positions")
        .arg(positions.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("exceeds the limit"));
}

#[test]
fn risk_without_quotes_fails() {
    let config = temp_config(&format!(
        "{MINIMAL_TOML}\n[queue]\nmax_attempts = 2\nbackoff_base_ms = 10\nbackoff_max_ms = 20\n"
    ));
    let positions = temp_json(
        r#"{"legs": [{"seriesId": "SOL-1", "underlying": "SOL", "side": "buy",
            "optionType": "put", "size": 1, "strike": 100,
            "expiry": "2099-12-31T08:00:00Z"}]}"#,
    );
    optivault()
        .args(["risk", "--trader"])
        .arg(OWNER.to_string())
        .arg("--positions")
        .arg(positions.path())
        .arg("--config")
        .arg(config.path())
        .assert()
        .failure();
}

#[test]
fn decode_recovers_deposit_parameters() {
    let call = VaultCall::Deposit {
        assets: U256::from(987_654u64),
        receiver: RECEIVER,
    };
    let assert = optivault()
        .args(["--json", "decode", "--data"])
        .arg(call.encode().to_string())
        .assert()
        .success();

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_lowercase();
    assert!(stdout.contains("\"function\":\"deposit\""));
    assert!(stdout.contains(&RECEIVER.to_string().to_lowercase()));
}

#[test]
fn decode_rejects_garbage() {
    optivault()
        .args(["decode", "--data", "0xdeadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("calldata"));
}
