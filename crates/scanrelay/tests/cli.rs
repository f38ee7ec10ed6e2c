use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

const SECRET_VARS: &[&str] = &["TELEGRAM_BOT_TOKEN", "DEEPSEEK_API_KEY"];

#[test]
fn test_help_lists_configuration() {
    cargo_bin_cmd!("scanrelay")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("TELEGRAM_BOT_TOKEN"))
        .stdout(predicate::str::contains("DEEPSEEK_API_KEY"))
        .stdout(predicate::str::contains("--port"))
        .stdout(predicate::str::contains("--normalize-images"));
}

#[test]
fn test_missing_bot_token_fails_at_startup() {
    let mut cmd = cargo_bin_cmd!("scanrelay");
    for var in SECRET_VARS {
        cmd.env_remove(var);
    }
    cmd.args(["--api-key", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("TELEGRAM_BOT_TOKEN is required"));
}

#[test]
fn test_placeholder_bot_token_fails_at_startup() {
    let mut cmd = cargo_bin_cmd!("scanrelay");
    for var in SECRET_VARS {
        cmd.env_remove(var);
    }
    cmd.args(["--bot-token", "your_bot_token_here", "--api-key", "sk-test"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("placeholder"));
}

#[test]
fn test_missing_api_key_fails_at_startup() {
    let mut cmd = cargo_bin_cmd!("scanrelay");
    for var in SECRET_VARS {
        cmd.env_remove(var);
    }
    cmd.args(["--bot-token", "123:abc"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("DEEPSEEK_API_KEY is required"));
}
