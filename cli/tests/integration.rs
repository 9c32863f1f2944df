// run claim-topics against an in-process devnet
use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use assert_cmd::prelude::*;
use harness::{Devnet, DevnetConfig, DevnetServer, DEV_ACCOUNT_1};
use predicates::prelude::*;
use tempfile::NamedTempFile;
use types::Topic;

const ENV_VARS: &[&str] = &[
    "CLAIM_TOPICS_REGISTRY",
    "CLAIM_TOPICS_RPC_URL",
    "CLAIM_TOPICS_FROM",
    "CLAIM_TOPICS_LOG_LEVEL",
    "CLAIM_TOPICS_LOG_FILE",
    "CLAIM_TOPICS_CONFIRMATION_TIMEOUT_MS",
    "CLAIM_TOPICS_POLL_INTERVAL_MS",
];

struct Fixture {
    server: DevnetServer,
    config: NamedTempFile,
    _runtime: tokio::runtime::Runtime,
}

impl Fixture {
    fn start(topics: &[u64]) -> Self {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let devnet = Devnet::new(DevnetConfig {
            topics: topics.iter().copied().map(Topic::new).collect(),
            ..Default::default()
        });
        let server = {
            let _guard = runtime.enter();
            DevnetServer::spawn(Arc::new(devnet)).unwrap()
        };
        let config = NamedTempFile::new().unwrap();
        std::fs::write(
            config.path(),
            "[rpc]\npoll_interval_ms = 10\nconfirmation_timeout_ms = 2000\n",
        )
        .unwrap();
        Fixture { server, config, _runtime: runtime }
    }

    fn command(&self) -> Command {
        let mut cmd = bare_command(self.config.path());
        cmd.arg("--rpc-url")
            .arg(self.server.url())
            .arg("--registry")
            .arg(self.server.devnet().registry().to_string());
        cmd
    }
}

fn bare_command(config: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claim-topics"));
    for var in ENV_VARS {
        cmd.env_remove(var);
    }
    cmd.arg("--config").arg(config);
    cmd
}

#[test]
fn help_lists_commands() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claim-topics"));
    cmd.arg("--help");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("remove"))
        .stdout(predicate::str::contains("--registry"));
}

#[test]
fn non_numeric_topic_is_a_usage_error() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("claim-topics"));
    cmd.args(["add", "kyc"]);
    cmd.assert().failure().stderr(predicate::str::contains("invalid value"));
}

#[test]
fn missing_registry_fails() {
    let config = NamedTempFile::new().unwrap();
    let mut cmd = bare_command(config.path());
    cmd.arg("list");
    cmd.assert().failure().stderr(predicate::str::contains("No registry address configured"));
}

#[test]
fn list_shows_labels() {
    let fixture = Fixture::start(&[1, 9]);
    let mut cmd = fixture.command();
    cmd.arg("list");
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("KYC (Know Your Customer)"))
        .stdout(predicate::str::contains("Custom Topic"))
        .stdout(predicate::str::contains("owner"));
}

#[test]
fn count_and_json_list() {
    let fixture = Fixture::start(&[2, 3]);
    let mut cmd = fixture.command();
    cmd.arg("count");
    cmd.assert().success().stdout("2\n");

    let output = fixture.command().args(["list", "--json"]).output().unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["topics"][0]["label"], "AML (Anti-Money Laundering)");
    assert_eq!(value["authorized"], true);
    assert_eq!(value["phase"], "idle");
}

#[test]
fn add_and_remove() {
    let fixture = Fixture::start(&[1]);
    let mut add = fixture.command();
    add.args(["add", "4"]);
    add.assert().success().stdout(predicate::str::contains("Topic 4 added successfully"));
    assert_eq!(fixture.server.devnet().topics(), vec![Topic::new(1), Topic::new(4)]);

    let mut duplicate = fixture.command();
    duplicate.args(["add", "4"]);
    duplicate.assert().failure().stderr(predicate::str::contains("Topic 4 already exists"));

    let mut remove = fixture.command();
    remove.args(["remove", "4", "--yes"]);
    remove.assert().success().stdout(predicate::str::contains("Topic 4 removed successfully"));
    assert_eq!(fixture.server.devnet().topics(), vec![Topic::new(1)]);
}

#[test]
fn remove_asks_for_confirmation() {
    let fixture = Fixture::start(&[3]);
    let mut remove = assert_cmd::Command::from_std(fixture.command());
    remove.args(["remove", "3"]).write_stdin("n\n");
    remove
        .assert()
        .success()
        .stderr(predicate::str::contains("Remove topic 3 (Accredited Investor)?"))
        .stderr(predicate::str::contains("Aborted."));
    assert_eq!(fixture.server.devnet().topics(), vec![Topic::new(3)]);
}

#[test]
fn viewer_is_rejected() {
    let fixture = Fixture::start(&[1]);
    let mut cmd = fixture.command();
    cmd.args(["add", "2", "--from"]).arg(DEV_ACCOUNT_1.to_string());
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Only the registry owner can modify claim topics"));
    assert_eq!(fixture.server.devnet().call_count("eth_sendTransaction"), 0);
}
