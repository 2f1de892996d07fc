mod common;

use std::fs;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use common::FakeNetwork;
use hlf_chaincode_rs::cli::{run_with_config, ChaincodeCommand, CliOptions};
use hlf_chaincode_rs::logging::CaptureSink;
use hlf_chaincode_rs::{ChaincodeLanguage, Operation, OutcomeStatus, ToolConfig};

#[test]
fn install_defaults_to_golang() {
    let opts = CliOptions::try_parse_from([
        "hlf-chaincode",
        "install",
        "-n",
        "fabcar",
        "-v",
        "1.0",
        "-p",
        "/opt/gopath/src/fabcar",
        "-o",
        "org1",
        "-u",
        "admin",
    ])
    .unwrap();
    match opts.command {
        ChaincodeCommand::Install(args) => {
            assert_eq!(args.language, ChaincodeLanguage::Golang);
            assert_eq!(args.path, "/opt/gopath/src/fabcar");
            assert_eq!(args.admin, "admin");
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn rejects_unknown_language() {
    let result = CliOptions::try_parse_from([
        "hlf-chaincode",
        "install",
        "-n",
        "fabcar",
        "-v",
        "1.0",
        "-p",
        "/opt/fabcar",
        "-l",
        "python",
        "-o",
        "org1",
        "-u",
        "admin",
    ]);
    assert!(result.is_err());
}

#[test]
fn instantiate_args_are_optional() {
    let opts = CliOptions::try_parse_from([
        "hlf-chaincode",
        "instantiate",
        "-c",
        "mychannel",
        "-n",
        "fabcar",
        "-v",
        "1.0",
        "-o",
        "org1",
        "-u",
        "admin",
    ])
    .unwrap();
    match opts.command {
        ChaincodeCommand::Instantiate(args) => {
            assert_eq!(args.function, None);
            assert_eq!(args.args, None);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[tokio::test]
async fn invoke_command_runs_through_the_manager() -> Result<()> {
    let network = FakeNetwork::with_peers(1);
    network.state().contract_payload = b"done".to_vec();
    let (manager, _logs) = network.manager();

    let opts = CliOptions::try_parse_from([
        "hlf-chaincode",
        "invoke",
        "-c",
        "mychannel",
        "-n",
        "fabcar",
        "-f",
        "changeCarOwner",
        "-a",
        "CAR1",
        "Dave",
        "-u",
        "user1",
        "-o",
        "org1",
    ])?;
    let outcome = opts.command.run(&manager).await?;

    assert_eq!(outcome.operation, Operation::Invoke);
    assert_eq!(outcome.status, OutcomeStatus::Succeeded);
    assert_eq!(outcome.summary(), "response from chaincode: done");
    let state = network.state();
    assert_eq!(
        state.submitted,
        vec![(
            "changeCarOwner".to_string(),
            vec!["CAR1".to_string(), "Dave".to_string()]
        )]
    );
    assert_eq!(state.connects[0].0, "user1");
    Ok(())
}

const QUERY_ARGS: [&str; 13] = [
    "hlf-chaincode",
    "query",
    "-c",
    "mychannel",
    "-n",
    "fabcar",
    "-f",
    "queryCar",
    "-a",
    "CAR4",
    "-u",
    "user1",
    "-o",
];

#[tokio::test]
async fn configured_entry_point_reads_profiles_from_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("org1.json"), r#"{ "name": "org1-network" }"#)?;
    let config = ToolConfig {
        profiles_dir: Some(dir.path().to_path_buf()),
        ..ToolConfig::default()
    };
    let network = FakeNetwork::with_peers(1);
    network.state().contract_payload = b"{\"owner\":\"Adriana\"}".to_vec();
    let sink = Arc::new(CaptureSink::new());

    let args = QUERY_ARGS.iter().copied().chain(["org1"]);
    let outcome = run_with_config(args, &config, Arc::new(network.clone()), sink.clone()).await?;

    assert_eq!(outcome.operation, Operation::Query);
    assert_eq!(outcome.summary(), r#"response from chaincode: {"owner":"Adriana"}"#);
    let state = network.state();
    assert_eq!(state.connects, vec![("user1".to_string(), "org1".to_string())]);
    assert_eq!(
        state.evaluated,
        vec![("queryCar".to_string(), vec!["CAR4".to_string()])]
    );
    assert!(sink
        .messages()
        .iter()
        .any(|message| message.starts_with("response from chaincode")));
    Ok(())
}

#[tokio::test]
async fn configured_entry_point_fails_without_a_profile() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let config = ToolConfig {
        profiles_dir: Some(dir.path().to_path_buf()),
        ..ToolConfig::default()
    };
    let network = FakeNetwork::with_peers(1);

    let args = QUERY_ARGS.iter().copied().chain(["org7"]);
    let sink = Arc::new(CaptureSink::new());
    let err = run_with_config(args, &config, Arc::new(network.clone()), sink)
        .await
        .expect_err("unknown organization must fail");

    assert!(format!("{err:#}").contains("org7"));
    assert!(network.state().connects.is_empty());
    Ok(())
}
