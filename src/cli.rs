use std::ffi::OsString;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};

use crate::config::ToolConfig;
use crate::descriptor::{ChaincodeDescriptor, ChaincodeLanguage};
use crate::gateway::GatewayConnector;
use crate::lifecycle::{ChaincodeCall, ChaincodeLifecycleManager, InstantiateParams};
use crate::logging::{LogSink, StdioSink};
use crate::outcome::Outcome;
use crate::profile::FileProfileStore;

#[derive(Parser, Debug)]
#[command(name = "hlf-chaincode")]
#[command(about = "Install, instantiate, invoke and query chaincode")]
pub struct CliOptions {
    #[command(subcommand)]
    pub command: ChaincodeCommand,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ChaincodeCommand {
    /// Install chaincode on every peer of an organization
    Install(InstallArgs),
    /// Instantiate installed chaincode on a channel
    Instantiate(InstantiateArgs),
    /// Submit a transaction to chaincode
    Invoke(CallArgs),
    /// Evaluate a read-only chaincode function
    Query(CallArgs),
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InstallArgs {
    /// Chaincode name
    #[arg(long = "name", short = 'n')]
    pub name: String,

    /// Chaincode version
    #[arg(long = "version", short = 'v')]
    pub version: String,

    /// Absolute path to the chaincode sources
    #[arg(long = "path", short = 'p')]
    pub path: String,

    /// Chaincode language: golang, node, java or car
    #[arg(long = "lang", short = 'l', default_value = "golang")]
    pub language: ChaincodeLanguage,

    /// Peer organization
    #[arg(long = "org", short = 'o')]
    pub organization: String,

    /// Peer admin identity
    #[arg(long = "user", short = 'u')]
    pub admin: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct InstantiateArgs {
    #[arg(long = "channel", short = 'c')]
    pub channel: String,

    #[arg(long = "name", short = 'n')]
    pub name: String,

    #[arg(long = "version", short = 'v')]
    pub version: String,

    /// Init function
    #[arg(long = "func", short = 'f')]
    pub function: Option<String>,

    /// Init function arguments
    #[arg(long = "args", short = 'a', num_args = 1..)]
    pub args: Option<Vec<String>>,

    #[arg(long = "org", short = 'o')]
    pub organization: String,

    #[arg(long = "user", short = 'u')]
    pub admin: String,
}

#[derive(Args, Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    #[arg(long = "channel", short = 'c')]
    pub channel: String,

    #[arg(long = "name", short = 'n')]
    pub name: String,

    #[arg(long = "func", short = 'f')]
    pub function: String,

    #[arg(long = "args", short = 'a', num_args = 1..)]
    pub args: Vec<String>,

    /// Client identity
    #[arg(long = "user", short = 'u')]
    pub user: String,

    #[arg(long = "org", short = 'o')]
    pub organization: String,
}

impl CallArgs {
    fn call(&self) -> ChaincodeCall {
        ChaincodeCall {
            channel: self.channel.clone(),
            chaincode: self.name.clone(),
            function: self.function.clone(),
            args: self.args.clone(),
        }
    }
}

impl ChaincodeCommand {
    pub async fn run(&self, manager: &ChaincodeLifecycleManager) -> Result<Outcome> {
        match self {
            Self::Install(args) => {
                let descriptor = ChaincodeDescriptor::new(
                    &args.name,
                    &args.version,
                    &args.path,
                    args.language,
                );
                manager
                    .install(&descriptor, &args.organization, &args.admin)
                    .await
            }
            Self::Instantiate(args) => {
                let params = InstantiateParams {
                    channel: args.channel.clone(),
                    name: args.name.clone(),
                    version: args.version.clone(),
                    function: args.function.clone(),
                    args: args.args.clone(),
                };
                manager
                    .instantiate(&params, &args.organization, &args.admin)
                    .await
            }
            Self::Invoke(args) => {
                manager
                    .invoke(&args.call(), &args.user, &args.organization)
                    .await
            }
            Self::Query(args) => {
                manager
                    .query(&args.call(), &args.user, &args.organization)
                    .await
            }
        }
    }
}

/// Entry point for a binary: discovers the tool configuration, reads
/// connection profiles from the configured directory and logs to stdio.
pub async fn run_cli(connector: Arc<dyn GatewayConnector>) -> Result<Outcome> {
    let config = ToolConfig::discover()?;
    run_with_config(std::env::args_os(), &config, connector, Arc::new(StdioSink)).await
}

pub async fn run_with_config<I, T>(
    args: I,
    config: &ToolConfig,
    connector: Arc<dyn GatewayConnector>,
    sink: Arc<dyn LogSink>,
) -> Result<Outcome>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let options = CliOptions::try_parse_from(args)?;
    let profiles_dir = config
        .resolved_profiles_dir()
        .ok_or_else(|| anyhow!("no connection profile directory configured"))?;
    let manager = ChaincodeLifecycleManager::from_config(
        config,
        Arc::new(FileProfileStore::new(profiles_dir)),
        connector,
        sink,
    );
    options.command.run(&manager).await
}
