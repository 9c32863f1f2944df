#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]

//! Claim Topics CLI
//!
//! A terminal front end for the synchronization controller: it reads the
//! effective configuration, points a controller at the registry, forwards
//! one intent and renders the resulting snapshot.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use adapters::{
    ContractGateway, FixedSigner, GatewayConfig, GatewayError, IdentityResolver, NodeAccounts,
    RegistryGateway,
};
use clap::{Parser, Subcommand};
use config::{Config, ConfigError};
use controller::{Rejected, TopicsController};
use http::HttpTransport;
use logging::LoggingError;
use thiserror::Error;
use transport::{DynTransport, TransportError};
use types::{Address, Topic, ViewState};

/// Well-known topic labels.
pub mod labels;
/// Removal confirmation prompt.
pub mod prompt;
/// Snapshot rendering.
pub mod render;

/// Errors surfaced to the user with a non-zero exit status.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Logging could not be initialized.
    #[error(transparent)]
    Logging(#[from] LoggingError),
    /// The transport could not be built.
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// A direct registry read failed.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    /// No registry address from flags, environment or config file.
    #[error("No registry address configured; pass --registry or set {}", config::ENV_REGISTRY)]
    NoRegistry,
    /// The controller refused the intent.
    #[error(transparent)]
    Rejected(#[from] Rejected),
    /// The intent ran and ended in the `Failed` phase.
    #[error("{0}")]
    Failed(String),
    /// Terminal I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Command-line interface for the claim topics client.
#[derive(Parser, Debug)]
#[command(
    name = "claim-topics",
    about = "View and manage the claim topics of an on-chain registry",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    cmd: Commands,
    /// Configuration file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Registry contract address
    #[arg(long, global = true)]
    registry: Option<Address>,
    /// JSON-RPC endpoint of the node or wallet
    #[arg(long, global = true)]
    rpc_url: Option<String>,
    /// Account that signs mutations (defaults to the node's first account)
    #[arg(long, global = true)]
    from: Option<Address>,
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true)]
    log_level: Option<String>,
    /// Print the snapshot as JSON
    #[arg(long, global = true)]
    json: bool,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the registered claim topics
    List,
    /// Print how many claim topics are registered
    Count,
    /// Register a claim topic (owner only)
    Add {
        /// Topic identifier
        id: Topic,
    },
    /// Unregister a claim topic (owner only)
    Remove {
        /// Topic identifier
        id: Topic,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

impl Cli {
    /// Effective configuration: file, then environment, then flags.
    fn resolve_config(&self) -> Result<Config, CliError> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(registry) = self.registry {
            config.registry.address = Some(registry);
        }
        if let Some(url) = &self.rpc_url {
            config.rpc.url = url.clone();
        }
        if let Some(from) = self.from {
            config.signer.from = Some(from);
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
        Ok(config)
    }
}

type Controller = TopicsController<ContractGateway, Arc<dyn IdentityResolver>>;

/// Runs one command to completion.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let config = cli.resolve_config()?;
    logging::init(&config.logging.level, config.logging.file.as_deref())?;
    let registry = config.registry.address.ok_or(CliError::NoRegistry)?;

    let transport: DynTransport = Arc::new(HttpTransport::from_config(&config.rpc.transport())?);
    let gateway = ContractGateway::new(
        transport.clone(),
        GatewayConfig {
            poll_interval: config.rpc.poll_interval(),
            confirmation_timeout: config.rpc.confirmation_timeout(),
        },
    );
    let identity: Arc<dyn IdentityResolver> = match config.signer.from {
        Some(from) => Arc::new(FixedSigner(from)),
        None => Arc::new(NodeAccounts::new(transport)),
    };
    tracing::debug!(%registry, endpoint = gateway.endpoint(), "starting");

    if let Commands::Count = cli.cmd {
        let count = gateway.topic_count(&registry).await?;
        if cli.json {
            println!("{}", serde_json::json!({ "registry": registry, "count": count }));
        } else {
            println!("{}", count);
        }
        return Ok(());
    }

    let controller: Controller = TopicsController::with_registry(gateway, identity, registry);
    let view = controller.refresh().await?;
    let view = match cli.cmd {
        Commands::Count | Commands::List => view,
        _ if view.is_failed() => view,
        Commands::Add { id } => controller.add_topic(id).await?,
        Commands::Remove { id, yes } => {
            if !yes && view.topics.contains(id) && view.authorized {
                let question = format!("Remove topic {} ({})?", id, labels::label(id));
                let confirmed =
                    prompt::confirm(&question, &mut io::stdin().lock(), &mut io::stderr())?;
                if !confirmed {
                    eprintln!("Aborted.");
                    return Ok(());
                }
            }
            controller.remove_topic(id).await?
        }
    };

    show(&view, cli.json);
    if view.is_failed() {
        let message = view.message.unwrap_or_else(|| "Operation failed".to_string());
        return Err(CliError::Failed(message));
    }
    Ok(())
}

fn show(view: &ViewState, json: bool) {
    if json {
        println!("{:#}", render::render_json(view));
    } else {
        print!("{}", render::render_text(view));
    }
}
