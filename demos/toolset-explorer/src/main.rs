//! Explore the GitHub toolsets from a terminal.
//!
//! Configuration comes from the `GITHUB_*` environment variables. Requests go
//! to an offline echo client unless `--live` is passed.

mod echo;
mod stdio;

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use serde_json::{Value, json};
use toolset_config::ServerConfig;
use toolset_github::{Client, HttpConfig, HttpRemoteApi, default_toolset_group};
use toolset_session::ExposureBinder;
use toolset_session::control::ENABLE_TOOLSET;
use toolset_telemetry::init_tracing;
use tracing::info;

use crate::echo::EchoApi;

#[derive(Parser, Debug)]
#[command(name = "toolset-explorer", about = "Inspect and drive the GitHub toolsets")]
struct Cli {
    /// Toolset to enable before running the command. Repeatable.
    #[arg(long = "enable", value_name = "TOOLSET")]
    enable: Vec<String>,
    /// Call the configured GitHub API instead of echoing requests.
    #[arg(long)]
    live: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List toolsets and whether they are enabled.
    List,
    /// List the capabilities a new session would see.
    Tools,
    /// Enable a toolset through the control capability.
    Enable { toolset: String },
    /// Invoke a capability with JSON arguments.
    Call {
        name: String,
        #[arg(long, default_value = "{}")]
        args: String,
    },
    /// Serve one session as line-delimited JSON-RPC on stdin/stdout.
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = ServerConfig::from_env().context("failed to load configuration")?;
    init_tracing(&config.tracing)?;

    let binder = build(&cli, &config)?;
    let session = binder.connect();

    match cli.command {
        Command::List => {
            let listing = serde_json::to_string_pretty(&binder.group().list_toolsets())?;
            println!("{listing}");
        }
        Command::Tools => {
            for capability in session.capabilities() {
                println!(
                    "{:<32} {:<9} {}",
                    capability.name(),
                    capability.safety().to_string(),
                    capability.title().unwrap_or_default()
                );
            }
        }
        Command::Enable { toolset } => {
            let result = session
                .call(ENABLE_TOOLSET, json!({ "toolset": toolset }))
                .await?;
            println!("{}", result.content());
            println!("{} capabilities bound", session.bound_count());
        }
        Command::Call { name, args } => {
            let arguments: Value =
                serde_json::from_str(&args).context("--args must be a JSON object")?;
            let result = session.call(&name, arguments).await?;
            println!("{}", result.content());
            if result.is_error() {
                bail!("{name} returned an error result");
            }
        }
        Command::Serve => stdio::serve(session).await?,
    }
    Ok(())
}

fn build(cli: &Cli, config: &ServerConfig) -> Result<ExposureBinder> {
    let client: Client = if cli.live {
        let http = HttpConfig::new().with_base_url(&config.api_url)?;
        Arc::new(HttpRemoteApi::new(http)?)
    } else {
        Arc::new(EchoApi)
    };

    let group = default_toolset_group(&client, config.read_only)?;
    config.apply(&group)?;
    let binder = ExposureBinder::new(Arc::new(group))?;
    for name in &cli.enable {
        binder
            .enable_toolset(name)
            .with_context(|| format!("failed to enable toolset `{name}`"))?;
    }
    info!(
        live = cli.live,
        toolsets = binder.group().toolset_names().len(),
        "explorer ready"
    );
    Ok(binder)
}
