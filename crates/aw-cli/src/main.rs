//! Azure Warden CLI
//!
//! Enumerates an Azure AD / ARM tenant and writes a stream of typed
//! records for graph ingestion.

use std::path::PathBuf;

use anyhow::Result;
use aw_observability::{init_logging_with_config, LoggingConfig};
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod sink;

use commands::ListTarget;

#[derive(Parser)]
#[command(name = "azure-warden")]
#[command(version)]
#[command(about = "Collects Azure tenant objects for graph ingestion", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,

    /// Output file (stdout when omitted)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Directory (tenant) id
    #[arg(long, env = "AZURE_TENANT_ID")]
    tenant_id: Option<String>,

    /// Application (client) id
    #[arg(long, env = "AZURE_CLIENT_ID")]
    client_id: Option<String>,

    /// Client secret for the client-credentials grant
    #[arg(long, env = "AZURE_CLIENT_SECRET", hide_env_values = true)]
    client_secret: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists Azure objects
    List {
        #[command(subcommand)]
        target: Option<ListTarget>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let logging = if cli.json_logs {
        LoggingConfig::json()
    } else if cli.verbose {
        LoggingConfig::verbose()
    } else {
        LoggingConfig::default()
    };
    init_logging_with_config(logging);

    let settings = config::resolve(
        cli.config.as_deref(),
        cli.tenant_id,
        cli.client_id,
        cli.client_secret,
        cli.output,
    )?;

    match cli.command {
        Commands::List { target } => commands::run_list(settings, target).await,
    }
}
