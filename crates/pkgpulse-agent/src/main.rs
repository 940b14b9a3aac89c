#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Binary entry point for the pkgpulse A2A agent.

use clap::Parser;
use miette::{IntoDiagnostic, Result};
use pkgpulse_agent::{logging, serve, AgentHandler, InMemoryConversations};
use pkgpulse_core::{Analyzer, OsvClient, RegistryClient};
use std::net::SocketAddr;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "pkgpulse")]
#[command(author, version, about = "Package health monitor agent speaking the A2A protocol", long_about = None)]
struct Cli {
    /// Host to bind
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Increase logging verbosity (-v for DEBUG, -vv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Emit JSON formatted logs (stable, machine-readable)
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.json);

    let registry = RegistryClient::from_defaults().into_diagnostic()?;
    let advisories = OsvClient::from_defaults().into_diagnostic()?;
    let analyzer = Analyzer::new(Arc::new(registry), Arc::new(advisories));
    let handler = Arc::new(AgentHandler::new(
        analyzer,
        Arc::new(InMemoryConversations::new()),
    ));

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .into_diagnostic()?;

    serve(handler, addr).await.into_diagnostic()?;

    Ok(())
}
