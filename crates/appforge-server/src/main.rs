//! appforge - generate, publish and report web applications
//!
//! Usage:
//!   appforge serve                 Run the HTTP service
//!   appforge init-config [path]    Write the default configuration file

use anyhow::{Context, Result};
use appforge_clients::{model_api_key, provider_token};
use appforge_core::config::DEFAULT_CONFIG_FILE;
use appforge_core::AppforgeConfig;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "appforge")]
#[command(author, version, about = "Generate, publish and report web applications")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP service
    Serve {
        /// Bind host (overrides the configuration file)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides the configuration file)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Write the default configuration file
    InitConfig {
        /// Destination (defaults to the --config path)
        path: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { host, port } => cmd_serve(&cli.config, host, port).await,
        Commands::InitConfig { path } => cmd_init_config(path.unwrap_or(cli.config)),
    }
}

async fn cmd_serve(config_path: &Path, host: Option<String>, port: Option<u16>) -> Result<()> {
    let mut config = AppforgeConfig::load_or_default(config_path)
        .with_context(|| format!("Failed to load {}", config_path.display()))?;
    if let Some(host) = host {
        config.server.host = host;
    }
    if let Some(port) = port {
        config.server.port = port;
    }

    let token = provider_token(&config.publisher.token_env)
        .context("Repository provider token is required")?;
    let model_key = model_api_key(&config.generator.api_key_env);

    let services = appforge_server::wire(&config, token, model_key);
    let addr = config.bind_addr();
    info!("Starting appforge {} on {}", env!("CARGO_PKG_VERSION"), addr);

    appforge_server::serve(services.state, &addr, shutdown_signal()).await?;

    services.notifier.shutdown();
    info!("Shutdown complete");
    Ok(())
}

fn cmd_init_config(path: PathBuf) -> Result<()> {
    AppforgeConfig::write_default(&path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("Wrote default configuration to {}", path.display());
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
