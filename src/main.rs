//! Casino server binary.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use bjcasino::config::DEFAULT_PORT;
use bjcasino::{Auth, ServerConfig, server};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Host interface to bind (default: localhost).
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Listen on all interfaces (overrides --host).
    #[arg(long)]
    lan: bool,

    /// SQLite database file.
    #[arg(long, default_value = "casino.db")]
    database: PathBuf,

    /// Keep all data in memory; nothing survives a restart.
    #[arg(long, conflicts_with = "database")]
    in_memory: bool,

    /// Drop connections idle for this many seconds.
    #[arg(long, default_value_t = 300)]
    read_timeout_secs: u64,

    /// Purge expired sessions every this many seconds.
    #[arg(long, default_value_t = 60)]
    sweep_interval_secs: u64,
}

fn build_config(args: &Args) -> ServerConfig {
    let host = if args.lan {
        IpAddr::V4(Ipv4Addr::UNSPECIFIED)
    } else {
        args.host
    };

    ServerConfig::default()
        .with_addr(SocketAddr::new(host, args.port))
        .with_database((!args.in_memory).then(|| args.database.clone()))
        .with_read_timeout(Duration::from_secs(args.read_timeout_secs))
        .with_sweep_interval(Duration::from_secs(args.sweep_interval_secs))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = build_config(&args);

    let vault = server::open_vault(&config).context("failed to open database")?;
    let auth = Auth::new(vault, config.session_ttl);
    let listener = TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tokio::select! {
        res = server::run(listener, auth, &config) => res.context("server stopped")?,
        _ = tokio::signal::ctrl_c() => info!("shutting down"),
    }

    Ok(())
}
