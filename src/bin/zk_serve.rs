//! `zk-serve`: stands up the proof-exchange server from spec.md §6.
//!
//! Exit codes: 0 clean shutdown, 2 server/transport error, 3 bad usage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;

use privacyzk_core::config::{ProveMode, ZkConfig};
use privacyzk_core::wire::server::ProofServer;

/// Serve anonymity-set membership, identity continuity and session
/// unlinkability proofs over `/privacyzk/1.0.0`.
#[derive(Parser, Debug)]
#[command(name = "zk-serve", version, about)]
struct Cli {
    /// Address to listen on, e.g. 127.0.0.1:4001. The spec's "host's
    /// default framed stream type" is a TCP socket in this demo.
    #[arg(long)]
    listen_addr: SocketAddr,

    /// Whether to forward pre-generated assets verbatim or run the
    /// in-process Sigma prover.
    #[arg(long, value_enum, default_value = "sigma")]
    prove_mode: ProveModeArg,

    /// Root of the asset store, used only in `--prove-mode real`.
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Overrides `LOG_LEVEL` for this process.
    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum ProveModeArg {
    Real,
    Sigma,
}

impl From<ProveModeArg> for ProveMode {
    fn from(value: ProveModeArg) -> Self {
        match value {
            ProveModeArg::Real => ProveMode::Real,
            ProveModeArg::Sigma => ProveMode::Sigma,
        }
    }
}

const EXIT_SERVER_ERROR: i32 = 2;
const EXIT_BAD_USAGE: i32 = 3;

/// Validate argument combinations clap's own parser can't express: a real
/// asset store is required in `--prove-mode real`, and if given at all it
/// must actually exist.
fn validate_usage(cli: &Cli) -> std::result::Result<(), String> {
    match (&cli.prove_mode, &cli.assets_dir) {
        (ProveModeArg::Real, None) => {
            return Err("--prove-mode real requires --assets-dir".into());
        }
        (_, Some(assets_dir)) if !assets_dir.is_dir() => {
            return Err(format!("--assets-dir {} is not a directory", assets_dir.display()));
        }
        _ => {}
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(reason) = validate_usage(&cli) {
        eprintln!("zk-serve: bad usage: {reason}");
        std::process::exit(EXIT_BAD_USAGE);
    }

    let config = ZkConfig::resolve(cli.assets_dir, cli.log_level, None, cli.prove_mode.into());

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    tracing::info!(listen_addr = %cli.listen_addr, prove_mode = ?config.prove_mode, assets_dir = %config.assets_dir.display(), "starting zk-serve");

    let server = Arc::new(ProofServer::new(config.assets_dir, config.prove_mode));
    if let Err(e) = server.listen(cli.listen_addr).await {
        tracing::error!(error = %e, "proof-exchange server exited");
        std::process::exit(EXIT_SERVER_ERROR);
    }

    Ok(())
}
