//! `zk-verify`: connects to a proof-exchange server, requests one
//! statement, and verifies the proof it gets back (spec.md §6).
//!
//! Exit codes: 0 success, 1 verification failure, 2 protocol/timeout
//! error, 3 bad usage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use privacyzk_core::config::ZkConfig;
use privacyzk_core::statements::{continuity, membership, unlinkability};
use privacyzk_core::wire::client::{ClientPolicy, ProofClient, StatementOutcome};
use privacyzk_core::wire::frames::{ProofRequest, StatementSelector};
use privacyzk_core::ZKProof;

/// Request and verify one statement's proof from a `zk-serve` peer.
#[derive(Parser, Debug)]
#[command(name = "zk-verify", version, about)]
struct Cli {
    /// Peer address to connect to, e.g. 127.0.0.1:4001.
    #[arg(long)]
    peer: SocketAddr,

    /// Which statement to request.
    #[arg(long, value_enum)]
    statement: StatementArg,

    /// Root of the asset store (unused by this client; kept for
    /// interface parity with `zk-serve` and the `analyze` front-end).
    #[arg(long)]
    assets_dir: Option<PathBuf>,

    /// Per-exchange timeout, in seconds.
    #[arg(long)]
    timeout: Option<u64>,

    /// Treat a downgraded (simulated) proof as a verification failure
    /// rather than accepting it with a fallback marker.
    #[arg(long, default_value_t = false)]
    require_real: bool,

    #[arg(long)]
    log_level: Option<String>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
enum StatementArg {
    Membership,
    Continuity,
    Unlinkability,
}

impl From<StatementArg> for StatementSelector {
    fn from(value: StatementArg) -> Self {
        match value {
            StatementArg::Membership => StatementSelector::Membership,
            StatementArg::Continuity => StatementSelector::Continuity,
            StatementArg::Unlinkability => StatementSelector::Unlinkability,
        }
    }
}

const EXIT_OK: i32 = 0;
const EXIT_VERIFY_FAILED: i32 = 1;
const EXIT_PROTOCOL_ERROR: i32 = 2;
const EXIT_BAD_USAGE: i32 = 3;

/// Validate argument combinations clap's own parser can't express (it
/// checks types and required-ness, not cross-field or filesystem
/// constraints). Returns a human-readable reason on failure.
fn validate_usage(cli: &Cli) -> std::result::Result<(), String> {
    if let Some(timeout) = cli.timeout {
        if timeout == 0 {
            return Err("--timeout must be greater than zero".into());
        }
    }
    if let Some(assets_dir) = &cli.assets_dir {
        if !assets_dir.is_dir() {
            return Err(format!("--assets-dir {} is not a directory", assets_dir.display()));
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Err(reason) = validate_usage(&cli) {
        eprintln!("zk-verify: bad usage: {reason}");
        std::process::exit(EXIT_BAD_USAGE);
    }

    let config = ZkConfig::resolve(
        cli.assets_dir,
        cli.log_level,
        cli.timeout.map(Duration::from_secs),
        privacyzk_core::config::ProveMode::Sigma,
    );

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&config.log_level))
        .init();

    let stream = tokio::net::TcpStream::connect(cli.peer)
        .await
        .context("connecting to proof-exchange peer")?;

    let request = ProofRequest {
        statement: cli.statement.into(),
        schema_version: 2,
        depth: 16,
        nonce: fresh_nonce(),
        deadline_ms: u32::try_from(config.zk_timeout.as_millis()).unwrap_or(u32::MAX),
    };

    let policy = ClientPolicy { total_timeout: config.zk_timeout, require_real: cli.require_real };

    let outcomes = match ProofClient::exchange(stream, request, policy).await {
        Ok(outcomes) => outcomes,
        Err(e) => {
            tracing::error!(error = %e, "proof-exchange failed");
            std::process::exit(EXIT_PROTOCOL_ERROR);
        }
    };

    let mut exit_code = EXIT_OK;
    for (tag, outcome) in outcomes {
        match outcome {
            StatementOutcome::Ok { proof, fallback } => {
                if fallback && cli.require_real {
                    println!("{tag}: FAIL(downgraded proof rejected by --require-real)");
                    exit_code = EXIT_VERIFY_FAILED;
                    continue;
                }
                match verify(&proof) {
                    Ok(()) => println!("{tag}: OK{}", if fallback { " (fallback)" } else { "" }),
                    Err(e) => {
                        println!("{tag}: FAIL({e})");
                        exit_code = EXIT_VERIFY_FAILED;
                    }
                }
            }
            StatementOutcome::Failed(reason) => {
                println!("{tag}: FAIL({reason})");
                exit_code = EXIT_VERIFY_FAILED;
            }
            StatementOutcome::Unavailable => {
                println!("{tag}: UNAVAILABLE");
            }
        }
    }

    std::process::exit(exit_code);
}

fn verify(proof: &ZKProof) -> Result<(), privacyzk_core::ZkError> {
    match proof {
        ZKProof::Membership(p) => membership::verify(p),
        ZKProof::Unlinkability(p) => unlinkability::verify(p),
        ZKProof::Continuity(p) => continuity::verify(p),
    }
}

fn fresh_nonce() -> [u8; 16] {
    use rand_core::RngCore;
    let mut nonce = [0u8; 16];
    privacyzk_core::curve::ForkSafeRng::new().fill_bytes(&mut nonce);
    nonce
}
