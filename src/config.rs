//! Runtime configuration for the proof-exchange client and server.
//!
//! Resolved from CLI flags with environment overrides applied when the
//! corresponding flag was left at its default, matching the environment
//! surface in spec.md §6 (`ASSETS_DIR`, `LOG_LEVEL`, `ZK_TIMEOUT`).

use std::path::PathBuf;
use std::time::Duration;

/// Where the server's proving work comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProveMode {
    /// Load pre-generated verification keys / public inputs / proof bytes
    /// from the asset store and forward them verbatim.
    Real,
    /// Run the in-process Sigma prover for each requested statement.
    Sigma,
}

impl std::str::FromStr for ProveMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "real" => Ok(ProveMode::Real),
            "sigma" => Ok(ProveMode::Sigma),
            other => Err(format!("unknown prove-mode: {other}")),
        }
    }
}

/// The default asset store root, matching the canonical subtree in
/// spec.md §6.
pub const DEFAULT_ASSETS_DIR: &str = "privacy_circuits/params/";

/// Default overall client timeout, per spec.md §4.9.
pub const DEFAULT_ZK_TIMEOUT: Duration = Duration::from_secs(120);

/// Resolved configuration for a `zk-serve` or `zk-verify` invocation.
#[derive(Debug, Clone)]
pub struct ZkConfig {
    pub assets_dir: PathBuf,
    pub log_level: String,
    pub zk_timeout: Duration,
    pub prove_mode: ProveMode,
}

impl ZkConfig {
    /// Build a config from already-parsed CLI values, applying
    /// `ASSETS_DIR` / `LOG_LEVEL` / `ZK_TIMEOUT` environment overrides
    /// wherever the caller passed `None` (flag not given on the command
    /// line).
    pub fn resolve(
        assets_dir_flag: Option<PathBuf>,
        log_level_flag: Option<String>,
        zk_timeout_flag: Option<Duration>,
        prove_mode: ProveMode,
    ) -> ZkConfig {
        let assets_dir = assets_dir_flag
            .or_else(|| std::env::var("ASSETS_DIR").ok().map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ASSETS_DIR));

        let log_level = log_level_flag
            .or_else(|| std::env::var("LOG_LEVEL").ok())
            .unwrap_or_else(|| "info".to_string());

        let zk_timeout = zk_timeout_flag
            .or_else(|| {
                std::env::var("ZK_TIMEOUT")
                    .ok()
                    .and_then(|s| s.parse::<u64>().ok())
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_ZK_TIMEOUT);

        ZkConfig { assets_dir, log_level, zk_timeout, prove_mode }
    }
}
