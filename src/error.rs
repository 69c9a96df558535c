//! Error taxonomy for the privacy-proof core.
//!
//! Every failure mode named in the statement backends, the wire protocol
//! and the asset loader funnels into [`ZkError`]. Cryptographic failures are
//! never retried by this crate; callers see a structured variant plus the
//! failing check, never a partial result.

use thiserror::Error;

/// Errors produced by curve/field/commitment/proof operations and the
/// surrounding protocol plumbing.
#[derive(Debug, Error)]
pub enum ZkError {
    /// A scalar or point failed to decode, or a CBOR/wire value had the
    /// wrong size or shape.
    #[error("bad encoding: {0}")]
    BadEncoding(String),

    /// A point was off-curve, was the identity where forbidden, or decoded
    /// outside the expected subgroup.
    #[error("invalid point: {0}")]
    InvalidPoint(String),

    /// The statement type/version pair is unknown, or a required public
    /// input key is missing or malformed.
    #[error("bad statement metadata: {0}")]
    BadMetadata(String),

    /// A Merkle path had the wrong length, or the recomputed root did not
    /// match the advertised root.
    #[error("bad merkle path: {0}")]
    BadMerklePath(String),

    /// A Schnorr or Chaum-Pedersen verification equation, or the
    /// constant-time challenge comparison, failed.
    #[error("proof of knowledge rejected")]
    PoKRejected,

    /// The recomputed session tag did not match the proof's claimed tag.
    #[error("session tag mismatch")]
    TagMismatch,

    /// An on-disk asset was missing, wrongly sized, or the wrong schema.
    #[error("bad asset: {0}")]
    BadAsset(String),

    /// The requested asset file does not exist. Not a fatal error: callers
    /// treat this as `NOT_AVAILABLE`, not `FAILED`.
    #[error("asset not available: {0}")]
    NotAvailable(String),

    /// A deadline elapsed before the operation completed.
    #[error("operation timed out")]
    Timeout,

    /// The peer closed the stream mid-exchange.
    #[error("peer closed connection")]
    PeerClosed,
}

/// Convenience alias used throughout the core.
pub type ZkResult<T> = Result<T, ZkError>;
