//! Cryptographic privacy-proof core: Pedersen commitments, two flavours
//! of Sigma proof, a Merkle accumulator, a statement registry, and a
//! framed peer-to-peer proof-exchange protocol, all on secp256k1.
//!
//! This crate exposes exactly two seams for external callers: the
//! [`statements::ProofBackend`] trait (generate/verify per statement) and
//! the [`wire`] client/server pair that carries proofs over a network
//! connection. Everything else — curve arithmetic, commitments, the two
//! Sigma protocols, the Merkle tree, the registry, the asset loader — is
//! internal plumbing those two seams are built from.

pub mod assets;
pub mod chaum_pedersen;
pub mod commitment;
pub mod config;
pub mod context;
pub mod curve;
pub mod error;
pub mod identity;
pub mod merkle;
pub mod proof;
pub mod registry;
pub mod schnorr;
pub mod statements;
pub mod transcript;
pub mod wire;

pub use error::{ZkError, ZkResult};
pub use proof::ZKProof;
pub use statements::{ProofBackend, ProveRequest, SigmaBackend};
