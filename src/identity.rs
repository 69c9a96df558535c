//! Peer identity to scalar derivation.
//!
//! Statements that need to bind a proof to "this peer" without revealing
//! the peer id in the clear represent the peer as a scalar derived from
//! its raw id bytes under a fixed domain tag, then commit to that scalar
//! like any other committed value.

use k256::Scalar;
use sha2::{Digest, Sha256};

use crate::curve::scalar_from_transcript;

const DOMAIN: &[u8] = b"LIBP2P_PRIVACY_PEER_ID_SCALAR_V1";

/// Derive the scalar representation of a peer id. Deterministic: the same
/// peer id always maps to the same scalar, under any process.
pub fn peer_id_to_scalar(peer_id: &[u8]) -> Scalar {
    let mut hasher = Sha256::new();

    let domain_len = u32::try_from(DOMAIN.len()).expect("domain tag too long");
    hasher.update(domain_len.to_be_bytes());
    hasher.update(DOMAIN);

    let id_len = u32::try_from(peer_id.len()).expect("peer id exceeds u32 length");
    hasher.update(id_len.to_be_bytes());
    hasher.update(peer_id);

    scalar_from_transcript(hasher)
}
