//! Session unlinkability statement (`session_unlinkability_v1`).
//!
//! Proves knowledge of the opening of a commitment to a (hidden) identity
//! scalar, bound to both the session context and a derived session tag.
//! Two sessions run by the same identity with independently sampled
//! blinding factors yield unlinkable `(commitment, tag)` pairs — that
//! freshness of the blinding factor per session is the caller's
//! responsibility, not something this module can enforce.

use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::commitment::{commit_with_randomness, Commitment};
use crate::context::ProofContext;
use crate::curve::{point_from_bytes, point_to_bytes, scalar_from_bytes, scalar_to_bytes};
use crate::error::{ZkError, ZkResult};
use crate::registry::UNLINKABILITY_V1;
use crate::schnorr::{self, SchnorrProof};

/// The public inputs a session unlinkability proof carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnlinkabilityPublicInputs {
    pub version: u32,
    pub tag: [u8; 32],
    pub commitment: [u8; 33],
    pub ctx_hash: [u8; 32],
}

/// A complete, self-contained session unlinkability proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnlinkabilityProof {
    pub public_inputs: UnlinkabilityPublicInputs,
    pub announcement: [u8; 33],
    pub challenge: [u8; 32],
    pub z_v: [u8; 32],
    pub z_b: [u8; 32],
}

/// The prover's secret witness: the identity scalar and this session's
/// blinding factor.
#[derive(Clone)]
pub struct UnlinkabilityWitness {
    pub id: Scalar,
    pub randomness: Scalar,
}

impl Drop for UnlinkabilityWitness {
    fn drop(&mut self) {
        self.id.zeroize();
        self.randomness.zeroize();
    }
}

fn compute_tag(ctx_hash: &[u8; 32], commitment_bytes: &[u8; 33]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(UNLINKABILITY_V1.domain_separator);
    hasher.update(ctx_hash);
    hasher.update(commitment_bytes);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// The Schnorr PoK in this statement is bound to both the context and the
/// derived tag: fold them into a single 32-byte binding value so the
/// generic Schnorr primitive doesn't need a second binding slot.
fn binding_value(ctx_hash: &[u8; 32], tag: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ctx_hash);
    hasher.update(tag);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Produce a session unlinkability proof.
pub fn prove<R: RngCore + CryptoRng>(
    witness: &UnlinkabilityWitness,
    context: &ProofContext,
    rng: &mut R,
) -> ZkResult<UnlinkabilityProof> {
    let commitment = commit_with_randomness(&witness.id, &witness.randomness)?;
    let commitment_bytes = point_to_bytes(&commitment.point())?;

    let ctx_hash = context.hash();
    let tag = compute_tag(&ctx_hash, &commitment_bytes);
    let binding = binding_value(&ctx_hash, &tag);

    let pok = schnorr::prove(
        UNLINKABILITY_V1.domain_separator,
        &commitment,
        &witness.id,
        &witness.randomness,
        &binding,
        rng,
    )?;

    Ok(UnlinkabilityProof {
        public_inputs: UnlinkabilityPublicInputs {
            version: UNLINKABILITY_V1.version,
            tag,
            commitment: commitment_bytes,
            ctx_hash,
        },
        announcement: point_to_bytes(&pok.announcement)?,
        challenge: scalar_to_bytes(&pok.challenge),
        z_v: scalar_to_bytes(&pok.z_v),
        z_b: scalar_to_bytes(&pok.z_b),
    })
}

/// Verify a session unlinkability proof: registry metadata, the session
/// tag, then the Schnorr PoK of opening.
pub fn verify(proof: &UnlinkabilityProof) -> ZkResult<()> {
    if proof.public_inputs.version != UNLINKABILITY_V1.version {
        return Err(ZkError::BadMetadata(format!(
            "unsupported unlinkability version {}",
            proof.public_inputs.version
        )));
    }

    let recomputed_tag = compute_tag(&proof.public_inputs.ctx_hash, &proof.public_inputs.commitment);
    if recomputed_tag != proof.public_inputs.tag {
        return Err(ZkError::TagMismatch);
    }

    let binding = binding_value(&proof.public_inputs.ctx_hash, &proof.public_inputs.tag);
    let commitment = Commitment::from_point(point_from_bytes(&proof.public_inputs.commitment)?)?;
    let pok = SchnorrProof {
        announcement: point_from_bytes(&proof.announcement)?,
        challenge: scalar_from_bytes(&proof.challenge)?,
        z_v: scalar_from_bytes(&proof.z_v)?,
        z_b: scalar_from_bytes(&proof.z_b)?,
    };

    schnorr::verify(UNLINKABILITY_V1.domain_separator, &commitment, &pok, &binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{random_nonzero_scalar, ForkSafeRng};

    #[test]
    fn honest_proof_verifies() {
        let mut rng = ForkSafeRng::new();
        let witness = UnlinkabilityWitness {
            id: random_nonzero_scalar(&mut rng),
            randomness: random_nonzero_scalar(&mut rng),
        };
        let ctx = ProofContext::new("peer-unlinkability-test", "session-5", 1_700_000_000);
        let proof = prove(&witness, &ctx, &mut rng).unwrap();
        assert!(verify(&proof).is_ok());
    }

    #[test]
    fn same_identity_two_contexts_yield_different_tags() {
        let mut rng = ForkSafeRng::new();
        let id = random_nonzero_scalar(&mut rng);

        let witness_a = UnlinkabilityWitness { id, randomness: random_nonzero_scalar(&mut rng) };
        let ctx_a = ProofContext::new("peer-unlinkability-test", "session-1", 1_700_000_000)
            .with_metadata("session", b"a".to_vec());
        let proof_a = prove(&witness_a, &ctx_a, &mut rng).unwrap();

        let witness_b = UnlinkabilityWitness { id, randomness: random_nonzero_scalar(&mut rng) };
        let ctx_b = ProofContext::new("peer-unlinkability-test", "session-1", 1_700_000_000)
            .with_metadata("session", b"b".to_vec());
        let proof_b = prove(&witness_b, &ctx_b, &mut rng).unwrap();

        assert_ne!(proof_a.public_inputs.tag, proof_b.public_inputs.tag);
        assert!(verify(&proof_a).is_ok());
        assert!(verify(&proof_b).is_ok());
    }

    #[test]
    fn swapping_contexts_between_proofs_fails_verification() {
        let mut rng = ForkSafeRng::new();
        let id = random_nonzero_scalar(&mut rng);

        let witness_a = UnlinkabilityWitness { id, randomness: random_nonzero_scalar(&mut rng) };
        let ctx_a = ProofContext::new("peer-unlinkability-test", "session-1", 1_700_000_000)
            .with_metadata("session", b"a".to_vec());
        let mut proof_a = prove(&witness_a, &ctx_a, &mut rng).unwrap();

        let witness_b = UnlinkabilityWitness { id, randomness: random_nonzero_scalar(&mut rng) };
        let ctx_b = ProofContext::new("peer-unlinkability-test", "session-1", 1_700_000_000)
            .with_metadata("session", b"b".to_vec());
        let proof_b = prove(&witness_b, &ctx_b, &mut rng).unwrap();

        proof_a.public_inputs.ctx_hash = proof_b.public_inputs.ctx_hash;
        assert!(verify(&proof_a).is_err());
    }

    #[test]
    fn tampered_tag_rejected() {
        let mut rng = ForkSafeRng::new();
        let witness = UnlinkabilityWitness {
            id: random_nonzero_scalar(&mut rng),
            randomness: random_nonzero_scalar(&mut rng),
        };
        let ctx = ProofContext::new("peer-unlinkability-test", "session-5", 1_700_000_000);
        let mut proof = prove(&witness, &ctx, &mut rng).unwrap();
        proof.public_inputs.tag[0] ^= 0xFF;
        assert!(matches!(verify(&proof), Err(ZkError::TagMismatch)));
    }
}
