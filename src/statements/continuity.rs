//! Identity continuity statement (`identity_continuity_v1`).
//!
//! Proves that two commitments are both openings of the same hidden
//! identity scalar, without revealing the identity or linking either
//! commitment to a public handle. Built directly on the Chaum-Pedersen
//! equality proof.

use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::chaum_pedersen::{self, EqualityProof};
use crate::commitment::{commit_with_randomness, Commitment};
use crate::context::ProofContext;
use crate::curve::{point_from_bytes, point_to_bytes, scalar_from_bytes, scalar_to_bytes};
use crate::error::{ZkError, ZkResult};
use crate::registry::CONTINUITY_V1;

/// The public inputs an identity continuity proof carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContinuityPublicInputs {
    pub version: u32,
    pub commitment_1: [u8; 33],
    pub commitment_2: [u8; 33],
    pub ctx_hash: [u8; 32],
}

/// A complete, self-contained identity continuity proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContinuityProof {
    pub public_inputs: ContinuityPublicInputs,
    pub a1: [u8; 33],
    pub a2: [u8; 33],
    pub challenge: [u8; 32],
    pub z_id: [u8; 32],
    pub z_1: [u8; 32],
    pub z_2: [u8; 32],
}

/// The prover's secret witness: the shared identity scalar and each
/// commitment's own blinding factor.
#[derive(Clone)]
pub struct ContinuityWitness {
    pub id: Scalar,
    pub r1: Scalar,
    pub r2: Scalar,
}

impl Drop for ContinuityWitness {
    fn drop(&mut self) {
        self.id.zeroize();
        self.r1.zeroize();
        self.r2.zeroize();
    }
}

/// Produce an identity continuity proof.
pub fn prove<R: RngCore + CryptoRng>(
    witness: &ContinuityWitness,
    context: &ProofContext,
    rng: &mut R,
) -> ZkResult<ContinuityProof> {
    let c1 = commit_with_randomness(&witness.id, &witness.r1)?;
    let c2 = commit_with_randomness(&witness.id, &witness.r2)?;

    let ctx_hash = context.hash();
    let eq = chaum_pedersen::prove(
        CONTINUITY_V1.domain_separator,
        &c1,
        &c2,
        &witness.id,
        &witness.r1,
        &witness.r2,
        &ctx_hash,
        rng,
    )?;

    Ok(ContinuityProof {
        public_inputs: ContinuityPublicInputs {
            version: CONTINUITY_V1.version,
            commitment_1: point_to_bytes(&c1.point())?,
            commitment_2: point_to_bytes(&c2.point())?,
            ctx_hash,
        },
        a1: point_to_bytes(&eq.a1)?,
        a2: point_to_bytes(&eq.a2)?,
        challenge: scalar_to_bytes(&eq.challenge),
        z_id: scalar_to_bytes(&eq.z_id),
        z_1: scalar_to_bytes(&eq.z_1),
        z_2: scalar_to_bytes(&eq.z_2),
    })
}

/// Verify an identity continuity proof: registry metadata, then both
/// Chaum-Pedersen verification equations under the shared challenge.
pub fn verify(proof: &ContinuityProof) -> ZkResult<()> {
    if proof.public_inputs.version != CONTINUITY_V1.version {
        return Err(ZkError::BadMetadata(format!(
            "unsupported continuity version {}",
            proof.public_inputs.version
        )));
    }

    let c1 = Commitment::from_point(point_from_bytes(&proof.public_inputs.commitment_1)?)?;
    let c2 = Commitment::from_point(point_from_bytes(&proof.public_inputs.commitment_2)?)?;

    let eq = EqualityProof {
        a1: point_from_bytes(&proof.a1)?,
        a2: point_from_bytes(&proof.a2)?,
        challenge: scalar_from_bytes(&proof.challenge)?,
        z_id: scalar_from_bytes(&proof.z_id)?,
        z_1: scalar_from_bytes(&proof.z_1)?,
        z_2: scalar_from_bytes(&proof.z_2)?,
    };

    chaum_pedersen::verify(CONTINUITY_V1.domain_separator, &c1, &c2, &eq, &proof.public_inputs.ctx_hash)
}
