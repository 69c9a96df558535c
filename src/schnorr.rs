//! Schnorr proof of knowledge of a Pedersen commitment opening.
//!
//! Proves knowledge of `(value, randomness)` such that
//! `commitment = value*G + randomness*H`, without revealing either. Two
//! secrets instead of one distinguishes this from the textbook
//! single-witness discrete-log Schnorr proof this module is grounded on;
//! the announcement and response each carry a component per secret.
//!
//! The domain separator is supplied by the calling statement backend, not
//! fixed here: membership, continuity and unlinkability each bind their
//! own tag so a proof produced for one statement can never be replayed as
//! another.

use crate::commitment::{g, h, Commitment};
use crate::curve::{random_nonzero_scalar, reject_identity, Point};
use crate::error::{ZkError, ZkResult};
use crate::transcript::Transcript;
use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use subtle::ConstantTimeEq;
use zeroize::Zeroizing;

/// A non-interactive Schnorr proof of knowledge of a commitment opening.
/// Carries the challenge explicitly: the verifier recomputes it and
/// compares in constant time, but uses the prover-supplied value in the
/// verification equation itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchnorrProof {
    /// The prover's announcement `A = rho_v*G + rho_b*H`.
    pub announcement: Point,
    /// The Fiat-Shamir challenge, as computed by the prover.
    pub challenge: Scalar,
    /// Response covering the committed value.
    pub z_v: Scalar,
    /// Response covering the blinding factor.
    pub z_b: Scalar,
}

fn derive_challenge(
    domain_separator: &[u8],
    commitment: &Commitment,
    announcement: &Point,
    ctx_hash: &[u8; 32],
) -> ZkResult<Scalar> {
    let mut transcript = Transcript::new(domain_separator);
    transcript.append_point(&g())?;
    transcript.append_point(&h())?;
    transcript.append_point(&commitment.point())?;
    transcript.append_point(announcement)?;
    transcript.append(ctx_hash);
    Ok(transcript.finish())
}

/// Prove knowledge of `(value, randomness)` opening `commitment`, under
/// `domain_separator` and bound to `ctx_hash`.
pub fn prove<R: RngCore + CryptoRng>(
    domain_separator: &[u8],
    commitment: &Commitment,
    value: &Scalar,
    randomness: &Scalar,
    ctx_hash: &[u8; 32],
    rng: &mut R,
) -> ZkResult<SchnorrProof> {
    let rho_v = Zeroizing::new(random_nonzero_scalar(rng));
    let rho_b = Zeroizing::new(random_nonzero_scalar(rng));
    let announcement = g() * *rho_v + h() * *rho_b;
    reject_identity(&announcement)?;

    let challenge = derive_challenge(domain_separator, commitment, &announcement, ctx_hash)?;
    let z_v = *rho_v + challenge * value;
    let z_b = *rho_b + challenge * randomness;

    Ok(SchnorrProof {
        announcement,
        challenge,
        z_v,
        z_b,
    })
}

/// Verify a Schnorr proof of opening against `commitment`, under the same
/// `domain_separator` and `ctx_hash` the prover bound it to.
///
/// The verification equation uses the prover-supplied challenge; only the
/// comparison of that challenge against the independently recomputed one
/// is constant-time, per the documented constant-time contract.
pub fn verify(
    domain_separator: &[u8],
    commitment: &Commitment,
    proof: &SchnorrProof,
    ctx_hash: &[u8; 32],
) -> ZkResult<()> {
    if bool::from(proof.announcement.is_identity()) {
        return Err(ZkError::PoKRejected);
    }

    let lhs = g() * proof.z_v + h() * proof.z_b;
    let rhs = proof.announcement + commitment.point() * proof.challenge;
    if lhs != rhs {
        return Err(ZkError::PoKRejected);
    }

    let recomputed = derive_challenge(domain_separator, commitment, &proof.announcement, ctx_hash)?;
    let claimed_bytes = crate::curve::scalar_to_bytes(&proof.challenge);
    let recomputed_bytes = crate::curve::scalar_to_bytes(&recomputed);
    if bool::from(claimed_bytes.ct_eq(&recomputed_bytes)) {
        Ok(())
    } else {
        Err(ZkError::PoKRejected)
    }
}
