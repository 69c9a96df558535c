//! Pedersen commitments over secp256k1.
//!
//! `commit(v, r) = v*G + r*H` where `G` is the curve's standard base point
//! and `H` is a second generator with no known discrete log relative to
//! `G`, derived once via hash-to-curve. Mirrors the `commit`/
//! `commit_with_randomness` pair and the hardcoded-vs-derived alternate
//! generator pattern of the Pedersen/Schnorr grounding file, except `H` is
//! computed at first use instead of hardcoded, since this crate has no
//! prior fixed deployment to pin byte constants against.

use crate::curve::{random_nonzero_scalar, reject_identity, Point};
use crate::error::ZkResult;
use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use std::sync::OnceLock;

/// Domain tag for deriving the second Pedersen generator `H`.
const PEDERSEN_H_DOMAIN: &[u8] = b"PEDERSEN_H_GEN_V1";

static H_GENERATOR: OnceLock<Point> = OnceLock::new();

/// The standard secp256k1 base point, used as the value generator.
pub fn g() -> Point {
    Point::GENERATOR
}

/// The derived blinding generator. Computed once per process and cached.
pub fn h() -> Point {
    *H_GENERATOR.get_or_init(|| crate::curve::hash_to_curve_try_increment(PEDERSEN_H_DOMAIN))
}

/// A Pedersen commitment to some value under some blinding factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Commitment(pub(crate) Point);

impl Commitment {
    /// The underlying curve point.
    pub fn point(&self) -> Point {
        self.0
    }

    /// Wrap a raw point as a commitment, rejecting the identity.
    pub fn from_point(p: Point) -> ZkResult<Self> {
        reject_identity(&p)?;
        Ok(Commitment(p))
    }

    /// Homomorphically add two commitments: commits to the sum of values
    /// and the sum of blinding factors.
    pub fn add(&self, other: &Commitment) -> ZkResult<Commitment> {
        Commitment::from_point(self.0 + other.0)
    }
}

/// Commit to `value` with an explicit blinding factor.
pub fn commit_with_randomness(value: &Scalar, randomness: &Scalar) -> ZkResult<Commitment> {
    let point = g() * value + h() * randomness;
    Commitment::from_point(point)
}

/// Commit to `value` with a freshly sampled blinding factor, returning the
/// commitment and the blinding factor the caller must retain to later open
/// or prove knowledge of it.
pub fn commit<R: RngCore + CryptoRng>(
    value: &Scalar,
    rng: &mut R,
) -> ZkResult<(Commitment, Scalar)> {
    let randomness = random_nonzero_scalar(rng);
    let commitment = commit_with_randomness(value, &randomness)?;
    Ok((commitment, randomness))
}

/// Verify that `commitment` opens to `value` under `randomness`.
///
/// Equality is checked on the curve point itself: any non-canonical scalar
/// reduction on the caller's side is already normalized by the scalar field
/// before this runs, so no separate "lenient mod-q" branch is needed here.
pub fn verify(commitment: &Commitment, value: &Scalar, randomness: &Scalar) -> bool {
    match commit_with_randomness(value, randomness) {
        Ok(recomputed) => recomputed.0 == commitment.0,
        Err(_) => false,
    }
}
