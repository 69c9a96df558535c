//! secp256k1 scalar and point primitives.
//!
//! Thin wrappers around [`k256`] giving the fixed-width encodings the rest
//! of the crate relies on: 32-byte big-endian scalars and 33-byte SEC1
//! compressed points. Scalar and point types are re-exported directly
//! rather than newtype-wrapped, following the convention of the
//! discrete-log Sigma proofs this module is grounded on.

use crate::error::{ZkError, ZkResult};
use k256::elliptic_curve::bigint::U256;
use k256::elliptic_curve::ops::Reduce;
use k256::elliptic_curve::sec1::{FromEncodedPoint, ToEncodedPoint};
use k256::elliptic_curve::{Field, PrimeField};
use k256::{AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint, Scalar};
use rand_core::{CryptoRng, RngCore};
use sha2::{Digest, Sha256};
use std::sync::atomic::{AtomicU32, Ordering};

/// A secp256k1 curve point. The point at infinity is representable but is
/// rejected wherever a commitment output, generator, or announcement is
/// expected.
pub type Point = ProjectivePoint;

/// Encode a scalar as 32-byte big-endian.
pub fn scalar_to_bytes(s: &Scalar) -> [u8; 32] {
    let repr = s.to_repr();
    let mut out = [0u8; 32];
    out.copy_from_slice(repr.as_slice());
    out
}

/// Decode a 32-byte big-endian scalar, reduced mod q. Returns
/// [`ZkError::BadEncoding`] if the bytes are not a canonical representative.
pub fn scalar_from_bytes(bytes: &[u8; 32]) -> ZkResult<Scalar> {
    let repr = FieldBytes::clone_from_slice(bytes);
    Option::<Scalar>::from(Scalar::from_repr(repr))
        .ok_or_else(|| ZkError::BadEncoding("scalar out of range".into()))
}

/// Decode a scalar from a variable-length byte slice, requiring exactly 32
/// bytes.
pub fn scalar_from_slice(bytes: &[u8]) -> ZkResult<Scalar> {
    if bytes.len() != 32 {
        return Err(ZkError::BadEncoding(format!(
            "expected 32-byte scalar, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 32];
    arr.copy_from_slice(bytes);
    scalar_from_bytes(&arr)
}

/// Encode a point as 33-byte SEC1 compressed. Rejects the identity point:
/// callers that need to represent "no point" should do so out of band.
pub fn point_to_bytes(p: &Point) -> ZkResult<[u8; 33]> {
    if bool::from(p.is_identity()) {
        return Err(ZkError::InvalidPoint("cannot encode identity point".into()));
    }
    let encoded = p.to_affine().to_encoded_point(true);
    let bytes = encoded.as_bytes();
    if bytes.len() != 33 {
        return Err(ZkError::InvalidPoint("unexpected encoded point length".into()));
    }
    let mut out = [0u8; 33];
    out.copy_from_slice(bytes);
    Ok(out)
}

/// Decode a 33-byte SEC1 compressed point, checking it is on-curve and in
/// the correct subgroup. Does **not** reject the identity point; callers
/// enforce that where required.
pub fn point_from_bytes(bytes: &[u8; 33]) -> ZkResult<Point> {
    let encoded = EncodedPoint::from_bytes(bytes)
        .map_err(|e| ZkError::BadEncoding(format!("malformed SEC1 point: {e}")))?;
    let affine = Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded))
        .ok_or_else(|| ZkError::InvalidPoint("point not on curve".into()))?;
    Ok(Point::from(affine))
}

/// Decode a point from a variable-length slice, requiring exactly 33 bytes.
pub fn point_from_slice(bytes: &[u8]) -> ZkResult<Point> {
    if bytes.len() != 33 {
        return Err(ZkError::BadEncoding(format!(
            "expected 33-byte point, got {}",
            bytes.len()
        )));
    }
    let mut arr = [0u8; 33];
    arr.copy_from_slice(bytes);
    point_from_bytes(&arr)
}

/// Reject the identity point. Used anywhere the spec forbids `O` as an
/// output (commitment results, announcements, generators).
pub fn reject_identity(p: &Point) -> ZkResult<()> {
    if bool::from(p.is_identity()) {
        Err(ZkError::InvalidPoint("identity point forbidden here".into()))
    } else {
        Ok(())
    }
}

/// Sample a uniformly random scalar in `[1, q-1]`, resampling on zero.
pub fn random_nonzero_scalar<R: RngCore + CryptoRng>(rng: &mut R) -> Scalar {
    loop {
        let candidate = Scalar::random(&mut *rng);
        if !bool::from(candidate.is_zero()) {
            return candidate;
        }
    }
}

/// Hash-to-curve via try-and-increment on a fixed domain tag. Used once per
/// process to derive the Pedersen generator `H`. Not constant-time: `H` is
/// public, so timing leaks nothing secret.
pub fn hash_to_curve_try_increment(domain: &[u8]) -> Point {
    let mut counter: u32 = 0;
    loop {
        let mut hasher = Sha256::new();
        hasher.update(domain);
        hasher.update(counter.to_be_bytes());
        let digest = hasher.finalize();

        let mut candidate = [0u8; 33];
        candidate[0] = 0x02;
        candidate[1..].copy_from_slice(&digest);

        if let Ok(point) = point_from_bytes(&candidate) {
            if !bool::from(point.is_identity()) {
                return point;
            }
        }
        counter = counter.wrapping_add(1);
    }
}

/// Reduce an arbitrary SHA-256 transcript hasher to a scalar mod q. Used by
/// the Fiat-Shamir transform and by identity-scalar derivation; both start
/// from a freshly-fed, not-yet-finalized [`Sha256`] instance. The 32-byte
/// digest is treated as a big-endian integer and reduced mod `q` via the
/// curve's standard `Reduce` implementation, the same non-rejection-
/// sampling reduction `ecdsa`'s own digest-to-scalar conversion uses.
pub fn scalar_from_transcript(hasher: Sha256) -> Scalar {
    let digest = hasher.finalize();
    let uint = U256::from_be_slice(&digest);
    Scalar::reduce(uint)
}

/// A fork-safe wrapper over the OS CSPRNG. Records the process id at
/// construction time and transparently reseeds (re-reads from the OS) if
/// the pid changes between draws, so a forked child never replays the
/// parent's RNG state.
pub struct ForkSafeRng {
    pid: AtomicU32,
}

impl ForkSafeRng {
    /// Construct a new fork-safe RNG bound to the current process id.
    pub fn new() -> Self {
        Self {
            pid: AtomicU32::new(std::process::id()),
        }
    }

    fn check_fork(&self) {
        let current = std::process::id();
        // A changed pid means we are a freshly forked child; there is
        // nothing to "reseed" explicitly because `OsRng` reads fresh
        // entropy from the kernel on every draw, but we still update the
        // recorded pid so repeated draws don't re-check needlessly.
        self.pid.store(current, Ordering::Relaxed);
    }
}

impl Default for ForkSafeRng {
    fn default() -> Self {
        Self::new()
    }
}

impl RngCore for ForkSafeRng {
    fn next_u32(&mut self) -> u32 {
        self.check_fork();
        rand::rngs::OsRng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.check_fork();
        rand::rngs::OsRng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.check_fork();
        rand::rngs::OsRng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.check_fork();
        rand::rngs::OsRng.try_fill_bytes(dest)
    }
}

impl CryptoRng for ForkSafeRng {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_roundtrip() {
        let mut rng = ForkSafeRng::new();
        let s = random_nonzero_scalar(&mut rng);
        let bytes = scalar_to_bytes(&s);
        let decoded = scalar_from_bytes(&bytes).unwrap();
        assert_eq!(s, decoded);
    }

    #[test]
    fn point_roundtrip() {
        let p = Point::GENERATOR;
        let bytes = point_to_bytes(&p).unwrap();
        let decoded = point_from_bytes(&bytes).unwrap();
        assert_eq!(p, decoded);
    }

    #[test]
    fn identity_point_rejected_on_encode() {
        let err = point_to_bytes(&Point::IDENTITY).unwrap_err();
        assert!(matches!(err, ZkError::InvalidPoint(_)));
    }

    #[test]
    fn hash_to_curve_is_deterministic_and_not_identity() {
        let h1 = hash_to_curve_try_increment(b"PEDERSEN_H_GEN_V1");
        let h2 = hash_to_curve_try_increment(b"PEDERSEN_H_GEN_V1");
        assert_eq!(h1, h2);
        assert!(!bool::from(h1.is_identity()));
        assert_ne!(h1, Point::GENERATOR);
    }

    #[test]
    fn random_nonzero_scalar_is_never_zero() {
        let mut rng = ForkSafeRng::new();
        for _ in 0..256 {
            let s = random_nonzero_scalar(&mut rng);
            assert!(!bool::from(s.is_zero()));
        }
    }

    #[test]
    fn scalar_from_slice_rejects_wrong_length() {
        assert!(scalar_from_slice(&[0u8; 31]).is_err());
        assert!(scalar_from_slice(&[0u8; 33]).is_err());
    }
}
