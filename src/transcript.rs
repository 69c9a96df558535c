//! Length-prefixed, domain-separated Fiat-Shamir transcripts.
//!
//! Every challenge in this crate is derived the same way: a domain tag
//! followed by a sequence of fields, each prefixed with its 4-byte
//! big-endian length before being fed to SHA-256. This mirrors the
//! field-by-field length-prefixing the KMAC-based transcript builders in
//! the grounding corpus use, adapted to the fixed SHA-256 + 4-byte-BE
//! format this crate requires.

use crate::curve::{point_to_bytes, scalar_from_transcript, Point};
use crate::error::ZkResult;
use k256::Scalar;
use sha2::{Digest, Sha256};

/// An append-only Fiat-Shamir transcript. Consumed by [`Transcript::finish`]
/// to produce the challenge scalar.
pub struct Transcript {
    hasher: Sha256,
}

impl Transcript {
    /// Start a new transcript under the given domain separator.
    pub fn new(domain_separator: &[u8]) -> Self {
        let mut t = Transcript {
            hasher: Sha256::new(),
        };
        t.append(domain_separator);
        t
    }

    /// Append a raw length-prefixed byte field.
    pub fn append(&mut self, field: &[u8]) -> &mut Self {
        let len = u32::try_from(field.len()).expect("transcript field exceeds u32 length");
        self.hasher.update(len.to_be_bytes());
        self.hasher.update(field);
        self
    }

    /// Append a 32-byte scalar.
    pub fn append_scalar(&mut self, s: &Scalar) -> &mut Self {
        self.append(&crate::curve::scalar_to_bytes(s))
    }

    /// Append a curve point in its 33-byte SEC1 compressed form. Fails if
    /// the point is the identity, which is never a valid transcript input.
    pub fn append_point(&mut self, p: &Point) -> ZkResult<&mut Self> {
        let encoded = point_to_bytes(p)?;
        Ok(self.append(&encoded))
    }

    /// Finalize the transcript into a challenge scalar, reduced mod q.
    pub fn finish(self) -> Scalar {
        scalar_from_transcript(self.hasher)
    }
}
