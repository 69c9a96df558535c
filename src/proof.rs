//! The unified proof envelope and its canonical CBOR encoding.
//!
//! Each statement backend defines its own concrete proof type with its
//! own public-input shape; [`ZKProof`] is the tagged union a caller
//! actually sees, and the only type the wire protocol moves around.

use serde::{Deserialize, Serialize};

use crate::error::{ZkError, ZkResult};
use crate::statements::continuity::ContinuityProof;
use crate::statements::membership::MembershipProof;
use crate::statements::unlinkability::UnlinkabilityProof;

/// A complete, self-contained zero-knowledge proof for one of the three
/// registered statements. Verification needs only this value and the
/// statement's process-wide parameters (`G`, `H`, the registry) — never
/// any out-of-band state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "statement_type")]
pub enum ZKProof {
    #[serde(rename = "anon_set_membership_v1")]
    Membership(MembershipProof),
    #[serde(rename = "session_unlinkability_v1")]
    Unlinkability(UnlinkabilityProof),
    #[serde(rename = "identity_continuity_v1")]
    Continuity(ContinuityProof),
}

impl ZKProof {
    /// This proof's wire type tag, matching the registry's `type_tag`.
    pub fn statement_type(&self) -> &'static str {
        match self {
            ZKProof::Membership(_) => "anon_set_membership_v1",
            ZKProof::Unlinkability(_) => "session_unlinkability_v1",
            ZKProof::Continuity(_) => "identity_continuity_v1",
        }
    }

    /// Encode this proof as canonical CBOR.
    pub fn to_cbor(&self) -> ZkResult<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::ser::into_writer(self, &mut buf)
            .map_err(|e| ZkError::BadEncoding(format!("CBOR encode failed: {e}")))?;
        Ok(buf)
    }

    /// Decode a proof previously produced by [`ZKProof::to_cbor`].
    pub fn from_cbor(bytes: &[u8]) -> ZkResult<ZKProof> {
        ciborium::de::from_reader(bytes)
            .map_err(|e| ZkError::BadEncoding(format!("CBOR decode failed: {e}")))
    }
}
