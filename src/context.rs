//! Proof context binding.
//!
//! A [`ProofContext`] ties a Sigma proof to the peer and session it was
//! produced for: which peer, which session, an arbitrary sorted metadata
//! map (slot numbers, epoch ids, asset versions, whatever the calling
//! statement needs bound in), and a timestamp. [`ProofContext::hash`]
//! folds all of that into one 32-byte digest that is fed into every
//! proof's transcript, so a proof produced for one context can never
//! verify against another. Disambiguating between statement *types* is
//! not this struct's job — each statement backend's own domain separator
//! (see `registry.rs`) already does that inside the Fiat-Shamir
//! transcript, so it is never folded in here too.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

const DOMAIN: &[u8] = b"PRIVACYZK_PROOF_CONTEXT_V1";

fn append_field(hasher: &mut Sha256, field: &[u8]) {
    let len = u32::try_from(field.len()).expect("context field exceeds u32 length");
    hasher.update(len.to_be_bytes());
    hasher.update(field);
}

/// The public context a proof is bound to. Metadata keys are stored in a
/// [`BTreeMap`] so iteration order — and therefore the hash — never
/// depends on insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofContext {
    pub peer_id: String,
    pub session_id: String,
    pub metadata: BTreeMap<String, Vec<u8>>,
    pub timestamp: u64,
}

impl ProofContext {
    /// Construct a context with no extra metadata.
    pub fn new(peer_id: impl Into<String>, session_id: impl Into<String>, timestamp: u64) -> Self {
        ProofContext {
            peer_id: peer_id.into(),
            session_id: session_id.into(),
            metadata: BTreeMap::new(),
            timestamp,
        }
    }

    /// Attach a metadata field, returning `self` for chained construction.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// Fold the context into a 32-byte binding hash for use as a proof
    /// transcript's context field.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        append_field(&mut hasher, DOMAIN);
        append_field(&mut hasher, self.peer_id.as_bytes());
        append_field(&mut hasher, self.session_id.as_bytes());
        append_field(&mut hasher, &self.timestamp.to_be_bytes());

        let count = u32::try_from(self.metadata.len()).expect("metadata map exceeds u32 length");
        hasher.update(count.to_be_bytes());
        for (key, value) in &self.metadata {
            append_field(&mut hasher, key.as_bytes());
            append_field(&mut hasher, value);
        }

        let digest = hasher.finalize();
        let mut out = [0u8; 32];
        out.copy_from_slice(&digest);
        out
    }
}
