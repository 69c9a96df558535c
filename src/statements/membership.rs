//! Anonymity-set membership statement (`anon_set_membership_v1`).
//!
//! Proves that a commitment is a leaf of a published Merkle tree and that
//! the prover knows the opening of that commitment, without revealing
//! which leaf or the opening itself. The Merkle path is public in this
//! Sigma variant: privacy comes from the blinding factor and the size of
//! the anonymity set, not from hiding the path.

use k256::Scalar;
use rand_core::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use zeroize::Zeroize;

use crate::commitment::{commit_with_randomness, Commitment};
use crate::context::ProofContext;
use crate::curve::{point_from_bytes, point_to_bytes, scalar_from_bytes, scalar_to_bytes};
use crate::error::{ZkError, ZkResult};
use crate::merkle::{leaf_hash, MerklePath};
use crate::registry::MEMBERSHIP_V1;
use crate::schnorr::{self, SchnorrProof};

/// The public inputs a membership proof carries on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipPublicInputs {
    pub version: u32,
    pub root: [u8; 32],
    pub commitment: [u8; 33],
    pub ctx_hash: [u8; 32],
    pub merkle_path: MerklePath,
}

/// A complete, self-contained membership proof.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MembershipProof {
    pub public_inputs: MembershipPublicInputs,
    pub announcement: [u8; 33],
    pub challenge: [u8; 32],
    pub z_v: [u8; 32],
    pub z_b: [u8; 32],
}

/// The prover's secret witness: the identity scalar, its blinding factor,
/// and the Merkle path that places the resulting commitment in the tree.
#[derive(Clone)]
pub struct MembershipWitness {
    pub id: Scalar,
    pub randomness: Scalar,
    pub root: [u8; 32],
    pub merkle_path: MerklePath,
}

impl Drop for MembershipWitness {
    fn drop(&mut self) {
        self.id.zeroize();
        self.randomness.zeroize();
    }
}

/// Fold `root` into `ctx_hash` so the Schnorr PoK is bound to the specific
/// anonymity set the commitment was placed in, not just the session
/// context. Without this, a valid `(commitment, pok)` pair could be
/// relocated under a different, unrelated root by swapping in a fresh
/// internally-consistent Merkle path for the same leaf.
fn binding_value(ctx_hash: &[u8; 32], root: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(ctx_hash);
    hasher.update(root);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Produce a membership proof. Fails with [`ZkError::BadMerklePath`] if
/// the witness's own path does not place its commitment under `root` —
/// the prover never emits a proof it knows to be unverifiable.
pub fn prove<R: RngCore + CryptoRng>(
    witness: &MembershipWitness,
    context: &ProofContext,
    rng: &mut R,
) -> ZkResult<MembershipProof> {
    let commitment = commit_with_randomness(&witness.id, &witness.randomness)?;
    let commitment_bytes = point_to_bytes(&commitment.point())?;

    let leaf = leaf_hash(&commitment_bytes);
    witness.merkle_path.verify(&leaf, &witness.root)?;

    let ctx_hash = context.hash();
    let binding = binding_value(&ctx_hash, &witness.root);
    let pok = schnorr::prove(
        MEMBERSHIP_V1.domain_separator,
        &commitment,
        &witness.id,
        &witness.randomness,
        &binding,
        rng,
    )?;

    Ok(MembershipProof {
        public_inputs: MembershipPublicInputs {
            version: MEMBERSHIP_V1.version,
            root: witness.root,
            commitment: commitment_bytes,
            ctx_hash,
            merkle_path: witness.merkle_path.clone(),
        },
        announcement: point_to_bytes(&pok.announcement)?,
        challenge: scalar_to_bytes(&pok.challenge),
        z_v: scalar_to_bytes(&pok.z_v),
        z_b: scalar_to_bytes(&pok.z_b),
    })
}

/// Verify a membership proof: registry metadata, the Merkle path against
/// the advertised root, then the Schnorr PoK of opening.
pub fn verify(proof: &MembershipProof) -> ZkResult<()> {
    if proof.public_inputs.version != MEMBERSHIP_V1.version {
        return Err(ZkError::BadMetadata(format!(
            "unsupported membership version {}",
            proof.public_inputs.version
        )));
    }

    let leaf = leaf_hash(&proof.public_inputs.commitment);
    proof.public_inputs.merkle_path.verify(&leaf, &proof.public_inputs.root)?;

    let commitment = Commitment::from_point(point_from_bytes(&proof.public_inputs.commitment)?)?;
    let pok = SchnorrProof {
        announcement: point_from_bytes(&proof.announcement)?,
        challenge: scalar_from_bytes(&proof.challenge)?,
        z_v: scalar_from_bytes(&proof.z_v)?,
        z_b: scalar_from_bytes(&proof.z_b)?,
    };

    let binding = binding_value(&proof.public_inputs.ctx_hash, &proof.public_inputs.root);
    schnorr::verify(MEMBERSHIP_V1.domain_separator, &commitment, &pok, &binding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{random_nonzero_scalar, ForkSafeRng};
    use crate::merkle::MerkleTree;

    fn build_tree_and_witness(rng: &mut ForkSafeRng) -> (MerkleTree, MembershipWitness) {
        let id = random_nonzero_scalar(rng);
        let randomness = random_nonzero_scalar(rng);
        let commitment = commit_with_randomness(&id, &randomness).unwrap();
        let commitment_bytes = point_to_bytes(&commitment.point()).unwrap();
        let target_leaf = leaf_hash(&commitment_bytes);

        let mut leaves = vec![leaf_hash(b"decoy-0"), leaf_hash(b"decoy-1"), target_leaf, leaf_hash(b"decoy-3")];
        leaves.truncate(4);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let path = tree.path_for(2).unwrap();

        let witness = MembershipWitness {
            id,
            randomness,
            root: tree.root(),
            merkle_path: path,
        };
        (tree, witness)
    }

    #[test]
    fn honest_membership_proof_verifies() {
        let mut rng = ForkSafeRng::new();
        let (_, witness) = build_tree_and_witness(&mut rng);
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        let proof = prove(&witness, &ctx, &mut rng).unwrap();
        assert!(verify(&proof).is_ok());
    }

    #[test]
    fn proof_for_non_member_leaf_is_refused() {
        let mut rng = ForkSafeRng::new();
        let id = random_nonzero_scalar(&mut rng);
        let randomness = random_nonzero_scalar(&mut rng);
        let leaves = vec![leaf_hash(b"a"), leaf_hash(b"b"), leaf_hash(b"c"), leaf_hash(b"d")];
        let tree = MerkleTree::build(2, &leaves).unwrap();
        // Path for index 0 does not correspond to our commitment's leaf.
        let path = tree.path_for(0).unwrap();
        let witness = MembershipWitness { id, randomness, root: tree.root(), merkle_path: path };
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        assert!(matches!(prove(&witness, &ctx, &mut rng), Err(ZkError::BadMerklePath(_))));
    }

    #[test]
    fn tampered_root_in_proof_is_rejected_on_verify() {
        let mut rng = ForkSafeRng::new();
        let (_, witness) = build_tree_and_witness(&mut rng);
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        let mut proof = prove(&witness, &ctx, &mut rng).unwrap();
        proof.public_inputs.root[0] ^= 0xFF;
        assert!(verify(&proof).is_err());
    }

    #[test]
    fn proof_cannot_be_relocated_to_a_different_consistent_root() {
        let mut rng = ForkSafeRng::new();
        let (_, witness) = build_tree_and_witness(&mut rng);
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        let mut proof = prove(&witness, &ctx, &mut rng).unwrap();

        // Build a second, unrelated tree that places the very same
        // commitment leaf at a different index under a different root.
        let commitment_bytes = proof.public_inputs.commitment;
        let target_leaf = leaf_hash(&commitment_bytes);
        let leaves = vec![leaf_hash(b"other-0"), target_leaf, leaf_hash(b"other-2"), leaf_hash(b"other-3")];
        let other_tree = MerkleTree::build(2, &leaves).unwrap();
        let other_path = other_tree.path_for(1).unwrap();
        assert_ne!(other_tree.root(), proof.public_inputs.root);

        // Swap in the fresh, internally-consistent (root, path) pair while
        // keeping the original PoK untouched.
        proof.public_inputs.root = other_tree.root();
        proof.public_inputs.merkle_path = other_path;

        assert!(verify(&proof).is_err());
    }

    #[test]
    fn unknown_version_rejected() {
        let mut rng = ForkSafeRng::new();
        let (_, witness) = build_tree_and_witness(&mut rng);
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        let mut proof = prove(&witness, &ctx, &mut rng).unwrap();
        proof.public_inputs.version = 7;
        assert!(matches!(verify(&proof), Err(ZkError::BadMetadata(_))));
    }

    #[test]
    fn proof_round_trips_through_cbor() {
        let mut rng = ForkSafeRng::new();
        let (_, witness) = build_tree_and_witness(&mut rng);
        let ctx = ProofContext::new("peer-membership-test", "session-1", 1_700_000_000);
        let proof = prove(&witness, &ctx, &mut rng).unwrap();

        let mut bytes = Vec::new();
        ciborium::ser::into_writer(&proof, &mut bytes).unwrap();
        let decoded: MembershipProof = ciborium::de::from_reader(bytes.as_slice()).unwrap();
        assert!(verify(&decoded).is_ok());
    }
}
