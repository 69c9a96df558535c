//! Fixed-depth binary Merkle accumulator with domain-separated hashing.
//!
//! Leaf and internal node hashes are tagged separately so a node hash can
//! never be replayed as a leaf hash or vice versa. Trees are always padded
//! to a full `2^depth` leaves with a deterministic zero leaf, so the
//! witness format never needs to encode "this subtree is absent". Grounded
//! on the compact sibling-path witness scheme used for epoch weight
//! commitments in the teacher's snapshot module, generalized from a
//! fixed two-field leaf to an arbitrary byte leaf and from an
//! index-implies-direction witness to an explicit per-step direction flag.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ZkError, ZkResult};

const LEAF_DOMAIN: &[u8] = b"MERKLE_LEAF_V1";
const NODE_DOMAIN: &[u8] = b"MERKLE_NODE_V1";
const MAX_DEPTH: u8 = 64;

/// Hash a leaf's raw byte content (typically a 33-byte commitment) into
/// its 32-byte leaf digest.
pub fn leaf_hash(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(LEAF_DOMAIN);
    hasher.update(data);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// Combine two child digests (in left, right order) into their parent's
/// digest.
pub fn node_hash(left: &[u8; 32], right: &[u8; 32]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(NODE_DOMAIN);
    hasher.update(left);
    hasher.update(right);
    let digest = hasher.finalize();
    let mut out = [0u8; 32];
    out.copy_from_slice(&digest);
    out
}

/// The deterministic digest used to pad a tree out to a full `2^depth`
/// leaves.
fn zero_leaf() -> [u8; 32] {
    leaf_hash(b"MERKLE_ZERO_PAD_V1")
}

/// A fixed-depth Merkle tree built over already-hashed leaves.
#[derive(Debug, Clone)]
pub struct MerkleTree {
    depth: u8,
    /// Level 0 is the leaves, level `depth` is the single root.
    levels: Vec<Vec<[u8; 32]>>,
}

impl MerkleTree {
    /// Build a tree of the given fixed `depth` from `leaves`, padding with
    /// the deterministic zero leaf up to `2^depth` entries. Errors if more
    /// leaves are supplied than the depth can hold.
    pub fn build(depth: u8, leaves: &[[u8; 32]]) -> ZkResult<MerkleTree> {
        if depth > MAX_DEPTH {
            return Err(ZkError::BadMerklePath(format!("depth out of range: {depth}")));
        }
        let capacity = 1usize << depth;
        if leaves.len() > capacity {
            return Err(ZkError::BadMerklePath(format!(
                "{} leaves exceed depth-{depth} capacity of {capacity}",
                leaves.len()
            )));
        }

        let mut level = leaves.to_vec();
        level.resize(capacity, zero_leaf());

        let mut levels = vec![level.clone()];
        for _ in 0..depth {
            let mut next = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks_exact(2) {
                next.push(node_hash(&pair[0], &pair[1]));
            }
            levels.push(next.clone());
            level = next;
        }

        Ok(MerkleTree { depth, levels })
    }

    /// The tree's root digest. For depth 0 this is the single leaf itself.
    pub fn root(&self) -> [u8; 32] {
        self.levels[self.depth as usize][0]
    }

    /// Build the sibling path for the leaf at `index`.
    pub fn path_for(&self, index: u64) -> ZkResult<MerklePath> {
        let capacity = 1u64 << self.depth;
        if index >= capacity {
            return Err(ZkError::BadMerklePath(format!(
                "leaf index {index} out of range for depth {}",
                self.depth
            )));
        }

        let mut steps = Vec::with_capacity(self.depth as usize);
        let mut idx = index as usize;
        for level in 0..self.depth as usize {
            let sibling_idx = idx ^ 1;
            // idx is the right child (odd) iff its sibling sits to its left.
            let sibling_is_left = idx % 2 == 1;
            steps.push(PathStep {
                sibling: self.levels[level][sibling_idx],
                sibling_is_left,
            });
            idx /= 2;
        }

        Ok(MerklePath { steps })
    }
}

/// One step of a Merkle inclusion path: the sibling digest at this level
/// and whether it sits to the left of the running hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathStep {
    pub sibling: [u8; 32],
    pub sibling_is_left: bool,
}

/// A Merkle inclusion witness: an ordered list of sibling steps, of
/// length exactly the tree's depth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerklePath {
    pub steps: Vec<PathStep>,
}

impl MerklePath {
    /// This path's implied depth.
    pub fn depth(&self) -> u8 {
        self.steps.len() as u8
    }

    /// Recompute the root implied by `leaf` and this path, and compare it
    /// to `expected_root` byte-for-byte.
    pub fn verify(&self, leaf: &[u8; 32], expected_root: &[u8; 32]) -> ZkResult<()> {
        let mut current = *leaf;
        for step in &self.steps {
            current = if step.sibling_is_left {
                node_hash(&step.sibling, &current)
            } else {
                node_hash(&current, &step.sibling)
            };
        }

        if &current == expected_root {
            Ok(())
        } else {
            Err(ZkError::BadMerklePath("recomputed root mismatch".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_leaves(n: usize) -> Vec<[u8; 32]> {
        (0..n).map(|i| leaf_hash(&(i as u64).to_be_bytes())).collect()
    }

    #[test]
    fn depth_zero_tree_is_single_leaf_as_root() {
        let leaves = sample_leaves(1);
        let tree = MerkleTree::build(0, &leaves).unwrap();
        assert_eq!(tree.root(), leaves[0]);
        let path = tree.path_for(0).unwrap();
        assert_eq!(path.steps.len(), 0);
        assert!(path.verify(&leaves[0], &tree.root()).is_ok());
    }

    #[test]
    fn build_and_verify_every_leaf() {
        let leaves = sample_leaves(5);
        let tree = MerkleTree::build(3, &leaves).unwrap();
        let root = tree.root();
        for (i, leaf) in leaves.iter().enumerate() {
            let path = tree.path_for(i as u64).unwrap();
            assert_eq!(path.depth(), 3);
            assert!(path.verify(leaf, &root).is_ok());
        }
    }

    #[test]
    fn only_left_side_leaves_populated() {
        let leaves = sample_leaves(2);
        let tree = MerkleTree::build(4, &leaves).unwrap();
        let root = tree.root();
        let path = tree.path_for(1).unwrap();
        assert!(path.verify(&leaves[1], &root).is_ok());
    }

    #[test]
    fn padded_zero_leaves_are_also_valid() {
        let leaves = sample_leaves(3);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let root = tree.root();
        let path = tree.path_for(3).unwrap();
        assert!(path.verify(&zero_leaf(), &root).is_ok());
    }

    #[test]
    fn tampered_leaf_rejected() {
        let leaves = sample_leaves(4);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let root = tree.root();
        let path = tree.path_for(0).unwrap();
        let wrong_leaf = leaf_hash(b"not the real leaf");
        assert!(path.verify(&wrong_leaf, &root).is_err());
    }

    #[test]
    fn tampered_sibling_rejected() {
        let leaves = sample_leaves(4);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let root = tree.root();
        let mut path = tree.path_for(1).unwrap();
        path.steps[0].sibling = leaf_hash(b"tampered");
        assert!(path.verify(&leaves[1], &root).is_err());
    }

    #[test]
    fn tampered_direction_flag_rejected() {
        let leaves = sample_leaves(4);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let root = tree.root();
        let mut path = tree.path_for(1).unwrap();
        path.steps[0].sibling_is_left = !path.steps[0].sibling_is_left;
        assert!(path.verify(&leaves[1], &root).is_err());
    }

    #[test]
    fn tampered_root_rejected() {
        let leaves = sample_leaves(4);
        let tree = MerkleTree::build(2, &leaves).unwrap();
        let path = tree.path_for(0).unwrap();
        let mut wrong_root = tree.root();
        wrong_root[0] ^= 0xFF;
        assert!(path.verify(&leaves[0], &wrong_root).is_err());
    }

    #[test]
    fn path_survives_cbor_roundtrip() {
        let leaves = sample_leaves(6);
        let tree = MerkleTree::build(3, &leaves).unwrap();
        let path = tree.path_for(5).unwrap();

        let mut encoded = Vec::new();
        ciborium::ser::into_writer(&path, &mut encoded).unwrap();
        let decoded: MerklePath = ciborium::de::from_reader(encoded.as_slice()).unwrap();

        assert_eq!(path, decoded);
        assert!(decoded.verify(&leaves[5], &tree.root()).is_ok());
    }

    #[test]
    fn too_many_leaves_for_depth_rejected() {
        let leaves = sample_leaves(5);
        assert!(MerkleTree::build(2, &leaves).is_err());
    }

    #[test]
    fn leaf_and_node_domains_do_not_collide() {
        let a = leaf_hash(b"x");
        let b = node_hash(&a, &a);
        assert_ne!(a, b);
    }
}
