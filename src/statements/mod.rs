//! The three statement backends and the uniform [`ProofBackend`] seam that
//! unifies them.

pub mod continuity;
pub mod membership;
pub mod unlinkability;

use crate::context::ProofContext;
use crate::curve::ForkSafeRng;
use crate::error::ZkResult;
use crate::proof::ZKProof;

/// A prove request for one of the three statements, paired with the
/// context it should be bound to. Kept as a tagged enum rather than a
/// trait object: dispatch is a `match`, not virtual dispatch.
pub enum ProveRequest {
    Membership(membership::MembershipWitness, ProofContext),
    Unlinkability(unlinkability::UnlinkabilityWitness, ProofContext),
    Continuity(continuity::ContinuityWitness, ProofContext),
}

/// The external seam the proof-exchange server and any other caller
/// prove/verify through.
pub trait ProofBackend {
    fn prove(&self, request: &ProveRequest) -> ZkResult<ZKProof>;
    fn verify(&self, proof: &ZKProof) -> ZkResult<()>;
}

/// The in-process Sigma-protocol backend: dispatches on the request's
/// variant via a static match rather than a trait-object vtable.
#[derive(Debug, Default)]
pub struct SigmaBackend;

impl ProofBackend for SigmaBackend {
    fn prove(&self, request: &ProveRequest) -> ZkResult<ZKProof> {
        let mut rng = ForkSafeRng::new();
        match request {
            ProveRequest::Membership(witness, ctx) => {
                Ok(ZKProof::Membership(membership::prove(witness, ctx, &mut rng)?))
            }
            ProveRequest::Unlinkability(witness, ctx) => {
                Ok(ZKProof::Unlinkability(unlinkability::prove(witness, ctx, &mut rng)?))
            }
            ProveRequest::Continuity(witness, ctx) => {
                Ok(ZKProof::Continuity(continuity::prove(witness, ctx, &mut rng)?))
            }
        }
    }

    fn verify(&self, proof: &ZKProof) -> ZkResult<()> {
        match proof {
            ZKProof::Membership(p) => membership::verify(p),
            ZKProof::Unlinkability(p) => unlinkability::verify(p),
            ZKProof::Continuity(p) => continuity::verify(p),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commitment::commit_with_randomness;
    use crate::curve::{point_to_bytes, random_nonzero_scalar};
    use crate::merkle::{leaf_hash, MerkleTree};

    #[test]
    fn backend_round_trips_each_statement() {
        let backend = SigmaBackend;
        let mut rng = ForkSafeRng::new();

        let id = random_nonzero_scalar(&mut rng);
        let randomness = random_nonzero_scalar(&mut rng);
        let commitment = commit_with_randomness(&id, &randomness).unwrap();
        let commitment_bytes = point_to_bytes(&commitment.point()).unwrap();
        let leaf = leaf_hash(&commitment_bytes);
        let tree = MerkleTree::build(2, &[leaf]).unwrap();
        let path = tree.path_for(0).unwrap();

        let membership_request = ProveRequest::Membership(
            membership::MembershipWitness { id, randomness, root: tree.root(), merkle_path: path },
            ProofContext::new("peer-backend-test", "session-1", 1_700_000_000),
        );
        let membership_proof = backend.prove(&membership_request).unwrap();
        assert!(backend.verify(&membership_proof).is_ok());

        let unlinkability_request = ProveRequest::Unlinkability(
            unlinkability::UnlinkabilityWitness {
                id: random_nonzero_scalar(&mut rng),
                randomness: random_nonzero_scalar(&mut rng),
            },
            ProofContext::new("peer-backend-test", "session-2", 1_700_000_000),
        );
        let unlinkability_proof = backend.prove(&unlinkability_request).unwrap();
        assert!(backend.verify(&unlinkability_proof).is_ok());

        let continuity_request = ProveRequest::Continuity(
            continuity::ContinuityWitness {
                id: random_nonzero_scalar(&mut rng),
                r1: random_nonzero_scalar(&mut rng),
                r2: random_nonzero_scalar(&mut rng),
            },
            ProofContext::new("peer-backend-test", "session-3", 1_700_000_000),
        );
        let continuity_proof = backend.prove(&continuity_request).unwrap();
        assert!(backend.verify(&continuity_proof).is_ok());
    }
}
