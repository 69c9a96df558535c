//! Proof-exchange client: drives one request/response exchange with an
//! overall timeout and a strict no-retry, no-silent-fallback policy
//! (spec.md §4.9, §7).

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::Framed;

use crate::commitment::commit_with_randomness;
use crate::config::DEFAULT_ZK_TIMEOUT;
use crate::context::ProofContext;
use crate::curve::{point_to_bytes, random_nonzero_scalar, ForkSafeRng};
use crate::error::{ZkError, ZkResult};
use crate::identity::peer_id_to_scalar;
use crate::merkle::{leaf_hash, MerkleTree};
use crate::proof::ZKProof;
use crate::statements::{continuity, membership, unlinkability, ProofBackend, ProveRequest, SigmaBackend};

use super::frames::{Frame, ProofFrameCodec, ProofRequest, ProofResponse, ResponseStatus, StatementKind};

/// One statement's client-visible outcome, matching spec.md §7's
/// "OK / FAIL(reason) / UNAVAILABLE" summary.
#[derive(Debug, Clone)]
pub enum StatementOutcome {
    Ok { proof: ZKProof, fallback: bool },
    Failed(String),
    Unavailable,
}

impl StatementOutcome {
    pub fn is_ok_no_fallback(&self) -> bool {
        matches!(self, StatementOutcome::Ok { fallback: false, .. })
    }
}

/// Overall client exchange policy.
#[derive(Debug, Clone, Copy)]
pub struct ClientPolicy {
    pub total_timeout: Duration,
    /// When true, a statement that can't be produced as a real proof is
    /// surfaced as `Failed` rather than silently downgraded — the
    /// "strict per-statement do-not-fall-back rule" of spec.md §4.9.
    pub require_real: bool,
}

impl Default for ClientPolicy {
    fn default() -> Self {
        ClientPolicy { total_timeout: DEFAULT_ZK_TIMEOUT, require_real: false }
    }
}

/// Drives one request/response exchange over an already-connected,
/// already-framed-capable stream.
pub struct ProofClient;

impl ProofClient {
    /// Run one exchange: send `request`, collect responses in the order
    /// the server emits them, and return once `EndOfBatch` arrives or the
    /// overall deadline elapses. No retries are attempted on this
    /// connection; the caller owns any higher-layer retry policy.
    pub async fn exchange<S>(
        io: S,
        request: ProofRequest,
        policy: ClientPolicy,
    ) -> ZkResult<Vec<(String, StatementOutcome)>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        match tokio::time::timeout(policy.total_timeout, Self::exchange_inner(io, request, policy)).await {
            Ok(result) => result,
            Err(_) => Err(ZkError::Timeout),
        }
    }

    async fn exchange_inner<S>(
        io: S,
        request: ProofRequest,
        policy: ClientPolicy,
    ) -> ZkResult<Vec<(String, StatementOutcome)>>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let kinds = request.statement.expand();
        let depth = request.depth;
        let nonce = request.nonce;

        let mut framed = Framed::new(io, ProofFrameCodec::new());

        framed
            .send(Frame::ProofRequest(request))
            .await
            .map_err(|e| ZkError::BadEncoding(e.to_string()))?;

        let mut outcomes = Vec::new();
        let mut index = 0usize;
        loop {
            match framed.next().await {
                Some(Ok(Frame::ProofResponse(resp))) => {
                    let tag = resp.statement_tag.clone();
                    let kind = kinds.get(index).copied();
                    index += 1;
                    outcomes.push((tag, Self::to_outcome(resp, kind, depth, nonce, policy.require_real)));
                }
                Some(Ok(Frame::EndOfBatch(_))) => break,
                Some(Ok(Frame::ProofRequest(_))) => {
                    return Err(ZkError::BadEncoding("unexpected ProofRequest from server".into()))
                }
                Some(Err(e)) => return Err(ZkError::BadEncoding(e.to_string())),
                None => return Err(ZkError::PeerClosed),
            }
        }

        Ok(outcomes)
    }

    /// Map one statement's wire response to its client-visible outcome. A
    /// `NotAvailable` response is downgraded to a local simulated proof
    /// when the policy allows it (spec.md §4.9): the client runs its own
    /// Sigma backend and re-wraps the result as a fallback-tagged
    /// [`ProofResponse`] before decoding it through the same `Ok` path, so
    /// a downgraded proof can never be mistaken for the peer's own output.
    fn to_outcome(
        resp: ProofResponse,
        kind: Option<StatementKind>,
        depth: u8,
        nonce: [u8; 16],
        require_real: bool,
    ) -> StatementOutcome {
        let resp = match resp.status {
            ResponseStatus::NotAvailable if !require_real => match kind.map(|k| local_fallback_cbor(k, depth, nonce)) {
                Some(Ok(cbor)) => ProofResponse::ok(resp.statement_tag, cbor).with_fallback(),
                _ => resp,
            },
            _ => resp,
        };

        match resp.status {
            ResponseStatus::Ok => match resp.proof_cbor.as_deref().map(ZKProof::from_cbor) {
                Some(Ok(proof)) => StatementOutcome::Ok { proof, fallback: resp.fallback },
                Some(Err(e)) => StatementOutcome::Failed(e.to_string()),
                None => StatementOutcome::Failed("OK response carried no proof".into()),
            },
            ResponseStatus::NotAvailable => StatementOutcome::Unavailable,
            ResponseStatus::Failed => {
                StatementOutcome::Failed(resp.error.unwrap_or_else(|| "unspecified failure".into()))
            }
        }
    }
}

/// The client speaks for this fixed peer id when it downgrades to a
/// locally produced proof; a real deployment would draw this from the
/// caller's own libp2p `PeerId`.
const FALLBACK_PEER_ID: &str = "client-local-fallback-peer";

/// Produce a fresh, honest, locally-simulated proof for `kind` when the
/// peer reported it `NotAvailable`, encoded to canonical CBOR ready to
/// drop into a fallback-tagged [`ProofResponse`]. This is the client's
/// own Sigma backend standing in for the unavailable real proof, not a
/// re-send of anything the peer sent.
fn local_fallback_cbor(kind: StatementKind, depth: u8, nonce: [u8; 16]) -> ZkResult<Vec<u8>> {
    let mut rng = ForkSafeRng::new();
    let backend = SigmaBackend;
    let id = peer_id_to_scalar(FALLBACK_PEER_ID.as_bytes());

    let session_id = nonce.iter().map(|b| format!("{b:02x}")).collect::<String>();
    let timestamp = SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0);
    let ctx = ProofContext::new(FALLBACK_PEER_ID, session_id, timestamp);

    match kind {
        StatementKind::Membership => {
            let randomness = random_nonzero_scalar(&mut rng);
            let commitment = commit_with_randomness(&id, &randomness)?;
            let commitment_bytes = point_to_bytes(&commitment.point())?;
            let leaf = leaf_hash(&commitment_bytes);
            let tree = MerkleTree::build(depth, &[leaf])?;
            let path = tree.path_for(0)?;
            let request = ProveRequest::Membership(
                membership::MembershipWitness { id, randomness, root: tree.root(), merkle_path: path },
                ctx,
            );
            backend.prove(&request)?.to_cbor()
        }
        StatementKind::Continuity => {
            let r1 = random_nonzero_scalar(&mut rng);
            let r2 = random_nonzero_scalar(&mut rng);
            let request = ProveRequest::Continuity(continuity::ContinuityWitness { id, r1, r2 }, ctx);
            backend.prove(&request)?.to_cbor()
        }
        StatementKind::Unlinkability => {
            let randomness = random_nonzero_scalar(&mut rng);
            let request = ProveRequest::Unlinkability(unlinkability::UnlinkabilityWitness { id, randomness }, ctx);
            backend.prove(&request)?.to_cbor()
        }
    }
}

/// The demo-status gate from spec.md §7: all three statements `OK` with
/// no fallback marker.
pub fn demo_status_ok(outcomes: &[(String, StatementOutcome)]) -> bool {
    outcomes.len() == 3 && outcomes.iter().all(|(_, outcome)| outcome.is_ok_no_fallback())
}
