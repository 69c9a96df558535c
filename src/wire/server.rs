//! Proof-exchange server: serves one `ProofRequest` per connection,
//! producing the requested statements in the fixed order membership ->
//! continuity -> unlinkability and streaming a response per statement as
//! it completes (spec.md §4.9, §5).
//!
//! Grounded on the teacher's `PeerManager::handle_connection` (accept
//! loop + `Framed` over a raw socket) generalized from a fire-and-forget
//! message stream to one request answered by a bounded, ordered batch of
//! responses. Each statement is dispatched to its own `tokio::spawn` task
//! (itself `spawn_blocking` for the CPU-bound proving, per the CPU-pool
//! design note in spec.md §9) the moment the request is parsed, so a slow
//! statement only delays its own slot in the fixed response order, never
//! the computation of the others.

use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;
use tracing::{error, info, warn};

use crate::assets::{self, AssetStatement};
use crate::commitment::commit_with_randomness;
use crate::config::ProveMode;
use crate::context::ProofContext;
use crate::curve::{point_to_bytes, random_nonzero_scalar, ForkSafeRng};
use crate::error::{ZkError, ZkResult};
use crate::identity::peer_id_to_scalar;
use crate::merkle::{leaf_hash, MerkleTree};
use crate::statements::{continuity, membership, unlinkability, ProofBackend, ProveRequest, SigmaBackend};

use super::frames::{EndOfBatch, Frame, ProofFrameCodec, ProofRequest, ProofResponse, StatementKind};

/// The demo proof-exchange server. Holds only process-wide, read-only
/// configuration: the asset store root and the prove-mode policy.
#[derive(Debug, Clone)]
pub struct ProofServer {
    pub assets_dir: PathBuf,
    pub prove_mode: ProveMode,
}

impl ProofServer {
    pub fn new(assets_dir: PathBuf, prove_mode: ProveMode) -> Self {
        ProofServer { assets_dir, prove_mode }
    }

    /// Bind `listen_addr` and serve connections forever, one
    /// `tokio::task` per connection. Returns only on a bind error.
    pub async fn listen(self: std::sync::Arc<Self>, listen_addr: std::net::SocketAddr) -> ZkResult<()> {
        let listener = TcpListener::bind(listen_addr)
            .await
            .map_err(|e| ZkError::BadEncoding(format!("bind {listen_addr}: {e}")))?;
        info!(%listen_addr, "proof-exchange server listening");

        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    info!(%peer_addr, "accepted proof-exchange connection");
                    let server = self.clone();
                    tokio::spawn(async move {
                        if let Err(e) = server.serve_connection(socket).await {
                            warn!(%peer_addr, error = %e, "proof-exchange connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    error!(error = %e, "accept error");
                }
            }
        }
    }

    /// Serve one connection end-to-end: read exactly one `ProofRequest`,
    /// produce its statements in the fixed order, and close with
    /// `EndOfBatch`. Closing the stream or exceeding the per-statement
    /// deadline aborts in-flight proving; no partial proof is ever sent.
    pub async fn serve_connection<S>(&self, io: S) -> ZkResult<()>
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let mut framed = Framed::new(io, ProofFrameCodec::new());

        let request = match framed.next().await {
            Some(Ok(Frame::ProofRequest(req))) => req,
            Some(Ok(_)) => return Err(ZkError::BadEncoding("expected ProofRequest frame first".into())),
            Some(Err(e)) => return Err(ZkError::BadEncoding(e.to_string())),
            None => return Err(ZkError::PeerClosed),
        };

        info!(schema = request.schema_version, depth = request.depth, "serving proof-exchange request");

        let deadline = Duration::from_millis(u64::from(request.deadline_ms));

        // Each statement is dispatched to its own task the instant the
        // request is parsed, so a slow one (e.g. membership) never delays
        // the others from starting — only the order responses are sent
        // back in is fixed, not the order they're computed in.
        let kinds = request.statement.expand();
        let mut tasks: std::collections::VecDeque<_> = kinds
            .iter()
            .map(|kind| {
                let server = self.clone();
                let request = request.clone();
                let kind = *kind;
                (kind, tokio::spawn(async move { server.produce(kind, &request).await }))
            })
            .collect();

        while let Some((kind, task)) = tasks.pop_front() {
            let response = match tokio::time::timeout(deadline, task).await {
                Ok(Ok(response)) => response,
                Ok(Err(_)) => {
                    warn!(?kind, "statement proving task panicked");
                    for (_, remaining) in tasks.drain(..) {
                        remaining.abort();
                    }
                    return Err(ZkError::BadEncoding("statement proving task panicked".into()));
                }
                Err(_) => {
                    warn!(?kind, "statement proving exceeded deadline, closing stream; aborting in-flight statements");
                    for (_, remaining) in tasks.drain(..) {
                        remaining.abort();
                    }
                    return Err(ZkError::Timeout);
                }
            };
            framed
                .send(Frame::ProofResponse(response))
                .await
                .map_err(|_| ZkError::PeerClosed)?;
        }

        framed
            .send(Frame::EndOfBatch(EndOfBatch))
            .await
            .map_err(|_| ZkError::PeerClosed)?;
        Ok(())
    }

    async fn produce(&self, kind: StatementKind, request: &ProofRequest) -> ProofResponse {
        let tag = kind.response_tag(request.schema_version);
        match self.prove_mode {
            ProveMode::Real => self.produce_real(kind, request, tag).await,
            ProveMode::Sigma => Self::produce_sigma(kind, request, tag).await,
        }
    }

    /// `real` mode: load the pre-generated proof bytes for this
    /// `(statement, schema_version, depth)` from the asset store and
    /// forward them verbatim.
    async fn produce_real(&self, kind: StatementKind, request: &ProofRequest, tag: String) -> ProofResponse {
        let assets_dir = self.assets_dir.clone();
        let schema_version = request.schema_version;
        let depth = request.depth;
        let statement = match kind {
            StatementKind::Membership => AssetStatement::Membership,
            StatementKind::Continuity => AssetStatement::Continuity,
            StatementKind::Unlinkability => AssetStatement::Unlinkability,
        };

        let result = tokio::task::spawn_blocking(move || {
            assets::load_manifest(&assets_dir, statement, schema_version, depth)
        })
        .await;

        match result {
            Ok(Ok(manifest)) => ProofResponse::ok(tag, manifest.proof),
            Ok(Err(ZkError::NotAvailable(_))) => ProofResponse::not_available(tag),
            Ok(Err(e)) => ProofResponse::failed(tag, e.to_string()),
            Err(_) => ProofResponse::failed(tag, "asset load task panicked".into()),
        }
    }

    /// `sigma` mode: run the in-process prover on a freshly sampled
    /// honest witness for this statement.
    async fn produce_sigma(kind: StatementKind, request: &ProofRequest, tag: String) -> ProofResponse {
        let depth = request.depth;
        let nonce = request.nonce;
        let schema_version = request.schema_version;

        let result = tokio::task::spawn_blocking(move || sigma_prove(kind, depth, nonce, schema_version)).await;

        match result {
            Ok(Ok(cbor)) => ProofResponse::ok(tag, cbor),
            Ok(Err(e)) => ProofResponse::failed(tag, e.to_string()),
            Err(_) => ProofResponse::failed(tag, "proving task panicked".into()),
        }
    }
}

/// The demo server speaks for a single fixed peer id; a real deployment
/// would draw this from its libp2p `PeerId` instead.
const DEMO_PEER_ID: &str = "demo-server-peer";

/// Fold the client's 16-byte nonce into a `ProofContext` session id and
/// stamp it with the current wall-clock time, so repeated demo requests
/// bind to distinct contexts without requiring the demo server to track
/// any session state of its own.
fn demo_context(nonce: &[u8; 16]) -> ProofContext {
    let session_id = nonce.iter().map(|b| format!("{b:02x}")).collect::<String>();
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    ProofContext::new(DEMO_PEER_ID, session_id, timestamp)
}

/// Build a fresh honest witness for `kind` and run the in-process Sigma
/// prover end to end, returning the proof's canonical CBOR encoding. The
/// witness's identity scalar is derived from the server's own peer id
/// rather than sampled at random, so the same peer always commits to the
/// same underlying identity across statements.
fn sigma_prove(kind: StatementKind, depth: u8, nonce: [u8; 16], _schema_version: u8) -> ZkResult<Vec<u8>> {
    let mut rng = ForkSafeRng::new();
    let backend = SigmaBackend;
    let id = peer_id_to_scalar(DEMO_PEER_ID.as_bytes());

    match kind {
        StatementKind::Membership => {
            let randomness = random_nonzero_scalar(&mut rng);
            let commitment = commit_with_randomness(&id, &randomness)?;
            let commitment_bytes = point_to_bytes(&commitment.point())?;
            let leaf = leaf_hash(&commitment_bytes);
            let tree = MerkleTree::build(depth, &[leaf])?;
            let path = tree.path_for(0)?;

            let ctx = demo_context(&nonce);
            let request = ProveRequest::Membership(
                membership::MembershipWitness { id, randomness, root: tree.root(), merkle_path: path },
                ctx,
            );
            backend.prove(&request)?.to_cbor()
        }
        StatementKind::Continuity => {
            let r1 = random_nonzero_scalar(&mut rng);
            let r2 = random_nonzero_scalar(&mut rng);
            let ctx = demo_context(&nonce);
            let request = ProveRequest::Continuity(continuity::ContinuityWitness { id, r1, r2 }, ctx);
            backend.prove(&request)?.to_cbor()
        }
        StatementKind::Unlinkability => {
            let randomness = random_nonzero_scalar(&mut rng);
            let ctx = demo_context(&nonce);
            let request = ProveRequest::Unlinkability(unlinkability::UnlinkabilityWitness { id, randomness }, ctx);
            backend.prove(&request)?.to_cbor()
        }
    }
}
