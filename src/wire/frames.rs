//! Proof-exchange wire frames and their length-prefixed CBOR codec.
//!
//! Frame format: `len:u32_be || body_cbor`, exactly as spec.md §6. The
//! codec wraps [`tokio_util::codec::LengthDelimitedCodec`] for the framing
//! (as the teacher's `MessageCodec` does for its own length-delimited
//! protocol) and swaps bincode for canonical CBOR, matching this crate's
//! proof encoding.

use std::io;

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tokio_util::codec::{Decoder, Encoder, LengthDelimitedCodec};

/// Maximum frame body size, per spec.md §4.9/§6.
pub const MAX_FRAME_BYTES: usize = 1024 * 1024;

/// The three statements a client may request, plus the shorthand for
/// "all three".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementSelector {
    Membership,
    Continuity,
    Unlinkability,
    All,
}

impl StatementSelector {
    /// The fixed delivery order this selector expands to, per spec.md
    /// §4.9: membership -> continuity -> unlinkability.
    pub fn expand(self) -> &'static [StatementKind] {
        match self {
            StatementSelector::Membership => &[StatementKind::Membership],
            StatementSelector::Continuity => &[StatementKind::Continuity],
            StatementSelector::Unlinkability => &[StatementKind::Unlinkability],
            StatementSelector::All => {
                &[StatementKind::Membership, StatementKind::Continuity, StatementKind::Unlinkability]
            }
        }
    }
}

/// A single concrete statement kind, as opposed to [`StatementSelector`]'s
/// `All` shorthand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatementKind {
    Membership,
    Continuity,
    Unlinkability,
}

impl StatementKind {
    /// The wire tag this kind's responses are reported under, e.g.
    /// `membership_v2` as referenced by scenario S3 in spec.md §8.
    pub fn response_tag(self, schema_version: u8) -> String {
        let name = match self {
            StatementKind::Membership => "membership",
            StatementKind::Continuity => "continuity",
            StatementKind::Unlinkability => "unlinkability",
        };
        format!("{name}_v{schema_version}")
    }
}

/// A client's request for one or more statement proofs, opening the
/// exchange on `/privacyzk/1.0.0`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofRequest {
    pub statement: StatementSelector,
    pub schema_version: u8,
    pub depth: u8,
    pub nonce: [u8; 16],
    pub deadline_ms: u32,
}

/// The outcome of producing one requested statement's proof.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseStatus {
    Ok,
    NotAvailable,
    Failed,
}

/// One statement's response within a batch. `proof_cbor` is present iff
/// `status == OK`; `error` is present iff `status == FAILED`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProofResponse {
    pub statement_tag: String,
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof_cbor: Option<Vec<u8>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Set when the client-visible proof is a locally simulated downgrade
    /// rather than the peer's real output. Must be observable per
    /// spec.md §4.9's "downgrade must be observable" rule.
    #[serde(default, skip_serializing_if = "is_false")]
    pub fallback: bool,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl ProofResponse {
    pub fn ok(statement_tag: String, proof_cbor: Vec<u8>) -> Self {
        ProofResponse { statement_tag, status: ResponseStatus::Ok, proof_cbor: Some(proof_cbor), error: None, fallback: false }
    }

    pub fn not_available(statement_tag: String) -> Self {
        ProofResponse { statement_tag, status: ResponseStatus::NotAvailable, proof_cbor: None, error: None, fallback: false }
    }

    pub fn failed(statement_tag: String, error: String) -> Self {
        ProofResponse { statement_tag, status: ResponseStatus::Failed, proof_cbor: None, error: Some(error), fallback: false }
    }

    pub fn with_fallback(mut self) -> Self {
        self.fallback = true;
        self
    }
}

/// The frame that terminates a proof-exchange batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndOfBatch;

/// The top-level tagged union every frame on the wire decodes to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "frame_type")]
pub enum Frame {
    ProofRequest(ProofRequest),
    ProofResponse(ProofResponse),
    EndOfBatch(EndOfBatch),
}

/// Length-prefixed canonical-CBOR codec for [`Frame`] values. Oversize
/// frames (> [`MAX_FRAME_BYTES`]) close the stream with an `InvalidData`
/// error, per spec.md §6.
pub struct ProofFrameCodec {
    inner: LengthDelimitedCodec,
}

impl ProofFrameCodec {
    pub fn new() -> Self {
        Self {
            inner: LengthDelimitedCodec::builder()
                .length_field_type::<u32>()
                .max_frame_length(MAX_FRAME_BYTES)
                .new_codec(),
        }
    }
}

impl Default for ProofFrameCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ProofFrameCodec {
    type Item = Frame;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(body) = self.inner.decode(src)? {
            let frame: Frame = ciborium::de::from_reader(body.as_ref())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            Ok(Some(frame))
        } else {
            Ok(None)
        }
    }
}

impl Encoder<Frame> for ProofFrameCodec {
    type Error = io::Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let mut body = Vec::new();
        ciborium::ser::into_writer(&item, &mut body)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.inner.encode(Bytes::from(body), dst)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(frame: Frame) -> Frame {
        let mut codec = ProofFrameCodec::new();
        let mut buf = BytesMut::new();
        codec.encode(frame, &mut buf).unwrap();
        codec.decode(&mut buf).unwrap().unwrap()
    }

    #[test]
    fn proof_request_round_trips() {
        let req = ProofRequest {
            statement: StatementSelector::All,
            schema_version: 2,
            depth: 16,
            nonce: [7u8; 16],
            deadline_ms: 5_000,
        };
        match roundtrip(Frame::ProofRequest(req.clone())) {
            Frame::ProofRequest(decoded) => {
                assert_eq!(decoded.schema_version, req.schema_version);
                assert_eq!(decoded.depth, req.depth);
                assert_eq!(decoded.nonce, req.nonce);
                assert_eq!(decoded.deadline_ms, req.deadline_ms);
            }
            _ => panic!("wrong frame variant"),
        }
    }

    #[test]
    fn proof_response_round_trips() {
        let resp = ProofResponse::ok("membership_v2".to_string(), vec![1, 2, 3]);
        match roundtrip(Frame::ProofResponse(resp)) {
            Frame::ProofResponse(decoded) => {
                assert_eq!(decoded.statement_tag, "membership_v2");
                assert_eq!(decoded.status, ResponseStatus::Ok);
                assert_eq!(decoded.proof_cbor, Some(vec![1, 2, 3]));
                assert!(!decoded.fallback);
            }
            _ => panic!("wrong frame variant"),
        }
    }

    #[test]
    fn end_of_batch_round_trips() {
        match roundtrip(Frame::EndOfBatch(EndOfBatch)) {
            Frame::EndOfBatch(_) => {}
            _ => panic!("wrong frame variant"),
        }
    }

    #[test]
    fn statement_selector_all_expands_in_fixed_order() {
        let kinds = StatementSelector::All.expand();
        assert_eq!(kinds, &[StatementKind::Membership, StatementKind::Continuity, StatementKind::Unlinkability]);
    }

    #[test]
    fn oversize_frame_is_rejected() {
        let mut codec = ProofFrameCodec::new();
        let mut buf = BytesMut::new();
        let huge = ProofResponse::ok("membership_v2".to_string(), vec![0u8; MAX_FRAME_BYTES + 1]);
        let err = codec.encode(Frame::ProofResponse(huge), &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
