//! The `/privacyzk/1.0.0` proof-exchange protocol: frames, codec, server
//! and client, per spec.md §4.9 and §6.

pub mod client;
pub mod frames;
pub mod server;

/// The protocol identifier this crate's wire format implements.
pub const PROTOCOL_ID: &str = "/privacyzk/1.0.0";
