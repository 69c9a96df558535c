//! Static statement registry.
//!
//! Maps `(type_tag, version)` to a fixed descriptor: the domain separator
//! folded into that statement's challenge transcript, and the public
//! input keys a well-formed request/proof must carry. Dispatch on an
//! unknown or malformed pair refuses with [`ZkError::BadMetadata`] rather
//! than guessing a default. Adding a new statement version means adding a
//! new descriptor, never mutating an existing one — this is the upgrade
//! seam the crate is built around.

use crate::error::{ZkError, ZkResult};

/// A statement's fixed metadata: its domain separator and the public
/// input keys a well-formed instance must carry.
#[derive(Debug, Clone, Copy)]
pub struct StatementDescriptor {
    pub type_tag: &'static str,
    pub version: u32,
    pub domain_separator: &'static [u8],
    pub required_public_input_keys: &'static [&'static str],
}

pub static MEMBERSHIP_V1: StatementDescriptor = StatementDescriptor {
    type_tag: "anon_set_membership_v1",
    version: 1,
    domain_separator: b"ANON_SET_MEMBERSHIP_V1",
    required_public_input_keys: &["root", "commitment", "ctx_hash", "merkle_path"],
};

pub static UNLINKABILITY_V1: StatementDescriptor = StatementDescriptor {
    type_tag: "session_unlinkability_v1",
    version: 1,
    domain_separator: b"SESSION_UNLINKABILITY_V1",
    required_public_input_keys: &["tag", "commitment", "ctx_hash"],
};

pub static CONTINUITY_V1: StatementDescriptor = StatementDescriptor {
    type_tag: "identity_continuity_v1",
    version: 1,
    domain_separator: b"IDENTITY_CONTINUITY_V1",
    required_public_input_keys: &["commitment_1", "commitment_2", "ctx_hash"],
};

static REGISTRY: &[&StatementDescriptor] = &[&MEMBERSHIP_V1, &UNLINKABILITY_V1, &CONTINUITY_V1];

/// Look up a statement descriptor by its wire type tag and version.
/// Refuses unknown pairs instead of falling back to a default.
pub fn lookup(type_tag: &str, version: u32) -> ZkResult<&'static StatementDescriptor> {
    REGISTRY
        .iter()
        .find(|d| d.type_tag == type_tag && d.version == version)
        .copied()
        .ok_or_else(|| ZkError::BadMetadata(format!("unknown statement {type_tag} v{version}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statements_resolve() {
        assert!(lookup("anon_set_membership_v1", 1).is_ok());
        assert!(lookup("session_unlinkability_v1", 1).is_ok());
        assert!(lookup("identity_continuity_v1", 1).is_ok());
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(matches!(lookup("made_up_statement", 1), Err(ZkError::BadMetadata(_))));
    }

    #[test]
    fn unknown_version_is_rejected() {
        assert!(matches!(
            lookup("anon_set_membership_v1", 99),
            Err(ZkError::BadMetadata(_))
        ));
    }
}
