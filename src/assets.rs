//! Asset loader: locates pre-generated verification material on disk by
//! `(statement, schema_version, depth)`.
//!
//! Path template: `{assets_dir}/{statement}/v{schema}/depth-{d}/{file}`,
//! per spec.md §4.10 and the canonical subtree in §6. A missing file is
//! `NotAvailable`, not fatal; a present-but-malformed file is `BadAsset`.

use std::path::{Path, PathBuf};

use crate::error::{ZkError, ZkResult};

/// The three recognized statement directories under the assets root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetStatement {
    Membership,
    Continuity,
    Unlinkability,
}

impl AssetStatement {
    fn dir_name(self) -> &'static str {
        match self {
            AssetStatement::Membership => "membership",
            AssetStatement::Continuity => "continuity",
            AssetStatement::Unlinkability => "unlinkability",
        }
    }

    /// The enumerated, recognized file names for this statement, in
    /// `(kind, file_name)` pairs, matching the canonical subtree in
    /// spec.md §6.
    fn file_names(self) -> [(&'static str, &'static str); 3] {
        match self {
            AssetStatement::Membership => [
                ("vk", "membership_vk.bin"),
                ("public_inputs", "public_inputs.bin"),
                ("proof", "membership_proof.bin"),
            ],
            AssetStatement::Continuity => [
                ("vk", "continuity_vk.bin"),
                ("public_inputs", "continuity_public_inputs.bin"),
                ("proof", "continuity_proof.bin"),
            ],
            AssetStatement::Unlinkability => [
                ("vk", "unlinkability_vk.bin"),
                ("public_inputs", "unlinkability_public_inputs.bin"),
                ("proof", "unlinkability_proof.bin"),
            ],
        }
    }
}

/// An in-memory description of one `(statement, schema_version, depth)`
/// tuple's files on disk. Ephemeral: built fresh per request, never
/// serialized to the wire.
#[derive(Debug, Clone)]
pub struct AssetManifest {
    pub statement: AssetStatement,
    pub schema_version: u8,
    pub depth: u8,
    pub vk: Vec<u8>,
    pub public_inputs: Vec<u8>,
    pub proof: Vec<u8>,
}

fn statement_root(assets_dir: &Path, statement: AssetStatement, schema_version: u8, depth: u8) -> PathBuf {
    assets_dir
        .join(statement.dir_name())
        .join(format!("v{schema_version}"))
        .join(format!("depth-{depth}"))
}

fn read_recognized_file(dir: &Path, file_name: &str) -> ZkResult<Vec<u8>> {
    let path = dir.join(file_name);
    match std::fs::read(&path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ZkError::NotAvailable(format!("{}", path.display())))
        }
        Err(e) => Err(ZkError::BadAsset(format!("{}: {e}", path.display()))),
    }
}

/// Load the asset manifest for `(statement, schema_version, depth)` rooted
/// at `assets_dir`. Returns [`ZkError::NotAvailable`] if any recognized
/// file is missing, and [`ZkError::BadAsset`] if a file exists but cannot
/// be read or is empty (an on-disk placeholder with no real content).
pub fn load_manifest(
    assets_dir: &Path,
    statement: AssetStatement,
    schema_version: u8,
    depth: u8,
) -> ZkResult<AssetManifest> {
    let dir = statement_root(assets_dir, statement, schema_version, depth);
    let [(_, vk_name), (_, pi_name), (_, proof_name)] = statement.file_names();

    let vk = read_recognized_file(&dir, vk_name)?;
    let public_inputs = read_recognized_file(&dir, pi_name)?;
    let proof = read_recognized_file(&dir, proof_name)?;

    for (label, bytes) in [("vk", &vk), ("public_inputs", &public_inputs), ("proof", &proof)] {
        if bytes.is_empty() {
            return Err(ZkError::BadAsset(format!("{label} asset is empty at {}", dir.display())));
        }
    }

    Ok(AssetManifest { statement, schema_version, depth, vk, public_inputs, proof })
}
