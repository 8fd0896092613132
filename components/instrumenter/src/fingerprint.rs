//! Rewriter fingerprint
//!
//! A content hash of the classification and rewriting logic. A module
//! stamped with a different fingerprint was produced by another version of
//! the rewriter and has to be restored and rewritten.

use bytecode_system::Module;
use std::sync::OnceLock;

/// Metadata key the fingerprint is stored under
pub const FINGERPRINT_KEY: &str = "ivmp.rewriter.fingerprint";

/// Version of the hook calling convention
const HOOK_PROTOCOL: &[u8] = b"ivmp-hook/1";

static CURRENT: OnceLock<String> = OnceLock::new();

/// Fingerprint of the rewriter compiled into this binary
pub fn current() -> &'static str {
    CURRENT.get_or_init(|| {
        compute(&[
            HOOK_PROTOCOL,
            &include_bytes!("classifier.rs")[..],
            &include_bytes!("rewriter.rs")[..],
        ])
    })
}

/// Hash `parts` into a lowercase hex fingerprint
pub fn compute(parts: &[&[u8]]) -> String {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hex::encode(hasher.finalize().as_bytes())
}

/// How a module's stamp relates to the current fingerprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stamp {
    /// Never rewritten
    Unstamped,
    /// Rewritten by this rewriter
    Current,
    /// Rewritten by another rewriter version
    Stale(String),
}

/// Compare a module's stamp with `fingerprint`
pub fn stamp_of(module: &Module, fingerprint: &str) -> Stamp {
    match module.metadata(FINGERPRINT_KEY) {
        None => Stamp::Unstamped,
        Some(found) if found == fingerprint => Stamp::Current,
        Some(found) => Stamp::Stale(found.to_string()),
    }
}

/// Stamp a module with `fingerprint`
pub fn stamp(module: &mut Module, fingerprint: &str) {
    module
        .metadata
        .insert(FINGERPRINT_KEY.to_string(), fingerprint.to_string());
}
