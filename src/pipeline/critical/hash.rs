use std::collections::BTreeMap;

use base64::Engine;
use sha2::{Digest, Sha256};

/// SHA-256 over the canonical JSON of a record's fields, base64 encoded.
///
/// Fields are keyed by name in a sorted map so the digest does not depend on
/// declaration order. Absent fields hash as `null`.
pub fn preservation_hash(fields: &[(&'static str, Option<&str>)]) -> String {
    let canonical: BTreeMap<&str, Option<&str>> = fields.iter().copied().collect();
    // A map of str keys to optional strings always serializes.
    let bytes = serde_json::to_vec(&canonical).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    base64::engine::general_purpose::STANDARD.encode(digest)
}
