//! Stable configuration digest: SHA-256 of a sorted-keys JSON encoding,
//! per `spec.md` §4.5.

use crate::error::ConfigError;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// A hex-encoded SHA-256 digest of a document's canonical JSON form.
///
/// `serde_json` emits object keys in `BTreeMap` order by default (the
/// workspace does not enable the `preserve_order` feature), which gives
/// the sorted-keys encoding `spec.md` §4.5 and §6 require without any
/// extra sorting step here.
pub fn compute(document: &impl Serialize) -> Result<String, ConfigError> {
    let canonical = serde_json::to_vec(document)
        .map_err(|e| ConfigError::Malformed(format!("digest input not serializable: {e}")))?;
    let mut hasher = Sha256::new();
    hasher.update(&canonical);
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn digest_is_stable_regardless_of_field_insertion_order() {
        let a = json!({"b": 2, "a": 1});
        let b = json!({"a": 1, "b": 2});
        assert_eq!(compute(&a).unwrap(), compute(&b).unwrap());
    }

    #[test]
    fn digest_changes_when_a_value_changes() {
        let a = json!({"a": 1});
        let b = json!({"a": 2});
        assert_ne!(compute(&a).unwrap(), compute(&b).unwrap());
    }
}
