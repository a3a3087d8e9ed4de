//! Identifier derivation for legacy records.
//!
//! A legacy key is `keccak256(owner_id_be32 || content_ref_utf8)`, the same
//! bytes Solidity hashes for `keccak256(abi.encodePacked(uint256, string))`.

use crate::common::Hash;
use log::trace;
use tiny_keccak::{Hasher, Keccak};

/// Width of the left-padded owner id in the packed encoding
pub const OWNER_ID_WIDTH: usize = 32;

/// Canonical packed encoding of an `(owner_id, content_ref)` pair
pub fn encode_packed(owner_id: u64, content_ref: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(OWNER_ID_WIDTH + content_ref.len());
    out.extend_from_slice(&[0u8; OWNER_ID_WIDTH - 8]);
    out.extend_from_slice(&owner_id.to_be_bytes());
    out.extend_from_slice(content_ref.as_bytes());
    out
}

/// Keccak-256 digest of arbitrary bytes
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    Hash::new(output)
}

/// Derive the record key for an owner and content reference
pub fn derive_legacy_key(owner_id: u64, content_ref: &str) -> Hash {
    let key = keccak256(&encode_packed(owner_id, content_ref));
    trace!("Derived legacy key {} for owner {}", key, owner_id);
    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keccak_of_empty_input() {
        assert_eq!(
            keccak256(b"").to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn owner_id_is_left_padded() {
        let packed = encode_packed(1, "Qm");
        assert_eq!(packed.len(), 34);
        assert!(packed[..31].iter().all(|b| *b == 0));
        assert_eq!(packed[31], 1);
        assert_eq!(&packed[32..], b"Qm");
    }

    #[test]
    fn derivation_is_deterministic() {
        assert_eq!(
            derive_legacy_key(1, "QmTest123"),
            derive_legacy_key(1, "QmTest123")
        );
    }

    #[test]
    fn both_inputs_feed_the_key() {
        let base = derive_legacy_key(1, "QmTest123");
        assert_ne!(base, derive_legacy_key(2, "QmTest123"));
        assert_ne!(base, derive_legacy_key(1, "QmTest124"));
    }
}
