// Record fingerprints, canonical JSON bytes and content addresses.

use primitive_types::H256;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Multihash prefix for sha2-256 with a 32-byte digest.
const SHA2_256_MULTIHASH: [u8; 2] = [0x12, 0x20];
/// Length of a base58btc CIDv0 string (`Qm...`).
pub const CID_V0_LEN: usize = 46;
/// Shortest base32 CIDv1 we accept (`b` prefix + encoded cid).
const CID_V1_MIN_LEN: usize = 50;

/// A helper function to sort a JSON object's keys recursively.
/// This is essential for canonical serialization.
fn sort_json_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted_map: BTreeMap<String, Value> = map
                .iter()
                .map(|(k, v)| (k.clone(), sort_json_value(v)))
                .collect();
            Value::Object(sorted_map.into_iter().collect())
        }
        Value::Array(arr) => {
            let sorted_arr = arr.iter().map(sort_json_value).collect();
            Value::Array(sorted_arr)
        }
        _ => value.clone(),
    }
}

/// Serializes a JSON value with recursively sorted keys, so equal documents
/// always produce the same bytes (and therefore the same content address).
pub fn canonical_json_bytes(value: &Value) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(&sort_json_value(value))
}

/// The on-chain fingerprint of a credential: SHA-256 over the UTF-8 bytes of
/// the payload's `data` statement. Metadata is deliberately not committed.
pub fn record_hash(data: &str) -> H256 {
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    H256::from_slice(&hasher.finalize())
}

/// Deterministic CIDv0 for a byte string: base58btc(sha2-256 multihash).
pub fn content_address(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    let mut multihash = Vec::with_capacity(SHA2_256_MULTIHASH.len() + digest.len());
    multihash.extend_from_slice(&SHA2_256_MULTIHASH);
    multihash.extend_from_slice(&digest);
    bs58::encode(multihash).into_string()
}

/// Accepts CIDv0 (`Qm` + base58btc sha2-256 multihash) and base32 CIDv1 (`b...`).
pub fn is_valid_content_address(candidate: &str) -> bool {
    if candidate.len() == CID_V0_LEN && candidate.starts_with("Qm") {
        return match bs58::decode(candidate).into_vec() {
            Ok(bytes) => bytes.len() == 34 && bytes[..2] == SHA2_256_MULTIHASH,
            Err(_) => false,
        };
    }
    if let Some(rest) = candidate.strip_prefix('b') {
        return candidate.len() >= CID_V1_MIN_LEN
            && rest
                .chars()
                .all(|c| c.is_ascii_lowercase() || ('2'..='7').contains(&c));
    }
    false
}

pub fn parse_h256_hex(s: &str) -> Result<H256, String> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|_| "invalid hex".to_string())?;
    if bytes.len() != 32 {
        return Err("expected 32-byte hex string".to_string());
    }
    Ok(H256::from_slice(&bytes))
}
