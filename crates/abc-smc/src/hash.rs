use abc_core::{AbcError, ErrorInfo};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Serializes a payload to compact JSON bytes.
pub fn to_canonical_json_bytes<T: Serialize>(value: &T) -> Result<Vec<u8>, AbcError> {
    serde_json::to_vec(value)
        .map_err(|err| AbcError::Serde(ErrorInfo::new("canonical-json", err.to_string())))
}

/// Computes a stable hexadecimal hash for the provided serializable payload.
pub fn stable_hash_string<T: Serialize>(value: &T) -> Result<String, AbcError> {
    let bytes = to_canonical_json_bytes(value)?;
    let digest = Sha256::digest(bytes);
    Ok(format!("{:x}", digest))
}
