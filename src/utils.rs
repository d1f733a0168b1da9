use alloy::primitives::{Bytes, B256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;

use crate::error::{Result, SafeError};

/// Decode hex calldata, with or without a `0x` prefix.
pub fn parse_hex_bytes(data: &str) -> Result<Bytes> {
    let stripped = data.strip_prefix("0x").unwrap_or(data);
    hex::decode(stripped)
        .map(Bytes::from)
        .map_err(|e| SafeError::InvalidInput(format!("hex data {data}: {e}")))
}

/// Render bytes the way the Safe Transaction Service expects (`0x` for empty).
pub fn to_prefixed_hex(data: &[u8]) -> String {
    format!("0x{}", hex::encode(data))
}

/// Create a signer from a hex-encoded private key, bound to `chain_id`.
pub fn create_signer_from_hex_with_chain_id(
    private_key_hex: &str,
    chain_id: Option<u64>,
) -> Result<PrivateKeySigner> {
    let stripped = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);
    let bytes = hex::decode(stripped)
        .map_err(|_| SafeError::InvalidInput("private key is not valid hex".to_string()))?;
    if bytes.len() != 32 {
        return Err(SafeError::InvalidInput(format!(
            "private key must be 32 bytes, got {}",
            bytes.len()
        )));
    }
    let signer = PrivateKeySigner::from_bytes(&B256::from_slice(&bytes))
        .map_err(|_| {
            SafeError::InvalidInput("private key is not a valid secp256k1 scalar".to_string())
        })?;
    Ok(signer.with_chain_id(chain_id))
}
