//! Text-safe encoding and randomness helpers.

use base64::{Engine as _, engine::general_purpose::STANDARD};
use getrandom::fill;

use crate::error::{Error, Result};

/// Encode bytes as standard, padded base64.
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode standard, padded base64.
pub fn decode(text: &str) -> Result<Vec<u8>> {
    STANDARD
        .decode(text)
        .map_err(|e| Error::MalformedRecord(format!("invalid base64: {e}")))
}

/// Decode base64 into a fixed-size array, rejecting any other length.
pub fn decode_array<const N: usize>(text: &str, field: &str) -> Result<[u8; N]> {
    let bytes = decode(text)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::MalformedRecord(format!("{field} must be {N} bytes, got {len}")))
}

/// Lowercase hex, two characters per byte.
pub fn to_hex(data: &[u8]) -> String {
    data.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Fill buffer with cryptographically secure random bytes
pub fn secure_random(buf: &mut [u8]) -> Result<()> {
    fill(buf).map_err(|_| Error::Random)
}

/// Fresh random array of `N` bytes.
pub fn random_array<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    secure_random(&mut out)?;
    Ok(out)
}
