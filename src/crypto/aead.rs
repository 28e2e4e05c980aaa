use super::{NONCE_LEN, SALT_LEN};
use crate::encoding::random_array;
use crate::error::{Error, Result};
use chacha20poly1305::{
    ChaCha20Poly1305, Nonce,
    aead::{Aead, KeyInit},
};
use zeroize::Zeroizing;

/// Generate salt
pub fn generate_salt() -> Result<[u8; SALT_LEN]> {
    random_array()
}

/// Generate a fresh nonce. Never derived from content.
pub fn generate_nonce() -> Result<[u8; NONCE_LEN]> {
    random_array()
}

fn cipher_and_nonce(key: &[u8], nonce: &[u8]) -> Result<(ChaCha20Poly1305, Nonce)> {
    if nonce.len() != NONCE_LEN {
        return Err(Error::InvalidKeyOrNonceLength);
    }
    let cipher =
        ChaCha20Poly1305::new_from_slice(key).map_err(|_| Error::InvalidKeyOrNonceLength)?;
    Ok((cipher, *Nonce::from_slice(nonce)))
}

/// Encrypt plaintext, appending the 16-byte Poly1305 tag.
pub fn seal(plaintext: &[u8], key: &[u8], nonce: &[u8]) -> Result<Vec<u8>> {
    let (cipher, nonce) = cipher_and_nonce(key, nonce)?;

    cipher
        .encrypt(&nonce, plaintext)
        .map_err(|_| Error::InvalidInput("plaintext too large to seal".to_string()))
}

/// Verify the tag and decrypt. No plaintext is released unless the tag verifies.
pub fn open(ciphertext: &[u8], key: &[u8], nonce: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
    let (cipher, nonce) = cipher_and_nonce(key, nonce)?;

    let plaintext = cipher
        .decrypt(&nonce, ciphertext)
        .map_err(|_| Error::AuthenticationFailure)?;
    Ok(Zeroizing::new(plaintext))
}
