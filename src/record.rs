//! Sealed records: the unit of persistence and exchange.

use chrono::{DateTime, Utc};
use tracing::warn;
use zeroize::Zeroizing;

use crate::crypto::{self, DIGEST_LEN, KdfParams, NONCE_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// One password-sealed buffer plus everything needed to open it again.
///
/// Records are immutable once created; replacing one means sealing a new
/// record under the same identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub(crate) identifier: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) size_bytes: u64,
    pub(crate) ciphertext: Vec<u8>,
    pub(crate) nonce: [u8; NONCE_LEN],
    pub(crate) salt: [u8; SALT_LEN],
    pub(crate) kdf: KdfParams,
    pub(crate) integrity_fingerprint: Option<[u8; DIGEST_LEN]>,
    pub(crate) content_type: Option<String>,
}

impl Record {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Plaintext length. Informational only, not authenticated.
    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    pub fn ciphertext(&self) -> &[u8] {
        &self.ciphertext
    }

    pub fn nonce(&self) -> &[u8; NONCE_LEN] {
        &self.nonce
    }

    pub fn salt(&self) -> &[u8; SALT_LEN] {
        &self.salt
    }

    pub fn kdf(&self) -> KdfParams {
        self.kdf
    }

    pub fn iteration_count(&self) -> u32 {
        self.kdf.iterations()
    }

    pub fn integrity_fingerprint(&self) -> Option<&[u8; DIGEST_LEN]> {
        self.integrity_fingerprint.as_ref()
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Attach an opaque, unauthenticated content-type tag.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// Plaintext recovered from a record.
#[derive(Debug)]
pub struct Decrypted {
    pub plaintext: Zeroizing<Vec<u8>>,
    /// `false` when the stored fingerprint disagrees with the recovered
    /// plaintext. Authentication already succeeded, so this signals a
    /// logic error upstream rather than tampering.
    pub integrity_ok: bool,
}

/// Seal `plaintext` under `password` with a fresh salt and nonce.
pub fn encrypt_to_record(
    identifier: &str,
    plaintext: &[u8],
    password: &str,
    kdf: KdfParams,
) -> Result<Record> {
    if identifier.is_empty() {
        return Err(Error::InvalidInput("identifier cannot be empty".to_string()));
    }
    if password.is_empty() {
        return Err(Error::InvalidInput("password cannot be empty".to_string()));
    }

    let salt = crypto::generate_salt()?;
    let nonce = crypto::generate_nonce()?;
    let key = crypto::derive_key(password, &salt, kdf)?;
    let integrity_fingerprint = crypto::fingerprint(plaintext);
    let ciphertext = crypto::seal(plaintext, &key[..], &nonce)?;

    Ok(Record {
        identifier: identifier.to_string(),
        created_at: Utc::now(),
        size_bytes: plaintext.len() as u64,
        ciphertext,
        nonce,
        salt,
        kdf,
        integrity_fingerprint: Some(integrity_fingerprint),
        content_type: None,
    })
}

/// Open `record` with `password`.
///
/// Any authentication failure surfaces as [`Error::WrongPasswordOrCorruptData`].
pub fn decrypt_from_record(record: &Record, password: &str) -> Result<Decrypted> {
    let key = crypto::derive_key(password, &record.salt, record.kdf)?;

    let plaintext = match crypto::open(&record.ciphertext, &key[..], &record.nonce) {
        Ok(plaintext) => plaintext,
        Err(Error::AuthenticationFailure) => return Err(Error::WrongPasswordOrCorruptData),
        Err(e) => return Err(e),
    };

    let integrity_ok = match &record.integrity_fingerprint {
        Some(expected) => crypto::fingerprint(&plaintext) == *expected,
        None => true,
    };
    if !integrity_ok {
        warn!(
            identifier = %record.identifier,
            "fingerprint mismatch after authenticated decryption"
        );
    }

    Ok(Decrypted {
        plaintext,
        integrity_ok,
    })
}
