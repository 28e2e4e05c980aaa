//! Cryptographic primitives for sealed records.
//!
//! Provides password-based key derivation, authenticated encryption and
//! content fingerprints.

pub mod aead;
pub mod digest;
pub mod kdf;

pub use aead::{generate_nonce, generate_salt, open, seal};
pub use digest::fingerprint;
pub use kdf::{KdfParams, derive_key};

/// Length of the salt (16 bytes).
pub const SALT_LEN: usize = 16;
/// Length of the nonce (12 bytes for ChaCha20-Poly1305).
pub const NONCE_LEN: usize = 12;
/// Length of the encryption key (32 bytes / 256 bits).
pub const KEY_LEN: usize = 32;
/// Length of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;
/// Length of a SHA-256 fingerprint.
pub const DIGEST_LEN: usize = 32;
