use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::Zeroizing;

use super::{KEY_LEN, SALT_LEN};
use crate::error::{Error, Result};

/// PBKDF2-HMAC-SHA256 work factor used for newly sealed records.
pub const DEFAULT_ITERATIONS: u32 = 600_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    iterations: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

impl KdfParams {
    pub fn new(iterations: u32) -> Result<Self> {
        let params = Self { iterations };
        params.validate()?;
        Ok(params)
    }

    pub fn iterations(&self) -> u32 {
        self.iterations
    }

    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(Error::InvalidInput(
                "iteration count must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Derive the record key from a password.
///
/// Deterministic in all three inputs; the iteration count always comes from
/// the record being opened, never from the current default.
pub fn derive_key(
    password: &str,
    salt: &[u8; SALT_LEN],
    kdf: KdfParams,
) -> Result<Zeroizing<[u8; KEY_LEN]>> {
    if password.is_empty() {
        return Err(Error::InvalidInput("password cannot be empty".to_string()));
    }
    kdf.validate()?;

    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, kdf.iterations, &mut key[..]);

    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> KdfParams {
        KdfParams::new(1_000).unwrap()
    }

    #[test]
    fn kdf_is_deterministic() {
        let salt = [42u8; 16];

        let k1 = derive_key("password", &salt, fast()).unwrap();
        let k2 = derive_key("password", &salt, fast()).unwrap();

        assert_eq!(*k1, *k2);
    }

    #[test]
    fn kdf_params_affect_output() {
        let salt = [7u8; 16];

        let k1 = derive_key("pw", &salt, KdfParams::new(1_000).unwrap()).unwrap();
        let k2 = derive_key("pw", &salt, KdfParams::new(1_001).unwrap()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn salt_affects_output() {
        let k1 = derive_key("pw", &[1u8; 16], fast()).unwrap();
        let k2 = derive_key("pw", &[2u8; 16], fast()).unwrap();

        assert_ne!(*k1, *k2);
    }

    #[test]
    fn output_is_pbkdf2_hmac_sha256() {
        // RFC 7914 section 11: P = "passwd", S = "salt", c = 1.
        let mut reference = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"passwd", b"salt", 1, &mut reference);
        assert_eq!(
            reference[..8],
            [0x55, 0xac, 0x04, 0x6e, 0x56, 0xe3, 0x08, 0x9f]
        );

        let salt = *b"0123456789abcdef";
        let mut expected = [0u8; 32];
        pbkdf2_hmac::<Sha256>(b"passwd", &salt, 1_000, &mut expected);
        assert_eq!(*derive_key("passwd", &salt, fast()).unwrap(), expected);
    }

    #[test]
    fn empty_password_is_rejected() {
        match derive_key("", &[0u8; 16], fast()) {
            Err(Error::InvalidInput(_)) => {}
            other => panic!("expected InvalidInput, got: {other:?}"),
        }
    }

    #[test]
    fn kdf_invalid_params_fail_gracefully() {
        assert!(KdfParams::new(0).is_err());
    }
}
