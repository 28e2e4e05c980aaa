use sha2::{Digest, Sha256};

use super::DIGEST_LEN;

/// SHA-256 fingerprint of `data`.
pub fn fingerprint(data: &[u8]) -> [u8; DIGEST_LEN] {
    Sha256::digest(data).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_is_stable() {
        assert_eq!(fingerprint(b"abc"), fingerprint(b"abc"));
    }

    #[test]
    fn fingerprint_of_empty_input_matches_sha256() {
        let expected = [
            0xe3, 0xb0, 0xc4, 0x42, 0x98, 0xfc, 0x1c, 0x14, 0x9a, 0xfb, 0xf4, 0xc8, 0x99, 0x6f,
            0xb9, 0x24, 0x27, 0xae, 0x41, 0xe4, 0x64, 0x9b, 0x93, 0x4c, 0xa4, 0x95, 0x99, 0x1b,
            0x78, 0x52, 0xb8, 0x55,
        ];
        assert_eq!(fingerprint(b""), expected);
    }

    #[test]
    fn single_byte_change_alters_fingerprint() {
        let mut data = b"hello, world!".to_vec();
        let before = fingerprint(&data);
        data[4] ^= 0x01;
        assert_ne!(before, fingerprint(&data));
    }
}
