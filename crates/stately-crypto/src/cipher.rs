use chacha20poly1305::{
    aead::{Aead, KeyInit},
    XChaCha20Poly1305, XNonce,
};

use crate::error::{EnvelopeError, EnvelopeResult};

/// BLAKE3 key-derivation context for stretching caller key material.
const KEY_CONTEXT: &str = "stately 2024-06 state envelope key v1";

/// XChaCha20 nonce length in bytes.
pub const NONCE_LEN: usize = 24;

/// Authenticated cipher used for state envelopes.
///
/// Caller key material of any length is stretched into a 256-bit key with
/// BLAKE3's key derivation mode. Sealed output is laid out as:
///
/// ```text
/// [24 bytes: random nonce][N bytes: ciphertext][16 bytes: Poly1305 tag]
/// ```
pub struct StateCipher {
    cipher: XChaCha20Poly1305,
}

impl StateCipher {
    /// Build a cipher from raw key material. The material must be non-empty.
    pub fn new(key_material: &[u8]) -> EnvelopeResult<Self> {
        if key_material.is_empty() {
            return Err(EnvelopeError::KeyMissing);
        }
        let key = blake3::derive_key(KEY_CONTEXT, key_material);
        Ok(Self {
            cipher: XChaCha20Poly1305::new((&key).into()),
        })
    }

    /// Encrypt `plaintext` under a fresh random nonce.
    pub fn seal(&self, plaintext: &[u8]) -> EnvelopeResult<Vec<u8>> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut nonce);

        let ciphertext = self
            .cipher
            .encrypt(XNonce::from_slice(&nonce), plaintext)
            .map_err(|e| EnvelopeError::Cipher(e.to_string()))?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Authenticate and decrypt output produced by [`StateCipher::seal`].
    pub fn open(&self, sealed: &[u8]) -> EnvelopeResult<Vec<u8>> {
        if sealed.len() < NONCE_LEN {
            return Err(EnvelopeError::Cipher(format!(
                "sealed data too short: {} bytes",
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(NONCE_LEN);
        self.cipher
            .decrypt(XNonce::from_slice(nonce), ciphertext)
            .map_err(|_| EnvelopeError::Cipher("authentication failed".into()))
    }
}

impl std::fmt::Debug for StateCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "StateCipher(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seal_open_roundtrip() {
        let cipher = StateCipher::new(b"thisishardlysecure").unwrap();
        let sealed = cipher.seal(b"terraform state").unwrap();
        assert_eq!(cipher.open(&sealed).unwrap(), b"terraform state");
    }

    #[test]
    fn empty_key_rejected() {
        assert_eq!(StateCipher::new(b"").unwrap_err(), EnvelopeError::KeyMissing);
    }

    #[test]
    fn wrong_key_fails() {
        let sealed = StateCipher::new(b"key-one").unwrap().seal(b"data").unwrap();
        let result = StateCipher::new(b"key-two").unwrap().open(&sealed);
        assert!(matches!(result, Err(EnvelopeError::Cipher(_))));
    }

    #[test]
    fn tampered_data_fails() {
        let cipher = StateCipher::new(b"key").unwrap();
        let mut sealed = cipher.seal(b"data").unwrap();
        let last = sealed.len() - 1;
        sealed[last] ^= 0xFF;
        assert!(matches!(cipher.open(&sealed), Err(EnvelopeError::Cipher(_))));
    }

    #[test]
    fn truncated_data_fails() {
        let cipher = StateCipher::new(b"key").unwrap();
        assert!(matches!(cipher.open(&[0u8; 10]), Err(EnvelopeError::Cipher(_))));
    }

    #[test]
    fn nonces_differ_between_seals() {
        let cipher = StateCipher::new(b"key").unwrap();
        let a = cipher.seal(b"same").unwrap();
        let b = cipher.seal(b"same").unwrap();
        assert_ne!(a[..NONCE_LEN], b[..NONCE_LEN]);
    }
}
