//! Password-keyed symmetric encryption
//!
//! Cipher text layout (base64 encoded):
//!
//! ```text
//! | salt (16) | nonce (12) | AES-256-GCM cipher text + tag |
//! ```
//!
//! The AES key is derived from the password and the per-message salt with
//! PBKDF2-HMAC-SHA256. A wrong password surfaces as a GCM tag mismatch, never
//! as garbage plain text.

use std::fmt::Debug;

use aes_gcm::aead::Aead;
use aes_gcm::{Aes256Gcm, KeyInit, Nonce};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::RngCore;
use secrecy::{ExposeSecret, SecretString};
use sha2::Sha256;

use crate::error::CryptoError;

const SALT_LEN: usize = 16;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// Encrypts and decrypts text with a password
pub trait CryptographyProvider: Send + Sync + Debug {
    /// Encrypt `plain_text` under `key`
    ///
    /// # Errors
    /// Returns [`CryptoError`] if the cipher cannot be initialised or fails
    fn encrypt(&self, plain_text: &str, key: &SecretString) -> Result<String, CryptoError>;

    /// Decrypt `cipher_text` produced by [`CryptographyProvider::encrypt`]
    ///
    /// # Errors
    /// - [`CryptoError::Decrypt`] for a wrong key or tampered input
    /// - [`CryptoError::Encoding`] / [`CryptoError::Malformed`] for bad input
    fn decrypt(&self, cipher_text: &str, key: &SecretString) -> Result<String, CryptoError>;
}

/// AES-256-GCM provider with a salted PBKDF2-HMAC-SHA256 key derivation
#[derive(Debug, Clone, Copy)]
pub struct AesGcmCryptographyProvider {
    kdf_rounds: u32,
}

impl AesGcmCryptographyProvider {
    /// Key derivation rounds used by [`AesGcmCryptographyProvider::new`]
    pub const DEFAULT_KDF_ROUNDS: u32 = 10_000;

    /// Create provider with default key derivation cost
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            kdf_rounds: Self::DEFAULT_KDF_ROUNDS,
        }
    }

    /// Create provider with a custom number of key derivation rounds
    ///
    /// Both sides of a store must agree on the value.
    #[inline]
    #[must_use]
    pub fn with_kdf_rounds(rounds: u32) -> Self {
        Self {
            kdf_rounds: rounds.max(1),
        }
    }

    fn derive_key(&self, key: &SecretString, salt: &[u8]) -> [u8; 32] {
        let mut derived = [0u8; 32];
        pbkdf2::pbkdf2_hmac::<Sha256>(
            key.expose_secret().as_bytes(),
            salt,
            self.kdf_rounds,
            &mut derived,
        );
        derived
    }

    fn cipher(&self, key: &SecretString, salt: &[u8]) -> Result<Aes256Gcm, CryptoError> {
        let derived = self.derive_key(key, salt);
        Aes256Gcm::new_from_slice(&derived).map_err(|e| CryptoError::KeyInit(e.to_string()))
    }
}

impl Default for AesGcmCryptographyProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptographyProvider for AesGcmCryptographyProvider {
    fn encrypt(&self, plain_text: &str, key: &SecretString) -> Result<String, CryptoError> {
        let mut salt = [0u8; SALT_LEN];
        let mut nonce = [0u8; NONCE_LEN];
        let mut rng = rand::rng();
        rng.fill_bytes(&mut salt);
        rng.fill_bytes(&mut nonce);

        let cipher_text = self
            .cipher(key, &salt)?
            .encrypt(Nonce::from_slice(&nonce), plain_text.as_bytes())
            .map_err(|_| CryptoError::Encrypt)?;

        let mut out = Vec::with_capacity(SALT_LEN + NONCE_LEN + cipher_text.len());
        out.extend_from_slice(&salt);
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&cipher_text);
        Ok(STANDARD.encode(out))
    }

    fn decrypt(&self, cipher_text: &str, key: &SecretString) -> Result<String, CryptoError> {
        let raw = STANDARD
            .decode(cipher_text.trim())
            .map_err(|e| CryptoError::Encoding(e.to_string()))?;
        let min = SALT_LEN + NONCE_LEN + TAG_LEN;
        if raw.len() < min {
            return Err(CryptoError::Malformed { len: raw.len(), min });
        }

        let (salt, rest) = raw.split_at(SALT_LEN);
        let (nonce, body) = rest.split_at(NONCE_LEN);
        let plain = self
            .cipher(key, salt)?
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|_| CryptoError::Decrypt)?;
        String::from_utf8(plain).map_err(|e| CryptoError::Encoding(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> SecretString {
        SecretString::from(s.to_owned())
    }

    fn provider() -> AesGcmCryptographyProvider {
        AesGcmCryptographyProvider::with_kdf_rounds(16)
    }

    #[test]
    fn decrypts_with_the_same_key() {
        let p = provider();
        let sealed = p.encrypt("hello", &key("pw")).unwrap();
        assert_eq!(p.decrypt(&sealed, &key("pw")).unwrap(), "hello");
    }

    #[test]
    fn wrong_key_is_a_decrypt_error() {
        let p = provider();
        let sealed = p.encrypt("hello", &key("pw")).unwrap();
        assert_eq!(p.decrypt(&sealed, &key("other")), Err(CryptoError::Decrypt));
    }

    #[test]
    fn same_input_encrypts_differently() {
        let p = provider();
        let a = p.encrypt("hello", &key("pw")).unwrap();
        let b = p.encrypt("hello", &key("pw")).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn rejects_non_base64() {
        let err = provider().decrypt("not base64!!", &key("pw")).unwrap_err();
        assert!(matches!(err, CryptoError::Encoding(_)));
    }

    #[test]
    fn rejects_truncated_input() {
        let short = STANDARD.encode([0u8; 10]);
        let err = provider().decrypt(&short, &key("pw")).unwrap_err();
        assert_eq!(err, CryptoError::Malformed { len: 10, min: 44 });
    }

    #[test]
    fn tampering_is_detected() {
        let p = provider();
        let sealed = p.encrypt("hello", &key("pw")).unwrap();
        let mut raw = STANDARD.decode(&sealed).unwrap();
        let last = raw.len() - 1;
        raw[last] ^= 0xFF;
        let tampered = STANDARD.encode(raw);
        assert_eq!(p.decrypt(&tampered, &key("pw")), Err(CryptoError::Decrypt));
    }

    #[test]
    fn derived_key_matches_pbkdf2_sha256() {
        let derived =
            AesGcmCryptographyProvider::with_kdf_rounds(1).derive_key(&key("password"), b"salt");
        assert_eq!(
            derived,
            [
                0x12, 0x0f, 0xb6, 0xcf, 0xfc, 0xf8, 0xb3, 0x2c, 0x43, 0xe7, 0x22, 0x52, 0x56, 0xc4,
                0xf8, 0x37, 0xa8, 0x65, 0x48, 0xc9, 0x2c, 0xcc, 0x35, 0x48, 0x08, 0x05, 0x98, 0x7c,
                0xb7, 0x0b, 0xe1, 0x7b,
            ]
        );
    }

    #[test]
    fn kdf_rounds_must_match() {
        let sealed = provider().encrypt("hello", &key("pw")).unwrap();
        let other = AesGcmCryptographyProvider::with_kdf_rounds(17);
        assert_eq!(other.decrypt(&sealed, &key("pw")), Err(CryptoError::Decrypt));
    }
}
