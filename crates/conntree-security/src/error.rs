//! Error types for encryption and decryption

/// Errors from a [`crate::CryptographyProvider`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CryptoError {
    /// Cipher text is not valid base64, or plain text is not UTF-8
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Cipher text too short to hold salt, nonce and tag
    #[error("malformed cipher text: {len} bytes (min: {min})")]
    Malformed { len: usize, min: usize },

    /// Cipher could not be initialised from the derived key
    #[error("key initialisation failed: {0}")]
    KeyInit(String),

    /// Encryption failed
    #[error("encryption failed")]
    Encrypt,

    /// Wrong key or tampered cipher text
    #[error("decryption failed")]
    Decrypt,
}
