//! Error types for the sitegate-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur while sealing or opening credentials.
///
/// Messages never carry plaintext or key material.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (wrong password, wrong cipher or tampered data)
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Ciphertext is too short or otherwise malformed
    #[error("invalid ciphertext: {0}")]
    InvalidCiphertext(String),

    /// Cipher name is not registered
    #[error("unsupported cipher: {0}")]
    UnsupportedCipher(String),

    /// Invalid key length
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid nonce
    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    /// Decrypted bytes are not valid UTF-8
    #[error("decrypted credential is not valid UTF-8")]
    InvalidUtf8,

    /// Hex decode error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}
