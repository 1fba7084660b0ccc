//! Key material derived from the shared discovery password

use crate::{CryptoError, Result};
use md5::{Digest, Md5};
use serde::{Deserialize, Deserializer};
use sha2::Sha256;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (96 bits for AES-GCM/ChaCha20-Poly1305)
pub const NONCE_SIZE: usize = 12;

/// Size of an extended nonce in bytes (192 bits for NaCl secretbox)
pub const XNONCE_SIZE: usize = 24;

/// The password shared between the discovery service and the gateway.
///
/// Zeroized on drop and redacted in `Debug`.
#[derive(Clone, Default, Zeroize, ZeroizeOnDrop)]
pub struct SharedPassword(String);

impl SharedPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self(password.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for SharedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SharedPassword(<redacted>)")
    }
}

impl<'de> Deserialize<'de> for SharedPassword {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self)
    }
}

/// A 256-bit symmetric key
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SymmetricKey {
    key: [u8; KEY_SIZE],
}

impl SymmetricKey {
    /// Create a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Key used by the `aes` cipher: the lowercase hex MD5 digest of the
    /// password, taken as 32 ASCII bytes.
    pub fn from_password_md5_hex(password: &SharedPassword) -> Self {
        let digest = Md5::digest(password.expose().as_bytes());
        let mut encoded = hex::encode(digest);
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(encoded.as_bytes());
        encoded.zeroize();
        Self { key }
    }

    /// Key used by the `chacha20` cipher: SHA-256 of the password
    pub fn from_password_sha256(password: &SharedPassword) -> Self {
        let digest = Sha256::digest(password.expose().as_bytes());
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(&digest);
        Self { key }
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}
