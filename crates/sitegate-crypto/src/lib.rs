//! # Sitegate Crypto
//!
//! Credential decryption for the sitegate storage gateway.
//!
//! The discovery service publishes each site's storage access key and secret
//! as hex-encoded ciphertext sealed with a password shared between the
//! discovery service and the gateway. This crate provides:
//! - **Named ciphers**: AES-256-GCM (`aes`), NaCl secretbox (`nacl`) and
//!   ChaCha20-Poly1305 (`chacha20`)
//! - **Credential types**: [`EncryptedSecret`] and [`ResolvedCredential`], both
//!   redacted in `Debug` output and never logged
//! - **Decryptor**: [`CredentialDecryptor`], a pure password + cipher pair
//!
//! ## Example
//!
//! ```rust
//! use sitegate_crypto::{CredentialCipher, CredentialDecryptor, SharedPassword};
//!
//! let decryptor = CredentialDecryptor::new(SharedPassword::new("s3cr3t"), CredentialCipher::Aes256Gcm);
//! let sealed = decryptor.encrypt_hex("AKIAEXAMPLE").unwrap();
//! assert_eq!(decryptor.decrypt_hex(&sealed).unwrap().as_str(), "AKIAEXAMPLE");
//! ```

pub mod credential;
pub mod error;
pub mod keys;
pub mod symmetric;

pub use credential::{decrypt, encrypt, CredentialDecryptor, EncryptedSecret, ResolvedCredential};
pub use error::{CryptoError, Result};
pub use keys::{SharedPassword, SymmetricKey, KEY_SIZE, NONCE_SIZE, XNONCE_SIZE};
pub use symmetric::{Aead, CredentialCipher, Nonce};

/// Authentication tag size shared by all supported ciphers
pub const TAG_SIZE: usize = 16;
