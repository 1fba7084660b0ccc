//! Symmetric encryption using AES-GCM, ChaCha20-Poly1305 and NaCl secretbox
//!
//! Credentials are sealed as `nonce || ciphertext || tag` and carried as hex.
//! NaCl secretbox keeps its native `nonce || tag || ciphertext` layout.

use crate::{
    keys::{SharedPassword, SymmetricKey, NONCE_SIZE, XNONCE_SIZE},
    CryptoError, Result, TAG_SIZE,
};
use aes_gcm::{
    aead::{generic_array::GenericArray, Aead as AeadTrait, AeadInPlace},
    Aes256Gcm, KeyInit,
};
use chacha20poly1305::ChaCha20Poly1305;
use crypto_secretbox::XSalsa20Poly1305;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A nonce sized for one cipher
#[derive(Clone, Debug)]
pub struct Nonce {
    bytes: Vec<u8>,
}

impl Nonce {
    /// Generate a random nonce for `cipher`
    pub fn generate(cipher: CredentialCipher) -> Self {
        let mut bytes = vec![0u8; cipher.nonce_size()];
        rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
        Self { bytes }
    }

    /// Create from raw bytes, checked against the nonce size of `cipher`
    pub fn from_bytes(cipher: CredentialCipher, bytes: &[u8]) -> Result<Self> {
        if bytes.len() != cipher.nonce_size() {
            return Err(CryptoError::InvalidNonce(format!(
                "{} nonce must be {} bytes, got {}",
                cipher.algorithm_id(),
                cipher.nonce_size(),
                bytes.len()
            )));
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Ciphers that may be named in the gateway configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CredentialCipher {
    /// AES-256-GCM keyed by the hex MD5 digest of the password
    #[default]
    Aes256Gcm,
    /// ChaCha20-Poly1305 keyed by the SHA-256 digest of the password
    ChaCha20Poly1305,
    /// NaCl secretbox (XSalsa20-Poly1305) keyed by the hex MD5 digest of the password
    NaclSecretbox,
}

impl CredentialCipher {
    /// Canonical configuration name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Aes256Gcm => "aes",
            Self::ChaCha20Poly1305 => "chacha20",
            Self::NaclSecretbox => "nacl",
        }
    }

    /// Get the algorithm identifier string
    pub fn algorithm_id(&self) -> &'static str {
        match self {
            Self::Aes256Gcm => "AES-256-GCM",
            Self::ChaCha20Poly1305 => "ChaCha20-Poly1305",
            Self::NaclSecretbox => "XSalsa20-Poly1305",
        }
    }

    pub fn nonce_size(&self) -> usize {
        match self {
            Self::Aes256Gcm | Self::ChaCha20Poly1305 => NONCE_SIZE,
            Self::NaclSecretbox => XNONCE_SIZE,
        }
    }

    /// Derive this cipher's key from the shared password
    pub fn derive_key(&self, password: &SharedPassword) -> SymmetricKey {
        match self {
            Self::Aes256Gcm | Self::NaclSecretbox => SymmetricKey::from_password_md5_hex(password),
            Self::ChaCha20Poly1305 => SymmetricKey::from_password_sha256(password),
        }
    }
}

impl FromStr for CredentialCipher {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "aes" | "aes-gcm" | "aes-256-gcm" | "aes256gcm" => Ok(Self::Aes256Gcm),
            "chacha20" | "chacha20-poly1305" | "chacha20poly1305" => Ok(Self::ChaCha20Poly1305),
            "nacl" | "secretbox" | "xsalsa20-poly1305" => Ok(Self::NaclSecretbox),
            other => Err(CryptoError::UnsupportedCipher(other.to_string())),
        }
    }
}

impl TryFrom<String> for CredentialCipher {
    type Error = CryptoError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<CredentialCipher> for String {
    fn from(cipher: CredentialCipher) -> Self {
        cipher.name().to_string()
    }
}

impl fmt::Display for CredentialCipher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// AEAD encryption/decryption interface
pub struct Aead {
    cipher: CredentialCipher,
    key: SymmetricKey,
}

impl Aead {
    /// Create a new AEAD instance with the given key and cipher
    pub fn new(key: SymmetricKey, cipher: CredentialCipher) -> Self {
        Self { cipher, key }
    }

    /// Create an instance keyed from the shared password
    pub fn from_password(password: &SharedPassword, cipher: CredentialCipher) -> Self {
        Self::new(cipher.derive_key(password), cipher)
    }

    /// Encrypt data with the given nonce
    pub fn encrypt(&self, nonce: &Nonce, plaintext: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        match self.cipher {
            CredentialCipher::Aes256Gcm => {
                let nonce_arr = aes_gcm::Nonce::from_slice(nonce.as_bytes());
                let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(nonce_arr, plaintext)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
            CredentialCipher::ChaCha20Poly1305 => {
                let nonce_arr = chacha20poly1305::Nonce::from_slice(nonce.as_bytes());
                let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                cipher
                    .encrypt(nonce_arr, plaintext)
                    .map_err(|e| CryptoError::Encryption(e.to_string()))
            }
            CredentialCipher::NaclSecretbox => {
                let cipher = XSalsa20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                let mut buffer = plaintext.to_vec();
                let tag = cipher
                    .encrypt_in_place_detached(
                        GenericArray::from_slice(nonce.as_bytes()),
                        b"",
                        &mut buffer,
                    )
                    .map_err(|e| CryptoError::Encryption(e.to_string()))?;
                // secretbox puts the tag in front of the ciphertext
                let mut out = Vec::with_capacity(TAG_SIZE + buffer.len());
                out.extend_from_slice(&tag);
                out.extend_from_slice(&buffer);
                Ok(out)
            }
        }
    }

    /// Decrypt data with the given nonce
    pub fn decrypt(&self, nonce: &Nonce, ciphertext: &[u8]) -> Result<Vec<u8>> {
        self.check_nonce(nonce)?;
        match self.cipher {
            CredentialCipher::Aes256Gcm => {
                let nonce_arr = aes_gcm::Nonce::from_slice(nonce.as_bytes());
                let cipher = Aes256Gcm::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                cipher
                    .decrypt(nonce_arr, ciphertext)
                    .map_err(|e| CryptoError::Decryption(e.to_string()))
            }
            CredentialCipher::ChaCha20Poly1305 => {
                let nonce_arr = chacha20poly1305::Nonce::from_slice(nonce.as_bytes());
                let cipher = ChaCha20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                cipher
                    .decrypt(nonce_arr, ciphertext)
                    .map_err(|e| CryptoError::Decryption(e.to_string()))
            }
            CredentialCipher::NaclSecretbox => {
                if ciphertext.len() < TAG_SIZE {
                    return Err(CryptoError::InvalidCiphertext(format!(
                        "secretbox must be at least {} bytes, got {}",
                        TAG_SIZE,
                        ciphertext.len()
                    )));
                }
                let cipher = XSalsa20Poly1305::new_from_slice(self.key.as_bytes())
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                let (tag, sealed) = ciphertext.split_at(TAG_SIZE);
                let mut buffer = sealed.to_vec();
                cipher
                    .decrypt_in_place_detached(
                        GenericArray::from_slice(nonce.as_bytes()),
                        b"",
                        &mut buffer,
                        GenericArray::from_slice(tag),
                    )
                    .map_err(|e| CryptoError::Decryption(e.to_string()))?;
                Ok(buffer)
            }
        }
    }

    fn check_nonce(&self, nonce: &Nonce) -> Result<()> {
        if nonce.as_bytes().len() != self.cipher.nonce_size() {
            return Err(CryptoError::InvalidNonce(format!(
                "{} nonce must be {} bytes, got {}",
                self.cipher.algorithm_id(),
                self.cipher.nonce_size(),
                nonce.as_bytes().len()
            )));
        }
        Ok(())
    }

    /// Encrypt with a fresh nonce and prepend it to the output
    pub fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::generate(self.cipher);
        let ciphertext = self.encrypt(&nonce, plaintext)?;
        let mut out = Vec::with_capacity(nonce.as_bytes().len() + ciphertext.len());
        out.extend_from_slice(nonce.as_bytes());
        out.extend_from_slice(&ciphertext);
        Ok(out)
    }

    /// Split off the leading nonce and decrypt the remainder
    pub fn open(&self, sealed: &[u8]) -> Result<Vec<u8>> {
        let nonce_size = self.cipher.nonce_size();
        if sealed.len() < nonce_size + TAG_SIZE {
            return Err(CryptoError::InvalidCiphertext(format!(
                "sealed data must be at least {} bytes, got {}",
                nonce_size + TAG_SIZE,
                sealed.len()
            )));
        }
        let (nonce, ciphertext) = sealed.split_at(nonce_size);
        self.decrypt(&Nonce::from_bytes(self.cipher, nonce)?, ciphertext)
    }

    /// Get the cipher type
    pub fn cipher(&self) -> CredentialCipher {
        self.cipher
    }
}
