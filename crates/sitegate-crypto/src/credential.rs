//! Encrypted and decrypted site credentials
//!
//! [`EncryptedSecret`] is the hex ciphertext as published by the discovery
//! service. Only [`CredentialDecryptor`] can turn it into a
//! [`ResolvedCredential`]. Neither type prints its contents.

use crate::{
    keys::SharedPassword,
    symmetric::{Aead, CredentialCipher},
    CryptoError, Result,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Hex-encoded ciphertext of a single credential field
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncryptedSecret(String);

impl EncryptedSecret {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn as_hex(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EncryptedSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EncryptedSecret(<{} hex chars>)", self.0.len())
    }
}

/// A decrypted access key and secret pair.
///
/// Zeroized on drop; `Debug` shows neither value.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct ResolvedCredential {
    access_key: String,
    secret_key: String,
}

impl ResolvedCredential {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }

    pub fn access_key(&self) -> &str {
        &self.access_key
    }

    pub fn secret_key(&self) -> &str {
        &self.secret_key
    }
}

impl fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("access_key", &"<redacted>")
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Decrypts credential ciphertext with the configured password and cipher.
///
/// Pure: the same inputs always yield the same plaintext or the same failure.
#[derive(Clone, Debug)]
pub struct CredentialDecryptor {
    password: SharedPassword,
    cipher: CredentialCipher,
}

impl CredentialDecryptor {
    /// Create a decryptor for a password and cipher
    pub fn new(password: SharedPassword, cipher: CredentialCipher) -> Self {
        Self { password, cipher }
    }

    /// Create a decryptor from a configured cipher name
    pub fn from_cipher_name(password: SharedPassword, cipher_name: &str) -> Result<Self> {
        Ok(Self::new(password, cipher_name.parse()?))
    }

    /// Get the cipher in use
    pub fn cipher(&self) -> CredentialCipher {
        self.cipher
    }

    fn aead(&self) -> Aead {
        Aead::from_password(&self.password, self.cipher)
    }

    /// Decrypt one hex ciphertext into a UTF-8 string
    pub fn decrypt_hex(&self, ciphertext_hex: &str) -> Result<Zeroizing<String>> {
        let sealed = hex::decode(ciphertext_hex.trim())?;
        let plaintext = Zeroizing::new(self.aead().open(&sealed)?);
        std::str::from_utf8(&plaintext)
            .map(|s| Zeroizing::new(s.to_string()))
            .map_err(|_| CryptoError::InvalidUtf8)
    }

    /// Encrypt a plaintext value into hex ciphertext
    pub fn encrypt_hex(&self, plaintext: &str) -> Result<String> {
        Ok(hex::encode(self.aead().seal(plaintext.as_bytes())?))
    }

    /// Decrypt a single published secret
    pub fn decrypt(&self, secret: &EncryptedSecret) -> Result<Zeroizing<String>> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidCiphertext("empty ciphertext".to_string()));
        }
        self.decrypt_hex(secret.as_hex())
    }

    /// Decrypt an access key and secret into a credential.
    ///
    /// Fails if either half fails; a partially decrypted pair is never returned.
    pub fn decrypt_pair(
        &self,
        access_key: &EncryptedSecret,
        secret_key: &EncryptedSecret,
    ) -> Result<ResolvedCredential> {
        let key = self.decrypt(access_key)?;
        let secret = self.decrypt(secret_key)?;
        Ok(ResolvedCredential::new(key.as_str(), secret.as_str()))
    }

    /// Seal a credential pair, as the discovery service publishes it
    pub fn encrypt_pair(
        &self,
        credential: &ResolvedCredential,
    ) -> Result<(EncryptedSecret, EncryptedSecret)> {
        Ok((
            EncryptedSecret::new(self.encrypt_hex(credential.access_key())?),
            EncryptedSecret::new(self.encrypt_hex(credential.secret_key())?),
        ))
    }
}

/// Decrypt hex ciphertext with a password and a cipher name
pub fn decrypt(ciphertext_hex: &str, password: &str, cipher_name: &str) -> Result<Zeroizing<String>> {
    CredentialDecryptor::from_cipher_name(SharedPassword::new(password), cipher_name)?
        .decrypt_hex(ciphertext_hex)
}

/// Encrypt a plaintext with a password and a cipher name into hex ciphertext
pub fn encrypt(plaintext: &str, password: &str, cipher_name: &str) -> Result<String> {
    CredentialDecryptor::from_cipher_name(SharedPassword::new(password), cipher_name)?
        .encrypt_hex(plaintext)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn decryptor(password: &str) -> CredentialDecryptor {
        CredentialDecryptor::new(SharedPassword::new(password), CredentialCipher::Aes256Gcm)
    }

    #[test]
    fn test_pair_roundtrip() {
        let d = decryptor("discovery-secret");
        let original = ResolvedCredential::new("AKIAEXAMPLE", "wJalrXUtnFEMI/K7MDENG");
        let (key, secret) = d.encrypt_pair(&original).unwrap();
        let resolved = d.decrypt_pair(&key, &secret).unwrap();
        assert_eq!(resolved, original);
    }

    #[test]
    fn test_wrong_password_fails() {
        let sealed = decryptor("right").encrypt_hex("AKIAEXAMPLE").unwrap();
        let result = decryptor("wrong").decrypt_hex(&sealed);
        assert!(matches!(result, Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_bad_hex_fails() {
        let result = decryptor("right").decrypt_hex("not-hex!");
        assert!(matches!(result, Err(CryptoError::HexDecode(_))));
    }

    #[test]
    fn test_empty_secret_fails() {
        let result = decryptor("right").decrypt(&EncryptedSecret::new(""));
        assert!(matches!(result, Err(CryptoError::InvalidCiphertext(_))));
    }

    #[test]
    fn test_half_decryptable_pair_fails() {
        let d = decryptor("right");
        let key = EncryptedSecret::new(d.encrypt_hex("AKIAEXAMPLE").unwrap());
        let secret = EncryptedSecret::new(decryptor("other").encrypt_hex("secret").unwrap());
        assert!(d.decrypt_pair(&key, &secret).is_err());
    }

    #[test]
    fn test_unsupported_cipher_name() {
        let result = decrypt("00", "password", "des");
        assert!(matches!(result, Err(CryptoError::UnsupportedCipher(_))));
    }

    #[test]
    fn test_nacl_free_functions_roundtrip() {
        let sealed = encrypt("AKIAEXAMPLE", "password", "nacl").unwrap();
        assert_eq!(decrypt(&sealed, "password", "nacl").unwrap().as_str(), "AKIAEXAMPLE");
        assert!(decrypt(&sealed, "password", "aes").is_err());
    }

    #[test]
    fn test_free_functions_roundtrip() {
        let sealed = encrypt("value", "password", "chacha20").unwrap();
        assert_eq!(decrypt(&sealed, "password", "chacha20").unwrap().as_str(), "value");
    }

    #[test]
    fn test_debug_never_shows_values() {
        let credential = ResolvedCredential::new("AKIAEXAMPLE", "topsecret");
        let rendered = format!("{:?}", credential);
        assert!(!rendered.contains("AKIAEXAMPLE"));
        assert!(!rendered.contains("topsecret"));

        let sealed = EncryptedSecret::new("deadbeef");
        assert!(!format!("{:?}", sealed).contains("deadbeef"));
    }

    proptest! {
        #[test]
        fn prop_decrypt_inverts_encrypt(plaintext in "\\PC{0,64}", password in "\\PC{1,32}") {
            let d = decryptor(&password);
            let sealed = d.encrypt_hex(&plaintext).unwrap();
            let decrypted = d.decrypt_hex(&sealed).unwrap();
            prop_assert_eq!(decrypted.as_str(), plaintext.as_str());
        }

        #[test]
        fn prop_wrong_password_never_yields_plaintext(
            plaintext in "[a-zA-Z0-9]{1,40}",
            password in "[a-z]{4,16}",
        ) {
            let sealed = decryptor(&password).encrypt_hex(&plaintext).unwrap();
            let wrong = format!("{}!", password);
            prop_assert!(decryptor(&wrong).decrypt_hex(&sealed).is_err());
        }
    }
}
