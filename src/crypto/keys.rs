//! The request-scoped payload key.
//!
//! A key arrives with each request (environment variable or prompt),
//! is used for the payloads that request touches, and is zeroized when
//! dropped.  It is never written to the database or to the log.

use std::fmt;

use aes_gcm::aead::{KeyInit, OsRng};
use aes_gcm::Aes256Gcm;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::encryption::{decrypt, encrypt};
use crate::errors::{Result, VaultsError};

/// Length of an AES-256 key in bytes.
pub const KEY_LEN: usize = 32;

/// A 32-byte AES-256-GCM key that wipes its memory on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    bytes: [u8; KEY_LEN],
}

impl EncryptionKey {
    /// Wrap raw key bytes.
    pub fn new(bytes: [u8; KEY_LEN]) -> Self {
        Self { bytes }
    }

    /// Build a key from a slice that must be exactly `KEY_LEN` bytes.
    pub fn from_slice(raw: &[u8]) -> Result<Self> {
        let bytes: [u8; KEY_LEN] = raw.try_into().map_err(|_| {
            VaultsError::InvalidKey(format!("expected {KEY_LEN} bytes, got {}", raw.len()))
        })?;
        Ok(Self { bytes })
    }

    /// Decode a standard-base64 key as delivered in `SECRETVAULTS_KEY`.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let decoded = Zeroizing::new(
            STANDARD
                .decode(encoded.trim())
                .map_err(|e| VaultsError::InvalidKey(format!("not valid base64: {e}")))?,
        );
        Self::from_slice(&decoded)
    }

    /// Generate a fresh random key from the OS RNG.
    pub fn generate() -> Self {
        let key = Aes256Gcm::generate_key(OsRng);
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&key);
        Self { bytes }
    }

    /// Encode the key as standard base64.
    pub fn to_base64(&self) -> Zeroizing<String> {
        Zeroizing::new(STANDARD.encode(self.bytes))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.bytes
    }
}

impl fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("EncryptionKey(..)")
    }
}

/// Encrypt a plaintext secret payload for storage.
pub fn encrypt_payload(key: &EncryptionKey, plaintext: &str) -> Result<Vec<u8>> {
    encrypt(key.as_bytes(), plaintext.as_bytes())
}

/// Decrypt a stored payload back into its plaintext string.
///
/// Plaintext that is not valid UTF-8 is treated like a failed tag check;
/// the bytes are zeroized before the error is returned.
pub fn decrypt_payload(key: &EncryptionKey, blob: &[u8]) -> Result<String> {
    let plaintext = decrypt(key.as_bytes(), blob)?;
    String::from_utf8(plaintext).map_err(|e| {
        let mut bad_bytes = e.into_bytes();
        bad_bytes.zeroize();
        VaultsError::DecryptionFailed
    })
}
