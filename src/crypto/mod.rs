//! Cryptographic primitives for SecretVaults.
//!
//! This module provides:
//! - AES-256-GCM encryption and decryption (`encryption`)
//! - The request-scoped `EncryptionKey` and payload helpers (`keys`)
//!
//! Nothing here knows which secret a payload belongs to; callers pass the
//! key in per request and drop it afterwards.

pub mod encryption;
pub mod keys;

pub use encryption::{decrypt, encrypt};
pub use keys::{decrypt_payload, encrypt_payload, EncryptionKey, KEY_LEN};
