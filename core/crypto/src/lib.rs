//! Cryptographic primitives for credvault.
//!
//! This module provides:
//! - Key derivation using PBKDF2-HMAC-SHA256
//! - Symmetric encryption over a closed algorithm × mode matrix
//!   (AES, DES, DESede × CBC, ECB, GCM)
//! - Key, IV and salt types with redacted debug output
//!
//! # Security Notes
//! - Key material is zeroized on drop (best effort)
//! - No plaintext or key material is ever logged
//! - Only GCM authenticates ciphertext; CBC and ECB detect tampering only
//!   through padding checks

pub mod algorithm;
pub mod cipher;
pub mod kdf;
pub mod keys;

pub use algorithm::{Algorithm, Mode};
pub use cipher::{decrypt, decrypt_raw, encrypt, encrypt_raw};
pub use kdf::{derive_key, PBKDF2_ITERATIONS};
pub use keys::{DerivedKey, Iv, Salt, IV_LENGTH};
