//! Symmetric encryption over the closed algorithm × mode matrix.
//!
//! | mode | padding | IV use                         | integrity        |
//! |------|---------|--------------------------------|------------------|
//! | CBC  | PKCS#7  | first block-size bytes         | padding check    |
//! | ECB  | PKCS#7  | ignored                        | padding check    |
//! | GCM  | none    | full 16 bytes as nonce (AES)   | 128-bit tag      |
//!
//! The text API returns and accepts standard Base64; the `_raw` variants
//! work on ciphertext bytes directly.

use aes::Aes256;
use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::Aead;
use aes_gcm::AesGcm;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use cbc::cipher::block_padding::Pkcs7;
use cbc::cipher::{
    BlockCipher, BlockDecryptMut, BlockEncryptMut, BlockSizeUser, KeyInit, KeyIvInit,
};
use des::{Des, TdesEde3};

use crate::algorithm::{Algorithm, Mode};
use crate::keys::{DerivedKey, Iv};
use credvault_common::{Error, Result};

/// GCM authentication tag length in bits.
pub const GCM_TAG_BITS: usize = 128;

/// AES-256-GCM with a 16-byte nonce, so the whole account IV is used.
type Aes256Gcm16 = AesGcm<Aes256, U16>;

/// Encrypt UTF-8 text and return Base64 ciphertext.
///
/// # Errors
/// - `UnsupportedCombination` if the algorithm cannot run in `mode`
/// - `Crypto` if the key does not fit the algorithm
pub fn encrypt(
    plaintext: &str,
    algorithm: Algorithm,
    mode: Mode,
    key: &DerivedKey,
    iv: &Iv,
) -> Result<String> {
    let ciphertext = encrypt_raw(plaintext.as_bytes(), algorithm, mode, key, iv)?;
    Ok(STANDARD.encode(ciphertext))
}

/// Decrypt Base64 ciphertext back into text.
///
/// Bytes that are not valid UTF-8 are decoded lossily: an unauthenticated
/// mode under the wrong key can yield garbage that still unpads cleanly.
///
/// # Errors
/// - `Encoding` if `encoded` is not valid Base64
/// - `AuthenticationFailure` on GCM tag mismatch
/// - `PaddingFailure` on CBC/ECB padding or block-length mismatch
pub fn decrypt(
    encoded: &str,
    algorithm: Algorithm,
    mode: Mode,
    key: &DerivedKey,
    iv: &Iv,
) -> Result<String> {
    let ciphertext = STANDARD
        .decode(encoded.trim())
        .map_err(|e| Error::Encoding(format!("Invalid ciphertext encoding: {}", e)))?;
    let plaintext = decrypt_raw(&ciphertext, algorithm, mode, key, iv)?;
    Ok(String::from_utf8_lossy(&plaintext).into_owned())
}

/// Encrypt raw bytes.
pub fn encrypt_raw(
    plaintext: &[u8],
    algorithm: Algorithm,
    mode: Mode,
    key: &DerivedKey,
    iv: &Iv,
) -> Result<Vec<u8>> {
    check_key(algorithm, key)?;
    let key = key.as_bytes();

    match (algorithm, mode) {
        (Algorithm::Aes, Mode::Gcm) => gcm_encrypt(key, iv, plaintext),
        (Algorithm::Aes, Mode::Cbc) => cbc_encrypt::<Aes256>(key, iv, plaintext),
        (Algorithm::Des, Mode::Cbc) => cbc_encrypt::<Des>(key, iv, plaintext),
        (Algorithm::DesEde, Mode::Cbc) => cbc_encrypt::<TdesEde3>(key, iv, plaintext),
        (Algorithm::Aes, Mode::Ecb) => ecb_encrypt::<Aes256>(key, plaintext),
        (Algorithm::Des, Mode::Ecb) => ecb_encrypt::<Des>(key, plaintext),
        (Algorithm::DesEde, Mode::Ecb) => ecb_encrypt::<TdesEde3>(key, plaintext),
        (_, Mode::Gcm) => Err(unsupported(algorithm, mode)),
    }
}

/// Decrypt raw ciphertext bytes.
pub fn decrypt_raw(
    ciphertext: &[u8],
    algorithm: Algorithm,
    mode: Mode,
    key: &DerivedKey,
    iv: &Iv,
) -> Result<Vec<u8>> {
    check_key(algorithm, key)?;
    let key = key.as_bytes();

    match (algorithm, mode) {
        (Algorithm::Aes, Mode::Gcm) => gcm_decrypt(key, iv, ciphertext),
        (Algorithm::Aes, Mode::Cbc) => cbc_decrypt::<Aes256>(key, iv, ciphertext),
        (Algorithm::Des, Mode::Cbc) => cbc_decrypt::<Des>(key, iv, ciphertext),
        (Algorithm::DesEde, Mode::Cbc) => cbc_decrypt::<TdesEde3>(key, iv, ciphertext),
        (Algorithm::Aes, Mode::Ecb) => ecb_decrypt::<Aes256>(key, ciphertext),
        (Algorithm::Des, Mode::Ecb) => ecb_decrypt::<Des>(key, ciphertext),
        (Algorithm::DesEde, Mode::Ecb) => ecb_decrypt::<TdesEde3>(key, ciphertext),
        (_, Mode::Gcm) => Err(unsupported(algorithm, mode)),
    }
}

fn check_key(algorithm: Algorithm, key: &DerivedKey) -> Result<()> {
    if key.as_bytes().len() != algorithm.key_length() {
        return Err(Error::Crypto(format!(
            "Key derived for {} cannot be used with {}",
            key.algorithm(),
            algorithm
        )));
    }
    Ok(())
}

fn unsupported(algorithm: Algorithm, mode: Mode) -> Error {
    Error::UnsupportedCombination {
        algorithm: algorithm.name().to_string(),
        mode: mode.name().to_string(),
    }
}

fn key_setup_error(e: impl std::fmt::Display) -> Error {
    Error::Crypto(format!("Cipher initialization failed: {}", e))
}

/// Reject ciphertext that is empty or not a whole number of blocks.
fn check_block_length(ciphertext: &[u8], block_size: usize) -> Result<()> {
    if ciphertext.is_empty() || ciphertext.len() % block_size != 0 {
        return Err(Error::PaddingFailure);
    }
    Ok(())
}

fn gcm_encrypt(key: &[u8], iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm16::new_from_slice(key).map_err(key_setup_error)?;
    cipher
        .encrypt(GenericArray::from_slice(iv.as_bytes()), plaintext)
        .map_err(|e| Error::Crypto(format!("Encryption failed: {}", e)))
}

fn gcm_decrypt(key: &[u8], iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    if ciphertext.len() < GCM_TAG_BITS / 8 {
        return Err(Error::AuthenticationFailure);
    }

    let cipher = Aes256Gcm16::new_from_slice(key).map_err(key_setup_error)?;
    cipher
        .decrypt(GenericArray::from_slice(iv.as_bytes()), ciphertext)
        .map_err(|_| Error::AuthenticationFailure)
}

fn cbc_encrypt<C>(key: &[u8], iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + BlockSizeUser + KeyInit,
{
    let iv = &iv.as_bytes()[..<C as BlockSizeUser>::block_size()];
    let encryptor = cbc::Encryptor::<C>::new_from_slices(key, iv).map_err(key_setup_error)?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn cbc_decrypt<C>(key: &[u8], iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockDecryptMut + BlockSizeUser + KeyInit,
{
    let block_size = <C as BlockSizeUser>::block_size();
    check_block_length(ciphertext, block_size)?;

    let iv = &iv.as_bytes()[..block_size];
    let decryptor = cbc::Decryptor::<C>::new_from_slices(key, iv).map_err(key_setup_error)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::PaddingFailure)
}

fn ecb_encrypt<C>(key: &[u8], plaintext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockEncryptMut + BlockSizeUser + KeyInit,
{
    let encryptor = ecb::Encryptor::<C>::new_from_slice(key).map_err(key_setup_error)?;
    Ok(encryptor.encrypt_padded_vec_mut::<Pkcs7>(plaintext))
}

fn ecb_decrypt<C>(key: &[u8], ciphertext: &[u8]) -> Result<Vec<u8>>
where
    C: BlockCipher + BlockDecryptMut + BlockSizeUser + KeyInit,
{
    check_block_length(ciphertext, <C as BlockSizeUser>::block_size())?;

    let decryptor = ecb::Decryptor::<C>::new_from_slice(key).map_err(key_setup_error)?;
    decryptor
        .decrypt_padded_vec_mut::<Pkcs7>(ciphertext)
        .map_err(|_| Error::PaddingFailure)
}
