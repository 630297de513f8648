//! AES-256 in CFB mode with 8-bit feedback segments
//!
//! The key string's UTF-8 bytes are the AES key and the UTF-8 bytes of its
//! first 16 characters are the IV. Output length always equals input length.

use crate::error::{PackError, Result};
use aes::cipher::{AsyncStreamCipher, KeyIvInit};

type Aes256Cfb8Enc = cfb8::Encryptor<aes::Aes256>;
type Aes256Cfb8Dec = cfb8::Decryptor<aes::Aes256>;

/// IV length in bytes (AES block size)
pub const IV_LENGTH: usize = 16;

/// Split a key string into (key bytes, IV bytes)
fn key_material(key: &str) -> Result<(&[u8], &[u8])> {
    let key_bytes = key.as_bytes();
    if key_bytes.len() != 32 {
        return Err(PackError::InvalidCipherKey(format!(
            "key is {} bytes, AES-256 needs 32",
            key_bytes.len()
        )));
    }

    let iv_end = key
        .char_indices()
        .nth(IV_LENGTH)
        .map(|(idx, _)| idx)
        .unwrap_or(key_bytes.len());
    let iv = &key_bytes[..iv_end];
    if iv.len() != IV_LENGTH {
        return Err(PackError::InvalidCipherKey(format!(
            "IV is {} bytes, expected {}",
            iv.len(),
            IV_LENGTH
        )));
    }

    Ok((key_bytes, iv))
}

/// Fail unless `key` yields a 32-byte key and a 16-byte IV
pub(crate) fn check_key(key: &str) -> Result<()> {
    key_material(key).map(|_| ())
}

/// Encrypt data with AES-256-CFB8 under `key`
pub fn encrypt(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let (key_bytes, iv) = key_material(key)?;
    let cipher = Aes256Cfb8Enc::new_from_slices(key_bytes, iv)
        .map_err(|e| PackError::InvalidCipherKey(e.to_string()))?;

    let mut buffer = data.to_vec();
    cipher.encrypt(&mut buffer);
    Ok(buffer)
}

/// Decrypt data produced by [`encrypt`] with the same key
pub fn decrypt(data: &[u8], key: &str) -> Result<Vec<u8>> {
    let (key_bytes, iv) = key_material(key)?;
    let cipher = Aes256Cfb8Dec::new_from_slices(key_bytes, iv)
        .map_err(|e| PackError::InvalidCipherKey(e.to_string()))?;

    let mut buffer = data.to_vec();
    cipher.decrypt(&mut buffer);
    Ok(buffer)
}
