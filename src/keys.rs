//! Key generation
//!
//! Keys are 32-character alphanumeric strings whose UTF-8 bytes are used
//! directly as AES-256 key material. No derivation is applied.

use crate::cipher;
use crate::error::{PackError, Result};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;

/// Length of every key in bytes (generated keys are ASCII, so also characters)
pub const KEY_LENGTH: usize = 32;

/// Generate a fresh key of [`KEY_LENGTH`] characters drawn uniformly from `[A-Za-z0-9]`.
///
/// Every call draws from the operating system CSPRNG, so keys are independent.
pub fn generate_key() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(KEY_LENGTH)
        .map(char::from)
        .collect()
}

/// Check that a master key is usable as AES-256 key material.
///
/// The key must be exactly [`KEY_LENGTH`] bytes of UTF-8, and its first 16
/// characters must encode to the 16-byte IV. Runs before any output is touched.
pub fn validate_master_key(key: &str) -> Result<()> {
    let actual = key.len();
    if actual != KEY_LENGTH {
        return Err(PackError::InvalidMasterKeyLength {
            expected: KEY_LENGTH,
            actual,
        });
    }
    cipher::check_key(key)
}
