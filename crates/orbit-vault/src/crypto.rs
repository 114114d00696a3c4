//! AES-256-GCM sealing with a 16-byte IV and a detached 16-byte tag.
//!
//! Every call to [`seal`] draws a fresh random IV, so sealing the same token
//! twice never produces the same ciphertext.

use aes_gcm::aead::consts::U16;
use aes_gcm::aead::generic_array::GenericArray;
use aes_gcm::aead::{AeadInPlace, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::AesGcm;
use rand::RngCore;

use crate::error::{Result, VaultError};
use crate::key::VaultKey;
use crate::types::EncryptedEntry;

pub const IV_SIZE: usize = 16;
pub const TAG_SIZE: usize = 16;

/// AES-256-GCM with a 128-bit nonce.
type Cipher = AesGcm<Aes256, U16>;

fn cipher(key: &VaultKey) -> Result<Cipher> {
    Cipher::new_from_slice(key.as_bytes()).map_err(|e| VaultError::EncryptionFailed(e.to_string()))
}

/// Encrypt `plaintext` under `key`.
pub fn seal(key: &VaultKey, plaintext: &[u8]) -> Result<EncryptedEntry> {
    let mut iv = [0u8; IV_SIZE];
    rand::thread_rng().fill_bytes(&mut iv);

    let mut buffer = plaintext.to_vec();
    let tag = cipher(key)?
        .encrypt_in_place_detached(GenericArray::from_slice(&iv), b"", &mut buffer)
        .map_err(|e| VaultError::EncryptionFailed(e.to_string()))?;

    Ok(EncryptedEntry {
        iv: hex::encode(iv),
        tag: hex::encode(tag),
        data: hex::encode(buffer),
    })
}

/// Decrypt an entry produced by [`seal`].
///
/// Fails on malformed hex, wrong IV or tag length, a wrong key, or any
/// tampering with the ciphertext.
pub fn open(key: &VaultKey, entry: &EncryptedEntry) -> Result<Vec<u8>> {
    let decode = |field: &str, value: &str| {
        hex::decode(value)
            .map_err(|e| VaultError::DecryptionFailed(format!("{field} is not valid hex: {e}")))
    };
    let iv = decode("iv", &entry.iv)?;
    let tag = decode("tag", &entry.tag)?;
    let mut buffer = decode("data", &entry.data)?;

    if iv.len() != IV_SIZE {
        return Err(VaultError::DecryptionFailed(format!(
            "iv must be {IV_SIZE} bytes, got {}",
            iv.len()
        )));
    }
    if tag.len() != TAG_SIZE {
        return Err(VaultError::DecryptionFailed(format!(
            "tag must be {TAG_SIZE} bytes, got {}",
            tag.len()
        )));
    }

    cipher(key)?
        .decrypt_in_place_detached(
            GenericArray::from_slice(&iv),
            b"",
            &mut buffer,
            GenericArray::from_slice(&tag),
        )
        .map_err(|_| VaultError::DecryptionFailed("authentication failed".to_string()))?;

    Ok(buffer)
}
