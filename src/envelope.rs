//! The per-chunk hybrid envelope.
//!
//! Each chunk is sealed independently as
//! `wrapped_session_key ‖ nonce (16) ‖ tag (16) ‖ ciphertext`, where the
//! wrapped-key width equals the RSA modulus size and the ciphertext length
//! equals the plaintext chunk length. A fresh 128-bit session key and a fresh
//! random nonce are drawn from the OS RNG for every chunk; neither is ever
//! reused, even across repeated encryptions of the same file.

use aes::Aes128;
use eax::Eax;
use eax::aead::generic_array::GenericArray;
use eax::aead::{AeadInPlace, KeyInit};
use rand::RngCore;
use rand::rngs::OsRng;
use zeroize::Zeroizing;

use crate::config::{ENVELOPE_FIXED_OVERHEAD, NONCE_SIZE, SESSION_KEY_SIZE, TAG_SIZE};
use crate::error::{CryptError, Result};
use crate::keys::{PrivateKey, PublicKey};

type ChunkCipher = Eax<Aes128>;

/// Per-envelope overhead for a given modulus size: everything except the
/// ciphertext, which is why an encrypted chunk is exactly this much larger
/// than its plaintext.
#[inline]
pub fn overhead(modulus_size: usize) -> u64 {
    modulus_size as u64 + ENVELOPE_FIXED_OVERHEAD
}

/// Encrypts one chunk into a self-contained envelope.
pub fn seal(plaintext: &[u8], index: u64, key: &PublicKey) -> Result<Vec<u8>> {
    let mut session_key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
    OsRng.fill_bytes(session_key.as_mut());

    let wrapped = key.wrap(session_key.as_ref())?;

    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let cipher = ChunkCipher::new(GenericArray::from_slice(session_key.as_ref()));
    let mut ciphertext = plaintext.to_vec();
    let tag = cipher
        .encrypt_in_place_detached(GenericArray::from_slice(&nonce), &[], &mut ciphertext)
        .map_err(|_| CryptError::worker(format!("chunk {index}: encryption failed")))?;

    let mut envelope = Vec::with_capacity(wrapped.len() + NONCE_SIZE + TAG_SIZE + ciphertext.len());
    envelope.extend_from_slice(&wrapped);
    envelope.extend_from_slice(&nonce);
    envelope.extend_from_slice(&tag);
    envelope.extend_from_slice(&ciphertext);

    Ok(envelope)
}

/// Decrypts and verifies one envelope.
///
/// A failed unwrap is `InvalidKey`; a failed tag verification is `Integrity`
/// and yields no plaintext bytes, partial or otherwise.
pub fn open(envelope: &[u8], index: u64, key: &PrivateKey) -> Result<Vec<u8>> {
    let modulus = key.modulus_size();
    let min_len = modulus + NONCE_SIZE + TAG_SIZE;
    if envelope.len() < min_len {
        return Err(CryptError::Integrity(format!("chunk {index}: envelope shorter than its {min_len}-byte minimum")));
    }

    let (wrapped, rest) = envelope.split_at(modulus);
    let (nonce, rest) = rest.split_at(NONCE_SIZE);
    let (tag, ciphertext) = rest.split_at(TAG_SIZE);

    let session_key = key.unwrap_key(wrapped)?;

    let cipher = ChunkCipher::new(GenericArray::from_slice(session_key.as_ref()));
    let mut plaintext = ciphertext.to_vec();
    cipher
        .decrypt_in_place_detached(GenericArray::from_slice(nonce), &[], &mut plaintext, GenericArray::from_slice(tag))
        .map_err(|_| CryptError::Integrity(format!("chunk {index} failed authentication: tampered or corrupted data")))?;

    Ok(plaintext)
}
