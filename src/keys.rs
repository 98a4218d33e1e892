//! RSA key material.
//!
//! Thin glue over the `rsa` crate: PEM import (PKCS#8/SPKI first, PKCS#1 as a
//! fallback) and OAEP wrap/unwrap of per-chunk session keys. The private key
//! additionally exposes the modulus byte size, which fixes the wrapped-key
//! field width inside every envelope.

use std::path::Path;

use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::config::SESSION_KEY_SIZE;
use crate::error::{CryptError, Result};

/// An encrypt-capable key: wraps session keys.
#[derive(Clone)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

/// A decrypt-capable key: unwraps session keys.
#[derive(Clone)]
pub struct PrivateKey {
    inner: RsaPrivateKey,
}

fn read_key_text(path: &Path) -> Result<String> {
    match std::fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CryptError::MissingResource(path.to_path_buf())),
        Err(e) => Err(CryptError::Io(e)),
    }
}

impl PublicKey {
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_key_text(path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let inner = match RsaPublicKey::from_public_key_pem(trimmed) {
            Ok(key) => key,
            Err(_) => RsaPublicKey::from_pkcs1_pem(trimmed).map_err(|e| CryptError::KeyFormat(format!("public key: {e}")))?,
        };

        Ok(Self { inner })
    }

    /// RSA-OAEP wraps a session key. The output length always equals the
    /// modulus byte size; the content is randomized by OAEP.
    pub fn wrap(&self, session_key: &[u8]) -> Result<Vec<u8>> {
        self.inner
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), session_key)
            .map_err(|e| CryptError::KeyFormat(format!("cannot wrap session key: {e}")))
    }

    #[inline]
    pub fn modulus_size(&self) -> usize {
        self.inner.size()
    }
}

impl PrivateKey {
    pub fn load(path: &Path) -> Result<Self> {
        Self::parse(&read_key_text(path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        let inner = match RsaPrivateKey::from_pkcs8_pem(trimmed) {
            Ok(key) => key,
            Err(_) => RsaPrivateKey::from_pkcs1_pem(trimmed).map_err(|e| CryptError::KeyFormat(format!("private key: {e}")))?,
        };

        Ok(Self { inner })
    }

    /// Unwraps a session key.
    ///
    /// OAEP failure does not distinguish a mismatched key from a corrupted
    /// wrapped blob, and neither does a recovered key of the wrong length;
    /// both surface as `InvalidKey`.
    pub fn unwrap_key(&self, wrapped: &[u8]) -> Result<Zeroizing<[u8; SESSION_KEY_SIZE]>> {
        let recovered = Zeroizing::new(self.inner.decrypt(Oaep::new::<Sha256>(), wrapped).map_err(|_| CryptError::InvalidKey)?);

        if recovered.len() != SESSION_KEY_SIZE {
            return Err(CryptError::InvalidKey);
        }

        let mut key = Zeroizing::new([0u8; SESSION_KEY_SIZE]);
        key.copy_from_slice(&recovered);
        Ok(key)
    }

    #[inline]
    pub fn modulus_size(&self) -> usize {
        self.inner.size()
    }
}
