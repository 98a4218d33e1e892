//! Fixed-size file header.
//!
//! Every encrypted file starts with a 22-byte header recording the plaintext
//! chunk size and the chunk count used at encrypt time. Decryption derives
//! envelope boundaries from these fields, so there is no implicit agreement on
//! a chunk-size constant between the two sides. A chunk count of zero marks an
//! empty source encrypted through the single-pass path.
//!
//! Layout, all big-endian: `magic (u32) ‖ version (u16) ‖ chunk_size (u64) ‖
//! chunk_count (u64)`.

use crate::config::{CURRENT_VERSION, HEADER_SIZE, MAGIC_BYTES};
use crate::error::{CryptError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Header {
    pub chunk_size: u64,
    pub chunk_count: u64,
}

impl Header {
    #[inline]
    pub fn new(chunk_size: u64, chunk_count: u64) -> Self {
        Self { chunk_size, chunk_count }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut out = [0u8; HEADER_SIZE];
        out[0..4].copy_from_slice(&MAGIC_BYTES.to_be_bytes());
        out[4..6].copy_from_slice(&CURRENT_VERSION.to_be_bytes());
        out[6..14].copy_from_slice(&self.chunk_size.to_be_bytes());
        out[14..22].copy_from_slice(&self.chunk_count.to_be_bytes());
        out
    }

    /// Parses and validates a header.
    ///
    /// Anything that fails here means the input is not a chunklock file, is
    /// from an unsupported version, or has been damaged, so every branch
    /// reports `Integrity`.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_SIZE {
            return Err(CryptError::Integrity(format!("truncated header: {} of {HEADER_SIZE} bytes", bytes.len())));
        }

        let magic = u32::from_be_bytes(bytes[0..4].try_into().expect("sliced to width"));
        if magic != MAGIC_BYTES {
            return Err(CryptError::Integrity("bad magic: not a chunklock file".into()));
        }

        let version = u16::from_be_bytes(bytes[4..6].try_into().expect("sliced to width"));
        if version != CURRENT_VERSION {
            return Err(CryptError::Integrity(format!("unsupported format version {version}")));
        }

        let chunk_size = u64::from_be_bytes(bytes[6..14].try_into().expect("sliced to width"));
        if chunk_size == 0 {
            return Err(CryptError::Integrity("header declares a zero chunk size".into()));
        }

        let chunk_count = u64::from_be_bytes(bytes[14..22].try_into().expect("sliced to width"));

        Ok(Self { chunk_size, chunk_count })
    }
}
