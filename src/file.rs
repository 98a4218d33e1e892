//! Filesystem helpers shared by the processor and the workers.

use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::config::FILE_EXTENSION;
use crate::error::{CryptError, Result};
use crate::types::Mode;

/// Returns the byte size of a regular file.
///
/// A missing path (or a directory) is reported as `MissingResource` so setup
/// can fail before any work is scheduled.
pub fn probe(path: &Path) -> Result<u64> {
    let meta = match std::fs::metadata(path) {
        Ok(meta) => meta,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(CryptError::MissingResource(path.to_path_buf())),
        Err(e) => return Err(CryptError::Io(e)),
    };

    if !meta.is_file() {
        return Err(CryptError::MissingResource(path.to_path_buf()));
    }

    Ok(meta.len())
}

/// Reads exactly `length` bytes starting at `offset`.
///
/// Every worker opens its own handle, so concurrent reads at disjoint offsets
/// never share a file cursor.
pub fn read_exact_at(path: &Path, offset: u64, length: usize) -> Result<Vec<u8>> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(offset))?;

    let mut data = vec![0u8; length];
    file.read_exact(&mut data)?;

    Ok(data)
}

/// Derives the default output path for a mode.
///
/// Encryption appends [`FILE_EXTENSION`]; decryption strips it. A decrypt
/// input without the extension has no derivable output and requires an
/// explicit path, rather than silently falling back to the input itself.
pub fn derive_output_path(input: &Path, mode: Mode) -> Result<PathBuf> {
    match mode {
        Mode::Encrypt => {
            let mut name = input.as_os_str().to_os_string();
            name.push(FILE_EXTENSION);
            Ok(PathBuf::from(name))
        }
        Mode::Decrypt => input
            .to_string_lossy()
            .strip_suffix(FILE_EXTENSION)
            .map(PathBuf::from)
            .ok_or_else(|| CryptError::Configuration(format!("cannot derive output path for {}: no {FILE_EXTENSION} suffix, pass --output", input.display()))),
    }
}
