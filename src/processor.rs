//! Whole-file encryption and decryption.
//!
//! The processor owns one validated [`Options`] value and exposes the two
//! operations. Both follow the same phases: plan the chunks, dispatch the
//! per-chunk cipher over the worker pool, merge the intermediate artifacts in
//! index order, finalize by rename. Every phase is fallible and the first
//! failure aborts the operation with all artifacts removed, so either the
//! full verified output exists or nothing does.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytesize::ByteSize;
use tracing::{info, warn};

use crate::chunk::Plan;
use crate::config::{DEFAULT_CHUNK_SIZE, HEADER_SIZE};
use crate::envelope;
use crate::error::{CryptError, Result};
use crate::file;
use crate::header::Header;
use crate::keys::{PrivateKey, PublicKey};
use crate::types::Mode;
use crate::ui::progress::Bar;
use crate::worker::artifact::ArtifactSet;
use crate::worker::{Dispatcher, merge};

/// Validated knobs for one operation.
///
/// Construction is the fail-fast boundary: a non-positive concurrency limit
/// or a zero chunk size is rejected here, before any file is opened.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    chunk_size: u64,
    concurrency: usize,
    timeout: Option<Duration>,
}

impl Options {
    pub fn new(chunk_size: Option<u64>, jobs: Option<i64>, timeout: Option<Duration>) -> Result<Self> {
        let chunk_size = chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(CryptError::Configuration("chunk size must be a positive number of bytes".into()));
        }

        // Use available CPU cores, defaulting to 4 if detection fails.
        let available = std::thread::available_parallelism().map(std::num::NonZero::get).unwrap_or(4);
        let concurrency = match jobs {
            None => available,
            Some(n) if n <= 0 => return Err(CryptError::Configuration(format!("concurrency limit must be a positive integer, got {n}"))),
            Some(n) => usize::try_from(n).map_err(|_| CryptError::Configuration(format!("concurrency limit out of range: {n}")))?,
        };

        if concurrency > available {
            warn!(concurrency, available, "concurrency limit exceeds available parallelism");
        }

        Ok(Self { chunk_size, concurrency, timeout })
    }
}

pub struct Processor {
    options: Options,
}

impl Processor {
    #[inline]
    pub fn new(options: Options) -> Self {
        Self { options }
    }

    /// Encrypts `input` to `output` under `key`.
    ///
    /// The output is the fixed header followed by one envelope per chunk in
    /// chunk order, with no markers in between.
    pub async fn encrypt(&self, input: &Path, output: &Path, key: &PublicKey) -> Result<()> {
        let file_size = file::probe(input)?;
        let plan = Plan::new(file_size, self.options.chunk_size)?;
        let header = Header::new(self.options.chunk_size, plan.count());

        info!(input = %input.display(), size = %ByteSize::b(file_size), chunks = plan.count(), "encrypting");

        // Empty source: no chunks to dispatch. The cipher runs once,
        // synchronously, straight to the output path, so even an empty file
        // gets an authenticated envelope.
        if plan.count() == 0 {
            let mut bytes = header.encode().to_vec();
            bytes.extend_from_slice(&envelope::seal(&[], 0, key)?);
            tokio::fs::write(output, &bytes).await?;
            return Ok(());
        }

        let bar = Arc::new(Bar::new(file_size, Mode::Encrypt.progress_label()));
        let artifacts = Arc::new(ArtifactSet::new(output));
        let source = input.to_path_buf();
        let key = Arc::new(key.clone());
        let header_bytes = header.encode();

        let op = {
            let artifacts = Arc::clone(&artifacts);
            let bar = Arc::clone(&bar);
            move |index: u64| -> Result<()> {
                let chunk = plan.chunk(index);
                let data = file::read_exact_at(&source, chunk.offset, chunk.length as usize)?;
                let sealed = envelope::seal(&data, index, &key)?;

                // Artifact 0 doubles as the accumulator the merge engine
                // finalizes, so the file header lands at its front.
                let mut artifact = std::fs::File::create(artifacts.path(index))?;
                if index == 0 {
                    std::io::Write::write_all(&mut artifact, &header_bytes)?;
                }
                std::io::Write::write_all(&mut artifact, &sealed)?;

                bar.add(chunk.length);
                Ok(())
            }
        };

        self.run_chunks(plan.count(), &artifacts, output, &bar, op).await
    }

    /// Decrypts `input` to `output` under `key`.
    ///
    /// Envelope boundaries derive from the header's chunk size and the key's
    /// modulus size; the payload length must agree with the recorded chunk
    /// count or the file is rejected before any worker starts.
    pub async fn decrypt(&self, input: &Path, output: &Path, key: &PrivateKey) -> Result<()> {
        let file_size = file::probe(input)?;
        if file_size < HEADER_SIZE as u64 {
            return Err(CryptError::Integrity(format!("file too short to hold a header: {file_size} bytes")));
        }

        let header = Header::decode(&file::read_exact_at(input, 0, HEADER_SIZE)?)?;
        let payload = file_size - HEADER_SIZE as u64;
        let envelope_size = header
            .chunk_size
            .checked_add(envelope::overhead(key.modulus_size()))
            .ok_or_else(|| CryptError::Integrity(format!("header declares an absurd chunk size: {}", header.chunk_size)))?;

        info!(input = %input.display(), size = %ByteSize::b(file_size), chunks = header.chunk_count, "decrypting");

        // Single-pass counterpart of the empty-source encrypt path.
        if header.chunk_count == 0 {
            let data = file::read_exact_at(input, HEADER_SIZE as u64, usize::try_from(payload).expect("payload fits in memory"))?;
            let plaintext = envelope::open(&data, 0, key)?;
            tokio::fs::write(output, &plaintext).await?;
            return Ok(());
        }

        let plan = Plan::new(payload, envelope_size)?;
        if plan.count() != header.chunk_count {
            return Err(CryptError::Integrity(format!("chunk count mismatch: header records {}, payload holds {}", header.chunk_count, plan.count())));
        }

        let last = plan.chunk(plan.count() - 1);
        if last.length < envelope::overhead(key.modulus_size()) {
            return Err(CryptError::Integrity("truncated final envelope".into()));
        }

        let bar = Arc::new(Bar::new(payload, Mode::Decrypt.progress_label()));
        let artifacts = Arc::new(ArtifactSet::new(output));
        let source = input.to_path_buf();
        let key = Arc::new(key.clone());

        let op = {
            let artifacts = Arc::clone(&artifacts);
            let bar = Arc::clone(&bar);
            move |index: u64| -> Result<()> {
                let chunk = plan.chunk(index);
                let data = file::read_exact_at(&source, HEADER_SIZE as u64 + chunk.offset, chunk.length as usize)?;
                let plaintext = envelope::open(&data, index, &key)?;
                std::fs::write(artifacts.path(index), &plaintext)?;

                bar.add(chunk.length);
                Ok(())
            }
        };

        self.run_chunks(plan.count(), &artifacts, output, &bar, op).await
    }

    /// Dispatch plus merge, with artifact cleanup on any failure.
    async fn run_chunks<F>(&self, chunk_count: u64, artifacts: &ArtifactSet, output: &Path, bar: &Bar, op: F) -> Result<()>
    where
        F: Fn(u64) -> Result<()> + Send + Sync + 'static,
    {
        let dispatcher = Dispatcher::new(self.options.concurrency, self.options.timeout)?;

        let result = async {
            dispatcher.run(chunk_count, op).await?;
            bar.set_message("Merging...");
            merge::merge(artifacts, chunk_count, output).await
        }
        .await;

        match &result {
            Ok(()) => bar.finish(),
            Err(_) => artifacts.remove_all(chunk_count),
        }

        result
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use rand::rngs::OsRng;
    use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding};
    use rsa::{RsaPrivateKey, RsaPublicKey};
    use tempfile::TempDir;

    use crate::config::{ENVELOPE_FIXED_OVERHEAD, FILE_EXTENSION};

    use super::*;

    const TEST_CHUNK: u64 = 1024;

    fn test_pair() -> (PublicKey, PrivateKey) {
        let private = RsaPrivateKey::new(&mut OsRng, 1024).unwrap();
        let public_pem = RsaPublicKey::from(&private).to_public_key_pem(LineEnding::LF).unwrap();
        let private_pem = private.to_pkcs8_pem(LineEnding::LF).unwrap();
        (PublicKey::parse(&public_pem).unwrap(), PrivateKey::parse(&private_pem).unwrap())
    }

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| u8::try_from(i % 251).unwrap()).collect()
    }

    fn options(chunk_size: u64) -> Options {
        Options::new(Some(chunk_size), Some(4), None).unwrap()
    }

    fn paths(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
        let source = dir.path().join("source.bin");
        let encrypted = dir.path().join(format!("source.bin{FILE_EXTENSION}"));
        let decrypted = dir.path().join("decrypted.bin");
        (source, encrypted, decrypted)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_roundtrip_boundary_sizes() {
        let (public, private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));

        for size in [0, 1, TEST_CHUNK - 1, TEST_CHUNK, TEST_CHUNK + 1, 3 * TEST_CHUNK] {
            let dir = TempDir::new().unwrap();
            let (source, encrypted, decrypted) = paths(&dir);

            let content = patterned(usize::try_from(size).unwrap());
            std::fs::write(&source, &content).unwrap();

            processor.encrypt(&source, &encrypted, &public).await.unwrap();
            processor.decrypt(&encrypted, &decrypted, &private).await.unwrap();

            assert_eq!(std::fs::read(&decrypted).unwrap(), content, "size {size}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_empty_file_has_header_and_one_envelope() {
        let (public, private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();
        let (source, encrypted, decrypted) = paths(&dir);

        std::fs::write(&source, b"").unwrap();
        processor.encrypt(&source, &encrypted, &public).await.unwrap();

        let expected = HEADER_SIZE as u64 + private.modulus_size() as u64 + ENVELOPE_FIXED_OVERHEAD;
        assert_eq!(std::fs::metadata(&encrypted).unwrap().len(), expected);

        processor.decrypt(&encrypted, &decrypted, &private).await.unwrap();
        assert_eq!(std::fs::metadata(&decrypted).unwrap().len(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_order_preserved_across_chunk_counts() {
        let (public, private) = test_pair();
        let chunk = 256u64;
        let processor = Processor::new(Options::new(Some(chunk), Some(8), None).unwrap());

        for count in 2..=20u64 {
            let dir = TempDir::new().unwrap();
            let (source, encrypted, decrypted) = paths(&dir);

            // Every chunk carries its own index as fill, so any reordering
            // would be visible in the plaintext.
            let mut content = Vec::new();
            for index in 0..count {
                let fill = u8::try_from(index).unwrap();
                content.extend(std::iter::repeat_n(fill, usize::try_from(chunk).unwrap()));
            }
            content.truncate(content.len() - 37);
            std::fs::write(&source, &content).unwrap();

            processor.encrypt(&source, &encrypted, &public).await.unwrap();
            processor.decrypt(&encrypted, &decrypted, &private).await.unwrap();

            assert_eq!(std::fs::read(&decrypted).unwrap(), content, "count {count}");
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_encryption_is_nondeterministic() {
        let (public, _) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.bin");
        std::fs::write(&source, patterned(3 * usize::try_from(TEST_CHUNK).unwrap())).unwrap();

        let first = dir.path().join("first.clk");
        let second = dir.path().join("second.clk");
        processor.encrypt(&source, &first, &public).await.unwrap();
        processor.encrypt(&source, &second, &public).await.unwrap();

        let first = std::fs::read(&first).unwrap();
        let second = std::fs::read(&second).unwrap();
        assert_eq!(first.len(), second.len());
        assert_eq!(first[..HEADER_SIZE], second[..HEADER_SIZE]);
        assert_ne!(first[HEADER_SIZE..], second[HEADER_SIZE..]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_tampered_ciphertext_leaves_no_output() {
        let (public, private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();
        let (source, encrypted, decrypted) = paths(&dir);

        std::fs::write(&source, patterned(3 * usize::try_from(TEST_CHUNK).unwrap())).unwrap();
        processor.encrypt(&source, &encrypted, &public).await.unwrap();

        // Flip one bit inside the second chunk's ciphertext.
        let mut bytes = std::fs::read(&encrypted).unwrap();
        let envelope_size = usize::try_from(TEST_CHUNK).unwrap() + private.modulus_size() + usize::try_from(ENVELOPE_FIXED_OVERHEAD).unwrap();
        let target = HEADER_SIZE + envelope_size + private.modulus_size() + 40;
        bytes[target] ^= 0x01;
        std::fs::write(&encrypted, &bytes).unwrap();

        let result = processor.decrypt(&encrypted, &decrypted, &private).await;
        assert!(matches!(result, Err(CryptError::Integrity(_))));
        assert!(!decrypted.exists());

        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.unwrap().file_name().into_string().ok())
            .filter(|name| name.ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty(), "stale artifacts: {leftovers:?}");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_wrong_private_key_is_key_error() {
        let (public, _) = test_pair();
        let (_, other_private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();
        let (source, encrypted, decrypted) = paths(&dir);

        std::fs::write(&source, patterned(2000)).unwrap();
        processor.encrypt(&source, &encrypted, &public).await.unwrap();

        let result = processor.decrypt(&encrypted, &decrypted, &other_private).await;
        assert!(matches!(result, Err(CryptError::InvalidKey)));
        assert!(!decrypted.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_truncated_payload_rejected() {
        let (public, private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();
        let (source, encrypted, decrypted) = paths(&dir);

        std::fs::write(&source, patterned(3 * usize::try_from(TEST_CHUNK).unwrap())).unwrap();
        processor.encrypt(&source, &encrypted, &public).await.unwrap();

        // Drop the last envelope entirely; the header still records 3 chunks.
        let bytes = std::fs::read(&encrypted).unwrap();
        let envelope_size = usize::try_from(TEST_CHUNK).unwrap() + private.modulus_size() + usize::try_from(ENVELOPE_FIXED_OVERHEAD).unwrap();
        std::fs::write(&encrypted, &bytes[..bytes.len() - envelope_size]).unwrap();

        let result = processor.decrypt(&encrypted, &decrypted, &private).await;
        assert!(matches!(result, Err(CryptError::Integrity(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_foreign_file_rejected() {
        let (_, private) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();

        let bogus = dir.path().join("bogus.clk");
        std::fs::write(&bogus, patterned(4096)).unwrap();

        let result = processor.decrypt(&bogus, &dir.path().join("out.bin"), &private).await;
        assert!(matches!(result, Err(CryptError::Integrity(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_missing_source_is_missing_resource() {
        let (public, _) = test_pair();
        let processor = Processor::new(options(TEST_CHUNK));
        let dir = TempDir::new().unwrap();

        let result = processor.encrypt(&dir.path().join("absent.bin"), &dir.path().join("out.clk"), &public).await;
        assert!(matches!(result, Err(CryptError::MissingResource(_))));
    }

    #[test]
    fn test_invalid_options_fail_fast() {
        assert!(matches!(Options::new(Some(0), None, None), Err(CryptError::Configuration(_))));
        assert!(matches!(Options::new(None, Some(0), None), Err(CryptError::Configuration(_))));
        assert!(matches!(Options::new(None, Some(-1), None), Err(CryptError::Configuration(_))));
        assert!(Options::new(None, Some(8), None).is_ok());
    }
}
