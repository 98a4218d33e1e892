//! Global configuration constants.
//!
//! Everything that defines the on-disk format or a default knob lives here:
//! envelope field sizes, the file header layout, and the default chunk size.
//! Changing any format constant breaks compatibility with existing files,
//! which is why the header carries a version number.

/// File extension appended to encrypted output files.
pub const FILE_EXTENSION: &str = ".clk";

// === Envelope layout ===
// Each chunk is stored as `wrapped_key ‖ nonce ‖ tag ‖ ciphertext`. The
// wrapped-key length equals the RSA modulus size and is not a constant here;
// the remaining field widths are fixed by the cipher suite.

/// Session key length in bytes (AES-128).
///
/// The session key only ever protects a single chunk, so 128 bits is a
/// comfortable margin; the RSA wrapping is the limiting factor.
pub const SESSION_KEY_SIZE: usize = 16;

/// EAX nonce length in bytes (one AES block).
pub const NONCE_SIZE: usize = 16;

/// EAX authentication tag length in bytes.
pub const TAG_SIZE: usize = 16;

/// Fixed per-envelope overhead beyond the wrapped key: nonce plus tag.
pub const ENVELOPE_FIXED_OVERHEAD: u64 = (NONCE_SIZE + TAG_SIZE) as u64;

// === File header ===
// A fixed-size header at offset 0 of every encrypted file records the
// plaintext chunk size and the chunk count, so the decrypt planner never has
// to assume an externally agreed constant.

/// Magic bytes identifying chunklock output.
pub const MAGIC_BYTES: u32 = 0xC1C7_10CB;

/// Current file format version.
pub const CURRENT_VERSION: u16 = 0x0001;

/// Serialized header length: magic (4) + version (2) + chunk size (8) + chunk count (8).
pub const HEADER_SIZE: usize = 22;

// === Processing defaults ===

/// Default plaintext chunk size: 40 MiB.
///
/// Large enough that RSA wrapping overhead is negligible per chunk, small
/// enough that a batch of in-flight chunks fits comfortably in memory.
pub const DEFAULT_CHUNK_SIZE: u64 = 40 * 1024 * 1024;
