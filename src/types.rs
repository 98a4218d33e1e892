//! Common type definitions.

use std::fmt::{Display, Formatter, Result};

/// The direction of a whole-file operation.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Mode {
    /// Encrypt the file, producing a `.clk` output.
    Encrypt,

    /// Decrypt the file, removing the `.clk` extension.
    Decrypt,
}

impl Mode {
    /// Returns a human-readable label for the mode.
    #[inline]
    pub fn label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypt",
            Self::Decrypt => "Decrypt",
        }
    }

    /// Returns a progress label for an operation in flight.
    #[inline]
    pub fn progress_label(self) -> &'static str {
        match self {
            Self::Encrypt => "Encrypting...",
            Self::Decrypt => "Decrypting...",
        }
    }
}

impl Display for Mode {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        f.write_str(self.label())
    }
}
