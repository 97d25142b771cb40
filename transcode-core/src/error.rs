//! Error types shared by the Transcode entropy-coding crates.

use thiserror::Error;

/// Main error type for the Transcode core library.
#[derive(Error, Debug)]
pub enum Error {
    /// Bit-level read/write errors.
    #[error("Bitstream error: {0}")]
    Bitstream(#[from] BitstreamError),
}

/// Bit-level errors raised by [`crate::bitstream`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitstreamError {
    /// Attempted to read past the end of the data.
    #[error("Unexpected end of bitstream")]
    UnexpectedEnd,

    /// A single read or write asked for more bits than the register holds.
    #[error("Cannot transfer {requested} bits at once (max {max})")]
    TooManyBits { requested: u32, max: u32 },
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if this error was caused by running out of input bits.
    #[must_use]
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Error::Bitstream(BitstreamError::UnexpectedEnd))
    }
}
