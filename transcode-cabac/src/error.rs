//! CABAC-specific error types.

use thiserror::Error;

/// Error type for the entropy coder.
#[derive(Error, Debug)]
pub enum CabacError {
    /// A syntax element value outside the domain its binarization accepts.
    #[error("Invalid {element}: {value}")]
    InvalidSyntax {
        /// Syntax element name.
        element: &'static str,
        /// Offending value.
        value: i64,
    },

    /// A bypass run or Exp-Golomb codeword longer than the engine accepts.
    #[error("Bin limit exceeded: {bins} bins (max {max})")]
    BinLimitExceeded {
        /// Bins requested.
        bins: u32,
        /// Largest run accepted at once.
        max: u32,
    },

    /// Encoder configuration error.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The context layout does not fit the bank.
    #[error("Context bank overflow: {needed} contexts (capacity {capacity})")]
    CapacityExceeded {
        /// Contexts required by the layout.
        needed: usize,
        /// Bank capacity.
        capacity: usize,
    },

    /// Operation not valid in the current coder state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Error bubbled up from the bit sink.
    #[error(transparent)]
    Core(#[from] transcode_core::error::Error),
}

/// Result type for CABAC operations.
pub type Result<T> = std::result::Result<T, CabacError>;

impl CabacError {
    /// Create an invalid syntax error.
    pub fn invalid_syntax(element: &'static str, value: impl Into<i64>) -> Self {
        CabacError::InvalidSyntax {
            element,
            value: value.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        CabacError::InvalidConfig(msg.into())
    }
}
