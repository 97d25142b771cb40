//! # Transcode Core
//!
//! Core types shared by the Transcode entropy-coding crates.
//!
//! This crate provides:
//! - Error handling types
//! - Bit-level writing (the byte sink behind arithmetic coders) and reading

pub mod bitstream;
pub mod error;

pub use bitstream::{BitReader, BitWriter};
pub use error::{BitstreamError, Error, Result};
