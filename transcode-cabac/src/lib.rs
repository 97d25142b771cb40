//! Context-adaptive binary arithmetic coding for the transcode library.
//!
//! This crate is the entropy coding core of an HEVC-style video encoder. It
//! turns coding decisions and quantized transform coefficients into bins and
//! drives a binary arithmetic coder with them.
//!
//! # Features
//!
//! - **Context Bank**: Every context group of the syntax, initialized per
//!   slice type and QP, with init-table selection by predicted cost
//! - **Residual Coding**: Last position, coefficient group and significance
//!   maps, greater-than-one/two flags, sign data hiding, and adaptive
//!   Golomb-Rice remainders
//! - **Syntax Elements**: Coding tree, prediction unit, transform tree, ALF
//!   and SAO elements
//! - **Rate Estimation**: Per-context bit costs for rate-distortion
//!   optimized quantization
//! - **Snapshots**: Whole-state store and load for trial encodes and
//!   wavefront row starts
//! - **Bin Engines**: Arithmetic writer, fractional bit counter, and bin
//!   trace behind one trait
//!
//! # Architecture
//!
//! - [`SbacEncoder`] owns a [`ContextBank`] and one [`BinEncoder`]
//! - Element coders are methods on [`SbacEncoder`], grouped by module:
//!   [`syntax`], [`residual`], [`estimator`], [`snapshot`]
//! - Binarizations in [`binarization`] are free functions over any engine
//!
//! # Example
//!
//! ```rust,ignore
//! use transcode_cabac::{
//!     CabacWriter, Plane, ResidualBlock, SbacConfig, SbacEncoder, SliceCodingState, SliceType,
//! };
//!
//! let mut encoder = SbacEncoder::<CabacWriter>::with_config(SbacConfig::default())?;
//! encoder.reset_entropy(SliceCodingState::new(SliceType::I, 32));
//!
//! encoder.encode_qt_cbf(true, Plane::Luma, 0)?;
//! let coefficients = [4, -1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
//! encoder.encode_coeff_nxn(&ResidualBlock::new(&coefficients, 4, Plane::Luma))?;
//!
//! encoder.encode_terminating_bit(true)?;
//! encoder.encode_slice_finish()?;
//! let bytes = encoder.into_bin_encoder().into_data();
//! ```

pub mod bank;
pub mod binarization;
pub mod config;
pub mod context;
pub mod encoder;
pub mod engine;
pub mod error;
pub mod estimator;
pub mod residual;
pub mod scan;
pub mod snapshot;
pub mod syntax;
mod tables;

// Re-export error types
pub use error::{CabacError, Result};

// Re-export context types
pub use bank::{ContextBank, ContextGroupId, ContextState, Plane, SliceType, MAX_NUM_CTX};
pub use context::ContextModel;

// Re-export engines
pub use engine::{BinCounter, BinEncoder, BinTrace, CabacWriter, TracedBin};

// Re-export the encoder and its element types
pub use config::{SbacConfig, SignHiding};
pub use encoder::{SbacEncoder, SliceCodingState};
pub use estimator::EstBits;
pub use residual::{ResidualBlock, ResidualSummary};
pub use scan::ScanOrder;
pub use snapshot::SbacSnapshot;
pub use syntax::{
    InterDir, IntraChromaDir, Mvd, NeighbourFlags, PartSize, PredMode, RefPicList,
};

/// Context init value meaning "no prior information".
pub use tables::CNU;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_fits_capacity() {
        assert!(ContextGroupId::total_len() <= MAX_NUM_CTX);
    }

    #[test]
    fn test_slice_roundtrip_produces_bytes() {
        let mut encoder = SbacEncoder::<CabacWriter>::with_config(SbacConfig::default()).unwrap();
        encoder.reset_entropy(SliceCodingState::new(SliceType::I, 32));

        encoder.encode_split_flag(false, 0, NeighbourFlags::default()).unwrap();
        encoder.encode_part_size(PartSize::Size2Nx2N, PredMode::Intra, 0, 64).unwrap();
        encoder.encode_intra_dir_luma(1, &[0, 1, 26]).unwrap();
        encoder.encode_qt_cbf(true, Plane::Luma, 0).unwrap();

        let coefficients = [4, -1, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        encoder
            .encode_coeff_nxn(&ResidualBlock::new(&coefficients, 4, Plane::Luma))
            .unwrap();

        encoder.encode_terminating_bit(true).unwrap();
        encoder.encode_slice_finish().unwrap();

        let bytes = encoder.into_bin_encoder().into_data();
        assert!(!bytes.is_empty());
    }
}
