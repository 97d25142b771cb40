//! Rate estimation for rate-distortion optimized quantization.
//!
//! [`EstBits`] is a snapshot of the cost, in 1/32768 bit units, of coding a
//! 0 or a 1 with each residual-related context. It is read from the live
//! contexts and must be refreshed whenever they change.

use crate::bank::{
    ContextGroupId, Plane, NUM_ABS_FLAG_CTX_LUMA, NUM_ONE_FLAG_CTX_LUMA, NUM_QT_CBF_CTX,
    NUM_SIG_CG_FLAG_CTX, NUM_SIG_FLAG_CTX_LUMA,
};
use crate::context::ContextModel;
use crate::encoder::SbacEncoder;
use crate::engine::BinEncoder;
use crate::error::{CabacError, Result};
use crate::residual::{last_ctx_inc, GROUP_IDX};
use crate::scan::{MAX_LOG2_BLOCK_SIZE, MIN_LOG2_BLOCK_SIZE};

/// Largest last-position prefix group plus one.
pub const NUM_LAST_GROUPS: usize = 10;

/// Cost of a 0 and a 1 with one context.
pub type BinBits = [u32; 2];

fn bin_bits(ctx: &ContextModel) -> BinBits {
    [ctx.entropy_bits(false), ctx.entropy_bits(true)]
}

fn fill(dst: &mut [BinBits], ctxs: &[ContextModel]) {
    for (bits, ctx) in dst.iter_mut().zip(ctxs) {
        *bits = bin_bits(ctx);
    }
}

/// Estimated bin costs of the residual syntax of one plane and block size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EstBits {
    /// Coded block flags, indexed by plane (0 luma, 1 chroma) and context.
    pub block_cbf_bits: [[BinBits; NUM_QT_CBF_CTX]; 2],
    /// Root coded block flag.
    pub block_root_cbf_bits: BinBits,
    /// Coefficient group flags of the plane.
    pub significant_coeff_group_bits: [BinBits; NUM_SIG_CG_FLAG_CTX],
    /// Significance flags of the plane; chroma uses the first 15 entries.
    pub significant_bits: [BinBits; NUM_SIG_FLAG_CTX_LUMA],
    /// Cost of a last x prefix ending at each group index.
    pub last_x_bits: [u32; NUM_LAST_GROUPS],
    /// Cost of a last y prefix ending at each group index.
    pub last_y_bits: [u32; NUM_LAST_GROUPS],
    /// Greater-than-one flags of the plane; chroma uses the first 8 entries.
    pub greater_one_bits: [BinBits; NUM_ONE_FLAG_CTX_LUMA],
    /// Greater-than-two flags of the plane; chroma uses the first 2 entries.
    pub level_abs_bits: [BinBits; NUM_ABS_FLAG_CTX_LUMA],
}

impl Default for EstBits {
    fn default() -> Self {
        Self {
            block_cbf_bits: [[[0; 2]; NUM_QT_CBF_CTX]; 2],
            block_root_cbf_bits: [0; 2],
            significant_coeff_group_bits: [[0; 2]; NUM_SIG_CG_FLAG_CTX],
            significant_bits: [[0; 2]; NUM_SIG_FLAG_CTX_LUMA],
            last_x_bits: [0; NUM_LAST_GROUPS],
            last_y_bits: [0; NUM_LAST_GROUPS],
            greater_one_bits: [[0; 2]; NUM_ONE_FLAG_CTX_LUMA],
            level_abs_bits: [[0; 2]; NUM_ABS_FLAG_CTX_LUMA],
        }
    }
}

/// Cumulative prefix costs: entry `g` is the cost of `g` ones and, below
/// the largest group, the terminating zero.
fn last_prefix_bits(ctxs: &[ContextModel], log2_size: u32, plane: Plane) -> [u32; NUM_LAST_GROUPS] {
    let mut bits = [0; NUM_LAST_GROUPS];
    let max_group = GROUP_IDX[(1usize << log2_size) - 1];
    let mut acc = 0;

    for group in 0..max_group {
        let ctx = &ctxs[last_ctx_inc(log2_size, plane, group)];
        bits[group as usize] = acc + ctx.entropy_bits(false);
        acc += ctx.entropy_bits(true);
    }
    bits[max_group as usize] = acc;
    bits
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Estimate residual bin costs for a `1 << log2_size` block of `plane`.
    ///
    /// Read-only: no context is modified.
    pub fn est_bits(&self, log2_size: u32, plane: Plane) -> Result<EstBits> {
        if !(MIN_LOG2_BLOCK_SIZE..=MAX_LOG2_BLOCK_SIZE).contains(&log2_size) {
            return Err(CabacError::invalid_syntax("estimate block size", log2_size));
        }

        let bank = &self.contexts;
        let mut est = EstBits::default();

        fill(&mut est.block_cbf_bits[0], bank.plane(ContextGroupId::QtCbf, Plane::Luma));
        fill(&mut est.block_cbf_bits[1], bank.plane(ContextGroupId::QtCbf, Plane::Chroma));
        est.block_root_cbf_bits = bin_bits(&bank.group(ContextGroupId::QtRootCbf)[0]);

        fill(
            &mut est.significant_coeff_group_bits,
            bank.plane(ContextGroupId::SigCoeffGroup, plane),
        );
        fill(&mut est.significant_bits, bank.plane(ContextGroupId::SigFlag, plane));
        fill(&mut est.greater_one_bits, bank.plane(ContextGroupId::GreaterOne, plane));
        fill(&mut est.level_abs_bits, bank.plane(ContextGroupId::GreaterTwo, plane));

        est.last_x_bits =
            last_prefix_bits(bank.plane(ContextGroupId::LastX, plane), log2_size, plane);
        est.last_y_bits =
            last_prefix_bits(bank.plane(ContextGroupId::LastY, plane), log2_size, plane);

        Ok(est)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::SliceType;
    use crate::config::SbacConfig;
    use crate::encoder::SliceCodingState;
    use crate::engine::BinCounter;
    use crate::residual::ResidualBlock;

    fn encoder() -> SbacEncoder<BinCounter> {
        let mut enc = SbacEncoder::with_config(SbacConfig::default()).unwrap();
        enc.reset_entropy(SliceCodingState::new(SliceType::P, 27));
        enc
    }

    #[test]
    fn test_est_bits_matches_contexts() {
        let enc = encoder();
        let est = enc.est_bits(3, Plane::Luma).unwrap();
        let bank = enc.contexts();

        let cbf = &bank.plane(ContextGroupId::QtCbf, Plane::Chroma)[2];
        assert_eq!(est.block_cbf_bits[1][2], [cbf.entropy_bits(false), cbf.entropy_bits(true)]);

        let sig = &bank.plane(ContextGroupId::SigFlag, Plane::Luma)[12];
        assert_eq!(est.significant_bits[12][1], sig.entropy_bits(true));

        let gt1 = &bank.plane(ContextGroupId::GreaterOne, Plane::Luma)[5];
        assert_eq!(est.greater_one_bits[5][0], gt1.entropy_bits(false));
    }

    #[test]
    fn test_chroma_planes() {
        let enc = encoder();
        let est = enc.est_bits(2, Plane::Chroma).unwrap();
        let bank = enc.contexts();

        let sig = &bank.plane(ContextGroupId::SigFlag, Plane::Chroma)[0];
        assert_eq!(est.significant_bits[0][0], sig.entropy_bits(false));
        // Entries past the chroma range stay zero
        assert_eq!(est.significant_bits[20], [0, 0]);
        assert_eq!(est.level_abs_bits[3], [0, 0]);
    }

    #[test]
    fn test_last_prefix_is_cumulative() {
        let enc = encoder();
        let est = enc.est_bits(5, Plane::Luma).unwrap();
        let last_x = enc.contexts().plane(ContextGroupId::LastX, Plane::Luma);

        // 32x32 luma: contexts 10..=14, two bins each
        assert_eq!(est.last_x_bits[0], last_x[10].entropy_bits(false));
        assert_eq!(
            est.last_x_bits[1],
            last_x[10].entropy_bits(true) + last_x[10].entropy_bits(false)
        );
        let all_ones: u32 = (0..9)
            .map(|g| last_x[last_ctx_inc(5, Plane::Luma, g)].entropy_bits(true))
            .sum();
        assert_eq!(est.last_x_bits[9], all_ones);
    }

    #[test]
    fn test_last_prefix_small_block() {
        let enc = encoder();
        let est = enc.est_bits(2, Plane::Luma).unwrap();
        let last_y = enc.contexts().plane(ContextGroupId::LastY, Plane::Luma);
        let three_ones: u32 = (0..3).map(|i| last_y[i].entropy_bits(true)).sum();
        assert_eq!(est.last_y_bits[3], three_ones);
        assert_eq!(est.last_y_bits[4], 0);
    }

    #[test]
    fn test_est_bits_tracks_adaptation() {
        let mut enc = encoder();
        let before = enc.est_bits(2, Plane::Luma).unwrap();

        let mut coeffs = [0i32; 16];
        coeffs[0] = 1;
        for _ in 0..8 {
            enc.encode_coeff_nxn(&ResidualBlock::new(&coeffs, 4, Plane::Luma))
                .unwrap();
        }
        let state = enc.contexts().serialize();
        let after = enc.est_bits(2, Plane::Luma).unwrap();

        assert_ne!(before.last_x_bits, after.last_x_bits);
        assert_eq!(enc.contexts().serialize(), state);
    }

    #[test]
    fn test_rejects_bad_size() {
        assert!(encoder().est_bits(6, Plane::Luma).is_err());
    }
}
