//! Coding unit, prediction unit and filter syntax elements.
//!
//! Every element takes its value plus the neighbourhood information its
//! context selection needs. Values a conforming encoder cannot produce
//! (partition shapes not allowed at the given depth, directions outside the
//! candidate list, out-of-range indices) are rejected with
//! [`CabacError::InvalidSyntax`] before any bin of the element is coded.

use crate::bank::{ContextGroupId, Plane};
use crate::binarization::{write_ep_exp_golomb, write_unary_max_symbol, write_unary_symbol};
use crate::context::ContextModel;
use crate::encoder::SbacEncoder;
use crate::engine::BinEncoder;
use crate::error::{CabacError, Result};

/// Number of angular intra luma directions plus planar and DC.
pub const NUM_INTRA_LUMA_MODES: u8 = 35;

/// Number of chroma directions selectable without LM or DM.
pub const NUM_ALLOWED_CHROMA_DIRS: usize = 4;

/// Largest motion vector predictor index.
pub const AMVP_MAX_MVP_IDX: u32 = 1;

/// Number of colour components with their own SAO merge-left context.
pub const NUM_SAO_COMPONENTS: usize = 3;

/// Prediction unit partitioning of a coding unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PartSize {
    /// One prediction unit.
    Size2Nx2N,
    /// Two horizontal halves.
    Size2NxN,
    /// Two vertical halves.
    SizeNx2N,
    /// Four quarters.
    SizeNxN,
    /// Horizontal split at one quarter.
    Size2NxnU,
    /// Horizontal split at three quarters.
    Size2NxnD,
    /// Vertical split at one quarter.
    SizenLx2N,
    /// Vertical split at three quarters.
    SizenRx2N,
}

impl PartSize {
    /// Check if this is an asymmetric partition.
    pub fn is_amp(self) -> bool {
        matches!(
            self,
            PartSize::Size2NxnU | PartSize::Size2NxnD | PartSize::SizenLx2N | PartSize::SizenRx2N
        )
    }

    fn code(self) -> i64 {
        self as i64
    }
}

/// Prediction mode of a coding unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PredMode {
    /// Motion-compensated prediction.
    Inter,
    /// Spatial prediction.
    Intra,
}

/// Reference picture list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RefPicList {
    /// List 0.
    L0,
    /// List 1.
    L1,
}

/// Inter prediction direction of a prediction unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterDir {
    /// Predicted from list 0 only.
    L0,
    /// Predicted from list 1 only.
    L1,
    /// Bi-predicted.
    Bi,
}

/// Motion vector difference in quarter samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mvd {
    /// Horizontal component.
    pub hor: i32,
    /// Vertical component.
    pub ver: i32,
}

impl Mvd {
    /// Create a motion vector difference.
    pub fn new(hor: i32, ver: i32) -> Self {
        Self { hor, ver }
    }
}

/// Intra chroma prediction direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntraChromaDir {
    /// Same direction as luma.
    DerivedFromLuma,
    /// Linear model from reconstructed luma.
    LinearModel,
    /// Explicit direction, one of the four allowed for the block.
    Angular(u8),
}

/// Availability and state of the left and above neighbours.
///
/// What the flags mean depends on the element: a deeper neighbour for the
/// split flag, a skipped neighbour for the skip flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NeighbourFlags {
    /// Left neighbour is available and satisfies the condition.
    pub left: bool,
    /// Above neighbour is available and satisfies the condition.
    pub above: bool,
}

impl NeighbourFlags {
    /// Create neighbour flags.
    pub fn new(left: bool, above: bool) -> Self {
        Self { left, above }
    }

    /// Context increment: the number of set flags.
    pub fn ctx_inc(self) -> usize {
        usize::from(self.left) + usize::from(self.above)
    }
}

/// Flag, sign and unary magnitude on three contexts.
fn write_svlc<E: BinEncoder>(bin: &mut E, code: i32, ctxs: &mut [ContextModel]) -> Result<()> {
    if code == 0 {
        return bin.encode_bin(false, &mut ctxs[0]);
    }
    bin.encode_bin(true, &mut ctxs[0])?;
    bin.encode_bin(code < 0, &mut ctxs[1])?;

    let magnitude = code.unsigned_abs();
    for _ in 1..magnitude {
        bin.encode_bin(true, &mut ctxs[2])?;
    }
    bin.encode_bin(false, &mut ctxs[2])
}

impl<E: BinEncoder> SbacEncoder<E> {
    // ========================================================================
    // Coding tree
    // ========================================================================

    /// Code `split_cu_flag`. Nothing is coded at the maximum depth.
    pub fn encode_split_flag(
        &mut self,
        split: bool,
        depth: u32,
        neighbours: NeighbourFlags,
    ) -> Result<()> {
        if depth > self.config.max_cu_depth || (depth == self.config.max_cu_depth && split) {
            return Err(CabacError::invalid_syntax("split depth", depth));
        }
        if depth == self.config.max_cu_depth {
            return Ok(());
        }

        let ctx = &mut self.contexts.group_mut(ContextGroupId::SplitFlag)[neighbours.ctx_inc()];
        self.bin.encode_bin(split, ctx)
    }

    /// Code `cu_skip_flag`.
    pub fn encode_skip_flag(&mut self, skip: bool, neighbours: NeighbourFlags) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::SkipFlag)[neighbours.ctx_inc()];
        self.bin.encode_bin(skip, ctx)
    }

    /// Code `merge_flag`.
    pub fn encode_merge_flag(&mut self, merge: bool) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::MergeFlag)[0];
        self.bin.encode_bin(merge, ctx)
    }

    /// Code `merge_idx`: truncated unary, first bin context coded.
    pub fn encode_merge_index(&mut self, merge_idx: u32) -> Result<()> {
        let num_cand = self.config.max_num_merge_cand;
        if merge_idx >= num_cand {
            return Err(CabacError::invalid_syntax("merge index", merge_idx));
        }

        for i in 0..num_cand - 1 {
            let bin = i != merge_idx;
            if i == 0 {
                let ctx = &mut self.contexts.group_mut(ContextGroupId::MergeIdx)[0];
                self.bin.encode_bin(bin, ctx)?;
            } else {
                self.bin.encode_bin_ep(bin)?;
            }
            if !bin {
                break;
            }
        }
        Ok(())
    }

    /// Code `part_mode`.
    ///
    /// `cu_width` is the luma width of the coding unit, needed to drop the
    /// NxN bin when small inter partitions are disabled.
    pub fn encode_part_size(
        &mut self,
        part: PartSize,
        mode: PredMode,
        depth: u32,
        cu_width: u32,
    ) -> Result<()> {
        let at_max_depth = depth == self.config.max_cu_depth;

        if mode == PredMode::Intra {
            return match part {
                PartSize::Size2Nx2N | PartSize::SizeNxN => {
                    if !at_max_depth {
                        if part == PartSize::SizeNxN {
                            return Err(CabacError::invalid_syntax("intra part size", part.code()));
                        }
                        return Ok(());
                    }
                    let ctx = &mut self.contexts.group_mut(ContextGroupId::PartSize)[0];
                    self.bin.encode_bin(part == PartSize::Size2Nx2N, ctx)
                }
                _ => Err(CabacError::invalid_syntax("intra part size", part.code())),
            };
        }

        let amp_allowed = self.config.amp_allowed(depth);
        if part.is_amp() && !amp_allowed {
            return Err(CabacError::invalid_syntax("inter part size", part.code()));
        }
        let small_inter = at_max_depth && !(self.config.disable_inter_4x4 && cu_width == 8);

        let (prefix, amp): (&[bool], Option<bool>) = match part {
            PartSize::Size2Nx2N => (&[true][..], None),
            PartSize::Size2NxN => (&[false, true][..], amp_allowed.then_some(true)),
            PartSize::Size2NxnU | PartSize::Size2NxnD => (&[false, true][..], Some(false)),
            PartSize::SizeNx2N => {
                if small_inter {
                    (&[false, false, true][..], amp_allowed.then_some(true))
                } else {
                    (&[false, false][..], amp_allowed.then_some(true))
                }
            }
            PartSize::SizenLx2N | PartSize::SizenRx2N => (&[false, false][..], Some(false)),
            PartSize::SizeNxN => {
                if !small_inter {
                    return Err(CabacError::invalid_syntax("inter part size", part.code()));
                }
                (&[false, false, false][..], None)
            }
        };

        let ctxs = self.contexts.group_mut(ContextGroupId::PartSize);
        for (i, &bin) in prefix.iter().enumerate() {
            self.bin.encode_bin(bin, &mut ctxs[i])?;
        }

        if let Some(symmetric) = amp {
            let ctx = &mut self.contexts.group_mut(ContextGroupId::CuAmpPos)[0];
            self.bin.encode_bin(symmetric, ctx)?;
            if !symmetric {
                let far = matches!(part, PartSize::Size2NxnD | PartSize::SizenRx2N);
                self.bin.encode_bin_ep(far)?;
            }
        }
        Ok(())
    }

    /// Code `pred_mode_flag`.
    pub fn encode_pred_mode(&mut self, mode: PredMode) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::PredMode)[0];
        self.bin.encode_bin(mode == PredMode::Intra, ctx)
    }

    // ========================================================================
    // Intra prediction
    // ========================================================================

    /// Code the luma intra direction against its most probable modes.
    ///
    /// `predictors` holds one to three distinct candidates. A direction
    /// outside them is coded as a 5-bit index with the candidates removed
    /// from the numbering.
    pub fn encode_intra_dir_luma(&mut self, dir: u8, predictors: &[u8]) -> Result<()> {
        if dir >= NUM_INTRA_LUMA_MODES {
            return Err(CabacError::invalid_syntax("intra luma direction", dir));
        }
        if predictors.is_empty() || predictors.len() > 3 {
            return Err(CabacError::invalid_syntax(
                "intra luma predictor count",
                predictors.len() as i64,
            ));
        }
        if let Some(&bad) = predictors.iter().find(|&&p| p >= NUM_INTRA_LUMA_MODES) {
            return Err(CabacError::invalid_syntax("intra luma predictor", bad));
        }

        let pred_idx = predictors.iter().rposition(|&p| p == dir);

        let ctx = &mut self.contexts.group_mut(ContextGroupId::IntraLumaPred)[0];
        self.bin.encode_bin(pred_idx.is_some(), ctx)?;

        match pred_idx {
            Some(idx) => {
                self.bin.encode_bin_ep(idx > 0)?;
                if idx > 0 {
                    self.bin.encode_bin_ep(idx > 1)?;
                }
                Ok(())
            }
            None => {
                let mut sorted = [0u8; 3];
                let sorted = &mut sorted[..predictors.len()];
                sorted.copy_from_slice(predictors);
                sorted.sort_unstable();

                let mut rem = dir;
                for &p in sorted.iter().rev() {
                    if rem > p {
                        rem -= 1;
                    }
                }
                if rem >= 32 {
                    return Err(CabacError::invalid_syntax("intra luma remainder", rem));
                }
                self.bin.encode_bins_ep(u32::from(rem), 5)
            }
        }
    }

    /// Code the chroma intra direction.
    ///
    /// `allowed` are the explicit directions selectable for the block, in
    /// signalling order.
    pub fn encode_intra_dir_chroma(
        &mut self,
        dir: IntraChromaDir,
        allowed: &[u8; NUM_ALLOWED_CHROMA_DIRS],
    ) -> Result<()> {
        let lm_enabled = self.config.lm_chroma_enabled;
        let ctxs = self.contexts.group_mut(ContextGroupId::IntraChromaPred);

        match dir {
            IntraChromaDir::DerivedFromLuma => self.bin.encode_bin(false, &mut ctxs[0]),
            IntraChromaDir::LinearModel => {
                if !lm_enabled {
                    return Err(CabacError::invalid_syntax("intra chroma direction", -1));
                }
                self.bin.encode_bin(true, &mut ctxs[0])?;
                self.bin.encode_bin(false, &mut ctxs[1])
            }
            IntraChromaDir::Angular(d) => {
                let idx = allowed
                    .iter()
                    .position(|&a| a == d)
                    .ok_or_else(|| CabacError::invalid_syntax("intra chroma direction", d))?;
                self.bin.encode_bin(true, &mut ctxs[0])?;
                if lm_enabled {
                    self.bin.encode_bin(true, &mut ctxs[1])?;
                }
                self.bin.encode_bins_ep(idx as u32, 2)
            }
        }
    }

    // ========================================================================
    // Inter prediction
    // ========================================================================

    /// Code `inter_pred_idc` of a B-slice prediction unit at CU `depth`.
    pub fn encode_inter_dir(&mut self, dir: InterDir, depth: u32) -> Result<()> {
        if depth > 3 {
            return Err(CabacError::invalid_syntax("inter direction depth", depth));
        }
        let ctxs = self.contexts.group_mut(ContextGroupId::InterDir);

        self.bin
            .encode_bin(dir == InterDir::Bi, &mut ctxs[depth as usize])?;
        if dir != InterDir::Bi {
            self.bin.encode_bin(dir == InterDir::L1, &mut ctxs[4])?;
        }
        Ok(())
    }

    /// Code `ref_idx` against a list of `num_ref_idx` pictures.
    ///
    /// Only called when the list holds more than one picture.
    pub fn encode_ref_frm_idx(&mut self, ref_idx: u32, num_ref_idx: u32) -> Result<()> {
        if num_ref_idx < 2 || ref_idx >= num_ref_idx {
            return Err(CabacError::invalid_syntax("reference index", ref_idx));
        }
        let ctxs = self.contexts.group_mut(ContextGroupId::RefIdx);

        self.bin.encode_bin(ref_idx > 0, &mut ctxs[0])?;
        if ref_idx > 0 {
            write_unary_max_symbol(&mut self.bin, ref_idx - 1, &mut ctxs[1..], 1, num_ref_idx - 2)?;
        }
        Ok(())
    }

    /// Code a motion vector difference.
    ///
    /// With the zero-MVD-L1 mode the list 1 difference of a bi-predicted
    /// unit is inferred and nothing is coded.
    pub fn encode_mvd(&mut self, mvd: Mvd, list: RefPicList, inter_dir: InterDir) -> Result<()> {
        if self.config.mvd_l1_zero && list == RefPicList::L1 && inter_dir == InterDir::Bi {
            return Ok(());
        }

        let hor_abs = mvd.hor.unsigned_abs();
        let ver_abs = mvd.ver.unsigned_abs();
        let ctxs = self.contexts.group_mut(ContextGroupId::Mvd);

        self.bin.encode_bin(hor_abs > 0, &mut ctxs[0])?;
        self.bin.encode_bin(ver_abs > 0, &mut ctxs[0])?;

        if hor_abs > 0 {
            self.bin.encode_bin(hor_abs > 1, &mut ctxs[1])?;
        }
        if ver_abs > 0 {
            self.bin.encode_bin(ver_abs > 1, &mut ctxs[1])?;
        }

        for (abs, negative) in [(hor_abs, mvd.hor < 0), (ver_abs, mvd.ver < 0)] {
            if abs == 0 {
                continue;
            }
            if abs > 1 {
                write_ep_exp_golomb(&mut self.bin, abs - 2, 1)?;
            }
            self.bin.encode_bin_ep(negative)?;
        }
        Ok(())
    }

    /// Code `mvp_idx`.
    pub fn encode_mvp_idx(&mut self, mvp_idx: u32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::MvpIdx);
        write_unary_max_symbol(&mut self.bin, mvp_idx, ctxs, 1, AMVP_MAX_MVP_IDX)
    }

    // ========================================================================
    // Transform tree
    // ========================================================================

    /// Code `cu_qp_delta`, the difference to the predicted QP.
    ///
    /// The difference is wrapped into the range representable at the
    /// configured bit depth before coding. Both QPs lie in `-off..=51`, so a
    /// difference larger than `51 + off` in magnitude is rejected.
    pub fn encode_delta_qp(&mut self, delta_qp: i32) -> Result<()> {
        let off = self.config.qp_bd_offset;
        if delta_qp.unsigned_abs() > (51 + off) as u32 {
            return Err(CabacError::invalid_syntax("cu_qp_delta", delta_qp));
        }
        let dqp = (delta_qp + 78 + off + off / 2).rem_euclid(52 + off) - 26 - off / 2;

        let ctxs = self.contexts.group_mut(ContextGroupId::DeltaQp);
        if dqp == 0 {
            return self.bin.encode_bin(false, &mut ctxs[0]);
        }

        self.bin.encode_bin(true, &mut ctxs[0])?;
        let sign = dqp < 0;
        self.bin.encode_bin_ep(sign)?;

        let max_abs_minus1 = (24 + off / 2) as u32 + u32::from(sign);
        write_unary_max_symbol(
            &mut self.bin,
            dqp.unsigned_abs() - 1,
            &mut ctxs[1..],
            1,
            max_abs_minus1,
        )
    }

    /// Code `cbf_luma` / `cbf_cb` / `cbf_cr` at transform depth `tr_depth`.
    pub fn encode_qt_cbf(&mut self, cbf: bool, plane: Plane, tr_depth: u32) -> Result<()> {
        let ctx_inc = match plane {
            Plane::Luma => usize::from(tr_depth == 0),
            Plane::Chroma => tr_depth as usize,
        };
        let ctxs = self.contexts.plane_mut(ContextGroupId::QtCbf, plane);
        let ctx = ctxs
            .get_mut(ctx_inc)
            .ok_or_else(|| CabacError::invalid_syntax("cbf transform depth", tr_depth))?;
        self.bin.encode_bin(cbf, ctx)
    }

    /// Code `rqt_root_cbf`.
    pub fn encode_qt_root_cbf(&mut self, cbf: bool) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::QtRootCbf)[0];
        self.bin.encode_bin(cbf, ctx)
    }

    /// Code `split_transform_flag` with a caller-derived context.
    pub fn encode_transform_subdiv_flag(&mut self, split: bool, ctx_inc: usize) -> Result<()> {
        let ctx = self
            .contexts
            .group_mut(ContextGroupId::TransSubdivFlag)
            .get_mut(ctx_inc)
            .ok_or_else(|| CabacError::invalid_syntax("transform subdivision context", ctx_inc as i64))?;
        self.bin.encode_bin(split, ctx)
    }

    // ========================================================================
    // Loop filters
    // ========================================================================

    /// Code the per-CU ALF on/off flag.
    pub fn encode_alf_ctrl_flag(&mut self, flag: bool) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::AlfCtrlFlag)[0];
        self.bin.encode_bin(flag, ctx)
    }

    /// Code the ALF control depth, truncated at the deepest CU level.
    pub fn encode_alf_ctrl_depth(&mut self, depth: u32) -> Result<()> {
        let max_depth = self.config.max_cu_depth.saturating_sub(1);
        let ctxs = self.contexts.group_mut(ContextGroupId::AlfUvlc);
        write_unary_max_symbol(&mut self.bin, depth, ctxs, 1, max_depth)
    }

    /// Code an ALF flag; any nonzero code is coded as 1.
    pub fn encode_alf_flag(&mut self, code: u32) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::AlfFlag)[0];
        self.bin.encode_bin(code != 0, ctx)
    }

    /// Code an unsigned ALF value.
    pub fn encode_alf_uvlc(&mut self, code: u32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::AlfUvlc);
        write_unary_symbol(&mut self.bin, code, ctxs, 1)
    }

    /// Code a signed ALF value.
    pub fn encode_alf_svlc(&mut self, code: i32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::AlfSvlc);
        write_svlc(&mut self.bin, code, ctxs)
    }

    /// Code a SAO flag; any nonzero code is coded as 1.
    pub fn encode_sao_flag(&mut self, code: u32) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::SaoFlag)[0];
        self.bin.encode_bin(code != 0, ctx)
    }

    /// Code an unsigned SAO value.
    pub fn encode_sao_uvlc(&mut self, code: u32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::SaoUvlc);
        write_unary_symbol(&mut self.bin, code, ctxs, 1)
    }

    /// Code a signed SAO offset.
    pub fn encode_sao_svlc(&mut self, code: i32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::SaoSvlc);
        write_svlc(&mut self.bin, code, ctxs)
    }

    /// Code the SAO band position as 5 bypass bins, LSB first.
    pub fn encode_sao_uflc(&mut self, code: u32) -> Result<()> {
        if code >= 32 {
            return Err(CabacError::invalid_syntax("SAO band position", code));
        }
        for i in 0..5 {
            self.bin.encode_bin_ep((code >> i) & 1 == 1)?;
        }
        Ok(())
    }

    /// Code `sao_merge_left_flag` of colour component `comp_idx`.
    pub fn encode_sao_merge_left(&mut self, merge: bool, comp_idx: usize) -> Result<()> {
        if comp_idx >= NUM_SAO_COMPONENTS {
            return Err(CabacError::invalid_syntax("SAO component", comp_idx as i64));
        }
        let ctx = &mut self.contexts.group_mut(ContextGroupId::SaoMergeLeft)[comp_idx];
        self.bin.encode_bin(merge, ctx)
    }

    /// Code `sao_merge_up_flag`.
    pub fn encode_sao_merge_up(&mut self, merge: bool) -> Result<()> {
        let ctx = &mut self.contexts.group_mut(ContextGroupId::SaoMergeUp)[0];
        self.bin.encode_bin(merge, ctx)
    }

    /// Code the SAO type index.
    pub fn encode_sao_type_idx(&mut self, type_idx: u32) -> Result<()> {
        let ctxs = self.contexts.group_mut(ContextGroupId::SaoTypeIdx);
        write_unary_symbol(&mut self.bin, type_idx, ctxs, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bank::SliceType;
    use crate::config::SbacConfig;
    use crate::encoder::SliceCodingState;
    use crate::engine::{BinTrace, TracedBin};

    fn encoder_with(config: SbacConfig) -> SbacEncoder<BinTrace> {
        let mut enc = SbacEncoder::with_config(config).unwrap();
        enc.reset_entropy(SliceCodingState::new(SliceType::B, 32));
        enc
    }

    fn encoder() -> SbacEncoder<BinTrace> {
        encoder_with(SbacConfig::default())
    }

    fn values(enc: &SbacEncoder<BinTrace>) -> Vec<u8> {
        enc.bin_encoder().values().iter().map(|&b| u8::from(b)).collect()
    }

    fn kinds(enc: &SbacEncoder<BinTrace>) -> String {
        enc.bin_encoder()
            .bins()
            .iter()
            .map(|b| match b {
                TracedBin::Context { .. } => 'c',
                TracedBin::Bypass(_) => 'e',
                TracedBin::Terminate(_) => 't',
            })
            .collect()
    }

    #[test]
    fn test_split_flag_context_and_max_depth() {
        let mut enc = encoder();
        enc.encode_split_flag(true, 0, NeighbourFlags::new(true, true))
            .unwrap();
        assert!(enc.contexts().group(ContextGroupId::SplitFlag)[2].bins_coded());
        assert!(!enc.contexts().group(ContextGroupId::SplitFlag)[0].bins_coded());

        enc.encode_split_flag(false, 3, NeighbourFlags::default())
            .unwrap();
        assert_eq!(values(&enc), vec![1]);

        assert!(enc.encode_split_flag(true, 3, NeighbourFlags::default()).is_err());
        assert!(enc.encode_split_flag(false, 4, NeighbourFlags::default()).is_err());
    }

    #[test]
    fn test_merge_index() {
        let mut enc = encoder();
        enc.encode_merge_index(2).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 0]);
        assert_eq!(kinds(&enc), "cee");

        let mut enc = encoder();
        enc.encode_merge_index(4).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 1, 1]);

        assert!(encoder().encode_merge_index(5).is_err());

        let mut enc = encoder_with(SbacConfig::new().with_max_num_merge_cand(1));
        enc.encode_merge_index(0).unwrap();
        assert!(enc.bin_encoder().bins().is_empty());
    }

    #[test]
    fn test_intra_part_size() {
        let mut enc = encoder();
        enc.encode_part_size(PartSize::Size2Nx2N, PredMode::Intra, 1, 32)
            .unwrap();
        assert!(enc.bin_encoder().bins().is_empty());

        enc.encode_part_size(PartSize::SizeNxN, PredMode::Intra, 3, 8)
            .unwrap();
        assert_eq!(values(&enc), vec![0]);

        assert!(enc
            .encode_part_size(PartSize::SizeNxN, PredMode::Intra, 2, 16)
            .is_err());
        assert!(enc
            .encode_part_size(PartSize::Size2NxN, PredMode::Intra, 3, 8)
            .is_err());
    }

    #[test]
    fn test_inter_part_size_without_amp() {
        let mut enc = encoder();
        enc.encode_part_size(PartSize::Size2NxN, PredMode::Inter, 0, 64)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 1]);

        let mut enc = encoder();
        enc.encode_part_size(PartSize::SizeNx2N, PredMode::Inter, 3, 8)
            .unwrap();
        // Small inter partitions disabled at 8x8: no third bin
        assert_eq!(values(&enc), vec![0, 0]);

        assert!(encoder()
            .encode_part_size(PartSize::SizeNxN, PredMode::Inter, 3, 8)
            .is_err());
        assert!(encoder()
            .encode_part_size(PartSize::Size2NxnU, PredMode::Inter, 0, 64)
            .is_err());
    }

    #[test]
    fn test_inter_part_size_nxn() {
        let mut enc = encoder_with(SbacConfig::new().with_disable_inter_4x4(false));
        enc.encode_part_size(PartSize::SizeNxN, PredMode::Inter, 3, 8)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 0, 0]);

        let mut enc = encoder_with(SbacConfig::new().with_disable_inter_4x4(false));
        enc.encode_part_size(PartSize::SizeNx2N, PredMode::Inter, 3, 8)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 0, 1]);
    }

    #[test]
    fn test_inter_part_size_amp() {
        let config = SbacConfig::new().with_amp(true);

        let mut enc = encoder_with(config.clone());
        enc.encode_part_size(PartSize::Size2NxN, PredMode::Inter, 1, 32)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 1, 1]);

        let mut enc = encoder_with(config.clone());
        enc.encode_part_size(PartSize::Size2NxnD, PredMode::Inter, 1, 32)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 1, 0, 1]);
        assert_eq!(kinds(&enc), "ccce");

        let mut enc = encoder_with(config.clone());
        enc.encode_part_size(PartSize::SizenLx2N, PredMode::Inter, 0, 64)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 0, 0, 0]);

        // Not at the deepest level
        assert!(encoder_with(config)
            .encode_part_size(PartSize::SizenRx2N, PredMode::Inter, 3, 8)
            .is_err());
    }

    #[test]
    fn test_intra_dir_luma_predicted() {
        let mut enc = encoder();
        enc.encode_intra_dir_luma(26, &[0, 1, 26]).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 1]);
        assert_eq!(kinds(&enc), "cee");

        let mut enc = encoder();
        enc.encode_intra_dir_luma(0, &[0, 1, 26]).unwrap();
        assert_eq!(values(&enc), vec![1, 0]);
    }

    #[test]
    fn test_intra_dir_luma_remainder() {
        let mut enc = encoder();
        // Predictors 1, 10, 26 sorted; 34 drops three positions to 31
        enc.encode_intra_dir_luma(34, &[26, 1, 10]).unwrap();
        assert_eq!(values(&enc), vec![0, 1, 1, 1, 1, 1]);

        let mut enc = encoder();
        // 5 is above predictor 1 only
        enc.encode_intra_dir_luma(5, &[26, 1, 10]).unwrap();
        assert_eq!(values(&enc), vec![0, 0, 0, 1, 0, 0]);

        assert!(encoder().encode_intra_dir_luma(35, &[0, 1, 26]).is_err());
        assert!(encoder().encode_intra_dir_luma(3, &[]).is_err());
    }

    #[test]
    fn test_intra_dir_chroma() {
        let allowed = [0, 26, 10, 1];

        let mut enc = encoder();
        enc.encode_intra_dir_chroma(IntraChromaDir::DerivedFromLuma, &allowed)
            .unwrap();
        enc.encode_intra_dir_chroma(IntraChromaDir::Angular(10), &allowed)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 1, 1, 0]);

        assert!(encoder()
            .encode_intra_dir_chroma(IntraChromaDir::LinearModel, &allowed)
            .is_err());
        assert!(encoder()
            .encode_intra_dir_chroma(IntraChromaDir::Angular(18), &allowed)
            .is_err());

        let mut enc = encoder_with(SbacConfig::new().with_lm_chroma(true));
        enc.encode_intra_dir_chroma(IntraChromaDir::LinearModel, &allowed)
            .unwrap();
        enc.encode_intra_dir_chroma(IntraChromaDir::Angular(1), &allowed)
            .unwrap();
        assert_eq!(values(&enc), vec![1, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn test_inter_dir() {
        let mut enc = encoder();
        enc.encode_inter_dir(InterDir::Bi, 2).unwrap();
        assert!(enc.contexts().group(ContextGroupId::InterDir)[2].bins_coded());
        enc.encode_inter_dir(InterDir::L1, 0).unwrap();
        assert!(enc.contexts().group(ContextGroupId::InterDir)[4].bins_coded());
        assert_eq!(values(&enc), vec![1, 0, 1]);
        assert!(enc.encode_inter_dir(InterDir::L0, 4).is_err());
    }

    #[test]
    fn test_ref_frm_idx() {
        let mut enc = encoder();
        enc.encode_ref_frm_idx(0, 4).unwrap();
        enc.encode_ref_frm_idx(3, 4).unwrap();
        assert_eq!(values(&enc), vec![0, 1, 1, 1]);

        let mut enc = encoder();
        enc.encode_ref_frm_idx(1, 4).unwrap();
        assert_eq!(values(&enc), vec![1, 0]);
        let group = enc.contexts().group(ContextGroupId::RefIdx);
        assert!(group[0].bins_coded() && group[1].bins_coded() && !group[2].bins_coded());

        assert!(encoder().encode_ref_frm_idx(2, 2).is_err());
        assert!(encoder().encode_ref_frm_idx(0, 1).is_err());
    }

    #[test]
    fn test_mvd() {
        let mut enc = encoder();
        enc.encode_mvd(Mvd::new(-3, 0), RefPicList::L0, InterDir::L0)
            .unwrap();
        // gr0 hor, gr0 ver, gr1 hor, EG1(1) = 01, sign
        assert_eq!(values(&enc), vec![1, 0, 1, 0, 1, 1]);
        assert_eq!(kinds(&enc), "ccceee");
    }

    #[test]
    fn test_mvd_l1_zero() {
        let mut enc = encoder_with(SbacConfig::new().with_mvd_l1_zero(true));
        enc.encode_mvd(Mvd::new(4, 4), RefPicList::L1, InterDir::Bi)
            .unwrap();
        assert!(enc.bin_encoder().bins().is_empty());
        enc.encode_mvd(Mvd::new(0, 0), RefPicList::L1, InterDir::L1)
            .unwrap();
        assert_eq!(values(&enc), vec![0, 0]);
    }

    #[test]
    fn test_mvp_idx() {
        let mut enc = encoder();
        enc.encode_mvp_idx(1).unwrap();
        assert_eq!(values(&enc), vec![1]);
        assert!(enc.encode_mvp_idx(2).is_err());
    }

    #[test]
    fn test_delta_qp() {
        let mut enc = encoder();
        enc.encode_delta_qp(0).unwrap();
        assert_eq!(values(&enc), vec![0]);

        let mut enc = encoder();
        enc.encode_delta_qp(-2).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 1, 0]);
        assert_eq!(kinds(&enc), "cecc");

        // 26 wraps to -26, coded without a terminating zero
        let mut enc = encoder();
        enc.encode_delta_qp(26).unwrap();
        let bins = values(&enc);
        assert_eq!(bins[..2], [1, 1]);
        assert_eq!(bins.len(), 2 + 25);
        assert!(bins[2..].iter().all(|&b| b == 1));
    }

    #[test]
    fn test_delta_qp_out_of_range() {
        let mut enc = encoder();
        enc.encode_delta_qp(51).unwrap();
        enc.encode_delta_qp(-51).unwrap();
        let coded = enc.bin_encoder().bins().len();

        for delta in [52, -52, i32::MAX, i32::MIN] {
            let err = enc.encode_delta_qp(delta).unwrap_err();
            assert!(matches!(err, CabacError::InvalidSyntax { element: "cu_qp_delta", .. }));
        }
        assert_eq!(enc.bin_encoder().bins().len(), coded);
    }

    #[test]
    fn test_qt_cbf_contexts() {
        let mut enc = encoder();
        enc.encode_qt_cbf(true, Plane::Luma, 0).unwrap();
        enc.encode_qt_cbf(true, Plane::Chroma, 2).unwrap();
        let group = enc.contexts().group(ContextGroupId::QtCbf);
        assert!(group[1].bins_coded());
        assert!(group[5 + 2].bins_coded());
        assert!(enc.encode_qt_cbf(true, Plane::Chroma, 5).is_err());
    }

    #[test]
    fn test_transform_subdiv_flag() {
        let mut enc = encoder();
        enc.encode_transform_subdiv_flag(true, 2).unwrap();
        assert!(enc.contexts().group(ContextGroupId::TransSubdivFlag)[2].bins_coded());
        assert!(enc.encode_transform_subdiv_flag(true, 3).is_err());
    }

    #[test]
    fn test_alf_elements() {
        let mut enc = encoder();
        enc.encode_alf_ctrl_depth(2).unwrap();
        assert_eq!(values(&enc), vec![1, 1]);
        assert!(enc.encode_alf_ctrl_depth(3).is_err());

        let mut enc = encoder();
        enc.encode_alf_svlc(-2).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 1, 0]);
        assert_eq!(kinds(&enc), "cccc");
        let group = enc.contexts().group(ContextGroupId::AlfSvlc);
        assert!(group.iter().all(|c| c.bins_coded()));
    }

    #[test]
    fn test_sao_elements() {
        let mut enc = encoder();
        enc.encode_sao_uflc(0b00110).unwrap();
        assert_eq!(values(&enc), vec![0, 1, 1, 0, 0]);
        assert!(enc.encode_sao_uflc(32).is_err());

        let mut enc = encoder();
        enc.encode_sao_type_idx(2).unwrap();
        enc.encode_sao_svlc(0).unwrap();
        enc.encode_sao_merge_left(true, 2).unwrap();
        assert_eq!(values(&enc), vec![1, 1, 0, 0, 1]);
        assert!(enc.contexts().group(ContextGroupId::SaoMergeLeft)[2].bins_coded());
        assert!(enc.encode_sao_merge_left(true, 3).is_err());
    }
}
