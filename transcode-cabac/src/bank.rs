//! Context model bank.
//!
//! Every syntax element family owns a fixed-size group of [`ContextModel`]s.
//! The bank keeps one independently sized container per group and hands out
//! slices through [`ContextBank::group`] and [`ContextBank::plane`], so callers
//! never compute raw offsets into a shared array. Snapshots go through
//! [`ContextBank::serialize`] / [`ContextBank::deserialize`], which move the
//! whole bank as one flat [`ContextState`].

use std::ops::Range;

use crate::context::ContextModel;
use crate::error::{CabacError, Result};
use crate::tables::*;

/// Maximum number of contexts the bank can address.
pub const MAX_NUM_CTX: usize = 512;

pub const NUM_SPLIT_FLAG_CTX: usize = 3;
pub const NUM_SKIP_FLAG_CTX: usize = 3;
pub const NUM_MERGE_FLAG_CTX: usize = 1;
pub const NUM_MERGE_IDX_CTX: usize = 1;
pub const NUM_PART_SIZE_CTX: usize = 3;
pub const NUM_CU_AMP_CTX: usize = 1;
pub const NUM_PRED_MODE_CTX: usize = 1;
pub const NUM_INTRA_PRED_CTX: usize = 1;
pub const NUM_CHROMA_PRED_CTX: usize = 2;
pub const NUM_INTER_DIR_CTX: usize = 5;
pub const NUM_MVD_CTX: usize = 2;
pub const NUM_REF_IDX_CTX: usize = 3;
pub const NUM_DELTA_QP_CTX: usize = 3;
/// Coded block flag contexts per plane.
pub const NUM_QT_CBF_CTX: usize = 5;
pub const NUM_QT_ROOT_CBF_CTX: usize = 1;
/// Coefficient group flag contexts per plane.
pub const NUM_SIG_CG_FLAG_CTX: usize = 2;
pub const NUM_SIG_FLAG_CTX_LUMA: usize = 27;
pub const NUM_SIG_FLAG_CTX_CHROMA: usize = 15;
/// Last position contexts per plane and axis.
pub const NUM_CTX_LAST_FLAG_XY: usize = 15;
pub const NUM_ONE_FLAG_CTX_LUMA: usize = 16;
pub const NUM_ONE_FLAG_CTX_CHROMA: usize = 8;
pub const NUM_ABS_FLAG_CTX_LUMA: usize = 4;
pub const NUM_ABS_FLAG_CTX_CHROMA: usize = 2;
pub const NUM_MVP_IDX_CTX: usize = 1;
pub const NUM_TRANS_SUBDIV_FLAG_CTX: usize = 3;
pub const NUM_ALF_CTRL_FLAG_CTX: usize = 1;
pub const NUM_ALF_FLAG_CTX: usize = 1;
pub const NUM_ALF_UVLC_CTX: usize = 2;
pub const NUM_ALF_SVLC_CTX: usize = 3;
pub const NUM_SAO_FLAG_CTX: usize = 1;
pub const NUM_SAO_UVLC_CTX: usize = 2;
pub const NUM_SAO_SVLC_CTX: usize = 3;
pub const NUM_SAO_MERGE_LEFT_FLAG_CTX: usize = 3;
pub const NUM_SAO_MERGE_UP_FLAG_CTX: usize = 1;
pub const NUM_SAO_TYPE_IDX_CTX: usize = 2;

/// Slice type, which also names the three init tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SliceType {
    /// Bi-predictive slice.
    B,
    /// Predictive slice.
    P,
    /// Intra slice.
    I,
}

impl SliceType {
    /// Check if this is an intra slice.
    pub fn is_intra(self) -> bool {
        self == SliceType::I
    }

    /// Row of the init tables.
    fn table_row(self) -> usize {
        match self {
            SliceType::B => 0,
            SliceType::P => 1,
            SliceType::I => 2,
        }
    }
}

/// Colour plane a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Plane {
    /// Luma samples.
    #[default]
    Luma,
    /// Either chroma component.
    Chroma,
}

impl Plane {
    /// Check if this is the luma plane.
    pub fn is_luma(self) -> bool {
        self == Plane::Luma
    }
}

/// Syntax element families that own a context group, in bank order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ContextGroupId {
    SplitFlag,
    SkipFlag,
    MergeFlag,
    MergeIdx,
    PartSize,
    PredMode,
    AlfCtrlFlag,
    IntraLumaPred,
    IntraChromaPred,
    DeltaQp,
    InterDir,
    RefIdx,
    Mvd,
    QtCbf,
    TransSubdivFlag,
    QtRootCbf,
    SigCoeffGroup,
    SigFlag,
    LastX,
    LastY,
    GreaterOne,
    GreaterTwo,
    MvpIdx,
    AlfFlag,
    AlfUvlc,
    AlfSvlc,
    CuAmpPos,
    SaoFlag,
    SaoUvlc,
    SaoSvlc,
    SaoMergeLeft,
    SaoMergeUp,
    SaoTypeIdx,
}

impl ContextGroupId {
    /// Every group, in bank order.
    pub const ALL: [ContextGroupId; 33] = [
        ContextGroupId::SplitFlag,
        ContextGroupId::SkipFlag,
        ContextGroupId::MergeFlag,
        ContextGroupId::MergeIdx,
        ContextGroupId::PartSize,
        ContextGroupId::PredMode,
        ContextGroupId::AlfCtrlFlag,
        ContextGroupId::IntraLumaPred,
        ContextGroupId::IntraChromaPred,
        ContextGroupId::DeltaQp,
        ContextGroupId::InterDir,
        ContextGroupId::RefIdx,
        ContextGroupId::Mvd,
        ContextGroupId::QtCbf,
        ContextGroupId::TransSubdivFlag,
        ContextGroupId::QtRootCbf,
        ContextGroupId::SigCoeffGroup,
        ContextGroupId::SigFlag,
        ContextGroupId::LastX,
        ContextGroupId::LastY,
        ContextGroupId::GreaterOne,
        ContextGroupId::GreaterTwo,
        ContextGroupId::MvpIdx,
        ContextGroupId::AlfFlag,
        ContextGroupId::AlfUvlc,
        ContextGroupId::AlfSvlc,
        ContextGroupId::CuAmpPos,
        ContextGroupId::SaoFlag,
        ContextGroupId::SaoUvlc,
        ContextGroupId::SaoSvlc,
        ContextGroupId::SaoMergeLeft,
        ContextGroupId::SaoMergeUp,
        ContextGroupId::SaoTypeIdx,
    ];

    /// Number of contexts in the group, over all planes.
    pub const fn len(self) -> usize {
        match self {
            ContextGroupId::SplitFlag => NUM_SPLIT_FLAG_CTX,
            ContextGroupId::SkipFlag => NUM_SKIP_FLAG_CTX,
            ContextGroupId::MergeFlag => NUM_MERGE_FLAG_CTX,
            ContextGroupId::MergeIdx => NUM_MERGE_IDX_CTX,
            ContextGroupId::PartSize => NUM_PART_SIZE_CTX,
            ContextGroupId::PredMode => NUM_PRED_MODE_CTX,
            ContextGroupId::AlfCtrlFlag => NUM_ALF_CTRL_FLAG_CTX,
            ContextGroupId::IntraLumaPred => NUM_INTRA_PRED_CTX,
            ContextGroupId::IntraChromaPred => NUM_CHROMA_PRED_CTX,
            ContextGroupId::DeltaQp => NUM_DELTA_QP_CTX,
            ContextGroupId::InterDir => NUM_INTER_DIR_CTX,
            ContextGroupId::RefIdx => NUM_REF_IDX_CTX,
            ContextGroupId::Mvd => NUM_MVD_CTX,
            ContextGroupId::QtCbf => 2 * NUM_QT_CBF_CTX,
            ContextGroupId::TransSubdivFlag => NUM_TRANS_SUBDIV_FLAG_CTX,
            ContextGroupId::QtRootCbf => NUM_QT_ROOT_CBF_CTX,
            ContextGroupId::SigCoeffGroup => 2 * NUM_SIG_CG_FLAG_CTX,
            ContextGroupId::SigFlag => NUM_SIG_FLAG_CTX_LUMA + NUM_SIG_FLAG_CTX_CHROMA,
            ContextGroupId::LastX | ContextGroupId::LastY => 2 * NUM_CTX_LAST_FLAG_XY,
            ContextGroupId::GreaterOne => NUM_ONE_FLAG_CTX_LUMA + NUM_ONE_FLAG_CTX_CHROMA,
            ContextGroupId::GreaterTwo => NUM_ABS_FLAG_CTX_LUMA + NUM_ABS_FLAG_CTX_CHROMA,
            ContextGroupId::MvpIdx => NUM_MVP_IDX_CTX,
            ContextGroupId::AlfFlag => NUM_ALF_FLAG_CTX,
            ContextGroupId::AlfUvlc => NUM_ALF_UVLC_CTX,
            ContextGroupId::AlfSvlc => NUM_ALF_SVLC_CTX,
            ContextGroupId::CuAmpPos => NUM_CU_AMP_CTX,
            ContextGroupId::SaoFlag => NUM_SAO_FLAG_CTX,
            ContextGroupId::SaoUvlc => NUM_SAO_UVLC_CTX,
            ContextGroupId::SaoSvlc => NUM_SAO_SVLC_CTX,
            ContextGroupId::SaoMergeLeft => NUM_SAO_MERGE_LEFT_FLAG_CTX,
            ContextGroupId::SaoMergeUp => NUM_SAO_MERGE_UP_FLAG_CTX,
            ContextGroupId::SaoTypeIdx => NUM_SAO_TYPE_IDX_CTX,
        }
    }

    /// Number of separately addressed planes (1 or 2).
    pub const fn planes(self) -> usize {
        match self {
            ContextGroupId::QtCbf
            | ContextGroupId::SigCoeffGroup
            | ContextGroupId::SigFlag
            | ContextGroupId::LastX
            | ContextGroupId::LastY
            | ContextGroupId::GreaterOne
            | ContextGroupId::GreaterTwo => 2,
            _ => 1,
        }
    }

    /// Index range of `plane` within the group.
    ///
    /// Single-plane groups return the whole group for either plane.
    pub fn plane_range(self, plane: Plane) -> Range<usize> {
        let luma_len = match self {
            ContextGroupId::QtCbf => NUM_QT_CBF_CTX,
            ContextGroupId::SigCoeffGroup => NUM_SIG_CG_FLAG_CTX,
            ContextGroupId::SigFlag => NUM_SIG_FLAG_CTX_LUMA,
            ContextGroupId::LastX | ContextGroupId::LastY => NUM_CTX_LAST_FLAG_XY,
            ContextGroupId::GreaterOne => NUM_ONE_FLAG_CTX_LUMA,
            ContextGroupId::GreaterTwo => NUM_ABS_FLAG_CTX_LUMA,
            _ => return 0..self.len(),
        };
        match plane {
            Plane::Luma => 0..luma_len,
            Plane::Chroma => luma_len..self.len(),
        }
    }

    /// Short name used in logs.
    pub fn name(self) -> &'static str {
        match self {
            ContextGroupId::SplitFlag => "split_flag",
            ContextGroupId::SkipFlag => "skip_flag",
            ContextGroupId::MergeFlag => "merge_flag",
            ContextGroupId::MergeIdx => "merge_idx",
            ContextGroupId::PartSize => "part_size",
            ContextGroupId::PredMode => "pred_mode",
            ContextGroupId::AlfCtrlFlag => "alf_ctrl_flag",
            ContextGroupId::IntraLumaPred => "intra_luma_pred",
            ContextGroupId::IntraChromaPred => "intra_chroma_pred",
            ContextGroupId::DeltaQp => "delta_qp",
            ContextGroupId::InterDir => "inter_dir",
            ContextGroupId::RefIdx => "ref_idx",
            ContextGroupId::Mvd => "mvd",
            ContextGroupId::QtCbf => "qt_cbf",
            ContextGroupId::TransSubdivFlag => "trans_subdiv_flag",
            ContextGroupId::QtRootCbf => "qt_root_cbf",
            ContextGroupId::SigCoeffGroup => "sig_coeff_group",
            ContextGroupId::SigFlag => "sig_flag",
            ContextGroupId::LastX => "last_x",
            ContextGroupId::LastY => "last_y",
            ContextGroupId::GreaterOne => "greater1",
            ContextGroupId::GreaterTwo => "greater2",
            ContextGroupId::MvpIdx => "mvp_idx",
            ContextGroupId::AlfFlag => "alf_flag",
            ContextGroupId::AlfUvlc => "alf_uvlc",
            ContextGroupId::AlfSvlc => "alf_svlc",
            ContextGroupId::CuAmpPos => "cu_amp_pos",
            ContextGroupId::SaoFlag => "sao_flag",
            ContextGroupId::SaoUvlc => "sao_uvlc",
            ContextGroupId::SaoSvlc => "sao_svlc",
            ContextGroupId::SaoMergeLeft => "sao_merge_left",
            ContextGroupId::SaoMergeUp => "sao_merge_up",
            ContextGroupId::SaoTypeIdx => "sao_type_idx",
        }
    }

    /// Init values of the group for one init table.
    pub fn init_values(self, table: SliceType) -> &'static [u8] {
        let row = table.table_row();
        match self {
            ContextGroupId::SplitFlag => &INIT_SPLIT_FLAG[row],
            ContextGroupId::SkipFlag => &INIT_SKIP_FLAG[row],
            ContextGroupId::MergeFlag => &INIT_MERGE_FLAG[row],
            ContextGroupId::MergeIdx => &INIT_MERGE_IDX[row],
            ContextGroupId::PartSize => &INIT_PART_SIZE[row],
            ContextGroupId::PredMode => &INIT_PRED_MODE[row],
            ContextGroupId::AlfCtrlFlag => &INIT_ALF_CTRL_FLAG[row],
            ContextGroupId::IntraLumaPred => &INIT_INTRA_PRED_MODE[row],
            ContextGroupId::IntraChromaPred => &INIT_CHROMA_PRED_MODE[row],
            ContextGroupId::DeltaQp => &INIT_DQP[row],
            ContextGroupId::InterDir => &INIT_INTER_DIR[row],
            ContextGroupId::RefIdx => &INIT_REF_PIC[row],
            ContextGroupId::Mvd => &INIT_MVD[row],
            ContextGroupId::QtCbf => &INIT_QT_CBF[row],
            ContextGroupId::TransSubdivFlag => &INIT_TRANS_SUBDIV_FLAG[row],
            ContextGroupId::QtRootCbf => &INIT_QT_ROOT_CBF[row],
            ContextGroupId::SigCoeffGroup => &INIT_SIG_CG_FLAG[row],
            ContextGroupId::SigFlag => &INIT_SIG_FLAG[row],
            ContextGroupId::LastX | ContextGroupId::LastY => &INIT_LAST[row],
            ContextGroupId::GreaterOne => &INIT_ONE_FLAG[row],
            ContextGroupId::GreaterTwo => &INIT_ABS_FLAG[row],
            ContextGroupId::MvpIdx => &INIT_MVP_IDX[row],
            ContextGroupId::AlfFlag => &INIT_ALF_FLAG[row],
            ContextGroupId::AlfUvlc => &INIT_ALF_UVLC[row],
            ContextGroupId::AlfSvlc => &INIT_ALF_SVLC[row],
            ContextGroupId::CuAmpPos => &INIT_CU_AMP_POS[row],
            ContextGroupId::SaoFlag => &INIT_SAO_FLAG[row],
            ContextGroupId::SaoUvlc => &INIT_SAO_UVLC[row],
            ContextGroupId::SaoSvlc => &INIT_SAO_SVLC[row],
            ContextGroupId::SaoMergeLeft => &INIT_SAO_MERGE_LEFT_FLAG[row],
            ContextGroupId::SaoMergeUp => &INIT_SAO_MERGE_UP_FLAG[row],
            ContextGroupId::SaoTypeIdx => &INIT_SAO_TYPE_IDX[row],
        }
    }

    /// Total contexts over every group.
    pub fn total_len() -> usize {
        Self::ALL.iter().map(|id| id.len()).sum()
    }
}

/// Flat copy of every context in the bank, in bank order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextState(Vec<ContextModel>);

impl ContextState {
    /// Number of contexts held.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if the state is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Contexts in bank order.
    pub fn as_slice(&self) -> &[ContextModel] {
        &self.0
    }
}

/// The full set of context groups of one entropy coder instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextBank {
    groups: Vec<Vec<ContextModel>>,
}

impl ContextBank {
    /// Allocate every group, initialized to the equiprobable state.
    ///
    /// Fails if the layout does not fit in [`MAX_NUM_CTX`].
    pub fn new() -> Result<Self> {
        let needed = ContextGroupId::total_len();
        if needed > MAX_NUM_CTX {
            return Err(CabacError::CapacityExceeded {
                needed,
                capacity: MAX_NUM_CTX,
            });
        }

        let groups = ContextGroupId::ALL
            .iter()
            .map(|id| vec![ContextModel::new(0, CNU); id.len()])
            .collect();
        Ok(Self { groups })
    }

    /// Total number of contexts.
    pub fn len(&self) -> usize {
        self.groups.iter().map(Vec::len).sum()
    }

    /// Check if the bank holds no contexts.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Contexts of a group.
    pub fn group(&self, id: ContextGroupId) -> &[ContextModel] {
        &self.groups[id as usize]
    }

    /// Mutable contexts of a group.
    pub fn group_mut(&mut self, id: ContextGroupId) -> &mut [ContextModel] {
        &mut self.groups[id as usize]
    }

    /// Contexts of one plane of a group.
    pub fn plane(&self, id: ContextGroupId, plane: Plane) -> &[ContextModel] {
        &self.groups[id as usize][id.plane_range(plane)]
    }

    /// Mutable contexts of one plane of a group.
    pub fn plane_mut(&mut self, id: ContextGroupId, plane: Plane) -> &mut [ContextModel] {
        &mut self.groups[id as usize][id.plane_range(plane)]
    }

    /// Re-initialize one group from `table` at `qp`.
    pub fn init_group(&mut self, id: ContextGroupId, table: SliceType, qp: i32) {
        let values = id.init_values(table);
        for (ctx, &value) in self.groups[id as usize].iter_mut().zip(values) {
            ctx.init(qp, value);
        }
    }

    /// Re-initialize every group from `table` at `qp`.
    pub fn init(&mut self, table: SliceType, qp: i32) {
        for id in ContextGroupId::ALL {
            self.init_group(id, table, qp);
        }
    }

    /// Predicted cost of one group if it were initialized from `table`.
    pub fn group_cost(&self, id: ContextGroupId, table: SliceType, qp: i32) -> u64 {
        self.group(id)
            .iter()
            .zip(id.init_values(table))
            .map(|(ctx, &value)| u64::from(ctx.init_cost(qp, value)))
            .sum()
    }

    /// Predicted cost of the whole bank if it were initialized from `table`.
    ///
    /// Read-only: live states are not touched.
    pub fn calc_cost(&self, table: SliceType, qp: i32) -> u64 {
        ContextGroupId::ALL
            .iter()
            .map(|&id| self.group_cost(id, table, qp))
            .sum()
    }

    /// Flatten every context into a [`ContextState`].
    pub fn serialize(&self) -> ContextState {
        ContextState(self.groups.iter().flatten().copied().collect())
    }

    /// Overwrite every context from a flat state.
    pub fn deserialize(&mut self, state: &ContextState) -> Result<()> {
        if state.len() != self.len() {
            return Err(CabacError::InvalidState(format!(
                "context state holds {} contexts, bank has {}",
                state.len(),
                self.len()
            )));
        }

        let mut models = state.as_slice().iter();
        for ctx in self.groups.iter_mut().flatten() {
            if let Some(model) = models.next() {
                *ctx = *model;
            }
        }
        Ok(())
    }

    /// Copy every context from another bank.
    pub fn copy_from(&mut self, other: &ContextBank) {
        self.groups.clone_from(&other.groups);
    }

    /// Copy one group from another bank.
    pub fn copy_group_from(&mut self, id: ContextGroupId, other: &ContextBank) {
        self.groups[id as usize].copy_from_slice(other.group(id));
    }
}
