//! Residual coefficient coding.
//!
//! A transform block is coded as the position of its last nonzero
//! coefficient followed by 4x4 coefficient groups from that position back
//! to the DC group. Each group carries a significance flag, a significance
//! map, up to eight greater-than-one flags, one greater-than-two flag,
//! signs, and Golomb-Rice coded remainders.

use tracing::trace;

use crate::bank::{ContextBank, ContextGroupId, Plane};
use crate::binarization::{write_go_rice_exp_golomb, MAX_GO_RICE_PARAM};
use crate::context::ContextModel;
use crate::encoder::SbacEncoder;
use crate::engine::BinEncoder;
use crate::error::{CabacError, Result};
use crate::scan::{ScanOrder, MAX_LOG2_BLOCK_SIZE, MIN_LOG2_BLOCK_SIZE};

/// Coefficients per coefficient group.
pub const SCAN_SET_SIZE: usize = 16;
const LOG2_SCAN_SET_SIZE: usize = 4;

/// Number of greater-than-one flags coded per group.
pub const C1FLAG_NUMBER: usize = 8;

/// Prefix group of each last-position coordinate.
pub const GROUP_IDX: [u32; 32] = [
    0, 1, 2, 3, 4, 4, 5, 5, 6, 6, 6, 6, 7, 7, 7, 7, 8, 8, 8, 8, 8, 8, 8, 8, 9, 9, 9, 9, 9, 9, 9, 9,
];

/// Smallest coordinate of each last-position prefix group.
pub const MIN_IN_GROUP: [u32; 10] = [0, 1, 2, 3, 4, 6, 8, 12, 16, 24];

/// Significance contexts of a 4x4 block, by raster position.
const CTX_IND_MAP_4X4: [u8; 16] = [0, 1, 4, 5, 2, 3, 4, 5, 6, 6, 8, 8, 7, 7, 8, 8];

/// Coefficient groups in a 32x32 block.
const MAX_GROUPS: usize = 64;

/// One quantized transform block.
#[derive(Debug, Clone, Copy)]
pub struct ResidualBlock<'a> {
    /// Coefficients in raster order, row stride `width`.
    pub coefficients: &'a [i32],
    /// Block width.
    pub width: u32,
    /// Block height.
    pub height: u32,
    /// Plane the block belongs to.
    pub plane: Plane,
    /// Coefficient scan order.
    pub scan: ScanOrder,
    /// Lossless blocks never hide signs.
    pub lossless: bool,
}

impl<'a> ResidualBlock<'a> {
    /// A square block with the diagonal scan.
    pub fn new(coefficients: &'a [i32], size: u32, plane: Plane) -> Self {
        Self {
            coefficients,
            width: size,
            height: size,
            plane,
            scan: ScanOrder::Diagonal,
            lossless: false,
        }
    }

    /// Set the scan order.
    pub fn with_scan(mut self, scan: ScanOrder) -> Self {
        self.scan = scan;
        self
    }

    /// Mark the block as lossless.
    pub fn with_lossless(mut self, lossless: bool) -> Self {
        self.lossless = lossless;
        self
    }
}

/// What was coded for one block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ResidualSummary {
    /// Raster (x, y) of the last nonzero coefficient.
    pub last_position: (u32, u32),
    /// Scan index of the last nonzero coefficient.
    pub last_scan_pos: usize,
    /// Number of nonzero coefficients.
    pub num_nonzero: usize,
    /// Number of groups whose first sign was hidden.
    pub hidden_signs: u32,
    /// Number of groups with a set significance flag.
    pub coded_groups: u32,
}

/// Context increment of one last-position prefix bin.
pub(crate) fn last_ctx_inc(log2_size: u32, plane: Plane, bin_idx: u32) -> usize {
    match plane {
        Plane::Luma => {
            let offset = 3 * (log2_size - 2) + ((log2_size - 1) >> 2);
            let shift = (log2_size + 1) >> 2;
            (offset + (bin_idx >> shift)) as usize
        }
        Plane::Chroma => (bin_idx >> (log2_size - 2)) as usize,
    }
}

/// Neighbour pattern of a coefficient group: bit 0 right, bit 1 below.
fn group_pattern(flags: &[bool; MAX_GROUPS], cg_x: usize, cg_y: usize, cg_side: usize) -> u8 {
    let right = cg_x + 1 < cg_side && flags[cg_y * cg_side + cg_x + 1];
    let below = cg_y + 1 < cg_side && flags[(cg_y + 1) * cg_side + cg_x];
    u8::from(right) | (u8::from(below) << 1)
}

/// Context increment of a coefficient group flag.
pub(crate) fn sig_group_ctx_inc(pattern: u8) -> usize {
    usize::from(pattern != 0)
}

/// Context increment of a significance flag within its plane.
pub(crate) fn sig_ctx_inc(
    pattern: u8,
    pos_x: u32,
    pos_y: u32,
    log2_size: u32,
    scan: ScanOrder,
    plane: Plane,
) -> usize {
    if pos_x + pos_y == 0 {
        return 0;
    }
    if log2_size == 2 {
        return usize::from(CTX_IND_MAP_4X4[((pos_y << 2) + pos_x) as usize]);
    }

    let offset = if log2_size == 3 {
        if scan == ScanOrder::Diagonal {
            9
        } else {
            15
        }
    } else if plane.is_luma() {
        21
    } else {
        12
    };

    let x = pos_x & 3;
    let y = pos_y & 3;
    let cnt = match pattern {
        0 => match x + y {
            0 => 2,
            1 | 2 => 1,
            _ => 0,
        },
        1 => match y {
            0 => 2,
            1 => 1,
            _ => 0,
        },
        2 => match x {
            0 => 2,
            1 => 1,
            _ => 0,
        },
        _ => 2,
    };

    let group_offset = if plane.is_luma() && (pos_x >> 2) + (pos_y >> 2) > 0 {
        3
    } else {
        0
    };
    group_offset + offset + cnt
}

/// Greater-than-one context set carried from group to group.
#[derive(Debug, Default)]
struct LevelContextState {
    /// Coefficients of magnitude two or more, halved at every group.
    num_one: u32,
}

impl LevelContextState {
    fn next_ctx_set(&mut self, subset: usize, plane: Plane) -> usize {
        let mut ctx_set = if subset > 0 && plane.is_luma() { 2 } else { 0 };
        if self.num_one > 0 {
            ctx_set += 1;
        }
        self.num_one >>= 1;
        ctx_set
    }
}

/// Golomb-Rice parameter of one coefficient group.
#[derive(Debug, Default)]
struct RiceState {
    param: u32,
}

impl RiceState {
    fn update(&mut self, abs: u32) {
        if abs > 3 * (1 << self.param) {
            self.param = (self.param + 1).min(MAX_GO_RICE_PARAM);
        }
    }
}

/// Nonzero coefficients of one group in reverse scan order.
#[derive(Debug, Default)]
struct GroupLevels {
    abs: [u32; SCAN_SET_SIZE],
    signs: u32,
    count: usize,
    first_scan_pos: usize,
    last_scan_pos: usize,
}

impl GroupLevels {
    fn push(&mut self, coeff: i32, scan_pos: usize) {
        if self.count == 0 {
            self.last_scan_pos = scan_pos;
        }
        self.first_scan_pos = scan_pos;
        self.abs[self.count] = coeff.unsigned_abs();
        self.signs = 2 * self.signs + u32::from(coeff < 0);
        self.count += 1;
    }
}

/// Checked block geometry: log2 of the side after capping.
fn block_log2_size(block: &ResidualBlock<'_>, max_tu_size: u32) -> Result<u32> {
    if block.width != block.height {
        return Err(CabacError::invalid_syntax("residual block height", block.height));
    }
    let size = block.width.min(max_tu_size);
    if !size.is_power_of_two() {
        return Err(CabacError::invalid_syntax("residual block width", size));
    }

    let log2_size = size.trailing_zeros();
    if !(MIN_LOG2_BLOCK_SIZE..=MAX_LOG2_BLOCK_SIZE).contains(&log2_size) {
        return Err(CabacError::invalid_syntax("residual block width", size));
    }
    if block.coefficients.len() < (size * size) as usize {
        return Err(CabacError::invalid_syntax(
            "residual coefficient count",
            block.coefficients.len() as i64,
        ));
    }
    if !block.plane.is_luma() && log2_size > 2 && block.scan != ScanOrder::Diagonal {
        return Err(CabacError::invalid_syntax("chroma scan block width", size));
    }
    Ok(log2_size)
}

/// Reject blocks whose hidden signs disagree with the magnitude parity.
///
/// The sign of the first nonzero coefficient of a hiding group is inferred
/// as negative when the group's magnitude sum is odd.
fn check_hidden_signs(
    coefficients: &[i32],
    scan: &[u16],
    scan_pos_last: usize,
    threshold: u32,
) -> Result<()> {
    for sub_pos in (0..=scan_pos_last).step_by(SCAN_SET_SIZE) {
        let end = (sub_pos + SCAN_SET_SIZE).min(scan_pos_last + 1);
        let mut first = None;
        let mut last = 0;
        let mut sum = 0u32;

        for scan_pos in sub_pos..end {
            let coeff = coefficients[usize::from(scan[scan_pos])];
            if coeff != 0 {
                first.get_or_insert(scan_pos);
                last = scan_pos;
                sum = sum.wrapping_add(coeff.unsigned_abs());
            }
        }

        if let Some(first) = first {
            if (last - first) as u32 >= threshold {
                let coeff = coefficients[usize::from(scan[first])];
                if (sum & 1 == 1) != (coeff < 0) {
                    return Err(CabacError::invalid_syntax("hidden sign parity", coeff));
                }
            }
        }
    }
    Ok(())
}

/// Last-position prefix on one axis: `group` ones, then a zero unless the
/// group is the largest possible.
fn write_last_prefix<E: BinEncoder>(
    bin: &mut E,
    ctxs: &mut [ContextModel],
    group: u32,
    log2_size: u32,
    plane: Plane,
) -> Result<()> {
    let max_group = GROUP_IDX[(1usize << log2_size) - 1];
    for i in 0..group {
        bin.encode_bin(true, &mut ctxs[last_ctx_inc(log2_size, plane, i)])?;
    }
    if group < max_group {
        bin.encode_bin(false, &mut ctxs[last_ctx_inc(log2_size, plane, group)])?;
    }
    Ok(())
}

fn write_last_suffix<E: BinEncoder>(bin: &mut E, pos: u32, group: u32) -> Result<()> {
    if group > 3 {
        let count = (group - 2) >> 1;
        let offset = pos - MIN_IN_GROUP[group as usize];
        bin.encode_bins_ep(offset, count)?;
    }
    Ok(())
}

fn write_last_significant_xy<E: BinEncoder>(
    bin: &mut E,
    contexts: &mut ContextBank,
    pos_x: u32,
    pos_y: u32,
    log2_size: u32,
    plane: Plane,
    scan: ScanOrder,
) -> Result<()> {
    let (x, y) = if scan == ScanOrder::Vertical {
        (pos_y, pos_x)
    } else {
        (pos_x, pos_y)
    };
    let group_x = GROUP_IDX[x as usize];
    let group_y = GROUP_IDX[y as usize];

    write_last_prefix(
        bin,
        contexts.plane_mut(ContextGroupId::LastX, plane),
        group_x,
        log2_size,
        plane,
    )?;
    write_last_prefix(
        bin,
        contexts.plane_mut(ContextGroupId::LastY, plane),
        group_y,
        log2_size,
        plane,
    )?;
    write_last_suffix(bin, x, group_x)?;
    write_last_suffix(bin, y, group_y)
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Code the position of the last nonzero coefficient of a square block
    /// of side `1 << log2_size`.
    pub fn encode_last_significant_xy(
        &mut self,
        pos_x: u32,
        pos_y: u32,
        log2_size: u32,
        plane: Plane,
        scan: ScanOrder,
    ) -> Result<()> {
        if !(MIN_LOG2_BLOCK_SIZE..=MAX_LOG2_BLOCK_SIZE).contains(&log2_size) {
            return Err(CabacError::invalid_syntax("last position block size", log2_size));
        }
        let size = 1u32 << log2_size;
        if pos_x >= size || pos_y >= size {
            return Err(CabacError::invalid_syntax(
                "last position",
                pos_x.max(pos_y),
            ));
        }
        write_last_significant_xy(
            &mut self.bin,
            &mut self.contexts,
            pos_x,
            pos_y,
            log2_size,
            plane,
            scan,
        )
    }

    /// Code the coefficients of a transform block.
    ///
    /// Blocks wider than the maximum transform size are capped: the leading
    /// coefficients are read as one maximum-size block with that size as the
    /// row stride. An all-zero block codes nothing; the coded block flag is
    /// the caller's.
    #[tracing::instrument(
        level = "trace",
        skip(self, block),
        fields(size = block.width, plane = ?block.plane, scan = ?block.scan)
    )]
    pub fn encode_coeff_nxn(&mut self, block: &ResidualBlock<'_>) -> Result<ResidualSummary> {
        let log2_size = block_log2_size(block, self.config.max_tu_size)?;
        let size = 1usize << log2_size;
        let coefficients = &block.coefficients[..size * size];
        let plane = block.plane;

        let Self {
            bin,
            contexts,
            scans,
            config,
            ..
        } = self;
        let scan = scans.coefficients(block.scan, log2_size);
        let cg_scan = scans.groups(block.scan, log2_size);
        let cg_side = size >> 2;

        let Some(scan_pos_last) = scan
            .iter()
            .rposition(|&pos| coefficients[usize::from(pos)] != 0)
        else {
            return Ok(ResidualSummary::default());
        };

        let threshold = if block.lossless {
            None
        } else {
            config.sign_hiding.threshold()
        };
        if let Some(threshold) = threshold {
            check_hidden_signs(coefficients, scan, scan_pos_last, threshold)?;
        }

        let mut cg_flags = [false; MAX_GROUPS];
        let mut num_nonzero = 0;
        for &pos in &scan[..=scan_pos_last] {
            let pos = usize::from(pos);
            if coefficients[pos] != 0 {
                let (x, y) = (pos % size, pos / size);
                cg_flags[(y >> 2) * cg_side + (x >> 2)] = true;
                num_nonzero += 1;
            }
        }

        let pos_last = usize::from(scan[scan_pos_last]);
        let last_position = ((pos_last % size) as u32, (pos_last / size) as u32);
        write_last_significant_xy(
            bin,
            contexts,
            last_position.0,
            last_position.1,
            log2_size,
            plane,
            block.scan,
        )?;

        let last_subset = scan_pos_last >> LOG2_SCAN_SET_SIZE;
        let mut level_state = LevelContextState::default();
        let mut summary = ResidualSummary {
            last_position,
            last_scan_pos: scan_pos_last,
            num_nonzero,
            ..ResidualSummary::default()
        };

        for subset in (0..=last_subset).rev() {
            let sub_pos = subset << LOG2_SCAN_SET_SIZE;
            let mut levels = GroupLevels::default();
            let mut rice = RiceState::default();

            let sig_end = if subset == last_subset {
                levels.push(coefficients[pos_last], scan_pos_last);
                scan_pos_last
            } else {
                sub_pos + SCAN_SET_SIZE
            };

            let cg_pos = usize::from(cg_scan[subset]);
            let (cg_x, cg_y) = (cg_pos % cg_side, cg_pos / cg_side);
            if subset == last_subset || subset == 0 {
                cg_flags[cg_pos] = true;
            } else {
                let ctx_inc = sig_group_ctx_inc(group_pattern(&cg_flags, cg_x, cg_y, cg_side));
                let ctxs = contexts.plane_mut(ContextGroupId::SigCoeffGroup, plane);
                bin.encode_bin(cg_flags[cg_pos], &mut ctxs[ctx_inc])?;
            }

            if cg_flags[cg_pos] {
                summary.coded_groups += 1;
                let pattern = group_pattern(&cg_flags, cg_x, cg_y, cg_side);
                let ctxs = contexts.plane_mut(ContextGroupId::SigFlag, plane);

                for scan_pos in (sub_pos..sig_end).rev() {
                    let blk_pos = usize::from(scan[scan_pos]);
                    let coeff = coefficients[blk_pos];
                    // The first flag of a group is inferred when nothing else was set
                    if scan_pos > sub_pos || subset == 0 || levels.count > 0 {
                        let ctx_inc = sig_ctx_inc(
                            pattern,
                            (blk_pos % size) as u32,
                            (blk_pos / size) as u32,
                            log2_size,
                            block.scan,
                            plane,
                        );
                        bin.encode_bin(coeff != 0, &mut ctxs[ctx_inc])?;
                    }
                    if coeff != 0 {
                        levels.push(coeff, scan_pos);
                    }
                }
            }

            if levels.count == 0 {
                level_state.num_one >>= 1;
                continue;
            }

            let n = levels.count;
            let ctx_set = level_state.next_ctx_set(subset, plane);

            let mut c1 = 1usize;
            let mut first_c2_idx = None;
            let gt1_ctxs = contexts.plane_mut(ContextGroupId::GreaterOne, plane);
            for idx in 0..n.min(C1FLAG_NUMBER) {
                let greater1 = levels.abs[idx] > 1;
                bin.encode_bin(greater1, &mut gt1_ctxs[4 * ctx_set + c1])?;
                if greater1 {
                    c1 = 0;
                    first_c2_idx.get_or_insert(idx);
                } else if c1 > 0 && c1 < 3 {
                    c1 += 1;
                }
            }

            if c1 == 0 {
                if let Some(idx) = first_c2_idx {
                    let gt2_ctxs = contexts.plane_mut(ContextGroupId::GreaterTwo, plane);
                    bin.encode_bin(levels.abs[idx] > 2, &mut gt2_ctxs[ctx_set])?;
                }
            }

            let sign_hidden = threshold
                .is_some_and(|t| (levels.last_scan_pos - levels.first_scan_pos) as u32 >= t);
            if sign_hidden {
                bin.encode_bins_ep(levels.signs >> 1, (n - 1) as u32)?;
                summary.hidden_signs += 1;
            } else {
                bin.encode_bins_ep(levels.signs, n as u32)?;
            }

            if c1 == 0 || n > C1FLAG_NUMBER {
                let mut first_coeff2 = 1;
                for (idx, &abs) in levels.abs[..n].iter().enumerate() {
                    let base_level = if idx < C1FLAG_NUMBER {
                        2 + first_coeff2
                    } else {
                        1
                    };
                    if abs >= base_level {
                        write_go_rice_exp_golomb(bin, abs - base_level, rice.param)?;
                        rice.update(abs);
                    }
                    if abs >= 2 {
                        first_coeff2 = 0;
                        level_state.num_one += 1;
                    }
                }
            }
        }

        trace!(
            last_scan_pos = summary.last_scan_pos,
            num_nonzero = summary.num_nonzero,
            hidden_signs = summary.hidden_signs,
            coded_groups = summary.coded_groups,
            "Residual block coded"
        );
        Ok(summary)
    }
}
