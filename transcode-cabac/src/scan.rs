//! Coefficient scan orders.
//!
//! Blocks are coded in 4x4 coefficient groups. Both the groups and the
//! coefficients inside a group follow the same order, so a scan for a block
//! of side `n` is the group scan over an `n/4` grid expanded by the 4x4 scan.

/// Scan order of a transform block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScanOrder {
    /// Up-right diagonal.
    #[default]
    Diagonal,
    /// Row by row.
    Horizontal,
    /// Column by column.
    Vertical,
}

impl ScanOrder {
    fn index(self) -> usize {
        match self {
            ScanOrder::Diagonal => 0,
            ScanOrder::Horizontal => 1,
            ScanOrder::Vertical => 2,
        }
    }
}

/// Smallest supported block side, log2.
pub const MIN_LOG2_BLOCK_SIZE: u32 = 2;
/// Largest supported block side, log2.
pub const MAX_LOG2_BLOCK_SIZE: u32 = 5;

const NUM_SIZES: usize = (MAX_LOG2_BLOCK_SIZE - MIN_LOG2_BLOCK_SIZE + 1) as usize;

/// Raster positions of a `side`x`side` grid in scan order.
fn grid_scan(order: ScanOrder, side: usize) -> Vec<u16> {
    let mut scan = Vec::with_capacity(side * side);
    match order {
        ScanOrder::Horizontal => {
            for y in 0..side {
                for x in 0..side {
                    scan.push((y * side + x) as u16);
                }
            }
        }
        ScanOrder::Vertical => {
            for x in 0..side {
                for y in 0..side {
                    scan.push((y * side + x) as u16);
                }
            }
        }
        ScanOrder::Diagonal => {
            // Anti-diagonals from the top-left, each walked bottom-left to top-right
            for diag in 0..(2 * side - 1) {
                let mut y = diag.min(side - 1) as isize;
                let mut x = diag as isize - y;
                while y >= 0 && (x as usize) < side {
                    scan.push((y as usize * side + x as usize) as u16);
                    y -= 1;
                    x += 1;
                }
            }
        }
    }
    scan
}

/// Block scan: groups in `order`, coefficients within each group in `order`.
fn block_scan(order: ScanOrder, log2_size: u32) -> Vec<u16> {
    let side = 1usize << log2_size;
    let cg_side = side >> 2;
    let groups = grid_scan(order, cg_side);
    let inner = grid_scan(order, 4);

    let mut scan = Vec::with_capacity(side * side);
    for &group in &groups {
        let gx = group as usize % cg_side;
        let gy = group as usize / cg_side;
        for &pos in &inner {
            let x = gx * 4 + pos as usize % 4;
            let y = gy * 4 + pos as usize / 4;
            scan.push((y * side + x) as u16);
        }
    }
    scan
}

/// Precomputed scans for every order and block size.
#[derive(Debug, Clone)]
pub struct ScanTables {
    coefficients: Vec<Vec<u16>>,
    groups: Vec<Vec<u16>>,
}

impl Default for ScanTables {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanTables {
    /// Build every table.
    pub fn new() -> Self {
        let orders = [ScanOrder::Diagonal, ScanOrder::Horizontal, ScanOrder::Vertical];
        let mut coefficients = Vec::with_capacity(3 * NUM_SIZES);
        let mut groups = Vec::with_capacity(3 * NUM_SIZES);

        for order in orders {
            for log2_size in MIN_LOG2_BLOCK_SIZE..=MAX_LOG2_BLOCK_SIZE {
                coefficients.push(block_scan(order, log2_size));
                groups.push(grid_scan(order, 1 << (log2_size - 2)));
            }
        }
        Self {
            coefficients,
            groups,
        }
    }

    fn slot(order: ScanOrder, log2_size: u32) -> usize {
        debug_assert!((MIN_LOG2_BLOCK_SIZE..=MAX_LOG2_BLOCK_SIZE).contains(&log2_size));
        order.index() * NUM_SIZES + (log2_size - MIN_LOG2_BLOCK_SIZE) as usize
    }

    /// Raster positions of the coefficients of a block, in scan order.
    pub fn coefficients(&self, order: ScanOrder, log2_size: u32) -> &[u16] {
        &self.coefficients[Self::slot(order, log2_size)]
    }

    /// Raster positions of the coefficient groups of a block, in scan order.
    pub fn groups(&self, order: ScanOrder, log2_size: u32) -> &[u16] {
        &self.groups[Self::slot(order, log2_size)]
    }
}
