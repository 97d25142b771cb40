//! Adaptive probability models.
//!
//! A [`ContextModel`] is one of the 63 probability states of the HEVC
//! arithmetic coder plus the value of the most probable symbol. Models are
//! initialized from an 8-bit init value and the slice QP, adapt after every
//! coded bin and can report the fractional cost of coding a bin in 1/32768
//! bit units.

/// Fractional bits per whole bit in cost estimates.
pub const FRAC_BITS_SCALE: u32 = 1 << 15;

/// One adaptive binary probability model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextModel {
    /// Probability state index (0-62 for adaptive models).
    state: u8,
    /// Most probable symbol.
    mps: bool,
    /// Whether at least one bin has been coded since initialization.
    bins_coded: bool,
}

impl ContextModel {
    /// Create a model initialized for `qp` from `init_value`.
    pub fn new(qp: i32, init_value: u8) -> Self {
        let mut ctx = Self::default();
        ctx.init(qp, init_value);
        ctx
    }

    /// Rebuild a model from a `(state << 1) | mps` value.
    ///
    /// States above 62 are clamped to 62.
    pub fn from_packed_state(packed: u8) -> Self {
        Self {
            state: (packed >> 1).min(62),
            mps: packed & 1 != 0,
            bins_coded: false,
        }
    }

    /// Initialize from an 8-bit init value at the given slice QP.
    ///
    /// The QP is clamped to 0..=51 before use.
    pub fn init(&mut self, qp: i32, init_value: u8) {
        let qp = qp.clamp(0, 51);
        let slope = i32::from(init_value >> 4) * 5 - 45;
        let offset = (i32::from(init_value & 15) << 3) - 16;
        let init_state = (((slope * qp) >> 4) + offset).clamp(1, 126);

        self.mps = init_state >= 64;
        self.state = if self.mps {
            (init_state - 64) as u8
        } else {
            (63 - init_state) as u8
        };
        self.bins_coded = false;
    }

    /// Update the model after coding `bin`.
    pub fn update(&mut self, bin: bool) {
        if bin == self.mps {
            self.state = NEXT_STATE_MPS[self.state as usize];
        } else {
            if self.state == 0 {
                self.mps = !self.mps;
            }
            self.state = NEXT_STATE_LPS[self.state as usize];
        }
        self.bins_coded = true;
    }

    /// Probability state index.
    pub fn state(&self) -> u8 {
        self.state
    }

    /// Most probable symbol.
    pub fn mps(&self) -> bool {
        self.mps
    }

    /// Combined `(state << 1) | mps` value.
    pub fn packed_state(&self) -> u8 {
        (self.state << 1) | u8::from(self.mps)
    }

    /// Whether the model adapted since it was last initialized.
    pub fn bins_coded(&self) -> bool {
        self.bins_coded
    }

    /// LPS sub-range for the quantized current range.
    #[inline]
    pub fn lps_range(&self, range: u32) -> u32 {
        u32::from(RANGE_TAB_LPS[self.state as usize][((range >> 6) & 3) as usize])
    }

    /// Renormalization shift needed after coding an LPS of width `lps`.
    #[inline]
    pub(crate) fn renorm_shift(lps: u32) -> u32 {
        u32::from(RENORM_TABLE[(lps >> 3) as usize & 31])
    }

    /// Estimated cost of coding `bin` with this model, in 1/32768 bits.
    #[inline]
    pub fn entropy_bits(&self, bin: bool) -> u32 {
        ENTROPY_BITS[(self.packed_state() ^ u8::from(bin)) as usize]
    }

    /// Estimated cost of a terminating bin, in 1/32768 bits.
    ///
    /// Terminating bins use the fixed non-adapting state 63 with MPS 0.
    #[inline]
    pub fn entropy_bits_trm(bin: bool) -> u32 {
        ENTROPY_BITS[(126 ^ u8::from(bin)) as usize]
    }

    /// Probability of the least probable symbol in the current state.
    pub fn prob_lps(&self) -> f64 {
        STATE_TO_PROB_LPS[self.state as usize]
    }

    /// Expected cost of coding this model's observed statistics with a model
    /// freshly initialized from `init_value` at `qp`.
    ///
    /// Models that never coded a bin contribute nothing.
    pub fn init_cost(&self, qp: i32, init_value: u8) -> u32 {
        if !self.bins_coded {
            return 0;
        }

        let candidate = ContextModel::new(qp, init_value);
        let prob_lps = self.prob_lps();
        let (prob0, prob1) = if self.mps {
            (prob_lps, 1.0 - prob_lps)
        } else {
            (1.0 - prob_lps, prob_lps)
        };

        (prob0 * f64::from(candidate.entropy_bits(false))
            + prob1 * f64::from(candidate.entropy_bits(true))) as u32
    }
}

// State transition tables
pub(crate) const NEXT_STATE_MPS: [u8; 64] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16,
    17, 18, 19, 20, 21, 22, 23, 24, 25, 26, 27, 28, 29, 30, 31, 32,
    33, 34, 35, 36, 37, 38, 39, 40, 41, 42, 43, 44, 45, 46, 47, 48,
    49, 50, 51, 52, 53, 54, 55, 56, 57, 58, 59, 60, 61, 62, 62, 63,
];

pub(crate) const NEXT_STATE_LPS: [u8; 64] = [
    0, 0, 1, 2, 2, 4, 4, 5, 6, 7, 8, 9, 9, 11, 11, 12,
    13, 13, 15, 15, 16, 16, 18, 18, 19, 19, 21, 21, 22, 22, 23, 24,
    24, 25, 26, 26, 27, 27, 28, 29, 29, 30, 30, 30, 31, 32, 32, 33,
    33, 33, 34, 34, 35, 35, 35, 36, 36, 36, 37, 37, 37, 38, 38, 63,
];

// LPS sub-range, indexed by state and quantized range
pub(crate) const RANGE_TAB_LPS: [[u8; 4]; 64] = [
    [128, 176, 208, 240], [128, 167, 197, 227], [128, 158, 187, 216], [123, 150, 178, 205],
    [116, 142, 169, 195], [111, 135, 160, 185], [105, 128, 152, 175], [100, 122, 144, 166],
    [95, 116, 137, 158], [90, 110, 130, 150], [85, 104, 123, 142], [81, 99, 117, 135],
    [77, 94, 111, 128], [73, 89, 105, 122], [69, 85, 100, 116], [66, 80, 95, 110],
    [62, 76, 90, 104], [59, 72, 86, 99], [56, 69, 81, 94], [53, 65, 77, 89],
    [51, 62, 73, 85], [48, 59, 69, 80], [46, 56, 66, 76], [43, 53, 63, 72],
    [41, 50, 59, 69], [39, 48, 56, 65], [37, 45, 54, 62], [35, 43, 51, 59],
    [33, 41, 48, 56], [32, 39, 46, 53], [30, 37, 43, 50], [29, 35, 41, 48],
    [27, 33, 39, 45], [26, 31, 37, 43], [24, 30, 35, 41], [23, 28, 33, 39],
    [22, 27, 32, 37], [21, 26, 30, 35], [20, 24, 29, 33], [19, 23, 27, 31],
    [18, 22, 26, 30], [17, 21, 25, 28], [16, 20, 23, 27], [15, 19, 22, 25],
    [14, 18, 21, 24], [14, 17, 20, 23], [13, 16, 19, 22], [12, 15, 18, 21],
    [12, 14, 17, 20], [11, 14, 16, 19], [11, 13, 15, 18], [10, 12, 15, 17],
    [10, 12, 14, 16], [9, 11, 13, 15], [9, 11, 12, 14], [8, 10, 12, 14],
    [8, 9, 11, 13], [7, 9, 11, 12], [7, 9, 10, 12], [7, 8, 10, 11],
    [6, 8, 9, 11], [6, 7, 9, 10], [6, 7, 8, 9], [2, 2, 2, 2],
];

// Renormalization shift after an LPS, indexed by lps >> 3
const RENORM_TABLE: [u8; 32] = [
    6, 5, 4, 4, 3, 3, 3, 3, 2, 2, 2, 2, 2, 2, 2, 2,
    1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1,
];

// -log2(p) * 32768 for the MPS (even index) and LPS (odd index) of each state
pub(crate) const ENTROPY_BITS: [u32; 128] = [
    0x08000, 0x08000, 0x076da, 0x089a0, 0x06e92, 0x09340, 0x06709, 0x09cdf,
    0x06029, 0x0a67f, 0x059dd, 0x0b01f, 0x05413, 0x0b9bf, 0x04ebf, 0x0c35f,
    0x049d3, 0x0ccff, 0x04546, 0x0d69e, 0x0410d, 0x0e03e, 0x03d22, 0x0e9de,
    0x0397d, 0x0f37e, 0x03619, 0x0fd1e, 0x032ee, 0x106be, 0x02ffa, 0x1105d,
    0x02d37, 0x119fd, 0x02aa2, 0x1239d, 0x02836, 0x12d3d, 0x025f2, 0x136dd,
    0x023d1, 0x1407c, 0x021d2, 0x14a1c, 0x01ff2, 0x153bc, 0x01e2f, 0x15d5c,
    0x01c87, 0x166fc, 0x01af7, 0x1709c, 0x0197f, 0x17a3b, 0x0181d, 0x183db,
    0x016d0, 0x18d7b, 0x01595, 0x1971b, 0x0146c, 0x1a0bb, 0x01354, 0x1aa5b,
    0x0124c, 0x1b3fa, 0x01153, 0x1bd9a, 0x01067, 0x1c73a, 0x00f89, 0x1d0da,
    0x00eb7, 0x1da7a, 0x00df0, 0x1e419, 0x00d34, 0x1edb9, 0x00c82, 0x1f759,
    0x00bda, 0x200f9, 0x00b3c, 0x20a99, 0x00aa5, 0x21439, 0x00a17, 0x21dd8,
    0x00990, 0x22778, 0x00911, 0x23118, 0x00898, 0x23ab8, 0x00826, 0x24458,
    0x007ba, 0x24df8, 0x00753, 0x25797, 0x006f2, 0x26137, 0x00696, 0x26ad7,
    0x0063f, 0x27477, 0x005ed, 0x27e17, 0x0059f, 0x287b6, 0x00554, 0x29156,
    0x0050e, 0x29af6, 0x004cc, 0x2a496, 0x0048c, 0x2ae36, 0x00451, 0x2b7d6,
    0x00418, 0x2c175, 0x003e2, 0x2cb15, 0x003af, 0x2d4b5, 0x0037f, 0x2de55,
];

pub(crate) const STATE_TO_PROB_LPS: [f64; 64] = [
    0.50000000, 0.47460857, 0.45050660, 0.42762859, 0.40591239, 0.38529900, 0.36573242, 0.34715948,
    0.32952974, 0.31279528, 0.29691064, 0.28183267, 0.26752040, 0.25393496, 0.24103941, 0.22879875,
    0.21717969, 0.20615069, 0.19568177, 0.18574449, 0.17631186, 0.16735824, 0.15885931, 0.15079198,
    0.14313433, 0.13586556, 0.12896592, 0.12241667, 0.11620000, 0.11029903, 0.10469773, 0.09938088,
    0.09433404, 0.08954349, 0.08499621, 0.08067986, 0.07658271, 0.07269362, 0.06900203, 0.06549791,
    0.06217174, 0.05901448, 0.05601756, 0.05317283, 0.05047256, 0.04790942, 0.04547644, 0.04316702,
    0.04097487, 0.03889405, 0.03691890, 0.03504406, 0.03326442, 0.03157516, 0.02997168, 0.02844963,
    0.02700488, 0.02563349, 0.02433175, 0.02309612, 0.02192323, 0.02080991, 0.01975312, 0.01875000,
];
