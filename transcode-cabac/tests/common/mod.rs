//! Shared helpers for integration tests: a reference CABAC decoder and the
//! inverse binarizations.

#![allow(dead_code)]

use transcode_cabac::binarization::{GO_RICE_PREFIX_LEN, GO_RICE_RANGE};
use transcode_cabac::{ContextModel, TracedBin};
use transcode_core::bitstream::BitReader;

/// Standard CABAC decoding process over a byte buffer.
///
/// Reads past the end of the data yield zero bytes.
pub struct CabacReader<'a> {
    reader: BitReader<'a>,
    value: u32,
    range: u32,
    bits_needed: i32,
}

impl<'a> CabacReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        let mut dec = Self {
            reader: BitReader::new(data),
            value: 0,
            range: 510,
            bits_needed: -8,
        };
        dec.value = (dec.read_byte() << 8) | dec.read_byte();
        dec
    }

    fn read_byte(&mut self) -> u32 {
        self.reader.read_bits(8).unwrap_or(0)
    }

    pub fn decode_bin(&mut self, ctx: &mut ContextModel) -> bool {
        let lps = ctx.lps_range(self.range);
        self.range -= lps;
        let scaled_range = self.range << 7;

        if self.value < scaled_range {
            let bin = ctx.mps();
            ctx.update(bin);
            if scaled_range < (256 << 7) {
                self.range = scaled_range >> 6;
                self.value <<= 1;
                self.bits_needed += 1;
                if self.bits_needed == 0 {
                    self.bits_needed = -8;
                    self.value += self.read_byte();
                }
            }
            bin
        } else {
            let bin = !ctx.mps();
            let mut num_bits = 0;
            while (lps << num_bits) < 256 {
                num_bits += 1;
            }
            self.value = (self.value - scaled_range) << num_bits;
            self.range = lps << num_bits;
            ctx.update(bin);
            self.bits_needed += num_bits;
            if self.bits_needed >= 0 {
                self.value += self.read_byte() << self.bits_needed;
                self.bits_needed -= 8;
            }
            bin
        }
    }

    pub fn decode_bin_ep(&mut self) -> bool {
        self.value <<= 1;
        self.bits_needed += 1;
        if self.bits_needed >= 0 {
            self.bits_needed = -8;
            self.value += self.read_byte();
        }

        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            self.value -= scaled_range;
            true
        } else {
            false
        }
    }

    pub fn decode_bins_ep(&mut self, num_bins: u32) -> u32 {
        (0..num_bins).fold(0, |acc, _| (acc << 1) | u32::from(self.decode_bin_ep()))
    }

    pub fn decode_bin_trm(&mut self) -> bool {
        self.range -= 2;
        let scaled_range = self.range << 7;
        if self.value >= scaled_range {
            return true;
        }
        if scaled_range < (256 << 7) {
            self.range = scaled_range >> 6;
            self.value <<= 1;
            self.bits_needed += 1;
            if self.bits_needed == 0 {
                self.bits_needed = -8;
                self.value += self.read_byte();
            }
        }
        false
    }

    /// Decode one bin of the same kind as `traced`, rebuilding its context
    /// from the traced state.
    pub fn decode_like(&mut self, traced: &TracedBin) -> bool {
        match *traced {
            TracedBin::Context { state, .. } => {
                let mut ctx = ContextModel::from_packed_state(state);
                self.decode_bin(&mut ctx)
            }
            TracedBin::Bypass(_) => self.decode_bin_ep(),
            TracedBin::Terminate(_) => self.decode_bin_trm(),
        }
    }
}

/// Decode `data` following the bin kinds and contexts of `trace`.
pub fn replay_trace(data: &[u8], trace: &[TracedBin]) -> Vec<bool> {
    let mut dec = CabacReader::new(data);
    trace.iter().map(|bin| dec.decode_like(bin)).collect()
}

/// Inverse truncated unary code. Returns the symbol and the bins consumed.
pub fn read_truncated_unary(bins: &[bool], max_symbol: u32) -> (u32, usize) {
    let mut symbol = 0;
    let mut used = 0;
    while symbol < max_symbol {
        let bin = bins[used];
        used += 1;
        if !bin {
            break;
        }
        symbol += 1;
    }
    (symbol, used)
}

/// Inverse Exp-Golomb code of order `k`.
pub fn read_exp_golomb(bins: &[bool], k: u32) -> (u32, usize) {
    let mut k = k;
    let mut symbol = 0u32;
    let mut used = 0;
    while bins[used] {
        symbol += 1 << k;
        k += 1;
        used += 1;
    }
    used += 1;

    let suffix = read_fixed(&bins[used..], k);
    (symbol + suffix, used + k as usize)
}

/// Inverse adaptive Golomb-Rice code with Exp-Golomb escape.
pub fn read_go_rice(bins: &[bool], rice_param: u32) -> (u32, usize) {
    let r = rice_param as usize;
    let max_prefix_len = GO_RICE_PREFIX_LEN[r];

    let mut quotient = 0;
    let mut used = 0;
    while quotient < max_prefix_len {
        let bin = bins[used];
        used += 1;
        if !bin {
            break;
        }
        quotient += 1;
    }

    let value = (quotient << rice_param) + read_fixed(&bins[used..], rice_param);
    used += rice_param as usize;

    let escape_value = GO_RICE_RANGE[r] + 1;
    if value == escape_value {
        let (excess, eg_used) = read_exp_golomb(&bins[used..], 0);
        (escape_value + excess, used + eg_used)
    } else {
        (value, used)
    }
}

fn read_fixed(bins: &[bool], n: u32) -> u32 {
    bins[..n as usize]
        .iter()
        .fold(0, |acc, &b| (acc << 1) | u32::from(b))
}

/// Deterministic pseudo-random generator for bin sequences.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as u32
    }

    /// A bin that is one with probability `percent`/100.
    pub fn biased(&mut self, percent: u32) -> bool {
        self.next_u32() % 100 < percent
    }
}
