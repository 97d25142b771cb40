//! Binary arithmetic coding engines.
//!
//! Syntax element coding is written against the [`BinEncoder`] trait so the
//! same code drives three engines:
//!
//! - [`CabacWriter`]: the real arithmetic coder, emitting bytes through a
//!   [`BitWriter`]
//! - [`BinCounter`]: a fractional bit counter for rate-distortion trials
//! - [`BinTrace`]: records every bin, for debugging and conformance checks

use transcode_core::bitstream::BitWriter;

use crate::context::ContextModel;
use crate::error::{CabacError, Result};

/// Largest number of bypass bins accepted by one `encode_bins_ep` call.
pub const MAX_BYPASS_BINS: u32 = 32;

/// Sink for binary decisions.
pub trait BinEncoder {
    /// Reset the arithmetic coder registers for a new segment.
    fn start(&mut self);

    /// Terminate the arithmetic codeword.
    fn finish(&mut self) -> Result<()>;

    /// Terminating bin, finish, stop bit and byte alignment, then restart.
    fn flush(&mut self) -> Result<()>;

    /// Encode a context-coded bin and adapt the context.
    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()>;

    /// Encode one equiprobable bin.
    fn encode_bin_ep(&mut self, bin: bool) -> Result<()>;

    /// Encode the low `num_bins` bits of `bins` as bypass bins, MSB first.
    fn encode_bins_ep(&mut self, bins: u32, num_bins: u32) -> Result<()>;

    /// Encode a terminating bin.
    fn encode_bin_trm(&mut self, bin: bool) -> Result<()>;

    /// Bits produced so far, including bits pending in the coder registers.
    fn num_written_bits(&self) -> u64;

    /// Forget the bits produced so far. The coding interval is kept.
    fn reset_bits(&mut self);

    /// Overwrite this engine with the state of `src`.
    fn copy_state(&mut self, src: &Self)
    where
        Self: Sized;
}

fn check_bypass_len(num_bins: u32) -> Result<()> {
    if num_bins > MAX_BYPASS_BINS {
        return Err(CabacError::BinLimitExceeded {
            bins: num_bins,
            max: MAX_BYPASS_BINS,
        });
    }
    Ok(())
}

/// Arithmetic coder writing to a [`BitWriter`].
///
/// `low` keeps 23 spare bits above the 9-bit coding interval. Whole bytes are
/// released once fewer than 12 spare bits remain; a run of 0xFF bytes is held
/// back until a possible carry has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CabacWriter {
    writer: BitWriter,
    low: u32,
    range: u32,
    bits_left: i32,
    num_buffered_bytes: u32,
    buffered_byte: u32,
}

impl Default for CabacWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl CabacWriter {
    /// Create a writer with an empty output buffer.
    pub fn new() -> Self {
        Self::with_writer(BitWriter::with_capacity(4096))
    }

    /// Create a writer appending to an existing bit writer.
    pub fn with_writer(writer: BitWriter) -> Self {
        Self {
            writer,
            low: 0,
            range: 510,
            bits_left: 23,
            num_buffered_bytes: 0,
            buffered_byte: 0xff,
        }
    }

    /// Underlying bit writer.
    pub fn writer(&self) -> &BitWriter {
        &self.writer
    }

    /// Mutable access to the underlying bit writer.
    pub fn writer_mut(&mut self) -> &mut BitWriter {
        &mut self.writer
    }

    /// Completed output bytes.
    pub fn data(&self) -> &[u8] {
        self.writer.data()
    }

    /// Take the output, padding a partial byte with zeros.
    pub fn into_data(self) -> Vec<u8> {
        self.writer.into_data()
    }

    /// Current interval width.
    pub fn range(&self) -> u32 {
        self.range
    }

    fn test_and_write_out(&mut self) -> Result<()> {
        if self.bits_left < 12 {
            self.write_out()?;
        }
        Ok(())
    }

    fn write_out(&mut self) -> Result<()> {
        let lead_byte = self.low >> (24 - self.bits_left);
        self.bits_left += 8;
        self.low &= 0xffff_ffff >> self.bits_left;

        if lead_byte == 0xff {
            self.num_buffered_bytes += 1;
        } else if self.num_buffered_bytes > 0 {
            let carry = lead_byte >> 8;
            let byte = self.buffered_byte + carry;
            self.buffered_byte = lead_byte & 0xff;
            self.writer.write_bits(byte, 8)?;

            let byte = (0xff + carry) & 0xff;
            while self.num_buffered_bytes > 1 {
                self.writer.write_bits(byte, 8)?;
                self.num_buffered_bytes -= 1;
            }
        } else {
            self.num_buffered_bytes = 1;
            self.buffered_byte = lead_byte;
        }
        Ok(())
    }
}

impl BinEncoder for CabacWriter {
    fn start(&mut self) {
        self.low = 0;
        self.range = 510;
        self.bits_left = 23;
        self.num_buffered_bytes = 0;
        self.buffered_byte = 0xff;
    }

    fn finish(&mut self) -> Result<()> {
        if (self.low >> (32 - self.bits_left)) != 0 {
            self.writer.write_bits((self.buffered_byte + 1) & 0xff, 8)?;
            while self.num_buffered_bytes > 1 {
                self.writer.write_bits(0x00, 8)?;
                self.num_buffered_bytes -= 1;
            }
            self.low -= 1 << (32 - self.bits_left);
        } else {
            if self.num_buffered_bytes > 0 {
                self.writer.write_bits(self.buffered_byte, 8)?;
            }
            while self.num_buffered_bytes > 1 {
                self.writer.write_bits(0xff, 8)?;
                self.num_buffered_bytes -= 1;
            }
        }
        self.writer
            .write_bits(self.low >> 8, (24 - self.bits_left) as u32)?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.encode_bin_trm(true)?;
        self.finish()?;
        self.writer.write_rbsp_trailing_bits()?;
        self.start();
        Ok(())
    }

    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        let lps = ctx.lps_range(self.range);
        self.range -= lps;

        if bin != ctx.mps() {
            let num_bits = ContextModel::renorm_shift(lps);
            self.low = (self.low + self.range) << num_bits;
            self.range = lps << num_bits;
            self.bits_left -= num_bits as i32;
            ctx.update(bin);
        } else {
            ctx.update(bin);
            if self.range >= 256 {
                return Ok(());
            }
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }

        self.test_and_write_out()
    }

    fn encode_bin_ep(&mut self, bin: bool) -> Result<()> {
        self.low <<= 1;
        if bin {
            self.low += self.range;
        }
        self.bits_left -= 1;
        self.test_and_write_out()
    }

    fn encode_bins_ep(&mut self, bins: u32, num_bins: u32) -> Result<()> {
        check_bypass_len(num_bins)?;

        let mut num_bins = num_bins;
        while num_bins > 8 {
            num_bins -= 8;
            let pattern = (bins >> num_bins) & 0xff;
            self.low <<= 8;
            self.low += self.range * pattern;
            self.bits_left -= 8;
            self.test_and_write_out()?;
        }

        if num_bins == 0 {
            return Ok(());
        }
        let pattern = bins & ((1 << num_bins) - 1);
        self.low <<= num_bins;
        self.low += self.range * pattern;
        self.bits_left -= num_bins as i32;
        self.test_and_write_out()
    }

    fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        self.range -= 2;
        if bin {
            self.low += self.range;
            self.low <<= 7;
            self.range = 2 << 7;
            self.bits_left -= 7;
        } else if self.range >= 256 {
            return Ok(());
        } else {
            self.low <<= 1;
            self.range <<= 1;
            self.bits_left -= 1;
        }
        self.test_and_write_out()
    }

    fn num_written_bits(&self) -> u64 {
        self.writer.num_written_bits()
            + 8 * u64::from(self.num_buffered_bytes)
            + (23 - self.bits_left) as u64
    }

    fn reset_bits(&mut self) {
        self.writer.clear();
        self.low = 0;
        self.bits_left = 23;
        self.num_buffered_bytes = 0;
        self.buffered_byte = 0xff;
    }

    fn copy_state(&mut self, src: &Self) {
        self.clone_from(src);
    }
}

/// Fractional bit counter used for rate-distortion trials.
///
/// Costs are accumulated in 1/32768 bit units. Regular bins cost the
/// context's entropy estimate, bypass bins exactly one bit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinCounter {
    committed_bits: u64,
    frac_bits: u64,
}

impl BinCounter {
    /// Create an empty counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulated cost in 1/32768 bit units, including committed bits.
    pub fn frac_bits(&self) -> u64 {
        (self.committed_bits << 15) + self.frac_bits
    }
}

impl BinEncoder for BinCounter {
    fn start(&mut self) {}

    fn finish(&mut self) -> Result<()> {
        self.committed_bits += self.frac_bits >> 15;
        self.frac_bits &= 0x7fff;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.encode_bin_trm(true)?;
        self.finish()?;
        self.committed_bits += 1;
        self.start();
        Ok(())
    }

    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        self.frac_bits += u64::from(ctx.entropy_bits(bin));
        ctx.update(bin);
        Ok(())
    }

    fn encode_bin_ep(&mut self, _bin: bool) -> Result<()> {
        self.frac_bits += 1 << 15;
        Ok(())
    }

    fn encode_bins_ep(&mut self, _bins: u32, num_bins: u32) -> Result<()> {
        check_bypass_len(num_bins)?;
        self.frac_bits += u64::from(num_bins) << 15;
        Ok(())
    }

    fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        self.frac_bits += u64::from(ContextModel::entropy_bits_trm(bin));
        Ok(())
    }

    fn num_written_bits(&self) -> u64 {
        self.committed_bits + (self.frac_bits >> 15)
    }

    fn reset_bits(&mut self) {
        self.committed_bits = 0;
        self.frac_bits &= 0x7fff;
    }

    fn copy_state(&mut self, src: &Self) {
        self.clone_from(src);
    }
}

/// One recorded bin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TracedBin {
    /// Context-coded bin with the packed context state it was coded with.
    Context { bin: bool, state: u8 },
    /// Bypass bin.
    Bypass(bool),
    /// Terminating bin.
    Terminate(bool),
}

impl TracedBin {
    /// Value of the bin.
    pub fn value(&self) -> bool {
        match *self {
            TracedBin::Context { bin, .. } => bin,
            TracedBin::Bypass(bin) | TracedBin::Terminate(bin) => bin,
        }
    }
}

/// Engine that records bins instead of coding them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BinTrace {
    bins: Vec<TracedBin>,
    finishes: u32,
}

impl BinTrace {
    /// Create an empty trace.
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded bins, oldest first.
    pub fn bins(&self) -> &[TracedBin] {
        &self.bins
    }

    /// Recorded bin values, oldest first.
    pub fn values(&self) -> Vec<bool> {
        self.bins.iter().map(TracedBin::value).collect()
    }

    /// Number of times the codeword was finished.
    pub fn finishes(&self) -> u32 {
        self.finishes
    }

    /// Drop every recorded bin.
    pub fn clear(&mut self) {
        self.bins.clear();
        self.finishes = 0;
    }

    /// Take the recorded bins, leaving the trace empty.
    pub fn take(&mut self) -> Vec<TracedBin> {
        std::mem::take(&mut self.bins)
    }
}

impl BinEncoder for BinTrace {
    fn start(&mut self) {}

    fn finish(&mut self) -> Result<()> {
        self.finishes += 1;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.encode_bin_trm(true)?;
        self.finish()
    }

    fn encode_bin(&mut self, bin: bool, ctx: &mut ContextModel) -> Result<()> {
        self.bins.push(TracedBin::Context {
            bin,
            state: ctx.packed_state(),
        });
        ctx.update(bin);
        Ok(())
    }

    fn encode_bin_ep(&mut self, bin: bool) -> Result<()> {
        self.bins.push(TracedBin::Bypass(bin));
        Ok(())
    }

    fn encode_bins_ep(&mut self, bins: u32, num_bins: u32) -> Result<()> {
        check_bypass_len(num_bins)?;
        for i in (0..num_bins).rev() {
            self.bins.push(TracedBin::Bypass((bins >> i) & 1 != 0));
        }
        Ok(())
    }

    fn encode_bin_trm(&mut self, bin: bool) -> Result<()> {
        self.bins.push(TracedBin::Terminate(bin));
        Ok(())
    }

    fn num_written_bits(&self) -> u64 {
        self.bins.len() as u64
    }

    fn reset_bits(&mut self) {
        self.bins.clear();
    }

    fn copy_state(&mut self, src: &Self) {
        self.clone_from(src);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_initial_state() {
        let writer = CabacWriter::new();
        assert_eq!(writer.range(), 510);
        assert_eq!(writer.num_written_bits(), 0);
        assert!(writer.data().is_empty());
    }

    #[test]
    fn test_flush_aligns_output() {
        let mut writer = CabacWriter::new();
        let mut ctx = ContextModel::new(26, 154);
        for i in 0..100 {
            writer.encode_bin(i % 3 == 0, &mut ctx).unwrap();
        }
        writer.flush().unwrap();
        assert!(writer.writer().is_byte_aligned());
        // Stop bit then zero padding, so the last byte is never zero
        assert_ne!(writer.data().last().copied(), Some(0));
        assert!(!writer.data().is_empty());
        assert_eq!(writer.range(), 510);
    }

    #[test]
    fn test_bypass_bits_counted() {
        let mut writer = CabacWriter::new();
        writer.encode_bins_ep(0xabcd, 16).unwrap();
        assert_eq!(writer.num_written_bits(), 16);
        writer.encode_bin_ep(true).unwrap();
        assert_eq!(writer.num_written_bits(), 17);
    }

    #[test]
    fn test_bypass_limit() {
        let mut writer = CabacWriter::new();
        let err = writer.encode_bins_ep(0, 33).unwrap_err();
        assert!(matches!(err, CabacError::BinLimitExceeded { bins: 33, .. }));
        assert!(BinCounter::new().encode_bins_ep(0, 40).is_err());
        assert!(BinTrace::new().encode_bins_ep(0, 40).is_err());
    }

    #[test]
    fn test_bypass_zero_bins_is_noop() {
        let mut writer = CabacWriter::new();
        let before = writer.clone();
        writer.encode_bins_ep(0, 0).unwrap();
        assert_eq!(writer, before);
    }

    #[test]
    fn test_copy_state() {
        let mut a = CabacWriter::new();
        let mut ctx = ContextModel::new(30, 139);
        for _ in 0..50 {
            a.encode_bin(true, &mut ctx).unwrap();
        }
        let mut b = CabacWriter::new();
        b.copy_state(&a);
        assert_eq!(a, b);
    }

    #[test]
    fn test_counter_costs() {
        let mut counter = BinCounter::new();
        counter.encode_bins_ep(0, 5).unwrap();
        assert_eq!(counter.num_written_bits(), 5);

        let mut ctx = ContextModel::new(26, 154);
        counter.encode_bin(true, &mut ctx).unwrap();
        assert_eq!(counter.num_written_bits(), 6);
        assert_eq!(ctx.state(), 1);

        // A run of MPS bins costs well under a bit each
        let mut skewed = ContextModel::new(26, 154);
        let mut cheap = BinCounter::new();
        for _ in 0..64 {
            cheap.encode_bin(true, &mut skewed).unwrap();
        }
        assert!(cheap.num_written_bits() < 32);
    }

    #[test]
    fn test_writer_reset_bits() {
        let mut writer = CabacWriter::new();
        writer.start();
        let mut ctx = ContextModel::new(26, 154);
        for i in 0..5 {
            writer.encode_bin(i % 2 == 0, &mut ctx).unwrap();
        }
        let range = writer.range();
        assert!(writer.num_written_bits() > 0);

        writer.reset_bits();
        assert_eq!(writer.num_written_bits(), 0);
        assert_eq!(writer.range(), range);

        writer.encode_bins_ep(0xa5, 8).unwrap();
        assert_eq!(writer.num_written_bits(), 8);
    }

    #[test]
    fn test_counter_reset_keeps_fraction() {
        let mut counter = BinCounter::new();
        counter.encode_bins_ep(0, 3).unwrap();
        counter.encode_bin_trm(false).unwrap();
        let fraction = counter.frac_bits() & 0x7fff;
        counter.reset_bits();
        assert_eq!(counter.num_written_bits(), 0);
        assert_eq!(counter.frac_bits(), fraction);
    }

    #[test]
    fn test_trace_records_bins() {
        let mut trace = BinTrace::new();
        let mut ctx = ContextModel::new(26, 154);
        trace.encode_bin(true, &mut ctx).unwrap();
        trace.encode_bins_ep(0b101, 3).unwrap();
        trace.encode_bin_trm(true).unwrap();

        assert_eq!(
            trace.bins(),
            &[
                TracedBin::Context { bin: true, state: 1 },
                TracedBin::Bypass(true),
                TracedBin::Bypass(false),
                TracedBin::Bypass(true),
                TracedBin::Terminate(true),
            ]
        );
        assert_eq!(trace.values(), vec![true, true, false, true, true]);
        assert_eq!(trace.num_written_bits(), 5);
    }
}
