//! Bit-level readers and writers.
//!
//! [`BitWriter`] is the byte sink behind the arithmetic coder: it accepts
//! MSB-first runs of up to 32 bits and keeps a partially filled byte until
//! it is complete. [`BitReader`] is its mirror and is used to parse what the
//! writer produced.

use crate::error::{BitstreamError, Result};

/// Largest number of bits transferred by a single call.
pub const MAX_BITS_PER_CALL: u32 = 32;

/// A bitstream writer for generating coded data.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BitWriter {
    data: Vec<u8>,
    /// Bits of the incomplete trailing byte, right aligned.
    held: u8,
    /// Number of valid bits in `held` (0..8).
    num_held: u8,
}

impl BitWriter {
    /// Create a new bit writer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new bit writer with capacity.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            data: Vec::with_capacity(bytes),
            held: 0,
            num_held: 0,
        }
    }

    /// Number of bits written so far.
    pub fn num_written_bits(&self) -> u64 {
        self.data.len() as u64 * 8 + u64::from(self.num_held)
    }

    /// Check if the writer is byte-aligned.
    pub fn is_byte_aligned(&self) -> bool {
        self.num_held == 0
    }

    /// Write a single bit.
    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.write_bits(u32::from(bit), 1)
    }

    /// Write the low `n` bits of `value`, most significant first.
    ///
    /// Bits of `value` above `n` are ignored.
    pub fn write_bits(&mut self, value: u32, n: u32) -> Result<()> {
        if n > MAX_BITS_PER_CALL {
            return Err(BitstreamError::TooManyBits {
                requested: n,
                max: MAX_BITS_PER_CALL,
            }
            .into());
        }
        if n == 0 {
            return Ok(());
        }

        let value = if n == 32 { value } else { value & ((1u32 << n) - 1) };
        let total = u32::from(self.num_held) + n;
        let mut acc = (u64::from(self.held) << n) | u64::from(value);
        let mut pending = total;

        while pending >= 8 {
            pending -= 8;
            self.data.push((acc >> pending) as u8);
        }
        acc &= (1u64 << pending) - 1;

        self.held = acc as u8;
        self.num_held = pending as u8;
        Ok(())
    }

    /// Pad with zero bits up to the next byte boundary.
    pub fn write_align_zero(&mut self) -> Result<()> {
        if self.num_held != 0 {
            self.write_bits(0, 8 - u32::from(self.num_held))?;
        }
        Ok(())
    }

    /// Write RBSP trailing bits (a stop bit followed by zero alignment).
    pub fn write_rbsp_trailing_bits(&mut self) -> Result<()> {
        self.write_bit(true)?;
        self.write_align_zero()
    }

    /// Completed bytes. A partially written byte is not included.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Take the written data, consuming the writer.
    ///
    /// A partially written byte is zero padded.
    pub fn into_data(mut self) -> Vec<u8> {
        if self.num_held != 0 {
            let shift = 8 - self.num_held;
            self.data.push(self.held << shift);
        }
        self.data
    }

    /// Drop everything written so far.
    pub fn clear(&mut self) {
        self.data.clear();
        self.held = 0;
        self.num_held = 0;
    }
}

/// A bitstream reader for parsing coded data.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    bit_pos: usize,
}

impl<'a> BitReader<'a> {
    /// Create a new bit reader from a byte slice.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, bit_pos: 0 }
    }

    /// Current bit position.
    pub fn position(&self) -> usize {
        self.bit_pos
    }

    /// Number of bits left to read.
    pub fn remaining_bits(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.bit_pos)
    }

    /// Check if the stream is byte-aligned.
    pub fn is_byte_aligned(&self) -> bool {
        self.bit_pos % 8 == 0
    }

    /// Read a single bit.
    pub fn read_bit(&mut self) -> Result<bool> {
        let byte = self
            .data
            .get(self.bit_pos / 8)
            .ok_or(BitstreamError::UnexpectedEnd)?;
        let bit = (byte >> (7 - (self.bit_pos % 8))) & 1;
        self.bit_pos += 1;
        Ok(bit != 0)
    }

    /// Read up to 32 bits, most significant first.
    pub fn read_bits(&mut self, n: u32) -> Result<u32> {
        if n > MAX_BITS_PER_CALL {
            return Err(BitstreamError::TooManyBits {
                requested: n,
                max: MAX_BITS_PER_CALL,
            }
            .into());
        }
        if self.remaining_bits() < n as usize {
            return Err(BitstreamError::UnexpectedEnd.into());
        }

        let mut value = 0u32;
        for _ in 0..n {
            value = (value << 1) | u32::from(self.read_bit()?);
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_bits_across_bytes() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b101, 3).unwrap();
        writer.write_bits(0b1_0110_0111, 9).unwrap();
        assert_eq!(writer.num_written_bits(), 12);
        assert_eq!(writer.data(), &[0b1011_0110]);
        assert_eq!(writer.into_data(), vec![0b1011_0110, 0b0111_0000]);
    }

    #[test]
    fn test_write_bits_masks_high_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0x1ff, 8).unwrap();
        assert_eq!(writer.data(), &[0xff]);
    }

    #[test]
    fn test_write_32_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xdead_beef, 32).unwrap();
        assert_eq!(writer.data(), &[0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn test_write_too_many_bits() {
        let mut writer = BitWriter::new();
        assert!(writer.write_bits(0, 33).is_err());
    }

    #[test]
    fn test_alignment() {
        let mut writer = BitWriter::new();
        writer.write_bit(true).unwrap();
        writer.write_align_zero().unwrap();
        assert!(writer.is_byte_aligned());
        writer.write_align_zero().unwrap();
        assert_eq!(writer.data(), &[0x80]);
    }

    #[test]
    fn test_rbsp_trailing_bits() {
        let mut writer = BitWriter::new();
        writer.write_bits(0b11, 2).unwrap();
        writer.write_rbsp_trailing_bits().unwrap();
        assert_eq!(writer.data(), &[0b1110_0000]);
    }

    #[test]
    fn test_read_bits() {
        let data = [0b1011_0100, 0b1100_1010];
        let mut reader = BitReader::new(&data);

        assert_eq!(reader.read_bits(4).unwrap(), 0b1011);
        assert_eq!(reader.read_bits(4).unwrap(), 0b0100);
        assert!(reader.is_byte_aligned());
        assert_eq!(reader.read_bits(8).unwrap(), 0b1100_1010);
        assert!(reader.read_bit().unwrap_err().is_end_of_data());
    }

    #[test]
    fn test_clear() {
        let mut writer = BitWriter::new();
        writer.write_bits(0xab, 8).unwrap();
        writer.write_bit(true).unwrap();
        writer.clear();
        assert_eq!(writer.num_written_bits(), 0);
        assert!(writer.into_data().is_empty());
    }
}
