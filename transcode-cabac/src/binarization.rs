//! Binarization schemes.
//!
//! Each function maps a non-negative symbol onto bins and feeds them to a
//! [`BinEncoder`]. Context-coded schemes take the slice of contexts they may
//! use; bypass schemes take none.

use crate::context::ContextModel;
use crate::engine::{BinEncoder, MAX_BYPASS_BINS};
use crate::error::{CabacError, Result};

/// Largest symbol coded without escape, per Rice parameter.
pub const GO_RICE_RANGE: [u32; 5] = [7, 14, 26, 46, 78];

/// Longest unary prefix, per Rice parameter.
pub const GO_RICE_PREFIX_LEN: [u32; 5] = [8, 7, 6, 5, 4];

/// Largest Rice parameter.
pub const MAX_GO_RICE_PARAM: u32 = 4;

/// Truncated unary code of `symbol` with maximum `max_symbol`.
///
/// The first bin uses `ctxs[0]`, every further bin `ctxs[offset]`. The
/// terminating zero is dropped when `symbol == max_symbol`, and nothing is
/// coded when `max_symbol` is zero.
pub fn write_unary_max_symbol<E: BinEncoder>(
    bin: &mut E,
    symbol: u32,
    ctxs: &mut [ContextModel],
    offset: usize,
    max_symbol: u32,
) -> Result<()> {
    if symbol > max_symbol {
        return Err(CabacError::invalid_syntax("truncated unary symbol", symbol));
    }
    if max_symbol == 0 {
        return Ok(());
    }

    bin.encode_bin(symbol != 0, &mut ctxs[0])?;
    if symbol == 0 {
        return Ok(());
    }

    for _ in 1..symbol {
        bin.encode_bin(true, &mut ctxs[offset])?;
    }
    if max_symbol > symbol {
        bin.encode_bin(false, &mut ctxs[offset])?;
    }
    Ok(())
}

/// Unary code of `symbol`: `symbol` ones and a terminating zero.
///
/// The first bin uses `ctxs[0]`, every further bin `ctxs[offset]`.
pub fn write_unary_symbol<E: BinEncoder>(
    bin: &mut E,
    symbol: u32,
    ctxs: &mut [ContextModel],
    offset: usize,
) -> Result<()> {
    bin.encode_bin(symbol != 0, &mut ctxs[0])?;
    if symbol == 0 {
        return Ok(());
    }

    for _ in 1..symbol {
        bin.encode_bin(true, &mut ctxs[offset])?;
    }
    bin.encode_bin(false, &mut ctxs[offset])
}

/// Exp-Golomb codeword of order `k` as `(bins, num_bins)`.
///
/// Fails when the codeword would not fit in one bypass run.
pub fn exp_golomb_bins(symbol: u32, k: u32) -> Result<(u32, u32)> {
    let mut symbol = u64::from(symbol);
    let mut k = k;
    let mut bins = 0u64;
    let mut num_bins = 0u32;

    while symbol >= 1u64 << k {
        bins = 2 * bins + 1;
        num_bins += 1;
        symbol -= 1u64 << k;
        k += 1;
        if num_bins + k + 1 > MAX_BYPASS_BINS {
            return Err(CabacError::BinLimitExceeded {
                bins: num_bins + k + 1,
                max: MAX_BYPASS_BINS,
            });
        }
    }
    bins *= 2;
    num_bins += 1;

    bins = (bins << k) | symbol;
    num_bins += k;

    if num_bins > MAX_BYPASS_BINS {
        return Err(CabacError::BinLimitExceeded {
            bins: num_bins,
            max: MAX_BYPASS_BINS,
        });
    }
    Ok((bins as u32, num_bins))
}

/// Bypass-coded Exp-Golomb code of order `k`.
pub fn write_ep_exp_golomb<E: BinEncoder>(bin: &mut E, symbol: u32, k: u32) -> Result<()> {
    let (bins, num_bins) = exp_golomb_bins(symbol, k)?;
    bin.encode_bins_ep(bins, num_bins)
}

/// Golomb-Rice prefix and suffix of `symbol` as `(bins, num_bins)`, plus
/// whether the symbol escapes to an Exp-Golomb suffix.
pub fn go_rice_bins(symbol: u32, rice_param: u32) -> Result<(u32, u32, bool)> {
    if rice_param > MAX_GO_RICE_PARAM {
        return Err(CabacError::invalid_syntax("rice parameter", rice_param));
    }

    let r = rice_param as usize;
    let max_vlc = GO_RICE_RANGE[r];
    let escape = symbol > max_vlc;
    let code_word = symbol.min(max_vlc + 1);
    let quotient = code_word >> rice_param;
    let max_prefix_len = GO_RICE_PREFIX_LEN[r];

    let (prefix, prefix_len) = if quotient >= max_prefix_len {
        ((1 << max_prefix_len) - 1, max_prefix_len)
    } else {
        ((1 << (quotient + 1)) - 2, quotient + 1)
    };

    let bins = (prefix << rice_param) + code_word - (quotient << rice_param);
    Ok((bins, prefix_len + rice_param, escape))
}

/// Adaptive Golomb-Rice code of a coefficient remainder.
///
/// Symbols above [`GO_RICE_RANGE`] for the parameter escape with an order-0
/// Exp-Golomb code of the excess.
pub fn write_go_rice_exp_golomb<E: BinEncoder>(
    bin: &mut E,
    symbol: u32,
    rice_param: u32,
) -> Result<()> {
    let (bins, num_bins, escape) = go_rice_bins(symbol, rice_param)?;
    bin.encode_bins_ep(bins, num_bins)?;

    if escape {
        let excess = symbol - (GO_RICE_RANGE[rice_param as usize] + 1);
        write_ep_exp_golomb(bin, excess, 0)?;
    }
    Ok(())
}
