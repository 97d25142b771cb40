//! Syntax-based entropy encoder.
//!
//! [`SbacEncoder`] owns a [`ContextBank`] and a [`BinEncoder`] and turns
//! syntax element values into bins. The element coders live in
//! [`crate::syntax`] and [`crate::residual`]; this module holds the encoder
//! itself and the operations that open, close and re-initialize entropy
//! coded segments.

use tracing::debug;

use crate::bank::{ContextBank, SliceType};
use crate::config::SbacConfig;
use crate::engine::{BinEncoder, CabacWriter};
use crate::error::{CabacError, Result};
use crate::scan::ScanTables;

/// Slice parameters the entropy coder depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SliceCodingState {
    /// Slice type.
    pub slice_type: SliceType,
    /// Slice quantization parameter.
    pub qp: i32,
}

impl SliceCodingState {
    /// Create a slice state.
    pub fn new(slice_type: SliceType, qp: i32) -> Self {
        Self { slice_type, qp }
    }
}

/// Syntax-based context-adaptive binary arithmetic encoder.
#[derive(Debug, Clone)]
pub struct SbacEncoder<E = CabacWriter> {
    pub(crate) config: SbacConfig,
    pub(crate) contexts: ContextBank,
    pub(crate) bin: E,
    pub(crate) scans: ScanTables,
    pub(crate) slice: Option<SliceCodingState>,
    /// Init table chosen by the last `determine_init_index`.
    pub(crate) recorded_table: Option<SliceType>,
    /// Init table used by the last reset.
    pub(crate) active_table: Option<SliceType>,
    pub(crate) last_qp: i32,
}

impl<E: BinEncoder + Default> SbacEncoder<E> {
    /// Create an encoder with a default-constructed engine.
    pub fn with_config(config: SbacConfig) -> Result<Self> {
        Self::new(config, E::default())
    }
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Create an encoder driving `bin`.
    ///
    /// Contexts start equiprobable until the first [`reset_entropy`](Self::reset_entropy).
    pub fn new(config: SbacConfig, bin: E) -> Result<Self> {
        config.validate()?;
        let contexts = ContextBank::new()?;

        Ok(Self {
            config,
            contexts,
            bin,
            scans: ScanTables::new(),
            slice: None,
            recorded_table: None,
            active_table: None,
            last_qp: 0,
        })
    }

    /// Encoder configuration.
    pub fn config(&self) -> &SbacConfig {
        &self.config
    }

    /// Live context models.
    pub fn contexts(&self) -> &ContextBank {
        &self.contexts
    }

    /// Mutable access to the live context models.
    pub fn contexts_mut(&mut self) -> &mut ContextBank {
        &mut self.contexts
    }

    /// Bin engine.
    pub fn bin_encoder(&self) -> &E {
        &self.bin
    }

    /// Mutable access to the bin engine.
    pub fn bin_encoder_mut(&mut self) -> &mut E {
        &mut self.bin
    }

    /// Consume the encoder, returning the bin engine.
    pub fn into_bin_encoder(self) -> E {
        self.bin
    }

    /// Current slice, if one has been started.
    pub fn slice(&self) -> Option<SliceCodingState> {
        self.slice
    }

    /// Last coded QP, used as the delta QP predictor.
    pub fn last_qp(&self) -> i32 {
        self.last_qp
    }

    /// Record the QP of the last coded quantization group.
    pub fn set_last_qp(&mut self, qp: i32) {
        self.last_qp = qp;
    }

    /// Init table chosen by [`determine_init_index`](Self::determine_init_index).
    pub fn recorded_table(&self) -> Option<SliceType> {
        self.recorded_table
    }

    /// Init table the contexts were last reset from.
    pub fn active_table(&self) -> Option<SliceType> {
        self.active_table
    }

    /// Bits produced by the engine so far.
    pub fn num_written_bits(&self) -> u64 {
        self.bin.num_written_bits()
    }

    /// Reset the engine's bit count.
    pub fn reset_bits(&mut self) {
        self.bin.reset_bits();
    }

    fn current_slice(&self) -> Result<SliceCodingState> {
        self.slice
            .ok_or_else(|| CabacError::InvalidState("no slice has been started".into()))
    }

    /// Start a slice: reload every context and restart the engine.
    ///
    /// P and B slices use the recorded init table instead of their own when
    /// init table adaptation is enabled.
    pub fn reset_entropy(&mut self, slice: SliceCodingState) {
        let table = match self.recorded_table {
            Some(recorded)
                if self.config.cabac_init_present
                    && !slice.slice_type.is_intra()
                    && !recorded.is_intra() =>
            {
                recorded
            }
            _ => slice.slice_type,
        };

        self.contexts.init(table, slice.qp);
        self.slice = Some(slice);
        self.active_table = Some(table);
        self.last_qp = slice.qp;
        self.bin.start();

        debug!(
            slice_type = ?slice.slice_type,
            ?table,
            qp = slice.qp,
            "Entropy coder reset"
        );
    }

    /// Pick the init table for the next slice of the current type.
    ///
    /// Intra slices always use the intra table. P and B slices compare the
    /// cost of starting from the B and P tables given the live context
    /// states; ties keep B. The contexts are not modified.
    pub fn determine_init_index(&mut self) -> Result<SliceType> {
        let slice = self.current_slice()?;

        let chosen = if slice.slice_type.is_intra() {
            SliceType::I
        } else {
            let mut best = SliceType::B;
            let mut best_cost = u64::MAX;
            for candidate in [SliceType::B, SliceType::P] {
                let cost = self.contexts.calc_cost(candidate, slice.qp);
                if cost < best_cost {
                    best = candidate;
                    best_cost = cost;
                }
            }
            debug!(?best, cost = best_cost, "Init table selected");
            best
        };

        self.recorded_table = Some(chosen);
        Ok(chosen)
    }

    /// Whether the slice header signals the swapped P/B init table.
    pub fn cabac_init_flag(&self) -> bool {
        match (self.slice, self.recorded_table) {
            (Some(slice), Some(recorded)) => {
                self.config.cabac_init_present
                    && !slice.slice_type.is_intra()
                    && !recorded.is_intra()
                    && recorded != slice.slice_type
            }
            _ => false,
        }
    }

    /// Close the current segment and reload every context.
    ///
    /// Codes a terminating 1, optionally finishes the codeword, then
    /// re-initializes from the `slice_type` table at `qp` and restarts the
    /// engine.
    pub fn update_context_tables(
        &mut self,
        slice_type: SliceType,
        qp: i32,
        execute_finish: bool,
    ) -> Result<()> {
        self.bin.encode_bin_trm(true)?;
        if execute_finish {
            self.bin.finish()?;
        }
        self.contexts.init(slice_type, qp);
        self.active_table = Some(slice_type);
        self.bin.start();

        debug!(?slice_type, qp, execute_finish, "Context tables updated");
        Ok(())
    }

    /// Code the end-of-slice-segment bin.
    pub fn encode_terminating_bit(&mut self, last: bool) -> Result<()> {
        self.bin.encode_bin_trm(last)
    }

    /// Terminate the arithmetic codeword at the end of a slice.
    pub fn encode_slice_finish(&mut self) -> Result<()> {
        self.bin.finish()
    }

    /// Terminate, byte-align and restart the engine.
    pub fn encode_flush(&mut self) -> Result<()> {
        self.bin.flush()?;
        debug!("Entropy coder flushed");
        Ok(())
    }

    /// Restart the engine registers.
    pub fn encode_start(&mut self) {
        self.bin.start();
    }

    /// Code a tile entry marker as `bits` bypass bins, MSB first.
    pub fn write_tile_marker(&mut self, tile_idx: u32, bits: u32) -> Result<()> {
        if bits > 32 || (bits < 32 && u64::from(tile_idx) >= 1u64 << bits) {
            return Err(CabacError::invalid_syntax("tile marker", tile_idx));
        }
        for i in (0..bits).rev() {
            self.bin.encode_bin_ep((tile_idx >> i) & 1 == 1)?;
        }
        Ok(())
    }
}
