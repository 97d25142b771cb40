//! Saving and restoring entropy coder state.
//!
//! Rate-distortion search codes the same unit several ways from one
//! starting point. Encoders can copy state between each other the way a
//! search keeps one encoder per depth, or save a [`SbacSnapshot`] and roll
//! back to it.

use crate::bank::{ContextGroupId, ContextState};
use crate::encoder::SbacEncoder;
use crate::engine::BinEncoder;
use crate::error::Result;

/// Saved contexts, engine state and QP predictor of an encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SbacSnapshot<E> {
    contexts: ContextState,
    bin: E,
    last_qp: i32,
}

impl<E> SbacSnapshot<E> {
    /// Saved context states.
    pub fn contexts(&self) -> &ContextState {
        &self.contexts
    }

    /// Saved engine.
    pub fn bin_encoder(&self) -> &E {
        &self.bin
    }

    /// Saved QP predictor.
    pub fn last_qp(&self) -> i32 {
        self.last_qp
    }
}

impl<E: BinEncoder> SbacEncoder<E> {
    /// Overwrite contexts, engine state and QP predictor from `src`.
    pub fn load(&mut self, src: &Self) {
        self.bin.copy_state(&src.bin);
        self.contexts.copy_from(&src.contexts);
        self.last_qp = src.last_qp;
    }

    /// Copy contexts, engine state and QP predictor into `dst`.
    pub fn store(&self, dst: &mut Self) {
        dst.load(self);
    }

    /// Copy the engine state and only the intra luma direction contexts.
    pub fn load_intra_dir_mode_luma(&mut self, src: &Self) {
        self.bin.copy_state(&src.bin);
        self.contexts
            .copy_group_from(ContextGroupId::IntraLumaPred, &src.contexts);
    }

    /// Copy every context but leave the engine alone.
    ///
    /// Used to start a wavefront row from the state after the second coding
    /// tree block of the row above.
    pub fn load_contexts(&mut self, src: &Self) {
        self.contexts.copy_from(&src.contexts);
    }
}

impl<E: BinEncoder + Clone> SbacEncoder<E> {
    /// Save the current state.
    pub fn snapshot(&self) -> SbacSnapshot<E> {
        SbacSnapshot {
            contexts: self.contexts.serialize(),
            bin: self.bin.clone(),
            last_qp: self.last_qp,
        }
    }

    /// Roll back to a saved state.
    pub fn restore(&mut self, snapshot: &SbacSnapshot<E>) -> Result<()> {
        self.contexts.deserialize(&snapshot.contexts)?;
        self.bin.copy_state(&snapshot.bin);
        self.last_qp = snapshot.last_qp;
        Ok(())
    }
}
