//! Entropy coder configuration.
//!
//! [`SbacConfig`] collects the sequence and picture level switches the
//! syntax element coder reads: which partition shapes exist, which tools are
//! on, and the limits of the transform tree.

use crate::error::{CabacError, Result};

/// Default distance between the first and last nonzero coefficient of a
/// group above which one sign is hidden.
pub const DEFAULT_SIGN_HIDING_THRESHOLD: u32 = 4;

/// Sign data hiding mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SignHiding {
    /// Every sign is transmitted.
    Disabled,
    /// Hide the first sign of groups whose nonzero span reaches `threshold`.
    Enabled {
        /// Minimum scan distance between the group's first and last nonzero coefficient.
        threshold: u32,
    },
}

impl Default for SignHiding {
    fn default() -> Self {
        SignHiding::Enabled {
            threshold: DEFAULT_SIGN_HIDING_THRESHOLD,
        }
    }
}

impl SignHiding {
    /// Threshold if hiding is enabled.
    pub fn threshold(&self) -> Option<u32> {
        match *self {
            SignHiding::Disabled => None,
            SignHiding::Enabled { threshold } => Some(threshold),
        }
    }
}

/// Configuration of the syntax element coder.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SbacConfig {
    /// Depth of the smallest coding unit. No split flag is coded at this depth.
    pub max_cu_depth: u32,
    /// Enable asymmetric motion partitions.
    pub amp_enabled: bool,
    /// Forbid inter NxN partitions of 8x8 coding units.
    pub disable_inter_4x4: bool,
    /// Enable the luma-based linear model chroma mode.
    pub lm_chroma_enabled: bool,
    /// Sign data hiding.
    pub sign_hiding: SignHiding,
    /// Allow P/B slices to use the other slice type's init table.
    pub cabac_init_present: bool,
    /// Maximum transform size (4, 8, 16 or 32).
    pub max_tu_size: u32,
    /// Luma QP offset for bit depths above 8 (6 per extra bit).
    pub qp_bd_offset: i32,
    /// Number of merge candidates (1-5).
    pub max_num_merge_cand: u32,
    /// Skip the list 1 motion vector difference of bi-predicted blocks.
    pub mvd_l1_zero: bool,
}

impl Default for SbacConfig {
    fn default() -> Self {
        Self {
            max_cu_depth: 3,
            amp_enabled: false,
            disable_inter_4x4: true,
            lm_chroma_enabled: false,
            sign_hiding: SignHiding::default(),
            cabac_init_present: false,
            max_tu_size: 32,
            qp_bd_offset: 0,
            max_num_merge_cand: 5,
            mvd_l1_zero: false,
        }
    }
}

impl SbacConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the depth of the smallest coding unit.
    pub fn with_max_cu_depth(mut self, depth: u32) -> Self {
        self.max_cu_depth = depth;
        self
    }

    /// Enable or disable asymmetric motion partitions.
    pub fn with_amp(mut self, enabled: bool) -> Self {
        self.amp_enabled = enabled;
        self
    }

    /// Enable or disable small inter partitions of 8x8 coding units.
    pub fn with_disable_inter_4x4(mut self, disabled: bool) -> Self {
        self.disable_inter_4x4 = disabled;
        self
    }

    /// Enable or disable the linear model chroma mode.
    pub fn with_lm_chroma(mut self, enabled: bool) -> Self {
        self.lm_chroma_enabled = enabled;
        self
    }

    /// Set the sign hiding mode.
    pub fn with_sign_hiding(mut self, sign_hiding: SignHiding) -> Self {
        self.sign_hiding = sign_hiding;
        self
    }

    /// Allow init table adaptation for P/B slices.
    pub fn with_cabac_init_present(mut self, present: bool) -> Self {
        self.cabac_init_present = present;
        self
    }

    /// Set the maximum transform size.
    pub fn with_max_tu_size(mut self, size: u32) -> Self {
        self.max_tu_size = size;
        self
    }

    /// Derive the QP offset from the luma bit depth.
    pub fn with_bit_depth(mut self, bit_depth: u8) -> Self {
        self.qp_bd_offset = 6 * (i32::from(bit_depth) - 8);
        self
    }

    /// Set the number of merge candidates.
    pub fn with_max_num_merge_cand(mut self, num: u32) -> Self {
        self.max_num_merge_cand = num;
        self
    }

    /// Enable or disable the zero list 1 MVD mode.
    pub fn with_mvd_l1_zero(mut self, enabled: bool) -> Self {
        self.mvd_l1_zero = enabled;
        self
    }

    /// Whether asymmetric partitions are coded at `depth`.
    pub fn amp_allowed(&self, depth: u32) -> bool {
        self.amp_enabled && depth < self.max_cu_depth
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_cu_depth > 4 {
            return Err(CabacError::invalid_config(format!(
                "max CU depth {} exceeds 4",
                self.max_cu_depth
            )));
        }

        if !matches!(self.max_tu_size, 4 | 8 | 16 | 32) {
            return Err(CabacError::invalid_config(format!(
                "max TU size must be 4, 8, 16 or 32, got {}",
                self.max_tu_size
            )));
        }

        if !(1..=5).contains(&self.max_num_merge_cand) {
            return Err(CabacError::invalid_config(format!(
                "merge candidate count must be 1-5, got {}",
                self.max_num_merge_cand
            )));
        }

        if self.qp_bd_offset < 0 || self.qp_bd_offset > 48 || self.qp_bd_offset % 6 != 0 {
            return Err(CabacError::invalid_config(format!(
                "QP bit depth offset {} is not a multiple of 6 in 0-48",
                self.qp_bd_offset
            )));
        }

        if let SignHiding::Enabled { threshold } = self.sign_hiding {
            if threshold == 0 || threshold > 15 {
                return Err(CabacError::invalid_config(format!(
                    "sign hiding threshold must be 1-15, got {threshold}"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = SbacConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.sign_hiding.threshold(), Some(4));
    }

    #[test]
    fn test_builder() {
        let config = SbacConfig::new()
            .with_amp(true)
            .with_lm_chroma(true)
            .with_bit_depth(10)
            .with_max_num_merge_cand(3)
            .with_sign_hiding(SignHiding::Disabled);
        assert!(config.amp_enabled);
        assert!(config.lm_chroma_enabled);
        assert_eq!(config.qp_bd_offset, 12);
        assert_eq!(config.max_num_merge_cand, 3);
        assert_eq!(config.sign_hiding.threshold(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_amp_allowed() {
        let config = SbacConfig::new().with_amp(true).with_max_cu_depth(3);
        assert!(config.amp_allowed(0));
        assert!(config.amp_allowed(2));
        assert!(!config.amp_allowed(3));
        assert!(!SbacConfig::new().amp_allowed(0));
    }

    #[test]
    fn test_invalid_configs() {
        assert!(SbacConfig::new().with_max_tu_size(64).validate().is_err());
        assert!(SbacConfig::new().with_max_num_merge_cand(0).validate().is_err());
        assert!(SbacConfig::new().with_max_num_merge_cand(6).validate().is_err());
        assert!(SbacConfig::new().with_bit_depth(7).validate().is_err());
        assert!(SbacConfig::new().with_max_cu_depth(5).validate().is_err());
        let err = SbacConfig::new()
            .with_sign_hiding(SignHiding::Enabled { threshold: 0 })
            .validate()
            .unwrap_err();
        assert!(matches!(err, CabacError::InvalidConfig(_)));
    }
}
