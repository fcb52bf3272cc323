use serde::{Deserialize, Serialize};

use super::error::{RecordInputError, Result};
use super::subset::SubsetSizes;

/// Share of an epoch kept in the train shuffle buffer.
pub const DEFAULT_SHUFFLE_FRACTION: f64 = 0.4;
/// Extra batches worth of records added on top of the shuffle fraction.
pub const DEFAULT_SHUFFLE_BATCH_HEADROOM: usize = 3;

/// What to do with a label outside `[0, num_classes)`.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelPolicy {
    /// Encode as an all-zero vector.
    #[default]
    ZeroVector,
    /// Fail the record with `LabelOutOfRange`.
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordInputConfig {
    pub prefetch_count: usize,
    pub shuffle_seed: Option<u64>,
    pub shuffle_fraction: f64,
    pub shuffle_batch_headroom: usize,
    pub subset_sizes: SubsetSizes,
    pub label_policy: LabelPolicy,
    // Runs `preprocess` on every decoded train image when distortion is enabled
    pub distort_in_pipeline: bool,
    pub check_integrity: bool,
    pub drop_last: bool,
}

impl RecordInputConfig {
    pub fn build(self) -> Result<Self> {
        check_shuffle_settings(self.shuffle_fraction, self.shuffle_batch_headroom)?;

        if self.prefetch_count == 0 {
            return Err(RecordInputError::InvalidPrefetchCount);
        }

        Ok(self)
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.shuffle_seed = Some(seed);
        self
    }
}

impl Default for RecordInputConfig {
    fn default() -> Self {
        Self {
            prefetch_count: 2,
            shuffle_seed: None,
            shuffle_fraction: DEFAULT_SHUFFLE_FRACTION,
            shuffle_batch_headroom: DEFAULT_SHUFFLE_BATCH_HEADROOM,
            subset_sizes: SubsetSizes::default(),
            label_policy: LabelPolicy::default(),
            distort_in_pipeline: false,
            check_integrity: true,
            drop_last: false,
        }
    }
}

fn check_shuffle_settings(fraction: f64, headroom: usize) -> Result<()> {
    // Buffer must hold at least one record and at most one epoch plus headroom
    if !(0.0..=1.0).contains(&fraction) || (fraction == 0.0 && headroom == 0) {
        return Err(RecordInputError::InvalidShuffleSettings { fraction, headroom });
    }
    Ok(())
}
