use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{RecordInputError, Result};

pub const RECORD_FILE_EXTENSION: &str = "tfrecords";

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subset {
    Train,
    Validation,
    Eval,
}

impl Subset {
    pub const ALL: [Subset; 3] = [Subset::Train, Subset::Validation, Subset::Eval];

    pub fn as_str(&self) -> &'static str {
        match self {
            Subset::Train => "train",
            Subset::Validation => "validation",
            Subset::Eval => "eval",
        }
    }

    /// Name of the record file holding this subset, e.g. `train.tfrecords`.
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.as_str(), RECORD_FILE_EXTENSION)
    }

    pub fn is_train(&self) -> bool {
        matches!(self, Subset::Train)
    }
}

impl FromStr for Subset {
    type Err = RecordInputError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "train" => Ok(Subset::Train),
            "validation" => Ok(Subset::Validation),
            "eval" => Ok(Subset::Eval),
            other => Err(RecordInputError::InvalidSubset(other.to_string())),
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected number of records per epoch for each subset.
///
/// Only used to size the train shuffle buffer, so synthetic datasets can
/// inject their own counts through the config.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubsetSizes(HashMap<Subset, usize>);

impl SubsetSizes {
    pub fn empty() -> Self {
        SubsetSizes(HashMap::new())
    }

    pub fn with(mut self, subset: Subset, examples: usize) -> Self {
        self.0.insert(subset, examples);
        self
    }

    pub fn get(&self, subset: Subset) -> Option<usize> {
        self.0.get(&subset).copied()
    }

    pub fn examples_per_epoch(&self, subset: Subset) -> Result<usize> {
        self.get(subset)
            .ok_or(RecordInputError::UnknownSubsetSize(subset))
    }
}

impl Default for SubsetSizes {
    fn default() -> Self {
        SubsetSizes::empty()
            .with(Subset::Train, 45000)
            .with(Subset::Validation, 5000)
            .with(Subset::Eval, 10000)
    }
}

/// Fixed example counts of the reference dataset layout.
pub fn num_examples_per_epoch(subset: &str) -> Result<usize> {
    SubsetSizes::default().examples_per_epoch(subset.parse()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_subsets() {
        for subset in Subset::ALL {
            assert_eq!(subset.as_str().parse::<Subset>().unwrap(), subset);
        }
    }

    #[test]
    fn rejects_unknown_subset() {
        let err = "test".parse::<Subset>().unwrap_err();
        assert!(matches!(err, RecordInputError::InvalidSubset(ref s) if s == "test"));
        assert!("Train".parse::<Subset>().is_err());
    }

    #[test]
    fn default_example_counts() {
        assert_eq!(num_examples_per_epoch("train").unwrap(), 45000);
        assert_eq!(num_examples_per_epoch("validation").unwrap(), 5000);
        assert_eq!(num_examples_per_epoch("eval").unwrap(), 10000);
        assert!(num_examples_per_epoch("holdout").is_err());
    }

    #[test]
    fn injected_sizes_override_defaults() {
        let sizes = SubsetSizes::default().with(Subset::Train, 1);
        assert_eq!(sizes.examples_per_epoch(Subset::Train).unwrap(), 1);

        let sizes = SubsetSizes::empty();
        assert!(matches!(
            sizes.examples_per_epoch(Subset::Eval),
            Err(RecordInputError::UnknownSubsetSize(Subset::Eval))
        ));
    }

    #[test]
    fn sizes_deserialize_from_json_map() {
        let sizes: SubsetSizes = serde_json::from_str(r#"{"train": 8, "eval": 2}"#).unwrap();
        assert_eq!(sizes.get(Subset::Train), Some(8));
        assert_eq!(sizes.get(Subset::Eval), Some(2));
        assert_eq!(sizes.get(Subset::Validation), None);
    }

    #[test]
    fn file_names() {
        assert_eq!(Subset::Validation.file_name(), "validation.tfrecords");
    }
}
