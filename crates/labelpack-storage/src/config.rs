//! Stream Configuration
//!
//! This module defines configuration for the read path.
//!
//! ## StreamConfig
//!
//! Controls how records are selected and ordered when streaming a container:
//!
//! - **split_count**: Number of folds each group is cut into (default: 1, no slicing)
//! - **fold_keys**: Folds to keep (default: `[0]`)
//! - **stratify**: One group per integer label, round-robin between groups (default: true)
//! - **shuffle**: Shuffle each group once at construction (default: true)
//! - **loop**: Rewind exhausted groups instead of retiring them (default: true)
//! - **reshuffle**: Reshuffle a group on every rewind (default: true)
//! - **seed**: Seed of the sampler's random generator (default: 2016)
//! - **layout**: Segment capacity and alignment of the file (default: 1020 records, 4KB)
//!
//! ## Usage
//!
//! ```ignore
//! use labelpack_storage::StreamConfig;
//!
//! // Training split of fold 2 in 5-fold cross validation
//! let mut config = StreamConfig::default();
//! config.kfold(5, 2, true)?;
//!
//! // From a TOML file
//! let config = StreamConfig::load("stream.toml")?;
//! ```
//!
//! ```toml
//! split_count = 5
//! fold_keys = [0, 1, 3, 4]
//! loop = false
//! seed = 7
//! ```

use std::path::Path;

use labelpack_core::{Error, Result, SegmentLayout};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Number of folds each group is cut into (default: 1)
    #[serde(default = "default_split_count")]
    pub split_count: u32,

    /// Folds to keep, each below `split_count` (default: [0])
    #[serde(default = "default_fold_keys")]
    pub fold_keys: Vec<u32>,

    /// Group records by integer label (default: true)
    #[serde(default = "default_true")]
    pub stratify: bool,

    /// Shuffle groups at construction (default: true)
    #[serde(default = "default_true")]
    pub shuffle: bool,

    /// Rewind exhausted groups (default: true)
    #[serde(rename = "loop", default = "default_true")]
    pub looping: bool,

    /// Reshuffle groups on rewind (default: true)
    #[serde(default = "default_true")]
    pub reshuffle: bool,

    /// Random seed (default: 2016)
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Layout the file was written with
    #[serde(default)]
    pub layout: SegmentLayout,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            split_count: default_split_count(),
            fold_keys: default_fold_keys(),
            stratify: true,
            shuffle: true,
            looping: true,
            reshuffle: true,
            seed: default_seed(),
            layout: SegmentLayout::default(),
        }
    }
}

impl StreamConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| Error::invalid_config(format!("bad stream config: {e}")))
    }

    /// Load a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| Error::invalid_config(format!("{}: {e}", path.display())))
    }

    /// Configure a k-fold cross validation split
    ///
    /// Training keeps every fold except `fold`. Evaluation keeps only `fold`
    /// and never loops.
    pub fn kfold(&mut self, k: u32, fold: u32, training: bool) -> Result<()> {
        if k <= 1 {
            return Err(Error::invalid_config(format!(
                "k-fold needs more than one fold, got {k}"
            )));
        }
        if fold >= k {
            return Err(Error::invalid_config(format!(
                "fold {fold} out of range for {k} folds"
            )));
        }

        self.split_count = k;
        if training {
            self.fold_keys = (0..k).filter(|&key| key != fold).collect();
        } else {
            self.fold_keys = vec![fold];
            self.looping = false;
            self.reshuffle = false;
        }
        Ok(())
    }

    /// Validated copy with sorted, deduplicated fold keys
    pub fn normalized(&self) -> Result<Self> {
        if self.split_count == 0 {
            return Err(Error::invalid_config("split_count must be at least 1"));
        }
        self.layout.validate()?;

        let mut keys = self.fold_keys.clone();
        keys.sort_unstable();
        keys.dedup();

        if keys.is_empty() {
            return Err(Error::invalid_config("no fold keys selected"));
        }
        if let Some(&key) = keys.iter().find(|&&key| key >= self.split_count) {
            return Err(Error::invalid_config(format!(
                "fold key {key} out of range for split_count {}",
                self.split_count
            )));
        }

        Ok(Self {
            fold_keys: keys,
            ..self.clone()
        })
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    pub fn with_stratify(mut self, stratify: bool) -> Self {
        self.stratify = stratify;
        self
    }

    pub fn with_loop(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }

    pub fn with_reshuffle(mut self, reshuffle: bool) -> Self {
        self.reshuffle = reshuffle;
        self
    }

    /// Cut groups into `split_count` folds and keep `fold_keys`
    pub fn with_splits(mut self, split_count: u32, fold_keys: Vec<u32>) -> Self {
        self.split_count = split_count;
        self.fold_keys = fold_keys;
        self
    }

    pub fn with_layout(mut self, layout: SegmentLayout) -> Self {
        self.layout = layout;
        self
    }
}

fn default_split_count() -> u32 {
    1
}

fn default_fold_keys() -> Vec<u32> {
    vec![0]
}

fn default_true() -> bool {
    true
}

fn default_seed() -> u64 {
    2016
}
