//! Stratified, Fold-Aware Sampling
//!
//! `Sampler` turns the flat locator list of a container into an endless (or
//! finite) stream of locators:
//!
//! 1. **Partition** locators into groups, one per integer label when
//!    stratifying, or a single group otherwise
//! 2. **Shuffle** each group with a seeded `ChaCha8Rng`
//! 3. **Slice** each group into `split_count` folds and keep `fold_keys`
//! 4. **Round-robin** between groups, one locator per group per turn
//!
//! An exhausted group is rewound (and optionally reshuffled) when looping, or
//! retired otherwise. The stream ends once every group has been retired.
//!
//! ## Fold Boundaries
//!
//! Fold `k` of a group of length `len` cut into `K` folds covers
//! `[len*k/K, len*(k+1)/K)`. The folds of one group are disjoint and their
//! union is the whole group, so training and evaluation selections built from
//! complementary keys never share a record.
//!
//! ## Determinism
//!
//! All randomness comes from one generator seeded from `StreamConfig::seed`.
//! Two samplers built from the same locators and config produce the same
//! sequence, and `reset()` replays it from the start.

use std::collections::BTreeMap;
use std::ops::Range;

use labelpack_core::{Error, Locator, Result, MAX_CATEGORIES};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use crate::config::StreamConfig;

/// Locators sharing one stratification category
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    id: u32,
    entries: Vec<Locator>,
    cursor: usize,
}

impl Group {
    fn new(id: u32, entries: Vec<Locator>) -> Self {
        Self {
            id,
            entries,
            cursor: 0,
        }
    }

    /// Category id (the label when stratifying, 0 otherwise)
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn entries(&self) -> &[Locator] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn is_exhausted(&self) -> bool {
        self.cursor >= self.entries.len()
    }
}

/// Range of fold `key` in a sequence of `len` items cut into `splits` folds
///
/// Requires `key < splits`. `StreamConfig::normalized` guarantees it.
pub(crate) fn fold_range(len: usize, key: u32, splits: u32) -> Range<usize> {
    debug_assert!(key < splits, "fold key {key} out of range for {splits} splits");
    let len = len as u64;
    let (key, splits) = (key as u64, splits as u64);
    let start = len * key / splits;
    let end = len * (key + 1) / splits;
    start as usize..end as usize
}

/// Concatenate the folds named by `keys`, in key order
///
/// Every key must be below `splits`.
pub(crate) fn select_folds<T: Clone>(items: &[T], keys: &[u32], splits: u32) -> Vec<T> {
    keys.iter()
        .flat_map(|&key| items[fold_range(items.len(), key, splits)].iter().cloned())
        .collect()
}

/// Round-robin sampler over stratified groups
#[derive(Debug, Clone)]
pub struct Sampler {
    config: StreamConfig,
    groups: Vec<Group>,

    /// Groups as they were after construction
    initial: Vec<Group>,

    rng: ChaCha8Rng,

    /// Generator state after construction
    initial_rng: ChaCha8Rng,

    /// Round-robin cursor into `groups`
    next_group: usize,

    total: usize,
    used: usize,
}

impl Sampler {
    pub fn new(locators: Vec<Locator>, config: &StreamConfig) -> Result<Self> {
        let config = config.normalized()?;
        let total = locators.len();
        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);

        let mut groups = partition(locators, config.stratify)?;

        if config.shuffle {
            for group in &mut groups {
                group.entries.shuffle(&mut rng);
            }
        }

        if config.split_count > 1 {
            for group in &mut groups {
                group.entries = select_folds(&group.entries, &config.fold_keys, config.split_count);
                if group.entries.is_empty() {
                    warn!(
                        group = group.id,
                        split_count = config.split_count,
                        fold_keys = ?config.fold_keys,
                        "Group is empty after fold selection"
                    );
                }
            }
        }

        let used: usize = groups.iter().map(Group::len).sum();
        info!(
            used,
            total,
            groups = groups.len(),
            "Using {} out of {} items in {} groups",
            used,
            total,
            groups.len()
        );

        if used == 0 {
            return Err(Error::invalid_config(format!(
                "no usable records: {total} indexed, 0 selected by folds {:?} of {}",
                config.fold_keys, config.split_count
            )));
        }

        Ok(Self {
            config,
            initial: groups.clone(),
            groups,
            initial_rng: rng.clone(),
            rng,
            next_group: 0,
            total,
            used,
        })
    }

    /// Number of usable records after fold selection
    pub fn size(&self) -> usize {
        self.used
    }

    /// Number of records before fold selection
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of groups not yet retired
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Rewind to the state right after construction
    pub fn reset(&mut self) {
        self.groups = self.initial.clone();
        self.rng = self.initial_rng.clone();
        self.next_group = 0;
    }
}

impl Iterator for Sampler {
    type Item = Locator;

    fn next(&mut self) -> Option<Locator> {
        loop {
            if self.next_group >= self.groups.len() {
                self.next_group = 0;
            }
            if self.groups.is_empty() {
                return None;
            }

            let idx = self.next_group;
            let exhausted = {
                let group = &mut self.groups[idx];
                if group.is_exhausted() && self.config.looping {
                    group.cursor = 0;
                    if self.config.reshuffle {
                        group.entries.shuffle(&mut self.rng);
                    }
                }
                group.is_exhausted()
            };

            if exhausted {
                let retired = self.groups.remove(idx);
                debug!(
                    group = retired.id,
                    remaining = self.groups.len(),
                    "Retired exhausted group"
                );
                continue;
            }

            let group = &mut self.groups[idx];
            let locator = group.entries[group.cursor];
            group.cursor += 1;
            self.next_group += 1;
            return Some(locator);
        }
    }
}

/// Split locators into groups, ascending by id
fn partition(locators: Vec<Locator>, stratify: bool) -> Result<Vec<Group>> {
    if !stratify {
        return Ok(vec![Group::new(0, locators)]);
    }

    let mut buckets: BTreeMap<u32, Vec<Locator>> = BTreeMap::new();
    for locator in locators {
        let category = locator.category(MAX_CATEGORIES).ok_or_else(|| Error::BadLabel {
            label: locator.label,
            reason: format!(
                "stratification needs an integer label in [0, {MAX_CATEGORIES})"
            ),
        })?;
        buckets.entry(category).or_default().push(locator);
    }

    Ok(buckets
        .into_iter()
        .map(|(id, entries)| Group::new(id, entries))
        .collect())
}
