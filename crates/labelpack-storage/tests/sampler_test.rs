//! Sampler Property Tests
//!
//! Stratification, fold completeness, exhaustion and looping behavior of
//! `Sampler`, plus an end-to-end k-fold split over a packed container.

use std::collections::{BTreeSet, HashMap};

use labelpack_core::{Error, Locator, Record, SegmentLayout};
use labelpack_storage::{FileWriter, Sampler, SampleStream, StreamConfig};
use tempfile::TempDir;

fn locators(labels: &[f32]) -> Vec<Locator> {
    labels
        .iter()
        .enumerate()
        .map(|(i, &label)| Locator::new(label, i as u64 * 4096, 4096))
        .collect()
}

/// Index of each locator in the input, recovered from its offset
fn ids(locs: impl IntoIterator<Item = Locator>) -> Vec<u64> {
    locs.into_iter().map(|l| l.offset / 4096).collect()
}

const EXAMPLE: [f32; 10] = [0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

#[test]
fn test_example_first_fold_is_empty() {
    let config = StreamConfig::default()
        .with_shuffle(false)
        .with_splits(5, vec![0]);

    let err = Sampler::new(locators(&EXAMPLE), &config).unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)), "got {err:?}");
}

#[test]
fn test_example_last_fold_boundaries() {
    let config = StreamConfig::default()
        .with_shuffle(false)
        .with_splits(5, vec![4]);

    let sampler = Sampler::new(locators(&EXAMPLE), &config).unwrap();
    let groups: Vec<(u32, Vec<u64>)> = sampler
        .groups()
        .iter()
        .map(|g| (g.id(), ids(g.entries().iter().copied())))
        .collect();

    // group 0 takes [2,3), group 1 takes [3,4), group 2 takes [2,3)
    assert_eq!(groups, vec![(0, vec![2]), (1, vec![6]), (2, vec![9])]);
    assert_eq!(sampler.size(), 3);
    assert_eq!(sampler.total(), 10);
}

#[test]
fn test_example_all_folds_complete() {
    let config = StreamConfig::default()
        .with_shuffle(false)
        .with_splits(5, vec![0, 1, 2, 3, 4]);

    let sampler = Sampler::new(locators(&EXAMPLE), &config).unwrap();
    assert_eq!(sampler.size(), 10);
    let sizes: Vec<usize> = sampler.groups().iter().map(|g| g.len()).collect();
    assert_eq!(sizes, vec![3, 4, 3]);
}

#[test]
fn test_stratification_by_label() {
    let labels: Vec<f32> = (0..200).map(|i| ((i * 7) % 13) as f32).collect();
    let sampler = Sampler::new(locators(&labels), &StreamConfig::default()).unwrap();

    let mut seen = BTreeSet::new();
    for group in sampler.groups() {
        for loc in group.entries() {
            assert_eq!(loc.label, group.id() as f32);
            assert!(seen.insert(loc.offset), "locator in two groups");
        }
    }
    assert_eq!(seen.len(), 200);
    assert_eq!(sampler.group_count(), 13);
}

#[test]
fn test_fold_union_is_permutation() {
    let labels: Vec<f32> = (0..97).map(|i| (i % 3) as f32).collect();
    let k = 6;

    let mut union: Vec<u64> = Vec::new();
    for fold in 0..k {
        let mut config = StreamConfig::default().with_seed(11);
        config.kfold(k, fold, false).unwrap();
        // small groups may leave a fold empty
        if let Ok(sampler) = Sampler::new(locators(&labels), &config) {
            union.extend(ids(sampler));
        }
    }

    union.sort_unstable();
    assert_eq!(union, (0..97).collect::<Vec<u64>>());
}

#[test]
fn test_train_and_eval_are_disjoint() {
    let labels: Vec<f32> = (0..120).map(|i| (i % 5) as f32).collect();

    for fold in 0..4 {
        let mut train_config = StreamConfig::default().with_seed(5);
        train_config.kfold(4, fold, true).unwrap();
        let mut eval_config = StreamConfig::default().with_seed(5);
        eval_config.kfold(4, fold, false).unwrap();

        let train = Sampler::new(locators(&labels), &train_config).unwrap();
        let eval = Sampler::new(locators(&labels), &eval_config).unwrap();

        let train_ids: BTreeSet<u64> = train
            .groups()
            .iter()
            .flat_map(|g| ids(g.entries().iter().copied()))
            .collect();
        let eval_ids: BTreeSet<u64> = ids(eval).into_iter().collect();

        assert!(train_ids.is_disjoint(&eval_ids));
        assert_eq!(train_ids.len() + eval_ids.len(), 120);
    }
}

#[test]
fn test_exhaustion_without_loop() {
    let labels: Vec<f32> = (0..37).map(|i| (i % 4) as f32).collect();
    let config = StreamConfig::default().with_loop(false);
    let mut sampler = Sampler::new(locators(&labels), &config).unwrap();

    for _ in 0..sampler.size() {
        assert!(sampler.next().is_some());
    }
    assert!(sampler.next().is_none());
    assert!(sampler.next().is_none());
    assert_eq!(sampler.group_count(), 0);
}

#[test]
fn test_loop_never_ends() {
    let labels: Vec<f32> = (0..10).map(|i| (i % 3) as f32).collect();
    let mut sampler = Sampler::new(locators(&labels), &StreamConfig::default()).unwrap();

    for _ in 0..3 * sampler.size() {
        assert!(sampler.next().is_some());
    }
    assert_eq!(sampler.group_count(), 3);
}

#[test]
fn test_loop_retires_group_emptied_by_fold() {
    // label 1 has one record, so fold 0 of 5 leaves its group empty
    let labels = [0.0, 0.0, 0.0, 0.0, 0.0, 1.0];
    let config = StreamConfig::default().with_splits(5, vec![0]);
    let mut sampler = Sampler::new(locators(&labels), &config).unwrap();
    assert_eq!(sampler.size(), 1);
    assert_eq!(sampler.group_count(), 2);

    for _ in 0..3 * sampler.size() {
        let loc = sampler.next().expect("looping sampler must keep yielding");
        assert_eq!(loc.label, 0.0);
    }
    assert_eq!(sampler.group_count(), 1);
}

#[test]
fn test_loop_without_reshuffle_repeats() {
    // equal group sizes keep the round-robin period at size()
    let labels: Vec<f32> = (0..12).map(|i| (i % 3) as f32).collect();
    let config = StreamConfig::default().with_reshuffle(false);
    let mut sampler = Sampler::new(locators(&labels), &config).unwrap();
    let size = sampler.size();

    let seq: Vec<u64> = ids(sampler.by_ref().take(3 * size));
    assert_eq!(&seq[..size], &seq[size..2 * size]);
    assert_eq!(&seq[..size], &seq[2 * size..]);
}

#[test]
fn test_reshuffle_changes_order_on_rewind() {
    let labels = vec![0.0f32; 64];
    let config = StreamConfig::default().with_stratify(false);
    let mut sampler = Sampler::new(locators(&labels), &config).unwrap();

    let first: Vec<u64> = ids(sampler.by_ref().take(64));
    let second: Vec<u64> = ids(sampler.by_ref().take(64));
    assert_ne!(first, second);

    let mut a = first.clone();
    let mut b = second.clone();
    a.sort_unstable();
    b.sort_unstable();
    assert_eq!(a, b);
}

#[test]
fn test_round_robin_balances_labels() {
    // label 0 is ten times more common than label 1
    let mut labels = vec![0.0f32; 100];
    labels.extend(vec![1.0; 10]);
    let mut sampler = Sampler::new(locators(&labels), &StreamConfig::default()).unwrap();

    let mut counts: HashMap<u32, usize> = HashMap::new();
    for loc in sampler.by_ref().take(200) {
        *counts.entry(loc.label as u32).or_default() += 1;
    }
    assert_eq!(counts[&0], 100);
    assert_eq!(counts[&1], 100);
}

#[test]
fn test_kfold_stream_over_container() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("kfold.pack");
    let layout = SegmentLayout::new(16, 64).unwrap();

    let mut writer = FileWriter::create_with_layout(&path, layout).unwrap();
    for i in 0..60u32 {
        writer
            .append(&Record::new((i % 3) as f32, format!("s{i}")))
            .unwrap();
    }
    writer.close().unwrap();

    let mut seen: Vec<String> = Vec::new();
    let mut sizes = Vec::new();
    for fold in 0..3 {
        let mut config = StreamConfig::default().with_layout(layout);
        config.kfold(3, fold, false).unwrap();

        let stream = SampleStream::open(&path, &config).unwrap();
        sizes.push(stream.size());
        for sample in stream {
            let sample = sample.unwrap();
            seen.push(String::from_utf8(sample.fields[0].to_vec()).unwrap());
        }
    }

    // 20 per label cut into folds of 6, 7 and 7
    assert_eq!(sizes, vec![18, 21, 21]);
    seen.sort();
    let mut expected: Vec<String> = (0..60).map(|i| format!("s{i}")).collect();
    expected.sort();
    assert_eq!(seen, expected);
}
