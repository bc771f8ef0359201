use std::time::{Duration, Instant};

use chunk_diff::{diff, diff_with_config, Change, DiffConfig};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Describe a diff as "unchanged changedA/changedB ..." lengths
fn shape(changes: &[Change]) -> String {
    let mut parts = Vec::new();
    let mut pos_a = 0;
    for change in changes {
        if change.from_a > pos_a {
            parts.push((change.from_a - pos_a).to_string());
        }
        parts.push(format!("{}/{}", change.len_a(), change.len_b()));
        pos_a = change.to_a;
    }
    parts.join(" ")
}

fn check_shape(a: &str, b: &str, expected: &str) {
    let result = diff(a, b);
    let mut shape = shape(result.changes());
    let tail = a.len() - result.changes().last().map_or(0, |change| change.to_a);
    if tail > 0 {
        shape = format!("{} {}", shape, tail).trim_start().to_string();
    }
    assert_eq!(shape, expected, "diffing {:?} against {:?}", a, b);
    assert_eq!(result.apply(a, b), b);
}

#[test]
fn test_identical_strings() {
    let result = diff("same text", "same text");
    assert!(result.is_empty());
    assert!(result.is_precise());
}

#[test]
fn test_empty_strings() {
    assert!(diff("", "").is_empty());
    assert_eq!(diff("", "abc").changes(), &[Change::new(0, 0, 0, 3)]);
    assert_eq!(diff("abc", "").changes(), &[Change::new(0, 3, 0, 0)]);
}

#[test]
fn test_single_replacement() {
    let result = diff("abcdef", "abXdef");
    assert_eq!(result.changes(), &[Change::new(2, 3, 2, 3)]);
    assert_eq!(result.apply("abcdef", "abXdef"), "abXdef");
}

#[test]
fn test_contained_range_becomes_insertions() {
    let result = diff("bc", "abcd");
    assert_eq!(
        result.changes(),
        &[Change::new(0, 0, 0, 1), Change::new(2, 2, 3, 4)]
    );
}

#[test]
fn test_does_not_split_characters() {
    check_shape("🐶", "🐯", "4/4");
    check_shape("👨🏽", "👩🏽", "4/4 4");
    check_shape("👩🏼", "👩🏽", "4 4/4");
    check_shape("🍏🍎", "🍎", "4/0 4");
    check_shape("🍎", "🍏🍎", "0/4 4");
    check_shape("x🍎", "x🍏🍎", "1 0/4 4");
    check_shape("🍎x", "🍏🍎x", "0/4 5");
}

#[test]
fn test_changes_are_ordered() {
    let a = "The quick brown fox jumps over the lazy dog";
    let b = "A quick red fox leaped over two lazy dogs!";
    let result = diff(a, b);
    for pair in result.changes().windows(2) {
        assert!(pair[0].to_a < pair[1].from_a);
        assert!(pair[0].to_b < pair[1].from_b);
    }
    assert!(result.changes().iter().all(|change| !change.is_empty()));
    assert_eq!(result.apply(a, b), b);
}

#[test]
fn test_scan_limit_bounds_work() {
    let (a, b) = ("a".repeat(10000), "b".repeat(10000));
    let start = Instant::now();
    let result = diff_with_config(&a, &b, &DiffConfig::default().scan_limit(500));
    assert!(start.elapsed() < Duration::from_millis(500));
    assert_eq!(result.changes(), &[Change::new(0, 10000, 0, 10000)]);
    assert!(!result.is_precise());
}

#[test]
fn test_timeout_bounds_work() {
    let (a, b) = ("a".repeat(10000), "b".repeat(10000));
    let config = DiffConfig::exact().timeout(Duration::from_millis(50));
    let start = Instant::now();
    let result = diff_with_config(&a, &b, &config);
    assert!(start.elapsed() < Duration::from_millis(500));
    assert!(!result.is_precise());
    assert_eq!(result.apply(&a, &b), b);
}

#[test]
fn test_limited_diff_is_still_correct() {
    let a: String = (0..400).map(|i| if i % 3 == 0 { 'x' } else { 'y' }).collect();
    let b: String = (0..400).map(|i| if i % 5 == 0 { 'x' } else { 'y' }).collect();
    let result = diff_with_config(&a, &b, &DiffConfig::default().scan_limit(2));
    assert_eq!(result.apply(&a, &b), b);
}

/// Characters kept unchanged by `changes` out of a string of `len` bytes
fn kept(len: usize, changes: &[Change]) -> usize {
    len - changes.iter().map(Change::len_a).sum::<usize>()
}

fn inserted(changes: &[Change]) -> usize {
    changes.iter().map(Change::len_b).sum()
}

/// Apply (skip, insert, drop) steps to `a`, returning the edited string and
/// the number of bytes kept and inserted.
fn mutate(a: &str, steps: &[(usize, usize, usize)]) -> (String, usize, usize) {
    let (mut changed, mut skipped, mut added) = (String::new(), 0, 0);
    let mut pos = 0;
    for &(skip, insert, drop) in steps.iter().cycle().take(a.len()) {
        if pos >= a.len() {
            break;
        }
        let end = (pos + skip).min(a.len());
        skipped += end - pos;
        changed.push_str(&a[pos..end]);
        pos = end;
        if pos >= a.len() {
            break;
        }
        added += insert;
        changed.push_str(&"X".repeat(insert));
        pos += drop;
    }
    (changed, skipped, added)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn produces_close_to_minimal_diffs(
        a in "[ abcdefghij]{5,160}",
        steps in prop::collection::vec((1usize..=10, 0usize..5, 0usize..5), 1..20),
    ) {
        let (b, skipped, added) = mutate(&a, &steps);
        let result = diff(&a, &b);
        let margin = (a.len() + 5) / 10;
        prop_assert!(
            kept(a.len(), result.changes()) + margin >= skipped
                && inserted(result.changes()) <= added + margin,
            "diff of {:?} and {:?} is far from minimal: {:?}", a, b, result.changes()
        );
        prop_assert_eq!(result.apply(&a, &b), b);
    }

    #[test]
    fn handles_random_input(a in "[AAACGTT]{100}", b in "[AAACGTT]{100}") {
        let result = diff(&a, &b);
        prop_assert_eq!(result.apply(&a, &b), b.clone());
        for change in result.changes() {
            prop_assert!(!change.is_empty());
        }
    }

    #[test]
    fn keeps_as_much_as_a_reference_differ(a in "[abc\n]{0,80}", b in "[abc\n]{0,80}") {
        let reference = similar::TextDiff::from_chars(a.as_str(), b.as_str());
        let reference_kept: usize = reference
            .ops()
            .iter()
            .filter(|op| op.tag() == similar::DiffTag::Equal)
            .map(|op| op.old_range().len())
            .sum();
        let result = diff(&a, &b);
        let margin = (a.len() + b.len()) / 8 + 2;
        prop_assert!(kept(a.len(), result.changes()) + margin >= reference_kept);
        prop_assert_eq!(result.apply(&a, &b), b.clone());
    }

    #[test]
    fn never_splits_characters(a in "[aé🍎\n]{0,30}", b in "[aé🍎\n]{0,30}") {
        let result = diff(&a, &b);
        for change in result.changes() {
            prop_assert!(a.is_char_boundary(change.from_a) && a.is_char_boundary(change.to_a));
            prop_assert!(b.is_char_boundary(change.from_b) && b.is_char_boundary(change.to_b));
        }
        prop_assert_eq!(result.apply(&a, &b), b.clone());
    }
}
