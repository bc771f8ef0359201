use chunk_diff::{presentable_diff, Change};
use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

/// Split a "[a/b]" annotated string into its A and B documents
fn parse(annotated: &str) -> (String, String) {
    let (mut a, mut b) = (String::new(), String::new());
    let mut rest = annotated;
    while let Some(open) = rest.find('[') {
        a.push_str(&rest[..open]);
        b.push_str(&rest[..open]);
        let close = open + rest[open..].find(']').expect("unclosed change");
        let (old, new) = rest[open + 1..close].split_once('/').expect("change without '/'");
        a.push_str(old);
        b.push_str(new);
        rest = &rest[close + 1..];
    }
    a.push_str(rest);
    b.push_str(rest);
    (a, b)
}

fn serialize(changes: &[Change], a: &str, b: &str) -> String {
    let mut result = String::new();
    let mut pos_a = 0;
    for change in changes {
        result.push_str(&a[pos_a..change.from_a]);
        result.push('[');
        result.push_str(&a[change.range_a()]);
        result.push('/');
        result.push_str(&b[change.range_b()]);
        result.push(']');
        pos_a = change.to_a;
    }
    result.push_str(&a[pos_a..]);
    result
}

/// Diff the two sides of `annotated` and describe the result the same way
fn present(annotated: &str) -> String {
    let (a, b) = parse(annotated);
    let result = presentable_diff(&a, &b);
    assert_eq!(result.apply(&a, &b), b);
    serialize(result.changes(), &a, &b)
}

fn check(annotated: &str) {
    assert_eq!(present(annotated), annotated);
}

#[test]
fn test_grows_changes_to_word_start() {
    assert_snapshot!(present("one [two/twi] three"), @"one [two/twi] three");
}

#[test]
fn test_grows_changes_to_word_end() {
    assert_snapshot!(present("one [iwo/two] three"), @"one [iwo/two] three");
}

#[test]
fn test_grows_changes_from_both_sides() {
    assert_snapshot!(present("[drop/drip]"), @"[drop/drip]");
}

#[test]
fn test_short_insertions_and_deletions_stay() {
    check("blo[/o]p");
    check("blo[o/]p");
}

#[test]
fn test_long_insertions_and_deletions_grow() {
    check("[oaks/oaktrees]");
    check("[oaktrees/oaks]");
}

#[test]
fn test_aligns_to_word_edges() {
    check("fromA[/ + offA]");
    check("[offA + /]fromA");
}

#[test]
fn test_removes_small_unchanged_ranges() {
    check("[one->two/a->b]");
}

#[test]
fn test_moves_indentation_after_a_change() {
    check("x\n[   foo/]\n   bar\n   baz");
}

#[test]
fn test_aligns_to_line_boundaries() {
    check(" x,\n[/ y,]\n z,\n");
    check(" x,\n[ y,/]\n z,\n");
}

#[test]
fn test_words_with_non_ascii_letters() {
    let (a, b) = ("grüße dich", "grüße mich");
    let result = presentable_diff(a, b);
    assert_eq!(serialize(result.changes(), a, b), "grüße [dich/mich]");
}

proptest! {
    #[test]
    fn presentable_diffs_still_apply(a in "[ aéb🍎.\n]{0,60}", b in "[ aéb🍎.\n]{0,60}") {
        let result = presentable_diff(&a, &b);
        prop_assert_eq!(result.apply(&a, &b), b.clone());
        for change in result.changes() {
            prop_assert!(a.is_char_boundary(change.from_a) && a.is_char_boundary(change.to_a));
            prop_assert!(b.is_char_boundary(change.from_b) && b.is_char_boundary(change.to_b));
        }
        for pair in result.changes().windows(2) {
            prop_assert!(pair[0].to_a < pair[1].from_a);
            prop_assert!(pair[0].to_b < pair[1].from_b);
        }
    }
}
