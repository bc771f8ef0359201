//! Cleanup of raw diffs for display: changes grow to word boundaries,
//! plain insertions/deletions inside words are rotated onto a boundary,
//! and changes separated by tiny unchanged gaps are merged.

use crate::change::{Change, Diff};
use crate::config::DiffConfig;
use crate::text_diff::{diff_with_config, merge_adjacent};

/// How far, in bytes, a change may grow to reach a word boundary
const MAX_WORD_SCAN: usize = 5;

/// Unchanged gaps shorter than this are absorbed into the surrounding changes
const MIN_UNCHANGED_GAP: usize = 3;

/// Compute the difference between two strings and clean it up for
/// presentation, using the default budget.
pub fn presentable_diff(a: &str, b: &str) -> Diff {
    presentable_diff_with_config(a, b, &DiffConfig::default())
}

/// Compute the difference between two strings and clean it up for
/// presentation.
pub fn presentable_diff_with_config(a: &str, b: &str, config: &DiffConfig) -> Diff {
    let Diff { changes, precise } = diff_with_config(a, b, config);
    Diff::new(make_presentable(changes, a, b), precise)
}

fn make_presentable(mut changes: Vec<Change>, a: &str, b: &str) -> Vec<Change> {
    let mut pos_a = 0;
    for i in 0..changes.len() {
        let mut change = changes[i];
        let (len_a, len_b) = (change.len_a(), change.len_b());
        // Short insertions and deletions are left alone
        if !((len_a > 0 && len_b > 0) || len_a > MIN_UNCHANGED_GAP || len_b > MIN_UNCHANGED_GAP) {
            pos_a = change.to_a;
            continue;
        }

        let next_change_a = changes.get(i + 1).map_or(a.len(), |next| next.from_a);
        let max_scan_before = change.from_a - pos_a;
        let max_scan_after = next_change_a - change.to_a;
        let mut bound_before = word_boundary_before(a, change.from_a, max_scan_before.min(MAX_WORD_SCAN));
        let mut bound_after = word_boundary_after(a, change.to_a, max_scan_after.min(MAX_WORD_SCAN));
        let mut len_before = change.from_a - bound_before;
        let mut len_after = bound_after - change.to_a;

        if len_a == 0 || len_b == 0 {
            let change_len = len_a.max(len_b);
            let text = if len_a > 0 {
                &a.as_bytes()[change.range_a()]
            } else {
                &b.as_bytes()[change.range_b()]
            };
            let bytes_a = a.as_bytes();

            if len_before > 0 && len_after > 0 {
                // Inside a word on both sides: try to rotate the change
                // onto one of the word's edges instead of growing it.
                if change_len > len_before
                    && bytes_a[bound_before..change.from_a] == text[text.len() - len_before..]
                {
                    change = Change::new(
                        bound_before,
                        bound_before + len_a,
                        change.from_b - len_before,
                        change.to_b - len_before,
                    );
                    bound_before = change.from_a;
                    bound_after = word_boundary_after(
                        a,
                        change.to_a,
                        (next_change_a - change.to_a).min(MAX_WORD_SCAN),
                    );
                } else if change_len > len_after
                    && bytes_a[change.to_a..bound_after] == text[..len_after]
                {
                    change = Change::new(
                        bound_after - len_a,
                        bound_after,
                        change.from_b + len_after,
                        change.to_b + len_after,
                    );
                    bound_after = change.to_a;
                    bound_before = word_boundary_before(
                        a,
                        change.from_a,
                        (change.from_a - pos_a).min(MAX_WORD_SCAN),
                    );
                }
                len_before = change.from_a - bound_before;
                len_after = bound_after - change.to_a;
            } else if len_before == 0 && len_after == 0 {
                // Indentation before the change repeated at its end: move
                // the change so it starts at the line's indentation.
                let indent_before = find_indent_before(a, change.from_a, max_scan_before);
                let indent_len = change.from_a - indent_before;
                if indent_len > 0
                    && indent_len <= change_len
                    && bytes_a[indent_before..change.from_a] == text[text.len() - indent_len..]
                {
                    change = Change::new(
                        indent_before,
                        indent_before + len_a,
                        change.from_b - indent_len,
                        change.to_b - indent_len,
                    );
                }
            }
        }

        if len_before > 0 || len_after > 0 {
            change = Change::new(
                change.from_a - len_before,
                change.to_a + len_after,
                change.from_b - len_before,
                change.to_b + len_after,
            );
        }
        changes[i] = change;
        pos_a = change.to_a;
    }

    merge_adjacent(changes, MIN_UNCHANGED_GAP)
}

fn is_word_char(ch: char) -> bool {
    if ch.is_ascii() {
        ch.is_ascii_alphanumeric()
    } else {
        ch.is_alphanumeric()
    }
}

/// Byte width of the word character starting at `pos`, or 0
fn word_char_after(s: &str, pos: usize) -> usize {
    s.get(pos..)
        .and_then(|rest| rest.chars().next())
        .filter(|&ch| is_word_char(ch))
        .map_or(0, char::len_utf8)
}

/// Byte width of the word character ending at `pos`, or 0
fn word_char_before(s: &str, pos: usize) -> usize {
    s.get(..pos)
        .and_then(|head| head.chars().next_back())
        .filter(|&ch| is_word_char(ch))
        .map_or(0, char::len_utf8)
}

/// The end of the word `pos` is in, if within `max` bytes; `pos` otherwise
fn word_boundary_after(s: &str, pos: usize, max: usize) -> usize {
    if pos == s.len() || word_char_before(s, pos) == 0 {
        return pos;
    }
    let end = pos + max;
    let mut cur = pos;
    loop {
        let size = word_char_after(s, cur);
        if size == 0 {
            return cur;
        }
        cur += size;
        if cur > end {
            return pos;
        }
    }
}

/// The start of the word `pos` is in, if within `max` bytes; `pos` otherwise
fn word_boundary_before(s: &str, pos: usize, max: usize) -> usize {
    if pos == 0 || word_char_after(s, pos) == 0 {
        return pos;
    }
    let end = pos.saturating_sub(max);
    let mut cur = pos;
    loop {
        let size = word_char_before(s, cur);
        if size == 0 {
            return cur;
        }
        if cur < end + size {
            return pos;
        }
        cur -= size;
    }
}

/// The start of the indentation run directly before `pos`, when that run
/// starts a line and is at most `max` bytes long. Returns `pos` otherwise.
fn find_indent_before(s: &str, pos: usize, max: usize) -> usize {
    let bytes = s.as_bytes();
    let end = pos.saturating_sub(max);
    let mut cur = pos;
    loop {
        let prev = if cur > 0 { bytes[cur - 1] } else { b'\n' };
        if prev == b'\n' {
            return cur;
        }
        if cur == end || (prev != b' ' && prev != b'\t') {
            return pos;
        }
        cur -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn word_boundaries_respect_the_scan_limit() {
        let s = "one two three";
        assert_eq!(word_boundary_before(s, 6, 5), 4);
        assert_eq!(word_boundary_after(s, 5, 5), 7);
        assert_eq!(word_boundary_after("abcdefghij", 2, 3), 2);
    }

    #[test]
    fn non_ascii_letters_are_word_characters() {
        let s = "über";
        assert_eq!(word_char_after(s, 0), 2);
        assert_eq!(word_boundary_before(s, 3, 5), 0);
    }

    #[test]
    fn indentation_must_start_a_line() {
        assert_eq!(find_indent_before("x\n   foo", 5, 5), 2);
        assert_eq!(find_indent_before("x   foo", 4, 4), 4);
    }
}
