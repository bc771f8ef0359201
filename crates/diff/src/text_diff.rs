//! Character-level diffing of two strings.
//!
//! The search strips common prefixes and suffixes, looks for one range
//! inside the other, tries to split the problem around a long shared
//! substring, and only then falls back to a bidirectional Myers search
//! ("An O(ND) Difference Algorithm and Its Variations", 1986). All
//! positions are byte offsets, and no produced boundary ever falls
//! inside a UTF-8 sequence.

use std::time::Instant;

use log::debug;

use crate::change::{Change, Diff};
use crate::config::DiffConfig;

/// Compute the difference between two strings using the default budget
pub fn diff(a: &str, b: &str) -> Diff {
    diff_with_config(a, b, &DiffConfig::default())
}

/// Compute the difference between two strings
pub fn diff_with_config(a: &str, b: &str, config: &DiffConfig) -> Diff {
    let mut differ = Differ::new(a, b, config);
    let changes = differ.find_diff(0, a.len(), 0, b.len());
    Diff::new(normalize(a, b, changes), differ.precise)
}

/// Per-call diff state. Owns the search frontiers so concurrent diffs
/// never share scratch space.
struct Differ<'a> {
    a: &'a str,
    b: &'a str,
    forward: Frontier,
    backward: Frontier,
    scan_limit: usize,
    deadline: Option<Instant>,
    precise: bool,
}

impl<'a> Differ<'a> {
    fn new(a: &'a str, b: &'a str, config: &DiffConfig) -> Self {
        Self {
            a,
            b,
            forward: Frontier::default(),
            backward: Frontier::default(),
            scan_limit: config.scan_limit.unwrap_or(usize::MAX),
            deadline: config.timeout.map(|timeout| Instant::now() + timeout),
            precise: true,
        }
    }

    fn find_diff(&mut self, from_a: usize, to_a: usize, from_b: usize, to_b: usize) -> Vec<Change> {
        let (a, b) = (self.a, self.b);

        let prefix = common_prefix(a, from_a, to_a, b, from_b, to_b);
        let suffix = common_suffix(a, from_a + prefix, to_a, b, from_b + prefix, to_b);
        let (from_a, to_a) = (from_a + prefix, to_a - suffix);
        let (from_b, to_b) = (from_b + prefix, to_b - suffix);
        let (len_a, len_b) = (to_a - from_a, to_b - from_b);

        if len_a == 0 && len_b == 0 {
            return Vec::new();
        }
        if len_a == 0 || len_b == 0 {
            return vec![Change::new(from_a, to_a, from_b, to_b)];
        }

        // One range inside the other: two plain insertions or deletions
        if len_a > len_b {
            if let Some(found) = a[from_a..to_a].find(&b[from_b..to_b]) {
                return vec![
                    Change::new(from_a, from_a + found, from_b, from_b),
                    Change::new(from_a + found + len_b, to_a, to_b, to_b),
                ];
            }
        } else if len_b > len_a {
            if let Some(found) = b[from_b..to_b].find(&a[from_a..to_a]) {
                return vec![
                    Change::new(from_a, from_a, from_b, from_b + found),
                    Change::new(to_a, to_a, from_b + found + len_a, to_b),
                ];
            }
        }

        // A single character that doesn't occur on the other side
        if is_single_char(&a[from_a..to_a]) || is_single_char(&b[from_b..to_b]) {
            return vec![Change::new(from_a, to_a, from_b, to_b)];
        }

        if let Some((shared_a, shared_b, shared_len)) = half_match(a, from_a, to_a, b, from_b, to_b) {
            let mut changes = self.find_diff(from_a, shared_a, from_b, shared_b);
            changes.extend(self.find_diff(shared_a + shared_len, to_a, shared_b + shared_len, to_b));
            return changes;
        }

        self.find_snake(from_a, to_a, from_b, to_b)
    }

    fn find_snake(&mut self, from_a: usize, to_a: usize, from_b: usize, to_b: usize) -> Vec<Change> {
        let (a, b) = (self.a.as_bytes(), self.b.as_bytes());
        let (len_a, len_b) = (to_a - from_a, to_b - from_b);
        let off = (len_a + len_b + 1) / 2;
        self.forward.reset(off);
        self.backward.reset(off);

        let match_forward = |x: usize, y: usize| a[from_a + x] == b[from_b + y];
        let match_backward = |x: usize, y: usize| a[to_a - x - 1] == b[to_b - y - 1];
        // Which direction checks for overlap depends on the parity of the
        // total length, so the meeting point is found on the right depth.
        let odd = (len_a + len_b) % 2 != 0;

        for depth in 0..off {
            if depth > self.scan_limit || (depth % 64 == 0 && self.timed_out()) {
                debug!(
                    "diff budget exhausted at depth {}, covering {}/{} bytes with one change",
                    depth, len_a, len_b
                );
                self.precise = false;
                return vec![Change::new(from_a, to_a, from_b, to_b)];
            }

            let other = if odd { Some(&self.backward) } else { None };
            let mut done = self
                .forward
                .advance(depth, len_a, len_b, off, other, false, match_forward);
            if done.is_none() {
                let other = if odd { None } else { Some(&self.forward) };
                done = self
                    .backward
                    .advance(depth, len_a, len_b, off, other, true, match_backward);
            }

            if let Some((x, y)) = done {
                return self.bisect(from_a, to_a, from_a + x, from_b, to_b, from_b + y);
            }
        }

        // No commonality at all
        vec![Change::new(from_a, to_a, from_b, to_b)]
    }

    /// Diff the pieces before and after a split point found by the search.
    fn bisect(
        &mut self,
        from_a: usize,
        to_a: usize,
        split_a: usize,
        from_b: usize,
        to_b: usize,
        split_b: usize,
    ) -> Vec<Change> {
        // A split inside a character moves forward; if that runs into the
        // end of the range, there is nothing left to split.
        let mut stop = false;
        let mut split_a = split_a;
        if !self.a.is_char_boundary(split_a) {
            split_a = ceil_char_boundary(self.a, split_a);
            stop |= split_a >= to_a;
        }
        let mut split_b = split_b;
        if !self.b.is_char_boundary(split_b) {
            split_b = ceil_char_boundary(self.b, split_b);
            stop |= split_b >= to_b;
        }
        if stop {
            return vec![Change::new(from_a, to_a, from_b, to_b)];
        }

        let mut changes = self.find_diff(from_a, split_a, from_b, split_b);
        changes.extend(self.find_diff(split_a, to_a, split_b, to_b));
        changes
    }

    fn timed_out(&self) -> bool {
        self.deadline.is_some_and(|deadline| Instant::now() > deadline)
    }
}

/// One direction of the bidirectional search. `vec[off + k]` holds the
/// furthest x reached on diagonal k, or -1.
#[derive(Debug, Default)]
struct Frontier {
    vec: Vec<isize>,
    len: usize,
    start: isize,
    end: isize,
}

impl Frontier {
    fn reset(&mut self, off: usize) {
        self.len = off << 1;
        self.vec.clear();
        self.vec.resize(self.len + 2, -1);
        self.vec[off + 1] = 0;
        self.start = 0;
        self.end = 0;
    }

    #[allow(clippy::too_many_arguments)]
    fn advance(
        &mut self,
        depth: usize,
        len_x: usize,
        len_y: usize,
        v_off: usize,
        other: Option<&Frontier>,
        from_back: bool,
        matches: impl Fn(usize, usize) -> bool,
    ) -> Option<(usize, usize)> {
        let depth = depth as isize;
        let (len_x, len_y, v_off) = (len_x as isize, len_y as isize, v_off as isize);

        let mut k = -depth + self.start;
        while k <= depth - self.end {
            let off = (v_off + k) as usize;
            let mut x = if k == -depth || (k != depth && self.vec[off - 1] < self.vec[off + 1]) {
                self.vec[off + 1]
            } else {
                self.vec[off - 1] + 1
            };
            let mut y = x - k;
            while x >= 0 && y >= 0 && x < len_x && y < len_y && matches(x as usize, y as usize) {
                x += 1;
                y += 1;
            }
            self.vec[off] = x;

            if x > len_x {
                self.end += 2;
            } else if y > len_y {
                self.start += 2;
            } else if let Some(other) = other {
                let off_other = v_off + (len_x - len_y) - k;
                if off_other >= 0 && (off_other as usize) < self.len {
                    let reached = other.vec[off_other as usize];
                    if reached != -1 {
                        if !from_back {
                            if x >= len_x - reached {
                                return Some((x as usize, y as usize));
                            }
                        } else if reached >= len_x - x {
                            return Some((reached as usize, (v_off + reached - off_other) as usize));
                        }
                    }
                }
            }
            k += 2;
        }
        None
    }
}

fn is_single_char(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some() && chars.next().is_none()
}

pub(crate) fn floor_char_boundary(s: &str, pos: usize) -> usize {
    let mut pos = pos.min(s.len());
    while !s.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

pub(crate) fn ceil_char_boundary(s: &str, pos: usize) -> usize {
    let mut pos = pos.min(s.len());
    while !s.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

fn chunk_size(len_a: usize, len_b: usize) -> usize {
    let max = len_a.min(len_b);
    let mut size = 1;
    while size < max {
        size <<= 1;
    }
    size
}

/// Length of the common prefix of the two ranges, compared in doubling
/// then halving blocks. Never ends inside a character.
pub(crate) fn common_prefix(
    a: &str,
    from_a: usize,
    to_a: usize,
    b: &str,
    from_b: usize,
    to_b: usize,
) -> usize {
    let (bytes_a, bytes_b) = (a.as_bytes(), b.as_bytes());
    if from_a == to_a || from_b == to_b || bytes_a[from_a] != bytes_b[from_b] {
        return 0;
    }
    let mut chunk = chunk_size(to_a - from_a, to_b - from_b);
    let (mut pos_a, mut pos_b) = (from_a, from_b);
    loop {
        let (end_a, end_b) = (pos_a + chunk, pos_b + chunk);
        if end_a > to_a || end_b > to_b || bytes_a[pos_a..end_a] != bytes_b[pos_b..end_b] {
            if chunk == 1 {
                return floor_char_boundary(a, pos_a) - from_a;
            }
            chunk >>= 1;
        } else if end_a == to_a || end_b == to_b {
            return floor_char_boundary(a, end_a) - from_a;
        } else {
            pos_a = end_a;
            pos_b = end_b;
        }
    }
}

/// Length of the common suffix of the two ranges
pub(crate) fn common_suffix(
    a: &str,
    from_a: usize,
    to_a: usize,
    b: &str,
    from_b: usize,
    to_b: usize,
) -> usize {
    let (bytes_a, bytes_b) = (a.as_bytes(), b.as_bytes());
    if from_a == to_a || from_b == to_b || bytes_a[to_a - 1] != bytes_b[to_b - 1] {
        return 0;
    }
    let mut chunk = chunk_size(to_a - from_a, to_b - from_b);
    let (mut pos_a, mut pos_b) = (to_a, to_b);
    loop {
        let start_a = pos_a.checked_sub(chunk).filter(|&start| start >= from_a);
        let start_b = pos_b.checked_sub(chunk).filter(|&start| start >= from_b);
        match (start_a, start_b) {
            (Some(start_a), Some(start_b))
                if bytes_a[start_a..pos_a] == bytes_b[start_b..pos_b] =>
            {
                if start_a == from_a || start_b == from_b {
                    return to_a - ceil_char_boundary(a, start_a);
                }
                pos_a = start_a;
                pos_b = start_b;
            }
            _ => {
                if chunk == 1 {
                    return to_a - ceil_char_boundary(a, pos_a);
                }
                chunk >>= 1;
            }
        }
    }
}

/// Find a shared substring at least half the length of the longer range.
/// Returns `(start_a, start_b, len)`.
fn half_match(
    a: &str,
    from_a: usize,
    to_a: usize,
    b: &str,
    from_b: usize,
    to_b: usize,
) -> Option<(usize, usize, usize)> {
    let (len_a, len_b) = (to_a - from_a, to_b - from_b);
    if len_a < len_b {
        return half_match(b, from_b, to_b, a, from_a, to_a)
            .map(|(start_b, start_a, len)| (start_a, start_b, len));
    }
    // From here on, a is at least as long as b
    if len_a < 4 || len_b * 2 < len_a {
        return None;
    }

    let range_b = &b[from_b..to_b];
    // Grow a quarter-length seed of `a` into the longest match in `b`
    let scan_from = |seed_from: usize| -> Option<(usize, usize, usize)> {
        let seed_to = floor_char_boundary(a, seed_from + len_a / 4);
        let seed_from = ceil_char_boundary(a, seed_from);
        if seed_from >= seed_to {
            return None;
        }
        let seed = &a[seed_from..seed_to];
        let mut best: Option<(usize, usize, usize)> = None;
        let mut search = 0;
        while let Some(found) = range_b
            .get(search..)
            .and_then(|rest| rest.find(seed))
            .map(|found| search + found)
        {
            let prefix_after = common_prefix(a, seed_to, to_a, b, from_b + found + seed.len(), to_b);
            let suffix_before = common_suffix(a, from_a, seed_from, b, from_b, from_b + found);
            let length = seed.len() + prefix_after + suffix_before;
            if best.map_or(true, |(_, _, best_len)| best_len < length) {
                best = Some((seed_from - suffix_before, from_b + found - suffix_before, length));
            }
            search = ceil_char_boundary(range_b, found + 1);
        }
        best.filter(|&(_, _, len)| len * 2 > len_a)
    };

    // Try seeds around the second and third quarters
    let match1 = scan_from(from_a + (len_a + 3) / 4);
    let match2 = scan_from(from_a + (len_a + 1) / 2);
    match (match1, match2) {
        (Some(m1), Some(m2)) if m2.2 < m1.2 => Some(m1),
        (Some(m1), None) => Some(m1),
        (_, m2) => m2,
    }
}

/// Merge changes whose gap on both sides is smaller than `min_gap`.
pub(crate) fn merge_adjacent(changes: Vec<Change>, min_gap: usize) -> Vec<Change> {
    let mut merged: Vec<Change> = Vec::with_capacity(changes.len());
    for cur in changes {
        match merged.last_mut() {
            Some(prev) if prev.to_a + min_gap > cur.from_a && prev.to_b + min_gap > cur.from_b => {
                prev.to_a = cur.to_a;
                prev.to_b = cur.to_b;
            }
            _ => merged.push(cur),
        }
    }
    merged
}

/// Strip leftover common affixes, merge touching changes, and slide
/// plain insertions/deletions across equal neighboring text until
/// nothing moves.
fn normalize(a: &str, b: &str, mut changes: Vec<Change>) -> Vec<Change> {
    let (bytes_a, bytes_b) = (a.as_bytes(), b.as_bytes());
    loop {
        changes = merge_adjacent(changes, 1);
        let mut moved = false;
        for i in 0..changes.len() {
            let mut ch = changes[i];
            // The half-match heuristic can leave matching affixes behind
            let pre = common_prefix(a, ch.from_a, ch.to_a, b, ch.from_b, ch.to_b);
            if pre > 0 {
                ch = Change::new(ch.from_a + pre, ch.to_a, ch.from_b + pre, ch.to_b);
            }
            let post = common_suffix(a, ch.from_a, ch.to_a, b, ch.from_b, ch.to_b);
            if post > 0 {
                ch = Change::new(ch.from_a, ch.to_a - post, ch.from_b, ch.to_b - post);
            }
            changes[i] = ch;

            if ch.len_a() > 0 && ch.len_b() > 0 {
                continue;
            }
            let prev_end = if i > 0 { changes[i - 1].to_a } else { 0 };
            let next_start = changes.get(i + 1).map_or(a.len(), |next| next.from_a);
            let before_len = ch.from_a - prev_end;
            let after_len = next_start - ch.to_a;
            if before_len == 0 || after_len == 0 {
                continue;
            }

            let text = if ch.len_a() > 0 {
                &bytes_a[ch.range_a()]
            } else {
                &bytes_b[ch.range_b()]
            };
            if before_len <= text.len()
                && bytes_a[ch.from_a - before_len..ch.from_a] == text[text.len() - before_len..]
            {
                // Text before matches the end of the change
                let shift = -(before_len as isize);
                changes[i] = ch.offset(shift, shift);
                moved = true;
            } else if after_len <= text.len()
                && bytes_a[ch.to_a..ch.to_a + after_len] == text[..after_len]
            {
                // Text after matches the start of the change
                let shift = after_len as isize;
                changes[i] = ch.offset(shift, shift);
                moved = true;
            }
        }
        if !moved {
            break;
        }
    }
    changes.retain(|change| !change.is_empty());
    changes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_never_splits_a_character() {
        // U+1F436 and U+1F42F share their first three bytes
        let (a, b) = ("x🐶", "x🐯");
        assert_eq!(common_prefix(a, 0, a.len(), b, 0, b.len()), 1);
        assert_eq!(common_suffix(a, 0, a.len(), b, 0, b.len()), 0);
    }

    #[test]
    fn block_comparison_finds_long_prefixes() {
        let a = format!("{}x", "ab".repeat(300));
        let b = format!("{}y", "ab".repeat(300));
        assert_eq!(common_prefix(&a, 0, a.len(), &b, 0, b.len()), 600);
        assert_eq!(common_suffix(&a, 0, 600, &b, 0, 600), 600);
    }

    #[test]
    fn half_match_finds_shared_middle() {
        let a = "1234567890abcdefghij";
        let b = "xyz567890abcdefghijq";
        let (start_a, start_b, len) = half_match(a, 0, a.len(), b, 0, b.len()).unwrap();
        assert_eq!(&a[start_a..start_a + len], &b[start_b..start_b + len]);
        assert!(len * 2 > a.len());
    }

    #[test]
    fn merge_adjacent_joins_close_changes() {
        let changes = vec![Change::new(0, 1, 0, 1), Change::new(3, 4, 3, 5)];
        assert_eq!(merge_adjacent(changes.clone(), 1).len(), 2);
        assert_eq!(merge_adjacent(changes, 3), vec![Change::new(0, 4, 0, 5)]);
    }
}
