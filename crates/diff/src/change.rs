use derive_more::Display;
use std::ops::Range;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A changed range: `a[from_a..to_a]` was replaced by `b[from_b..to_b]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "{}..{} => {}..{}", from_a, to_a, from_b, to_b)]
pub struct Change {
    /// The start of the change in document A
    pub from_a: usize,

    /// The end of the change in document A. Equal to `from_a` for insertions
    pub to_a: usize,

    /// The start of the change in document B
    pub from_b: usize,

    /// The end of the change in document B. Equal to `from_b` for deletions
    pub to_b: usize,
}

impl Change {
    /// Create a new change
    pub fn new(from_a: usize, to_a: usize, from_b: usize, to_b: usize) -> Self {
        Self {
            from_a,
            to_a,
            from_b,
            to_b,
        }
    }

    /// The range covered in document A
    pub fn range_a(&self) -> Range<usize> {
        self.from_a..self.to_a
    }

    /// The range covered in document B
    pub fn range_b(&self) -> Range<usize> {
        self.from_b..self.to_b
    }

    /// Length of the replaced text in A
    pub fn len_a(&self) -> usize {
        self.to_a - self.from_a
    }

    /// Length of the replacement text in B
    pub fn len_b(&self) -> usize {
        self.to_b - self.from_b
    }

    /// Pure insertion (nothing removed from A)
    pub fn is_insertion(&self) -> bool {
        self.from_a == self.to_a && self.from_b != self.to_b
    }

    /// Pure deletion (nothing inserted from B)
    pub fn is_deletion(&self) -> bool {
        self.from_b == self.to_b && self.from_a != self.to_a
    }

    /// Check if this change covers nothing on either side
    pub fn is_empty(&self) -> bool {
        self.from_a == self.to_a && self.from_b == self.to_b
    }

    /// Shift the change by the given amounts on each side
    pub fn offset(&self, off_a: isize, off_b: isize) -> Self {
        Self {
            from_a: self.from_a.saturating_add_signed(off_a),
            to_a: self.to_a.saturating_add_signed(off_a),
            from_b: self.from_b.saturating_add_signed(off_b),
            to_b: self.to_b.saturating_add_signed(off_b),
        }
    }
}

/// The result of diffing two strings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Diff {
    /// The changes, ascending and non-overlapping on both sides
    pub changes: Vec<Change>,

    /// False when part of the diff fell back to a single covering change
    /// because the scan budget ran out
    pub precise: bool,
}

impl Diff {
    pub(crate) fn new(changes: Vec<Change>, precise: bool) -> Self {
        Self { changes, precise }
    }

    /// Get the changes
    pub fn changes(&self) -> &[Change] {
        &self.changes
    }

    /// Consume the diff, returning its changes
    pub fn into_changes(self) -> Vec<Change> {
        self.changes
    }

    /// Whether the diff is exact or a budget-limited approximation
    pub fn is_precise(&self) -> bool {
        self.precise
    }

    /// Check if the diff has any changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Get the number of changes
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Rebuild document B by applying the changes to `a`, taking the
    /// inserted text from `b`.
    pub fn apply(&self, a: &str, b: &str) -> String {
        let mut result = String::with_capacity(b.len());
        let mut pos = 0;
        for change in &self.changes {
            result.push_str(&a[pos..change.from_a]);
            result.push_str(&b[change.range_b()]);
            pos = change.to_a;
        }
        result.push_str(&a[pos..]);
        result
    }
}

/// One edit to a document, in that document's own before/after coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "{}..{} -> {}..{}", from_old, to_old, from_new, to_new)]
pub struct EditRange {
    /// Start of the replaced range in the old document
    pub from_old: usize,

    /// End of the replaced range in the old document
    pub to_old: usize,

    /// Start of the inserted range in the new document
    pub from_new: usize,

    /// End of the inserted range in the new document
    pub to_new: usize,
}

impl EditRange {
    /// Create a new edit range
    pub fn new(from_old: usize, to_old: usize, from_new: usize, to_new: usize) -> Self {
        Self {
            from_old,
            to_old,
            from_new,
            to_new,
        }
    }

    /// Describe replacing `range` with `inserted_len` bytes, as the only
    /// (or first) edit of a transaction.
    pub fn replace(range: Range<usize>, inserted_len: usize) -> Self {
        Self::new(range.start, range.end, range.start, range.start + inserted_len)
    }

    /// Net change in document length introduced by this edit
    pub fn len_delta(&self) -> isize {
        (self.to_new - self.from_new) as isize - (self.to_old - self.from_old) as isize
    }
}
