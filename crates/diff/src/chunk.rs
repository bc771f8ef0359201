use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use derive_more::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::change::{Change, EditRange};
use crate::config::DiffConfig;
use crate::document::Document;
use crate::presentable::presentable_diff_with_config;
use crate::update::{update_chunks, Side};

/// Stable identity of a chunk's content, used to key caches of derived
/// data. Offsetting a chunk keeps its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[display(fmt = "{:016x}", _0)]
pub struct ChunkId(pub u64);

/// A range of lines with changed content in them
///
/// Either side may be empty (`to == from`), or it runs from the start of
/// the first changed line to one past the end of the last changed line.
/// `to` positions may therefore point one past the end of the document;
/// use [`Chunk::end_a`]/[`Chunk::end_b`] for positions that are certainly
/// inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// The changes in this chunk, relative to `from_a`/`from_b`
    pub changes: Arc<[Change]>,

    /// The start of the chunk in document A
    pub from_a: usize,

    /// The end of the chunk in document A
    pub to_a: usize,

    /// The start of the chunk in document B
    pub from_b: usize,

    /// The end of the chunk in document B
    pub to_b: usize,

    /// False when the diff behind this chunk ran out of budget
    pub precise: bool,

    /// Content identity
    pub id: ChunkId,
}

impl Chunk {
    /// Build the changed chunks for the given documents using the default
    /// diff budget.
    pub fn build<A, B>(a: &A, b: &B) -> Vec<Chunk>
    where
        A: Document + ?Sized,
        B: Document + ?Sized,
    {
        Self::build_with_config(a, b, &DiffConfig::default())
    }

    /// Build the changed chunks for the given documents
    pub fn build_with_config<A, B>(a: &A, b: &B, config: &DiffConfig) -> Vec<Chunk>
    where
        A: Document + ?Sized,
        B: Document + ?Sized,
    {
        let diff = presentable_diff_with_config(&a.text(), &b.text(), config);
        to_chunks(diff.changes(), a, b, 0, 0, diff.is_precise())
    }

    /// Update `chunks` for edits made to document A. `a` is the edited
    /// document; `edits` are ordered and expressed in A's old/new
    /// coordinates.
    pub fn update_a<A, B>(
        chunks: &[Chunk],
        a: &A,
        b: &B,
        edits: &[EditRange],
        config: &DiffConfig,
    ) -> anyhow::Result<Vec<Chunk>>
    where
        A: Document + ?Sized,
        B: Document + ?Sized,
    {
        update_chunks(chunks, a, b, edits, Side::A, config)
    }

    /// Update `chunks` for edits made to document B
    pub fn update_b<A, B>(
        chunks: &[Chunk],
        a: &A,
        b: &B,
        edits: &[EditRange],
        config: &DiffConfig,
    ) -> anyhow::Result<Vec<Chunk>>
    where
        A: Document + ?Sized,
        B: Document + ?Sized,
    {
        update_chunks(chunks, a, b, edits, Side::B, config)
    }

    /// Move the chunk by the given amounts, sharing its change list
    pub fn offset(&self, off_a: isize, off_b: isize) -> Chunk {
        Chunk {
            changes: Arc::clone(&self.changes),
            from_a: self.from_a.saturating_add_signed(off_a),
            to_a: self.to_a.saturating_add_signed(off_a),
            from_b: self.from_b.saturating_add_signed(off_b),
            to_b: self.to_b.saturating_add_signed(off_b),
            precise: self.precise,
            id: self.id,
        }
    }

    /// `from_a` if the chunk is empty in A, the end of its last line otherwise
    pub fn end_a(&self) -> usize {
        self.from_a.max(self.to_a.saturating_sub(1))
    }

    /// `from_b` if the chunk is empty in B, the end of its last line otherwise
    pub fn end_b(&self) -> usize {
        self.from_b.max(self.to_b.saturating_sub(1))
    }

    /// Length of the chunk in document A
    pub fn len_a(&self) -> usize {
        self.to_a - self.from_a
    }

    /// Length of the chunk in document B
    pub fn len_b(&self) -> usize {
        self.to_b - self.from_b
    }

    /// The changes in document coordinates
    pub fn absolute_changes(&self) -> impl Iterator<Item = Change> + '_ {
        let (off_a, off_b) = (self.from_a as isize, self.from_b as isize);
        self.changes.iter().map(move |change| change.offset(off_a, off_b))
    }

    /// Whether the diff behind this chunk was exact
    pub fn is_precise(&self) -> bool {
        self.precise
    }

    /// Content identity of this chunk
    pub fn id(&self) -> ChunkId {
        self.id
    }
}

/// Start of the line range for a change starting at (`from_a`, `from_b`).
/// A change that starts right at the end of a line on both sides is
/// treated as starting after that line's break.
fn from_line<A, B>(from_a: usize, from_b: usize, a: &A, b: &B) -> (usize, usize)
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let (line_a, line_b) = (a.line_at(from_a), b.line_at(from_b));
    if line_a.to == from_a && line_b.to == from_b && from_a < a.len() && from_b < b.len() {
        (from_a + 1, from_b + 1)
    } else {
        (line_a.from, line_b.from)
    }
}

/// End of the line range for a change ending at (`to_a`, `to_b`)
fn to_line<A, B>(to_a: usize, to_b: usize, a: &A, b: &B) -> (usize, usize)
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let (line_a, line_b) = (a.line_at(to_a), b.line_at(to_b));
    if line_a.from == to_a && line_b.from == to_b {
        (to_a, to_b)
    } else {
        (line_a.to + 1, line_b.to + 1)
    }
}

/// A change sitting right before a line break on both sides belongs to
/// the next line. Both sides continue with `\n` there, so move the change
/// past it: replacements drop the shared break, insertions and deletions
/// rotate by one.
fn align_start(change: Change, line_a: isize, line_b: isize) -> Change {
    if change.from_a as isize >= line_a && change.from_b as isize >= line_b {
        return change;
    }
    if change.len_a() > 0 && change.len_b() > 0 {
        Change::new(change.from_a + 1, change.to_a, change.from_b + 1, change.to_b)
    } else {
        change.offset(1, 1)
    }
}

/// Group `changes`, whose positions are relative to (`off_a`, `off_b`),
/// into line-aligned chunks.
pub(crate) fn to_chunks<A, B>(
    changes: &[Change],
    a: &A,
    b: &B,
    off_a: usize,
    off_b: usize,
    precise: bool,
) -> Vec<Chunk>
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let mut chunks = Vec::new();
    let mut i = 0;
    while i < changes.len() {
        let first = changes[i];
        let (from_a, from_b) = from_line(first.from_a + off_a, first.from_b + off_b, a, b);
        let rel_a = off_a as isize - from_a as isize;
        let rel_b = off_b as isize - from_b as isize;
        let change = align_start(first, -rel_a, -rel_b);
        let (mut to_a, mut to_b) = to_line(change.to_a + off_a, change.to_b + off_b, a, b);

        let mut members = vec![change.offset(rel_a, rel_b)];
        while let Some(next) = changes.get(i + 1) {
            let (next_a, next_b) = from_line(next.from_a + off_a, next.from_b + off_b, a, b);
            if !adjacent(to_a, to_b, next_a, next_b) {
                break;
            }
            members.push(next.offset(rel_a, rel_b));
            (to_a, to_b) = to_line(next.to_a + off_a, next.to_b + off_b, a, b);
            i += 1;
        }

        let to_a = from_a.max(to_a);
        let to_b = from_b.max(to_b);
        let id = chunk_id(&members, precise, a, b, (from_a, to_a), (from_b, to_b));
        chunks.push(Chunk {
            changes: members.into(),
            from_a,
            to_a,
            from_b,
            to_b,
            precise,
            id,
        });
        i += 1;
    }
    chunks
}

/// Whether a chunk starting at (`next_a`, `next_b`) belongs with one ending
/// at (`to_a`, `to_b`)
fn adjacent(to_a: usize, to_b: usize, next_a: usize, next_b: usize) -> bool {
    next_a <= to_a + 1 || next_b <= to_b + 1
}

/// Join neighboring chunks that are close enough to have been built as one.
/// Chunks spliced together from separate diffs can end up touching.
pub(crate) fn join_adjacent<A, B>(chunks: Vec<Chunk>, a: &A, b: &B) -> Vec<Chunk>
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let mut joined: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        match joined.last_mut() {
            Some(prev) if adjacent(prev.to_a, prev.to_b, chunk.from_a, chunk.from_b) => {
                *prev = join(prev, &chunk, a, b);
            }
            _ => joined.push(chunk),
        }
    }
    joined
}

fn join<A, B>(first: &Chunk, second: &Chunk, a: &A, b: &B) -> Chunk
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let rel_a = second.from_a as isize - first.from_a as isize;
    let rel_b = second.from_b as isize - first.from_b as isize;
    let changes: Vec<Change> = first
        .changes
        .iter()
        .copied()
        .chain(second.changes.iter().map(|change| change.offset(rel_a, rel_b)))
        .collect();
    let (from_a, from_b) = (first.from_a, first.from_b);
    let to_a = first.to_a.max(second.to_a);
    let to_b = first.to_b.max(second.to_b);
    let precise = first.precise && second.precise;
    let id = chunk_id(&changes, precise, a, b, (from_a, to_a), (from_b, to_b));
    Chunk {
        changes: changes.into(),
        from_a,
        to_a,
        from_b,
        to_b,
        precise,
        id,
    }
}

fn chunk_id<A, B>(
    changes: &[Change],
    precise: bool,
    a: &A,
    b: &B,
    (from_a, to_a): (usize, usize),
    (from_b, to_b): (usize, usize),
) -> ChunkId
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let mut hasher = DefaultHasher::new();
    changes.hash(&mut hasher);
    precise.hash(&mut hasher);
    a.slice_text(from_a, to_a).hash(&mut hasher);
    b.slice_text(from_b, to_b).hash(&mut hasher);
    ChunkId(hasher.finish())
}
