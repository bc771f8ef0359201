//! Incremental maintenance of a chunk list.
//!
//! Instead of diffing the whole document pair after every edit, each edit
//! is widened by a margin, snapped to the surrounding chunks, and only that
//! region is diffed again. Chunks outside of it are shifted and reused.

use anyhow::{ensure, Result};
use log::{debug, trace};
use rayon::prelude::*;

use crate::change::EditRange;
use crate::chunk::{join_adjacent, to_chunks, Chunk};
use crate::config::DiffConfig;
use crate::document::{ceil_boundary, floor_boundary, Document};
use crate::presentable::presentable_diff_with_config;

/// Which document of the pair was edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    A,
    B,
}

impl Side {
    /// Order a value for the edited side and one for the other side as (A, B)
    fn order<T>(self, edited: T, other: T) -> (T, T) {
        match self {
            Side::A => (edited, other),
            Side::B => (other, edited),
        }
    }

    fn from(self, chunk: &Chunk) -> usize {
        match self {
            Side::A => chunk.from_a,
            Side::B => chunk.from_b,
        }
    }

    fn to(self, chunk: &Chunk) -> usize {
        match self {
            Side::A => chunk.to_a,
            Side::B => chunk.to_b,
        }
    }
}

/// A region to diff again, in old coordinates on both sides, with the net
/// length change of the edits inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DirtyRange {
    from_a: usize,
    to_a: usize,
    from_b: usize,
    to_b: usize,
    diff_a: isize,
    diff_b: isize,
}

/// A dirty range in the new documents' coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span {
    from_a: usize,
    to_a: usize,
    from_b: usize,
    to_b: usize,
}

impl Span {
    fn len(&self) -> usize {
        self.to_a.saturating_sub(self.from_a) + self.to_b.saturating_sub(self.from_b)
    }
}

fn shift(pos: usize, off: isize) -> isize {
    pos as isize + off
}

/// Map `pos` on `side` to a position pair. Inside a chunk this is the
/// chunk's start (or end); between chunks both documents are equal, so
/// the position is carried over by its distance from the previous chunk.
fn find_pos(chunks: &[Chunk], pos: usize, side: Side, start: bool) -> (usize, usize) {
    let idx = chunks.partition_point(|chunk| side.to(chunk) <= pos);
    if let Some(chunk) = chunks.get(idx).filter(|chunk| side.from(chunk) <= pos) {
        return if start {
            (chunk.from_a, chunk.from_b)
        } else {
            (chunk.to_a, chunk.to_b)
        };
    }
    let (ref_a, ref_b) = match idx.checked_sub(1) {
        Some(prev) => (chunks[prev].to_a, chunks[prev].to_b),
        None => (0, 0),
    };
    let off = match side {
        Side::A => pos - ref_a,
        Side::B => pos - ref_b,
    };
    (ref_a + off, ref_b + off)
}

fn find_ranges(
    chunks: &[Chunk],
    edits: &[EditRange],
    side: Side,
    old_len: usize,
    other_len: usize,
    margin: usize,
) -> Vec<DirtyRange> {
    let mut ranges: Vec<DirtyRange> = Vec::new();
    for edit in edits {
        let (mut from_a, mut from_b) = (0, 0);
        let (mut to_a, mut to_b) = side.order(old_len, other_len);
        if edit.from_old > margin {
            (from_a, from_b) = find_pos(chunks, edit.from_old - margin, side, true);
        }
        if edit.to_old + margin < old_len {
            (to_a, to_b) = find_pos(chunks, edit.to_old + margin, side, false);
        }
        let (diff_a, diff_b) = side.order(edit.len_delta(), 0);

        match ranges.last_mut() {
            Some(last) if last.to_a >= from_a || last.to_b >= from_b => {
                last.to_a = last.to_a.max(to_a);
                last.to_b = last.to_b.max(to_b);
                last.diff_a += diff_a;
                last.diff_b += diff_b;
            }
            _ => ranges.push(DirtyRange {
                from_a,
                to_a,
                from_b,
                to_b,
                diff_a,
                diff_b,
            }),
        }
    }
    ranges
}

/// Check that `edits` are ordered, disjoint and consistent with the edited
/// document. Returns the length of the document before the edits.
fn validate_edits<D: Document + ?Sized>(edits: &[EditRange], doc: &D) -> Result<usize> {
    let mut delta: isize = 0;
    let mut prev_end = 0;
    for (i, edit) in edits.iter().enumerate() {
        ensure!(
            edit.from_old <= edit.to_old && edit.from_new <= edit.to_new,
            "edit #{} ({}) has an inverted range",
            i,
            edit
        );
        ensure!(
            edit.from_old >= prev_end,
            "edit #{} ({}) overlaps or precedes the edit before it",
            i,
            edit
        );
        ensure!(
            shift(edit.from_old, delta) == edit.from_new as isize,
            "edit #{} ({}) should start at {} in the new document",
            i,
            edit,
            shift(edit.from_old, delta)
        );
        ensure!(
            edit.to_new <= doc.len(),
            "edit #{} ({}) ends past the end of the {}-byte document",
            i,
            edit,
            doc.len()
        );
        ensure!(
            doc.is_char_boundary(edit.from_new) && doc.is_char_boundary(edit.to_new),
            "edit #{} ({}) does not fall on character boundaries",
            i,
            edit
        );
        delta += edit.len_delta();
        prev_end = edit.to_old;
    }

    let old_len = doc.len() as isize - delta;
    ensure!(
        old_len >= prev_end as isize,
        "edits reach byte {} of a document that was {} bytes long",
        prev_end,
        old_len
    );
    Ok(old_len as usize)
}

/// Recompute `chunks` after `edits` were applied to the `side` document.
/// `a` and `b` are the documents after the edits.
pub(crate) fn update_chunks<A, B>(
    chunks: &[Chunk],
    a: &A,
    b: &B,
    edits: &[EditRange],
    side: Side,
    config: &DiffConfig,
) -> Result<Vec<Chunk>>
where
    A: Document + ?Sized,
    B: Document + ?Sized,
{
    let (old_len, other_len) = match side {
        Side::A => (validate_edits(edits, a)?, b.len()),
        Side::B => (validate_edits(edits, b)?, a.len()),
    };
    let ranges = find_ranges(chunks, edits, side, old_len, other_len, config.margin);
    if ranges.is_empty() {
        return Ok(chunks.to_vec());
    }

    // Where each dirty range ends up in the new documents
    let mut spans = Vec::with_capacity(ranges.len());
    let (mut off_a, mut off_b) = (0, 0);
    for range in &ranges {
        let from_a = shift(range.from_a, off_a).max(0) as usize;
        let from_b = shift(range.from_b, off_b).max(0) as usize;
        off_a += range.diff_a;
        off_b += range.diff_b;
        let to_a = shift(range.to_a, off_a).max(from_a as isize) as usize;
        let to_b = shift(range.to_b, off_b).max(from_b as isize) as usize;
        let span = Span {
            from_a: floor_boundary(a, from_a),
            to_a: ceil_boundary(a, to_a),
            from_b: floor_boundary(b, from_b),
            to_b: ceil_boundary(b, to_b),
        };
        trace!("dirty range {:?} -> {:?}", range, span);
        spans.push(span);
    }

    // The dirty ranges don't overlap, and every diff owns its buffers
    let fresh: Vec<Vec<Chunk>> = spans
        .par_iter()
        .map(|span| {
            let diff = presentable_diff_with_config(
                &a.slice_text(span.from_a, span.to_a),
                &b.slice_text(span.from_b, span.to_b),
                config,
            );
            to_chunks(diff.changes(), a, b, span.from_a, span.from_b, diff.is_precise())
        })
        .collect();

    let mut result = Vec::with_capacity(chunks.len() + edits.len());
    let mut old = chunks.iter().peekable();
    let (mut off_a, mut off_b) = (0, 0);
    for ((range, span), fresh) in ranges.iter().zip(&spans).zip(fresh) {
        // Chunks entirely before the range are shifted and kept
        while let Some(chunk) = old.next_if(|chunk| {
            shift(chunk.to_a, off_a) <= span.from_a as isize
                && shift(chunk.to_b, off_b) <= span.from_b as isize
        }) {
            result.push(chunk.offset(off_a, off_b));
        }
        result.extend(fresh);
        off_a += range.diff_a;
        off_b += range.diff_b;
        // Chunks reaching into the range were replaced. One starting right
        // at its end was not re-diffed and stays.
        while old
            .next_if(|chunk| {
                shift(chunk.from_a, off_a) < span.to_a as isize
                    || shift(chunk.from_b, off_b) < span.to_b as isize
            })
            .is_some()
        {}
    }
    result.extend(old.map(|chunk| chunk.offset(off_a, off_b)));
    let result = join_adjacent(result, a, b);

    debug!(
        "updated {} chunks for {} edit(s) to {:?}: {} dirty range(s), {} bytes re-diffed, {} chunks",
        chunks.len(),
        edits.len(),
        side,
        spans.len(),
        spans.iter().map(Span::len).sum::<usize>(),
        result.len()
    );
    Ok(result)
}
