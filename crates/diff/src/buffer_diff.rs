use std::ops::Range;
use std::sync::Arc;

use anyhow::{ensure, Result};
use log::debug;
use ropey::Rope;

use crate::change::EditRange;
use crate::chunk::Chunk;
use crate::config::DiffConfig;
use crate::document::Document;
use crate::update::Side;

/// A pair of buffers (text documents) and the changed chunks between them,
/// kept up to date as either buffer is edited
#[derive(Debug, Clone)]
pub struct BufferDiff {
    /// Document A, usually the original version
    a: Rope,

    /// Document B, usually the edited version
    b: Rope,

    /// The current chunks
    chunks: Arc<[Chunk]>,

    /// Diff budget and update margin
    config: DiffConfig,

    /// Bumped every time the chunk list is replaced
    generation: u64,
}

/// An immutable snapshot of a buffer diff
#[derive(Debug, Clone)]
pub struct BufferDiffSnapshot {
    /// The chunks in this diff
    pub chunks: Arc<[Chunk]>,

    /// The generation of the diff this snapshot was taken from
    pub generation: u64,

    /// Length of document A in bytes
    pub len_a: usize,

    /// Length of document B in bytes
    pub len_b: usize,

    /// The number of lines in document A
    pub line_count_a: usize,

    /// The number of lines in document B
    pub line_count_b: usize,

    /// Lines of document A covered by chunks
    pub changed_lines_a: usize,

    /// Lines of document B covered by chunks
    pub changed_lines_b: usize,
}

impl BufferDiff {
    /// Create a new buffer diff between two texts
    pub fn new(a: &str, b: &str) -> Self {
        Self::with_config(a, b, DiffConfig::default())
    }

    /// Create a new buffer diff with the given configuration
    pub fn with_config(a: &str, b: &str, config: DiffConfig) -> Self {
        Self::from_ropes(Rope::from_str(a), Rope::from_str(b), config)
    }

    /// Create a new buffer diff from existing ropes
    pub fn from_ropes(a: Rope, b: Rope, config: DiffConfig) -> Self {
        let chunks = Chunk::build_with_config(&a, &b, &config);
        debug!(
            "built {} chunks for {}/{} byte documents",
            chunks.len(),
            a.len_bytes(),
            b.len_bytes()
        );
        Self {
            a,
            b,
            chunks: chunks.into(),
            config,
            generation: 0,
        }
    }

    /// Replace `range` of document A with `text`
    pub fn edit_a(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let edit = replace(&mut self.a, range, text)?;
        self.update(Side::A, &[edit])
    }

    /// Replace `range` of document B with `text`
    pub fn edit_b(&mut self, range: Range<usize>, text: &str) -> Result<()> {
        let edit = replace(&mut self.b, range, text)?;
        self.update(Side::B, &[edit])
    }

    /// Replace the whole of document A
    pub fn set_a(&mut self, text: &str) -> Result<()> {
        self.edit_a(0..self.a.len_bytes(), text)
    }

    /// Replace the whole of document B
    pub fn set_b(&mut self, text: &str) -> Result<()> {
        self.edit_b(0..self.b.len_bytes(), text)
    }

    /// Change the configuration and rebuild the chunks from scratch
    pub fn set_config(&mut self, config: DiffConfig) {
        self.config = config;
        self.recompute();
    }

    /// Rebuild the chunks from scratch
    pub fn recompute(&mut self) {
        let chunks = Chunk::build_with_config(&self.a, &self.b, &self.config);
        self.replace_chunks(chunks);
    }

    fn update(&mut self, side: Side, edits: &[EditRange]) -> Result<()> {
        let chunks = match side {
            Side::A => Chunk::update_a(&self.chunks, &self.a, &self.b, edits, &self.config)?,
            Side::B => Chunk::update_b(&self.chunks, &self.a, &self.b, edits, &self.config)?,
        };
        self.replace_chunks(chunks);
        Ok(())
    }

    fn replace_chunks(&mut self, chunks: Vec<Chunk>) {
        self.chunks = chunks.into();
        self.generation += 1;
    }

    /// Get a snapshot of the current diff
    pub fn snapshot(&self) -> BufferDiffSnapshot {
        BufferDiffSnapshot {
            chunks: Arc::clone(&self.chunks),
            generation: self.generation,
            len_a: self.a.len_bytes(),
            len_b: self.b.len_bytes(),
            line_count_a: self.a.len_lines(),
            line_count_b: self.b.len_lines(),
            changed_lines_a: self
                .chunks
                .iter()
                .map(|chunk| covered_lines(&self.a, chunk.from_a, chunk.to_a))
                .sum(),
            changed_lines_b: self
                .chunks
                .iter()
                .map(|chunk| covered_lines(&self.b, chunk.from_b, chunk.to_b))
                .sum(),
        }
    }

    /// Get document A
    pub fn a(&self) -> &Rope {
        &self.a
    }

    /// Get document B
    pub fn b(&self) -> &Rope {
        &self.b
    }

    /// Get the chunks
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Get the configuration
    pub fn config(&self) -> &DiffConfig {
        &self.config
    }

    /// Get the generation of the current chunk list
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Apply a replacement to a rope, describing it as an edit range
fn replace(rope: &mut Rope, range: Range<usize>, text: &str) -> Result<EditRange> {
    ensure!(
        range.start <= range.end && range.end <= rope.len_bytes(),
        "edit range {:?} is outside of the {}-byte document",
        range,
        rope.len_bytes()
    );
    ensure!(
        Document::is_char_boundary(rope, range.start) && Document::is_char_boundary(rope, range.end),
        "edit range {:?} does not fall on character boundaries",
        range
    );
    let start = rope.byte_to_char(range.start);
    let end = rope.byte_to_char(range.end);
    rope.remove(start..end);
    rope.insert(start, text);
    Ok(EditRange::replace(range, text.len()))
}

/// Number of lines a chunk side from `from` to `to` touches
fn covered_lines(rope: &Rope, from: usize, to: usize) -> usize {
    if to <= from {
        return 0;
    }
    let last = (to - 1).min(rope.len_bytes());
    rope.byte_to_line(last) - rope.byte_to_line(from.min(last)) + 1
}

impl BufferDiffSnapshot {
    /// Create a new empty diff snapshot
    pub fn empty() -> Self {
        Self {
            chunks: Arc::from(Vec::new()),
            generation: 0,
            len_a: 0,
            len_b: 0,
            line_count_a: 1,
            line_count_b: 1,
            changed_lines_a: 0,
            changed_lines_b: 0,
        }
    }

    /// Get the chunks
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Get the number of chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Get a chunk by index
    pub fn chunk(&self, index: usize) -> Option<&Chunk> {
        self.chunks.get(index)
    }

    /// Check if the diff has any changes
    pub fn has_changes(&self) -> bool {
        !self.chunks.is_empty()
    }

    /// Check that no chunk came from a budget-limited diff
    pub fn is_precise(&self) -> bool {
        self.chunks.iter().all(Chunk::is_precise)
    }

    /// Index of the chunk covering byte `pos` of document A
    pub fn chunk_index_at_a(&self, pos: usize) -> Option<usize> {
        let idx = self.chunks.partition_point(|chunk| chunk.to_a <= pos);
        self.chunks
            .get(idx)
            .filter(|chunk| chunk.from_a <= pos)
            .map(|_| idx)
    }

    /// Index of the chunk covering byte `pos` of document B
    pub fn chunk_index_at_b(&self, pos: usize) -> Option<usize> {
        let idx = self.chunks.partition_point(|chunk| chunk.to_b <= pos);
        self.chunks
            .get(idx)
            .filter(|chunk| chunk.from_b <= pos)
            .map(|_| idx)
    }

    /// The chunk covering byte `pos` of document A
    pub fn chunk_at_a(&self, pos: usize) -> Option<&Chunk> {
        self.chunk_index_at_a(pos).map(|idx| &self.chunks[idx])
    }

    /// The chunk covering byte `pos` of document B
    pub fn chunk_at_b(&self, pos: usize) -> Option<&Chunk> {
        self.chunk_index_at_b(pos).map(|idx| &self.chunks[idx])
    }

    /// Get the number of lines of A covered by chunks
    pub fn changed_lines_a(&self) -> usize {
        self.changed_lines_a
    }

    /// Get the number of lines of B covered by chunks
    pub fn changed_lines_b(&self) -> usize {
        self.changed_lines_b
    }
}
