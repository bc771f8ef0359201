use std::collections::{HashMap, HashSet};

use log::trace;

use crate::buffer_diff::BufferDiffSnapshot;
use crate::chunk::{Chunk, ChunkId};

/// Per-chunk derived data (highlighting, layout, ...), keyed by chunk
/// content. Chunks that survive an incremental update keep their id, so
/// their entries stay valid after the chunk list is replaced.
#[derive(Debug, Clone)]
pub struct ChunkCache<V> {
    entries: HashMap<ChunkId, V>,

    /// Generation of the last snapshot this cache was synced with
    generation: Option<u64>,
}

impl<V> Default for ChunkCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            generation: None,
        }
    }
}

impl<V> ChunkCache<V> {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached value for a chunk
    pub fn get(&self, chunk: &Chunk) -> Option<&V> {
        self.entries.get(&chunk.id)
    }

    /// Get the cached value for a chunk, computing it if it's missing
    pub fn get_or_insert_with(&mut self, chunk: &Chunk, f: impl FnOnce(&Chunk) -> V) -> &V {
        self.entries.entry(chunk.id).or_insert_with(|| f(chunk))
    }

    /// Drop every entry whose chunk isn't in `chunks`
    pub fn retain_chunks(&mut self, chunks: &[Chunk]) {
        let live: HashSet<ChunkId> = chunks.iter().map(Chunk::id).collect();
        let before = self.entries.len();
        self.entries.retain(|id, _| live.contains(id));
        trace!("chunk cache evicted {} entries", before - self.entries.len());
    }

    /// Evict entries for chunks that are gone from `snapshot`. Does nothing
    /// if the cache was already synced with this generation.
    pub fn sync(&mut self, snapshot: &BufferDiffSnapshot) {
        if self.generation == Some(snapshot.generation) {
            return;
        }
        self.retain_chunks(snapshot.chunks());
        self.generation = Some(snapshot.generation);
    }

    /// Get the number of cached entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries
    pub fn clear(&mut self) {
        self.entries.clear();
        self.generation = None;
    }
}
