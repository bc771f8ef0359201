// Text diffing and line-chunked change tracking for pairs of documents.
// This crate provides character-level diffs, their presentable cleanup,
// and chunk lists that can be updated incrementally as documents change.

mod buffer_diff;
mod cache;
mod change;
mod chunk;
mod config;
mod document;
mod presentable;
mod text_diff;
mod update;

pub use buffer_diff::{BufferDiff, BufferDiffSnapshot};
pub use cache::ChunkCache;
pub use change::{Change, Diff, EditRange};
pub use chunk::{Chunk, ChunkId};
pub use config::{DiffConfig, DEFAULT_SCAN_LIMIT, DEFAULT_UPDATE_MARGIN};
pub use document::{Document, Line};
pub use presentable::{presentable_diff, presentable_diff_with_config};
pub use text_diff::{diff, diff_with_config};
pub use update::Side;
