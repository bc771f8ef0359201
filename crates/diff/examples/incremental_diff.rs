use anyhow::Result;
use chunk_diff::{BufferDiff, ChunkCache};
use log::info;
use std::time::Instant;

fn main() -> Result<()> {
    env_logger::init();

    let original: String = (1..=5000).map(|i| format!("line {}\n", i)).collect();
    let mut buffer_diff = BufferDiff::new(&original, &original);
    let mut cache: ChunkCache<String> = ChunkCache::new();

    // Type into document B in a few places, one keystroke at a time
    let start = Instant::now();
    for (line, text) in [(10, "hello"), (2500, "world"), (4990, "!")] {
        let mut pos = (1..line).map(|i| format!("line {}\n", i).len()).sum::<usize>();
        for ch in text.chars() {
            buffer_diff.edit_b(pos..pos, &ch.to_string())?;
            pos += ch.len_utf8();
        }
    }
    info!("{} incremental updates in {:.2?}", buffer_diff.generation(), start.elapsed());

    let snapshot = buffer_diff.snapshot();
    cache.sync(&snapshot);
    let b = buffer_diff.b();
    for chunk in snapshot.chunks() {
        let rendered = cache.get_or_insert_with(chunk, |chunk| {
            b.byte_slice(chunk.from_b..chunk.end_b()).to_string()
        });
        println!("{}..{}: {}", chunk.from_b, chunk.to_b, rendered);
    }

    // Compare with a full rebuild
    let rebuilt = BufferDiff::new(&original, &b.to_string());
    println!(
        "incremental: {} chunks, rebuilt: {} chunks",
        snapshot.chunk_count(),
        rebuilt.chunks().len()
    );

    Ok(())
}
