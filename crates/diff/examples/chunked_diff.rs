use anyhow::{Context, Result};
use chunk_diff::{BufferDiff, DiffConfig};
use log::info;
use std::env;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::time::{Duration, Instant};

fn main() -> Result<()> {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        println!("Usage: chunked_diff <old_file> <new_file> [output_file]");
        println!("Lists the changed line chunks between two files");
        return Ok(());
    }

    let old_file = &args[1];
    let new_file = &args[2];
    let output_file = args.get(3);

    let old_content = fs::read_to_string(old_file).with_context(|| format!("reading {}", old_file))?;
    let new_content = fs::read_to_string(new_file).with_context(|| format!("reading {}", new_file))?;
    info!(
        "old: {} bytes, new: {} bytes",
        old_content.len(),
        new_content.len()
    );

    let config = DiffConfig::default().timeout(Duration::from_secs(2));
    let start = Instant::now();
    let buffer_diff = BufferDiff::with_config(&old_content, &new_content, config);
    let snapshot = buffer_diff.snapshot();
    let elapsed = start.elapsed();

    println!("Diff completed in {:.2?}", elapsed);
    println!("Statistics:");
    println!("  Chunks: {}", snapshot.chunk_count());
    println!("  Changed lines: {} old, {} new", snapshot.changed_lines_a(), snapshot.changed_lines_b());
    if !snapshot.is_precise() {
        println!("  (diff budget ran out, some chunks are approximate)");
    }

    let mut out: Box<dyn Write> = match output_file {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path))?,
        )),
        None => Box::new(std::io::stdout()),
    };

    let (a, b) = (buffer_diff.a(), buffer_diff.b());
    for (i, chunk) in snapshot.chunks().iter().enumerate() {
        writeln!(
            out,
            "Chunk #{} [{}] old {}..{}, new {}..{}",
            i + 1,
            chunk.id(),
            chunk.from_a,
            chunk.to_a,
            chunk.from_b,
            chunk.to_b
        )?;
        for change in chunk.absolute_changes() {
            writeln!(
                out,
                "  {:?} -> {:?}",
                a.byte_slice(change.range_a()).to_string(),
                b.byte_slice(change.range_b()).to_string()
            )?;
        }
    }

    Ok(())
}
