use super::{parse_mode, read_input};
use anyhow::{Context, Result};
use colored::*;
use encaps_core::{DecodeOptions, FrameIterator};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Write each frame of `input` to `<output_dir>/frame_NNNN.bin`.
///
/// Returns the paths written, in frame order.
pub fn execute(
    input: &str,
    output_dir: &str,
    frame_count: Option<usize>,
    strict: bool,
    progress: bool,
) -> Result<Vec<PathBuf>> {
    info!("Extracting frames from {} to {}", input, output_dir);

    let data = read_input(input)?;
    let options = DecodeOptions {
        frame_count,
        mode: parse_mode(strict),
    };
    let mut frames = FrameIterator::new(data, options).context("Failed to locate frames")?;
    info!("Framing with {:?}", frames.strategy());

    let dir = Path::new(output_dir);
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", output_dir))?;

    let bar = if progress {
        let total = frames
            .offset_table()
            .frame_count()
            .or(frame_count)
            .unwrap_or(0) as u64;
        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::with_template("{spinner} [{bar:40}] {pos}/{len} frames")
                .context("Invalid progress template")?
                .progress_chars("=> "),
        );
        Some(bar)
    } else {
        None
    };

    let mut written = Vec::new();
    for (i, frame) in frames.by_ref().enumerate() {
        let frame = frame.with_context(|| format!("Failed to read frame {}", i))?;
        let path = dir.join(format!("frame_{:04}.bin", i));
        fs::write(&path, frame.defragment())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        info!(
            "Frame {}: {} bytes in {} fragments",
            i,
            frame.len(),
            frame.fragment_count()
        );
        if let Some(bar) = &bar {
            bar.inc(1);
        }
        written.push(path);
    }

    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let diagnostics = frames.into_diagnostics();
    for diagnostic in &diagnostics {
        warn!("{}", diagnostic);
    }

    if diagnostics.is_empty() {
        println!("{} Extracted {} frames", "✓".green(), written.len());
    } else {
        println!(
            "{} Extracted {} frames with {} warnings",
            "!".yellow(),
            written.len(),
            diagnostics.len()
        );
    }

    Ok(written)
}
