use super::{parse_mode, read_input};
use anyhow::{Context, Result};
use encaps_core::EncapsulatedStream;
use std::fs;
use tracing::info;

/// Join every fragment of `input` into one buffer, ignoring frame boundaries
pub fn execute(input: &str, output: &str, strict: bool) -> Result<usize> {
    info!("Defragmenting {} into {}", input, output);

    let data = read_input(input)?;
    let joined = EncapsulatedStream::new(data)
        .with_mode(parse_mode(strict))
        .defragment()
        .context("Failed to read fragments")?;

    fs::write(output, &joined)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!("Wrote {} bytes", joined.len());
    Ok(joined.len())
}
