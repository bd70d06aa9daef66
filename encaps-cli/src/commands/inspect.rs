use super::{parse_mode, read_input};
use crate::OutputFormat;
use anyhow::{Context, Result};
use colored::*;
use encaps_core::{Diagnostic, EncapsulatedStream, FrameStrategy, OffsetTable};
use serde::Serialize;
use tracing::info;

const PREFIX_LEN: usize = 8;

/// Everything `inspect` learns about a stream
#[derive(Debug, Serialize)]
pub struct InspectReport {
    pub length: usize,
    pub offset_table: OffsetTable,
    pub fragment_count: usize,
    pub fragment_lengths: Vec<usize>,
    /// `None` when the frames could not be located
    pub strategy: Option<FrameStrategy>,
    pub frame_lengths: Vec<usize>,
    /// First bytes of each frame, hex encoded
    pub frame_prefixes: Vec<String>,
    pub framing_error: Option<String>,
    pub diagnostics: Vec<Diagnostic>,
}

/// Examine an encapsulated stream without writing anything
pub fn inspect(data: Vec<u8>, frame_count: Option<usize>, strict: bool) -> Result<InspectReport> {
    let stream = EncapsulatedStream::new(data).with_mode(parse_mode(strict));

    let offset_table = stream
        .offset_table()
        .context("Failed to read the Basic Offset Table")?;
    let mut fragments = stream.fragments()?;
    let fragment_lengths = fragments
        .by_ref()
        .map(|fragment| fragment.map(|f| f.len()))
        .collect::<Result<Vec<_>, _>>()
        .context("Failed to read fragments")?;
    let mut diagnostics = fragments.into_diagnostics().into_vec();

    let decoded = stream.decode(frame_count);
    let (strategy, frame_lengths, frame_prefixes, framing_error) = match decoded {
        Ok(decoded) => {
            // Fragment-level diagnostics were already collected above
            diagnostics.extend(
                decoded
                    .diagnostics
                    .into_vec()
                    .into_iter()
                    .filter(|d| matches!(d, Diagnostic::MissedFrameBoundary { .. })),
            );
            let lengths = decoded.frames.iter().map(|f| f.len()).collect();
            let prefixes = decoded
                .frames
                .iter()
                .map(|f| hex::encode(&f[..f.len().min(PREFIX_LEN)]))
                .collect();
            (Some(decoded.strategy), lengths, prefixes, None)
        }
        Err(e) => (None, Vec::new(), Vec::new(), Some(e.to_string())),
    };

    Ok(InspectReport {
        length: stream.len(),
        offset_table,
        fragment_count: fragment_lengths.len(),
        fragment_lengths,
        strategy,
        frame_lengths,
        frame_prefixes,
        framing_error,
        diagnostics,
    })
}

pub fn execute(
    input: &str,
    frame_count: Option<usize>,
    strict: bool,
    format: OutputFormat,
) -> Result<InspectReport> {
    info!("Inspecting: {}", input);

    let data = read_input(input)?;
    let report = inspect(data, frame_count, strict)?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize inspection report")?;
            println!("{}", json);
        }
        OutputFormat::Text => print_report(&report),
    }

    Ok(report)
}

fn print_report(report: &InspectReport) {
    println!("\n=== Encapsulated Stream ===");
    println!("Length:            {} bytes", report.length);
    if report.offset_table.has_values {
        println!("Offset table:      {} entries", report.offset_table.offsets.len());
        for (i, offset) in report.offset_table.offsets.iter().enumerate() {
            println!("  frame {:>4} @ {}", i, offset);
        }
    } else {
        println!("Offset table:      empty");
    }
    println!("Fragments:         {}", report.fragment_count);

    println!("\n=== Frames ===");
    match (&report.strategy, &report.framing_error) {
        (Some(strategy), _) => {
            println!("Strategy:          {:?}", strategy);
            println!(
                "Frames:            {}",
                report.frame_lengths.len().to_string().green()
            );
            let frames = report.frame_lengths.iter().zip(&report.frame_prefixes);
            for (i, (length, prefix)) in frames.enumerate() {
                println!("  frame {:>4}: {:>8} bytes  {}", i, length, prefix.dimmed());
            }
        }
        (None, Some(e)) => println!("{} {}", "✗".red(), e),
        (None, None) => {}
    }

    if !report.diagnostics.is_empty() {
        println!("\n=== Diagnostics ===");
        for diagnostic in &report.diagnostics {
            println!("{} {}", "!".yellow(), diagnostic);
        }
    }
}
