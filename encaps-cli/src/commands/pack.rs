use anyhow::{bail, Context, Result};
use bytes::Bytes;
use encaps_core::EncapsulationBuilder;
use std::fs;
use tracing::info;

/// How `pack` lays out its output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackOptions {
    /// Fragments each frame is split into
    pub fragments_per_frame: usize,
    /// Write offsets into the Basic Offset Table
    pub offset_table: bool,
    /// Also write Extended Offset Table files next to the output
    pub extended: bool,
}

impl Default for PackOptions {
    fn default() -> Self {
        Self {
            fragments_per_frame: 1,
            offset_table: true,
            extended: false,
        }
    }
}

/// Encapsulate one frame per input file into `output`.
///
/// With `extended`, the Basic Offset Table is left empty and the Extended
/// Offset Table and its lengths are written to `<output>.eot` and
/// `<output>.eotl`.
pub fn execute(inputs: &[String], output: &str, options: PackOptions) -> Result<usize> {
    if inputs.is_empty() {
        bail!("No input frames given");
    }
    info!("Packing {} frames into {}", inputs.len(), output);

    let mut builder = EncapsulationBuilder::new().fragments_per_frame(options.fragments_per_frame);
    for input in inputs {
        let frame =
            fs::read(input).with_context(|| format!("Failed to read frame file: {}", input))?;
        info!("Frame {}: {} bytes", input, frame.len());
        builder = builder.frame(Bytes::from(frame));
    }

    let encoded = if options.extended {
        let encapsulated = builder
            .build_extended()
            .context("Failed to encapsulate frames")?;

        let eot_path = format!("{}.eot", output);
        let eotl_path = format!("{}.eotl", output);
        fs::write(&eot_path, encapsulated.table.offsets_bytes())
            .with_context(|| format!("Failed to write {}", eot_path))?;
        fs::write(&eotl_path, encapsulated.table.lengths_bytes())
            .with_context(|| format!("Failed to write {}", eotl_path))?;
        info!("Extended Offset Table written to {} and {}", eot_path, eotl_path);

        encapsulated.data
    } else {
        let builder = if options.offset_table {
            builder
        } else {
            builder.without_offset_table()
        };
        builder.build().context("Failed to encapsulate frames")?
    };

    fs::write(output, &encoded)
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!(
        "Successfully packed {} frames ({} bytes total)",
        inputs.len(),
        encoded.len()
    );

    Ok(encoded.len())
}
