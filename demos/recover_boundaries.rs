//! Recovering frame boundaries without an offset table

use encaps_core::{EncapsulatedStream, EncapsulationBuilder, FrameStrategy};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Encaps Boundary Recovery Example\n");

    let frames: Vec<Vec<u8>> = (1..=4u8)
        .map(|i| {
            let mut frame = vec![i; 40];
            frame.extend_from_slice(b"\xFF\xD9");
            frame
        })
        .collect();

    // Two fragments per frame and an empty Basic Offset Table
    let encoded = EncapsulationBuilder::new()
        .frames(frames.clone())
        .fragments_per_frame(2)
        .without_offset_table()
        .build()?;
    let stream = EncapsulatedStream::new(encoded.clone());
    println!("{} fragments, no offset table", stream.fragment_count()?);

    // Without a frame count the boundaries cannot be recovered
    if let Err(e) = stream.decode(None) {
        println!("Without a frame count: {}", e);
    }

    let decoded = stream.decode(Some(frames.len()))?;
    assert_eq!(decoded.strategy, FrameStrategy::MarkerSearch);
    println!("With a frame count: {} frames via {:?}", decoded.frames.len(), decoded.strategy);

    // Drop the last frame's marker: the remaining fragments still come back
    let mut damaged = encoded.to_vec();
    let end = damaged.len();
    damaged[end - 2..].copy_from_slice(b"\x00\x00");

    let decoded = EncapsulatedStream::new(damaged).decode(Some(frames.len()))?;
    println!("\nDamaged stream: {} frames", decoded.frames.len());
    for diagnostic in &decoded.diagnostics {
        println!("  warning: {}", diagnostic);
    }

    Ok(())
}
