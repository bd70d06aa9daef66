//! Basic encapsulation example

use encaps_core::{EncapsulatedStream, EncapsulationBuilder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Encaps Basic Encapsulation Example\n");

    // Stand-in codestreams, each closed by an end-of-codestream marker
    let mut builder = EncapsulationBuilder::new().fragments_per_frame(3);
    for i in 1..=5u8 {
        let mut frame = vec![i; 60 + i as usize];
        frame.extend_from_slice(b"\xFF\xD9");
        println!("Frame {}: {} bytes", i, frame.len());
        builder = builder.frame(frame);
    }

    let encoded = builder.build()?;
    std::fs::write("example_output.encaps", &encoded)?;
    println!("\nWrote {} bytes to example_output.encaps", encoded.len());

    let stream = EncapsulatedStream::new(encoded);
    let table = stream.offset_table()?;
    println!("Basic Offset Table: {:?}", table.offsets);
    println!("Fragments: {}", stream.fragment_count()?);

    println!("Use 'encaps inspect --input example_output.encaps' to read it back");

    Ok(())
}
