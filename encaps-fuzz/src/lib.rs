//! Fuzz entry points for encaps-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_frames

use encaps_core::{
    decoder::decode_data_sequence, DecodeOptions, EncapsulatedStream, FrameIterator, ParseMode,
};

/// Parse the offset table and decode every frame in both modes
pub fn fuzz_decode(data: &[u8]) {
    for mode in [ParseMode::Permissive, ParseMode::Strict] {
        let stream = EncapsulatedStream::new(data.to_vec()).with_mode(mode);
        let _ = stream.offset_table();
        let _ = stream.decode(None);
    }
}

/// Walk every fragment
pub fn fuzz_fragments(data: &[u8]) {
    let _ = decode_data_sequence(data.to_vec());

    if let Ok(fragments) = EncapsulatedStream::new(data.to_vec()).fragments() {
        for fragment in fragments {
            if fragment.is_err() {
                break;
            }
        }
    }
}

/// Split into frames, taking the frame count from the first input byte
pub fn fuzz_frames(data: &[u8]) {
    let Some((&count, rest)) = data.split_first() else {
        return;
    };
    let options = DecodeOptions::new().frame_count(count as usize);

    if let Ok(frames) = FrameIterator::new(rest.to_vec(), options) {
        for frame in frames {
            if frame.is_err() {
                break;
            }
        }
    }
}
