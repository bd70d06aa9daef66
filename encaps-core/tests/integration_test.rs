//! Integration tests for the complete encapsulate → parse → frame flow

use bytes::{BufMut, Bytes, BytesMut};
use encaps_core::{
    decode_frames,
    decoder::{decode_data_sequence, decode_fragmented_frames, EncapsulatedStream},
    encapsulate, encapsulate_extended,
    encoder::itemize_fragment,
    extended::frames_from_extended_table,
    DecodeOptions, Diagnostic, EncapsError, ErrorKind, FrameIterator, FrameStrategy,
};

/// Build a stream from an offset table and raw fragments
fn build_stream(offsets: &[u32], fragments: &[Vec<u8>]) -> Bytes {
    let mut buf = BytesMut::new();
    buf.put_slice(b"\xFE\xFF\x00\xE0");
    buf.put_u32_le((offsets.len() * 4) as u32);
    for offset in offsets {
        buf.put_u32_le(*offset);
    }
    for fragment in fragments {
        buf.put_slice(&itemize_fragment(fragment).unwrap());
    }
    buf.freeze()
}

fn fragment(len: usize, fill: u8) -> Vec<u8> {
    vec![fill; len]
}

fn fragment_with_marker(fill: u8) -> Vec<u8> {
    vec![fill, fill, 0xFF, 0xD9]
}

#[test]
fn test_single_frame_single_fragment() {
    let data = build_stream(&[], &[vec![0x01, 0x00, 0x00, 0x00]]);
    let stream = EncapsulatedStream::new(data);

    let fragments: Vec<Bytes> = stream
        .fragments()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(fragments, [Bytes::from_static(b"\x01\x00\x00\x00")]);

    let mut frames = stream.frames(None).unwrap();
    assert_eq!(frames.strategy(), FrameStrategy::SingleFragment);
    let frame = frames.next().unwrap().unwrap();
    assert_eq!(frame.defragment().as_ref(), b"\x01\x00\x00\x00");
    assert!(frames.next().is_none());
}

#[test]
fn test_offset_table_spanning_fragments() {
    // Frame 1: 2 items totalling 4966 bytes, frame 2: 3 items totalling 4750
    let fragments = vec![
        fragment(2474, 0x11),
        fragment(2476, 0x12),
        fragment(1576, 0x21),
        fragment(1576, 0x22),
        fragment(1574, 0x23),
    ];
    let data = build_stream(&[0, 4966, 9716], &fragments);

    let (frames, diagnostics) = decode_fragmented_frames(data, DecodeOptions::new()).unwrap();
    assert!(diagnostics.is_empty());
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].fragment_count(), 2);
    assert_eq!(frames[1].fragment_count(), 3);
    assert_eq!(frames[0].len(), 4950);
    assert_eq!(frames[1].len(), 4726);
    assert!(frames[1].fragments()[0].iter().all(|&b| b == 0x21));
}

#[test]
fn test_marker_split_without_table() {
    let fragments = vec![
        fragment(4, 0x01),
        fragment_with_marker(0x01),
        fragment(4, 0x02),
        fragment_with_marker(0x02),
        fragment(4, 0x03),
        fragment_with_marker(0x03),
    ];
    let data = build_stream(&[], &fragments);

    let decoded = decode_frames(data, DecodeOptions::new().frame_count(3)).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::MarkerSearch);
    assert_eq!(decoded.frames.len(), 3);
    assert_eq!(decoded.frames[0].as_ref(), b"\x01\x01\x01\x01\x01\x01\xFF\xD9");
    assert_eq!(decoded.frames[2].as_ref(), b"\x03\x03\x03\x03\x03\x03\xFF\xD9");
    assert!(decoded.diagnostics.is_empty());
}

#[test]
fn test_marker_missing_at_end_flushes_with_diagnostic() {
    let fragments = vec![
        fragment(4, 0x01),
        fragment_with_marker(0x01),
        fragment(4, 0x02),
        fragment_with_marker(0x02),
        fragment(4, 0x03),
        fragment(4, 0x03),
    ];
    let data = build_stream(&[], &fragments);

    let mut frames = FrameIterator::new(data, DecodeOptions::new().frame_count(3)).unwrap();
    assert!(frames.next().unwrap().is_ok());
    assert!(frames.next().unwrap().is_ok());
    assert!(frames.diagnostics().is_empty());

    // The trailing group is returned, not dropped
    let last = frames.next().unwrap().unwrap();
    assert_eq!(last.fragment_count(), 2);
    assert_eq!(
        frames.diagnostics().as_slice(),
        &[Diagnostic::MissedFrameBoundary {
            frames_found: 2,
            frames_expected: 3,
            trailing_fragments: 2
        }]
    );
    assert!(frames.next().is_none());
}

#[test]
fn test_fewer_fragments_than_frames() {
    let data = build_stream(&[], &[fragment(4, 0x01), fragment(4, 0x02)]);

    let err = FrameIterator::new(data, DecodeOptions::new().frame_count(5)).unwrap_err();
    assert_eq!(
        err,
        EncapsError::TooFewFragments {
            fragments: 2,
            frames: 5
        }
    );
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[test]
fn test_multiple_fragments_without_frame_count() {
    let data = build_stream(&[], &[fragment(4, 0x01), fragment(4, 0x02)]);

    let err = decode_frames(data, DecodeOptions::new()).unwrap_err();
    assert_eq!(err, EncapsError::UnknownFrameBoundaries(2));
}

#[test]
fn test_one_fragment_per_frame_without_table() {
    let frames = vec![fragment(6, 0xAA), fragment(8, 0xBB), fragment(2, 0xCC)];
    let data = encapsulate(&frames, 1, false).unwrap();

    let decoded = decode_frames(data, DecodeOptions::new().frame_count(3)).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::OnePerFrame);
    assert_eq!(decoded.frames, frames);
}

#[test]
fn test_all_fragments_one_frame_without_table() {
    let frame = fragment(12, 0x5A);
    let data = encapsulate(&[&frame], 3, false).unwrap();

    let decoded = decode_frames(data, DecodeOptions::new().frame_count(1)).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::AllInOne);
    assert_eq!(decoded.frames, [frame]);
}

#[test]
fn test_round_trip_multi_fragment() {
    let frames: Vec<Vec<u8>> = (0..5u8).map(|i| vec![i; 40 + 2 * i as usize]).collect();
    let data = encapsulate(&frames, 4, true).unwrap();

    let decoded = decode_frames(data, DecodeOptions::new()).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::OffsetTable);
    assert_eq!(decoded.frames, frames);
}

#[test]
fn test_odd_frame_gains_one_padding_byte() {
    let frame = vec![0x01, 0x02, 0x03];
    let data = encapsulate(&[&frame], 1, true).unwrap();

    let decoded = decode_frames(data, DecodeOptions::new()).unwrap();
    assert_eq!(decoded.frames[0].as_ref(), b"\x01\x02\x03\x00");
}

#[test]
fn test_offsets_point_at_item_tags() {
    let frames = vec![fragment(10, 1), fragment(4, 2), fragment(16, 3)];
    let data = encapsulate(&frames, 1, true).unwrap();
    let stream = EncapsulatedStream::new(data.clone());

    let table = stream.offset_table().unwrap();
    assert_eq!(table.offsets, [0, 18, 30]);

    let first_item = 8 + 4 * frames.len();
    for offset in &table.offsets {
        let at = first_item + *offset as usize;
        assert_eq!(&data[at..at + 4], b"\xFE\xFF\x00\xE0");
    }
}

#[test]
fn test_extended_round_trip() {
    let frames = vec![fragment(10, 1), fragment(7, 2), fragment(16, 3)];
    let encoded = encapsulate_extended(&frames).unwrap();

    assert_eq!(encoded.table.len(), 3);
    assert_eq!(encoded.table.offsets, [0, 18, 34]);
    assert_eq!(encoded.table.lengths, [10, 7, 16]);

    let stream = EncapsulatedStream::new(encoded.data.clone());
    assert!(!stream.offset_table().unwrap().has_values);

    let decoded = frames_from_extended_table(encoded.data, &encoded.table).unwrap();
    assert_eq!(decoded, frames);
}

#[test]
fn test_unknown_tag_strict_and_permissive() {
    let mut buf = BytesMut::new();
    buf.put_slice(b"\xFE\xFF\x00\xE0\x00\x00\x00\x00");
    buf.put_slice(&itemize_fragment(b"\x01\x02").unwrap());
    buf.put_slice(b"\x10\x00\x10\x00\x02\x00\x00\x00\xAA\xBB");
    let data = buf.freeze();

    let strict = EncapsulatedStream::new(data.clone()).with_mode(encaps_core::ParseMode::Strict);
    assert!(matches!(
        strict.fragment_count(),
        Err(EncapsError::UnexpectedTag { offset: 18, .. })
    ));

    let permissive = EncapsulatedStream::new(data);
    let decoded = permissive.decode(Some(2)).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::OnePerFrame);
    assert_eq!(
        decoded.frames,
        [Bytes::from_static(b"\x01\x02"), Bytes::from_static(b"\xAA\xBB")]
    );
    assert_eq!(decoded.diagnostics.len(), 1);
}

#[test]
fn test_mis_tagged_item_keeps_offset_table_alignment() {
    let mut buf = BytesMut::new();
    buf.put_slice(b"\xFE\xFF\x00\xE0\x08\x00\x00\x00\x00\x00\x00\x00\x14\x00\x00\x00");
    buf.put_slice(&itemize_fragment(b"\x01\x02").unwrap());
    buf.put_slice(b"\xFE\xFF\x00\xE1\x02\x00\x00\x00\x03\x04");
    buf.put_slice(&itemize_fragment(b"\x05\x06").unwrap());
    let data = buf.freeze();

    let fragments = decode_data_sequence(data.clone()).unwrap();
    assert_eq!(fragments.len(), 3);
    assert_eq!(fragments[1].as_ref(), b"\x03\x04");

    let decoded = decode_frames(data.clone(), DecodeOptions::new()).unwrap();
    assert_eq!(decoded.strategy, FrameStrategy::OffsetTable);
    assert_eq!(
        decoded.frames,
        [
            Bytes::from_static(b"\x01\x02\x03\x04"),
            Bytes::from_static(b"\x05\x06")
        ]
    );
    assert_eq!(
        decoded.diagnostics.as_slice(),
        &[Diagnostic::UnexpectedTag {
            offset: 26,
            tag: encaps_core::Tag::new(0xFFFE, 0xE100)
        }]
    );

    let strict = decode_frames(data, DecodeOptions::new().strict());
    assert!(matches!(
        strict,
        Err(EncapsError::UnexpectedTag { offset: 26, .. })
    ));
}

#[test]
fn test_decreasing_offsets_are_reported() {
    let data = build_stream(&[0, 20, 10], &[fragment(2, 1), fragment(2, 2), fragment(2, 3)]);

    let decoded = decode_frames(data, DecodeOptions::new()).unwrap();
    assert!(decoded
        .diagnostics
        .as_slice()
        .contains(&Diagnostic::NonMonotonicOffsets { offset: 8 }));
    assert_eq!(decoded.frames.concat(), [1, 1, 2, 2, 3, 3]);
}
