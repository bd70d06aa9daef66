//! Encapsulation of compressed frames into an item sequence

use crate::constants::{
    BASIC_OFFSET_SIZE, ITEM_HEADER_SIZE, ITEM_TAG_BYTES, MAX_BASIC_OFFSET, MAX_FRAGMENT_LENGTH,
    MIN_FRAGMENT_SIZE, PADDING_BYTE,
};
use crate::error::EncapsError;
use crate::extended::ExtendedOffsetTable;
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};

#[cfg(feature = "logging")]
use tracing::debug;

/// Split `frame` into `fragment_count` fragments of even length.
///
/// All fragments but the last share one length; the last takes the
/// remainder and is padded with a single `0x00` when odd. Fails when a
/// fragment would be shorter than 2 bytes.
pub fn fragment_frame(frame: &[u8], fragment_count: usize) -> Result<Vec<Bytes>, EncapsError> {
    if fragment_count == 0 {
        return Err(EncapsError::ZeroFragments);
    }

    let frame_length = frame.len();
    let max = (frame_length + 1) / MIN_FRAGMENT_SIZE;
    if fragment_count > max {
        return Err(EncapsError::TooManyFragments {
            requested: fragment_count,
            max,
        });
    }

    let length = fragment_length(frame_length, fragment_count);
    let mut fragments = Vec::with_capacity(fragment_count);

    let last_offset = length * (fragment_count - 1);
    for offset in (0..last_offset).step_by(length.max(1)) {
        fragments.push(Bytes::copy_from_slice(&frame[offset..offset + length]));
    }

    let remainder = &frame[last_offset..];
    let last = if remainder.len() % 2 == 1 {
        let mut padded = BytesMut::with_capacity(remainder.len() + 1);
        padded.put_slice(remainder);
        padded.put_u8(PADDING_BYTE);
        padded.freeze()
    } else {
        Bytes::copy_from_slice(remainder)
    };
    fragments.push(last);

    Ok(fragments)
}

/// Length shared by every fragment but the last: the even length at or just
/// above `frame_length / fragment_count`, stepped down when that would leave
/// nothing for the last fragment.
fn fragment_length(frame_length: usize, fragment_count: usize) -> usize {
    let mut length = frame_length / fragment_count;
    if length % 2 == 1 {
        length += 1;
    }
    if fragment_count > 1 && length * (fragment_count - 1) >= frame_length {
        length -= 2;
    }
    length.max(MIN_FRAGMENT_SIZE)
}

/// Wrap `fragment` in an Item: tag (FFFE,E000), 4 byte little-endian length, value
pub fn itemize_fragment(fragment: &[u8]) -> Result<Bytes, EncapsError> {
    if fragment.len() > MAX_FRAGMENT_LENGTH {
        return Err(EncapsError::FragmentTooLarge(fragment.len()));
    }

    let mut buf = BytesMut::with_capacity(ITEM_HEADER_SIZE + fragment.len());
    put_item(&mut buf, fragment);
    Ok(buf.freeze())
}

/// Fragment `frame` and itemize every fragment
pub fn itemize_frame(frame: &[u8], fragment_count: usize) -> Result<Vec<Bytes>, EncapsError> {
    fragment_frame(frame, fragment_count)?
        .iter()
        .map(|fragment| itemize_fragment(fragment))
        .collect()
}

fn put_item(buf: &mut BytesMut, value: &[u8]) {
    buf.put_slice(ITEM_TAG_BYTES);
    buf.put_u32_le(value.len() as u32);
    buf.put_slice(value);
}

/// Length of the longest fragment `fragment_frame` produces, padding included
fn largest_fragment(frame_length: usize, fragment_count: usize) -> usize {
    let length = fragment_length(frame_length, fragment_count);
    let last = frame_length.saturating_sub(length * (fragment_count - 1));
    let last = last + last % 2;
    if fragment_count > 1 {
        length.max(last)
    } else {
        last
    }
}

/// Check that every fragment of every frame fits a 32-bit item length
fn check_fragment_lengths<I>(frame_lengths: I, fragment_count: usize) -> Result<(), EncapsError>
where
    I: IntoIterator<Item = usize>,
{
    // A zero count is rejected by `fragment_frame`
    if fragment_count == 0 {
        return Ok(());
    }
    for frame_length in frame_lengths {
        let largest = largest_fragment(frame_length, fragment_count);
        if largest > MAX_FRAGMENT_LENGTH {
            return Err(EncapsError::FragmentTooLarge(largest));
        }
    }
    Ok(())
}

/// Size of `frame` once split into `fragment_count` items
fn itemized_size(frame_length: usize, fragment_count: usize) -> u64 {
    let padded = frame_length + frame_length % 2;
    (fragment_count * ITEM_HEADER_SIZE + padded) as u64
}

/// Check that the start of the last frame fits in a Basic Offset Table entry
fn check_offset_capacity<I>(frame_lengths: I, fragment_count: usize) -> Result<(), EncapsError>
where
    I: IntoIterator<Item = usize>,
{
    let lengths: Vec<usize> = frame_lengths.into_iter().collect();
    let total: u64 = lengths
        .iter()
        .take(lengths.len().saturating_sub(1))
        .map(|&len| itemized_size(len, fragment_count))
        .sum();

    if total > MAX_BASIC_OFFSET {
        return Err(EncapsError::OffsetTableOverflow(total));
    }
    Ok(())
}

/// Encapsulate `frames` as an item sequence.
///
/// The sequence starts with the Basic Offset Table item, holding one offset
/// per frame when `with_offset_table` is set and empty otherwise, followed by
/// `fragments_per_frame` items for every frame. Fails with
/// [`EncapsError::FragmentTooLarge`] when a fragment would not fit a 32-bit
/// item length, and with [`EncapsError::OffsetTableOverflow`] when the table
/// cannot address the last frame; use [`encapsulate_extended`] for such data.
pub fn encapsulate<F: AsRef<[u8]>>(
    frames: &[F],
    fragments_per_frame: usize,
    with_offset_table: bool,
) -> Result<Bytes, EncapsError> {
    let frame_count = frames.len();

    check_fragment_lengths(frames.iter().map(|f| f.as_ref().len()), fragments_per_frame)?;
    if with_offset_table {
        check_offset_capacity(frames.iter().map(|f| f.as_ref().len()), fragments_per_frame)?;
    }

    let table_length = if with_offset_table {
        BASIC_OFFSET_SIZE * frame_count
    } else {
        0
    };

    let body: u64 = frames
        .iter()
        .map(|f| itemized_size(f.as_ref().len(), fragments_per_frame))
        .sum();
    let mut output = BytesMut::with_capacity(ITEM_HEADER_SIZE + table_length + body as usize);

    // Offset table item, values patched in after the frames are written
    output.put_slice(ITEM_TAG_BYTES);
    output.put_u32_le(table_length as u32);
    output.put_bytes(0xFF, table_length);

    let mut offsets: Vec<u64> = Vec::with_capacity(frame_count);
    let mut running: u64 = 0;
    for frame in frames {
        offsets.push(running);
        for fragment in fragment_frame(frame.as_ref(), fragments_per_frame)? {
            put_item(&mut output, &fragment);
            running += (ITEM_HEADER_SIZE + fragment.len()) as u64;
        }
    }

    if with_offset_table {
        let start = ITEM_HEADER_SIZE;
        for (index, offset) in offsets.iter().enumerate() {
            let at = start + index * BASIC_OFFSET_SIZE;
            output[at..at + BASIC_OFFSET_SIZE].copy_from_slice(&(*offset as u32).to_le_bytes());
        }
    }

    #[cfg(feature = "logging")]
    debug!(
        "Encapsulated {} frames into {} bytes ({} fragment(s) per frame, offset table: {})",
        frame_count,
        output.len(),
        fragments_per_frame,
        with_offset_table
    );

    Ok(output.freeze())
}

/// Encapsulated frames together with their Extended Offset Table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedEncapsulation {
    /// The item sequence, with an empty Basic Offset Table
    pub data: Bytes,

    /// Offsets and lengths for the Extended Offset Table attributes
    pub table: ExtendedOffsetTable,
}

/// Encapsulate `frames` one fragment per frame with an empty Basic Offset
/// Table, returning the Extended Offset Table that addresses them.
///
/// Offsets are measured like Basic Offset Table entries, from the first byte
/// after the offset table item to each frame's item tag; lengths are the
/// unpadded frame lengths.
pub fn encapsulate_extended<F: AsRef<[u8]>>(
    frames: &[F],
) -> Result<ExtendedEncapsulation, EncapsError> {
    let mut offsets = Vec::with_capacity(frames.len());
    let mut lengths = Vec::with_capacity(frames.len());
    let mut running: u64 = 0;

    for frame in frames {
        let length = frame.as_ref().len();
        offsets.push(running);
        lengths.push(length as u64);
        running += itemized_size(length, 1);
    }

    let data = encapsulate(frames, 1, false)?;

    Ok(ExtendedEncapsulation {
        data,
        table: ExtendedOffsetTable { offsets, lengths },
    })
}

/// Builder for encapsulating a set of frames
#[derive(Debug, Clone)]
pub struct EncapsulationBuilder {
    frames: Vec<Bytes>,
    fragments_per_frame: usize,
    offset_table: bool,
}

impl Default for EncapsulationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EncapsulationBuilder {
    /// One fragment per frame, with a Basic Offset Table
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            fragments_per_frame: 1,
            offset_table: true,
        }
    }

    /// Append a frame
    pub fn frame(mut self, frame: impl Into<Bytes>) -> Self {
        self.frames.push(frame.into());
        self
    }

    /// Append several frames
    pub fn frames<I, B>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        self.frames.extend(frames.into_iter().map(Into::into));
        self
    }

    /// Number of fragments to split each frame into
    pub fn fragments_per_frame(mut self, count: usize) -> Self {
        self.fragments_per_frame = count;
        self
    }

    /// Leave the Basic Offset Table empty
    pub fn without_offset_table(mut self) -> Self {
        self.offset_table = false;
        self
    }

    /// Encapsulate with a Basic Offset Table (or an empty one)
    pub fn build(self) -> Result<Bytes, EncapsError> {
        encapsulate(&self.frames, self.fragments_per_frame, self.offset_table)
    }

    /// Encapsulate for the Extended Offset Table.
    /// Fragment and offset table settings are ignored.
    pub fn build_extended(self) -> Result<ExtendedEncapsulation, EncapsError> {
        encapsulate_extended(&self.frames)
    }
}
