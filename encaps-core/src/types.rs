//! Core types for the encapsulated item sequence

use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
use core::fmt;
use serde::{Deserialize, Serialize};

/// A (group, element) attribute tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tag(u32);

impl Tag {
    /// Create a tag from its group and element numbers
    pub const fn new(group: u16, element: u16) -> Self {
        Self(((group as u32) << 16) | element as u32)
    }

    /// Group number
    pub const fn group(&self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Element number
    pub const fn element(&self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Combined 32-bit value (group in the high half)
    pub const fn as_u32(&self) -> u32 {
        self.0
    }

    /// Wire encoding: little-endian group followed by little-endian element
    pub fn to_le_bytes(&self) -> [u8; 4] {
        let g = self.group().to_le_bytes();
        let e = self.element().to_le_bytes();
        [g[0], g[1], e[0], e[1]]
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:04x},{:04x})", self.group(), self.element())
    }
}

/// How the item reader treats tags that are neither Item nor Sequence Delimiter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParseMode {
    /// Fail with a protocol error
    Strict,
    /// Read the item as a fragment anyway and record a diagnostic.
    /// Truncated values are returned short instead of failing.
    #[default]
    Permissive,
}

/// The Basic Offset Table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OffsetTable {
    /// Whether the table item carried any values
    pub has_values: bool,

    /// Offset of the first fragment of each frame, measured from the first
    /// byte after the offset table item. Always at least `[0]`.
    pub offsets: Vec<u32>,
}

impl OffsetTable {
    /// A table item with no value
    pub fn empty() -> Self {
        Self {
            has_values: false,
            offsets: alloc::vec![0],
        }
    }

    /// A table item carrying the given offsets
    pub fn with_offsets(offsets: Vec<u32>) -> Self {
        Self {
            has_values: true,
            offsets,
        }
    }

    /// Number of frames described by the table, if it has values
    pub fn frame_count(&self) -> Option<usize> {
        self.has_values.then_some(self.offsets.len())
    }

    /// Check that offsets start at zero and never decrease
    pub fn is_well_formed(&self) -> bool {
        self.offsets.first() == Some(&0) && self.offsets.windows(2).all(|w| w[0] <= w[1])
    }
}

/// Options controlling how an encapsulated stream is split into frames
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodeOptions {
    /// Expected number of frames, usually the Number of Frames attribute.
    /// Required to frame multi-fragment data that has no offset table values.
    pub frame_count: Option<usize>,

    /// Treatment of unrecognised tags
    pub mode: ParseMode,
}

impl DecodeOptions {
    /// Permissive options with no frame count
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the expected number of frames
    pub fn frame_count(mut self, frames: usize) -> Self {
        self.frame_count = Some(frames);
        self
    }

    /// Fail on unrecognised tags
    pub fn strict(mut self) -> Self {
        self.mode = ParseMode::Strict;
        self
    }

    /// Set the parse mode
    pub fn mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// The frame count, treating zero as "not supplied"
    pub(crate) fn effective_frame_count(&self) -> Option<usize> {
        self.frame_count.filter(|&n| n > 0)
    }
}

/// One frame of compressed pixel data, as the fragments it was carried in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    fragments: Vec<Bytes>,
}

impl Frame {
    /// Create a frame from its fragments
    pub fn new(fragments: Vec<Bytes>) -> Self {
        Self { fragments }
    }

    /// The fragments in stream order
    pub fn fragments(&self) -> &[Bytes] {
        &self.fragments
    }

    /// Number of fragments in the frame
    pub fn fragment_count(&self) -> usize {
        self.fragments.len()
    }

    /// Total number of payload bytes across all fragments
    pub fn len(&self) -> usize {
        self.fragments.iter().map(Bytes::len).sum()
    }

    /// Whether the frame carries no bytes
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Join the fragments into one contiguous buffer.
    ///
    /// A single-fragment frame is returned without copying.
    pub fn defragment(&self) -> Bytes {
        match self.fragments.as_slice() {
            [] => Bytes::new(),
            [only] => only.clone(),
            many => {
                let mut buf = BytesMut::with_capacity(self.len());
                for fragment in many {
                    buf.put_slice(fragment);
                }
                buf.freeze()
            }
        }
    }
}

impl From<Frame> for Bytes {
    fn from(frame: Frame) -> Self {
        frame.defragment()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_tag_parts() {
        let tag = Tag::new(0xFFFE, 0xE000);
        assert_eq!(tag.as_u32(), 0xFFFE_E000);
        assert_eq!(tag.group(), 0xFFFE);
        assert_eq!(tag.element(), 0xE000);
        assert_eq!(tag.to_le_bytes(), [0xFE, 0xFF, 0x00, 0xE0]);
    }

    #[test]
    fn test_empty_offset_table() {
        let table = OffsetTable::empty();
        assert!(!table.has_values);
        assert_eq!(table.offsets, vec![0]);
        assert_eq!(table.frame_count(), None);
        assert!(table.is_well_formed());
    }

    #[test]
    fn test_offset_table_well_formed() {
        assert!(OffsetTable::with_offsets(vec![0, 4966, 9716]).is_well_formed());
        assert!(!OffsetTable::with_offsets(vec![4, 8]).is_well_formed());
        assert!(!OffsetTable::with_offsets(vec![0, 16, 8]).is_well_formed());
    }

    #[test]
    fn test_frame_defragment() {
        let frame = Frame::new(vec![Bytes::from_static(b"\x01\x02"), Bytes::from_static(b"\x03\x04")]);
        assert_eq!(frame.len(), 4);
        assert_eq!(frame.fragment_count(), 2);
        assert_eq!(frame.defragment().as_ref(), b"\x01\x02\x03\x04");
    }

    #[test]
    fn test_decode_options_zero_frames() {
        let options = DecodeOptions::new().frame_count(0);
        assert_eq!(options.effective_frame_count(), None);
        assert_eq!(options.mode, ParseMode::Permissive);
        assert_eq!(DecodeOptions::new().strict().mode, ParseMode::Strict);
    }
}
