//! Extended Offset Table
//!
//! The Extended Offset Table and Extended Offset Table Lengths attributes
//! replace the Basic Offset Table for data larger than 4 GiB. Each is a
//! buffer of little-endian 64-bit values, one per frame, stored next to the
//! pixel data rather than inside it.

use crate::constants::{EXTENDED_OFFSET_SIZE, ITEM_HEADER_SIZE};
use crate::error::EncapsError;
use crate::offset_table::parse_offset_table;
use crate::reader::{Item, ItemReader};
use crate::types::ParseMode;
use alloc::format;
use alloc::vec::Vec;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Per-frame offsets and lengths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtendedOffsetTable {
    /// Offset of each frame's item tag, from the first byte after the
    /// (empty) Basic Offset Table item
    pub offsets: Vec<u64>,

    /// Unpadded length of each frame
    pub lengths: Vec<u64>,
}

impl ExtendedOffsetTable {
    /// Parse the two attribute values
    pub fn from_bytes(offsets: &[u8], lengths: &[u8]) -> Result<Self, EncapsError> {
        if offsets.len() % EXTENDED_OFFSET_SIZE != 0 {
            return Err(EncapsError::InvalidExtendedTable(format!(
                "offsets length {} is not a multiple of 8",
                offsets.len()
            )));
        }
        if lengths.len() % EXTENDED_OFFSET_SIZE != 0 {
            return Err(EncapsError::InvalidExtendedTable(format!(
                "lengths length {} is not a multiple of 8",
                lengths.len()
            )));
        }
        if offsets.len() != lengths.len() {
            return Err(EncapsError::InvalidExtendedTable(format!(
                "{} offsets but {} lengths",
                offsets.len() / EXTENDED_OFFSET_SIZE,
                lengths.len() / EXTENDED_OFFSET_SIZE
            )));
        }

        Ok(Self {
            offsets: read_u64s(offsets),
            lengths: read_u64s(lengths),
        })
    }

    /// Number of frames addressed
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Whether the table addresses no frames
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Extended Offset Table attribute value
    pub fn offsets_bytes(&self) -> Bytes {
        write_u64s(&self.offsets)
    }

    /// Extended Offset Table Lengths attribute value
    pub fn lengths_bytes(&self) -> Bytes {
        write_u64s(&self.lengths)
    }
}

fn read_u64s(mut buf: &[u8]) -> Vec<u64> {
    let mut values = Vec::with_capacity(buf.len() / EXTENDED_OFFSET_SIZE);
    while buf.remaining() >= EXTENDED_OFFSET_SIZE {
        values.push(buf.get_u64_le());
    }
    values
}

fn write_u64s(values: &[u64]) -> Bytes {
    let mut buf = BytesMut::with_capacity(values.len() * EXTENDED_OFFSET_SIZE);
    for &value in values {
        buf.put_u64_le(value);
    }
    buf.freeze()
}

/// Read every frame addressed by an Extended Offset Table.
///
/// Each frame must be a single item at its recorded offset. The returned
/// buffers are the recorded lengths, so odd frames lose their padding byte.
pub fn frames_from_extended_table(
    data: impl Into<Bytes>,
    table: &ExtendedOffsetTable,
) -> Result<Vec<Bytes>, EncapsError> {
    let data = data.into();
    let mut reader = ItemReader::with_mode(data.clone(), ParseMode::Strict);
    parse_offset_table(&mut reader)?;
    let first_item = reader.position();

    table
        .offsets
        .iter()
        .zip(&table.lengths)
        .map(|(&offset, &length)| {
            let start = first_item.saturating_add(offset as usize);
            if start.saturating_add(ITEM_HEADER_SIZE) > data.len() {
                return Err(EncapsError::Truncated {
                    offset: start,
                    expected: ITEM_HEADER_SIZE,
                    actual: data.len().saturating_sub(start),
                });
            }

            let mut item_reader = ItemReader::with_mode(data.slice(start..), ParseMode::Strict);
            let fragment = match item_reader.read_item() {
                Ok(Some(Item::Fragment(fragment))) => fragment,
                Ok(_) => {
                    return Err(EncapsError::InvalidExtendedTable(format!(
                        "no frame item at offset {}",
                        offset
                    )))
                }
                Err(e) => return Err(shift_offset(e, start)),
            };

            let length = length as usize;
            if length > fragment.len() {
                return Err(EncapsError::InvalidExtendedTable(format!(
                    "frame length {} exceeds item length {} at offset {}",
                    length,
                    fragment.len(),
                    offset
                )));
            }
            Ok(fragment.slice(..length))
        })
        .collect()
}

/// Re-base an error raised on a sub-slice onto the whole stream
fn shift_offset(err: EncapsError, by: usize) -> EncapsError {
    match err {
        EncapsError::UnexpectedTag { tag, offset } => EncapsError::UnexpectedTag {
            tag,
            offset: offset + by,
        },
        EncapsError::UndefinedLength(offset) => EncapsError::UndefinedLength(offset + by),
        EncapsError::Truncated {
            offset,
            expected,
            actual,
        } => EncapsError::Truncated {
            offset: offset + by,
            expected,
            actual,
        },
        other => other,
    }
}
