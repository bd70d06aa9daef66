//! Constants and limits for the encapsulated item sequence

use crate::types::Tag;

/// Item tag (FFFE,E000), used for the offset table and every fragment
pub const ITEM_TAG: Tag = Tag::new(0xFFFE, 0xE000);

/// Sequence Delimitation Item tag (FFFE,E0DD)
pub const SEQUENCE_DELIMITER_TAG: Tag = Tag::new(0xFFFE, 0xE0DD);

/// Item tag as it appears on the wire (little-endian group, then element)
pub const ITEM_TAG_BYTES: &[u8; 4] = b"\xFE\xFF\x00\xE0";

/// Length value reserved for "undefined length"; never valid for a fragment
pub const UNDEFINED_LENGTH: u32 = 0xFFFF_FFFF;

/// Size of an item header: 4 byte tag + 4 byte length
pub const ITEM_HEADER_SIZE: usize = 8;

/// Size of one Basic Offset Table entry
pub const BASIC_OFFSET_SIZE: usize = 4;

/// Size of one Extended Offset Table (or Lengths) entry
pub const EXTENDED_OFFSET_SIZE: usize = 8;

/// Largest offset a Basic Offset Table entry can hold
pub const MAX_BASIC_OFFSET: u64 = u32::MAX as u64;

/// Largest value an item length field may carry for a fragment
/// (0xFFFFFFFF is the undefined-length sentinel)
pub const MAX_FRAGMENT_LENGTH: usize = (UNDEFINED_LENGTH - 1) as usize;

/// Minimum size of a fragment produced by the encoder
pub const MIN_FRAGMENT_SIZE: usize = 2;

/// Padding byte appended to odd-length fragments
pub const PADDING_BYTE: u8 = 0x00;

/// End of image / end of codestream marker shared by JPEG, JPEG-LS and JPEG 2000
pub const END_OF_CODESTREAM_MARKER: &[u8; 2] = b"\xFF\xD9";

/// Number of trailing fragment bytes searched for the end-of-codestream marker.
/// The marker may be followed by a padding byte and a few bytes of junk from
/// some producers.
pub const MARKER_SEARCH_WINDOW: usize = 10;
