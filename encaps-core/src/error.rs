//! Error types for encapsulated pixel data operations

use crate::types::Tag;
use alloc::string::String;

/// Errors that can occur while reading or writing an encapsulated item sequence
#[cfg_attr(feature = "std", derive(thiserror::Error))]
#[derive(Debug, Clone, PartialEq)]
pub enum EncapsError {
    /// A tag other than the one required was found
    #[cfg_attr(feature = "std", error("Unexpected tag {tag} at offset {offset}"))]
    UnexpectedTag {
        /// The tag that was read.
        tag: Tag,
        /// Byte offset of the tag in the stream.
        offset: usize,
    },

    /// An item carried the undefined length sentinel
    #[cfg_attr(feature = "std", error("Undefined item length at offset {0}"))]
    UndefinedLength(usize),

    /// The offset table item length is not a multiple of 4
    #[cfg_attr(
        feature = "std",
        error("Offset table length {0} is not a multiple of 4")
    )]
    BadOffsetTableLength(u32),

    /// The stream ended inside an item header or value
    #[cfg_attr(
        feature = "std",
        error("Truncated item at offset {offset}: expected {expected} bytes, got {actual}")
    )]
    Truncated {
        /// Byte offset where the short read started.
        offset: usize,
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually available.
        actual: usize,
    },

    /// No offset table values and fewer fragments than requested frames
    #[cfg_attr(
        feature = "std",
        error("Offset table is empty and there are fewer fragments ({fragments}) than frames ({frames})")
    )]
    TooFewFragments {
        /// Number of fragments in the stream.
        fragments: usize,
        /// Number of frames requested.
        frames: usize,
    },

    /// No offset table values, no frame count and several fragments
    #[cfg_attr(
        feature = "std",
        error("Unable to determine frame boundaries: offset table is empty and no frame count was given for {0} fragments")
    )]
    UnknownFrameBoundaries(usize),

    /// More fragments requested than the frame can be split into
    #[cfg_attr(
        feature = "std",
        error("Too many fragments requested: {requested} (maximum {max} for a minimum fragment size of 2 bytes)")
    )]
    TooManyFragments {
        /// The requested fragment count.
        requested: usize,
        /// The largest valid fragment count for the frame.
        max: usize,
    },

    /// A fragment count of zero was requested
    #[cfg_attr(feature = "std", error("Fragment count must be at least 1"))]
    ZeroFragments,

    /// A fragment is too long to be described by a 32-bit item length
    #[cfg_attr(feature = "std", error("Fragment of {0} bytes exceeds the maximum item length"))]
    FragmentTooLarge(usize),

    /// Frame offsets do not fit into the Basic Offset Table
    #[cfg_attr(
        feature = "std",
        error("Encapsulated frame data ({0} bytes) exceeds the Basic Offset Table limit of 4294967295 bytes; use the Extended Offset Table instead")
    )]
    OffsetTableOverflow(u64),

    /// Extended Offset Table buffers are malformed
    #[cfg_attr(feature = "std", error("Invalid extended offset table: {0}"))]
    InvalidExtendedTable(String),

    /// IO error during read/write
    #[cfg_attr(feature = "std", error("IO error: {0}"))]
    Io(String),
}

/// Broad classification of an [`EncapsError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The stream is structurally malformed or cannot be framed
    Protocol,
    /// The Basic Offset Table cannot represent the data
    Capacity,
    /// The caller passed arguments the codec cannot honour
    Usage,
    /// The underlying byte source failed
    Io,
}

impl EncapsError {
    /// Classify the error
    pub fn kind(&self) -> ErrorKind {
        match self {
            EncapsError::UnexpectedTag { .. }
            | EncapsError::UndefinedLength(_)
            | EncapsError::BadOffsetTableLength(_)
            | EncapsError::Truncated { .. }
            | EncapsError::TooFewFragments { .. }
            | EncapsError::UnknownFrameBoundaries(_)
            | EncapsError::InvalidExtendedTable(_) => ErrorKind::Protocol,
            EncapsError::OffsetTableOverflow(_) => ErrorKind::Capacity,
            EncapsError::TooManyFragments { .. }
            | EncapsError::ZeroFragments
            | EncapsError::FragmentTooLarge(_) => ErrorKind::Usage,
            EncapsError::Io(_) => ErrorKind::Io,
        }
    }
}

#[cfg(feature = "std")]
impl From<std::io::Error> for EncapsError {
    fn from(err: std::io::Error) -> Self {
        EncapsError::Io(err.to_string())
    }
}
