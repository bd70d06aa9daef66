//! Non-fatal anomalies found while reading an encapsulated stream

use crate::types::Tag;
use alloc::vec::Vec;
use core::fmt;
use serde::Serialize;

#[cfg(feature = "logging")]
use tracing::warn;

/// A recoverable anomaly. Decoding continued past it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    /// The Sequence Delimiter carried a non-zero length
    NonZeroDelimiterLength {
        /// Byte offset of the length field.
        offset: usize,
        /// The length that was found.
        length: u32,
    },

    /// An item with a tag other than Item or Sequence Delimiter was read as a fragment
    UnexpectedTag {
        /// Byte offset of the tag.
        offset: usize,
        /// The tag that was found.
        tag: Tag,
    },

    /// An item value ran past the end of the stream and was returned short
    TruncatedItem {
        /// Byte offset of the item value.
        offset: usize,
        /// Length from the item header.
        expected: usize,
        /// Bytes actually available.
        actual: usize,
    },

    /// Basic Offset Table values that do not start at zero or that decrease
    NonMonotonicOffsets {
        /// Byte offset of the table value.
        offset: usize,
    },

    /// End-of-codestream search could not confirm every frame boundary
    MissedFrameBoundary {
        /// Frames closed on a marker.
        frames_found: usize,
        /// Frames requested by the caller.
        frames_expected: usize,
        /// Fragments left over after the last marker.
        trailing_fragments: usize,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::NonZeroDelimiterLength { offset, length } => write!(
                f,
                "Expected 0x00000000 after delimiter, found 0x{:x}, at data position 0x{:x}",
                length, offset
            ),
            Diagnostic::UnexpectedTag { offset, tag } => write!(
                f,
                "Expected Item with tag (fffe,e000) at data position 0x{:x}, found {}",
                offset, tag
            ),
            Diagnostic::TruncatedItem {
                offset,
                expected,
                actual,
            } => write!(
                f,
                "Item value at data position 0x{:x} truncated: expected {} bytes, got {}",
                offset, expected, actual
            ),
            Diagnostic::NonMonotonicOffsets { offset } => write!(
                f,
                "Basic Offset Table at data position 0x{:x} does not start at 0 or is not increasing",
                offset
            ),
            Diagnostic::MissedFrameBoundary {
                frames_found,
                frames_expected,
                trailing_fragments,
            } => write!(
                f,
                "End of encapsulated data reached with {} of {} frame boundaries found and {} trailing fragment(s); one or more frame boundaries may have been missed",
                frames_found, frames_expected, trailing_fragments
            ),
        }
    }
}

/// Ordered record of the diagnostics raised by one decode
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
    muted: bool,
}

impl Diagnostics {
    /// An empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink that drops everything, used for look-ahead passes whose
    /// anomalies are reported again by the real pass.
    pub(crate) fn muted() -> Self {
        Self {
            entries: Vec::new(),
            muted: true,
        }
    }

    /// Record a diagnostic
    pub fn push(&mut self, diagnostic: Diagnostic) {
        if self.muted {
            return;
        }

        #[cfg(feature = "logging")]
        warn!("{}", diagnostic);

        self.entries.push(diagnostic);
    }

    /// Diagnostics in the order they were raised
    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.entries
    }

    /// Number of diagnostics
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing was raised
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the record
    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = core::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
