//! Item-level reading of an encapsulated item sequence
//!
//! Every item is a little-endian `(tag, length, value)` triplet:
//!
//! ```text
//! | group u16 | element u16 | length u32 | value (length bytes) |
//! ```

use crate::constants::{ITEM_HEADER_SIZE, ITEM_TAG, SEQUENCE_DELIMITER_TAG, UNDEFINED_LENGTH};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EncapsError;
use crate::types::{ParseMode, Tag};
use bytes::{Buf, Bytes};

#[cfg(feature = "logging")]
use tracing::debug;

/// One item read from the sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// An Item carrying a fragment
    Fragment(Bytes),
    /// The Sequence Delimitation Item
    Delimiter,
}

/// Cursor over an encapsulated stream that reads one item at a time.
///
/// The reader owns its position; fragments are zero-copy slices of the
/// underlying buffer.
#[derive(Debug, Clone)]
pub struct ItemReader {
    buf: Bytes,
    total: usize,
    mode: ParseMode,
    diagnostics: Diagnostics,
}

impl ItemReader {
    /// Create a permissive reader positioned at the start of `data`
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self::with_mode(data, ParseMode::default())
    }

    /// Create a reader with an explicit parse mode
    pub fn with_mode(data: impl Into<Bytes>, mode: ParseMode) -> Self {
        let buf = data.into();
        Self {
            total: buf.len(),
            buf,
            mode,
            diagnostics: Diagnostics::new(),
        }
    }

    /// A copy of this reader at the same position whose diagnostics are discarded
    pub(crate) fn lookahead(&self) -> Self {
        Self {
            buf: self.buf.clone(),
            total: self.total,
            mode: self.mode,
            diagnostics: Diagnostics::muted(),
        }
    }

    /// Current byte offset from the start of the stream
    pub fn position(&self) -> usize {
        self.total - self.buf.remaining()
    }

    /// Bytes left to read
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Total length of the stream
    pub fn stream_len(&self) -> usize {
        self.total
    }

    /// Parse mode in effect
    pub fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Diagnostics raised so far
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Consume the reader, returning its diagnostics
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// Read a tag. Returns `None` when the stream is exhausted.
    pub(crate) fn read_tag(&mut self) -> Result<Option<Tag>, EncapsError> {
        let offset = self.position();
        match self.buf.remaining() {
            0 => Ok(None),
            n if n < 4 => match self.mode {
                ParseMode::Strict => Err(EncapsError::Truncated {
                    offset,
                    expected: 4,
                    actual: n,
                }),
                ParseMode::Permissive => {
                    self.diagnostics.push(Diagnostic::TruncatedItem {
                        offset,
                        expected: 4,
                        actual: n,
                    });
                    self.buf.advance(n);
                    Ok(None)
                }
            },
            _ => {
                let group = self.buf.get_u16_le();
                let element = self.buf.get_u16_le();
                Ok(Some(Tag::new(group, element)))
            }
        }
    }

    /// Read a 4 byte little-endian unsigned integer
    pub(crate) fn read_u32(&mut self) -> Result<u32, EncapsError> {
        if self.buf.remaining() < 4 {
            return Err(EncapsError::Truncated {
                offset: self.position(),
                expected: 4,
                actual: self.buf.remaining(),
            });
        }
        Ok(self.buf.get_u32_le())
    }

    /// Read `length` value bytes. In permissive mode a short value is
    /// returned as-is with a diagnostic.
    fn read_value(&mut self, length: usize) -> Result<Bytes, EncapsError> {
        let available = self.buf.remaining();
        if available >= length {
            return Ok(self.buf.copy_to_bytes(length));
        }

        let offset = self.position();
        match self.mode {
            ParseMode::Strict => Err(EncapsError::Truncated {
                offset,
                expected: length,
                actual: available,
            }),
            ParseMode::Permissive => {
                self.diagnostics.push(Diagnostic::TruncatedItem {
                    offset,
                    expected: length,
                    actual: available,
                });
                Ok(self.buf.copy_to_bytes(available))
            }
        }
    }

    /// Read the next item.
    ///
    /// Returns `Ok(None)` once the stream is exhausted. In permissive mode an
    /// item with an unrecognised tag is still returned as a fragment so that
    /// offset table positions stay aligned.
    pub fn read_item(&mut self) -> Result<Option<Item>, EncapsError> {
        let tag_offset = self.position();
        let tag = match self.read_tag()? {
            Some(tag) => tag,
            None => return Ok(None),
        };

        if tag == SEQUENCE_DELIMITER_TAG {
            let length_offset = self.position();
            let available = self.buf.remaining();
            if available < 4 && self.mode == ParseMode::Permissive {
                // Nothing follows the delimiter, so a clipped length is harmless
                self.diagnostics.push(Diagnostic::TruncatedItem {
                    offset: length_offset,
                    expected: 4,
                    actual: available,
                });
                self.buf.advance(available);
                return Ok(Some(Item::Delimiter));
            }
            let length = self.read_u32()?;

            #[cfg(feature = "logging")]
            debug!("{:04x}: Sequence Delimiter, length 0x{:x}", tag_offset, length);

            if length != 0 {
                self.diagnostics.push(Diagnostic::NonZeroDelimiterLength {
                    offset: length_offset,
                    length,
                });
            }
            return Ok(Some(Item::Delimiter));
        }

        if tag != ITEM_TAG {
            if self.mode == ParseMode::Strict {
                return Err(EncapsError::UnexpectedTag {
                    tag,
                    offset: tag_offset,
                });
            }
            self.diagnostics.push(Diagnostic::UnexpectedTag {
                offset: tag_offset,
                tag,
            });
        }

        let length_offset = self.position();
        let length = self.read_u32()?;
        if length == UNDEFINED_LENGTH {
            return Err(EncapsError::UndefinedLength(length_offset));
        }

        #[cfg(feature = "logging")]
        debug!("{:04x}: Item {}, length 0x{:x}", tag_offset, tag, length);

        let value = self.read_value(length as usize)?;
        Ok(Some(Item::Fragment(value)))
    }

    /// Advance past the next item.
    /// Returns `false` at the delimiter or end of stream.
    pub(crate) fn skip_item(&mut self) -> Result<bool, EncapsError> {
        Ok(matches!(self.read_item()?, Some(Item::Fragment(_))))
    }
}

/// Size on the wire of an item whose value is `value_len` bytes long
pub const fn item_size(value_len: usize) -> usize {
    ITEM_HEADER_SIZE + value_len
}
