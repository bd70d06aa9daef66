//! Fragment iteration over the items that follow the offset table

use crate::diagnostics::Diagnostics;
use crate::error::EncapsError;
use crate::reader::{Item, ItemReader};
use bytes::Bytes;

/// Lazy sequence of fragments, ending at the Sequence Delimiter or the end
/// of the stream. Once an error is returned the iterator is exhausted.
#[derive(Debug)]
pub struct FragmentIterator {
    reader: ItemReader,
    done: bool,
}

impl FragmentIterator {
    /// Iterate from the reader's current position, which should be the first
    /// item after the offset table
    pub fn new(reader: ItemReader) -> Self {
        Self {
            reader,
            done: false,
        }
    }

    /// Current byte offset in the stream
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Total length of the underlying stream
    pub fn stream_len(&self) -> usize {
        self.reader.stream_len()
    }

    /// Diagnostics raised so far
    pub fn diagnostics(&self) -> &Diagnostics {
        self.reader.diagnostics()
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        self.reader.diagnostics_mut()
    }

    /// Consume the iterator, returning its diagnostics
    pub fn into_diagnostics(self) -> Diagnostics {
        self.reader.into_diagnostics()
    }
}

impl Iterator for FragmentIterator {
    type Item = Result<Bytes, EncapsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.reader.read_item() {
            Ok(Some(Item::Fragment(fragment))) => Some(Ok(fragment)),
            Ok(Some(Item::Delimiter)) | Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

impl core::iter::FusedIterator for FragmentIterator {}

/// Count the fragments from the reader's position to the delimiter or end of
/// stream, without moving `reader`.
pub fn count_fragments(reader: &ItemReader) -> Result<usize, EncapsError> {
    let mut lookahead = reader.lookahead();
    let mut count = 0;
    while lookahead.skip_item()? {
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ParseMode;
    use alloc::vec::Vec;

    fn collect(data: &'static [u8]) -> Result<Vec<Bytes>, EncapsError> {
        FragmentIterator::new(ItemReader::new(data)).collect()
    }

    #[test]
    fn test_single_fragment_no_delimiter() {
        let fragments = collect(b"\xFE\xFF\x00\xE0\x04\x00\x00\x00\x01\x00\x00\x00").unwrap();
        assert_eq!(fragments, [Bytes::from_static(b"\x01\x00\x00\x00")]);
    }

    #[test]
    fn test_multi_fragments_delimiter() {
        let fragments = collect(
            b"\xFE\xFF\x00\xE0\x04\x00\x00\x00\x01\x00\x00\x00\
              \xFE\xFF\x00\xE0\x06\x00\x00\x00\x01\x02\x03\x04\x05\x06\
              \xFE\xFF\xDD\xE0\x00\x00\x00\x00",
        )
        .unwrap();
        assert_eq!(fragments.len(), 2);
        assert_eq!(fragments[1].as_ref(), b"\x01\x02\x03\x04\x05\x06");
    }

    #[test]
    fn test_stops_at_delimiter() {
        let data: &'static [u8] = b"\xFE\xFF\x00\xE0\x04\x00\x00\x00\x01\x00\x00\x00\
              \xFE\xFF\xDD\xE0\x00\x00\x00\x00\
              \xFE\xFF\x00\xE0\x04\x00\x00\x00\x02\x00\x00\x00";
        assert_eq!(collect(data).unwrap().len(), 1);
        assert_eq!(count_fragments(&ItemReader::new(data)).unwrap(), 1);
    }

    #[test]
    fn test_undefined_length_then_exhausted() {
        let mut fragments = FragmentIterator::new(ItemReader::new(
            &b"\xFE\xFF\x00\xE0\xFF\xFF\xFF\xFF\x00\x00\x00\x01"[..],
        ));
        assert_eq!(fragments.next(), Some(Err(EncapsError::UndefinedLength(4))));
        assert_eq!(fragments.next(), None);
    }

    #[test]
    fn test_count_does_not_move_reader() {
        let data: &'static [u8] = b"\xFE\xFF\x00\xE0\x02\x00\x00\x00\x01\x00\
              \xFE\xFF\x00\xE0\x02\x00\x00\x00\x02\x00";
        let reader = ItemReader::new(data);
        assert_eq!(count_fragments(&reader).unwrap(), 2);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_count_strict_bad_tag() {
        let data: &'static [u8] = b"\xFE\xFF\x00\xE0\x04\x00\x00\x00\x01\x00\x00\x00\
              \x10\x00\x10\x00\x00\x00\x00\x00";
        let reader = ItemReader::with_mode(data, ParseMode::Strict);
        assert!(matches!(
            count_fragments(&reader),
            Err(EncapsError::UnexpectedTag { offset: 12, .. })
        ));
    }
}
