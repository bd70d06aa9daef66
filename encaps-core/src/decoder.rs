//! Whole-stream decoding
//!
//! [`EncapsulatedStream`] is the entry point for inspecting and decoding the
//! value of an encapsulated Pixel Data element. The free functions are eager
//! shortcuts that collect everything into memory.

use crate::diagnostics::Diagnostics;
use crate::error::EncapsError;
use crate::fragments::{count_fragments, FragmentIterator};
use crate::frames::{FrameIterator, FrameStrategy};
use crate::offset_table::parse_offset_table;
use crate::reader::ItemReader;
use crate::types::{DecodeOptions, Frame, OffsetTable, ParseMode};
use alloc::vec::Vec;
use bytes::{BufMut, Bytes, BytesMut};
#[cfg(feature = "std")]
use std::io::Read;

/// The value of an encapsulated Pixel Data element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncapsulatedStream {
    data: Bytes,
    mode: ParseMode,
}

impl EncapsulatedStream {
    /// Wrap an encapsulated value, parsed permissively
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self {
            data: data.into(),
            mode: ParseMode::default(),
        }
    }

    /// Read an encapsulated value from `reader` until EOF
    #[cfg(feature = "std")]
    pub fn from_reader<R: Read>(reader: &mut R) -> Result<Self, EncapsError> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Ok(Self::new(data))
    }

    /// Set how unrecognised tags are handled
    pub fn with_mode(mut self, mode: ParseMode) -> Self {
        self.mode = mode;
        self
    }

    /// The raw encapsulated bytes
    pub fn as_bytes(&self) -> &Bytes {
        &self.data
    }

    /// Length of the encapsulated value in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the value is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn reader_after_table(&self) -> Result<(ItemReader, OffsetTable), EncapsError> {
        let mut reader = ItemReader::with_mode(self.data.clone(), self.mode);
        let table = parse_offset_table(&mut reader)?;
        Ok((reader, table))
    }

    /// The Basic Offset Table
    pub fn offset_table(&self) -> Result<OffsetTable, EncapsError> {
        self.reader_after_table().map(|(_, table)| table)
    }

    /// Number of fragments after the offset table
    pub fn fragment_count(&self) -> Result<usize, EncapsError> {
        let (reader, _) = self.reader_after_table()?;
        count_fragments(&reader)
    }

    /// Iterate over the fragments after the offset table
    pub fn fragments(&self) -> Result<FragmentIterator, EncapsError> {
        let (reader, _) = self.reader_after_table()?;
        Ok(FragmentIterator::new(reader))
    }

    /// Iterate over frames, each as its fragments
    pub fn frames(&self, frame_count: Option<usize>) -> Result<FrameIterator, EncapsError> {
        FrameIterator::new(
            self.data.clone(),
            DecodeOptions {
                frame_count,
                mode: self.mode,
            },
        )
    }

    /// Every fragment after the offset table, up to the delimiter
    pub fn data_sequence(&self) -> Result<Vec<Bytes>, EncapsError> {
        self.fragments()?.collect()
    }

    /// Every fragment after the offset table joined into one buffer
    pub fn defragment(&self) -> Result<Bytes, EncapsError> {
        let fragments = self.data_sequence()?;
        let total = fragments.iter().map(Bytes::len).sum();
        let mut buf = BytesMut::with_capacity(total);
        for fragment in &fragments {
            buf.put_slice(fragment);
        }
        Ok(buf.freeze())
    }

    /// Decode every frame into one contiguous buffer each
    pub fn decode(&self, frame_count: Option<usize>) -> Result<DecodedFrames, EncapsError> {
        decode_frames(
            self.data.clone(),
            DecodeOptions {
                frame_count,
                mode: self.mode,
            },
        )
    }
}

/// Frames decoded from a stream, with everything noticed along the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrames {
    /// The frames, each defragmented
    pub frames: Vec<Bytes>,

    /// The strategy used to locate frame boundaries
    pub strategy: FrameStrategy,

    /// Recoverable anomalies
    pub diagnostics: Diagnostics,
}

/// Decode every frame of `data` into one buffer each
pub fn decode_frames(
    data: impl Into<Bytes>,
    options: DecodeOptions,
) -> Result<DecodedFrames, EncapsError> {
    let mut iter = FrameIterator::new(data, options)?;
    let strategy = iter.strategy();
    let frames = iter
        .by_ref()
        .map(|frame| frame.map(|f| f.defragment()))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DecodedFrames {
        frames,
        strategy,
        diagnostics: iter.into_diagnostics(),
    })
}

/// Decode every frame of `data`, keeping each frame's fragments
pub fn decode_fragmented_frames(
    data: impl Into<Bytes>,
    options: DecodeOptions,
) -> Result<(Vec<Frame>, Diagnostics), EncapsError> {
    let mut iter = FrameIterator::new(data, options)?;
    let frames = iter.by_ref().collect::<Result<Vec<_>, _>>()?;
    Ok((frames, iter.into_diagnostics()))
}

/// Every fragment after the offset table, read permissively.
/// Use [`EncapsulatedStream::data_sequence`] to choose the mode.
pub fn decode_data_sequence(data: impl Into<Bytes>) -> Result<Vec<Bytes>, EncapsError> {
    EncapsulatedStream::new(data).data_sequence()
}

/// Every fragment after the offset table joined into one buffer, read permissively
pub fn defragment_data(data: impl Into<Bytes>) -> Result<Bytes, EncapsError> {
    EncapsulatedStream::new(data).defragment()
}
