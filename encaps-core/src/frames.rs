//! Frame assembly: grouping fragments into frames
//!
//! For JPEG-family transfer syntaxes a fragment never holds data from more
//! than one frame, but one frame may span several fragments. RLE Lossless
//! always uses exactly one fragment per frame. Which fragments belong
//! together is decided once per stream from the offset table, the fragment
//! count and the caller's frame count; see [`FrameStrategy`].

use crate::constants::{END_OF_CODESTREAM_MARKER, MARKER_SEARCH_WINDOW};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::EncapsError;
use crate::fragments::{count_fragments, FragmentIterator};
use crate::offset_table::parse_offset_table;
use crate::reader::{item_size, ItemReader};
use crate::types::{DecodeOptions, Frame, OffsetTable};
use alloc::vec::Vec;
use bytes::Bytes;
use serde::Serialize;

#[cfg(feature = "logging")]
use tracing::debug;

/// How frame boundaries are located
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameStrategy {
    /// The Basic Offset Table gives each frame's start
    OffsetTable,
    /// No table and a single fragment: that fragment is the only frame
    SingleFragment,
    /// No table and as many fragments as frames
    OnePerFrame,
    /// No table, one frame spread over every fragment
    AllInOne,
    /// No table and more fragments than frames: split after each fragment
    /// ending in an end-of-codestream marker
    MarkerSearch,
    /// No table and no fragments
    Empty,
}

/// Pick the framing strategy for a stream.
///
/// Fails when there is no offset table and the frames cannot be recovered:
/// fewer fragments than frames, or several fragments and no frame count.
pub fn select_strategy(
    table: &OffsetTable,
    fragment_count: usize,
    frame_count: Option<usize>,
) -> Result<FrameStrategy, EncapsError> {
    if table.has_values {
        return Ok(FrameStrategy::OffsetTable);
    }

    let frame_count = frame_count.filter(|&n| n > 0);
    match (fragment_count, frame_count) {
        (0, None) => Ok(FrameStrategy::Empty),
        (0, Some(frames)) => Err(EncapsError::TooFewFragments {
            fragments: 0,
            frames,
        }),
        (1, _) => Ok(FrameStrategy::SingleFragment),
        (fragments, Some(frames)) if fragments == frames => Ok(FrameStrategy::OnePerFrame),
        (_, Some(1)) => Ok(FrameStrategy::AllInOne),
        (fragments, Some(frames)) if fragments > frames => Ok(FrameStrategy::MarkerSearch),
        (fragments, Some(frames)) => Err(EncapsError::TooFewFragments { fragments, frames }),
        (fragments, None) => Err(EncapsError::UnknownFrameBoundaries(fragments)),
    }
}

/// Whether a fragment's trailing bytes contain the end-of-codestream marker
pub fn ends_codestream(fragment: &[u8]) -> bool {
    let tail = &fragment[fragment.len().saturating_sub(MARKER_SEARCH_WINDOW)..];
    memchr::memmem::find(tail, END_OF_CODESTREAM_MARKER).is_some()
}

/// Lazy sequence of frames over an encapsulated stream.
///
/// Ambiguous boundaries never fail the iteration: the remaining fragments are
/// returned as a final frame and a [`Diagnostic::MissedFrameBoundary`] is
/// recorded, readable through [`FrameIterator::diagnostics`].
#[derive(Debug)]
pub struct FrameIterator {
    fragments: FragmentIterator,
    table: OffsetTable,
    strategy: FrameStrategy,
    frame_count: Option<usize>,
    fragment_count: Option<usize>,
    // Offset table walk
    boundaries: Vec<u64>,
    running_length: u64,
    frame_index: usize,
    // Fragments collected for the frame being built
    pending: Vec<Bytes>,
    frames_emitted: usize,
    done: bool,
}

impl FrameIterator {
    /// Parse the offset table and choose a strategy for `data`
    pub fn new(data: impl Into<Bytes>, options: DecodeOptions) -> Result<Self, EncapsError> {
        let mut reader = ItemReader::with_mode(data, options.mode);
        let table = parse_offset_table(&mut reader)?;
        let frame_count = options.effective_frame_count();

        let fragment_count = if table.has_values {
            None
        } else {
            Some(count_fragments(&reader)?)
        };

        let strategy = select_strategy(&table, fragment_count.unwrap_or(0), frame_count)?;

        #[cfg(feature = "logging")]
        debug!(
            "Framing {} bytes with {:?} (fragments: {:?}, frames: {:?})",
            reader.stream_len(),
            strategy,
            fragment_count,
            frame_count
        );

        // The sentinel only needs to exceed the total item length
        let mut boundaries: Vec<u64> = table.offsets.iter().map(|&o| o as u64).collect();
        boundaries.push(reader.stream_len() as u64);

        Ok(Self {
            fragments: FragmentIterator::new(reader),
            table,
            strategy,
            frame_count,
            fragment_count,
            boundaries,
            running_length: 0,
            frame_index: 0,
            pending: Vec::new(),
            frames_emitted: 0,
            done: false,
        })
    }

    /// The Basic Offset Table read from the stream
    pub fn offset_table(&self) -> &OffsetTable {
        &self.table
    }

    /// The strategy used to locate frame boundaries
    pub fn strategy(&self) -> FrameStrategy {
        self.strategy
    }

    /// Number of fragments, when it had to be counted up front
    pub fn fragment_count(&self) -> Option<usize> {
        self.fragment_count
    }

    /// Diagnostics raised so far
    pub fn diagnostics(&self) -> &Diagnostics {
        self.fragments.diagnostics()
    }

    /// Consume the iterator, returning its diagnostics
    pub fn into_diagnostics(self) -> Diagnostics {
        self.fragments.into_diagnostics()
    }

    /// Yield each frame as one contiguous buffer instead of its fragments
    pub fn defragmented(self) -> DefragmentedFrames {
        DefragmentedFrames { frames: self }
    }

    fn finish(&mut self) -> Option<Result<Frame, EncapsError>> {
        self.done = true;
        if self.pending.is_empty() {
            None
        } else {
            self.frames_emitted += 1;
            Some(Ok(Frame::new(core::mem::take(&mut self.pending))))
        }
    }

    fn fail(&mut self, err: EncapsError) -> Option<Result<Frame, EncapsError>> {
        self.done = true;
        self.pending.clear();
        Some(Err(err))
    }

    fn next_by_offset_table(&mut self) -> Option<Result<Frame, EncapsError>> {
        loop {
            let fragment = match self.fragments.next() {
                Some(Ok(fragment)) => fragment,
                Some(Err(e)) => return self.fail(e),
                None => return self.finish(),
            };

            let boundary = self
                .boundaries
                .get(self.frame_index + 1)
                .copied()
                .unwrap_or(u64::MAX);
            let starts_frame = self.running_length >= boundary;
            self.running_length += item_size(fragment.len()) as u64;

            if starts_frame {
                self.frame_index += 1;
                if !self.pending.is_empty() {
                    let frame = core::mem::replace(&mut self.pending, alloc::vec![fragment]);
                    self.frames_emitted += 1;
                    return Some(Ok(Frame::new(frame)));
                }
            }
            self.pending.push(fragment);
        }
    }

    fn next_one_per_fragment(&mut self) -> Option<Result<Frame, EncapsError>> {
        match self.fragments.next() {
            Some(Ok(fragment)) => {
                self.frames_emitted += 1;
                Some(Ok(Frame::new(alloc::vec![fragment])))
            }
            Some(Err(e)) => self.fail(e),
            None => self.finish(),
        }
    }

    fn next_all_in_one(&mut self) -> Option<Result<Frame, EncapsError>> {
        loop {
            match self.fragments.next() {
                Some(Ok(fragment)) => self.pending.push(fragment),
                Some(Err(e)) => return self.fail(e),
                None => return self.finish(),
            }
        }
    }

    fn next_by_marker(&mut self) -> Option<Result<Frame, EncapsError>> {
        loop {
            match self.fragments.next() {
                Some(Ok(fragment)) => {
                    let closes = ends_codestream(&fragment);
                    self.pending.push(fragment);
                    if closes {
                        self.frames_emitted += 1;
                        return Some(Ok(Frame::new(core::mem::take(&mut self.pending))));
                    }
                }
                Some(Err(e)) => return self.fail(e),
                None => {
                    let expected = self.frame_count.unwrap_or(0);
                    if !self.pending.is_empty() || self.frames_emitted != expected {
                        let frames_found = self.frames_emitted;
                        let trailing_fragments = self.pending.len();
                        self.fragments
                            .diagnostics_mut()
                            .push(Diagnostic::MissedFrameBoundary {
                                frames_found,
                                frames_expected: expected,
                                trailing_fragments,
                            });
                    }
                    return self.finish();
                }
            }
        }
    }
}

impl Iterator for FrameIterator {
    type Item = Result<Frame, EncapsError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        match self.strategy {
            FrameStrategy::OffsetTable => self.next_by_offset_table(),
            FrameStrategy::SingleFragment | FrameStrategy::OnePerFrame => {
                self.next_one_per_fragment()
            }
            FrameStrategy::AllInOne => self.next_all_in_one(),
            FrameStrategy::MarkerSearch => self.next_by_marker(),
            FrameStrategy::Empty => {
                self.done = true;
                None
            }
        }
    }
}

impl core::iter::FusedIterator for FrameIterator {}

/// Frames joined into one buffer each
#[derive(Debug)]
pub struct DefragmentedFrames {
    frames: FrameIterator,
}

impl DefragmentedFrames {
    /// The strategy used to locate frame boundaries
    pub fn strategy(&self) -> FrameStrategy {
        self.frames.strategy()
    }

    /// Diagnostics raised so far
    pub fn diagnostics(&self) -> &Diagnostics {
        self.frames.diagnostics()
    }

    /// Consume the iterator, returning its diagnostics
    pub fn into_diagnostics(self) -> Diagnostics {
        self.frames.into_diagnostics()
    }
}

impl Iterator for DefragmentedFrames {
    type Item = Result<Bytes, EncapsError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.frames.next().map(|frame| frame.map(|f| f.defragment()))
    }
}

impl core::iter::FusedIterator for DefragmentedFrames {}
