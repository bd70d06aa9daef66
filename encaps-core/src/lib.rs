//! # Encaps Core
//!
//! Reading and writing the encapsulated (compressed) form of Pixel Data: a
//! Basic Offset Table item followed by one item per fragment, optionally
//! closed by a Sequence Delimiter.
//!
//! ## Modules
//!
//! - `constants`: Tags, sentinels and limits of the item format
//! - `types`: Core types (Tag, OffsetTable, Frame, DecodeOptions)
//! - `reader`: Item-level reading
//! - `offset_table`: Basic Offset Table parsing
//! - `fragments`: Fragment iteration and counting
//! - `frames`: Frame boundary detection
//! - `decoder`: Whole-stream decoding helpers
//! - `encoder`: Fragmentation and encapsulation
//! - `extended`: Extended Offset Table
//! - `diagnostics`: Recoverable anomalies reported during decoding

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]

extern crate alloc;

pub mod constants;
pub mod decoder;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod extended;
pub mod fragments;
pub mod frames;
pub mod offset_table;
pub mod reader;
pub mod types;

// Re-export commonly used types
pub use decoder::{decode_frames, DecodedFrames, EncapsulatedStream};
pub use diagnostics::{Diagnostic, Diagnostics};
pub use encoder::{encapsulate, encapsulate_extended, EncapsulationBuilder};
pub use error::{EncapsError, ErrorKind};
pub use extended::ExtendedOffsetTable;
pub use frames::{FrameIterator, FrameStrategy};
pub use types::{DecodeOptions, Frame, OffsetTable, ParseMode, Tag};

/// Result type alias for encapsulation operations
pub type Result<T> = core::result::Result<T, EncapsError>;
