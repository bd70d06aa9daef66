//! Basic Offset Table parsing
//!
//! The Basic Offset Table is the mandatory first item of the sequence. It
//! may be empty:
//!
//! ```text
//! Item Tag   | Length    |
//! FE FF 00 E0 00 00 00 00
//! ```
//!
//! or carry one 32-bit offset per frame:
//!
//! ```text
//! Item Tag   | Length    | Offset 1  | Offset 2  |
//! FE FF 00 E0 08 00 00 00 00 00 00 00 10 00 00 00
//! ```

use crate::constants::{BASIC_OFFSET_SIZE, ITEM_TAG};
use crate::diagnostics::Diagnostic;
use crate::error::EncapsError;
use crate::reader::ItemReader;
use crate::types::OffsetTable;
use alloc::vec::Vec;

#[cfg(feature = "logging")]
use tracing::debug;

/// Read the Basic Offset Table item.
///
/// `reader` must be positioned at the first item of the sequence. On success
/// it is left at the first fragment item. An empty table still reports the
/// single offset `0`. Offsets that do not start at zero or that decrease
/// are kept as read and reported as a diagnostic.
pub fn parse_offset_table(reader: &mut ItemReader) -> Result<OffsetTable, EncapsError> {
    let tag_offset = reader.position();
    let tag = reader.read_tag()?.ok_or(EncapsError::Truncated {
        offset: tag_offset,
        expected: 4,
        actual: 0,
    })?;

    if tag != ITEM_TAG {
        return Err(EncapsError::UnexpectedTag {
            tag,
            offset: tag_offset,
        });
    }

    let length = reader.read_u32()?;
    if length as usize % BASIC_OFFSET_SIZE != 0 {
        return Err(EncapsError::BadOffsetTableLength(length));
    }

    if length == 0 {
        #[cfg(feature = "logging")]
        debug!("Basic Offset Table is empty");

        return Ok(OffsetTable::empty());
    }

    let count = length as usize / BASIC_OFFSET_SIZE;
    if reader.remaining() < length as usize {
        return Err(EncapsError::Truncated {
            offset: reader.position(),
            expected: length as usize,
            actual: reader.remaining(),
        });
    }

    let value_offset = reader.position();
    let mut offsets = Vec::with_capacity(count);
    for _ in 0..count {
        offsets.push(reader.read_u32()?);
    }

    #[cfg(feature = "logging")]
    debug!("Basic Offset Table has {} entries", offsets.len());

    let table = OffsetTable::with_offsets(offsets);
    if !table.is_well_formed() {
        let diagnostic = Diagnostic::NonMonotonicOffsets { offset: value_offset };
        reader.diagnostics_mut().push(diagnostic);
    }
    Ok(table)
}
