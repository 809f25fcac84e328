//! Cursor positioning
//!
//! The new position is clamped to `[0, capacity]`. A cursor may sit past the
//! logical data size (up to the allocated capacity) so that a following write
//! can extend the data from there; seeking never allocates.

use crate::error::StoreError;
use crate::store::StoreSizes;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    /// Relative to byte 0
    Start,
    /// Relative to the current cursor
    Current,
    /// Relative to the logical data size
    End,
}

impl Whence {
    /// Decode the `SEEK_SET`/`SEEK_CUR`/`SEEK_END` numbering.
    ///
    /// # Errors
    ///
    /// Returns `InvalidArgument` for any other value.
    pub fn from_raw(raw: i32) -> Result<Self, StoreError> {
        match raw {
            0 => Ok(Self::Start),
            1 => Ok(Self::Current),
            2 => Ok(Self::End),
            _ => Err(StoreError::invalid(format!("unknown seek whence {raw}"))),
        }
    }

    /// Split an `embedded_io::SeekFrom` into whence and signed offset
    #[must_use]
    pub fn from_seek_from(pos: embedded_io::SeekFrom) -> (Self, i64) {
        match pos {
            embedded_io::SeekFrom::Start(offset) => {
                (Self::Start, i64::try_from(offset).unwrap_or(i64::MAX))
            }
            embedded_io::SeekFrom::Current(offset) => (Self::Current, offset),
            embedded_io::SeekFrom::End(offset) => (Self::End, offset),
        }
    }
}

/// Compute a clamped cursor position
#[must_use]
pub fn seek(sizes: StoreSizes, current: usize, whence: Whence, offset: i64) -> usize {
    let base = match whence {
        Whence::Start => 0,
        Whence::Current => current,
        Whence::End => sizes.data_size,
    };
    let target = base as i128 + i128::from(offset);
    let capacity = sizes.capacity();
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let pos = target.clamp(0, capacity as i128) as usize;
    log::debug!("seek {whence:?}{offset:+} from {current} -> {pos} (capacity {capacity})");
    pos
}

/// [`seek`] with a raw whence value.
///
/// # Errors
///
/// Returns `InvalidArgument` if `whence` is not 0, 1 or 2.
pub fn seek_raw(
    sizes: StoreSizes,
    current: usize,
    whence: i32,
    offset: i64,
) -> Result<usize, StoreError> {
    Ok(seek(sizes, current, Whence::from_raw(whence)?, offset))
}
