//! Error type shared by every ramdisk operation
//!
//! Partial transfers are errors that still carry the byte count moved before
//! the failure, so callers can apply short-read/short-write semantics.

use std::io;

const EIO: i32 = 5;
const ENXIO: i32 = 6;
const EBADF: i32 = 9;
const ENOMEM: i32 = 12;
const EFAULT: i32 = 14;
const EBUSY: i32 = 16;
const EINVAL: i32 = 22;
const ENOTTY: i32 = 25;

/// Error type for store, admission and device operations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("device busy: open handle limit reached")]
    Busy,

    #[error("out of memory after writing {written} bytes")]
    OutOfMemory { written: usize },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("cannot lower handle limit to {requested} with {active} handles open")]
    Rejected { requested: u32, active: u32 },

    #[error("short transfer: {transferred} of {requested} bytes")]
    ShortTransfer { transferred: usize, requested: usize },

    #[error("bad handle")]
    BadHandle,

    #[error("unsupported control command {0:#x}")]
    NotSupported(u32),

    #[error("page index {0} is not allocated")]
    PageNotFound(usize),

    #[error("corrupt store state: {0}")]
    CorruptState(String),
}

impl StoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Bytes moved before the operation stopped
    ///
    /// Only partial transfers carry a count; every other error is 0.
    #[must_use]
    pub fn transferred(&self) -> usize {
        match self {
            Self::OutOfMemory { written } => *written,
            Self::ShortTransfer { transferred, .. } => *transferred,
            _ => 0,
        }
    }

    /// Linux errno equivalent, for callers that speak the syscall convention
    #[must_use]
    pub fn errno(&self) -> i32 {
        match self {
            Self::Busy => EBUSY,
            Self::OutOfMemory { .. } => ENOMEM,
            Self::InvalidArgument(_) | Self::Rejected { .. } => EINVAL,
            Self::ShortTransfer { .. } => EFAULT,
            Self::BadHandle => EBADF,
            Self::NotSupported(_) => ENOTTY,
            Self::PageNotFound(_) => ENXIO,
            Self::CorruptState(_) => EIO,
        }
    }
}

impl embedded_io::Error for StoreError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            Self::OutOfMemory { .. } => embedded_io::ErrorKind::OutOfMemory,
            Self::InvalidArgument(_) | Self::Rejected { .. } | Self::BadHandle => {
                embedded_io::ErrorKind::InvalidInput
            }
            Self::NotSupported(_) => embedded_io::ErrorKind::Unsupported,
            Self::PageNotFound(_) => embedded_io::ErrorKind::NotFound,
            Self::CorruptState(_) => embedded_io::ErrorKind::InvalidData,
            Self::Busy | Self::ShortTransfer { .. } => embedded_io::ErrorKind::Other,
        }
    }
}

impl From<StoreError> for io::Error {
    fn from(e: StoreError) -> Self {
        io::Error::from_raw_os_error(e.errno())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_io::Error as _;

    #[test]
    fn test_partial_counts() {
        assert_eq!(StoreError::OutOfMemory { written: 7 }.transferred(), 7);
        let short = StoreError::ShortTransfer {
            transferred: 3,
            requested: 10,
        };
        assert_eq!(short.transferred(), 3);
        assert_eq!(StoreError::Busy.transferred(), 0);
    }

    #[test]
    fn test_errno_and_kind() {
        assert_eq!(StoreError::Busy.errno(), 16);
        assert_eq!(StoreError::invalid("whence").errno(), 22);
        let rejected = StoreError::Rejected {
            requested: 1,
            active: 2,
        };
        assert_eq!(rejected.errno(), 22);
        assert_eq!(StoreError::NotSupported(0).errno(), 25);
        assert_eq!(StoreError::CorruptState(String::new()).errno(), 5);
        assert_eq!(
            StoreError::OutOfMemory { written: 0 }.kind(),
            embedded_io::ErrorKind::OutOfMemory
        );
        assert_eq!(
            StoreError::NotSupported(0).kind(),
            embedded_io::ErrorKind::Unsupported
        );
    }

    #[test]
    fn test_into_io_error() {
        let e: io::Error = StoreError::BadHandle.into();
        assert_eq!(e.raw_os_error(), Some(9));
    }
}
