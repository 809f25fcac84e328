//! Control commands in the Linux ioctl numbering
//!
//! ```text
//!  31 30 29        16 15      8 7       0
//! +-----+------------+---------+---------+
//! | dir |    size    |  type   |   nr    |
//! +-----+------------+---------+---------+
//! ```
//!
//! All commands of this device use type byte `'k'`.

use crate::error::StoreError;

/// Type byte shared by every command of this device
pub const IOC_TYPE: u8 = b'k';

const IOC_NRSHIFT: u32 = 0;
const IOC_TYPESHIFT: u32 = 8;
const IOC_SIZESHIFT: u32 = 16;
const IOC_DIRSHIFT: u32 = 30;
const IOC_SIZEMASK: u32 = (1 << 14) - 1;

/// Caller passes data to the device
pub const IOC_WRITE: u32 = 1;

const SET_MAX_HANDLES_NR: u8 = 1;

/// Build a command number
#[must_use]
pub const fn ioc(dir: u32, ty: u8, nr: u8, size: u32) -> u32 {
    (dir << IOC_DIRSHIFT)
        | ((size & IOC_SIZEMASK) << IOC_SIZESHIFT)
        | ((ty as u32) << IOC_TYPESHIFT)
        | ((nr as u32) << IOC_NRSHIFT)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    /// Change the limit on concurrently open handles; the argument is the
    /// new limit.
    SetMaxHandles,
}

impl ControlCommand {
    #[must_use]
    pub const fn encode(self) -> u32 {
        match self {
            Self::SetMaxHandles => ioc(IOC_WRITE, IOC_TYPE, SET_MAX_HANDLES_NR, 4),
        }
    }

    /// Decode a command number.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the type byte is not this device's
    /// - `NotSupported` for an unknown command of this device
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode(raw: u32) -> Result<Self, StoreError> {
        let ty = (raw >> IOC_TYPESHIFT) as u8;
        if ty != IOC_TYPE {
            return Err(StoreError::invalid(format!(
                "control command {raw:#x} has type {ty:#x}, expected {IOC_TYPE:#x}"
            )));
        }
        let nr = (raw >> IOC_NRSHIFT) as u8;
        let dir = raw >> IOC_DIRSHIFT;
        match (nr, dir) {
            (SET_MAX_HANDLES_NR, IOC_WRITE) => Ok(Self::SetMaxHandles),
            _ => Err(StoreError::NotSupported(raw)),
        }
    }
}
