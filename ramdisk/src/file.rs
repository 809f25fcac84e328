//! RAII handle with `embedded_io` traits
//!
//! Partial transfers follow the usual short-read/short-write convention:
//! if any bytes moved, the count is returned as `Ok`, and the error only
//! surfaces when nothing moved.

use embedded_io::{ErrorType, SeekFrom};
use std::fmt;

use crate::device::Device;
use crate::error::StoreError;
use crate::idgen::HandleId;
use crate::seek::Whence;

fn short_ok(result: Result<usize, StoreError>) -> Result<usize, StoreError> {
    match result {
        Err(e) if e.transferred() > 0 => Ok(e.transferred()),
        other => other,
    }
}

/// Open device handle that closes itself on drop
pub struct DeviceFile<'d> {
    device: &'d Device,
    id: HandleId,
}

impl<'d> DeviceFile<'d> {
    pub(crate) fn new(device: &'d Device, id: HandleId) -> Self {
        Self { device, id }
    }

    #[must_use]
    pub fn id(&self) -> HandleId {
        self.id
    }

    #[must_use]
    pub fn device(&self) -> &'d Device {
        self.device
    }

    /// Cursor position
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if the handle was closed behind this wrapper.
    pub fn position(&self) -> Result<usize, StoreError> {
        self.device.tell(self.id)
    }
}

impl Drop for DeviceFile<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.device.close(self.id) {
            log::warn!("DeviceFile drop: close of handle {} failed: {e}", self.id);
        }
    }
}

impl fmt::Debug for DeviceFile<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "DeviceFile(device={}, handle={})",
            self.device.config().name,
            self.id
        )
    }
}

impl ErrorType for DeviceFile<'_> {
    type Error = StoreError;
}

impl embedded_io::Read for DeviceFile<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        short_ok(self.device.read(self.id, buf))
    }
}

impl embedded_io::Write for DeviceFile<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        short_ok(self.device.write(self.id, buf))
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl embedded_io::Seek for DeviceFile<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let (whence, offset) = Whence::from_seek_from(pos);
        let pos = self.device.seek(self.id, whence, offset)?;
        Ok(pos as u64)
    }
}

impl embedded_io_async::Read for DeviceFile<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        short_ok(self.device.read(self.id, buf))
    }
}

impl embedded_io_async::Write for DeviceFile<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        short_ok(self.device.write(self.id, buf))
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
