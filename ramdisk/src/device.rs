//! Device boundary
//!
//! [`Device`] ties the components together behind the calls an OS
//! integration layer would make: open/close through the admission gate,
//! cursor-based and positional I/O, seek, control commands, page export and
//! the status report. One `Device` is created at init and passed by
//! reference; [`Device::teardown`] releases everything.
//!
//! # Thread Safety
//!
//! Every method takes `&self`. Each open handle has its own lock around its
//! cursor, so concurrent calls on one handle are serialised while calls on
//! different handles only meet at the store's structural lock.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::admission::AccessAdmission;
use crate::config::{ConfigError, DeviceConfig};
use crate::control::ControlCommand;
use crate::error::StoreError;
use crate::file::DeviceFile;
use crate::idgen::{HandleId, IdGen};
use crate::io::{self, ReadSink, SliceSource, WriteSource};
use crate::mmap;
use crate::page::PageRef;
use crate::seek::{self, Whence};
use crate::status::StatusSnapshot;
use crate::store::PagedStore;

/// Access mode requested at open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Read only
    ReadOnly,
    /// Write only; discards all stored data on open
    WriteOnly,
    /// Read and write, keeping the stored data
    ReadWrite,
}

impl AccessMode {
    #[must_use]
    pub fn can_read(self) -> bool {
        matches!(self, Self::ReadOnly | Self::ReadWrite)
    }

    #[must_use]
    pub fn can_write(self) -> bool {
        matches!(self, Self::WriteOnly | Self::ReadWrite)
    }
}

impl FromStr for AccessMode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "r" => Ok(Self::ReadOnly),
            "w" => Ok(Self::WriteOnly),
            "rw" => Ok(Self::ReadWrite),
            _ => Err(StoreError::invalid(format!("unknown access mode '{s}'"))),
        }
    }
}

struct OpenHandle {
    mode: AccessMode,
    cursor: usize,
}

fn transferred(result: &Result<usize, StoreError>) -> usize {
    match result {
        Ok(n) => *n,
        Err(e) => e.transferred(),
    }
}

pub struct Device {
    config: DeviceConfig,
    store: PagedStore,
    admission: AccessAdmission,
    handles: Mutex<HashMap<HandleId, Arc<Mutex<OpenHandle>>>>,
    id_gen: IdGen,
}

impl Device {
    /// Create an empty device.
    ///
    /// # Errors
    ///
    /// Returns an error if the config fails validation.
    pub fn new(config: DeviceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::info!(
            "{}: ready, page size {}, handle limit {}",
            config.name,
            config.page_size,
            config.max_handles
        );
        Ok(Self {
            store: PagedStore::new(config.page_size, config.max_pages),
            admission: AccessAdmission::new(config.max_handles),
            handles: Mutex::new(HashMap::new()),
            id_gen: IdGen::new(),
            config,
        })
    }

    #[must_use]
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &PagedStore {
        &self.store
    }

    /// Open a handle with its cursor at 0.
    ///
    /// A write-only open truncates the store once admission succeeds.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if the handle limit is reached.
    pub fn open(&self, mode: AccessMode) -> Result<HandleId, StoreError> {
        self.admission.open()?;
        if mode == AccessMode::WriteOnly {
            self.store.truncate_all();
        }
        let id = self.id_gen.get_next();
        self.handles
            .lock()
            .insert(id, Arc::new(Mutex::new(OpenHandle { mode, cursor: 0 })));
        log::debug!("{}: opened handle {id} ({mode:?})", self.config.name);
        Ok(id)
    }

    /// Open a handle wrapped in a [`DeviceFile`] that closes on drop.
    ///
    /// # Errors
    ///
    /// Returns `Busy` if the handle limit is reached.
    pub fn open_file(&self, mode: AccessMode) -> Result<DeviceFile<'_>, StoreError> {
        let id = self.open(mode)?;
        Ok(DeviceFile::new(self, id))
    }

    /// Close a handle and release its admission slot.
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if `id` is not open.
    pub fn close(&self, id: HandleId) -> Result<(), StoreError> {
        if self.handles.lock().remove(&id).is_none() {
            log::warn!("{}: close of unknown handle {id}", self.config.name);
            return Err(StoreError::BadHandle);
        }
        self.admission.close();
        log::debug!("{}: closed handle {id}", self.config.name);
        Ok(())
    }

    fn handle(&self, id: HandleId) -> Result<Arc<Mutex<OpenHandle>>, StoreError> {
        self.handles
            .lock()
            .get(&id)
            .cloned()
            .ok_or(StoreError::BadHandle)
    }

    /// Read at the handle cursor, advancing it by the bytes read.
    ///
    /// # Errors
    ///
    /// See [`io::read`]; also `BadHandle` for an unknown or write-only handle.
    pub fn read(&self, id: HandleId, buf: &mut [u8]) -> Result<usize, StoreError> {
        let length = buf.len();
        self.read_with(id, length, buf)
    }

    /// [`Device::read`] through a custom copy primitive
    ///
    /// # Errors
    ///
    /// See [`Device::read`].
    pub fn read_with<S: ReadSink + ?Sized>(
        &self,
        id: HandleId,
        length: usize,
        dst: &mut S,
    ) -> Result<usize, StoreError> {
        let handle = self.handle(id)?;
        let mut handle = handle.lock();
        if !handle.mode.can_read() {
            return Err(StoreError::BadHandle);
        }
        let result = io::read(&self.store, handle.cursor, length, dst);
        handle.cursor += transferred(&result);
        result
    }

    /// Write at the handle cursor, advancing it by the bytes written.
    ///
    /// # Errors
    ///
    /// See [`io::write`]; also `BadHandle` for an unknown or read-only handle.
    pub fn write(&self, id: HandleId, data: &[u8]) -> Result<usize, StoreError> {
        self.write_with(id, data.len(), &mut SliceSource(data))
    }

    /// [`Device::write`] through a custom copy primitive
    ///
    /// # Errors
    ///
    /// See [`Device::write`].
    pub fn write_with<S: WriteSource + ?Sized>(
        &self,
        id: HandleId,
        length: usize,
        src: &mut S,
    ) -> Result<usize, StoreError> {
        let handle = self.handle(id)?;
        let mut handle = handle.lock();
        if !handle.mode.can_write() {
            return Err(StoreError::BadHandle);
        }
        let result = io::write(&self.store, handle.cursor, length, src);
        handle.cursor += transferred(&result);
        result
    }

    /// Read at an explicit offset; the cursor is not moved.
    ///
    /// # Errors
    ///
    /// See [`Device::read`].
    pub fn read_at(
        &self,
        id: HandleId,
        offset: usize,
        buf: &mut [u8],
    ) -> Result<usize, StoreError> {
        let handle = self.handle(id)?;
        if !handle.lock().mode.can_read() {
            return Err(StoreError::BadHandle);
        }
        let length = buf.len();
        io::read(&self.store, offset, length, buf)
    }

    /// Write at an explicit offset; the cursor is not moved.
    ///
    /// # Errors
    ///
    /// See [`Device::write`].
    pub fn write_at(
        &self,
        id: HandleId,
        offset: usize,
        data: &[u8],
    ) -> Result<usize, StoreError> {
        let handle = self.handle(id)?;
        if !handle.lock().mode.can_write() {
            return Err(StoreError::BadHandle);
        }
        io::write(&self.store, offset, data.len(), &mut SliceSource(data))
    }

    /// Move the handle cursor; returns the new, clamped position.
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if `id` is not open.
    pub fn seek(&self, id: HandleId, whence: Whence, offset: i64) -> Result<usize, StoreError> {
        let handle = self.handle(id)?;
        let mut handle = handle.lock();
        handle.cursor = seek::seek(self.store.sizes(), handle.cursor, whence, offset);
        Ok(handle.cursor)
    }

    /// Current cursor of a handle.
    ///
    /// # Errors
    ///
    /// Returns `BadHandle` if `id` is not open.
    pub fn tell(&self, id: HandleId) -> Result<usize, StoreError> {
        Ok(self.handle(id)?.lock().cursor)
    }

    /// Change the limit on concurrently open handles.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `new_bound` is negative or does not fit `u32`
    /// - `Rejected` if it is below the number of open handles
    pub fn set_max_concurrent(&self, new_bound: i64) -> Result<(), StoreError> {
        let bound = u32::try_from(new_bound)
            .map_err(|_| StoreError::invalid(format!("handle limit {new_bound} out of range")))?;
        self.admission.set_max_allowed(bound)?;
        log::info!("{}: handle limit set to {bound}", self.config.name);
        Ok(())
    }

    /// Run a control command.
    ///
    /// # Errors
    ///
    /// Returns the decode error for an unknown command, or the command's own
    /// error.
    pub fn control(&self, cmd: u32, arg: i64) -> Result<i64, StoreError> {
        match ControlCommand::decode(cmd)? {
            ControlCommand::SetMaxHandles => self.set_max_concurrent(arg).map(|()| 0),
        }
    }

    /// Pages backing a page-aligned window, for a shared mapping.
    ///
    /// # Errors
    ///
    /// See [`mmap::export_pages`].
    pub fn export_pages(&self, offset: usize, length: usize) -> Result<Vec<PageRef>, StoreError> {
        mmap::export_pages(&self.store, offset, length)
    }

    #[must_use]
    pub fn status(&self) -> StatusSnapshot {
        let sizes = self.store.sizes();
        let (active_count, max_allowed) = self.admission.snapshot();
        StatusSnapshot {
            name: self.config.name.clone(),
            page_size: sizes.page_size,
            num_pages: sizes.num_pages,
            data_size: sizes.data_size,
            active_count,
            max_allowed,
        }
    }

    /// Release all pages and handles; returns the status just before.
    pub fn teardown(self) -> StatusSnapshot {
        let status = self.status();
        let open = self.handles.lock().len();
        if open > 0 {
            log::warn!("{}: teardown with {open} handles still open", self.config.name);
        }
        self.store.truncate_all();
        log::info!("{}: released {} pages", self.config.name, status.num_pages);
        status
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn device(max_handles: u32) -> Device {
        Device::new(
            DeviceConfig::new()
                .with_page_size(64)
                .with_max_handles(max_handles),
        )
        .unwrap()
    }

    #[test]
    fn test_cursor_advances() {
        let dev = device(1);
        let id = dev.open(AccessMode::ReadWrite).unwrap();
        assert_eq!(dev.write(id, b"hello ").unwrap(), 6);
        assert_eq!(dev.write(id, b"world").unwrap(), 5);
        assert_eq!(dev.tell(id).unwrap(), 11);

        dev.seek(id, Whence::Start, 0).unwrap();
        let mut buf = [0u8; 32];
        let n = dev.read(id, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"hello world");
        assert_eq!(dev.read(id, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_access_direction_enforced() {
        let dev = device(2);
        let w = dev.open(AccessMode::WriteOnly).unwrap();
        let r = dev.open(AccessMode::ReadOnly).unwrap();
        let mut buf = [0u8; 4];
        assert_eq!(dev.read(w, &mut buf).unwrap_err(), StoreError::BadHandle);
        assert_eq!(dev.write(r, b"x").unwrap_err(), StoreError::BadHandle);
    }

    #[test]
    fn test_unknown_handle() {
        let dev = device(1);
        let id = dev.open(AccessMode::ReadOnly).unwrap();
        dev.close(id).unwrap();
        assert_eq!(dev.close(id).unwrap_err(), StoreError::BadHandle);
        assert_eq!(dev.tell(id).unwrap_err(), StoreError::BadHandle);
        assert_eq!(dev.status().active_count, 0);
    }

    #[test]
    fn test_access_mode_from_str() {
        assert_eq!("rw".parse::<AccessMode>().unwrap(), AccessMode::ReadWrite);
        assert!("x".parse::<AccessMode>().is_err());
    }

    #[test]
    fn test_negative_bound_rejected_before_gate() {
        let dev = device(1);
        let err = dev.set_max_concurrent(-1).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)));
        assert_eq!(dev.status().max_allowed, 1);
    }

    #[test]
    fn test_teardown_reports_and_releases() {
        let dev = device(1);
        let id = dev.open(AccessMode::ReadWrite).unwrap();
        dev.write(id, &[7u8; 100]).unwrap();
        let status = dev.teardown();
        assert_eq!(status.num_pages, 2);
        assert_eq!(status.data_size, 100);
    }
}
