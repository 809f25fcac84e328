//! Paged in-memory block device
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │  Device (boundary)                  │
//! │  - open/close, handle cursors       │
//! │  - control commands, status         │
//! └─────────────────────────────────────┘
//!      │            │             │
//!      ▼            ▼             ▼
//! ┌──────────┐ ┌─────────┐ ┌────────────┐
//! │Admission │ │ io/seek │ │    mmap    │
//! │ (atomic) │ │         │ │  (export)  │
//! └──────────┘ └─────────┘ └────────────┘
//!                   │             │
//!                   ▼             ▼
//! ┌─────────────────────────────────────┐
//! │  PagedStore                         │
//! │  - Vec<Page> + data size            │
//! │  - one structural lock              │
//! └─────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use ramdisk::{AccessMode, Device, DeviceConfig};
//!
//! let device = Device::new(DeviceConfig::new().with_max_handles(2)).unwrap();
//! let id = device.open(AccessMode::ReadWrite).unwrap();
//! device.write(id, b"hello").unwrap();
//!
//! let mut buf = [0u8; 5];
//! device.read_at(id, 0, &mut buf).unwrap();
//! assert_eq!(&buf, b"hello");
//! device.close(id).unwrap();
//! ```

pub mod admission;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod file;
pub mod idgen;
pub mod io;
pub mod mmap;
pub mod page;
pub mod seek;
pub mod status;
pub mod store;

pub use admission::AccessAdmission;
pub use config::{ConfigError, DeviceConfig, PAGE_SIZE};
pub use control::ControlCommand;
pub use device::{AccessMode, Device};
pub use error::StoreError;
pub use file::DeviceFile;
pub use idgen::{HandleId, IdGen};
pub use io::{ReadSink, SliceSource, WriteSource};
pub use page::{Page, PageRef};
pub use seek::Whence;
pub use status::StatusSnapshot;
pub use store::{PagedStore, StoreSizes};
