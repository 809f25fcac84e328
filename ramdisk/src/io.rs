//! Page-bounded read and write
//!
//! Both directions walk the page sequence starting at `offset / page_size`,
//! copying at most one page worth of bytes per step. Only the first page is
//! entered at a non-zero in-page offset.
//!
//! The copy primitive is abstracted by [`ReadSink`] and [`WriteSource`]. A
//! sink or source that moves fewer bytes than offered ends the transfer with
//! [`StoreError::ShortTransfer`] carrying the partial count.

use crate::error::StoreError;
use crate::store::PagedStore;

/// Destination of a read
pub trait ReadSink {
    /// Copy `data` to position `at` of the destination.
    ///
    /// Returns the number of bytes accepted, which may be less than
    /// `data.len()`.
    fn put(&mut self, at: usize, data: &[u8]) -> usize;
}

/// Source of a write
pub trait WriteSource {
    /// Fill `into` from position `at` of the source.
    ///
    /// Returns the number of bytes produced, which may be less than
    /// `into.len()`.
    fn take(&mut self, at: usize, into: &mut [u8]) -> usize;
}

impl ReadSink for [u8] {
    fn put(&mut self, at: usize, data: &[u8]) -> usize {
        let Some(dst) = self.get_mut(at..) else {
            return 0;
        };
        let n = dst.len().min(data.len());
        if let (Some(dst), Some(src)) = (dst.get_mut(..n), data.get(..n)) {
            dst.copy_from_slice(src);
        }
        n
    }
}

/// Write source over a borrowed slice
pub struct SliceSource<'a>(pub &'a [u8]);

impl WriteSource for SliceSource<'_> {
    fn take(&mut self, at: usize, into: &mut [u8]) -> usize {
        let Some(src) = self.0.get(at..) else {
            return 0;
        };
        let n = src.len().min(into.len());
        if let (Some(dst), Some(src)) = (into.get_mut(..n), src.get(..n)) {
            dst.copy_from_slice(src);
        }
        n
    }
}

fn page_window_error(page_offset: usize, chunk: usize) -> StoreError {
    let reason = format!("page window {page_offset}+{chunk} is outside the page");
    log::error!("{reason}");
    StoreError::CorruptState(reason)
}

/// Read up to `length` bytes at `offset` into `dst`.
///
/// Returns 0 at or past the end of the data. The length is clamped to the
/// data that exists.
///
/// # Errors
///
/// - `ShortTransfer` if `dst` accepts fewer bytes than offered
/// - `CorruptState` if the page sequence does not cover the data size
pub fn read<S: ReadSink + ?Sized>(
    store: &PagedStore,
    offset: usize,
    length: usize,
    dst: &mut S,
) -> Result<usize, StoreError> {
    let plan = store.plan_read(offset, length)?;
    let page_size = store.page_size();
    let mut page_offset = offset % page_size;
    let mut done = 0;

    for page in &plan.pages {
        if done == plan.length {
            break;
        }
        let chunk = (page_size - page_offset).min(plan.length - done);
        let copied = {
            let bytes = page.lock();
            let Some(src) = bytes.get(page_offset..page_offset + chunk) else {
                return Err(page_window_error(page_offset, chunk));
            };
            dst.put(done, src)
        };
        done += copied;
        if copied < chunk {
            return Err(StoreError::ShortTransfer {
                transferred: done,
                requested: plan.length,
            });
        }
        page_offset = 0;
    }

    if done < plan.length {
        let reason = format!("pages ran out after {done} of {} bytes", plan.length);
        log::error!("{reason}");
        return Err(StoreError::CorruptState(reason));
    }
    Ok(done)
}

/// Write `length` bytes from `src` at `offset`, appending pages on demand.
///
/// Writing exactly at the data size appends; writing past it is refused.
/// A page is appended only when the copy reaches it, so a write that stops
/// early leaves no unused pages behind. The logical size grows to cover
/// whatever was written, even when the write stops early. A concurrent
/// truncate ends the write at the bytes copied so far.
///
/// # Errors
///
/// - `InvalidArgument` if `offset` is past the data size
/// - `OutOfMemory { written }` if a page could not be allocated
/// - `ShortTransfer` if `src` produces fewer bytes than requested
pub fn write<S: WriteSource + ?Sized>(
    store: &PagedStore,
    offset: usize,
    length: usize,
    src: &mut S,
) -> Result<usize, StoreError> {
    let generation = store.begin_write(offset, length)?;
    let page_size = store.page_size();
    let mut done = 0;
    let mut failure = None;

    while done < length {
        let pos = offset + done;
        let page_offset = pos % page_size;
        let page = match store.page_for_write(generation, pos / page_size) {
            Ok(Some(page)) => page,
            Ok(None) => break,
            Err(e) => {
                failure = Some(e);
                break;
            }
        };
        let chunk = (page_size - page_offset).min(length - done);
        let copied = {
            let mut bytes = page.lock();
            let Some(dst) = bytes.get_mut(page_offset..page_offset + chunk) else {
                failure = Some(page_window_error(page_offset, chunk));
                break;
            };
            src.take(done, dst)
        };
        done += copied;
        if copied < chunk {
            failure = Some(StoreError::ShortTransfer {
                transferred: done,
                requested: length,
            });
            break;
        }
    }

    store.commit_write(generation, offset + done)?;

    match failure {
        None => Ok(done),
        Some(StoreError::OutOfMemory { .. }) => Err(StoreError::OutOfMemory { written: done }),
        Some(e) => Err(e),
    }
}
