//! Paged backing store
//!
//! Owns the ordered page sequence and the logical size. A single structural
//! lock guards the sequence, `data_size` and the truncate generation. The
//! lock is only held to look up, append or release pages and to update the
//! size; byte copies happen on page handles after the lock is released.
//!
//! Invariant: `data_size <= num_pages * page_size`.

use parking_lot::Mutex;

use crate::error::StoreError;
use crate::page::{Page, PageRef};

/// Consistent view of the store sizes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreSizes {
    pub page_size: usize,
    pub num_pages: usize,
    pub data_size: usize,
}

impl StoreSizes {
    /// Physical capacity in bytes
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.num_pages * self.page_size
    }
}

struct Layout {
    pages: Vec<Page>,
    data_size: usize,
    /// Bumped by every truncate so in-flight writes can tell their pages
    /// were released under them.
    generation: u64,
}

/// Pages resolved for a read, with the clamped length
pub(crate) struct ReadPlan {
    pub length: usize,
    pub pages: Vec<Page>,
}

pub struct PagedStore {
    page_size: usize,
    max_pages: Option<usize>,
    layout: Mutex<Layout>,
}

impl PagedStore {
    #[must_use]
    pub fn new(page_size: usize, max_pages: Option<usize>) -> Self {
        Self {
            page_size,
            max_pages,
            layout: Mutex::new(Layout {
                pages: Vec::new(),
                data_size: 0,
                generation: 0,
            }),
        }
    }

    #[must_use]
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    #[must_use]
    pub fn num_pages(&self) -> usize {
        self.layout.lock().pages.len()
    }

    #[must_use]
    pub fn data_size(&self) -> usize {
        self.layout.lock().data_size
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.sizes().capacity()
    }

    /// Page count and logical size read under one lock
    #[must_use]
    pub fn sizes(&self) -> StoreSizes {
        let layout = self.layout.lock();
        StoreSizes {
            page_size: self.page_size,
            num_pages: layout.pages.len(),
            data_size: layout.data_size,
        }
    }

    /// Page at a logical index.
    ///
    /// # Errors
    ///
    /// Returns `PageNotFound` if the index is past the end of the sequence.
    pub fn page_at(&self, index: usize) -> Result<PageRef, StoreError> {
        let layout = self.layout.lock();
        layout
            .pages
            .get(index)
            .map(|page| PageRef::new(index, page.clone()))
            .ok_or(StoreError::PageNotFound(index))
    }

    /// Allocate one page and append it to the sequence.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the page limit is reached or allocation
    /// fails. The sequence is left unchanged in that case.
    pub fn append_page(&self) -> Result<PageRef, StoreError> {
        let mut layout = self.layout.lock();
        let page = self.append_locked(&mut layout)?;
        Ok(PageRef::new(layout.pages.len() - 1, page))
    }

    /// Release every page and reset both sizes to zero.
    pub fn truncate_all(&self) {
        let mut layout = self.layout.lock();
        let released = layout.pages.len();
        layout.pages = Vec::new();
        layout.data_size = 0;
        layout.generation = layout.generation.wrapping_add(1);
        drop(layout);
        log::debug!("store truncated, released {released} pages");
    }

    /// Raise the logical size to `new_size`; never shrinks.
    ///
    /// # Errors
    ///
    /// Returns `CorruptState` if `new_size` is beyond the allocated capacity.
    /// Capacity must be appended before the size may cover it.
    pub fn grow_data_size(&self, new_size: usize) -> Result<(), StoreError> {
        let mut layout = self.layout.lock();
        self.grow_locked(&mut layout, new_size)
    }

    /// Run `f` over the page sequence and logical size under the structural
    /// lock.
    pub(crate) fn with_pages<R>(&self, f: impl FnOnce(&[Page], usize) -> R) -> R {
        let layout = self.layout.lock();
        f(&layout.pages, layout.data_size)
    }

    /// Resolve the pages a read of `length` bytes at `offset` will touch.
    ///
    /// The length is clamped to the logical size; a read at or past the end
    /// resolves to an empty plan.
    pub(crate) fn plan_read(&self, offset: usize, length: usize) -> Result<ReadPlan, StoreError> {
        let layout = self.layout.lock();
        if offset >= layout.data_size || length == 0 {
            return Ok(ReadPlan {
                length: 0,
                pages: Vec::new(),
            });
        }
        let length = length.min(layout.data_size - offset);
        let first = offset / self.page_size;
        let last = (offset + length - 1) / self.page_size;
        let Some(pages) = layout.pages.get(first..=last) else {
            let reason = format!(
                "read needs pages {first}..={last} but only {} exist (data size {})",
                layout.pages.len(),
                layout.data_size
            );
            log::error!("{reason}");
            return Err(StoreError::CorruptState(reason));
        };
        Ok(ReadPlan {
            length,
            pages: pages.to_vec(),
        })
    }

    /// Check that a write of `length` bytes may start at `offset` and return
    /// the truncate generation it runs under.
    ///
    /// Nothing is allocated here; pages are appended one at a time by
    /// [`PagedStore::page_for_write`] as the copy reaches them.
    pub(crate) fn begin_write(&self, offset: usize, length: usize) -> Result<u64, StoreError> {
        let layout = self.layout.lock();
        if offset > layout.data_size {
            return Err(StoreError::invalid(format!(
                "write offset {offset} is past the data size {}",
                layout.data_size
            )));
        }
        if offset.checked_add(length).is_none() {
            return Err(StoreError::invalid("write range overflows"));
        }
        Ok(layout.generation)
    }

    /// Page at `index` for a write started under `generation`, appending it
    /// if `index` is one past the last page.
    ///
    /// Returns `None` once the store has been truncated since the write
    /// began; the write must stop there.
    ///
    /// # Errors
    ///
    /// - `OutOfMemory` if the page cannot be appended
    /// - `CorruptState` if `index` leaves a gap after the last page
    pub(crate) fn page_for_write(
        &self,
        generation: u64,
        index: usize,
    ) -> Result<Option<Page>, StoreError> {
        let mut layout = self.layout.lock();
        if layout.generation != generation {
            log::debug!("write at page {index} stopped by a concurrent truncate");
            return Ok(None);
        }
        if let Some(page) = layout.pages.get(index) {
            return Ok(Some(page.clone()));
        }
        if index == layout.pages.len() {
            return self.append_locked(&mut layout).map(Some);
        }
        let reason = format!(
            "write needs page {index} but only {} exist",
            layout.pages.len()
        );
        log::error!("{reason}");
        Err(StoreError::CorruptState(reason))
    }

    /// Record the end of a completed (possibly partial) write.
    ///
    /// If the store was truncated since the plan was made, the written pages
    /// are already gone and the size is left alone.
    pub(crate) fn commit_write(&self, generation: u64, end: usize) -> Result<(), StoreError> {
        let mut layout = self.layout.lock();
        if layout.generation != generation {
            log::debug!("write to {end} discarded by a concurrent truncate");
            return Ok(());
        }
        self.grow_locked(&mut layout, end)
    }

    fn append_locked(&self, layout: &mut Layout) -> Result<Page, StoreError> {
        if let Some(max) = self.max_pages {
            if layout.pages.len() >= max {
                log::warn!("page limit of {max} reached");
                return Err(StoreError::OutOfMemory { written: 0 });
            }
        }
        layout
            .pages
            .try_reserve(1)
            .map_err(|_| StoreError::OutOfMemory { written: 0 })?;
        let page = Page::allocate(self.page_size)?;
        layout.pages.push(page.clone());
        log::debug!("appended page {}", layout.pages.len() - 1);
        Ok(page)
    }

    fn grow_locked(&self, layout: &mut Layout, new_size: usize) -> Result<(), StoreError> {
        let capacity = layout.pages.len() * self.page_size;
        if new_size > capacity {
            let reason = format!("data size {new_size} exceeds capacity {capacity}");
            log::error!("{reason}");
            return Err(StoreError::CorruptState(reason));
        }
        layout.data_size = layout.data_size.max(new_size);
        Ok(())
    }
}
