//! Fixed-size memory pages
//!
//! A [`Page`] is a reference-counted block of bytes with its own lock.
//! Clones share the same memory, which is what makes exported pages a shared
//! mapping: a write through any clone is visible through every other one.

use parking_lot::{Mutex, MutexGuard};
use std::fmt;
use std::sync::Arc;

use crate::error::StoreError;

#[derive(Clone)]
pub struct Page(Arc<Mutex<Box<[u8]>>>);

impl Page {
    /// Allocate a zero-filled page.
    ///
    /// Uses a fallible reservation so that allocation failure surfaces as an
    /// error instead of aborting the process.
    ///
    /// # Errors
    ///
    /// Returns `OutOfMemory` if the allocation cannot be satisfied.
    pub fn allocate(page_size: usize) -> Result<Self, StoreError> {
        let mut bytes = Vec::new();
        bytes
            .try_reserve_exact(page_size)
            .map_err(|_| StoreError::OutOfMemory { written: 0 })?;
        bytes.resize(page_size, 0);
        Ok(Self(Arc::new(Mutex::new(bytes.into_boxed_slice()))))
    }

    /// Page size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lock the page contents
    ///
    /// The lock covers this page only, not the page sequence.
    #[must_use]
    pub fn lock(&self) -> MutexGuard<'_, Box<[u8]>> {
        self.0.lock()
    }

    /// Whether two handles refer to the same memory
    #[must_use]
    pub fn same_page(&self, other: &Page) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Page(len={})", self.len())
    }
}

/// Page handle tagged with its logical position in the store
#[derive(Debug, Clone)]
pub struct PageRef {
    index: usize,
    page: Page,
}

impl PageRef {
    pub(crate) fn new(index: usize, page: Page) -> Self {
        Self { index, page }
    }

    /// Logical page index (byte offset / page size)
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Copy of the page contents
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.page.lock().to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_zeroed() {
        let page = Page::allocate(64).unwrap();
        assert_eq!(page.len(), 64);
        assert!(page.lock().iter().all(|b| *b == 0));
    }

    #[test]
    fn test_clone_shares_memory() {
        let page = Page::allocate(16).unwrap();
        let other = page.clone();
        other.lock()[3] = 0xAB;
        assert_eq!(page.lock()[3], 0xAB);
        assert!(page.same_page(&other));
    }

    #[test]
    fn test_distinct_pages() {
        let a = Page::allocate(16).unwrap();
        let b = Page::allocate(16).unwrap();
        assert!(!a.same_page(&b));
    }
}
