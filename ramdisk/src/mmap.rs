//! Page export for shared mappings
//!
//! Validates a page-aligned window against the allocated capacity and hands
//! out the page handles that cover it. Establishing the actual mapping in an
//! address space is up to the caller.

use crate::error::StoreError;
use crate::page::PageRef;
use crate::store::PagedStore;

/// Pages covering `length` bytes at `offset`, in logical order.
///
/// Both values must be multiples of the page size and the window must lie
/// within the allocated pages (it may extend past the logical data size).
///
/// # Errors
///
/// Returns `InvalidArgument` for a misaligned or out-of-range window.
pub fn export_pages(
    store: &PagedStore,
    offset: usize,
    length: usize,
) -> Result<Vec<PageRef>, StoreError> {
    let page_size = store.page_size();
    store.with_pages(|pages, _data_size| {
        let capacity = pages.len() * page_size;
        if offset % page_size != 0 {
            return Err(StoreError::invalid(format!(
                "mapping offset {offset} is not page aligned"
            )));
        }
        if offset > capacity {
            return Err(StoreError::invalid(format!(
                "mapping offset {offset} is past the capacity {capacity}"
            )));
        }
        if length % page_size != 0 {
            return Err(StoreError::invalid(format!(
                "mapping length {length} is not a multiple of the page size"
            )));
        }
        let end = offset
            .checked_add(length)
            .filter(|end| *end <= capacity)
            .ok_or_else(|| {
                StoreError::invalid(format!(
                    "mapping {offset}+{length} extends past the capacity {capacity}"
                ))
            })?;

        let first = offset / page_size;
        let last = end / page_size;
        let window = pages.get(first..last).ok_or_else(|| {
            StoreError::CorruptState(format!("pages {first}..{last} missing"))
        })?;
        Ok(window
            .iter()
            .enumerate()
            .map(|(i, page)| PageRef::new(first + i, page.clone()))
            .collect())
    })
}
