//! Admission gate for open handles
//!
//! `active` and `max` live in one `AtomicU64` (max in the high half), so the
//! limit check and the increment are a single compare-and-swap, and a limit
//! change can never slip between another thread's check and increment.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::StoreError;

fn pack(active: u32, max: u32) -> u64 {
    (u64::from(max) << 32) | u64::from(active)
}

#[allow(clippy::cast_possible_truncation)]
fn unpack(state: u64) -> (u32, u32) {
    (state as u32, (state >> 32) as u32)
}

#[derive(Debug)]
pub struct AccessAdmission {
    state: AtomicU64,
}

impl AccessAdmission {
    #[must_use]
    pub fn new(max_allowed: u32) -> Self {
        Self {
            state: AtomicU64::new(pack(0, max_allowed)),
        }
    }

    /// Admit one more handle if below the limit.
    ///
    /// # Errors
    ///
    /// Returns `Busy` when `max_allowed` handles are already active.
    pub fn open(&self) -> Result<(), StoreError> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let (active, max) = unpack(state);
                (active < max).then(|| pack(active + 1, max))
            })
            .map(|_| ())
            .map_err(|state| {
                let (active, max) = unpack(state);
                log::warn!("admission refused: {active} of {max} handles open");
                StoreError::Busy
            })
    }

    /// Release one handle; the count never goes below zero.
    pub fn close(&self) {
        let result = self
            .state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let (active, max) = unpack(state);
                active.checked_sub(1).map(|active| pack(active, max))
            });
        if result.is_err() {
            log::warn!("admission close() called with no active handles");
        }
    }

    /// Change the limit.
    ///
    /// # Errors
    ///
    /// Returns `Rejected` if `new_max` is below the number of active handles;
    /// the limit is left unchanged.
    pub fn set_max_allowed(&self, new_max: u32) -> Result<(), StoreError> {
        self.state
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |state| {
                let (active, _) = unpack(state);
                (new_max >= active).then(|| pack(active, new_max))
            })
            .map(|_| ())
            .map_err(|state| StoreError::Rejected {
                requested: new_max,
                active: unpack(state).0,
            })
    }

    #[must_use]
    pub fn active_count(&self) -> u32 {
        unpack(self.state.load(Ordering::Acquire)).0
    }

    #[must_use]
    pub fn max_allowed(&self) -> u32 {
        unpack(self.state.load(Ordering::Acquire)).1
    }

    /// `(active, max)` read together
    #[must_use]
    pub fn snapshot(&self) -> (u32, u32) {
        unpack(self.state.load(Ordering::Acquire))
    }
}
