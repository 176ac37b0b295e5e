//! Cells whose single writer is fixed by the SPSC ownership partition.
//!
//! `OwnedCell<T, Role>` is an `UnsafeCell` tagged with the side of the queue
//! that owns it. The tag has no runtime effect; it keeps producer-private and
//! consumer-private state from being mixed up at compile time.

use std::fmt;
use std::marker::PhantomData;

use crate::sync::UnsafeCell;

/// Role of state written only by the producer (`tail`-side cache).
pub struct ProducerRole;

/// Role of state written only by the consumer (`head`-side cache).
pub struct ConsumerRole;

#[repr(transparent)]
pub struct OwnedCell<T, Role>(UnsafeCell<T>, PhantomData<Role>);

impl<T: Copy, Role> OwnedCell<T, Role> {
    pub fn new(value: T) -> Self {
        Self(UnsafeCell::new(value), PhantomData)
    }

    /// # Safety
    ///
    /// Only the thread playing `Role` may call this.
    #[inline(always)]
    pub unsafe fn get(&self) -> T {
        self.0.with(|p| unsafe { *p })
    }

    /// # Safety
    ///
    /// Only the thread playing `Role` may call this.
    #[inline(always)]
    pub unsafe fn set(&self, value: T) {
        self.0.with_mut(|p| unsafe { *p = value })
    }
}

// SAFETY: the cell is read and written by exactly one side of the queue; the
// other side never touches it.
unsafe impl<T: Send, Role> Sync for OwnedCell<T, Role> {}
unsafe impl<T: Send, Role> Send for OwnedCell<T, Role> {}

pub type ProducerCache = OwnedCell<u64, ProducerRole>;
pub type ConsumerCache = OwnedCell<u64, ConsumerRole>;

impl<T, Role> fmt::Debug for OwnedCell<T, Role> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("OwnedCell { .. }")
    }
}
