use std::sync::atomic::{AtomicU64, Ordering};

use super::{MemoryModel, OrderingModel};
use crate::layout::{FieldOffsets, CACHE_LINE};

/// Language-level acquire/release atomics. Correct everywhere, tuned nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct Portable;

// SAFETY: Acquire and Release are exactly the orderings the trait asks for.
unsafe impl MemoryModel for Portable {
    const NAME: &'static str = "portable";
    const ORDERING: OrderingModel = OrderingModel::Portable;
    const LAYOUT: FieldOffsets = FieldOffsets::striped(CACHE_LINE);

    #[inline(always)]
    fn load_acquire(index: &AtomicU64) -> u64 {
        index.load(Ordering::Acquire)
    }

    #[inline(always)]
    fn store_release(index: &AtomicU64, value: u64) {
        index.store(value, Ordering::Release)
    }
}
