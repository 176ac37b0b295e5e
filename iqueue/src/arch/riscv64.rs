use core::arch::asm;
use std::sync::atomic::AtomicU64;

use super::{MemoryModel, OrderingModel};
use crate::layout::FieldOffsets;

/// riscv64 (RVWMO): plain `ld`/`sd` fenced on the side that matters. The load
/// is followed by `fence r, rw` before anything depends on it; the store is
/// preceded by `fence rw, w`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Fenced;

// SAFETY: `fence r, rw` orders the index load before all later accesses;
// `fence rw, w` orders all earlier accesses before the index store.
unsafe impl MemoryModel for Fenced {
    const NAME: &'static str = "riscv64-fence";
    const ORDERING: OrderingModel = OrderingModel::Barrier;
    const LAYOUT: FieldOffsets = FieldOffsets {
        head: 0,
        cached_tail: 64,
        tail: 128,
        cached_head: 192,
        buffer: 256,
        mask: 320,
        size: 384,
    };

    #[inline(always)]
    fn load_acquire(index: &AtomicU64) -> u64 {
        let value: u64;
        // SAFETY: `index` is a valid, 8-byte aligned location.
        unsafe {
            asm!(
                "ld {v}, 0({p})",
                "fence r, rw",
                p = in(reg) index.as_ptr(),
                v = lateout(reg) value,
                options(nostack),
            );
        }
        value
    }

    #[inline(always)]
    fn store_release(index: &AtomicU64, value: u64) {
        // SAFETY: as above; only the owning side stores to `index`.
        unsafe {
            asm!(
                "fence rw, w",
                "sd {v}, 0({p})",
                p = in(reg) index.as_ptr(),
                v = in(reg) value,
                options(nostack),
            );
        }
    }
}
