use core::arch::asm;
use std::sync::atomic::AtomicU64;

use super::{MemoryModel, OrderingModel};
use crate::layout::FieldOffsets;

/// x86_64: loads are not reordered with older loads and stores are not
/// reordered with older stores, so plain `mov`s already carry acquire and
/// release semantics. The asm blocks are opaque to the compiler, which keeps
/// it from moving slot accesses across them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Tso;

// SAFETY: x86-TSO gives load->load/store and load/store->store ordering in
// hardware; the asm statements (no `nomem`) are compiler barriers.
unsafe impl MemoryModel for Tso {
    const NAME: &'static str = "x86_64-tso";
    const ORDERING: OrderingModel = OrderingModel::TotalStoreOrder;
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
        // SAFETY: `index` is a valid, aligned 8-byte location; an aligned
        // 8-byte mov is single-copy atomic.
        unsafe {
            asm!(
                "mov {v}, qword ptr [{p}]",
                p = in(reg) index.as_ptr(),
                v = lateout(reg) value,
                options(nostack, preserves_flags),
            );
        }
        value
    }

    #[inline(always)]
    fn store_release(index: &AtomicU64, value: u64) {
        // SAFETY: as above; only the owning side stores to `index`.
        unsafe {
            asm!(
                "mov qword ptr [{p}], {v}",
                p = in(reg) index.as_ptr(),
                v = in(reg) value,
                options(nostack, preserves_flags),
            );
        }
    }
}
