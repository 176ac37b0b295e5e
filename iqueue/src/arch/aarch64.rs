use core::arch::asm;
use std::sync::atomic::AtomicU64;

use super::{MemoryModel, OrderingModel};
use crate::layout::FieldOffsets;

/// aarch64: weakly ordered, with dedicated one-way barriers built into
/// `ldar` (load-acquire) and `stlr` (store-release). No full `dmb` is paid.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoadAcquireStoreRelease;

// SAFETY: LDAR orders all later accesses after it, STLR orders all earlier
// accesses before it (ARMv8 RCsc acquire/release).
unsafe impl MemoryModel for LoadAcquireStoreRelease {
    const NAME: &'static str = "aarch64-ldar-stlr";
    const ORDERING: OrderingModel = OrderingModel::AcquireRelease;
    // 128-byte lines
    const LAYOUT: FieldOffsets = FieldOffsets {
        head: 0,
        cached_tail: 128,
        tail: 256,
        cached_head: 384,
        buffer: 512,
        mask: 640,
        size: 768,
    };

    #[inline(always)]
    fn load_acquire(index: &AtomicU64) -> u64 {
        let value: u64;
        // SAFETY: `index` is a valid, 8-byte aligned location.
        unsafe {
            asm!(
                "ldar {v}, [{p}]",
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
                "stlr {v}, [{p}]",
                p = in(reg) index.as_ptr(),
                v = in(reg) value,
                options(nostack, preserves_flags),
            );
        }
    }
}
