//! Per-architecture memory-model adapters.
//!
//! The protocol needs exactly two ordered operations: an acquire-load of the
//! index the other side owns, and a release-store of the index this side owns.
//! How those are spelled depends on the hardware:
//!
//! | ordering model | acquire-load | release-store |
//! |---|---|---|
//! | total store order (x86_64) | plain `mov` | plain `mov` |
//! | acquire/release instructions (aarch64) | `ldar` | `stlr` |
//! | explicit barriers (riscv64) | `ld` + `fence r, rw` | `fence rw, w` + `sd` |
//!
//! Anything else, and every build under miri or loom, gets [`Portable`].

use std::sync::atomic::AtomicU64;

use crate::layout::FieldOffsets;

mod portable;
pub use portable::Portable;

#[cfg(all(target_arch = "x86_64", not(miri), not(loom)))]
mod x86_64;
#[cfg(all(target_arch = "x86_64", not(miri), not(loom)))]
pub use self::x86_64::Tso;
#[cfg(all(target_arch = "x86_64", not(miri), not(loom)))]
pub type Native = Tso;

#[cfg(all(target_arch = "aarch64", not(miri), not(loom)))]
mod aarch64;
#[cfg(all(target_arch = "aarch64", not(miri), not(loom)))]
pub use self::aarch64::LoadAcquireStoreRelease;
#[cfg(all(target_arch = "aarch64", not(miri), not(loom)))]
pub type Native = LoadAcquireStoreRelease;

#[cfg(all(target_arch = "riscv64", not(miri), not(loom)))]
mod riscv64;
#[cfg(all(target_arch = "riscv64", not(miri), not(loom)))]
pub use self::riscv64::Fenced;
#[cfg(all(target_arch = "riscv64", not(miri), not(loom)))]
pub type Native = Fenced;

#[cfg(not(all(
    any(target_arch = "x86_64", target_arch = "aarch64", target_arch = "riscv64"),
    not(miri),
    not(loom)
)))]
pub type Native = Portable;

/// Which row of the ordering table an adapter implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderingModel {
    TotalStoreOrder,
    AcquireRelease,
    Barrier,
    /// Language atomics; no hand-tuned path.
    Portable,
}

/// Acquire/release primitives for one instruction set.
///
/// # Safety
///
/// `load_acquire` must order every later memory access of the calling thread
/// after the load, and `store_release` must order every earlier access before
/// the store, as observed by the thread on the other side of the queue.
/// `LAYOUT` must describe the header this adapter was written against.
pub unsafe trait MemoryModel: Send + Sync + 'static {
    const NAME: &'static str;
    const ORDERING: OrderingModel;
    const LAYOUT: FieldOffsets;

    /// Read the index owned by the other side.
    fn load_acquire(index: &AtomicU64) -> u64;

    /// Publish a new value of the index owned by this side.
    fn store_release(index: &AtomicU64, value: u64);
}

/// Whether this build has a specialized adapter at all.
pub const NATIVE_AVAILABLE: bool = !matches!(Native::ORDERING, OrderingModel::Portable);

/// Name of the compilation target, for error messages.
pub const TARGET_ARCH: &str = std::env::consts::ARCH;
