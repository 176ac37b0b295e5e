// Cached-index SPSC ring of machine words with a fixed, cache-line-striped
// header. Ordering of the two cross-thread index accesses is delegated to a
// `MemoryModel` adapter; everything else is plain loads and stores.

use std::alloc::{self, Layout};
use std::cell::UnsafeCell;
use std::fmt;
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::arch::{MemoryModel, Native};
use crate::cell::{ConsumerCache, ProducerCache};
use crate::config::normalize_capacity;
use crate::error::{BuildError, Empty, Full};
use crate::layout::{CacheLine, CACHE_LINE};
use crate::trace::trace;
use crate::RingProtocol;

type Slot = UnsafeCell<usize>;

/// Where the slot array lives and who frees it.
#[derive(Debug)]
pub(crate) struct Slots {
    ptr: NonNull<Slot>,
    len: usize,
    owned: bool,
}

impl Slots {
    fn layout(len: usize) -> Layout {
        // len is bounded by MAX_CAPACITY, so this cannot overflow isize
        match Layout::array::<Slot>(len).and_then(|l| l.align_to(CACHE_LINE)) {
            Ok(layout) => layout,
            Err(_) => unreachable!("slot array of {len} words"),
        }
    }

    fn allocate(len: usize) -> Self {
        let layout = Self::layout(len);
        // SAFETY: layout has non-zero size (len >= MIN_CAPACITY).
        let raw = unsafe { alloc::alloc_zeroed(layout) } as *mut Slot;
        let Some(ptr) = NonNull::new(raw) else {
            alloc::handle_alloc_error(layout);
        };
        Self {
            ptr,
            len,
            owned: true,
        }
    }
}

/// Single-producer single-consumer queue of word-sized handles.
///
/// The six header fields each occupy one cache line (see [`crate::layout`]),
/// in an order the adapter `M` has been checked against. Counters are 64-bit
/// and never wrap in practice; slots are addressed by `counter & mask`.
///
/// `enqueue` and `dequeue` take `&self` so the queue can be shared, which makes
/// them `unsafe`: at most one thread may act as producer and at most one as
/// consumer. [`crate::channel`] hands out endpoints that enforce this.
#[repr(C)]
pub struct IndirectQueue<M: MemoryModel = Native> {
    pub(crate) head: CacheLine<AtomicU64>,
    pub(crate) cached_tail: CacheLine<ConsumerCache>,
    pub(crate) tail: CacheLine<AtomicU64>,
    pub(crate) cached_head: CacheLine<ProducerCache>,
    pub(crate) buffer: CacheLine<Slots>,
    pub(crate) mask: CacheLine<u64>,
    _model: PhantomData<M>,
}

// SAFETY: the slot array is only touched under the SPSC protocol, and the
// caches are partitioned between the two sides.
unsafe impl<M: MemoryModel> Send for IndirectQueue<M> {}
unsafe impl<M: MemoryModel> Sync for IndirectQueue<M> {}

impl<M: MemoryModel> IndirectQueue<M> {
    /// Heap-backed queue holding at least `capacity` handles.
    ///
    /// `capacity` is rounded up to a power of two (minimum 2); zero is rejected.
    pub fn with_capacity(capacity: usize) -> Result<Self, BuildError> {
        let capacity = normalize_capacity(capacity)?;
        Ok(Self::from_slots(Slots::allocate(capacity)))
    }

    fn from_slots(slots: Slots) -> Self {
        let mask = (slots.len - 1) as u64;
        Self {
            head: CacheLine::new(AtomicU64::new(0)),
            cached_tail: CacheLine::new(ConsumerCache::new(0)),
            tail: CacheLine::new(AtomicU64::new(0)),
            cached_head: CacheLine::new(ProducerCache::new(0)),
            buffer: CacheLine::new(slots),
            mask: CacheLine::new(mask),
            _model: PhantomData,
        }
    }

    /// Bytes needed to place a queue of `capacity` slots with
    /// [`init_in_shared`](Self::init_in_shared).
    ///
    /// Saturates at `usize::MAX` for capacities no mapping could hold.
    pub const fn shared_size(capacity: usize) -> usize {
        let slots = capacity.saturating_mul(mem::size_of::<Slot>());
        mem::size_of::<Self>().saturating_add(slots)
    }

    /// Build the queue header and its slots inside caller-provided memory,
    /// e.g. an anonymous shared mapping that a forked peer inherits.
    ///
    /// # Safety
    ///
    /// `mem` must be valid for reads and writes of
    /// [`shared_size(capacity)`](Self::shared_size) bytes for as long as the
    /// returned reference is used, and must not be used for anything else.
    /// Peers in other processes must map it at the same address.
    pub unsafe fn init_in_shared(mem: *mut u8, capacity: usize) -> Result<&'static Self, BuildError> {
        if capacity < crate::config::MIN_CAPACITY || !capacity.is_power_of_two() {
            return Err(BuildError::InvalidCapacity(capacity));
        }
        if capacity > crate::config::MAX_CAPACITY {
            return Err(BuildError::CapacityTooLarge {
                requested: capacity,
                max: crate::config::MAX_CAPACITY,
            });
        }
        if mem.is_null() {
            return Err(BuildError::NullMemory);
        }
        let align = mem::align_of::<Self>();
        if (mem as usize) % align != 0 {
            return Err(BuildError::Misaligned {
                addr: mem as usize,
                align,
            });
        }

        let header = mem as *mut Self;
        let slots = mem.add(mem::size_of::<Self>()) as *mut Slot;
        for i in 0..capacity {
            slots.add(i).write(UnsafeCell::new(0));
        }

        header.write(Self::from_slots(Slots {
            ptr: NonNull::new_unchecked(slots),
            len: capacity,
            owned: false,
        }));
        Ok(&*header)
    }

    #[inline(always)]
    fn slot(&self, counter: u64) -> *mut usize {
        let index = (counter & *self.mask) as usize;
        // SAFETY: index <= mask < len.
        unsafe { (*self.buffer.ptr.as_ptr().add(index)).get() }
    }

    /// Producer side. Fails with the value when every slot is taken.
    ///
    /// # Safety
    ///
    /// Must not run concurrently with another `enqueue` on the same queue.
    #[inline]
    pub unsafe fn enqueue(&self, value: usize) -> Result<(), Full> {
        // only this thread writes tail
        let tail = self.tail.load(Ordering::Relaxed);
        let mask = *self.mask;

        let mut cached_head = self.cached_head.get();
        if tail.wrapping_sub(cached_head) > mask {
            cached_head = M::load_acquire(&self.head);
            self.cached_head.set(cached_head);
            trace!(tail, head = cached_head, "enqueue resynchronized head");
            if tail.wrapping_sub(cached_head) > mask {
                return Err(Full(value));
            }
        }

        // The slot is ours until tail + 1 is published.
        self.slot(tail).write(value);
        M::store_release(&self.tail, tail.wrapping_add(1));
        Ok(())
    }

    /// Consumer side. Fails when nothing has been published.
    ///
    /// # Safety
    ///
    /// Must not run concurrently with another `dequeue` on the same queue.
    #[inline]
    pub unsafe fn dequeue(&self) -> Result<usize, Empty> {
        let head = self.head.load(Ordering::Relaxed);

        let mut cached_tail = self.cached_tail.get();
        if head >= cached_tail {
            cached_tail = M::load_acquire(&self.tail);
            self.cached_tail.set(cached_tail);
            trace!(head, tail = cached_tail, "dequeue resynchronized tail");
            if head >= cached_tail {
                return Err(Empty);
            }
        }

        let value = self.slot(head).read();
        M::store_release(&self.head, head.wrapping_add(1));
        Ok(value)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len
    }

    /// Number of published, not yet consumed handles. A snapshot only.
    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        (tail.saturating_sub(head) as usize).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn adapter(&self) -> &'static str {
        M::NAME
    }
}

impl<M: MemoryModel> RingProtocol for IndirectQueue<M> {
    #[inline]
    unsafe fn enqueue(&self, value: usize) -> Result<(), Full> {
        IndirectQueue::enqueue(self, value)
    }

    #[inline]
    unsafe fn dequeue(&self) -> Result<usize, Empty> {
        IndirectQueue::dequeue(self)
    }

    fn capacity(&self) -> usize {
        IndirectQueue::capacity(self)
    }

    fn len(&self) -> usize {
        IndirectQueue::len(self)
    }
}

impl<M: MemoryModel> Drop for IndirectQueue<M> {
    fn drop(&mut self) {
        if self.buffer.owned {
            // SAFETY: allocated in Slots::allocate with this exact layout.
            unsafe {
                alloc::dealloc(
                    self.buffer.ptr.as_ptr() as *mut u8,
                    Slots::layout(self.buffer.len),
                )
            };
        }
    }
}

impl<M: MemoryModel> fmt::Debug for IndirectQueue<M> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndirectQueue")
            .field("adapter", &M::NAME)
            .field("capacity", &self.capacity())
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .field("shared", &!self.buffer.owned)
            .finish()
    }
}
