// Portable version of the cached-index ring: Acquire loads and Release stores
// on language atomics, cache padding from crossbeam instead of a fixed layout
// contract. Selected when no adapter exists or the layout check fails.

use std::fmt;

use crossbeam_utils::CachePadded;

use crate::cell::{ConsumerCache, ProducerCache};
use crate::config::normalize_capacity;
use crate::error::{BuildError, Empty, Full};
use crate::sync::{AtomicU64, Ordering, UnsafeCell};
use crate::trace::trace;
use crate::RingProtocol;

pub struct GenericQueue {
    head: CachePadded<AtomicU64>,
    cached_tail: CachePadded<ConsumerCache>,
    tail: CachePadded<AtomicU64>,
    cached_head: CachePadded<ProducerCache>,
    buffer: Box<[UnsafeCell<usize>]>,
    mask: u64,
}

// SAFETY: same partition as IndirectQueue; slots are handed over by the
// Release store / Acquire load pair on head and tail.
unsafe impl Send for GenericQueue {}
unsafe impl Sync for GenericQueue {}

impl GenericQueue {
    pub fn with_capacity(capacity: usize) -> Result<Self, BuildError> {
        let capacity = normalize_capacity(capacity)?;
        let buffer = (0..capacity).map(|_| UnsafeCell::new(0)).collect();
        Ok(Self {
            head: CachePadded::new(AtomicU64::new(0)),
            cached_tail: CachePadded::new(ConsumerCache::new(0)),
            tail: CachePadded::new(AtomicU64::new(0)),
            cached_head: CachePadded::new(ProducerCache::new(0)),
            buffer,
            mask: (capacity - 1) as u64,
        })
    }

    #[inline(always)]
    fn slot(&self, counter: u64) -> &UnsafeCell<usize> {
        &self.buffer[(counter & self.mask) as usize]
    }

    /// # Safety
    ///
    /// Must not run concurrently with another `enqueue` on the same queue.
    #[inline]
    pub unsafe fn enqueue(&self, value: usize) -> Result<(), Full> {
        let tail = self.tail.load(Ordering::Relaxed);

        let mut cached_head = self.cached_head.get();
        if tail.wrapping_sub(cached_head) > self.mask {
            cached_head = self.head.load(Ordering::Acquire);
            self.cached_head.set(cached_head);
            trace!(tail, head = cached_head, "enqueue resynchronized head");
            if tail.wrapping_sub(cached_head) > self.mask {
                return Err(Full(value));
            }
        }

        self.slot(tail).with_mut(|p| unsafe { p.write(value) });
        self.tail.store(tail.wrapping_add(1), Ordering::Release);
        Ok(())
    }

    /// # Safety
    ///
    /// Must not run concurrently with another `dequeue` on the same queue.
    #[inline]
    pub unsafe fn dequeue(&self) -> Result<usize, Empty> {
        let head = self.head.load(Ordering::Relaxed);

        let mut cached_tail = self.cached_tail.get();
        if head >= cached_tail {
            cached_tail = self.tail.load(Ordering::Acquire);
            self.cached_tail.set(cached_tail);
            trace!(head, tail = cached_tail, "dequeue resynchronized tail");
            if head >= cached_tail {
                return Err(Empty);
            }
        }

        let value = self.slot(head).with(|p| unsafe { p.read() });
        self.head.store(head.wrapping_add(1), Ordering::Release);
        Ok(value)
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    pub fn len(&self) -> usize {
        let head = self.head.load(Ordering::Relaxed);
        let tail = self.tail.load(Ordering::Relaxed);
        (tail.saturating_sub(head) as usize).min(self.capacity())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RingProtocol for GenericQueue {
    #[inline]
    unsafe fn enqueue(&self, value: usize) -> Result<(), Full> {
        GenericQueue::enqueue(self, value)
    }

    #[inline]
    unsafe fn dequeue(&self) -> Result<usize, Empty> {
        GenericQueue::dequeue(self)
    }

    fn capacity(&self) -> usize {
        GenericQueue::capacity(self)
    }

    fn len(&self) -> usize {
        GenericQueue::len(self)
    }
}

impl fmt::Debug for GenericQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenericQueue")
            .field("capacity", &self.capacity())
            .field("head", &self.head.load(Ordering::Relaxed))
            .field("tail", &self.tail.load(Ordering::Relaxed))
            .finish()
    }
}
