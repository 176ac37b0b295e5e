//! Producer/consumer endpoints over either queue implementation.
//!
//! # Example
//!
//! ```
//! let (mut tx, mut rx) = iqueue::channel::<Box<u64>>(1024).unwrap();
//!
//! tx.push(Box::new(42)).unwrap();
//! assert_eq!(*rx.pop().unwrap(), 42);
//! ```
//!
//! Each endpoint is `Send` but neither `Sync` nor `Clone`, and both operations
//! take `&mut self`, so there is never more than one producer or one consumer.
//!
//! ```compile_fail
//! fn shared_between_threads<T: Sync>(_: &T) {}
//!
//! let (tx, _rx) = iqueue::channel::<usize>(8).unwrap();
//! shared_between_threads(&tx);
//! ```

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::arch::{self, MemoryModel, Native, OrderingModel};
use crate::config::{PathSelection, QueueConfig};
use crate::error::{BuildError, Empty, Full};
use crate::handle::Handle;
use crate::layout;
use crate::spsc::{GenericQueue, IndirectQueue};
use crate::trace::{debug, warn};
use crate::RingProtocol;

/// The implementation a channel ended up with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Path {
    Specialized { adapter: &'static str },
    Generic,
}

enum Ring {
    Specialized(IndirectQueue<Native>),
    Generic(GenericQueue),
}

impl Ring {
    fn path(&self) -> Path {
        match self {
            Ring::Specialized(q) => Path::Specialized {
                adapter: q.adapter(),
            },
            Ring::Generic(_) => Path::Generic,
        }
    }
}

impl RingProtocol for Ring {
    #[inline]
    unsafe fn enqueue(&self, value: usize) -> Result<(), Full> {
        match self {
            Ring::Specialized(q) => q.enqueue(value),
            Ring::Generic(q) => q.enqueue(value),
        }
    }

    #[inline]
    unsafe fn dequeue(&self) -> Result<usize, Empty> {
        match self {
            Ring::Specialized(q) => q.dequeue(),
            Ring::Generic(q) => q.dequeue(),
        }
    }

    fn capacity(&self) -> usize {
        match self {
            Ring::Specialized(q) => q.capacity(),
            Ring::Generic(q) => q.capacity(),
        }
    }

    fn len(&self) -> usize {
        match self {
            Ring::Specialized(q) => q.len(),
            Ring::Generic(q) => q.len(),
        }
    }
}

/// Decide which implementation `selection` resolves to on this build.
pub fn select_path(selection: PathSelection) -> Result<Path, BuildError> {
    select_path_for::<Native>(selection)
}

/// Like [`select_path`], with adapter `M` standing in for [`Native`].
///
/// An adapter with [`OrderingModel::Portable`] counts as no adapter at all.
pub fn select_path_for<M: MemoryModel>(selection: PathSelection) -> Result<Path, BuildError> {
    let available = M::ORDERING != OrderingModel::Portable;
    let specialized = Path::Specialized { adapter: M::NAME };
    match selection {
        PathSelection::Generic => Ok(Path::Generic),
        PathSelection::Specialized => {
            if !available {
                return Err(BuildError::Unsupported {
                    arch: arch::TARGET_ARCH,
                });
            }
            layout::verify::<M>()?;
            Ok(specialized)
        }
        PathSelection::Auto => {
            if !available {
                debug!(arch = arch::TARGET_ARCH, "no specialized adapter, using generic queue");
                return Ok(Path::Generic);
            }
            match layout::verify::<M>() {
                Ok(()) => Ok(specialized),
                #[allow(unused_variables)]
                Err(err) => {
                    warn!(%err, "layout conformance failed, falling back to generic queue");
                    Ok(Path::Generic)
                }
            }
        }
    }
}

struct Shared<H: Handle> {
    ring: Ring,
    _handles: PhantomData<fn(H) -> H>,
}

impl<H: Handle> Drop for Shared<H> {
    fn drop(&mut self) {
        // Both endpoints are gone, so this thread is producer and consumer.
        while let Ok(word) = unsafe { self.ring.dequeue() } {
            drop(unsafe { H::from_word(word) });
        }
    }
}

// `Cell<()>` is `Send` but not `Sync`; endpoints move between threads but are
// never shared.
type NotSync = PhantomData<Cell<()>>;

/// Write end of a channel.
pub struct Producer<H: Handle> {
    shared: Arc<Shared<H>>,
    _not_sync: NotSync,
}

/// Read end of a channel.
pub struct Consumer<H: Handle> {
    shared: Arc<Shared<H>>,
    _not_sync: NotSync,
}

/// Channel of at least `capacity` slots on the best available path.
pub fn channel<H: Handle>(capacity: usize) -> Result<(Producer<H>, Consumer<H>), BuildError> {
    channel_with_config(QueueConfig::new(capacity))
}

pub fn channel_with_config<H: Handle>(
    config: QueueConfig,
) -> Result<(Producer<H>, Consumer<H>), BuildError> {
    let capacity = config.effective_capacity()?;
    let ring = match select_path(config.path)? {
        Path::Specialized { .. } => Ring::Specialized(IndirectQueue::with_capacity(capacity)?),
        Path::Generic => Ring::Generic(GenericQueue::with_capacity(capacity)?),
    };
    debug!(capacity, path = ?ring.path(), "channel created");

    let shared = Arc::new(Shared {
        ring,
        _handles: PhantomData,
    });
    Ok((
        Producer {
            shared: Arc::clone(&shared),
            _not_sync: PhantomData,
        },
        Consumer {
            shared,
            _not_sync: PhantomData,
        },
    ))
}

impl<H: Handle> Producer<H> {
    /// Hand `value` to the consumer, or get it back if the ring is full.
    #[inline]
    pub fn push(&mut self, value: H) -> Result<(), Full<H>> {
        let word = value.into_word();
        // SAFETY: `&mut self` on the only producer.
        match unsafe { self.shared.ring.enqueue(word) } {
            Ok(()) => Ok(()),
            // SAFETY: the word was produced just above and not published.
            Err(Full(word)) => Err(Full(unsafe { H::from_word(word) })),
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> Path {
        self.shared.ring.path()
    }

    /// Whether the consumer has been dropped.
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.shared) == 1
    }
}

impl<H: Handle> Consumer<H> {
    /// Take the oldest published value.
    #[inline]
    pub fn pop(&mut self) -> Result<H, Empty> {
        // SAFETY: `&mut self` on the only consumer; the word was published by
        // the producer's `into_word` and is taken exactly once.
        unsafe {
            let word = self.shared.ring.dequeue()?;
            Ok(H::from_word(word))
        }
    }

    pub fn capacity(&self) -> usize {
        self.shared.ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.shared.ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn path(&self) -> Path {
        self.shared.ring.path()
    }

    /// Whether the producer has been dropped.
    pub fn is_abandoned(&self) -> bool {
        Arc::strong_count(&self.shared) == 1
    }
}

impl<H: Handle> fmt::Debug for Producer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Producer")
            .field("path", &self.path())
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}

impl<H: Handle> fmt::Debug for Consumer<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("path", &self.path())
            .field("capacity", &self.capacity())
            .field("len", &self.len())
            .finish()
    }
}
