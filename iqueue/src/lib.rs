//! Single-producer single-consumer ring of machine-word handles.
//!
//! Two implementations share one protocol: [`IndirectQueue`], whose header has
//! a fixed cache-line-striped layout and whose index ordering comes from a
//! per-architecture [`MemoryModel`] adapter, and [`GenericQueue`], built on
//! portable atomics. [`channel`] picks between them and hands out typed
//! [`Producer`]/[`Consumer`] endpoints.

pub mod arch;
pub mod cell;
pub mod channel;
pub mod config;
pub mod error;
pub mod handle;
pub mod layout;
pub mod spsc;
mod sync;
pub mod trace;

pub use arch::{MemoryModel, Native, OrderingModel, Portable};
pub use channel::{
    channel, channel_with_config, select_path, select_path_for, Consumer, Path, Producer,
};
pub use config::{PathSelection, QueueConfig, MAX_CAPACITY, MIN_CAPACITY};
pub use error::{BuildError, Empty, Full, LayoutError};
pub use handle::Handle;
pub use layout::{FieldOffsets, CACHE_LINE};
pub use spsc::{GenericQueue, IndirectQueue};
pub use trace::init_tracing;

// Common interface of the two ring implementations.
pub trait RingProtocol: Send + Sync {
    /// # Safety
    ///
    /// Only one thread may act as producer at a time.
    unsafe fn enqueue(&self, value: usize) -> Result<(), Full>;

    /// # Safety
    ///
    /// Only one thread may act as consumer at a time.
    unsafe fn dequeue(&self) -> Result<usize, Empty>;

    fn capacity(&self) -> usize;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
