use thiserror::Error;

/// Enqueue found no free slot after re-synchronizing with the consumer.
///
/// Carries the rejected value so the caller keeps ownership of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is full")]
pub struct Full<T = usize>(pub T);

impl<T> Full<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

/// Dequeue found no published element after re-synchronizing with the producer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("queue is empty")]
pub struct Empty;

/// A field of the queue header sits somewhere the active adapter does not expect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    #[error("field `{field}` at offset {actual}, adapter `{adapter}` expects {expected}")]
    Offset {
        adapter: &'static str,
        field: &'static str,
        expected: usize,
        actual: usize,
    },
    #[error("header is {actual} bytes, adapter `{adapter}` expects {expected}")]
    Size {
        adapter: &'static str,
        expected: usize,
        actual: usize,
    },
}

/// Errors raised while constructing a queue.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("capacity must be greater than zero")]
    ZeroCapacity,
    #[error("capacity {requested} exceeds the maximum of {max} slots")]
    CapacityTooLarge { requested: usize, max: usize },
    #[error("capacity {0} is not a power of two of at least 2")]
    InvalidCapacity(usize),
    #[error("no specialized memory-model adapter for target `{arch}`")]
    Unsupported { arch: &'static str },
    #[error("layout conformance check failed: {0}")]
    Layout(#[from] LayoutError),
    #[error("shared queue memory is a null pointer")]
    NullMemory,
    #[error("memory at {addr:#x} is not aligned to {align} bytes")]
    Misaligned { addr: usize, align: usize },
    #[error("unknown queue path `{0}` (expected auto, generic or specialized)")]
    InvalidPath(String),
}
