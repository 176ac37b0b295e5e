//! Byte layout of the queue header and its conformance check.
//!
//! Every hot field of [`IndirectQueue`] lives in its own cache line:
//!
//! ```text
//!  0·L  head         consumer writes
//!  1·L  cached_tail  consumer private
//!  2·L  tail         producer writes
//!  3·L  cached_head  producer private
//!  4·L  buffer       immutable after construction
//!  5·L  mask         immutable after construction
//!  6·L  (end)
//! ```
//!
//! A specialized adapter states the offsets it was written against in
//! [`MemoryModel::LAYOUT`]. [`verify`] compares them with what the compiler
//! actually produced; a mismatch keeps the adapter from being selected.

use std::mem::{offset_of, size_of};
use std::ops::Deref;

use crate::arch::MemoryModel;
use crate::error::LayoutError;
use crate::spsc::IndirectQueue;

/// Cache-line size the header is striped by on this target.
#[cfg(target_arch = "aarch64")]
pub const CACHE_LINE: usize = 128;
#[cfg(not(target_arch = "aarch64"))]
pub const CACHE_LINE: usize = 64;

/// Pads and aligns `T` to exactly one cache line.
#[cfg_attr(target_arch = "aarch64", repr(C, align(128)))]
#[cfg_attr(not(target_arch = "aarch64"), repr(C, align(64)))]
#[derive(Debug)]
pub struct CacheLine<T>(T);

impl<T> CacheLine<T> {
    pub const fn new(value: T) -> Self {
        Self(value)
    }
}

impl<T> Deref for CacheLine<T> {
    type Target = T;

    #[inline(always)]
    fn deref(&self) -> &T {
        &self.0
    }
}

/// Offsets of the six header fields plus the header size, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldOffsets {
    pub head: usize,
    pub cached_tail: usize,
    pub tail: usize,
    pub cached_head: usize,
    pub buffer: usize,
    pub mask: usize,
    pub size: usize,
}

impl FieldOffsets {
    /// One field per `line` bytes, in header order.
    pub const fn striped(line: usize) -> Self {
        Self {
            head: 0,
            cached_tail: line,
            tail: 2 * line,
            cached_head: 3 * line,
            buffer: 4 * line,
            mask: 5 * line,
            size: 6 * line,
        }
    }

    /// What the compiler laid out for `IndirectQueue<M>`.
    pub fn actual<M: MemoryModel>() -> Self {
        Self {
            head: offset_of!(IndirectQueue<M>, head),
            cached_tail: offset_of!(IndirectQueue<M>, cached_tail),
            tail: offset_of!(IndirectQueue<M>, tail),
            cached_head: offset_of!(IndirectQueue<M>, cached_head),
            buffer: offset_of!(IndirectQueue<M>, buffer),
            mask: offset_of!(IndirectQueue<M>, mask),
            size: size_of::<IndirectQueue<M>>(),
        }
    }

    fn fields(&self) -> [(&'static str, usize); 6] {
        [
            ("head", self.head),
            ("cached_tail", self.cached_tail),
            ("tail", self.tail),
            ("cached_head", self.cached_head),
            ("buffer", self.buffer),
            ("mask", self.mask),
        ]
    }
}

/// Check that `IndirectQueue<M>` matches the offsets adapter `M` assumes.
pub fn verify<M: MemoryModel>() -> Result<(), LayoutError> {
    compare(M::NAME, &M::LAYOUT, &FieldOffsets::actual::<M>())
}

pub(crate) fn compare(
    adapter: &'static str,
    expected: &FieldOffsets,
    actual: &FieldOffsets,
) -> Result<(), LayoutError> {
    for ((field, want), (_, got)) in expected.fields().into_iter().zip(actual.fields()) {
        if want != got {
            return Err(LayoutError::Offset {
                adapter,
                field,
                expected: want,
                actual: got,
            });
        }
    }
    if expected.size != actual.size {
        return Err(LayoutError::Size {
            adapter,
            expected: expected.size,
            actual: actual.size,
        });
    }
    Ok(())
}

#[cfg(all(test, not(loom)))]
mod layout_tests {
    use super::*;
    use crate::arch::{Native, Portable};

    #[test]
    fn cache_line_wrapper_fills_a_line() {
        assert_eq!(size_of::<CacheLine<u64>>(), CACHE_LINE);
        assert_eq!(std::mem::align_of::<CacheLine<u8>>(), CACHE_LINE);
    }

    #[test]
    fn header_is_striped_one_field_per_line() {
        let actual = FieldOffsets::actual::<Portable>();
        assert_eq!(actual, FieldOffsets::striped(CACHE_LINE));

        let fields = actual.fields();
        for pair in fields.windows(2) {
            assert!(
                pair[1].1 - pair[0].1 >= CACHE_LINE,
                "{} and {} share a cache line",
                pair[0].0,
                pair[1].0
            );
        }
    }

    #[test]
    fn native_adapter_matches_compiled_layout() {
        verify::<Native>().unwrap();
        verify::<Portable>().unwrap();
    }

    #[test]
    fn mismatch_names_the_first_bad_field() {
        let mut expected = FieldOffsets::striped(CACHE_LINE);
        expected.tail += 8;
        let err = compare("test", &expected, &FieldOffsets::striped(CACHE_LINE)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Offset {
                adapter: "test",
                field: "tail",
                expected: 2 * CACHE_LINE + 8,
                actual: 2 * CACHE_LINE,
            }
        );

        let mut expected = FieldOffsets::striped(CACHE_LINE);
        expected.size = 4096;
        let err = compare("test", &expected, &FieldOffsets::striped(CACHE_LINE)).unwrap_err();
        assert!(matches!(err, LayoutError::Size { expected: 4096, .. }));
    }
}
