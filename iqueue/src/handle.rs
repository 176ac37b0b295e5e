//! Conversion between owned values and the machine word a slot holds.

use std::sync::Arc;

/// A value that can travel through the queue as one `usize`.
///
/// # Safety
///
/// `from_word(into_word(x))` must give back `x`, and a word must be turned
/// back into a value at most once.
pub unsafe trait Handle: Send + Sized {
    fn into_word(self) -> usize;

    /// # Safety
    ///
    /// `word` must come from `into_word` of this same type and not have been
    /// converted back already.
    unsafe fn from_word(word: usize) -> Self;
}

unsafe impl Handle for usize {
    #[inline(always)]
    fn into_word(self) -> usize {
        self
    }

    #[inline(always)]
    unsafe fn from_word(word: usize) -> Self {
        word
    }
}

unsafe impl Handle for u32 {
    #[inline(always)]
    fn into_word(self) -> usize {
        self as usize
    }

    #[inline(always)]
    unsafe fn from_word(word: usize) -> Self {
        word as u32
    }
}

// Ownership of the allocation moves with the pointer.
unsafe impl<T: Send> Handle for Box<T> {
    #[inline(always)]
    fn into_word(self) -> usize {
        Box::into_raw(self) as usize
    }

    #[inline(always)]
    unsafe fn from_word(word: usize) -> Self {
        Box::from_raw(word as *mut T)
    }
}

// One strong count moves with the pointer.
unsafe impl<T: Send + Sync> Handle for Arc<T> {
    #[inline(always)]
    fn into_word(self) -> usize {
        Arc::into_raw(self) as usize
    }

    #[inline(always)]
    unsafe fn from_word(word: usize) -> Self {
        Arc::from_raw(word as *const T)
    }
}
