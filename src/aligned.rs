//! 32-byte-aligned sample buffers
//!
//! Every kernel in this crate requires its buffers 16- or 32-byte aligned.
//! `Vec<f32>` only guarantees 4-byte alignment, so callers (and this crate's
//! own tests and benches) need an allocation that satisfies the stricter
//! contract. [`AlignedBuf`] is that allocation: a fixed-length, heap-backed,
//! 32-byte-aligned slice of samples.
//!
//! The buffer is deliberately minimal — no growth, no spare capacity. Codec
//! frame sizes are fixed up front, and a resizable buffer would invite
//! reallocation (and alignment loss) mid-stream.

use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

use crate::error::{DspError, Result};

/// Alignment of every [`AlignedBuf`] allocation, in bytes.
///
/// 32 bytes satisfies the strictest kernel contract (one AVX register) and
/// therefore also the 16-byte contracts.
pub const BUFFER_ALIGN: usize = 32;

mod sealed {
    pub trait Sealed {}
    impl Sealed for f32 {}
    impl Sealed for f64 {}
}

/// Element types an [`AlignedBuf`] can hold.
///
/// Sealed to the two sample formats the kernels operate on; both are valid
/// when zero-initialized, which `AlignedBuf::zeroed` relies on.
pub trait Sample: Copy + Default + Send + Sync + sealed::Sealed + 'static {}

impl Sample for f32 {}
impl Sample for f64 {}

/// Fixed-length, 32-byte-aligned sample buffer.
///
/// Dereferences to `[T]`, so it drops straight into the kernel signatures:
///
/// ```
/// use onda::{AlignedBuf, FloatDsp};
///
/// let dsp = FloatDsp::new(true);
/// let src = AlignedBuf::from_slice(&[1.0f32; 16]).unwrap();
/// let mut dst = AlignedBuf::<f32>::zeroed(16).unwrap();
/// dsp.vector_fmac_scalar(&mut dst, &src, 3.0);
/// assert_eq!(&dst[..], &[3.0f32; 16]);
/// ```
pub struct AlignedBuf<T: Sample> {
    ptr: NonNull<T>,
    len: usize,
}

impl<T: Sample> AlignedBuf<T> {
    /// Allocate a zero-filled buffer of `len` samples.
    ///
    /// An empty buffer performs no allocation.
    ///
    /// # Errors
    ///
    /// Returns [`DspError::AllocationFailed`] if the allocator refuses the
    /// request or the byte size overflows.
    pub fn zeroed(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self {
                ptr: NonNull::dangling(),
                len: 0,
            });
        }

        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(DspError::AllocationFailed { bytes: usize::MAX })?;
        let layout = Layout::from_size_align(bytes, BUFFER_ALIGN)
            .map_err(|_| DspError::AllocationFailed { bytes })?;

        // SAFETY: layout has non-zero size (len > 0, size_of::<T>() > 0).
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr =
            NonNull::new(raw.cast::<T>()).ok_or(DspError::AllocationFailed { bytes })?;

        Ok(Self { ptr, len })
    }

    /// Allocate an aligned copy of `data`.
    ///
    /// # Errors
    ///
    /// Returns [`DspError::AllocationFailed`] on allocator failure.
    pub fn from_slice(data: &[T]) -> Result<Self> {
        let mut buf = Self::zeroed(data.len())?;
        buf.copy_from_slice(data);
        Ok(buf)
    }

    /// Number of samples in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the buffer holds no samples
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl<T: Sample> Deref for AlignedBuf<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // SAFETY: ptr is valid for len initialized elements (or dangling with
        // len == 0, which from_raw_parts permits).
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Sample> DerefMut for AlignedBuf<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        // SAFETY: as in Deref, plus exclusive access through &mut self.
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Sample> Drop for AlignedBuf<T> {
    fn drop(&mut self) {
        if self.len == 0 {
            return;
        }
        // SAFETY: the allocation was made with exactly this layout, which was
        // validated at allocation time.
        unsafe {
            let layout = Layout::from_size_align_unchecked(
                self.len * std::mem::size_of::<T>(),
                BUFFER_ALIGN,
            );
            dealloc(self.ptr.as_ptr().cast::<u8>(), layout);
        }
    }
}

impl<T: Sample> Clone for AlignedBuf<T> {
    fn clone(&self) -> Self {
        // Mirrors Vec: cloning panics if the allocator fails.
        Self::from_slice(self).expect("allocation failed while cloning AlignedBuf")
    }
}

impl<T: Sample + fmt::Debug> fmt::Debug for AlignedBuf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl<T: Sample + PartialEq> PartialEq for AlignedBuf<T> {
    fn eq(&self, other: &Self) -> bool {
        self[..] == other[..]
    }
}

// SAFETY: AlignedBuf owns its allocation exclusively and Sample requires
// Send + Sync element types.
unsafe impl<T: Sample> Send for AlignedBuf<T> {}
unsafe impl<T: Sample> Sync for AlignedBuf<T> {}
