//! Kernel implementations for each instruction-set family
//!
//! Each submodule provides concrete bodies for the eight table operations.
//! The scalar module is the portable reference — always correct, always
//! available, and the ground truth every specialized kernel is tested
//! against. The architecture modules each export an `install` override pass
//! that the table initializer runs in order; a pass overwrites only the
//! entries it improves for the selected [`SimdLevel`](crate::SimdLevel) and
//! strictness.
//!
//! # Safety
//!
//! All `unsafe` code lives in the architecture modules, in `unsafe fn`
//! intrinsic bodies gated by `#[target_feature]`. The safe wrappers around
//! them are only ever installed after runtime feature detection, which is
//! what makes calling them sound.

pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub(crate) mod x86;

#[cfg(target_arch = "aarch64")]
pub(crate) mod neon;

/// Debug-build check of the per-operation buffer contract: every buffer
/// `align`-byte aligned, every length a multiple of `mult`, all lengths
/// equal. Compiles to nothing in release builds; violating the contract
/// there is undefined by this crate's interface, not detected.
#[inline(always)]
pub(crate) fn contract<T>(bufs: &[&[T]], align: usize, mult: usize) {
    #[cfg(debug_assertions)]
    {
        let len = bufs[0].len();
        for buf in bufs {
            debug_assert!(
                buf.is_empty() || buf.as_ptr() as usize % align == 0,
                "buffer at {:p} violates the {align}-byte alignment contract",
                buf.as_ptr()
            );
            debug_assert!(
                buf.len() % mult == 0,
                "length {} violates the multiple-of-{mult} contract",
                buf.len()
            );
            debug_assert_eq!(buf.len(), len, "operand lengths differ");
        }
    }
    #[cfg(not(debug_assertions))]
    {
        let _ = (bufs, align, mult);
    }
}
